use finchat::config::Config;

#[test]
fn test_config_validation_rejects_non_http_backend() {
    let config = Config {
        backend_url: "ws://localhost:8000/chat".to_string(),
        ..Config::default()
    };

    assert!(config.validate().is_err());
}

#[test]
fn test_config_validation_allows_local_backend() {
    let config = Config {
        backend_url: "http://localhost:8000/chat".to_string(),
        ..Config::default()
    };

    assert!(config.validate().is_ok());
    assert!(config.is_local_backend());
}

#[test]
fn test_config_validation_rejects_zero_history_cap() {
    let config = Config {
        max_history_lines: 0,
        ..Config::default()
    };

    assert!(config.validate().is_err());
}
