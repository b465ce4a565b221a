use anyhow::{Context, Result};
use std::fs::OpenOptions;
use std::io::IsTerminal;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_PATH: &str = "/tmp/finchat.log";
const DEFAULT_LOG_FILTER: &str = "finchat=info";
const LOG_PATH_ENV: &str = "FINCHAT_LOG_PATH";
const LOG_FILTER_ENV: &str = "FINCHAT_LOG";

/// Installs the global subscriber. The TUI owns the terminal, so an interactive
/// session logs to a file and only a redirected stderr receives log lines.
pub fn init_tracing() -> Result<()> {
    let env_filter = EnvFilter::try_from_env(LOG_FILTER_ENV)
        .or_else(|_| EnvFilter::try_new(DEFAULT_LOG_FILTER))
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    match resolve_log_path() {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&path)
                .with_context(|| format!("cannot open log file '{path}'"))?;
            let _ = tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .try_init();
        }
        None => {
            let _ = tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .try_init();
        }
    }

    Ok(())
}

fn resolve_log_path() -> Option<String> {
    std::env::var(LOG_PATH_ENV)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .or_else(|| {
            if std::io::stderr().is_terminal() {
                Some(DEFAULT_LOG_PATH.to_string())
            } else {
                None
            }
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_log_path_prefers_env() {
        let _env_lock = crate::test_support::ENV_LOCK.blocking_lock();
        std::env::set_var(LOG_PATH_ENV, " /tmp/finchat-test.log ");
        assert_eq!(resolve_log_path().as_deref(), Some("/tmp/finchat-test.log"));
        std::env::remove_var(LOG_PATH_ENV);
    }

    #[test]
    fn test_init_tracing_creates_log_file() {
        let _env_lock = crate::test_support::ENV_LOCK.blocking_lock();
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("finchat.log");
        std::env::set_var(LOG_PATH_ENV, path.to_string_lossy().to_string());

        init_tracing().expect("tracing should initialize");
        assert!(path.exists());
        std::env::remove_var(LOG_PATH_ENV);
    }
}
