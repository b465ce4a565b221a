use anyhow::{bail, Result};
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::util::{is_local_endpoint_url, parse_bool_flag};

pub const DEFAULT_BACKEND_URL: &str = "http://localhost:8000/chat";
const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;
const DEFAULT_MAX_HISTORY_LINES: usize = 2000;

const BACKEND_URL_ENV: &str = "FINCHAT_BACKEND_URL";
const CONNECT_TIMEOUT_ENV: &str = "FINCHAT_CONNECT_TIMEOUT_SECS";
const FORWARD_ATTACHMENTS_ENV: &str = "FINCHAT_FORWARD_ATTACHMENTS";
const MAX_HISTORY_LINES_ENV: &str = "FINCHAT_MAX_HISTORY_LINES";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub backend_url: String,
    pub connect_timeout_secs: u64,
    pub forward_attachments: bool,
    pub max_history_lines: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend_url: DEFAULT_BACKEND_URL.to_string(),
            connect_timeout_secs: DEFAULT_CONNECT_TIMEOUT_SECS,
            forward_attachments: false,
            max_history_lines: DEFAULT_MAX_HISTORY_LINES,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let backend_url = std::env::var(BACKEND_URL_ENV)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| DEFAULT_BACKEND_URL.to_string());
        let connect_timeout_secs = std::env::var(CONNECT_TIMEOUT_ENV)
            .ok()
            .and_then(|v| v.trim().parse::<u64>().ok())
            .filter(|secs| *secs > 0)
            .unwrap_or(DEFAULT_CONNECT_TIMEOUT_SECS);
        let forward_attachments = std::env::var(FORWARD_ATTACHMENTS_ENV)
            .ok()
            .and_then(parse_bool_flag)
            .unwrap_or(false);
        let max_history_lines = std::env::var(MAX_HISTORY_LINES_ENV)
            .ok()
            .and_then(|v| v.trim().parse::<usize>().ok())
            .filter(|cap| *cap > 0)
            .unwrap_or(DEFAULT_MAX_HISTORY_LINES);

        Ok(Self {
            backend_url,
            connect_timeout_secs,
            forward_attachments,
            max_history_lines,
        })
    }

    pub fn validate(&self) -> Result<()> {
        if !self.backend_url.starts_with("http://") && !self.backend_url.starts_with("https://") {
            bail!(
                "Invalid {BACKEND_URL_ENV} '{}': expected http:// or https:// URL",
                self.backend_url
            );
        }

        if let Err(error) = Url::parse(&self.backend_url) {
            bail!(
                "Invalid {BACKEND_URL_ENV} '{}': {error}",
                self.backend_url
            );
        }

        if self.max_history_lines == 0 {
            bail!("{MAX_HISTORY_LINES_ENV} must be greater than zero");
        }

        Ok(())
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn is_local_backend(&self) -> bool {
        is_local_endpoint_url(&self.backend_url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clear_env() {
        for key in [
            BACKEND_URL_ENV,
            CONNECT_TIMEOUT_ENV,
            FORWARD_ATTACHMENTS_ENV,
            MAX_HISTORY_LINES_ENV,
        ] {
            std::env::remove_var(key);
        }
    }

    #[test]
    fn test_load_defaults_to_local_backend() {
        let _env_lock = crate::test_support::ENV_LOCK.blocking_lock();
        clear_env();

        let config = Config::load().expect("config should load");
        assert_eq!(config.backend_url, DEFAULT_BACKEND_URL);
        assert_eq!(config.connect_timeout(), Duration::from_secs(10));
        assert!(!config.forward_attachments);
        assert!(config.is_local_backend());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_reads_overrides_and_ignores_bad_numbers() {
        let _env_lock = crate::test_support::ENV_LOCK.blocking_lock();
        clear_env();
        std::env::set_var(BACKEND_URL_ENV, " https://agent.example.com/chat ");
        std::env::set_var(CONNECT_TIMEOUT_ENV, "not-a-number");
        std::env::set_var(FORWARD_ATTACHMENTS_ENV, "on");
        std::env::set_var(MAX_HISTORY_LINES_ENV, "0");

        let config = Config::load().expect("config should load");
        assert_eq!(config.backend_url, "https://agent.example.com/chat");
        assert_eq!(config.connect_timeout_secs, DEFAULT_CONNECT_TIMEOUT_SECS);
        assert!(config.forward_attachments);
        assert_eq!(config.max_history_lines, DEFAULT_MAX_HISTORY_LINES);
        assert!(!config.is_local_backend());
        clear_env();
    }
}
