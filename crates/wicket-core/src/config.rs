//! Application configuration management.
//!
//! This module handles loading and saving the application configuration,
//! which includes the identity API base URL, the Google client identifier,
//! the request timeout, and the last used email address.
//!
//! Configuration is stored at `~/.config/wicket/config.json`. Environment
//! variables override the file: `WICKET_API_BASE_URL`,
//! `WICKET_GOOGLE_CLIENT_ID`, and `WICKET_TIMEOUT_SECS`.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Application name used for config/token/log directory paths
const APP_NAME: &str = "wicket";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// Default HTTP request timeout in seconds.
/// 30s allows for slow API responses while failing fast enough for good UX.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub api_base_url: Option<String>,
    pub google_client_id: Option<String>,
    /// Per-request timeout in seconds, applied to every API and provider call.
    #[serde(default = "default_timeout_secs")]
    pub request_timeout_secs: u64,
    pub last_email: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: None,
            google_client_id: None,
            request_timeout_secs: DEFAULT_TIMEOUT_SECS,
            last_email: None,
        }
    }
}

impl Config {
    /// Load configuration from disk, then apply environment overrides
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        let mut config = if path.exists() {
            let contents = std::fs::read_to_string(&path)?;
            serde_json::from_str(&contents)?
        } else {
            Self::default()
        };
        config.apply_env();
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Environment variables take precedence over the config file
    fn apply_env(&mut self) {
        if let Ok(url) = std::env::var("WICKET_API_BASE_URL") {
            if !url.is_empty() {
                self.api_base_url = Some(url);
            }
        }
        if let Ok(id) = std::env::var("WICKET_GOOGLE_CLIENT_ID") {
            if !id.is_empty() {
                self.google_client_id = Some(id);
            }
        }
        if let Ok(secs) = std::env::var("WICKET_TIMEOUT_SECS") {
            if let Ok(secs) = secs.parse() {
                self.request_timeout_secs = secs;
            }
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    /// Directory for the session-scoped token file.
    /// The runtime directory is wiped by the OS at session end, which gives the
    /// token the intended lifetime; the temp directory is the fallback.
    pub fn session_token_dir() -> PathBuf {
        dirs::runtime_dir()
            .unwrap_or_else(std::env::temp_dir)
            .join(APP_NAME)
    }

    /// Directory for log files
    pub fn log_dir() -> Option<PathBuf> {
        dirs::state_dir()
            .or_else(dirs::cache_dir)
            .map(|dir| dir.join(APP_NAME).join("logs"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.request_timeout_secs, 30);
        assert!(config.api_base_url.is_none());
        assert!(config.google_client_id.is_none());
        assert!(config.last_email.is_none());
    }

    #[test]
    fn test_timeout_default_when_absent_from_file() {
        // Older config files predate the timeout field
        let config: Config = serde_json::from_str(r#"{"api_base_url": "http://localhost:9000"}"#)
            .expect("Failed to parse config JSON");
        assert_eq!(config.api_base_url.as_deref(), Some("http://localhost:9000"));
        assert_eq!(config.request_timeout_secs, 30);
    }

    #[test]
    fn test_config_round_trip() {
        let config = Config {
            api_base_url: Some("https://api.example.com".to_string()),
            google_client_id: Some("client-123".to_string()),
            request_timeout_secs: 10,
            last_email: Some("a@x.com".to_string()),
        };
        let json = serde_json::to_string(&config).expect("Failed to serialize config");
        let parsed: Config = serde_json::from_str(&json).expect("Failed to parse config");
        assert_eq!(parsed.api_base_url, config.api_base_url);
        assert_eq!(parsed.google_client_id, config.google_client_id);
        assert_eq!(parsed.request_timeout_secs, 10);
        assert_eq!(parsed.last_email, config.last_email);
    }
}
