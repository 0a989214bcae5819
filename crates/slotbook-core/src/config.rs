//! Application configuration management.
//!
//! Two pieces live here:
//!
//! - `ApiConfig`: the API base URL, resolved once at startup from
//!   `SLOTBOOK_API_URL`, then the config file, then the built-in default.
//! - `Config`: small on-disk preferences (last email used, admin page size),
//!   stored at `~/.config/slotbook/config.json`.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Application name used for config/data directory paths
const APP_NAME: &str = "slotbook";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// Environment variable that overrides the API base URL
pub const API_URL_ENV: &str = "SLOTBOOK_API_URL";

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:5000/api";

/// Rows per page on the admin bookings table.
pub const DEFAULT_ADMIN_PAGE_SIZE: u32 = 10;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Could not find {0} directory")]
    NoDirectory(&'static str),

    #[error("Config I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config file is invalid: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    pub api_base_url: Option<String>,
    pub last_email: Option<String>,
    pub admin_page_size: Option<u32>,
}

impl Config {
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::config_path()?;
        if path.exists() {
            let contents = std::fs::read_to_string(&path)?;
            Ok(serde_json::from_str(&contents)?)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<(), ConfigError> {
        let path = Self::config_path()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    fn config_path() -> Result<PathBuf, ConfigError> {
        let config_dir = dirs::config_dir().ok_or(ConfigError::NoDirectory("config"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    /// Directory holding session storage and logs.
    pub fn data_dir() -> Result<PathBuf, ConfigError> {
        let data_dir = dirs::data_dir().ok_or(ConfigError::NoDirectory("data"))?;
        Ok(data_dir.join(APP_NAME))
    }

    pub fn admin_page_size(&self) -> u32 {
        self.admin_page_size
            .filter(|n| *n > 0)
            .unwrap_or(DEFAULT_ADMIN_PAGE_SIZE)
    }
}

/// Where the gateway sends requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiConfig {
    pub base_url: String,
}

impl ApiConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Resolve from the process environment, then the config file, then
    /// the default.
    pub fn resolve(config: &Config) -> Self {
        Self::resolve_from(std::env::var(API_URL_ENV).ok(), config)
    }

    pub fn resolve_from(env_value: Option<String>, config: &Config) -> Self {
        let chosen = env_value
            .filter(|v| !v.trim().is_empty())
            .or_else(|| config.api_base_url.clone().filter(|v| !v.trim().is_empty()))
            .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string());
        Self::new(chosen.trim())
    }

    /// Join an endpoint path (leading `/` optional) onto the base URL.
    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self::new(DEFAULT_API_BASE_URL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_prefers_env() {
        let config = Config {
            api_base_url: Some("http://file:1/api".to_string()),
            ..Default::default()
        };
        let api = ApiConfig::resolve_from(Some("https://env.example.com/api/".to_string()), &config);
        assert_eq!(api.base_url, "https://env.example.com/api");
    }

    #[test]
    fn test_resolve_falls_back_to_file_then_default() {
        let config = Config {
            api_base_url: Some("http://file:1/api".to_string()),
            ..Default::default()
        };
        assert_eq!(ApiConfig::resolve_from(None, &config).base_url, "http://file:1/api");
        assert_eq!(
            ApiConfig::resolve_from(Some("  ".to_string()), &Config::default()).base_url,
            DEFAULT_API_BASE_URL
        );
    }

    #[test]
    fn test_url_join() {
        let api = ApiConfig::default();
        assert_eq!(api.url("/login"), "http://localhost:5000/api/login");
        assert_eq!(api.url("slots?from=a"), "http://localhost:5000/api/slots?from=a");
    }

    #[test]
    fn test_admin_page_size_default() {
        assert_eq!(Config::default().admin_page_size(), DEFAULT_ADMIN_PAGE_SIZE);
        let zero = Config {
            admin_page_size: Some(0),
            ..Default::default()
        };
        assert_eq!(zero.admin_page_size(), DEFAULT_ADMIN_PAGE_SIZE);
    }
}
