//! Configuration module
//!
//! Client configuration is read from a TOML file
//! (`~/.config/piano-admin/config.toml` by default). Every section and
//! field has a default, so a partial file, or none at all, is valid.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::domain::QueryOptions;
use crate::shared::{ConfigError, RetryConfig};

/// Full client configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub api: ApiConfig,
    pub query: QueryConfig,
    pub hub: HubConfig,
    pub logging: LoggingConfig,
}

/// Backend REST API connection
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL every resource path is appended to
    pub base_url: String,
    /// Transport timeout per request, in seconds
    pub timeout_secs: u64,
    /// Static bearer token; normally supplied by the auth collaborator instead
    pub token: Option<String>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5000/api".to_string(),
            timeout_secs: 10,
            token: None,
        }
    }
}

impl ApiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Defaults for list / combobox bindings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryConfig {
    pub page_size: u32,
    pub sort_column: String,
    pub descending: bool,
    /// Quiet period before a search term change refetches, in milliseconds
    pub debounce_ms: u64,
}

impl Default for QueryConfig {
    fn default() -> Self {
        let options = QueryOptions::default();
        Self {
            page_size: options.page_size,
            sort_column: options.sort_column,
            descending: options.descending,
            debounce_ms: 300,
        }
    }
}

impl QueryConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn options(&self) -> QueryOptions {
        QueryOptions {
            page_size: self.page_size,
            sort_column: self.sort_column.clone(),
            descending: self.descending,
            filters: Vec::new(),
        }
    }
}

/// Notification hub connection
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HubConfig {
    /// WebSocket URL; `None` disables the hub
    pub url: Option<String>,
    /// Connection attempts before the hub gives up
    pub reconnect_attempts: u32,
    pub reconnect_delay_ms: u64,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            url: None,
            reconnect_attempts: 5,
            reconnect_delay_ms: 500,
        }
    }
}

impl HubConfig {
    pub fn retry(&self) -> RetryConfig {
        RetryConfig {
            max_attempts: self.reconnect_attempts.max(1),
            initial_delay: Duration::from_millis(self.reconnect_delay_ms),
            ..RetryConfig::default()
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `EnvFilter` directive, e.g. `info` or `piano_admin=debug`
    pub level: String,
    /// `text` or `json`
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "text".to_string(),
        }
    }
}

impl AppConfig {
    /// Load and validate a TOML config file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_toml(&raw)
    }

    pub fn from_toml(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api.base_url.trim().is_empty() {
            return Err(ConfigError::Invalid("api.base_url must not be empty".into()));
        }
        if self.api.timeout_secs == 0 {
            return Err(ConfigError::Invalid("api.timeout_secs must be positive".into()));
        }
        if self.query.page_size == 0 {
            return Err(ConfigError::Invalid("query.page_size must be positive".into()));
        }
        Ok(())
    }
}

/// `<config_dir>/piano-admin/config.toml`, or `./config.toml` when the
/// platform has no config directory
pub fn default_config_path() -> PathBuf {
    dirs_next::config_dir()
        .map(|dir| dir.join("piano-admin").join("config.toml"))
        .unwrap_or_else(|| PathBuf::from("config.toml"))
}
