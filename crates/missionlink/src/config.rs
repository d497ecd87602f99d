//! Configuration management for missionlink.
//!
//! This module provides configuration loading and validation using figment,
//! supporting TOML config files, environment variables, and defaults.

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::telemetry::DEFAULT_HISTORY_CAPACITY;

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "config.toml";

/// Default configuration directory name.
const CONFIG_DIR_NAME: &str = "missionlink";

/// Prefix for environment variable overrides.
const ENV_PREFIX: &str = "MISSIONLINK_";

/// Application configuration.
///
/// Configuration is loaded from (in order of precedence, highest first):
/// 1. Environment variables (prefixed with `MISSIONLINK_`, sections split on `__`)
/// 2. TOML config file at `~/.config/missionlink/config.toml`
/// 3. Default values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Telemetry endpoint configuration.
    pub telemetry: TelemetryConfig,
    /// History retention configuration.
    pub history: HistoryConfig,
    /// Display configuration.
    pub display: DisplayConfig,
}

/// Telemetry endpoint configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TelemetryConfig {
    /// Base URL of the telemetry service.
    pub base_url: String,
    /// Path of the telemetry endpoint, appended to `base_url`.
    pub endpoint: String,
    /// Interval between polls in milliseconds.
    pub poll_interval_ms: u64,
    /// Per-request timeout in milliseconds.
    /// Set to 0 to wait indefinitely.
    pub request_timeout_ms: u64,
}

/// History retention configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    /// Maximum number of samples kept in memory.
    pub capacity: usize,
}

/// Display configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// Number of samples shown in the system log panel.
    pub log_lines: usize,
    /// Use ANSI colours in the terminal dashboard.
    pub color: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8000".to_string(),
            endpoint: "/api/telemetry/".to_string(),
            poll_interval_ms: 1000,
            request_timeout_ms: 5000,
        }
    }
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_HISTORY_CAPACITY,
        }
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            log_lines: 50,
            color: true,
        }
    }
}

impl Config {
    /// Load configuration from all sources.
    ///
    /// Configuration is loaded in this order (later sources override earlier):
    /// 1. Default values
    /// 2. TOML config file (if exists)
    /// 3. Environment variables (prefixed with `MISSIONLINK_`)
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load configuration with an optional custom config path.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load_from(config_path: Option<PathBuf>) -> Result<Self> {
        let config_file = config_path.unwrap_or_else(Self::default_config_path);

        let figment = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(&config_file))
            .merge(Env::prefixed(ENV_PREFIX).split("__"));

        let config: Config = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default configuration file path.
    #[must_use]
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from(".config"))
            .join(CONFIG_DIR_NAME)
            .join(CONFIG_FILE_NAME)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid.
    pub fn validate(&self) -> Result<()> {
        if self.telemetry.poll_interval_ms == 0 {
            return Err(Error::config_validation(
                "poll_interval_ms must be greater than 0",
            ));
        }

        if self.history.capacity == 0 {
            return Err(Error::config_validation(
                "history capacity must be greater than 0",
            ));
        }

        if !self.telemetry.endpoint.is_empty() && !self.telemetry.endpoint.starts_with('/') {
            return Err(Error::config_validation(format!(
                "endpoint must start with '/': {}",
                self.telemetry.endpoint
            )));
        }

        self.telemetry_url()?;
        Ok(())
    }

    /// Full URL of the telemetry endpoint.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL and endpoint don't form a valid
    /// http(s) URL.
    pub fn telemetry_url(&self) -> Result<reqwest::Url> {
        let raw = format!(
            "{}{}",
            self.telemetry.base_url.trim_end_matches('/'),
            self.telemetry.endpoint
        );
        let url = reqwest::Url::parse(&raw).map_err(|e| Error::invalid_url(&raw, e.to_string()))?;
        match url.scheme() {
            "http" | "https" => Ok(url),
            other => Err(Error::invalid_url(
                &raw,
                format!("unsupported scheme '{other}'"),
            )),
        }
    }

    /// Get the poll interval as a Duration.
    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.telemetry.poll_interval_ms)
    }

    /// Get the request timeout, or `None` if requests may wait indefinitely.
    #[must_use]
    pub fn request_timeout(&self) -> Option<Duration> {
        if self.telemetry.request_timeout_ms == 0 {
            None
        } else {
            Some(Duration::from_millis(self.telemetry.request_timeout_ms))
        }
    }
}
