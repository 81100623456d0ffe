//! Watchdog configuration.
//!
//! Loaded once at startup from a YAML file and shared immutably for the
//! lifetime of the process. Durations are plain second counts; the accessor
//! methods convert them to the types the rest of the crate works with.

use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Configuration errors raised during load or validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("failed to parse config file '{path}': {source}")]
    Parse {
        path: String,
        source: serde_yaml::Error,
    },

    #[error("invalid configuration: {reason}")]
    Invalid { reason: String },
}

/// Top-level application settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    pub watchdog: WatchdogConfig,

    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub server: ServerConfig,
}

/// Watchdog-specific configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WatchdogConfig {
    /// Namespaces to monitor, processed in order each cycle.
    pub namespaces: Vec<String>,

    /// Label filters applied when listing pods. All entries must match.
    #[serde(default)]
    pub label_selectors: HashMap<String, String>,

    /// Seconds between monitoring cycles.
    #[serde(default = "default_schedule_interval_secs")]
    pub schedule_interval_secs: u64,

    /// Maximum pod lifetime in seconds before termination.
    #[serde(default = "default_max_pod_lifetime_secs")]
    pub max_pod_lifetime_secs: u64,

    /// When set, qualifying terminations are logged and counted but not executed.
    #[serde(default)]
    pub dry_run: bool,

    /// Pod label carrying an explicit expiry Unix timestamp. Empty means the
    /// creation-age policy is used on its own.
    #[serde(default)]
    pub ttl_label: String,
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoggingConfig {
    /// "production" (JSON output) or "development" (human-readable).
    pub mode: String,

    /// Log level: trace, debug, info, warn or error. Unknown values fall
    /// back to info.
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            mode: "production".to_string(),
            level: "info".to_string(),
        }
    }
}

/// HTTP server configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerConfig {
    /// Listen address for health and metrics endpoints.
    pub addr: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: "0.0.0.0:8080".to_string(),
        }
    }
}

fn default_schedule_interval_secs() -> u64 {
    600
}

fn default_max_pod_lifetime_secs() -> u64 {
    86_400
}

impl Settings {
    /// Load settings from a YAML file and validate them.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let display = path.display().to_string();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: display.clone(),
            source,
        })?;
        let settings = Self::parse(&raw).map_err(|err| match err {
            ConfigError::Parse { source, .. } => ConfigError::Parse {
                path: display.clone(),
                source,
            },
            other => other,
        })?;
        Ok(settings)
    }

    /// Parse settings from YAML text and validate them.
    pub fn parse(raw: &str) -> Result<Self, ConfigError> {
        let settings: Self = serde_yaml::from_str(raw).map_err(|source| ConfigError::Parse {
            path: String::new(),
            source,
        })?;
        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.watchdog.namespaces.is_empty() {
            return Err(ConfigError::Invalid {
                reason: "watchdog.namespaces must not be empty".to_string(),
            });
        }
        if self.watchdog.schedule_interval_secs == 0 {
            return Err(ConfigError::Invalid {
                reason: "watchdog.scheduleIntervalSecs must be greater than zero".to_string(),
            });
        }
        if self.watchdog.max_pod_lifetime_secs == 0 {
            return Err(ConfigError::Invalid {
                reason: "watchdog.maxPodLifetimeSecs must be greater than zero".to_string(),
            });
        }
        Ok(())
    }
}

impl WatchdogConfig {
    /// Interval between scheduled monitoring cycles.
    pub fn schedule_interval(&self) -> Duration {
        Duration::from_secs(self.schedule_interval_secs)
    }

    /// Maximum pod lifetime before the creation-age rule fires.
    pub fn max_pod_lifetime(&self) -> chrono::Duration {
        chrono::Duration::seconds(i64::try_from(self.max_pod_lifetime_secs).unwrap_or(i64::MAX))
    }
}
