//! Runtime configuration for the graph core.
//!
//! Values come from defaults, optionally overridden by `LAZYGRAPH_*`
//! environment variables set by the hosting layer.

use crate::db::DEFAULT_BUSY_TIMEOUT;
use crate::logging::default_log_level;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

pub const ENV_DB_PATH: &str = "LAZYGRAPH_DB_PATH";
pub const ENV_BUSY_TIMEOUT_MS: &str = "LAZYGRAPH_BUSY_TIMEOUT_MS";
pub const ENV_KEEP_ALIVE_SECS: &str = "LAZYGRAPH_KEEP_ALIVE_SECS";
pub const ENV_LOG_LEVEL: &str = "LAZYGRAPH_LOG_LEVEL";
pub const ENV_LOG_DIR: &str = "LAZYGRAPH_LOG_DIR";

const DEFAULT_KEEP_ALIVE_INTERVAL: Duration = Duration::from_secs(10 * 60);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("`{key}` must be a positive integer, got `{value}`")]
    InvalidNumber { key: &'static str, value: String },
}

/// Store, keep-alive and logging settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreConfig {
    /// Database file. `None` opens a private in-memory database.
    pub db_path: Option<PathBuf>,
    pub busy_timeout: Duration,
    /// Probe interval for the store keep-alive. Zero disables the probe.
    pub keep_alive_interval: Duration,
    pub log_level: String,
    /// Absolute directory for rolling log files. `None` leaves logging off.
    pub log_dir: Option<String>,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            db_path: None,
            busy_timeout: DEFAULT_BUSY_TIMEOUT,
            keep_alive_interval: DEFAULT_KEEP_ALIVE_INTERVAL,
            log_level: default_log_level().to_string(),
            log_dir: None,
        }
    }
}

impl CoreConfig {
    /// Builds a config from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a config from an arbitrary key lookup; blank values are ignored.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };
        let mut config = Self::default();

        if let Some(path) = read(ENV_DB_PATH) {
            config.db_path = Some(PathBuf::from(path));
        }
        if let Some(raw) = read(ENV_BUSY_TIMEOUT_MS) {
            config.busy_timeout = Duration::from_millis(parse_positive(ENV_BUSY_TIMEOUT_MS, raw)?);
        }
        if let Some(raw) = read(ENV_KEEP_ALIVE_SECS) {
            config.keep_alive_interval =
                Duration::from_secs(parse_positive(ENV_KEEP_ALIVE_SECS, raw)?);
        }
        if let Some(level) = read(ENV_LOG_LEVEL) {
            config.log_level = level;
        }
        config.log_dir = read(ENV_LOG_DIR);

        Ok(config)
    }
}

fn parse_positive(key: &'static str, raw: String) -> Result<u64, ConfigError> {
    match raw.parse::<u64>() {
        Ok(value) if value > 0 => Ok(value),
        _ => Err(ConfigError::InvalidNumber { key, value: raw }),
    }
}
