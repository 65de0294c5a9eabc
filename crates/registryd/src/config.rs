//! Daemon configuration.
//!
//! Values are layered: built-in defaults, then an optional TOML file, then
//! `REGISTRY_*` environment variables. Command-line flags are applied on top
//! by the binary.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default connector channel address.
pub const DEFAULT_CONNECTOR_ADDR: &str = "0.0.0.0:7040";

/// Default client channel address.
pub const DEFAULT_CLIENT_ADDR: &str = "0.0.0.0:6090";

/// Default telemetry interval in milliseconds.
pub const DEFAULT_LOG_INTERVAL_MS: u64 = 1000;

/// Default registry instance name.
pub const DEFAULT_NAME: &str = "registry";

/// Errors raised while loading configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid value for {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

/// Runtime configuration for the registry daemon.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RegistryConfig {
    /// Listen address for backend server events
    pub connector_addr: String,

    /// Listen address for client lookups
    pub client_addr: String,

    /// Remote logger receiving telemetry as JSON lines
    pub logger_addr: Option<String>,

    pub log_interval_ms: u64,

    /// Instance name stamped on telemetry
    pub name: String,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            connector_addr: DEFAULT_CONNECTOR_ADDR.to_string(),
            client_addr: DEFAULT_CLIENT_ADDR.to_string(),
            logger_addr: None,
            log_interval_ms: DEFAULT_LOG_INTERVAL_MS,
            name: DEFAULT_NAME.to_string(),
        }
    }
}

impl RegistryConfig {
    /// Loads configuration from defaults, an optional file and the process
    /// environment.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.with_env_overrides(|key| std::env::var(key).ok())
    }

    /// Parses a TOML file. Missing keys keep their defaults.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Applies `REGISTRY_*` overrides read through `lookup`.
    pub fn with_env_overrides<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("REGISTRY_CONNECTOR_ADDR") {
            self.connector_addr = v;
        }
        if let Some(v) = lookup("REGISTRY_CLIENT_ADDR") {
            self.client_addr = v;
        }
        if let Some(v) = lookup("REGISTRY_LOGGER_ADDR") {
            self.logger_addr = if v.is_empty() { None } else { Some(v) };
        }
        if let Some(v) = lookup("REGISTRY_LOG_INTERVAL_MS") {
            self.log_interval_ms = v.parse().map_err(|e| ConfigError::Invalid {
                key: "log_interval_ms",
                reason: format!("{v:?}: {e}"),
            })?;
        }
        if let Some(v) = lookup("REGISTRY_NAME") {
            self.name = v;
        }

        self.validate()?;
        Ok(self)
    }

    /// Checks cross-field constraints.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.log_interval_ms == 0 {
            return Err(ConfigError::Invalid {
                key: "log_interval_ms",
                reason: "must be greater than zero".to_string(),
            });
        }
        if self.connector_addr.is_empty() {
            return Err(ConfigError::Invalid {
                key: "connector_addr",
                reason: "must not be empty".to_string(),
            });
        }
        if self.client_addr.is_empty() {
            return Err(ConfigError::Invalid {
                key: "client_addr",
                reason: "must not be empty".to_string(),
            });
        }
        Ok(())
    }

    /// Telemetry tick period.
    pub fn log_interval(&self) -> Duration {
        Duration::from_millis(self.log_interval_ms)
    }
}
