//! Configuration for the Granary engine.
//!
//! Loaded from a TOML file. Every field has a default, so an empty file (or
//! no file at all) is a valid configuration.

use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::ConfigError;
use crate::logging::LogLevel;

/// Engine configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Queries slower than this many milliseconds are logged as warnings
    #[serde(default = "default_slow_query_threshold_ms")]
    pub slow_query_threshold_ms: u64,

    /// Default lifetime of an unused self-destructing webkey, in seconds
    #[serde(default)]
    pub self_destruct_ttl_secs: Option<u64>,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

fn default_slow_query_threshold_ms() -> u64 {
    200
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            slow_query_threshold_ms: default_slow_query_threshold_ms(),
            self_destruct_ttl_secs: None,
            log_level: LogLevel::default(),
        }
    }
}

impl EngineConfig {
    /// Load configuration from a TOML file.
    ///
    /// A missing file is not an error; defaults are used instead.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let config = match path {
            Some(path) => {
                info!("Loading configuration from {}", path.display());

                if !path.exists() {
                    warn!("Configuration file not found: {}", path.display());
                    return Ok(Self::default());
                }

                let content = fs::read_to_string(path).map_err(|e| {
                    ConfigError::LoadFailed(format!("{}: {}", path.display(), e))
                })?;
                Self::from_toml(&content)?
            }
            None => {
                info!("No configuration file specified, using defaults");
                Self::default()
            }
        };

        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from TOML text.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::ParseFailed(e.to_string()))
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.slow_query_threshold_ms == 0 {
            return Err(ConfigError::Invalid(
                "Slow query threshold cannot be zero".to_string(),
            ));
        }

        if self.self_destruct_ttl_secs == Some(0) {
            return Err(ConfigError::Invalid(
                "Self-destruct lifetime cannot be zero".to_string(),
            ));
        }

        Ok(())
    }

    /// The slow query threshold as a duration.
    pub fn slow_query_threshold(&self) -> Duration {
        Duration::from_millis(self.slow_query_threshold_ms)
    }

    /// The default self-destruct lifetime, if one is configured.
    pub fn self_destruct_ttl(&self) -> Option<Duration> {
        self.self_destruct_ttl_secs.map(Duration::from_secs)
    }
}
