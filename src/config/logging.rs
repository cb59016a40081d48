//! Logging configuration

use serde::Deserialize;
use tracing_subscriber::EnvFilter;

use super::error::{ConfigError, ValidationError};

/// Output format of the fmt subscriber
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Filter directive, e.g. `info,transitioner=debug`
    #[serde(default = "default_level")]
    pub level: String,

    #[serde(default)]
    pub format: LogFormat,
}

impl LoggingConfig {
    /// Validate logging configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.level.trim().is_empty() {
            return Err(ValidationError::MissingRequired("logging.level"));
        }
        EnvFilter::try_new(&self.level).map_err(|_| ValidationError::InvalidLogLevel(self.level.clone()))?;
        Ok(())
    }

    /// Installs the global tracing subscriber.
    ///
    /// Falls back to `RUST_LOG` when the configured level does not parse.
    /// Returns `Ok(false)` if a subscriber was already installed.
    pub fn init(&self) -> Result<bool, ConfigError> {
        let filter = EnvFilter::try_new(&self.level)
            .or_else(|_| EnvFilter::try_from_default_env())
            .map_err(|err| ConfigError::LoggingInit(err.to_string()))?;

        let builder = tracing_subscriber::fmt().with_env_filter(filter).with_target(true);
        let installed = match self.format {
            LogFormat::Pretty => builder.try_init().is_ok(),
            LogFormat::Json => builder.json().try_init().is_ok(),
        };
        Ok(installed)
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            format: LogFormat::default(),
        }
    }
}

fn default_level() -> String {
    "info".to_string()
}
