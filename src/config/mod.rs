//! Application configuration module
//!
//! This module provides type-safe configuration loading from environment variables
//! using the `config` and `dotenvy` crates. Configuration is loaded with the
//! `TRANSITIONER` prefix and nested values use double underscores as separators.
//! Workflow files are loaded separately through [`WorkflowSpec`].
//!
//! # Example
//!
//! ```no_run
//! use transitioner::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//! config.logging.init().expect("Failed to initialise logging");
//! ```

mod error;
mod logging;
mod machine;
mod workflow;

pub use error::{ConfigError, ValidationError};
pub use logging::{LogFormat, LoggingConfig};
pub use machine::MachineDefaults;
pub use workflow::{StateSpec, WorkflowSpec};

use serde::Deserialize;

/// Root application configuration
///
/// Every section has defaults, so an empty environment loads successfully.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Logging configuration (filter and output format)
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Defaults for state machines built in code
    #[serde(default)]
    pub machine: MachineDefaults,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// This function:
    /// 1. Loads `.env` file if present (for development)
    /// 2. Reads environment variables with `TRANSITIONER` prefix
    /// 3. Uses `__` (double underscore) to separate nested values
    /// 4. Deserializes into typed configuration structs
    ///
    /// # Environment Variable Format
    ///
    /// - `TRANSITIONER__LOGGING__LEVEL=debug` -> `logging.level = "debug"`
    /// - `TRANSITIONER__MACHINE__STATE_ATTRIBUTE=phase` -> `machine.state_attribute = "phase"`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if values cannot be parsed into expected types
    pub fn load() -> Result<Self, ConfigError> {
        // Load .env file if present (development)
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("TRANSITIONER")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validate all configuration values
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` if any configuration value is invalid.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.logging.validate()?;
        self.machine.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::Mutex;

    // Mutex to ensure tests don't run in parallel (env vars are global)
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    /// Helper to clear environment variables after testing
    fn clear_env() {
        env::remove_var("TRANSITIONER__LOGGING__LEVEL");
        env::remove_var("TRANSITIONER__LOGGING__FORMAT");
        env::remove_var("TRANSITIONER__MACHINE__STATE_ATTRIBUTE");
        env::remove_var("TRANSITIONER__MACHINE__STATE_VALIDATIONS_ON_OBJECT");
    }

    #[test]
    fn test_load_defaults() {
        let _guard = ENV_MUTEX.lock().unwrap();
        clear_env();
        let result = AppConfig::load();

        assert!(result.is_ok(), "Failed to load config: {:?}", result.err());
        let config = result.unwrap();
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.logging.format, LogFormat::Pretty);
        assert_eq!(config.machine, MachineDefaults::default());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_from_environment() {
        let _guard = ENV_MUTEX.lock().unwrap();
        env::set_var("TRANSITIONER__LOGGING__LEVEL", "debug");
        env::set_var("TRANSITIONER__LOGGING__FORMAT", "json");
        env::set_var("TRANSITIONER__MACHINE__STATE_ATTRIBUTE", "phase");
        env::set_var("TRANSITIONER__MACHINE__STATE_VALIDATIONS_ON_OBJECT", "false");
        let result = AppConfig::load();
        clear_env();

        let config = result.unwrap();
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.format, LogFormat::Json);
        assert_eq!(config.machine.state_attribute, "phase");
        assert!(!config.machine.state_validations_on_object);
    }

    #[test]
    fn test_validate_rejects_bad_level() {
        let _guard = ENV_MUTEX.lock().unwrap();
        env::set_var("TRANSITIONER__LOGGING__LEVEL", "transitioner=loud");
        let result = AppConfig::load();
        clear_env();

        let config = result.unwrap();
        assert!(matches!(config.validate(), Err(ValidationError::InvalidLogLevel(_))));
    }
}
