//! Configuration error types

use thiserror::Error;

use crate::domain::workflow::DefinitionError;

/// Errors that can occur during configuration loading
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration loading failed: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Workflow file could not be parsed: {0}")]
    ParseError(#[from] serde_yaml::Error),

    #[error("Validation failed: {0}")]
    ValidationFailed(#[from] ValidationError),

    #[error("Logging initialisation failed: {0}")]
    LoggingInit(String),
}

/// Errors that can occur during configuration validation
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Required configuration missing: {0}")]
    MissingRequired(&'static str),

    #[error("Invalid log filter '{0}'")]
    InvalidLogLevel(String),

    #[error("State attribute must not be empty")]
    EmptyStateAttribute,

    #[error("Invalid workflow: {0}")]
    InvalidWorkflow(#[from] DefinitionError),
}
