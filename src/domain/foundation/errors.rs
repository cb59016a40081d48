//! Error codes shared across the domain layer.

use std::fmt;

/// Error codes organized by category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // Gate errors
    IllegalTransition,
    UnknownState,
    ValidationFailed,

    // Execution errors
    PersistFailed,
    RolledBack,

    // Configuration errors
    ConfigurationDefect,
    InvalidDefinition,

    // Infrastructure errors
    EntityNotFound,
    StorageError,
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorCode::IllegalTransition => "ILLEGAL_TRANSITION",
            ErrorCode::UnknownState => "UNKNOWN_STATE",
            ErrorCode::ValidationFailed => "VALIDATION_FAILED",
            ErrorCode::PersistFailed => "PERSIST_FAILED",
            ErrorCode::RolledBack => "ROLLED_BACK",
            ErrorCode::ConfigurationDefect => "CONFIGURATION_DEFECT",
            ErrorCode::InvalidDefinition => "INVALID_DEFINITION",
            ErrorCode::EntityNotFound => "ENTITY_NOT_FOUND",
            ErrorCode::StorageError => "STORAGE_ERROR",
        };
        write!(f, "{}", s)
    }
}
