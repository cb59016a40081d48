//! Transaction Scope Port - Interface for nested commit/abort boundaries.
//!
//! Transactional states run their transition inside a scope opened through
//! this port. The scope must behave like a savepoint: independent of any
//! scope the caller already has open, discardable on its own, and invisible
//! to other connections until the outermost scope commits.

use std::fmt;

use crate::domain::foundation::{EntityId, ErrorCode};

/// Fatal errors raised by the persistence layer.
///
/// These are the only errors that escape a transition attempt; every
/// expected failure is reported as a rejected outcome instead.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StorageError {
    #[error("Entity not found: {0}")]
    NotFound(EntityId),

    #[error("No transaction scope is open")]
    NoActiveScope,

    #[error("Scope {actual} is not the innermost open scope (expected {expected})")]
    ScopeMismatch { expected: ScopeToken, actual: ScopeToken },

    #[error("Storage lock poisoned")]
    LockPoisoned,

    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

impl StorageError {
    pub fn code(&self) -> ErrorCode {
        match self {
            StorageError::NotFound(_) => ErrorCode::EntityNotFound,
            _ => ErrorCode::StorageError,
        }
    }
}

/// Handle to an open transaction scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ScopeToken(u64);

impl ScopeToken {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn id(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ScopeToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Port for opening and resolving nested transaction scopes.
pub trait TransactionScope: Send + Sync {
    /// Opens a new scope nested inside whatever the caller has open.
    ///
    /// The scope never joins an enclosing one: aborting it discards only
    /// the writes made since it was opened.
    fn begin_independent(&self) -> Result<ScopeToken, StorageError>;

    /// Makes the scope's writes part of its parent (or durable, if outermost).
    ///
    /// # Errors
    /// `ScopeMismatch` if `scope` is not the innermost open scope.
    fn commit(&self, scope: ScopeToken) -> Result<(), StorageError>;

    /// Discards every write made inside the scope.
    ///
    /// # Errors
    /// `ScopeMismatch` if `scope` is not the innermost open scope.
    fn abort(&self, scope: ScopeToken) -> Result<(), StorageError>;
}
