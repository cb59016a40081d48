//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the workflow engine and the persistence layer. Adapters implement them.
//!
//! - `StatefulEntity` - A record with a state attribute the engine can drive
//! - `TransactionScope` - Nested, independently abortable transaction scopes

mod stateful_entity;
mod transaction_scope;

pub use stateful_entity::StatefulEntity;
pub use transaction_scope::{ScopeToken, StorageError, TransactionScope};
