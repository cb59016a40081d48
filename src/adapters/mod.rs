//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the domain to storage:
//! - `memory` - In-process attribute storage and dynamic records

pub mod memory;

pub use memory::{InMemoryStore, Model, Record};
