//! Foundation module - Shared domain primitives.
//!
//! Contains identifiers, state names and error codes that form the
//! vocabulary of every workflow.

mod errors;
mod ids;
mod state_name;

pub use errors::ErrorCode;
pub use ids::EntityId;
pub use state_name::StateName;
