//! Domain layer containing the workflow engine and its vocabulary.
//!
//! # Module Organization
//!
//! - `foundation` - Shared domain primitives (state names, IDs, error codes)
//! - `workflow` - State definitions, the transition table and the engine

pub mod foundation;
pub mod workflow;
