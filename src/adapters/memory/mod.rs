//! In-Memory Adapters
//!
//! Implementations of the `StatefulEntity` and `TransactionScope` ports that
//! keep everything in process memory.
//!
//! ## Available Adapters
//!
//! - **InMemoryStore** - attribute storage with per-thread nested scopes
//! - **Record** / **Model** - a dynamic entity and the type it belongs to
//!
//! ## Usage
//!
//! ```ignore
//! use transitioner::adapters::memory::{InMemoryStore, Model, Record};
//!
//! let store = Arc::new(InMemoryStore::new());
//! let model = Arc::new(Model::new(Arc::new(table)));
//! let mut post = Record::create(&store, &model, [("title", json!("Hello"))])?;
//! post.transition_to("published", TransitionOptions::default())?;
//! ```

mod record;
mod store;

pub use record::{Model, Record, RecordValidator};
pub use store::{Attributes, InMemoryStore};
