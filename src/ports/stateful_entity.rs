//! Stateful Entity Port - The contract a persisted record fulfils to be
//! driven by a [`TransitionEngine`](crate::domain::workflow::TransitionEngine).
//!
//! The engine never creates or destroys entities. It reads the state
//! attribute, writes it through [`StatefulEntity::persist_state`], appends to
//! the entity's error collection and, for transactional states, reloads the
//! entity to observe what storage actually holds.

use std::sync::Arc;

use super::{StorageError, TransactionScope};
use crate::domain::foundation::StateName;
use crate::domain::workflow::{ErrorCollection, StateTable};

/// A record that carries a named state attribute.
pub trait StatefulEntity: Sized {
    /// The state table this entity type is wired to.
    fn state_table(&self) -> &Arc<StateTable<Self>>;

    /// The in-memory value of the state attribute, if set.
    fn current_state(&self) -> Option<StateName>;

    /// Writes `state` to the state attribute and persists the entity.
    ///
    /// Returns `Ok(false)` when the write did not take effect (for example
    /// because the entity failed its own validations). `Err` is reserved for
    /// faults of the storage itself.
    fn persist_state(&mut self, state: &StateName) -> Result<bool, StorageError>;

    /// Refreshes every attribute from storage.
    fn reload(&mut self) -> Result<(), StorageError>;

    /// Runs the entity's own validations, recording failures in its errors.
    fn is_valid(&mut self) -> bool;

    fn errors(&self) -> &ErrorCollection;

    fn errors_mut(&mut self) -> &mut ErrorCollection;

    /// Transient flag that suppresses state validations while set.
    fn skip_state_validations(&self) -> bool;

    fn set_skip_state_validations(&mut self, skip: bool);

    /// The transaction boundary this entity's writes participate in.
    fn transaction_scope(&self) -> Arc<dyn TransactionScope>;

    /// Name of the attribute holding the state.
    fn state_attribute(&self) -> &str {
        self.state_table().state_attribute()
    }

    /// Returns true if the entity is currently in `state`.
    fn is_in_state(&self, state: &str) -> bool {
        self.current_state().is_some_and(|current| current == state)
    }
}
