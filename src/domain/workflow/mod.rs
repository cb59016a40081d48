//! Workflow module - state definitions, the transition table and the engine
//! that moves entities between states.
//!
//! # Flow of one transition
//!
//! 1. [`TransitionEngine::transition_to`] builds a [`TransitionContext`]
//! 2. [`ValidationGate`] checks entity validity, legality and target validations
//! 3. [`CallbackRunner`] runs before-hooks, the write and after-hooks
//! 4. for transactional targets, [`TransactionCoordinator`] wraps step 3 in a
//!    nested scope and reconciles against storage afterwards

mod callbacks;
mod context;
mod definition;
mod engine;
mod errors;
mod gate;
mod machine;
mod table;
mod transaction;

#[cfg(test)]
pub(crate) mod testing;

pub use callbacks::{CallbackRun, CallbackRunner, OnFailedPersist};
pub use context::{HookResult, TransitionContext, TransitionOptions, ValidationContext};
pub use definition::{Hook, StateDefinition, Validation};
pub use engine::{Transitionable, TransitionEngine, TransitionOutcome};
pub use errors::{
    DefinitionError, EntityError, ErrorCollection, ErrorKind, HookPhase, RollbackRequest,
    TransitionRejection, BASE_ATTRIBUTE,
};
pub use gate::ValidationGate;
pub use machine::{StateMachineConfig, DEFAULT_STATE_ATTRIBUTE};
pub use table::{StateTable, StateTableBuilder};
pub use transaction::{TransactionCoordinator, TransactionReport};
