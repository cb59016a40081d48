//! The transition entry point.
//!
//! [`TransitionEngine::transition_to`] gates the request, then either runs the
//! hooks around a plain write or hands the whole thing to the
//! [`TransactionCoordinator`]. Every expected failure comes back as `false`
//! (or as a [`TransitionRejection`] from [`TransitionEngine::attempt`]); only
//! storage faults are returned as errors.

use std::fmt;
use std::sync::Arc;

use tracing::{debug, info, warn};

use super::callbacks::{CallbackRunner, OnFailedPersist};
use super::context::{TransitionContext, TransitionOptions};
use super::errors::{HookPhase, TransitionRejection};
use super::gate::ValidationGate;
use super::table::StateTable;
use super::transaction::TransactionCoordinator;
use crate::domain::foundation::StateName;
use crate::ports::{StatefulEntity, StorageError};

/// The result of one transition attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransitionOutcome {
    /// The entity is now in `to`.
    Transitioned { from: Option<StateName>, to: StateName },
    /// The attempt did not take effect.
    Rejected(TransitionRejection),
}

impl TransitionOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, TransitionOutcome::Transitioned { .. })
    }

    pub fn rejection(&self) -> Option<&TransitionRejection> {
        match self {
            TransitionOutcome::Rejected(rejection) => Some(rejection),
            TransitionOutcome::Transitioned { .. } => None,
        }
    }
}

impl fmt::Display for TransitionOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransitionOutcome::Transitioned { from: Some(from), to } => {
                write!(f, "transitioned from {} to {}", from, to)
            }
            TransitionOutcome::Transitioned { from: None, to } => write!(f, "transitioned to {}", to),
            TransitionOutcome::Rejected(rejection) => write!(f, "rejected: {}", rejection),
        }
    }
}

/// Drives entities of one type through their state table.
pub struct TransitionEngine<E> {
    table: Arc<StateTable<E>>,
}

impl<E> Clone for TransitionEngine<E> {
    fn clone(&self) -> Self {
        Self {
            table: Arc::clone(&self.table),
        }
    }
}

impl<E> fmt::Debug for TransitionEngine<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransitionEngine")
            .field("workflow", &self.table.workflow())
            .finish()
    }
}

impl<E: StatefulEntity> TransitionEngine<E> {
    pub fn new(table: Arc<StateTable<E>>) -> Self {
        Self { table }
    }

    /// Engine over the table the entity is wired to.
    pub fn for_entity(entity: &E) -> Self {
        Self::new(Arc::clone(entity.state_table()))
    }

    pub fn table(&self) -> &Arc<StateTable<E>> {
        &self.table
    }

    /// Moves `entity` to `desired`.
    ///
    /// Returns `Ok(true)` if the entity ended up in `desired` and `Ok(false)`
    /// for every expected failure: illegal or unknown target, failed
    /// validations, a failed write, or a rollback.
    ///
    /// # Errors
    ///
    /// Only storage faults.
    pub fn transition_to(
        &self,
        entity: &mut E,
        desired: impl Into<StateName>,
        options: TransitionOptions,
    ) -> Result<bool, StorageError> {
        Ok(self.attempt(entity, desired, options)?.is_success())
    }

    /// Like [`transition_to`](Self::transition_to), reporting why an attempt
    /// was rejected.
    pub fn attempt(
        &self,
        entity: &mut E,
        desired: impl Into<StateName>,
        options: TransitionOptions,
    ) -> Result<TransitionOutcome, StorageError> {
        let desired = desired.into();
        let result = {
            let mut skipping = SkipFlag::raise(entity, options.skip_validations);
            self.perform(&mut *skipping.entity, desired.clone(), options)
        };

        match &result {
            Ok(TransitionOutcome::Transitioned { from, to }) => {
                info!(
                    workflow = %self.table.workflow(),
                    from = ?from.as_ref().map(StateName::as_str),
                    to = %to,
                    "State transitioned"
                );
            }
            Ok(TransitionOutcome::Rejected(
                rejection @ (TransitionRejection::RolledBack(_) | TransitionRejection::ConfigurationDefect { .. }),
            )) => {
                warn!(
                    workflow = %self.table.workflow(),
                    to = %desired,
                    code = %rejection.code(),
                    "Transition rejected: {}",
                    rejection
                );
            }
            Ok(TransitionOutcome::Rejected(rejection)) => {
                debug!(
                    workflow = %self.table.workflow(),
                    to = %desired,
                    code = %rejection.code(),
                    "Transition rejected: {}",
                    rejection
                );
            }
            Err(err) => {
                warn!(workflow = %self.table.workflow(), to = %desired, error = %err, "Transition failed");
            }
        }

        result
    }

    fn perform(
        &self,
        entity: &mut E,
        desired: StateName,
        options: TransitionOptions,
    ) -> Result<TransitionOutcome, StorageError> {
        let from = entity.current_state();
        let mut ctx = TransitionContext::new(entity, from.clone(), desired.clone(), options);

        if let Err(rejection) = ValidationGate::check(&self.table, &mut ctx) {
            return Ok(TransitionOutcome::Rejected(rejection));
        }

        // Skipping the gate never lets an entity enter an unregistered state.
        let Some(definition) = self.table.definition(desired.as_str()) else {
            return Ok(TransitionOutcome::Rejected(TransitionRejection::UnknownState(desired)));
        };

        let write = |entity: &mut E| entity.persist_state(&desired);

        if definition.is_transactional() {
            let report = TransactionCoordinator::run(&mut ctx, |ctx| {
                CallbackRunner::run_around(definition, ctx, OnFailedPersist::RequestRollback, write)
            })?;
            if report.reconciled {
                return Ok(TransitionOutcome::Transitioned { from, to: desired });
            }
            let rejection = match report.rollback {
                Some(request) if request.phase() == HookPhase::Persist => TransitionRejection::PersistFailure,
                other => TransitionRejection::RolledBack(other),
            };
            return Ok(TransitionOutcome::Rejected(rejection));
        }

        let run = CallbackRunner::run_around(definition, &mut ctx, OnFailedPersist::Continue, write)?;
        match run.rollback {
            Some(request) if !run.action_ran => {
                Ok(TransitionOutcome::Rejected(TransitionRejection::RolledBack(Some(request))))
            }
            Some(request) if run.persisted => {
                // Plain states have nothing to undo; the write stands.
                warn!(
                    workflow = %self.table.workflow(),
                    to = %desired,
                    "Ignoring {} for non-transactional state",
                    request
                );
                Ok(TransitionOutcome::Transitioned { from, to: desired })
            }
            _ if run.persisted => Ok(TransitionOutcome::Transitioned { from, to: desired }),
            _ => Ok(TransitionOutcome::Rejected(TransitionRejection::PersistFailure)),
        }
    }

    /// States reachable directly from `from`.
    pub fn possible_transitions(&self, from: &str) -> &[StateName] {
        self.table.possible_transitions(from)
    }

    pub fn is_transactional(&self, state: &str) -> bool {
        self.table.is_transactional(state)
    }
}

/// Holds an entity's skip flag for one call and lowers it on drop, including
/// when a hook or validation panics.
struct SkipFlag<'a, E: StatefulEntity> {
    entity: &'a mut E,
}

impl<'a, E: StatefulEntity> SkipFlag<'a, E> {
    fn raise(entity: &'a mut E, skip: bool) -> Self {
        entity.set_skip_state_validations(skip);
        Self { entity }
    }
}

impl<E: StatefulEntity> Drop for SkipFlag<'_, E> {
    fn drop(&mut self) {
        self.entity.set_skip_state_validations(false);
    }
}

/// Transition methods available on every [`StatefulEntity`].
///
/// ```ignore
/// use transitioner::domain::workflow::{Transitionable, TransitionOptions};
///
/// post.transition_to("published", TransitionOptions::default())?;
/// ```
pub trait Transitionable: StatefulEntity {
    /// See [`TransitionEngine::transition_to`].
    fn transition_to(
        &mut self,
        desired: impl Into<StateName>,
        options: TransitionOptions,
    ) -> Result<bool, StorageError> {
        TransitionEngine::for_entity(self).transition_to(self, desired, options)
    }

    /// See [`TransitionEngine::attempt`].
    fn attempt_transition(
        &mut self,
        desired: impl Into<StateName>,
        options: TransitionOptions,
    ) -> Result<TransitionOutcome, StorageError> {
        TransitionEngine::for_entity(self).attempt(self, desired, options)
    }

    /// States reachable from the current one.
    fn possible_transitions(&self) -> Vec<StateName> {
        match self.current_state() {
            Some(current) => self.state_table().possible_transitions(current.as_str()).to_vec(),
            None => Vec::new(),
        }
    }
}

impl<E: StatefulEntity> Transitionable for E {}
