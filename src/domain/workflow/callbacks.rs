//! Ordered before/after hook execution around the state write.

use tracing::debug;

use super::context::TransitionContext;
use super::definition::StateDefinition;
use super::errors::{HookPhase, RollbackRequest};
use crate::ports::{StatefulEntity, StorageError};

/// What to do when the write itself reports failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OnFailedPersist {
    /// Run after-hooks anyway and report the failed write.
    Continue,
    /// Treat the failed write as a rollback request and skip after-hooks.
    RequestRollback,
}

/// Result of one [`CallbackRunner::run_around`] call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallbackRun {
    /// Whether the write was attempted. False when a before-hook halted.
    pub action_ran: bool,
    /// The write's own result.
    pub persisted: bool,
    /// The first rollback request raised, tagged with where it came from.
    pub rollback: Option<RollbackRequest>,
}

impl CallbackRun {
    fn halted(request: RollbackRequest) -> Self {
        Self {
            action_ran: false,
            persisted: false,
            rollback: Some(request),
        }
    }

    pub fn rollback_requested(&self) -> bool {
        self.rollback.is_some()
    }
}

/// Runs a state's hooks around a write.
pub struct CallbackRunner;

impl CallbackRunner {
    /// Runs every before-hook, then `action`, then every after-hook, all
    /// against the same context.
    ///
    /// A rollback request from a before-hook stops the remaining before-hooks
    /// and `action` never runs. A request from an after-hook stops the
    /// remaining after-hooks. The previous state is recorded on the context
    /// only once `action` reports a successful write.
    ///
    /// # Errors
    ///
    /// Storage failures raised by `action` propagate unchanged.
    pub fn run_around<E, F>(
        definition: &StateDefinition<E>,
        ctx: &mut TransitionContext<'_, E>,
        on_failed_persist: OnFailedPersist,
        action: F,
    ) -> Result<CallbackRun, StorageError>
    where
        E: StatefulEntity,
        F: FnOnce(&mut E) -> Result<bool, StorageError>,
    {
        for hook in definition.before_hooks() {
            if let Err(request) = hook(ctx) {
                debug!(state = %definition.name(), request = %request, "Before hook halted transition");
                return Ok(CallbackRun::halted(request.in_phase(HookPhase::Before)));
            }
        }

        let prior = ctx.entity().current_state();
        let persisted = action(ctx.entity_mut())?;

        if persisted {
            ctx.set_previous_state(prior);
        } else if on_failed_persist == OnFailedPersist::RequestRollback {
            debug!(state = %definition.name(), "Write failed, skipping after hooks");
            return Ok(CallbackRun {
                action_ran: true,
                persisted: false,
                rollback: Some(RollbackRequest::because("state write failed").in_phase(HookPhase::Persist)),
            });
        }

        for hook in definition.after_hooks() {
            if let Err(request) = hook(ctx) {
                debug!(state = %definition.name(), request = %request, "After hook requested rollback");
                return Ok(CallbackRun {
                    action_ran: true,
                    persisted,
                    rollback: Some(request.in_phase(HookPhase::After)),
                });
            }
        }

        Ok(CallbackRun {
            action_ran: true,
            persisted,
            rollback: None,
        })
    }
}
