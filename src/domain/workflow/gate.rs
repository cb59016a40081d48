//! The combined legality and validity check run before any write.

use tracing::debug;

use super::context::TransitionContext;
use super::errors::{ErrorCollection, TransitionRejection};
use super::table::StateTable;
use crate::ports::StatefulEntity;

/// Decides whether a transition may proceed.
///
/// Checks short-circuit in this order, so an illegal transition never
/// surfaces the desired state's validation errors:
///
/// 1. the entity's own validity
/// 2. the desired state is in the current state's allowed set
/// 3. the desired state is registered and its validations pass
///
/// `skip_validations` bypasses all three.
pub struct ValidationGate;

impl ValidationGate {
    /// Returns true if the transition may proceed.
    pub fn allow<E: StatefulEntity>(table: &StateTable<E>, ctx: &mut TransitionContext<'_, E>) -> bool {
        Self::check(table, ctx).is_ok()
    }

    /// Like [`allow`](Self::allow), naming the first failed check.
    pub fn check<E: StatefulEntity>(
        table: &StateTable<E>,
        ctx: &mut TransitionContext<'_, E>,
    ) -> Result<(), TransitionRejection> {
        if ctx.options().skip_validations {
            debug!(workflow = %table.workflow(), to = %ctx.to(), "Gate skipped");
            return Ok(());
        }

        if !ctx.entity_mut().is_valid() {
            return Err(TransitionRejection::ValidationFailure);
        }

        let Some(current) = ctx.from().and_then(|from| table.definition(from.as_str())) else {
            return Err(TransitionRejection::ConfigurationDefect {
                current: ctx.from().cloned(),
            });
        };
        if !current.can_transition_to(ctx.to().as_str()) {
            return Err(TransitionRejection::IllegalTransition {
                from: ctx.from().cloned(),
                to: ctx.to().clone(),
            });
        }

        let Some(desired) = table.definition(ctx.to().as_str()) else {
            return Err(TransitionRejection::UnknownState(ctx.to().clone()));
        };

        let mut errors = ErrorCollection::new();
        if !desired.run_validations(&ctx.validation(), &mut errors) {
            ctx.entity_mut().errors_mut().append(&mut errors);
            return Err(TransitionRejection::ValidationFailure);
        }

        Ok(())
    }
}
