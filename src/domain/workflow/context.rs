//! Per-attempt transition state.
//!
//! A [`TransitionContext`] is created fresh for every `transition_to` call and
//! dropped when the call returns. Options travel on the context rather than
//! on the engine, so nothing leaks from one call into the next.

use serde::Deserialize;

use super::errors::RollbackRequest;
use crate::domain::foundation::StateName;

/// Result returned by a before/after hook.
pub type HookResult = Result<(), RollbackRequest>;

/// Options accepted by a transition attempt.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct TransitionOptions {
    /// Bypass the gate entirely: entity validity, the allowed-transition
    /// check and the desired state's validations.
    #[serde(default)]
    pub skip_validations: bool,
}

impl TransitionOptions {
    /// Options that bypass every gate check.
    pub fn skipping_validations() -> Self {
        Self {
            skip_validations: true,
        }
    }
}

/// The entity and state names bound to one transition attempt.
pub struct TransitionContext<'a, E> {
    entity: &'a mut E,
    from: Option<StateName>,
    to: StateName,
    previous_state: Option<StateName>,
    options: TransitionOptions,
}

impl<'a, E> TransitionContext<'a, E> {
    pub(crate) fn new(
        entity: &'a mut E,
        from: Option<StateName>,
        to: StateName,
        options: TransitionOptions,
    ) -> Self {
        Self {
            entity,
            from,
            to,
            previous_state: None,
            options,
        }
    }

    pub fn entity(&self) -> &E {
        self.entity
    }

    pub fn entity_mut(&mut self) -> &mut E {
        self.entity
    }

    /// State the entity was in when the attempt started.
    pub fn from(&self) -> Option<&StateName> {
        self.from.as_ref()
    }

    /// State the entity is moving to.
    pub fn to(&self) -> &StateName {
        &self.to
    }

    /// State the entity was in before the write.
    ///
    /// `None` until the state attribute has been persisted, so before-hooks
    /// always observe `None`.
    pub fn previous_state(&self) -> Option<&StateName> {
        self.previous_state.as_ref()
    }

    pub fn options(&self) -> TransitionOptions {
        self.options
    }

    /// Asks the enclosing transaction to roll back.
    ///
    /// Return this from a hook:
    ///
    /// ```ignore
    /// def.after(|ctx| {
    ///     if !ctx.entity().ready() {
    ///         return ctx.rollback();
    ///     }
    ///     Ok(())
    /// })
    /// ```
    pub fn rollback(&self) -> HookResult {
        Err(RollbackRequest::new())
    }

    /// Like [`rollback`](Self::rollback), with a reason for the logs.
    pub fn rollback_because(&self, reason: impl Into<String>) -> HookResult {
        Err(RollbackRequest::because(reason))
    }

    pub(crate) fn set_previous_state(&mut self, state: Option<StateName>) {
        self.previous_state = state;
    }

    pub(crate) fn validation(&self) -> ValidationContext<'_, E> {
        ValidationContext {
            entity: self.entity,
            state: &self.to,
            from: self.from.as_ref(),
            in_transition: true,
        }
    }
}

/// What a state validation can see.
///
/// Validations run both while gating a transition (the desired state's
/// validations) and while an entity checks its own validity (the current
/// state's validations).
pub struct ValidationContext<'a, E> {
    entity: &'a E,
    state: &'a StateName,
    from: Option<&'a StateName>,
    in_transition: bool,
}

impl<'a, E> ValidationContext<'a, E> {
    /// Context for validating the state an entity is already in.
    pub fn for_current_state(entity: &'a E, state: &'a StateName) -> Self {
        Self {
            entity,
            state,
            from: None,
            in_transition: false,
        }
    }

    pub fn entity(&self) -> &E {
        self.entity
    }

    /// State whose validations are running.
    pub fn state(&self) -> &StateName {
        self.state
    }

    /// State being left, when validating a transition.
    pub fn from(&self) -> Option<&StateName> {
        self.from
    }

    pub fn is_transition(&self) -> bool {
        self.in_transition
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::workflow::HookPhase;

    #[test]
    fn previous_state_starts_empty() {
        let mut entity = ();
        let ctx = TransitionContext::new(
            &mut entity,
            Some("draft".into()),
            "published".into(),
            TransitionOptions::default(),
        );
        assert_eq!(ctx.previous_state(), None);
        assert_eq!(ctx.from(), Some(&StateName::from("draft")));
        assert_eq!(ctx.to(), "published");
    }

    #[test]
    fn rollback_returns_request() {
        let mut entity = ();
        let ctx = TransitionContext::new(&mut entity, None, "tubing".into(), TransitionOptions::default());

        let request = ctx.rollback_because("no sunscreen").unwrap_err();
        assert_eq!(request.reason(), Some("no sunscreen"));
        assert_eq!(request.phase(), HookPhase::Before);
        assert!(ctx.rollback().is_err());
    }

    #[test]
    fn validation_view_targets_desired_state() {
        let mut entity = 7u8;
        let ctx = TransitionContext::new(
            &mut entity,
            Some("diving".into()),
            "floating".into(),
            TransitionOptions::default(),
        );
        let view = ctx.validation();
        assert_eq!(view.state(), "floating");
        assert_eq!(view.from(), Some(&StateName::from("diving")));
        assert!(view.is_transition());
        assert_eq!(*view.entity(), 7);
    }

    #[test]
    fn options_deserialize_with_default() {
        let options: TransitionOptions = serde_json::from_str("{}").unwrap();
        assert!(!options.skip_validations);

        let options: TransitionOptions =
            serde_json::from_str(r#"{"skip_validations": true}"#).unwrap();
        assert_eq!(options, TransitionOptions::skipping_validations());
    }
}
