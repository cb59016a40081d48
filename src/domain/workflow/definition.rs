//! State definitions.
//!
//! A [`StateDefinition`] describes one named state: where it may go next,
//! whether entering it is all-or-nothing, what must hold for an entity to
//! enter it, and what runs around the write.

use std::fmt;
use std::sync::Arc;

use super::context::{HookResult, TransitionContext, ValidationContext};
use super::errors::ErrorCollection;
use crate::domain::foundation::StateName;

/// A validation attached to a state. Failures are reported by appending to
/// the supplied error collection.
pub type Validation<E> = Arc<dyn Fn(&ValidationContext<'_, E>, &mut ErrorCollection) + Send + Sync>;

/// A before/after hook attached to a state.
pub type Hook<E> = Arc<dyn Fn(&mut TransitionContext<'_, E>) -> HookResult + Send + Sync>;

/// Description of one state of a workflow.
///
/// Built with the chained methods below and frozen once handed to a
/// [`StateTableBuilder`](super::StateTableBuilder).
///
/// # Example
///
/// ```ignore
/// let published = StateDefinition::new("published")
///     .transitions_to(["archived"])
///     .validate(|ctx, errors| {
///         if ctx.entity().title().is_empty() {
///             errors.add("title", ErrorKind::Blank, "can't be blank");
///         }
///     });
/// ```
pub struct StateDefinition<E> {
    name: StateName,
    allowed_transitions: Vec<StateName>,
    transactional: bool,
    validations: Vec<Validation<E>>,
    before_hooks: Vec<Hook<E>>,
    after_hooks: Vec<Hook<E>>,
}

impl<E> StateDefinition<E> {
    pub fn new(name: impl Into<StateName>) -> Self {
        Self {
            name: name.into(),
            allowed_transitions: Vec::new(),
            transactional: false,
            validations: Vec::new(),
            before_hooks: Vec::new(),
            after_hooks: Vec::new(),
        }
    }

    /// Sets the states reachable directly from this one.
    ///
    /// Order is kept for enumeration; duplicates are dropped.
    pub fn transitions_to<I, S>(mut self, states: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<StateName>,
    {
        self.allowed_transitions.clear();
        for state in states {
            let state = state.into();
            if !self.allowed_transitions.contains(&state) {
                self.allowed_transitions.push(state);
            }
        }
        self
    }

    /// Marks entering this state as all-or-nothing.
    pub fn transactional(mut self, transactional: bool) -> Self {
        self.transactional = transactional;
        self
    }

    pub fn validate<F>(mut self, validation: F) -> Self
    where
        F: Fn(&ValidationContext<'_, E>, &mut ErrorCollection) + Send + Sync + 'static,
    {
        self.validations.push(Arc::new(validation));
        self
    }

    /// Registers a hook that runs before the state attribute is written.
    pub fn before<F>(mut self, hook: F) -> Self
    where
        F: Fn(&mut TransitionContext<'_, E>) -> HookResult + Send + Sync + 'static,
    {
        self.before_hooks.push(Arc::new(hook));
        self
    }

    /// Registers a hook that runs after the state attribute is written.
    pub fn after<F>(mut self, hook: F) -> Self
    where
        F: Fn(&mut TransitionContext<'_, E>) -> HookResult + Send + Sync + 'static,
    {
        self.after_hooks.push(Arc::new(hook));
        self
    }

    pub fn name(&self) -> &StateName {
        &self.name
    }

    pub fn allowed_transitions(&self) -> &[StateName] {
        &self.allowed_transitions
    }

    pub fn can_transition_to(&self, state: &str) -> bool {
        self.allowed_transitions.iter().any(|s| s == state)
    }

    pub fn is_transactional(&self) -> bool {
        self.transactional
    }

    /// Returns true if no transition leaves this state.
    pub fn is_terminal(&self) -> bool {
        self.allowed_transitions.is_empty()
    }

    pub fn before_hooks(&self) -> &[Hook<E>] {
        &self.before_hooks
    }

    pub fn after_hooks(&self) -> &[Hook<E>] {
        &self.after_hooks
    }

    pub fn has_validations(&self) -> bool {
        !self.validations.is_empty()
    }

    /// Runs every validation against `ctx`, collecting failures into `errors`.
    ///
    /// All validations run even after one fails, so the caller sees every
    /// problem at once. Returns true if nothing was added.
    pub fn run_validations(&self, ctx: &ValidationContext<'_, E>, errors: &mut ErrorCollection) -> bool {
        let before = errors.len();
        for validation in &self.validations {
            validation(ctx, errors);
        }
        errors.len() == before
    }

    pub(crate) fn wrap_hooks(&mut self, before: &[Hook<E>], after: &[Hook<E>]) {
        if !before.is_empty() {
            let own = std::mem::take(&mut self.before_hooks);
            self.before_hooks = before.iter().cloned().chain(own).collect();
        }
        if !after.is_empty() {
            let own = std::mem::take(&mut self.after_hooks);
            self.after_hooks = after.iter().cloned().chain(own).collect();
        }
    }
}

impl<E> fmt::Debug for StateDefinition<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateDefinition")
            .field("name", &self.name)
            .field("allowed_transitions", &self.allowed_transitions)
            .field("transactional", &self.transactional)
            .field("validations", &self.validations.len())
            .field("before_hooks", &self.before_hooks.len())
            .field("after_hooks", &self.after_hooks.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::workflow::{ErrorKind, TransitionOptions};

    struct Swimmer {
        can_float: bool,
    }

    #[test]
    fn defaults_are_non_transactional_and_terminal() {
        let def: StateDefinition<Swimmer> = StateDefinition::new("archived");
        assert_eq!(def.name(), "archived");
        assert!(!def.is_transactional());
        assert!(def.is_terminal());
        assert!(!def.has_validations());
    }

    #[test]
    fn transitions_keep_order_and_drop_duplicates() {
        let def: StateDefinition<Swimmer> = StateDefinition::new("diving").transitions_to([
            "swimming", "floating", "swimming", "tanning",
        ]);
        let names: Vec<&str> = def.allowed_transitions().iter().map(|s| s.as_str()).collect();
        assert_eq!(names, vec!["swimming", "floating", "tanning"]);
        assert!(def.can_transition_to("floating"));
        assert!(!def.can_transition_to("running"));
    }

    #[test]
    fn run_validations_reports_failures() {
        let def = StateDefinition::new("floating").validate(|ctx: &ValidationContext<'_, Swimmer>, errors| {
            if !ctx.entity().can_float {
                errors.add("base", ErrorKind::Invalid, "swimmer cannot float");
            }
        });
        let state = StateName::from("floating");

        let sinker = Swimmer { can_float: false };
        let mut errors = ErrorCollection::new();
        assert!(!def.run_validations(&ValidationContext::for_current_state(&sinker, &state), &mut errors));
        assert_eq!(errors.on("base"), vec!["swimmer cannot float"]);

        let floater = Swimmer { can_float: true };
        let mut errors = ErrorCollection::new();
        assert!(def.run_validations(&ValidationContext::for_current_state(&floater, &state), &mut errors));
        assert!(errors.is_empty());
    }

    #[test]
    fn wrapped_hooks_run_first() {
        fn shared_hook(ctx: &mut TransitionContext<'_, Vec<&'static str>>) -> HookResult {
            ctx.entity_mut().push("shared");
            Ok(())
        }
        let shared: Hook<Vec<&'static str>> = Arc::new(shared_hook);
        let mut def = StateDefinition::new("swimming").before(|ctx: &mut TransitionContext<'_, Vec<&'static str>>| {
            ctx.entity_mut().push("own");
            Ok(())
        });
        def.wrap_hooks(&[shared], &[]);

        let mut log = Vec::new();
        let mut ctx = TransitionContext::new(&mut log, None, "swimming".into(), TransitionOptions::default());
        for hook in def.before_hooks() {
            hook(&mut ctx).unwrap();
        }
        assert_eq!(log, vec!["shared", "own"]);
    }

    #[test]
    fn debug_shows_counts() {
        let def: StateDefinition<Swimmer> = StateDefinition::new("tubing")
            .transactional(true)
            .before(|ctx| ctx.rollback());
        let rendered = format!("{:?}", def);
        assert!(rendered.contains("tubing"));
        assert!(rendered.contains("before_hooks: 1"));
    }
}
