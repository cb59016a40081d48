//! The resolved transition table of one entity type.
//!
//! Lookups are plain map reads with a defined "not found" outcome: a state
//! without a registered definition can be neither left nor entered.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use tracing::{debug, warn};

use super::context::{HookResult, TransitionContext, ValidationContext};
use super::definition::{Hook, StateDefinition};
use super::errors::{DefinitionError, ErrorCollection, ErrorKind};
use super::machine::StateMachineConfig;
use crate::domain::foundation::StateName;

/// Immutable mapping `StateName -> StateDefinition` plus the machine settings.
pub struct StateTable<E> {
    config: StateMachineConfig,
    definitions: HashMap<StateName, StateDefinition<E>>,
}

impl<E> StateTable<E> {
    pub fn builder(config: StateMachineConfig) -> StateTableBuilder<E> {
        StateTableBuilder::new(config)
    }

    pub fn config(&self) -> &StateMachineConfig {
        &self.config
    }

    pub fn workflow(&self) -> &str {
        &self.config.workflow
    }

    pub fn state_attribute(&self) -> &str {
        &self.config.state_attribute
    }

    /// Every declared state, in declaration order.
    pub fn states(&self) -> &[StateName] {
        &self.config.states
    }

    /// The first declared state; new records start here.
    pub fn initial_state(&self) -> &StateName {
        // build() rejects configs without states
        &self.config.states[0]
    }

    pub fn is_declared(&self, state: &str) -> bool {
        self.config.states.iter().any(|s| s == state)
    }

    pub fn definition(&self, state: &str) -> Option<&StateDefinition<E>> {
        self.definitions.get(state)
    }

    /// Destinations reachable from `from`; empty for unknown states.
    pub fn possible_transitions(&self, from: &str) -> &[StateName] {
        self.definition(from)
            .map(|def| def.allowed_transitions())
            .unwrap_or(&[])
    }

    /// Whether entering `state` is all-or-nothing; false for unknown states.
    pub fn is_transactional(&self, state: &str) -> bool {
        self.definition(state).is_some_and(|def| def.is_transactional())
    }

    /// Returns true if nothing can be reached from `state`.
    pub fn is_terminal(&self, state: &str) -> bool {
        self.possible_transitions(state).is_empty()
    }

    /// Validates the state an entity currently holds.
    ///
    /// Records, against the state attribute: a missing value, a value that
    /// is not a declared state, and a declared state without a definition.
    /// When the state resolves and `state_validations_on_object` is enabled,
    /// the state's own validations run too, unless `skip_state_validations`.
    pub fn validate_entity_state(
        &self,
        entity: &E,
        current: Option<&StateName>,
        skip_state_validations: bool,
        errors: &mut ErrorCollection,
    ) {
        let attribute = self.state_attribute();

        let state = match current {
            Some(state) if !state.is_blank() => state,
            _ => {
                errors.add(attribute, ErrorKind::Blank, "can't be blank");
                errors.add(attribute, ErrorKind::Inclusion, "is not included in the list");
                errors.add(attribute, ErrorKind::NotImplemented, "definition must be registered");
                return;
            }
        };

        if !self.is_declared(state.as_str()) {
            errors.add(attribute, ErrorKind::Inclusion, "is not included in the list");
        }

        let Some(definition) = self.definition(state.as_str()) else {
            errors.add(attribute, ErrorKind::NotImplemented, "definition must be registered");
            return;
        };

        if self.config.state_validations_on_object && !skip_state_validations {
            definition.run_validations(&ValidationContext::for_current_state(entity, state), errors);
        }
    }
}

impl<E> fmt::Debug for StateTable<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut definitions: Vec<_> = self.definitions.values().collect();
        definitions.sort_by(|a, b| a.name().cmp(b.name()));
        f.debug_struct("StateTable")
            .field("config", &self.config)
            .field("definitions", &definitions)
            .finish()
    }
}

/// Collects state definitions and shared hooks into a [`StateTable`].
///
/// # Example
///
/// ```ignore
/// let table = StateTable::builder(StateMachineConfig::new("post", ["draft", "published", "archived"]))
///     .state(StateDefinition::new("draft").transitions_to(["published", "archived"]))
///     .state(StateDefinition::new("published").transitions_to(["archived"]))
///     .state(StateDefinition::new("archived"))
///     .after_each(|ctx| {
///         tracing::info!(to = %ctx.to(), "done transitioning");
///         Ok(())
///     })
///     .build()?;
/// ```
pub struct StateTableBuilder<E> {
    config: StateMachineConfig,
    definitions: Vec<StateDefinition<E>>,
    before_each: Vec<Hook<E>>,
    after_each: Vec<Hook<E>>,
    error: Option<DefinitionError>,
}

impl<E> StateTableBuilder<E> {
    pub fn new(config: StateMachineConfig) -> Self {
        Self {
            config,
            definitions: Vec::new(),
            before_each: Vec::new(),
            after_each: Vec::new(),
            error: None,
        }
    }

    /// Registers a state definition.
    pub fn state(mut self, definition: StateDefinition<E>) -> Self {
        self.definitions.push(definition);
        self
    }

    /// Rewrites an already registered definition, e.g. to attach hooks to a
    /// state loaded from a workflow file.
    ///
    /// Configuring a state that was never registered is reported by `build`.
    pub fn configure<F>(mut self, state: &str, f: F) -> Self
    where
        F: FnOnce(StateDefinition<E>) -> StateDefinition<E>,
    {
        match self.definitions.iter().position(|def| def.name() == state) {
            Some(index) => {
                let definition = self.definitions.remove(index);
                self.definitions.insert(index, f(definition));
            }
            None if self.error.is_none() => {
                self.error = Some(DefinitionError::UndeclaredState {
                    workflow: self.config.workflow.clone(),
                    state: StateName::from(state),
                });
            }
            None => {}
        }
        self
    }

    /// Registers a hook that runs before the own before-hooks of every state.
    pub fn before_each<F>(mut self, hook: F) -> Self
    where
        F: Fn(&mut TransitionContext<'_, E>) -> HookResult + Send + Sync + 'static,
    {
        self.before_each.push(Arc::new(hook));
        self
    }

    /// Registers a hook that runs before the own after-hooks of every state.
    pub fn after_each<F>(mut self, hook: F) -> Self
    where
        F: Fn(&mut TransitionContext<'_, E>) -> HookResult + Send + Sync + 'static,
    {
        self.after_each.push(Arc::new(hook));
        self
    }

    /// Freezes the table.
    ///
    /// # Errors
    ///
    /// - any error of [`StateMachineConfig::validate`]
    /// - `UndeclaredState` for a definition (or `configure` call) naming a
    ///   state the config does not declare
    /// - `DuplicateDefinition` if a state is registered twice
    pub fn build(self) -> Result<StateTable<E>, DefinitionError> {
        self.config.validate()?;
        if let Some(error) = self.error {
            return Err(error);
        }

        let mut definitions = HashMap::with_capacity(self.definitions.len());
        for mut definition in self.definitions {
            let name = definition.name().clone();
            if !self.config.states.contains(&name) {
                return Err(DefinitionError::UndeclaredState {
                    workflow: self.config.workflow.clone(),
                    state: name,
                });
            }
            if definitions.contains_key(&name) {
                return Err(DefinitionError::DuplicateDefinition(name));
            }
            definition.wrap_hooks(&self.before_each, &self.after_each);
            definitions.insert(name, definition);
        }

        for state in &self.config.states {
            if !definitions.contains_key(state) {
                debug!(
                    workflow = %self.config.workflow,
                    state = %state,
                    "Declared state has no definition"
                );
            }
        }
        for definition in definitions.values() {
            for target in definition.allowed_transitions() {
                if !definitions.contains_key(target) {
                    warn!(
                        workflow = %self.config.workflow,
                        from = %definition.name(),
                        to = %target,
                        "Transition target has no definition and can never be entered"
                    );
                }
            }
        }

        Ok(StateTable {
            config: self.config,
            definitions,
        })
    }
}
