//! Per-entity-type state machine settings.

use serde::Deserialize;
use std::collections::HashSet;

use super::errors::DefinitionError;
use crate::domain::foundation::StateName;

/// Attribute used when none is configured.
pub const DEFAULT_STATE_ATTRIBUTE: &str = "status";

/// How an entity type is wired to its workflow.
///
/// The first entry of `states` is the initial state of new records.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StateMachineConfig {
    /// Workflow name, used in logs.
    pub workflow: String,

    /// Name of the attribute holding the current state.
    #[serde(default = "default_state_attribute")]
    pub state_attribute: String,

    /// Every state the attribute may hold, in declaration order.
    pub states: Vec<StateName>,

    /// Whether the current state's validations run as part of the entity's
    /// own validity check.
    #[serde(default = "default_state_validations_on_object")]
    pub state_validations_on_object: bool,
}

fn default_state_attribute() -> String {
    DEFAULT_STATE_ATTRIBUTE.to_string()
}

fn default_state_validations_on_object() -> bool {
    true
}

impl StateMachineConfig {
    pub fn new<I, S>(workflow: impl Into<String>, states: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<StateName>,
    {
        Self {
            workflow: workflow.into(),
            state_attribute: default_state_attribute(),
            states: states.into_iter().map(Into::into).collect(),
            state_validations_on_object: default_state_validations_on_object(),
        }
    }

    pub fn with_state_attribute(mut self, attribute: impl Into<String>) -> Self {
        self.state_attribute = attribute.into();
        self
    }

    pub fn with_state_validations_on_object(mut self, enabled: bool) -> Self {
        self.state_validations_on_object = enabled;
        self
    }

    /// Checks the settings are usable.
    ///
    /// # Errors
    ///
    /// - `NoStates` if no state is declared
    /// - `BlankState` / `DuplicateState` for malformed state lists
    /// - `BlankAttribute` if the state attribute name is empty
    pub fn validate(&self) -> Result<(), DefinitionError> {
        if self.states.is_empty() {
            return Err(DefinitionError::NoStates(self.workflow.clone()));
        }
        if self.state_attribute.trim().is_empty() {
            return Err(DefinitionError::BlankAttribute);
        }

        let mut seen = HashSet::new();
        for state in &self.states {
            if state.is_blank() {
                return Err(DefinitionError::BlankState);
            }
            if !seen.insert(state) {
                return Err(DefinitionError::DuplicateState(state.clone()));
            }
        }
        Ok(())
    }
}
