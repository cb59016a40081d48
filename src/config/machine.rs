//! Default state machine settings

use serde::Deserialize;

use super::error::ValidationError;
use crate::domain::foundation::StateName;
use crate::domain::workflow::{StateMachineConfig, DEFAULT_STATE_ATTRIBUTE};

/// Settings applied to workflows built in code
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct MachineDefaults {
    /// Attribute that holds the state
    #[serde(default = "default_state_attribute")]
    pub state_attribute: String,

    /// Run the current state's validations when an entity validates itself
    #[serde(default = "default_state_validations_on_object")]
    pub state_validations_on_object: bool,
}

impl MachineDefaults {
    /// Machine settings for `workflow` using these defaults
    pub fn machine_config<I, S>(&self, workflow: impl Into<String>, states: I) -> StateMachineConfig
    where
        I: IntoIterator<Item = S>,
        S: Into<StateName>,
    {
        StateMachineConfig::new(workflow, states)
            .with_state_attribute(self.state_attribute.clone())
            .with_state_validations_on_object(self.state_validations_on_object)
    }

    /// Validate machine defaults
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.state_attribute.trim().is_empty() {
            return Err(ValidationError::EmptyStateAttribute);
        }
        Ok(())
    }
}

impl Default for MachineDefaults {
    fn default() -> Self {
        Self {
            state_attribute: default_state_attribute(),
            state_validations_on_object: default_state_validations_on_object(),
        }
    }
}

fn default_state_attribute() -> String {
    DEFAULT_STATE_ATTRIBUTE.to_string()
}

fn default_state_validations_on_object() -> bool {
    true
}
