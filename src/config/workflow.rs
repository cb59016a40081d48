//! Workflow file configuration
//!
//! A workflow file lists the states of one entity type and the transitions
//! between them. Validations and hooks stay in code and are attached to the
//! pre-registered states with [`StateTableBuilder::configure`].
//!
//! ```yaml
//! workflow: swimmer
//! states:
//!   - name: diving
//!     transitions_to: [swimming, tubing]
//!   - name: swimming
//!   - name: tubing
//!     transactional: true
//! ```

use serde::Deserialize;
use std::path::Path;

use super::error::{ConfigError, ValidationError};
use crate::domain::foundation::StateName;
use crate::domain::workflow::{
    StateDefinition, StateMachineConfig, StateTableBuilder, DEFAULT_STATE_ATTRIBUTE,
};

/// One state entry of a workflow file
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct StateSpec {
    pub name: StateName,

    #[serde(default)]
    pub transitions_to: Vec<StateName>,

    #[serde(default)]
    pub transactional: bool,

    /// Declared-only states are valid attribute values but have no
    /// definition, so they can be neither entered nor left
    #[serde(default = "default_true")]
    pub registered: bool,
}

/// Description of a state table loaded from YAML
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct WorkflowSpec {
    pub workflow: String,

    #[serde(default = "default_state_attribute")]
    pub state_attribute: String,

    #[serde(default = "default_true")]
    pub state_validations_on_object: bool,

    /// States in declaration order; the first is the initial state
    pub states: Vec<StateSpec>,
}

impl WorkflowSpec {
    /// Parse and validate a workflow from a YAML string
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        let spec: Self = serde_yaml::from_str(yaml)?;
        spec.validate()?;
        Ok(spec)
    }

    /// Load and validate a workflow file
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file is missing, malformed, or describes
    /// an invalid state table.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let spec: Self = config::Config::builder()
            .add_source(config::File::from(path.as_ref()).format(config::FileFormat::Yaml))
            .build()?
            .try_deserialize()?;
        spec.validate()?;
        Ok(spec)
    }

    /// Machine settings described by this file
    pub fn machine_config(&self) -> StateMachineConfig {
        StateMachineConfig::new(self.workflow.clone(), self.states.iter().map(|s| s.name.clone()))
            .with_state_attribute(self.state_attribute.clone())
            .with_state_validations_on_object(self.state_validations_on_object)
    }

    /// Validate the described table
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.machine_config().validate()?;
        Ok(())
    }

    /// A table builder with every registered state already defined
    pub fn builder<E>(&self) -> StateTableBuilder<E> {
        self.states
            .iter()
            .filter(|state| state.registered)
            .fold(StateTableBuilder::new(self.machine_config()), |builder, state| {
                builder.state(
                    StateDefinition::new(state.name.clone())
                        .transitions_to(state.transitions_to.iter().cloned())
                        .transactional(state.transactional),
                )
            })
    }
}

fn default_state_attribute() -> String {
    DEFAULT_STATE_ATTRIBUTE.to_string()
}

fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::workflow::{DefinitionError, StateTable};
    use std::io::Write;

    const SWIMMER: &str = r#"
workflow: swimmer
state_attribute: state
states:
  - name: diving
    transitions_to: [swimming, tubing, resting]
  - name: swimming
  - name: tubing
    transactional: true
  - name: resting
    registered: false
"#;

    #[test]
    fn test_parse_yaml() {
        let spec = WorkflowSpec::from_yaml_str(SWIMMER).unwrap();
        assert_eq!(spec.workflow, "swimmer");
        assert_eq!(spec.state_attribute, "state");
        assert!(spec.state_validations_on_object);
        assert_eq!(spec.states.len(), 4);
        assert!(spec.states[2].transactional);
        assert!(!spec.states[3].registered);
    }

    #[test]
    fn test_builder_registers_states() {
        let spec = WorkflowSpec::from_yaml_str(SWIMMER).unwrap();
        let table: StateTable<()> = spec.builder().build().unwrap();

        assert_eq!(table.initial_state(), "diving");
        assert_eq!(table.state_attribute(), "state");
        assert_eq!(table.possible_transitions("diving").len(), 3);
        assert!(table.is_transactional("tubing"));
        assert!(table.is_declared("resting"));
        assert!(table.definition("resting").is_none());
    }

    #[test]
    fn test_builder_accepts_configure() {
        let spec = WorkflowSpec::from_yaml_str(SWIMMER).unwrap();
        let table: StateTable<()> = spec
            .builder()
            .configure("swimming", |def| def.transactional(true))
            .build()
            .unwrap();
        assert!(table.is_transactional("swimming"));
    }

    #[test]
    fn test_rejects_duplicate_states() {
        let yaml = "workflow: post\nstates:\n  - name: draft\n  - name: draft\n";
        let result = WorkflowSpec::from_yaml_str(yaml);
        assert!(matches!(
            result,
            Err(ConfigError::ValidationFailed(ValidationError::InvalidWorkflow(
                DefinitionError::DuplicateState(_)
            )))
        ));
    }

    #[test]
    fn test_rejects_malformed_yaml() {
        let result = WorkflowSpec::from_yaml_str("workflow: [unterminated");
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        file.write_all(SWIMMER.as_bytes()).unwrap();

        let spec = WorkflowSpec::load(file.path()).unwrap();
        assert_eq!(spec, WorkflowSpec::from_yaml_str(SWIMMER).unwrap());
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = WorkflowSpec::load(dir.path().join("absent.yaml"));
        assert!(matches!(result, Err(ConfigError::LoadError(_))));
    }
}
