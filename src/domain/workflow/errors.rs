//! Error types for workflows.
//!
//! Three families live here:
//!
//! - [`ErrorCollection`] - the entity-owned list of validation messages that
//!   gates and validations append to.
//! - [`RollbackRequest`] / [`TransitionRejection`] - the expected, non-fatal
//!   reasons a transition did not happen.
//! - [`DefinitionError`] - defects in a state table detected while building it.

use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

use crate::domain::foundation::{ErrorCode, StateName};

/// Attribute name used for errors that do not belong to a specific field.
pub const BASE_ATTRIBUTE: &str = "base";

/// Kind of a validation error.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// A required value is missing.
    Blank,
    /// A value is not one of the permitted values.
    Inclusion,
    /// A state is declared but has no registered definition.
    NotImplemented,
    /// Generic validation failure.
    Invalid,
    /// Application-specific error kind.
    Custom(String),
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::Blank => write!(f, "blank"),
            ErrorKind::Inclusion => write!(f, "inclusion"),
            ErrorKind::NotImplemented => write!(f, "not_implemented"),
            ErrorKind::Invalid => write!(f, "invalid"),
            ErrorKind::Custom(kind) => write!(f, "{}", kind),
        }
    }
}

/// A single validation error attached to an attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityError {
    pub attribute: String,
    pub kind: ErrorKind,
    pub message: String,
}

impl fmt::Display for EntityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.attribute == BASE_ATTRIBUTE {
            write!(f, "{}", self.message)
        } else {
            write!(f, "{} {}", self.attribute, self.message)
        }
    }
}

/// Ordered collection of validation errors owned by an entity.
///
/// The engine only ever appends. Clearing is left to the entity, typically at
/// the start of its own validity check.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorCollection {
    entries: Vec<EntityError>,
}

impl ErrorCollection {
    /// Creates an empty collection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an error.
    pub fn add(&mut self, attribute: impl Into<String>, kind: ErrorKind, message: impl Into<String>) {
        self.entries.push(EntityError {
            attribute: attribute.into(),
            kind,
            message: message.into(),
        });
    }

    /// Appends an error not tied to any attribute.
    pub fn add_to_base(&mut self, message: impl Into<String>) {
        self.add(BASE_ATTRIBUTE, ErrorKind::Invalid, message);
    }

    /// Moves every error of `other` to the end of this collection.
    pub fn append(&mut self, other: &mut ErrorCollection) {
        self.entries.append(&mut other.entries);
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = &EntityError> {
        self.entries.iter()
    }

    /// Returns the messages recorded for one attribute, in insertion order.
    pub fn on(&self, attribute: &str) -> Vec<&str> {
        self.entries
            .iter()
            .filter(|e| e.attribute == attribute)
            .map(|e| e.message.as_str())
            .collect()
    }

    /// Returns true if any error of the given kind was recorded for the attribute.
    pub fn has(&self, attribute: &str, kind: &ErrorKind) -> bool {
        self.entries
            .iter()
            .any(|e| e.attribute == attribute && &e.kind == kind)
    }

    /// Groups messages by attribute.
    pub fn messages(&self) -> BTreeMap<String, Vec<String>> {
        let mut grouped: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for entry in &self.entries {
            grouped
                .entry(entry.attribute.clone())
                .or_default()
                .push(entry.message.clone());
        }
        grouped
    }

    /// Human readable messages, one per error.
    pub fn full_messages(&self) -> Vec<String> {
        self.entries.iter().map(|e| e.to_string()).collect()
    }
}

impl<'a> IntoIterator for &'a ErrorCollection {
    type Item = &'a EntityError;
    type IntoIter = std::slice::Iter<'a, EntityError>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// Where in a transition a rollback was requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HookPhase {
    Before,
    Persist,
    After,
}

impl fmt::Display for HookPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            HookPhase::Before => "before",
            HookPhase::Persist => "persist",
            HookPhase::After => "after",
        };
        write!(f, "{}", s)
    }
}

/// Signal returned by a hook to abort the surrounding transaction.
///
/// Only transactional states can undo anything; for plain states the request
/// merely stops the remaining hooks of the same phase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RollbackRequest {
    phase: HookPhase,
    reason: Option<String>,
}

impl RollbackRequest {
    pub fn new() -> Self {
        Self {
            phase: HookPhase::Before,
            reason: None,
        }
    }

    pub fn because(reason: impl Into<String>) -> Self {
        Self {
            phase: HookPhase::Before,
            reason: Some(reason.into()),
        }
    }

    pub(crate) fn in_phase(mut self, phase: HookPhase) -> Self {
        self.phase = phase;
        self
    }

    pub fn phase(&self) -> HookPhase {
        self.phase
    }

    pub fn reason(&self) -> Option<&str> {
        self.reason.as_deref()
    }
}

impl Default for RollbackRequest {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RollbackRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.reason {
            Some(reason) => write!(f, "rollback requested in {} phase: {}", self.phase, reason),
            None => write!(f, "rollback requested in {} phase", self.phase),
        }
    }
}

/// Why a transition attempt did not take effect.
///
/// None of these are fatal: `transition_to` reports each of them as `false`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransitionRejection {
    /// The desired state is not reachable from the current state.
    IllegalTransition { from: Option<StateName>, to: StateName },
    /// The desired state has no registered definition.
    UnknownState(StateName),
    /// The current state has no registered definition.
    ConfigurationDefect { current: Option<StateName> },
    /// The entity or the desired state's validations failed.
    ValidationFailure,
    /// The write of the state attribute did not take effect.
    PersistFailure,
    /// A hook asked for the transaction to be rolled back, or the reloaded
    /// state does not match the desired one.
    RolledBack(Option<RollbackRequest>),
}

impl TransitionRejection {
    pub fn code(&self) -> ErrorCode {
        match self {
            TransitionRejection::IllegalTransition { .. } => ErrorCode::IllegalTransition,
            TransitionRejection::UnknownState(_) => ErrorCode::UnknownState,
            TransitionRejection::ConfigurationDefect { .. } => ErrorCode::ConfigurationDefect,
            TransitionRejection::ValidationFailure => ErrorCode::ValidationFailed,
            TransitionRejection::PersistFailure => ErrorCode::PersistFailed,
            TransitionRejection::RolledBack(_) => ErrorCode::RolledBack,
        }
    }
}

impl fmt::Display for TransitionRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransitionRejection::IllegalTransition { from, to } => match from {
                Some(from) => write!(f, "cannot transition from {} to {}", from, to),
                None => write!(f, "cannot transition to {} from an unset state", to),
            },
            TransitionRejection::UnknownState(state) => {
                write!(f, "state {} has no registered definition", state)
            }
            TransitionRejection::ConfigurationDefect { current } => match current {
                Some(current) => write!(f, "current state {} has no registered definition", current),
                None => write!(f, "entity has no current state"),
            },
            TransitionRejection::ValidationFailure => write!(f, "validation failed"),
            TransitionRejection::PersistFailure => write!(f, "state could not be persisted"),
            TransitionRejection::RolledBack(Some(request)) => write!(f, "{}", request),
            TransitionRejection::RolledBack(None) => write!(f, "transaction rolled back"),
        }
    }
}

/// Defects found while building a state table.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DefinitionError {
    #[error("Workflow '{0}' must declare at least one state")]
    NoStates(String),

    #[error("State '{0}' is declared more than once")]
    DuplicateState(StateName),

    #[error("State '{0}' has more than one definition")]
    DuplicateDefinition(StateName),

    #[error("State '{state}' is not declared by workflow '{workflow}'")]
    UndeclaredState { workflow: String, state: StateName },

    #[error("State name cannot be blank")]
    BlankState,

    #[error("State attribute cannot be blank")]
    BlankAttribute,
}

impl DefinitionError {
    pub fn code(&self) -> ErrorCode {
        ErrorCode::InvalidDefinition
    }
}
