//! Dynamic records backed by an [`InMemoryStore`].
//!
//! A [`Model`] plays the role of an entity type: it owns the state table and
//! any record-level validators. A [`Record`] is one persisted instance with a
//! free-form attribute map.

use serde_json::Value;
use std::fmt;
use std::sync::Arc;

use super::store::{Attributes, InMemoryStore};
use crate::domain::foundation::{EntityId, StateName};
use crate::domain::workflow::{ErrorCollection, StateTable};
use crate::ports::{StatefulEntity, StorageError, TransactionScope};

/// A record-level validation.
pub type RecordValidator = Arc<dyn Fn(&Record, &mut ErrorCollection) + Send + Sync>;

/// Everything records of one kind share.
pub struct Model {
    table: Arc<StateTable<Record>>,
    validators: Vec<RecordValidator>,
}

impl Model {
    pub fn new(table: Arc<StateTable<Record>>) -> Self {
        Self {
            table,
            validators: Vec::new(),
        }
    }

    /// Adds a validation run by every [`Record::is_valid`] call, independent
    /// of the record's state.
    pub fn with_validator<F>(mut self, validator: F) -> Self
    where
        F: Fn(&Record, &mut ErrorCollection) + Send + Sync + 'static,
    {
        self.validators.push(Arc::new(validator));
        self
    }

    pub fn table(&self) -> &Arc<StateTable<Record>> {
        &self.table
    }
}

impl fmt::Debug for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Model")
            .field("workflow", &self.table.workflow())
            .field("validators", &self.validators.len())
            .finish()
    }
}

/// One stored entity.
pub struct Record {
    id: EntityId,
    model: Arc<Model>,
    store: Arc<InMemoryStore>,
    attributes: Attributes,
    errors: ErrorCollection,
    skip_state_validations: bool,
}

impl Record {
    /// Stores a new record without validating it.
    ///
    /// The state attribute defaults to the table's initial state.
    pub fn create<I, K>(store: &Arc<InMemoryStore>, model: &Arc<Model>, attributes: I) -> Result<Self, StorageError>
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        let mut attributes: Attributes = attributes.into_iter().map(|(k, v)| (k.into(), v)).collect();
        let table = model.table();
        attributes
            .entry(table.state_attribute().to_string())
            .or_insert_with(|| Value::String(table.initial_state().to_string()));

        let id = store.insert(attributes.clone())?;
        Ok(Self {
            id,
            model: Arc::clone(model),
            store: Arc::clone(store),
            attributes,
            errors: ErrorCollection::new(),
            skip_state_validations: false,
        })
    }

    /// Loads a stored record.
    pub fn find(store: &Arc<InMemoryStore>, model: &Arc<Model>, id: EntityId) -> Result<Self, StorageError> {
        let attributes = store.read(id)?;
        Ok(Self {
            id,
            model: Arc::clone(model),
            store: Arc::clone(store),
            attributes,
            errors: ErrorCollection::new(),
            skip_state_validations: false,
        })
    }

    pub fn id(&self) -> EntityId {
        self.id
    }

    pub fn model(&self) -> &Arc<Model> {
        &self.model
    }

    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    pub fn get(&self, attribute: &str) -> Option<&Value> {
        self.attributes.get(attribute)
    }

    /// String value of `attribute`, if it holds one.
    pub fn get_str(&self, attribute: &str) -> Option<&str> {
        self.get(attribute).and_then(Value::as_str)
    }

    /// Boolean value of `attribute`; missing or non-boolean reads as false.
    pub fn flag(&self, attribute: &str) -> bool {
        self.get(attribute).and_then(Value::as_bool).unwrap_or(false)
    }

    /// Changes an attribute in memory only.
    pub fn set(&mut self, attribute: impl Into<String>, value: impl Into<Value>) {
        self.attributes.insert(attribute.into(), value.into());
    }

    /// Validates and writes every attribute.
    ///
    /// Returns `Ok(false)` without writing if the record is invalid.
    pub fn save(&mut self) -> Result<bool, StorageError> {
        if !self.is_valid() {
            return Ok(false);
        }
        self.store.write(self.id, self.attributes.clone())?;
        Ok(true)
    }

    /// Sets each attribute, then [`save`](Self::save)s.
    pub fn update<I, K>(&mut self, attributes: I) -> Result<bool, StorageError>
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        for (attribute, value) in attributes {
            self.set(attribute, value);
        }
        self.save()
    }
}

impl fmt::Debug for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Record")
            .field("id", &self.id)
            .field("workflow", &self.model.table.workflow())
            .field("attributes", &self.attributes)
            .finish()
    }
}

impl StatefulEntity for Record {
    fn state_table(&self) -> &Arc<StateTable<Self>> {
        &self.model.table
    }

    fn current_state(&self) -> Option<StateName> {
        self.get_str(self.model.table.state_attribute()).map(StateName::from)
    }

    /// Writes `state` through [`Record::save`]. If the save does not go
    /// through, the in-memory state goes back to what it was.
    fn persist_state(&mut self, state: &StateName) -> Result<bool, StorageError> {
        let attribute = self.model.table.state_attribute().to_string();
        let prior = self.attributes.insert(attribute.clone(), Value::from(state.as_str()));

        let saved = self.save();
        if !matches!(saved, Ok(true)) {
            match prior {
                Some(value) => self.attributes.insert(attribute, value),
                None => self.attributes.remove(&attribute),
            };
        }
        saved
    }

    fn reload(&mut self) -> Result<(), StorageError> {
        self.attributes = self.store.read(self.id)?;
        Ok(())
    }

    fn is_valid(&mut self) -> bool {
        let mut errors = ErrorCollection::new();
        let current = self.current_state();
        self.model
            .table
            .validate_entity_state(self, current.as_ref(), self.skip_state_validations, &mut errors);
        for validator in &self.model.validators {
            validator(self, &mut errors);
        }

        let valid = errors.is_empty();
        self.errors = errors;
        valid
    }

    fn errors(&self) -> &ErrorCollection {
        &self.errors
    }

    fn errors_mut(&mut self) -> &mut ErrorCollection {
        &mut self.errors
    }

    fn skip_state_validations(&self) -> bool {
        self.skip_state_validations
    }

    fn set_skip_state_validations(&mut self, skip: bool) {
        self.skip_state_validations = skip;
    }

    fn transaction_scope(&self) -> Arc<dyn TransactionScope> {
        self.store.clone()
    }
}
