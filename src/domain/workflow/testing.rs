//! Test doubles for workflow unit tests.
//!
//! `Probe` is a minimal entity whose durable state lives in a `ProbeStore`
//! with savepoint-style nested scopes. Hooks append to `Probe::log` so tests
//! can assert ordering.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use super::{ErrorCollection, StateTable};
use crate::domain::foundation::StateName;
use crate::ports::{ScopeToken, StatefulEntity, StorageError, TransactionScope};

#[derive(Default)]
pub struct ProbeStore {
    durable: Mutex<Option<StateName>>,
    scopes: Mutex<Vec<(ScopeToken, Option<StateName>)>>,
    next: AtomicU64,
    pub calls: Mutex<Vec<String>>,
}

impl ProbeStore {
    fn write(&self, state: StateName) {
        let mut scopes = self.scopes.lock().unwrap();
        match scopes.last_mut() {
            Some((_, pending)) => *pending = Some(state),
            None => *self.durable.lock().unwrap() = Some(state),
        }
    }

    fn read(&self) -> Option<StateName> {
        let scopes = self.scopes.lock().unwrap();
        scopes
            .iter()
            .rev()
            .find_map(|(_, pending)| pending.clone())
            .or_else(|| self.durable.lock().unwrap().clone())
    }

    pub fn durable(&self) -> Option<StateName> {
        self.durable.lock().unwrap().clone()
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn pop(&self, scope: ScopeToken) -> Result<Option<StateName>, StorageError> {
        let mut scopes = self.scopes.lock().unwrap();
        match scopes.last() {
            Some((top, _)) if *top == scope => Ok(scopes.pop().and_then(|(_, pending)| pending)),
            Some((top, _)) => Err(StorageError::ScopeMismatch {
                expected: *top,
                actual: scope,
            }),
            None => Err(StorageError::NoActiveScope),
        }
    }
}

impl TransactionScope for ProbeStore {
    fn begin_independent(&self) -> Result<ScopeToken, StorageError> {
        let token = ScopeToken::new(self.next.fetch_add(1, Ordering::SeqCst));
        self.scopes.lock().unwrap().push((token, None));
        self.calls.lock().unwrap().push(format!("begin {}", token));
        Ok(token)
    }

    fn commit(&self, scope: ScopeToken) -> Result<(), StorageError> {
        if let Some(state) = self.pop(scope)? {
            self.write(state);
        }
        self.calls.lock().unwrap().push(format!("commit {}", scope));
        Ok(())
    }

    fn abort(&self, scope: ScopeToken) -> Result<(), StorageError> {
        self.pop(scope)?;
        self.calls.lock().unwrap().push(format!("abort {}", scope));
        Ok(())
    }
}

pub struct Probe {
    pub table: Arc<StateTable<Probe>>,
    pub store: Arc<ProbeStore>,
    pub state: Option<StateName>,
    pub valid: bool,
    pub persist_ok: bool,
    pub ready: bool,
    pub log: Vec<String>,
    pub errors: ErrorCollection,
    pub skip: bool,
    pub is_valid_calls: usize,
}

impl Probe {
    pub fn new(table: Arc<StateTable<Probe>>, state: &str) -> Self {
        let store = Arc::new(ProbeStore::default());
        store.write(StateName::from(state));
        Self {
            table,
            store,
            state: Some(StateName::from(state)),
            valid: true,
            persist_ok: true,
            ready: true,
            log: Vec::new(),
            errors: ErrorCollection::new(),
            skip: false,
            is_valid_calls: 0,
        }
    }
}

impl StatefulEntity for Probe {
    fn state_table(&self) -> &Arc<StateTable<Self>> {
        &self.table
    }

    fn current_state(&self) -> Option<StateName> {
        self.state.clone()
    }

    fn persist_state(&mut self, state: &StateName) -> Result<bool, StorageError> {
        self.log.push(format!("persist {}", state));
        self.state = Some(state.clone());
        if !self.persist_ok {
            return Ok(false);
        }
        self.store.write(state.clone());
        Ok(true)
    }

    fn reload(&mut self) -> Result<(), StorageError> {
        self.state = self.store.read();
        Ok(())
    }

    fn is_valid(&mut self) -> bool {
        self.is_valid_calls += 1;
        if !self.valid {
            self.errors.add_to_base("probe is invalid");
        }
        self.valid
    }

    fn errors(&self) -> &ErrorCollection {
        &self.errors
    }

    fn errors_mut(&mut self) -> &mut ErrorCollection {
        &mut self.errors
    }

    fn skip_state_validations(&self) -> bool {
        self.skip
    }

    fn set_skip_state_validations(&mut self, skip: bool) {
        self.skip = skip;
    }

    fn transaction_scope(&self) -> Arc<dyn TransactionScope> {
        self.store.clone()
    }
}
