//! In-Memory Store
//!
//! Attribute storage for [`Record`](super::Record)s with nested transaction
//! scopes. Scopes belong to the thread that opened them, the way a database
//! connection owns its savepoints: buffered writes are visible only to that
//! thread until the outermost scope commits.

use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;
use std::thread::{self, ThreadId};

use tracing::debug;

use crate::domain::foundation::EntityId;
use crate::ports::{ScopeToken, StorageError, TransactionScope};

/// Attribute name to value.
pub type Attributes = BTreeMap<String, Value>;

#[derive(Debug)]
struct Scope {
    token: ScopeToken,
    writes: HashMap<EntityId, Attributes>,
}

/// In-memory storage with savepoint-style scopes.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    committed: RwLock<HashMap<EntityId, Attributes>>,
    scopes: RwLock<HashMap<ThreadId, Vec<Scope>>>,
    next_token: AtomicU64,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a new entity and returns its id.
    pub fn insert(&self, attributes: Attributes) -> Result<EntityId, StorageError> {
        let id = EntityId::new();
        self.write(id, attributes)?;
        Ok(id)
    }

    /// Replaces every attribute of `id`.
    ///
    /// Inside a scope the write is buffered in the innermost scope of the
    /// calling thread.
    pub fn write(&self, id: EntityId, attributes: Attributes) -> Result<(), StorageError> {
        {
            let mut scopes = self.scopes.write().map_err(|_| StorageError::LockPoisoned)?;
            if let Some(scope) = scopes.get_mut(&thread::current().id()).and_then(|stack| stack.last_mut()) {
                scope.writes.insert(id, attributes);
                return Ok(());
            }
        }

        let mut committed = self.committed.write().map_err(|_| StorageError::LockPoisoned)?;
        committed.insert(id, attributes);
        Ok(())
    }

    /// Reads `id` as the calling thread sees it.
    pub fn read(&self, id: EntityId) -> Result<Attributes, StorageError> {
        {
            let scopes = self.scopes.read().map_err(|_| StorageError::LockPoisoned)?;
            if let Some(stack) = scopes.get(&thread::current().id()) {
                if let Some(attributes) = stack.iter().rev().find_map(|scope| scope.writes.get(&id)) {
                    return Ok(attributes.clone());
                }
            }
        }

        let committed = self.committed.read().map_err(|_| StorageError::LockPoisoned)?;
        committed.get(&id).cloned().ok_or(StorageError::NotFound(id))
    }

    pub fn exists(&self, id: EntityId) -> Result<bool, StorageError> {
        match self.read(id) {
            Ok(_) => Ok(true),
            Err(StorageError::NotFound(_)) => Ok(false),
            Err(err) => Err(err),
        }
    }

    /// Ids of every visible entity whose `attribute` holds `state`, sorted.
    pub fn find_by_state(&self, attribute: &str, state: &str) -> Result<Vec<EntityId>, StorageError> {
        let mut visible = self.committed.read().map_err(|_| StorageError::LockPoisoned)?.clone();
        {
            let scopes = self.scopes.read().map_err(|_| StorageError::LockPoisoned)?;
            if let Some(stack) = scopes.get(&thread::current().id()) {
                for scope in stack {
                    visible.extend(scope.writes.iter().map(|(id, attrs)| (*id, attrs.clone())));
                }
            }
        }

        let mut ids: Vec<EntityId> = visible
            .into_iter()
            .filter(|(_, attrs)| attrs.get(attribute).and_then(Value::as_str) == Some(state))
            .map(|(id, _)| id)
            .collect();
        ids.sort();
        Ok(ids)
    }

    /// Number of scopes the calling thread has open.
    pub fn scope_depth(&self) -> Result<usize, StorageError> {
        let scopes = self.scopes.read().map_err(|_| StorageError::LockPoisoned)?;
        Ok(scopes.get(&thread::current().id()).map_or(0, Vec::len))
    }

    /// Runs `f` inside a new scope, committing on `Ok` and aborting on `Err`.
    ///
    /// ```ignore
    /// store.transaction(|| {
    ///     post.transition_to("published", TransitionOptions::default())?;
    ///     author.update([("posts", json!(3))])?;
    ///     Ok::<_, StorageError>(())
    /// })?;
    /// ```
    pub fn transaction<T, E, F>(&self, f: F) -> Result<T, E>
    where
        F: FnOnce() -> Result<T, E>,
        E: From<StorageError>,
    {
        let token = self.begin_independent()?;
        match f() {
            Ok(value) => {
                self.commit(token)?;
                Ok(value)
            }
            Err(err) => {
                self.abort(token)?;
                Err(err)
            }
        }
    }

    fn pop_scope(&self, token: ScopeToken) -> Result<(Scope, Option<ScopeToken>), StorageError> {
        let mut scopes = self.scopes.write().map_err(|_| StorageError::LockPoisoned)?;
        let thread_id = thread::current().id();
        let stack = scopes.get_mut(&thread_id).ok_or(StorageError::NoActiveScope)?;

        let top = stack.last().map(|scope| scope.token).ok_or(StorageError::NoActiveScope)?;
        if top != token {
            return Err(StorageError::ScopeMismatch {
                expected: top,
                actual: token,
            });
        }

        let scope = stack.pop().ok_or(StorageError::NoActiveScope)?;
        let parent = stack.last().map(|scope| scope.token);
        if stack.is_empty() {
            scopes.remove(&thread_id);
        }
        Ok((scope, parent))
    }
}

impl TransactionScope for InMemoryStore {
    fn begin_independent(&self) -> Result<ScopeToken, StorageError> {
        let token = ScopeToken::new(self.next_token.fetch_add(1, Ordering::SeqCst));
        let mut scopes = self.scopes.write().map_err(|_| StorageError::LockPoisoned)?;
        let stack = scopes.entry(thread::current().id()).or_default();
        stack.push(Scope {
            token,
            writes: HashMap::new(),
        });
        debug!(scope = %token, depth = stack.len(), "Scope opened");
        Ok(token)
    }

    fn commit(&self, token: ScopeToken) -> Result<(), StorageError> {
        let (scope, parent) = self.pop_scope(token)?;
        let writes = scope.writes.len();

        if parent.is_some() {
            let mut scopes = self.scopes.write().map_err(|_| StorageError::LockPoisoned)?;
            if let Some(parent) = scopes.get_mut(&thread::current().id()).and_then(|stack| stack.last_mut()) {
                parent.writes.extend(scope.writes);
            }
        } else {
            let mut committed = self.committed.write().map_err(|_| StorageError::LockPoisoned)?;
            committed.extend(scope.writes);
        }

        debug!(scope = %token, writes, into_parent = parent.is_some(), "Scope committed");
        Ok(())
    }

    fn abort(&self, token: ScopeToken) -> Result<(), StorageError> {
        let (scope, _) = self.pop_scope(token)?;
        debug!(scope = %token, discarded = scope.writes.len(), "Scope aborted");
        Ok(())
    }
}
