//! All-or-nothing execution for transactional states.
//!
//! The coordinator opens an independent nested scope, so the transition can
//! be undone on its own without disturbing any scope the caller already holds,
//! and an abort never escalates to the caller. Success is decided by reloading
//! the entity afterwards and comparing the stored state with the desired one.

use std::sync::Arc;

use tracing::{debug, warn};

use super::callbacks::CallbackRun;
use super::context::TransitionContext;
use super::errors::RollbackRequest;
use crate::domain::foundation::StateName;
use crate::ports::{ScopeToken, StatefulEntity, StorageError, TransactionScope};

/// How a transactional attempt ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionReport {
    /// Whether the scope was committed rather than aborted.
    pub committed: bool,
    /// Whether the body's write succeeded.
    pub persisted: bool,
    /// The rollback that caused an abort, if any.
    pub rollback: Option<RollbackRequest>,
    /// State found on the entity after reloading.
    pub observed: Option<StateName>,
    /// Whether `observed` equals the desired state.
    pub reconciled: bool,
}

/// Runs a transition inside its own nested transaction scope.
pub struct TransactionCoordinator;

impl TransactionCoordinator {
    /// Runs `body` in a fresh scope and reports whether the entity ended up
    /// in the desired state.
    ///
    /// # Errors
    ///
    /// Storage failures from `body`, the scope or the reload propagate. When
    /// `body` fails the scope is aborted first.
    pub fn run_transactional<E, F>(ctx: &mut TransitionContext<'_, E>, body: F) -> Result<bool, StorageError>
    where
        E: StatefulEntity,
        F: FnOnce(&mut TransitionContext<'_, E>) -> Result<CallbackRun, StorageError>,
    {
        Ok(Self::run(ctx, body)?.reconciled)
    }

    /// Like [`run_transactional`](Self::run_transactional), returning the
    /// full report.
    pub fn run<E, F>(ctx: &mut TransitionContext<'_, E>, body: F) -> Result<TransactionReport, StorageError>
    where
        E: StatefulEntity,
        F: FnOnce(&mut TransitionContext<'_, E>) -> Result<CallbackRun, StorageError>,
    {
        let guard = OpenScope::begin(ctx.entity().transaction_scope())?;
        debug!(scope = %guard.token, to = %ctx.to(), "Opened transition scope");

        // Dropping the guard on an error or a panic aborts the scope.
        let run = body(ctx)?;

        let committed = if run.rollback_requested() || !run.persisted {
            guard.abort()?;
            false
        } else {
            guard.commit()?;
            true
        };

        ctx.entity_mut().reload()?;
        let observed = ctx.entity().current_state();
        let reconciled = observed.as_ref() == Some(ctx.to());

        Ok(TransactionReport {
            committed,
            persisted: run.persisted,
            rollback: run.rollback,
            observed,
            reconciled,
        })
    }
}

/// A scope that is aborted on drop unless it was closed explicitly.
struct OpenScope {
    scope: Arc<dyn TransactionScope>,
    token: ScopeToken,
    closed: bool,
}

impl OpenScope {
    fn begin(scope: Arc<dyn TransactionScope>) -> Result<Self, StorageError> {
        let token = scope.begin_independent()?;
        Ok(Self {
            scope,
            token,
            closed: false,
        })
    }

    fn commit(mut self) -> Result<(), StorageError> {
        self.closed = true;
        self.scope.commit(self.token)?;
        debug!(scope = %self.token, "Committed transition scope");
        Ok(())
    }

    fn abort(mut self) -> Result<(), StorageError> {
        self.closed = true;
        self.scope.abort(self.token)?;
        debug!(scope = %self.token, "Aborted transition scope");
        Ok(())
    }
}

impl Drop for OpenScope {
    fn drop(&mut self) {
        if self.closed {
            return;
        }
        match self.scope.abort(self.token) {
            Ok(()) => debug!(scope = %self.token, "Aborted unfinished transition scope"),
            Err(err) => warn!(scope = %self.token, error = %err, "Could not abort unfinished transition scope"),
        }
    }
}
