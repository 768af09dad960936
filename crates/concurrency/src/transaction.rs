//! Transaction identity, status, and commit coordination
//!
//! Each connected client is bound to exactly one `Transaction`. A
//! transaction that reads or overwrites a still-pending writer's version
//! records a dependency edge on that writer; its commit blocks until every
//! dependency is terminal and cascades to an abort if any dependency
//! aborted.
//!
//! # Wait latch
//!
//! The terminal transition is a latch: waiters block on the per-transaction
//! condition variable until the status leaves `Pending`, and the committing
//! or aborting thread wakes all of them after flipping the status under the
//! same lock. Registration and wakeup happen under one mutex, so a wakeup
//! cannot be lost between the status check and the wait.
//!
//! # Ordering
//!
//! Dependency edges always point at strictly smaller transaction ids (a
//! version's creator predates any transaction that later observes it), so
//! the wait graph is acyclic and every commit terminates.

use std::fmt;
use std::sync::Arc;

use parking_lot::{Condvar, Mutex};
use tracing::{debug, trace};
use versant_core::TxnStatus;

struct TxnState {
    status: TxnStatus,
    /// Dependency multiset: one entry per observation of a pending writer.
    /// Duplicate edges are harmless; waiting is a status check per entry.
    depends: Vec<Arc<Transaction>>,
}

/// A client-scoped unit of work with a unique id.
///
/// Created by [`crate::TransactionManager::create`]. Shared by reference
/// count: the client handle, every version the transaction authored, and
/// every dependency edge pointing at it each hold one clone.
pub struct Transaction {
    id: u64,
    state: Mutex<TxnState>,
    terminal: Condvar,
}

impl Transaction {
    pub(crate) fn new(id: u64) -> Self {
        Transaction {
            id,
            state: Mutex::new(TxnState {
                status: TxnStatus::Pending,
                depends: Vec::new(),
            }),
            terminal: Condvar::new(),
        }
    }

    /// The unique, monotonically assigned id. Ids are totally ordered and
    /// reflect creation order.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Current status, read under the per-transaction lock.
    pub fn status(&self) -> TxnStatus {
        self.state.lock().status
    }

    /// Record that this transaction must wait for `dep` before committing.
    ///
    /// Takes one reference on the target. Duplicates are allowed; the
    /// externally visible effect is that commit waits until `dep` is
    /// terminal at least once.
    pub fn add_dependency(&self, dep: Arc<Transaction>) {
        debug_assert!(
            dep.id < self.id,
            "dependency edge must point at an older transaction"
        );
        debug!(txn = self.id, on = dep.id, "add dependency");
        self.state.lock().depends.push(dep);
    }

    /// Number of dependency edges recorded so far.
    pub fn dependency_count(&self) -> usize {
        self.state.lock().depends.len()
    }

    /// Block until this transaction reaches a terminal status.
    pub fn wait_terminal(&self) {
        let mut state = self.state.lock();
        while !state.status.is_terminal() {
            self.terminal.wait(&mut state);
        }
    }

    /// Resolve this transaction by waiting on its dependency set.
    ///
    /// Blocks until every dependency is terminal. If any dependency
    /// aborted, this transaction cascade-aborts and `Aborted` is returned;
    /// otherwise the status flips to `Committed` and all waiters on this
    /// transaction are woken.
    ///
    /// A transaction can be cascade-aborted by another thread while it is
    /// blocked here (a garbage-collection pass over a key it wrote); in
    /// that case the already-terminal abort wins and `Aborted` is
    /// returned. A terminal status is never overwritten.
    pub fn commit(&self) -> TxnStatus {
        debug!(txn = self.id, "trying to commit");

        let deps = self.state.lock().depends.clone();
        for dep in &deps {
            trace!(txn = self.id, on = dep.id, "waiting for dependency");
            dep.wait_terminal();
        }

        if deps.iter().any(|dep| dep.status().is_aborted()) {
            debug!(txn = self.id, "dependency aborted, cascading");
            return self.abort();
        }

        let mut state = self.state.lock();
        match state.status {
            TxnStatus::Pending => {
                state.status = TxnStatus::Committed;
                drop(state);
                self.terminal.notify_all();
                debug!(txn = self.id, "committed");
                TxnStatus::Committed
            }
            // Cascade-aborted while blocked on a dependency.
            TxnStatus::Aborted => {
                drop(state);
                self.terminal.notify_all();
                debug!(txn = self.id, "aborted while committing");
                TxnStatus::Aborted
            }
            TxnStatus::Committed => TxnStatus::Committed,
        }
    }

    /// Abort this transaction and wake every thread waiting on it.
    ///
    /// Idempotent: aborting an already-aborted transaction re-wakes
    /// waiters and returns `Aborted`.
    ///
    /// # Panics
    ///
    /// Aborting a committed transaction is a contract violation and
    /// panics. The store's conflict rules guarantee this cannot happen
    /// under correct use; the server binary escalates the panic to
    /// process exit.
    pub fn abort(&self) -> TxnStatus {
        let mut state = self.state.lock();
        match state.status {
            TxnStatus::Committed => {
                drop(state);
                panic!(
                    "contract violation: abort of committed transaction {}",
                    self.id
                );
            }
            TxnStatus::Aborted => {
                drop(state);
                self.terminal.notify_all();
                trace!(txn = self.id, "already aborted");
                TxnStatus::Aborted
            }
            TxnStatus::Pending => {
                state.status = TxnStatus::Aborted;
                drop(state);
                self.terminal.notify_all();
                debug!(txn = self.id, "aborted");
                TxnStatus::Aborted
            }
        }
    }
}

impl fmt::Debug for Transaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transaction")
            .field("id", &self.id)
            .field("status", &self.status())
            .finish()
    }
}
