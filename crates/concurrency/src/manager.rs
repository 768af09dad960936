//! Transaction manager: id allocation and the live-transaction registry
//!
//! The manager owns the process-lifetime id counter and the global list of
//! transactions. It is a long-lived object created at startup and threaded
//! through the service dispatcher; there are no process-wide singletons.
//!
//! The registry holds weak handles. A transaction stays alive through the
//! strong handles held by its client, its authored versions, and the
//! dependency edges pointing at it; once the last of those is released the
//! transaction is destroyed and its registry slot is pruned, which is how
//! an entry "leaves the global list".

use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::debug;

use crate::transaction::Transaction;

/// Allocates transaction ids and tracks live transactions.
pub struct TransactionManager {
    /// Next transaction id. Monotonic for the process lifetime; ids
    /// reflect creation order.
    next_id: AtomicU64,

    /// Weak handles to every transaction created and not yet destroyed.
    registry: Mutex<Vec<Weak<Transaction>>>,
}

impl TransactionManager {
    /// Create a manager with the id counter at zero.
    pub fn new() -> Self {
        debug!("initialize transaction manager");
        TransactionManager {
            next_id: AtomicU64::new(0),
            registry: Mutex::new(Vec::new()),
        }
    }

    /// Create a new pending transaction and register it.
    ///
    /// # Panics
    ///
    /// Panics if the id counter reaches `u64::MAX` (overflow).
    pub fn create(&self) -> Arc<Transaction> {
        let id = self
            .next_id
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |v| v.checked_add(1))
            .expect("transaction id overflow: u64::MAX reached");

        let txn = Arc::new(Transaction::new(id));

        let mut registry = self.registry.lock();
        registry.retain(|slot| slot.strong_count() > 0);
        registry.push(Arc::downgrade(&txn));

        debug!(txn = id, "create transaction");
        txn
    }

    /// Ids handed out so far (equals the id the next transaction will
    /// *not* be less than).
    pub fn next_id(&self) -> u64 {
        self.next_id.load(Ordering::SeqCst)
    }

    /// Snapshot the transactions that are still alive.
    ///
    /// Prunes registry slots whose transaction has been destroyed.
    pub fn live(&self) -> Vec<Arc<Transaction>> {
        let mut registry = self.registry.lock();
        registry.retain(|slot| slot.strong_count() > 0);
        registry.iter().filter_map(Weak::upgrade).collect()
    }

    /// Drop the registry at shutdown.
    pub fn finalize(&self) {
        debug!("finalize transaction manager");
        self.registry.lock().clear();
    }
}

impl Default for TransactionManager {
    fn default() -> Self {
        TransactionManager::new()
    }
}
