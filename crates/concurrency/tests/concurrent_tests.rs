//! Multi-threaded tests for versant-concurrency
//!
//! These tests verify the wait protocol under actual concurrent execution:
//!
//! 1. **Commit blocks** until every dependency is terminal
//! 2. **Terminal transitions wake waiters** (commit and abort alike)
//! 3. **Abort cascades** through waiting committers
//! 4. **Idempotent abort** is safe under racing callers
//! 5. **Dependency chains** resolve in id order without deadlock

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;

use versant_concurrency::{TransactionManager, TxnStatus};

// ============================================================================
// Test Helpers
// ============================================================================

/// Give a spawned thread a moment to reach its blocking point.
fn settle() {
    thread::sleep(Duration::from_millis(50));
}

// ============================================================================
// Blocking and wakeup
// ============================================================================

#[test]
fn commit_blocks_until_dependency_commits() {
    let manager = TransactionManager::new();
    let older = manager.create();
    let newer = manager.create();
    newer.add_dependency(Arc::clone(&older));

    let finished = Arc::new(AtomicBool::new(false));
    let handle = {
        let newer = Arc::clone(&newer);
        let finished = Arc::clone(&finished);
        thread::spawn(move || {
            let status = newer.commit();
            finished.store(true, Ordering::SeqCst);
            status
        })
    };

    settle();
    assert!(
        !finished.load(Ordering::SeqCst),
        "commit must not finish while its dependency is pending"
    );

    assert_eq!(older.commit(), TxnStatus::Committed);
    assert_eq!(handle.join().unwrap(), TxnStatus::Committed);
    assert_eq!(newer.status(), TxnStatus::Committed);
}

#[test]
fn abort_wakes_waiting_committer_and_cascades() {
    let manager = TransactionManager::new();
    let older = manager.create();
    let newer = manager.create();
    newer.add_dependency(Arc::clone(&older));

    let handle = {
        let newer = Arc::clone(&newer);
        thread::spawn(move || newer.commit())
    };

    settle();
    assert_eq!(older.abort(), TxnStatus::Aborted);
    assert_eq!(handle.join().unwrap(), TxnStatus::Aborted);
    assert_eq!(newer.status(), TxnStatus::Aborted);
}

#[test]
fn terminal_transition_wakes_every_waiter() {
    let manager = TransactionManager::new();
    let older = manager.create();

    let waiters: Vec<_> = (0..4)
        .map(|_| {
            let newer = manager.create();
            newer.add_dependency(Arc::clone(&older));
            let newer = Arc::clone(&newer);
            thread::spawn(move || newer.commit())
        })
        .collect();

    settle();
    older.abort();
    for handle in waiters {
        assert_eq!(handle.join().unwrap(), TxnStatus::Aborted);
    }
}

// ============================================================================
// Idempotent abort under races
// ============================================================================

#[test]
fn racing_aborts_agree_on_the_outcome() {
    let manager = TransactionManager::new();
    let txn = manager.create();
    let barrier = Arc::new(Barrier::new(4));

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let txn = Arc::clone(&txn);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                txn.abort()
            })
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.join().unwrap(), TxnStatus::Aborted);
    }
    assert_eq!(txn.status(), TxnStatus::Aborted);
}

// ============================================================================
// Dependency chains
// ============================================================================

#[test]
fn chain_of_commits_resolves_in_id_order() {
    let manager = TransactionManager::new();
    let chain: Vec<_> = (0..8).map(|_| manager.create()).collect();
    for pair in chain.windows(2) {
        pair[1].add_dependency(Arc::clone(&pair[0]));
    }

    // Commit everything but the head concurrently; all of them block on
    // their predecessor until the head resolves.
    let handles: Vec<_> = chain[1..]
        .iter()
        .map(|txn| {
            let txn = Arc::clone(txn);
            thread::spawn(move || txn.commit())
        })
        .collect();

    settle();
    assert_eq!(chain[0].commit(), TxnStatus::Committed);
    for handle in handles {
        assert_eq!(handle.join().unwrap(), TxnStatus::Committed);
    }
}

#[test]
fn abort_at_the_head_cascades_down_the_chain() {
    let manager = TransactionManager::new();
    let chain: Vec<_> = (0..5).map(|_| manager.create()).collect();
    for pair in chain.windows(2) {
        pair[1].add_dependency(Arc::clone(&pair[0]));
    }

    let handles: Vec<_> = chain[1..]
        .iter()
        .map(|txn| {
            let txn = Arc::clone(txn);
            thread::spawn(move || txn.commit())
        })
        .collect();

    settle();
    chain[0].abort();
    for handle in handles {
        assert_eq!(handle.join().unwrap(), TxnStatus::Aborted);
    }
}
