//! Concurrency stress tests for versant-storage
//!
//! Many client threads hammer a small keyspace through real transactions.
//! The store must never corrupt a version list, never flip a terminal
//! status, and never deadlock: every commit resolves because dependency
//! edges only point at older transactions.

use std::sync::Arc;
use std::thread;

use versant_concurrency::{TransactionManager, TxnStatus};
use versant_core::{Blob, Key};
use versant_storage::Store;

const THREADS: usize = 8;
const ROUNDS: usize = 40;
const KEYS: [&[u8]; 4] = [b"k0", b"k1", b"k2", b"k3"];

#[test]
fn concurrent_clients_converge_without_deadlock() {
    let manager = Arc::new(TransactionManager::new());
    let store = Arc::new(Store::new());

    let handles: Vec<_> = (0..THREADS)
        .map(|worker| {
            let manager = Arc::clone(&manager);
            let store = Arc::clone(&store);
            thread::spawn(move || {
                let mut committed = 0usize;
                let mut aborted = 0usize;
                for round in 0..ROUNDS {
                    let txn = manager.create();
                    let key = Key::from_bytes(KEYS[(worker + round) % KEYS.len()].to_vec());
                    let value = Blob::new(format!("w{worker}r{round}").into_bytes());

                    let status = if round % 3 == 0 {
                        store.get(&txn, key).1
                    } else {
                        store.put(&txn, key, value)
                    };

                    let outcome = match status {
                        TxnStatus::Pending => txn.commit(),
                        status => status,
                    };
                    match outcome {
                        TxnStatus::Committed => committed += 1,
                        TxnStatus::Aborted => aborted += 1,
                        TxnStatus::Pending => panic!("transaction left pending"),
                    }
                }
                (committed, aborted)
            })
        })
        .collect();

    let mut total_committed = 0;
    for handle in handles {
        let (committed, _aborted) = handle.join().expect("worker panicked");
        total_committed += committed;
    }
    assert!(total_committed > 0, "no transaction ever committed");

    // Quiesced store: every history is strictly ascending and bounded.
    let probe = manager.create();
    for key in KEYS {
        let key = Key::from_bytes(key.to_vec());
        store.get(&probe, key.clone());
        let ids: Vec<u64> = store.history(&key).iter().map(|(id, _)| *id).collect();
        assert!(ids.windows(2).all(|w| w[0] < w[1]));
    }
}

#[test]
fn committed_writes_are_observed_after_commit() {
    let manager = Arc::new(TransactionManager::new());
    let store = Arc::new(Store::new());

    // One writer commits, then readers in later transactions must see the
    // committed value, never garbage.
    let writer = manager.create();
    store.put(&writer, Key::from_bytes(b"shared".to_vec()), Blob::new(b"v0".to_vec()));
    writer.commit();

    // Reads happen in id order; each reader chains a dependency on the
    // previous reader's read-through. The commits then race: every one of
    // them blocks until its predecessor resolves, and all succeed.
    let readers: Vec<_> = (0..4)
        .map(|_| {
            let txn = manager.create();
            let (value, status) = store.get(&txn, Key::from_bytes(b"shared".to_vec()));
            assert_eq!(status, TxnStatus::Pending);
            let value = value.expect("committed value must be visible");
            assert_eq!(value.as_bytes(), b"v0");
            txn
        })
        .collect();

    let handles: Vec<_> = readers
        .into_iter()
        .rev()
        .map(|txn| thread::spawn(move || txn.commit()))
        .collect();

    for handle in handles {
        assert_eq!(handle.join().unwrap(), TxnStatus::Committed);
    }
}
