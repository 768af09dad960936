//! Workspace-level scenario tests through the facade crate.
//!
//! These walk the canonical client stories at the embedded API level; the
//! wire-level versions live with the server crate.

use versant::{Blob, Key, Store, TransactionManager, TxnStatus};

fn key(bytes: &[u8]) -> Key {
    Key::from_bytes(bytes.to_vec())
}

fn blob(bytes: &[u8]) -> Blob {
    Blob::new(bytes.to_vec())
}

#[test]
fn solo_transaction_lifecycle() {
    let manager = TransactionManager::new();
    let store = Store::new();

    let txn = manager.create();
    assert_eq!(store.put(&txn, key(b"a"), blob(b"1")), TxnStatus::Pending);
    let (value, status) = store.get(&txn, key(b"a"));
    assert_eq!(status, TxnStatus::Pending);
    assert_eq!(value, Some(blob(b"1")));
    assert_eq!(txn.commit(), TxnStatus::Committed);
}

#[test]
fn observed_writer_orders_commits() {
    let manager = TransactionManager::new();
    let store = Store::new();

    let writer = manager.create();
    store.put(&writer, key(b"k"), blob(b"v1"));

    let reader = manager.create();
    let (value, _) = store.get(&reader, key(b"k"));
    assert_eq!(value, Some(blob(b"v1")));

    assert_eq!(writer.commit(), TxnStatus::Committed);
    assert_eq!(reader.commit(), TxnStatus::Committed);
}

#[test]
fn abort_propagates_to_observers() {
    let manager = TransactionManager::new();
    let store = Store::new();

    let writer = manager.create();
    store.put(&writer, key(b"k"), blob(b"v1"));

    let reader = manager.create();
    store.get(&reader, key(b"k"));

    writer.abort();
    assert_eq!(reader.commit(), TxnStatus::Aborted);
}

#[test]
fn later_writer_wins_over_earlier_one() {
    let manager = TransactionManager::new();
    let store = Store::new();

    let older = manager.create();
    let newer = manager.create();

    assert_eq!(store.put(&newer, key(b"k"), blob(b"v2")), TxnStatus::Pending);
    assert_eq!(store.put(&older, key(b"k"), blob(b"v1")), TxnStatus::Aborted);
    assert_eq!(newer.commit(), TxnStatus::Committed);

    let reader = manager.create();
    let (value, _) = store.get(&reader, key(b"k"));
    assert_eq!(value, Some(blob(b"v2")));
}
