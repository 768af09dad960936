//! # Versant
//!
//! A concurrent, multi-version, transactional in-memory key/value store,
//! served to network clients over a small binary framing protocol.
//!
//! Every client connection is bound to exactly one transaction. PUT and
//! GET run against a shared hash-indexed map whose values are versioned by
//! creator transaction; COMMIT resolves the transaction by waiting on the
//! writers it observed and then succeeding or failing atomically.
//! Committed transactions serialize in transaction-id order, aborts
//! propagate through dependencies, and versions unreachable by any future
//! transaction are collected on access.
//!
//! # Quick start (embedded)
//!
//! ```
//! use versant::{Blob, Key, Store, TransactionManager, TxnStatus};
//!
//! let manager = TransactionManager::new();
//! let store = Store::new();
//!
//! let txn = manager.create();
//! store.put(&txn, Key::from_bytes(b"greeting".to_vec()), Blob::new(b"hello".to_vec()));
//! let (value, status) = store.get(&txn, Key::from_bytes(b"greeting".to_vec()));
//! assert_eq!(status, TxnStatus::Pending);
//! assert_eq!(value, Some(Blob::new(b"hello".to_vec())));
//! assert_eq!(txn.commit(), TxnStatus::Committed);
//! ```
//!
//! # Quick start (server)
//!
//! ```no_run
//! use versant::Server;
//!
//! let server = Server::bind("0.0.0.0", 9850)?;
//! server.run()?;
//! # versant::Result::Ok(())
//! ```
//!
//! The `versantd` binary wraps [`Server`] with CLI parsing and
//! SIGHUP-triggered graceful shutdown.

pub use versant_core::{Blob, Error, Key, Result, TxnStatus};

pub use versant_concurrency::{Transaction, TransactionManager};

pub use versant_storage::{Store, Version, NUM_BUCKETS};

pub use versant_server::{protocol, ClientRegistry, Server};

/// Server internals (service loop, registry, listener) for embedders that
/// compose their own binary.
pub mod server {
    pub use versant_server::server::{Server, ServerHandle};
    pub use versant_server::service::serve_client;
}
