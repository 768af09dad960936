//! Concurrency layer for Versant
//!
//! This crate implements transaction identity and coordination:
//! - Transaction: id, terminal status machine, dependency set, wait latch
//! - TransactionManager: id allocation and the registry of live transactions
//!
//! A transaction that observes another transaction's write must not commit
//! before that writer is resolved; the dependency edges and the per-
//! transaction wait latch in this crate enforce exactly that.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod manager;
pub mod transaction;

pub use manager::TransactionManager;
pub use transaction::Transaction;

// Re-export the status enum from core for convenience
pub use versant_core::TxnStatus;
