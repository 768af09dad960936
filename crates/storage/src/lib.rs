//! Versioned object store for Versant
//!
//! This crate implements the shared, hash-indexed map at the center of the
//! system: a fixed table of bucket chains whose entries carry per-key
//! version lists ordered by creator transaction id. It owns the MVCC
//! write/read rules, conflict detection for anachronistic writes,
//! dependency induction between transactions touching the same key, and
//! garbage collection of versions that can never be observed again.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod store;
pub mod version;

pub use store::{Store, NUM_BUCKETS};
pub use version::Version;
