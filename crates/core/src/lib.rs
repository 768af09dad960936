//! Core types for Versant
//!
//! This crate defines the foundational types shared by every layer of the
//! system:
//! - Blob: immutable, reference-counted byte payload with a content hash
//! - Key: handle pairing a blob with its precomputed hash
//! - TxnStatus: the three-state transaction lifecycle
//! - Error: workspace-wide error type hierarchy
//!
//! The ownership discipline throughout the workspace is the one these types
//! encode: a `Blob` clone is a new reference to the same payload, dropping
//! the last reference releases the payload, and APIs that adopt a value take
//! it by move.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod blob;
pub mod error;
pub mod key;
pub mod status;

pub use blob::Blob;
pub use error::{Error, Result};
pub use key::Key;
pub use status::TxnStatus;
