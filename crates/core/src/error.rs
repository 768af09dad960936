//! Error types for Versant
//!
//! We use `thiserror` for automatic `Display` and `Error` trait
//! implementations.
//!
//! Transaction outcomes (commit, abort, conflict) are *not* errors: they
//! travel by value as [`crate::TxnStatus`]. The variants here cover
//! connection-level failures (I/O, framing, disconnects) and nothing
//! else. Contract violations inside the core do not get a variant; they
//! are programming errors and panic.

use std::io;
use thiserror::Error;

/// Result type alias for Versant operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for the Versant workspace.
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error on a client connection or the listener.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The peer closed the connection at a packet boundary.
    ///
    /// Distinct from [`Error::Io`] so the service loop can tell a clean
    /// disconnect from a failed read.
    #[error("peer disconnected")]
    Disconnected,

    /// A header carried a packet type byte outside the protocol.
    #[error("unknown packet type: {0}")]
    UnknownPacketType(u8),

    /// A header announced a payload larger than the accepted cap.
    #[error("payload of {size} bytes exceeds limit of {limit}")]
    PayloadTooLarge {
        /// Announced payload length.
        size: u32,
        /// Maximum accepted length.
        limit: u32,
    },

    /// Any other malformed framing or request sequence.
    #[error("protocol error: {0}")]
    Protocol(String),
}

impl Error {
    /// Create a [`Error::Protocol`] from any message.
    pub fn protocol(message: impl Into<String>) -> Self {
        Error::Protocol(message.into())
    }

    /// Whether this error is an orderly end of the conversation rather
    /// than a fault.
    pub fn is_disconnect(&self) -> bool {
        matches!(self, Error::Disconnected)
    }
}
