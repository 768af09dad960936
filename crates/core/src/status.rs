//! Transaction lifecycle status
//!
//! Status transitions only `Pending -> Committed` or `Pending -> Aborted`;
//! both terminal states are final. Core operations report outcomes by
//! returning this value, never through an error path.

use std::fmt;

/// The three-state lifecycle of a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxnStatus {
    /// Still executing; may accept further operations.
    Pending,
    /// Committed successfully. Terminal.
    Committed,
    /// Aborted, by conflict, cascade, or explicit request. Terminal.
    Aborted,
}

impl TxnStatus {
    /// Whether this status is one of the two terminal states.
    pub fn is_terminal(self) -> bool {
        !matches!(self, TxnStatus::Pending)
    }

    /// Whether the transaction has aborted.
    pub fn is_aborted(self) -> bool {
        matches!(self, TxnStatus::Aborted)
    }

    /// Whether the transaction has committed.
    pub fn is_committed(self) -> bool {
        matches!(self, TxnStatus::Committed)
    }
}

impl fmt::Display for TxnStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TxnStatus::Pending => "pending",
            TxnStatus::Committed => "committed",
            TxnStatus::Aborted => "aborted",
        };
        f.write_str(name)
    }
}
