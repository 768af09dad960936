//! Version records
//!
//! A version is a passive `(creator, value)` record in a key's history.
//! The store is the sole owner of version list structure; a version itself
//! only holds its two references.

use std::fmt;
use std::sync::Arc;

use versant_concurrency::Transaction;
use versant_core::Blob;

/// One entry in a key's version history.
///
/// Holds one reference to its creator transaction and one to the value
/// blob; `None` is the tombstone, meaning "no value observed". A version is
/// only constructible from a live transaction handle, so the creator
/// reference is at least one for as long as the version exists.
pub struct Version {
    creator: Arc<Transaction>,
    value: Option<Blob>,
}

impl Version {
    /// Create a version, adopting the creator reference and the value
    /// blob (or tombstone).
    pub fn new(creator: Arc<Transaction>, value: Option<Blob>) -> Self {
        Version { creator, value }
    }

    /// The transaction that created this version.
    pub fn creator(&self) -> &Arc<Transaction> {
        &self.creator
    }

    /// The value blob, or `None` for a tombstone.
    pub fn value(&self) -> Option<&Blob> {
        self.value.as_ref()
    }

    /// Whether this version records "no value observed".
    pub fn is_tombstone(&self) -> bool {
        self.value.is_none()
    }
}

impl fmt::Debug for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Version")
            .field("creator", &self.creator.id())
            .field("status", &self.creator.status())
            .field("value", &self.value)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use versant_concurrency::TransactionManager;

    #[test]
    fn version_holds_creator_reference() {
        let manager = TransactionManager::new();
        let txn = manager.create();
        assert_eq!(Arc::strong_count(&txn), 1);

        let version = Version::new(Arc::clone(&txn), Some(Blob::new(b"v".to_vec())));
        assert_eq!(Arc::strong_count(&txn), 2);
        assert_eq!(version.creator().id(), txn.id());

        drop(version);
        assert_eq!(Arc::strong_count(&txn), 1);
    }

    #[test]
    fn tombstone_has_no_value() {
        let manager = TransactionManager::new();
        let version = Version::new(manager.create(), None);
        assert!(version.is_tombstone());
        assert!(version.value().is_none());
    }

    #[test]
    fn version_adopts_blob_reference() {
        let manager = TransactionManager::new();
        let blob = Blob::new(b"payload".to_vec());
        let version = Version::new(manager.create(), Some(blob.clone()));
        assert_eq!(blob.ref_count(), 2);
        drop(version);
        assert_eq!(blob.ref_count(), 1);
    }
}
