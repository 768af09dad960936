//! Key handles
//!
//! A `Key` owns exactly one blob reference and caches its content hash so
//! bucket placement and comparisons don't re-walk the bytes.

use std::fmt;

use crate::blob::Blob;

/// A map key: one owned blob reference plus its precomputed hash.
///
/// Two keys are equal iff their hashes match and their blobs compare equal.
/// Construction adopts the blob reference; dropping the key releases it.
#[derive(Clone)]
pub struct Key {
    blob: Blob,
    hash: u32,
}

impl Key {
    /// Create a key, adopting the given blob reference.
    pub fn new(blob: Blob) -> Self {
        let hash = blob.hash();
        Key { blob, hash }
    }

    /// Create a key directly from raw bytes.
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Key::new(Blob::new(bytes))
    }

    /// The cached content hash.
    pub fn hash(&self) -> u32 {
        self.hash
    }

    /// The underlying blob.
    pub fn blob(&self) -> &Blob {
        &self.blob
    }

    /// Bucket index for a table with `num_buckets` chains.
    pub fn bucket(&self, num_buckets: usize) -> usize {
        debug_assert!(num_buckets > 0);
        self.hash as usize % num_buckets
    }
}

impl PartialEq for Key {
    fn eq(&self, other: &Self) -> bool {
        // Hash first; the byte comparison only runs on a hash match.
        self.hash == other.hash && self.blob == other.blob
    }
}

impl Eq for Key {}

impl fmt::Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Key")
            .field("hash", &self.hash)
            .field("blob", &self.blob)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equal_keys_match_on_hash_and_bytes() {
        let a = Key::from_bytes(b"user:1".to_vec());
        let b = Key::from_bytes(b"user:1".to_vec());
        assert_eq!(a, b);
        assert_eq!(a.hash(), b.hash());
        assert_eq!(a.bucket(8), b.bucket(8));
    }

    #[test]
    fn unequal_keys_do_not_match() {
        let a = Key::from_bytes(b"user:1".to_vec());
        let b = Key::from_bytes(b"user:2".to_vec());
        assert_ne!(a, b);
    }

    #[test]
    fn key_adopts_blob_reference() {
        let blob = Blob::new(b"k".to_vec());
        let extra = blob.clone();
        let key = Key::new(blob);
        assert_eq!(extra.ref_count(), 2);
        drop(key);
        assert_eq!(extra.ref_count(), 1);
    }

    #[test]
    fn bucket_is_hash_mod_buckets() {
        let key = Key::from_bytes(b"abc".to_vec());
        assert_eq!(key.bucket(8), key.hash() as usize % 8);
    }
}
