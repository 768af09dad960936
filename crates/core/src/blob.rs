//! Immutable reference-counted byte payloads
//!
//! A `Blob` is the unit of data exchanged with clients: key bytes, value
//! bytes, and reply payloads are all blobs. Content is frozen at
//! construction; only the reference count changes afterwards, so equality
//! and hashing never need a lock.
//!
//! Cloning a `Blob` is the "take a reference" operation and dropping one is
//! the "release a reference" operation; the payload is freed exactly when
//! the last clone is dropped.

use std::fmt;
use std::sync::Arc;

/// Seed for the content hash recurrence.
const HASH_SEED: u32 = 6823;

/// Compute the content hash of a byte slice.
///
/// The recurrence is `h = (h + (h << 5)) + byte` over every byte of the
/// content, in wrapping 32-bit arithmetic. The exact polynomial is
/// incidental; the contract is that equal content hashes equal.
pub fn content_hash(bytes: &[u8]) -> u32 {
    let mut h = HASH_SEED;
    for &b in bytes {
        h = h.wrapping_add(h << 5).wrapping_add(u32::from(b));
    }
    h
}

struct BlobInner {
    content: Box<[u8]>,
    hash: u32,
}

/// An immutable byte buffer shared by reference count.
///
/// Created once from the incoming payload, then shared across keys,
/// versions, and in-flight replies. Equality is size-then-bytes; two blobs
/// with equal content always have equal hashes.
#[derive(Clone)]
pub struct Blob {
    inner: Arc<BlobInner>,
}

impl Blob {
    /// Create a blob by taking ownership of `content`.
    ///
    /// The hash is computed eagerly so later reads are lock-free.
    pub fn new(content: impl Into<Vec<u8>>) -> Self {
        let content: Box<[u8]> = content.into().into_boxed_slice();
        let hash = content_hash(&content);
        let blob = Blob {
            inner: Arc::new(BlobInner { content, hash }),
        };
        tracing::trace!(size = blob.len(), hash = blob.hash(), "create blob");
        blob
    }

    /// The blob's content bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.inner.content
    }

    /// Content length in bytes. A zero-length blob is a valid value,
    /// distinct from "no value".
    pub fn len(&self) -> usize {
        self.inner.content.len()
    }

    /// Whether the content is empty.
    pub fn is_empty(&self) -> bool {
        self.inner.content.is_empty()
    }

    /// The precomputed content hash.
    pub fn hash(&self) -> u32 {
        self.inner.hash
    }

    /// Number of live references to this payload. Exposed for tests and
    /// debug listings.
    pub fn ref_count(&self) -> usize {
        Arc::strong_count(&self.inner)
    }
}

impl PartialEq for Blob {
    fn eq(&self, other: &Self) -> bool {
        if Arc::ptr_eq(&self.inner, &other.inner) {
            return true;
        }
        self.inner.content.len() == other.inner.content.len()
            && self.inner.content == other.inner.content
    }
}

impl Eq for Blob {}

impl fmt::Debug for Blob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Show a short lossy prefix so store dumps stay readable.
        let prefix: String = String::from_utf8_lossy(&self.inner.content)
            .chars()
            .take(16)
            .collect();
        f.debug_struct("Blob")
            .field("size", &self.len())
            .field("prefix", &prefix)
            .finish()
    }
}


#[cfg(test)]
mod properties {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn equal_content_always_hashes_equal(bytes in proptest::collection::vec(any::<u8>(), 0..256)) {
            let a = Blob::new(bytes.clone());
            let b = Blob::new(bytes);
            prop_assert_eq!(a.hash(), b.hash());
            prop_assert_eq!(a, b);
        }

        #[test]
        fn appending_a_byte_changes_equality(
            bytes in proptest::collection::vec(any::<u8>(), 0..256),
            extra in any::<u8>(),
        ) {
            let longer = {
                let mut v = bytes.clone();
                v.push(extra);
                v
            };
            prop_assert_ne!(Blob::new(bytes), Blob::new(longer));
        }
    }
}
