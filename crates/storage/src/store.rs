//! Bucketed MVCC store
//!
//! A fixed array of [`NUM_BUCKETS`] insertion-ordered chains behind one
//! coarse mutex. Each map entry owns its key and a version list sorted
//! strictly ascending by creator transaction id, with at most one version
//! per transaction.
//!
//! # Write/read rules
//!
//! - A put by a transaction older than some existing version's creator is
//!   an anachronistic write: the writer aborts immediately.
//! - Any access that inserts a version records a dependency on every
//!   still-pending creator already in the list, ordering the newcomer's
//!   commit after theirs.
//! - A get observes the tail (highest creator id) version and inserts a
//!   read-through version carrying the observed value, so later writers
//!   order themselves after the reader.
//!
//! # Garbage collection
//!
//! Every access first collects versions that can never be observed again:
//! committed versions superseded by a newer committed one, and everything
//! from the earliest aborted version onward (whose later creators are
//! cascade-aborted). List length stays proportional to the number of
//! pending writers plus one committed snapshot.

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, trace};

use versant_concurrency::Transaction;
use versant_core::{Blob, Key, TxnStatus};

use crate::version::Version;

/// Number of bucket chains. Fixed, no resize; the store targets small
/// working sets and the chain-walk order is part of its observable debug
/// output.
pub const NUM_BUCKETS: usize = 8;

struct MapEntry {
    key: Key,
    /// Sorted strictly ascending by creator id; at most one version per
    /// transaction.
    versions: Vec<Version>,
}

struct Table {
    buckets: [Vec<MapEntry>; NUM_BUCKETS],
}

impl Table {
    fn new() -> Self {
        Table {
            buckets: std::array::from_fn(|_| Vec::new()),
        }
    }

    /// Locate the entry for `key`, creating it if absent.
    ///
    /// On a hit the passed-in key is redundant and dropped here; on a miss
    /// the entry adopts it for the store's lifetime.
    fn find_or_insert(&mut self, key: Key) -> &mut MapEntry {
        let bucket = key.bucket(NUM_BUCKETS);
        let chain = &mut self.buckets[bucket];
        match chain.iter().position(|entry| entry.key == key) {
            Some(idx) => {
                trace!(hash = key.hash(), "matching entry exists, disposing redundant key");
                &mut chain[idx]
            }
            None => {
                debug!(bucket, hash = key.hash(), "create map entry");
                let idx = chain.len();
                chain.push(MapEntry {
                    key,
                    versions: Vec::new(),
                });
                &mut chain[idx]
            }
        }
    }

    fn find(&self, key: &Key) -> Option<&MapEntry> {
        self.buckets[key.bucket(NUM_BUCKETS)]
            .iter()
            .find(|entry| entry.key == *key)
    }
}

/// The shared, hash-indexed, multi-version object store.
///
/// One coarse mutex serializes lookup, version insertion, and garbage
/// collection for the duration of each put/get call.
pub struct Store {
    table: Mutex<Table>,
}

impl Store {
    /// Create an empty store.
    pub fn new() -> Self {
        debug!("initialize object store");
        Store {
            table: Mutex::new(Table::new()),
        }
    }

    /// Map `key` to `value` on behalf of `txn`.
    ///
    /// Returns the transaction's status after the operation: `Pending` on
    /// success, `Aborted` if the write was anachronistic (in which case
    /// the value is released and no version is inserted).
    pub fn put(&self, txn: &Arc<Transaction>, key: Key, value: Blob) -> TxnStatus {
        debug!(txn = txn.id(), key = ?key.blob(), "put");
        let mut table = self.table.lock();
        let entry = table.find_or_insert(key);
        Self::garbage_collect(entry);
        Self::add_version(entry, txn, Some(value));
        txn.status()
    }

    /// Look up the current value of `key` on behalf of `txn`.
    ///
    /// Observes the tail version (highest creator id) and inserts a
    /// read-through version so the read participates in ordering: the
    /// observed writer becomes a dependency, and later writers see the
    /// reader. A miss observes "no value" and leaves a tombstone.
    pub fn get(&self, txn: &Arc<Transaction>, key: Key) -> (Option<Blob>, TxnStatus) {
        debug!(txn = txn.id(), key = ?key.blob(), "get");
        let mut table = self.table.lock();
        let entry = table.find_or_insert(key);
        Self::garbage_collect(entry);

        let observed = entry.versions.last().and_then(|tail| tail.value().cloned());
        Self::add_version(entry, txn, observed.clone());

        (observed, txn.status())
    }

    /// Insert a version for `txn` carrying `value` (tombstone on `None`).
    ///
    /// Enforces the ordering rules: a transaction older than any existing
    /// creator aborts (anachronistic access), every still-pending creator
    /// already in the list becomes a dependency, and a same-transaction
    /// version is replaced in place so the per-transaction uniqueness
    /// invariant holds.
    fn add_version(entry: &mut MapEntry, txn: &Arc<Transaction>, value: Option<Blob>) {
        if let Some(newer) = entry
            .versions
            .iter()
            .find(|version| version.creator().id() > txn.id())
        {
            debug!(
                txn = txn.id(),
                newer = newer.creator().id(),
                "anachronistic access, aborting"
            );
            txn.abort();
            // `value` is dropped here, releasing the blob reference.
            return;
        }

        for version in &entry.versions {
            let creator = version.creator();
            if creator.id() == txn.id() {
                continue;
            }
            match creator.status() {
                // Still in flight: our commit must wait for theirs.
                TxnStatus::Pending => txn.add_dependency(Arc::clone(creator)),
                // Aborted after the collection pass read its status: our
                // version is about to follow a write that logically never
                // happened, so take the edge anyway and let commit cascade
                // exactly as the next collection pass would force it to.
                TxnStatus::Aborted => txn.add_dependency(Arc::clone(creator)),
                TxnStatus::Committed => {}
            }
        }

        let version = Version::new(Arc::clone(txn), value);
        match entry
            .versions
            .iter_mut()
            .find(|existing| existing.creator().id() == txn.id())
        {
            Some(existing) => {
                trace!(txn = txn.id(), "replace own version in place");
                *existing = version;
            }
            None => entry.versions.push(version),
        }
    }

    /// Remove versions that cannot be observed again.
    ///
    /// Statuses are read once per creator; the decisions below use that
    /// snapshot so a concurrent terminal transition lands either wholly
    /// before or wholly after this pass.
    fn garbage_collect(entry: &mut MapEntry) {
        if entry.versions.is_empty() {
            return;
        }

        let mut tagged: Vec<(Version, TxnStatus)> = entry
            .versions
            .drain(..)
            .map(|version| {
                let status = version.creator().status();
                (version, status)
            })
            .collect();

        // Committed versions superseded by a newer committed one are
        // unobservable: every future transaction's id exceeds the latest
        // committed creator's id.
        if let Some(latest) = tagged
            .iter()
            .filter(|(_, status)| status.is_committed())
            .map(|(version, _)| version.creator().id())
            .max()
        {
            tagged.retain(|(version, status)| {
                let superseded = status.is_committed() && version.creator().id() < latest;
                if superseded {
                    trace!(creator = version.creator().id(), "collect superseded commit");
                }
                !superseded
            });
        }

        // From the earliest aborted version on, nothing is legitimately
        // observable: later writers ordered themselves after an aborted
        // write, so their creators cascade-abort and the versions go.
        if let Some(cut) = tagged.iter().position(|(_, status)| status.is_aborted()) {
            for (version, _) in tagged.drain(cut..) {
                trace!(creator = version.creator().id(), "collect orphaned version");
                version.creator().abort();
            }
        }

        entry.versions.extend(tagged.into_iter().map(|(version, _)| version));
    }

    /// Number of distinct keys currently in the store.
    pub fn len(&self) -> usize {
        let table = self.table.lock();
        table.buckets.iter().map(Vec::len).sum()
    }

    /// Whether the store holds no entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot of a key's version list as `(creator id, value)` pairs,
    /// oldest first. Runs no garbage collection; exposed for tests and
    /// debug listings.
    pub fn history(&self, key: &Key) -> Vec<(u64, Option<Blob>)> {
        let table = self.table.lock();
        table
            .find(key)
            .map(|entry| {
                entry
                    .versions
                    .iter()
                    .map(|version| (version.creator().id(), version.value().cloned()))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Drain all entries at shutdown, releasing every key and version.
    pub fn finalize(&self) {
        debug!("finalize object store");
        let mut table = self.table.lock();
        for chain in &mut table.buckets {
            chain.clear();
        }
    }
}

impl Default for Store {
    fn default() -> Self {
        Store::new()
    }
}

impl fmt::Debug for Store {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let table = self.table.lock();
        let mut dump = f.debug_struct("Store");
        for (i, chain) in table.buckets.iter().enumerate() {
            if chain.is_empty() {
                continue;
            }
            let entries: Vec<String> = chain
                .iter()
                .map(|entry| {
                    let versions: Vec<String> = entry
                        .versions
                        .iter()
                        .map(|v| format!("{}:{}", v.creator().id(), v.creator().status()))
                        .collect();
                    format!("{:?} -> [{}]", entry.key.blob(), versions.join(", "))
                })
                .collect();
            dump.field(&format!("bucket{i}"), &entries);
        }
        dump.finish()
    }
}
