//! EntryTable implementation
//!
//! BTreeMap-based table holding the current state of every key. A BTreeMap
//! rather than a hash map because range scans need ordered iteration by key;
//! point lookups stay cheap and exact-byte-equality keyed.
//!
//! The table exclusively owns all entries. Only the transaction engine mutates
//! it, and always inside the store's exclusive critical section.

use std::collections::BTreeMap;
use std::ops::Bound;

use super::entry::{Entry, Key, Revision, Value};

/// Ordered table of the latest entry per key
#[derive(Debug, Default)]
pub struct EntryTable {
    entries: BTreeMap<Key, Entry>,
}

impl EntryTable {
    /// Create a new, empty table
    pub fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    /// Get the entry for a key, tombstones included.
    /// Returns `None` for keys that have never been written.
    pub fn get(&self, key: &[u8]) -> Option<&Entry> {
        self.entries.get(key)
    }

    /// Current assigned revision of a key: 0 if the key has never existed
    pub fn revision_of(&self, key: &[u8]) -> Revision {
        self.entries.get(key).map_or(0, |e| e.revision)
    }

    /// Returns true if the key holds a live (non-tombstoned) entry
    pub fn exists(&self, key: &[u8]) -> bool {
        self.entries.get(key).is_some_and(|e| !e.is_tombstone())
    }

    /// Write a value for a key, stamped with the given revision.
    /// Overwrites any previous entry in place.
    pub fn put(&mut self, key: Key, value: Value, revision: Revision) {
        let entry = Entry::put(key.clone(), value, revision);
        self.entries.insert(key, entry);
    }

    /// Tombstone a key, stamped with the given revision.
    /// A never-written key still gets a tombstone entry, so revision conditions
    /// against it stay answerable.
    pub fn tombstone(&mut self, key: Key, revision: Revision) {
        let entry = Entry::tombstone(key.clone(), revision);
        self.entries.insert(key, entry);
    }

    /// Number of entries in the table, tombstones included
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the table holds no entries at all
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate entries with keys in `[from, to)`, or `[from, ..)` when `to`
    /// is `None`, in ascending key order. Tombstones are yielded; the caller
    /// filters them.
    pub fn iter_range<'a>(
        &'a self,
        from: &[u8],
        to: Option<&[u8]>,
    ) -> impl Iterator<Item = &'a Entry> {
        let upper: Bound<&[u8]> = match to {
            Some(to) => Bound::Excluded(to),
            None => Bound::Unbounded,
        };

        self.entries
            .range::<[u8], _>((Bound::Included(from), upper))
            .map(|(_, entry)| entry)
    }

    /// Iterate all entries in ascending key order, tombstones included
    pub fn iter(&self) -> impl Iterator<Item = &Entry> {
        self.entries.values()
    }

    /// Drop every entry and start over (used by snapshot restore)
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
