//! In-memory storage backend
//!
//! The single-node implementation of the conditional transaction backend.
//!
//! ## Concurrency Model: Single Exclusive Section
//!
//! Every operation (`invoke`, `get`, `range`, `watch`, lifecycle) runs under
//! one `parking_lot::Mutex` guarding the entry table and revision clock
//! jointly. Work inside the section is bounded and never blocks (no I/O, no
//! nested waiting), so the section stays short regardless of load.
//!
//! - `invoke` is atomic end-to-end: evaluate → select branch → advance clock
//!   → apply. Two concurrent invokes observe a strict serialization order,
//!   consistent with the revisions they are assigned.
//! - `range` materializes its result inside the section, so a scan never
//!   observes a transaction's operations applied partially.
//!
//! ## Commit Semantics
//!
//! The chosen branch is staged in full before it is installed into the table,
//! so there is no partially-committed state: either the entire branch lands or
//! none of it does. Operations within one branch may target the same key more
//! than once; the last write in sequence order wins.

use std::collections::BTreeMap;

use parking_lot::Mutex;

use crate::error::{MetaKvError, Result};

use super::entry::{Entry, Key, Revision};
use super::revision::RevisionClock;
use super::snapshot::StoreSnapshot;
use super::table::EntryTable;
use super::transaction::{Operation, Transaction};
use super::watch::{WatchHandle, Watcher};
use super::KeyValueStorage;

/// Lifecycle of a storage instance
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Lifecycle {
    /// Constructed but not yet started
    Created,
    /// Serving operations
    Running,
    /// Stopped for good; every operation fails fast
    Stopped,
}

/// State behind the exclusive lock
struct StoreState {
    lifecycle: Lifecycle,
    table: EntryTable,
    clock: RevisionClock,
    watchers: Vec<Watcher>,
}

impl StoreState {
    fn ensure_running(&self) -> Result<()> {
        if self.lifecycle == Lifecycle::Running {
            Ok(())
        } else {
            Err(MetaKvError::Stopped)
        }
    }

    /// Deliver a committed transaction's entries to every watcher, pruning
    /// the ones whose receivers are gone
    fn dispatch(&mut self, revision: Revision, applied: &[Entry]) {
        self.watchers.retain(|watcher| watcher.notify(revision, applied));
    }
}

/// Single-node, in-memory revisioned key-value storage
pub struct MemoryStorage {
    /// Instance name for log output
    name: String,

    /// Entry table, revision clock, and watcher registry under one lock
    state: Mutex<StoreState>,
}

impl MemoryStorage {
    /// Create a storage instance. It must be started before use.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            state: Mutex::new(StoreState {
                lifecycle: Lifecycle::Created,
                table: EntryTable::new(),
                clock: RevisionClock::new(),
                watchers: Vec::new(),
            }),
        }
    }

    /// Create a storage instance named after the config
    pub fn from_config(config: &crate::config::Config) -> Self {
        Self::new(config.name.clone())
    }

    /// Instance name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of entries in the table, tombstones included (for tests and
    /// debugging; does not require the store to be running)
    pub fn entry_count(&self) -> usize {
        self.state.lock().table.len()
    }

    /// Capture a point-in-time copy of the whole store
    pub fn snapshot(&self) -> Result<StoreSnapshot> {
        let state = self.state.lock();
        state.ensure_running()?;

        Ok(StoreSnapshot {
            revision: state.clock.current(),
            entries: state.table.iter().cloned().collect(),
        })
    }

    /// Replace the store's contents with a snapshot. Allowed before start or
    /// while running; the revision clock resumes from the snapshot's revision.
    pub fn restore(&self, snapshot: StoreSnapshot) -> Result<()> {
        let mut state = self.state.lock();
        if state.lifecycle == Lifecycle::Stopped {
            return Err(MetaKvError::Stopped);
        }

        state.table.clear();
        for entry in snapshot.entries {
            match entry.value {
                Some(value) => state.table.put(entry.key, value, entry.revision),
                None => state.table.tombstone(entry.key, entry.revision),
            }
        }
        state.clock = RevisionClock::starting_at(snapshot.revision);

        tracing::info!(
            "[{}] restored snapshot at revision {} ({} entries)",
            self.name,
            state.clock.current(),
            state.table.len()
        );
        Ok(())
    }

    /// Stage a branch: build the full set of entries to install, deduplicated
    /// so the last write per key wins
    fn stage(branch: &[Operation], revision: Revision) -> BTreeMap<Key, Entry> {
        let mut staged = BTreeMap::new();
        for op in branch {
            let entry = match op {
                Operation::Put { key, value } => {
                    Entry::put(key.clone(), value.clone(), revision)
                }
                Operation::Remove { key } => Entry::tombstone(key.clone(), revision),
            };
            staged.insert(entry.key.clone(), entry);
        }
        staged
    }

    /// Reject ranges where the upper bound is not strictly greater than the
    /// lower bound. Checked before any state is touched.
    fn validate_range(from: &[u8], to: Option<&[u8]>) -> Result<()> {
        match to {
            Some(to) if to <= from => Err(MetaKvError::InvalidRange),
            _ => Ok(()),
        }
    }
}

impl KeyValueStorage for MemoryStorage {
    fn start(&self) -> Result<()> {
        let mut state = self.state.lock();
        match state.lifecycle {
            Lifecycle::Created => {
                state.lifecycle = Lifecycle::Running;
                tracing::info!("[{}] storage started", self.name);
                Ok(())
            }
            Lifecycle::Running => Ok(()),
            Lifecycle::Stopped => Err(MetaKvError::Stopped),
        }
    }

    fn stop(&self) -> Result<()> {
        let mut state = self.state.lock();
        if state.lifecycle != Lifecycle::Stopped {
            state.lifecycle = Lifecycle::Stopped;
            // Disconnect watch receivers so blocked `recv` calls return
            state.watchers.clear();
            tracing::info!("[{}] storage stopped", self.name);
        }
        Ok(())
    }

    fn revision(&self) -> Result<Revision> {
        let state = self.state.lock();
        state.ensure_running()?;
        Ok(state.clock.current())
    }

    fn get(&self, key: &[u8]) -> Result<Option<Entry>> {
        let state = self.state.lock();
        state.ensure_running()?;
        Ok(state.table.get(key).cloned())
    }

    fn invoke(&self, txn: &Transaction) -> Result<bool> {
        let mut state = self.state.lock();
        state.ensure_running()?;

        // Step 1: Evaluate the condition against the current table
        let condition_held = txn.condition.evaluate(&state.table);

        // Step 2: Select the branch
        let branch = txn.branch(condition_held);

        // Step 3: Advance the clock exactly once; an empty branch still
        // commits and consumes a revision
        let revision = state.clock.advance();

        // Step 4: Stage the full branch, then install it. Nothing is written
        // to the table until staging is complete.
        let staged = Self::stage(branch, revision);
        let applied: Vec<Entry> = staged.values().cloned().collect();
        for entry in staged.into_values() {
            match entry.value {
                Some(value) => state.table.put(entry.key, value, revision),
                None => state.table.tombstone(entry.key, revision),
            }
        }

        if !applied.is_empty() {
            state.dispatch(revision, &applied);
        }

        tracing::debug!(
            "[{}] committed revision {} ({} branch, {} ops)",
            self.name,
            revision,
            if condition_held { "success" } else { "failure" },
            applied.len()
        );

        // Step 5: Report which branch ran
        Ok(condition_held)
    }

    fn range(
        &self,
        from: &[u8],
        to: Option<&[u8]>,
        include_tombstones: bool,
    ) -> Result<RangeScan> {
        Self::validate_range(from, to)?;

        let state = self.state.lock();
        state.ensure_running()?;

        // Materialized under the lock: the scan is a consistent point-in-time
        // snapshot, never interleaved with an in-flight invoke
        let entries: Vec<Entry> = state
            .table
            .iter_range(from, to)
            .filter(|entry| include_tombstones || !entry.is_tombstone())
            .cloned()
            .collect();

        Ok(RangeScan::new(entries))
    }

    fn watch(&self, from: &[u8], to: Option<&[u8]>) -> Result<WatchHandle> {
        Self::validate_range(from, to)?;

        let mut state = self.state.lock();
        state.ensure_running()?;

        let (watcher, handle) = Watcher::register(from.to_vec(), to.map(<[u8]>::to_vec));
        state.watchers.push(watcher);
        Ok(handle)
    }
}

/// Consume-once, ordered result of a range scan
///
/// Holds a point-in-time copy of the matched entries; iterating it does not
/// touch the store and is not restartable without re-issuing the call.
#[derive(Debug)]
pub struct RangeScan {
    entries: std::vec::IntoIter<Entry>,
}

impl RangeScan {
    fn new(entries: Vec<Entry>) -> Self {
        Self {
            entries: entries.into_iter(),
        }
    }

    /// Entries not yet consumed
    pub fn remaining(&self) -> usize {
        self.entries.len()
    }
}

impl Iterator for RangeScan {
    type Item = Entry;

    fn next(&mut self) -> Option<Self::Item> {
        self.entries.next()
    }
}
