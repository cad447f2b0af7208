//! Watch facility
//!
//! Callers register a byte-range of interest and receive one event batch per
//! committed transaction that touched the range. Batches carry the revision
//! the transaction was assigned and are never split: a receiver either sees
//! all of a transaction's in-range entries or none of them.
//!
//! Delivery runs inside the store's exclusive section, so batches arrive in
//! revision order. Receivers that have been dropped are pruned on the next
//! dispatch.

use crossbeam::channel::{unbounded, Receiver, Sender, TryRecvError};

use super::entry::{Entry, Revision};

/// One committed transaction's effect on a watched range
#[derive(Debug, Clone)]
pub struct EntryEvent {
    /// Revision assigned to the transaction that produced this batch
    pub revision: Revision,

    /// Entries written by the transaction inside the watched range,
    /// post-image, in ascending key order
    pub entries: Vec<Entry>,
}

/// Receiving end of a watch registration
///
/// Dropping the handle cancels the watch; the store prunes the registration
/// the next time it dispatches events.
#[derive(Debug)]
pub struct WatchHandle {
    receiver: Receiver<EntryEvent>,
}

impl WatchHandle {
    /// Block until the next event batch, or `None` once the store side
    /// is gone
    pub fn recv(&self) -> Option<EntryEvent> {
        self.receiver.recv().ok()
    }

    /// Fetch a pending event batch without blocking
    pub fn try_recv(&self) -> Option<EntryEvent> {
        match self.receiver.try_recv() {
            Ok(event) => Some(event),
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => None,
        }
    }
}

/// A registered watcher held by the store
#[derive(Debug)]
pub(crate) struct Watcher {
    from: Vec<u8>,
    to: Option<Vec<u8>>,
    sender: Sender<EntryEvent>,
}

impl Watcher {
    /// Register a new watcher over `[from, to)` (`to = None` for unbounded)
    pub(crate) fn register(from: Vec<u8>, to: Option<Vec<u8>>) -> (Self, WatchHandle) {
        let (sender, receiver) = unbounded();
        let watcher = Self { from, to, sender };
        (watcher, WatchHandle { receiver })
    }

    /// Returns true if the key falls inside this watcher's range
    fn covers(&self, key: &[u8]) -> bool {
        key >= self.from.as_slice() && self.to.as_deref().is_none_or(|to| key < to)
    }

    /// Offer a committed transaction's entries to this watcher.
    ///
    /// Returns false when the receiving side is gone and the watcher should
    /// be pruned.
    pub(crate) fn notify(&self, revision: Revision, applied: &[Entry]) -> bool {
        let entries: Vec<Entry> = applied
            .iter()
            .filter(|entry| self.covers(&entry.key))
            .cloned()
            .collect();

        if entries.is_empty() {
            // Nothing in range, nothing to send; a gone receiver is only
            // detected on the next real delivery
            return true;
        }

        self.sender.send(EntryEvent { revision, entries }).is_ok()
    }
}
