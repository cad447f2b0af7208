//! Store Module
//!
//! The revisioned, conditionally-transactional key-value core.
//!
//! ## Components
//! - [`EntryTable`]: ordered table of the latest entry per key
//! - [`RevisionClock`]: store-wide monotonic logical clock
//! - [`Condition`]: single-key predicates (existence, revision comparison)
//! - [`Transaction`]: condition + success/failure operation branches
//! - [`MemoryStorage`]: single-node in-memory backend
//!
//! The [`KeyValueStorage`] trait is the seam between the configuration layer
//! and the backend: [`MemoryStorage`] implements it in-process, and a
//! replicated implementation applying the same transactions through a
//! consensus log would satisfy it identically.

pub mod condition;
pub mod entry;
pub mod memory;
pub mod revision;
pub mod snapshot;
pub mod table;
pub mod transaction;
pub mod watch;

pub use condition::{Condition, RevisionOp};
pub use entry::{Entry, Key, Revision, Value};
pub use memory::{MemoryStorage, RangeScan};
pub use revision::RevisionClock;
pub use snapshot::StoreSnapshot;
pub use table::EntryTable;
pub use transaction::{Operation, Transaction};
pub use watch::{EntryEvent, WatchHandle};

use crate::error::Result;

/// Conditional transaction backend capability
///
/// Everything the layers above need from a store: lifecycle, conditional
/// multi-key transactions, point reads, consistent range scans, and watches.
/// Condition evaluation reporting `false` is a normal outcome, not an error;
/// retry-on-conflict is the caller's responsibility.
pub trait KeyValueStorage {
    /// Start serving operations
    fn start(&self) -> Result<()>;

    /// Stop for good; subsequent operations fail fast with a lifecycle error
    fn stop(&self) -> Result<()>;

    /// Revision assigned to the most recent committed transaction
    fn revision(&self) -> Result<Revision>;

    /// Latest entry for a key, tombstones included; `None` for keys that have
    /// never been written
    fn get(&self, key: &[u8]) -> Result<Option<Entry>>;

    /// Atomically evaluate the transaction's condition, apply the selected
    /// branch, and advance the revision clock. Returns the condition's result
    /// so the caller knows which branch ran.
    fn invoke(&self, txn: &Transaction) -> Result<bool>;

    /// Consistent ordered scan of entries with keys in `[from, to)`
    /// (`to = None` for unbounded). Tombstones are excluded unless requested.
    fn range(&self, from: &[u8], to: Option<&[u8]>, include_tombstones: bool)
        -> Result<RangeScan>;

    /// Register for event batches from transactions touching `[from, to)`
    fn watch(&self, from: &[u8], to: Option<&[u8]>) -> Result<WatchHandle>;
}
