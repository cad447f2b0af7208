//! Entry definitions
//!
//! An [`Entry`] records the latest state of one key: its value (or a tombstone
//! marking deletion) and the revision of the transaction that produced it. The
//! store keeps only latest state per key, not full history; tombstones are kept
//! instead of physically erasing entries so that existence and revision
//! conditions against deleted keys remain well-defined.

use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// Key type: an immutable byte sequence, ordered by unsigned lexicographic
/// byte comparison.
pub type Key = Bytes;

/// Value type: an immutable byte sequence.
pub type Value = Bytes;

/// Store-wide monotonic logical timestamp, assigned at each committed
/// transaction. A key that has never existed has revision 0 for condition
/// purposes.
pub type Revision = u64;

/// The state of one key at its most recent mutation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    /// The key this entry belongs to
    pub key: Key,

    /// The current value; `None` marks a tombstone
    pub value: Option<Value>,

    /// Revision of the transaction that wrote this entry
    pub revision: Revision,
}

impl Entry {
    /// Create an entry holding a value (PUT)
    pub fn put(key: Key, value: Value, revision: Revision) -> Self {
        Self {
            key,
            value: Some(value),
            revision,
        }
    }

    /// Create a tombstone entry (REMOVE)
    pub fn tombstone(key: Key, revision: Revision) -> Self {
        Self {
            key,
            value: None,
            revision,
        }
    }

    /// Returns true if this entry marks a deleted key
    pub fn is_tombstone(&self) -> bool {
        self.value.is_none()
    }
}
