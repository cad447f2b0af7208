//! Store snapshots
//!
//! A snapshot captures the full entry table (tombstones included) plus the
//! revision clock, and round-trips through bincode. This is the hook a
//! replicated backend uses to transfer state between nodes; no file I/O
//! happens here.

use serde::{Deserialize, Serialize};

use crate::error::{MetaKvError, Result};

use super::entry::{Entry, Revision};

/// Point-in-time copy of the whole store
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreSnapshot {
    /// Revision clock value at snapshot time
    pub revision: Revision,

    /// Every entry, tombstones included, in ascending key order
    pub entries: Vec<Entry>,
}

impl StoreSnapshot {
    /// Number of entries captured, tombstones included
    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }

    /// Serialize to a compact binary blob
    pub fn encode(&self) -> Result<Vec<u8>> {
        bincode::serialize(self).map_err(|e| MetaKvError::Codec(e.to_string()))
    }

    /// Deserialize from a blob produced by [`encode`](Self::encode)
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        bincode::deserialize(bytes).map_err(|e| MetaKvError::Codec(e.to_string()))
    }
}
