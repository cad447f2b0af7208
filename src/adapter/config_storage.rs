//! Configuration storage adapter
//!
//! Stores named configuration values under a key prefix and funnels every
//! write through one conditional transaction, so concurrent writers race on
//! the store's compare-and-apply instead of on locks here.
//!
//! A reserved master key inside the prefix records the latest applied
//! configuration revision: a writer that knows configuration revision `N`
//! commits only if the master key's revision is still `<= N` (or, for the
//! very first write, if the master key does not exist yet). Losing that race
//! returns `false`, a normal outcome the caller reacts to by re-reading and
//! retrying.

use std::collections::BTreeMap;
use std::sync::Arc;

use bytes::Bytes;

use crate::config::Config;
use crate::error::Result;
use crate::store::{
    Condition, Entry, KeyValueStorage, Operation, Revision, RevisionOp, Transaction, Value,
    WatchHandle,
};

/// Name of the reserved revision-marker key inside the configuration prefix.
/// `$` keeps it out of the way of ordinary configuration names.
const MASTER_KEY_NAME: &str = "$master";

/// Everything `read_all` returns: the current configuration values plus the
/// revision they were written under
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigData {
    /// Configuration name → value, tombstones excluded
    pub values: BTreeMap<String, Value>,

    /// Revision of the latest applied configuration write (0 before the
    /// first write)
    pub revision: Revision,
}

/// Write-intent adapter over a conditional transaction backend
pub struct ConfigurationStorage<B> {
    backend: Arc<B>,
    prefix: Vec<u8>,
    master_key: Bytes,
}

impl<B: KeyValueStorage> ConfigurationStorage<B> {
    /// Create an adapter namespaced under `config.config_key_prefix`
    pub fn new(backend: Arc<B>, config: &Config) -> Self {
        let prefix = config.config_key_prefix.clone();
        let master_key = Bytes::from([prefix.as_slice(), MASTER_KEY_NAME.as_bytes()].concat());
        Self {
            backend,
            prefix,
            master_key,
        }
    }

    /// Build the store key for a configuration name
    fn key_for(&self, name: &str) -> Bytes {
        Bytes::from([self.prefix.as_slice(), name.as_bytes()].concat())
    }

    /// Write a batch of configuration changes, guarded by the revision the
    /// writer last observed.
    ///
    /// A `Some(value)` change writes the value; a `None` change removes the
    /// name. All changes plus the master-key bump commit atomically. Returns
    /// `false` when another writer got in first; nothing is written then.
    pub fn write(
        &self,
        changes: BTreeMap<String, Option<Value>>,
        observed_revision: Revision,
    ) -> Result<bool> {
        let condition = if observed_revision == 0 {
            Condition::NotExists(self.master_key.clone())
        } else {
            Condition::Revision {
                key: self.master_key.clone(),
                op: RevisionOp::LessOrEqual,
                threshold: observed_revision,
            }
        };

        let mut success_ops: Vec<Operation> = changes
            .into_iter()
            .map(|(name, value)| match value {
                Some(value) => Operation::Put {
                    key: self.key_for(&name),
                    value,
                },
                None => Operation::Remove {
                    key: self.key_for(&name),
                },
            })
            .collect();
        success_ops.push(Operation::Put {
            key: self.master_key.clone(),
            value: Bytes::new(),
        });

        let accepted = self
            .backend
            .invoke(&Transaction::on_success(condition, success_ops))?;

        if !accepted {
            tracing::debug!(
                "configuration write at observed revision {} lost the race",
                observed_revision
            );
        }
        Ok(accepted)
    }

    /// Read one configuration value; `None` if unset or removed
    pub fn read(&self, name: &str) -> Result<Option<Value>> {
        let entry = self.backend.get(&self.key_for(name))?;
        Ok(entry.and_then(|e| e.value))
    }

    /// Read every configuration value under the prefix, snapshot-consistent,
    /// together with the revision of the latest applied write
    pub fn read_all(&self) -> Result<ConfigData> {
        let upper = prefix_range_end(&self.prefix);
        let scan = self
            .backend
            .range(&self.prefix, upper.as_deref(), false)?;

        let mut values = BTreeMap::new();
        let mut revision = 0;

        for entry in scan {
            if entry.key == self.master_key {
                revision = entry.revision;
                continue;
            }
            if let Some(name) = self.name_of(&entry) {
                if let Some(value) = entry.value {
                    values.insert(name, value);
                }
            }
        }

        Ok(ConfigData { values, revision })
    }

    /// Register for changes under the configuration prefix
    pub fn watch(&self) -> Result<WatchHandle> {
        let upper = prefix_range_end(&self.prefix);
        self.backend.watch(&self.prefix, upper.as_deref())
    }

    /// Recover the configuration name from a store entry
    fn name_of(&self, entry: &Entry) -> Option<String> {
        let stripped = entry.key.strip_prefix(self.prefix.as_slice())?;
        String::from_utf8(stripped.to_vec()).ok()
    }
}

/// Exclusive upper bound enumerating every key under `prefix`: the prefix
/// with its last non-0xFF byte incremented and the tail truncated. Returns
/// `None` (unbounded) when the prefix is empty or all 0xFF.
pub fn prefix_range_end(prefix: &[u8]) -> Option<Vec<u8>> {
    let last = prefix.iter().rposition(|&b| b != 0xFF)?;
    let mut end = prefix[..=last].to_vec();
    end[last] += 1;
    Some(end)
}
