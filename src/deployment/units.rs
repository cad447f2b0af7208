//! Deployment unit bookkeeping
//!
//! Records which `(unit id, version)` pairs are deployed, keyed under the
//! deployment prefix. Conflict and not-found outcomes are decided by store
//! conditions, never by read-then-write: two concurrent deploys of the same
//! pair race on a `NotExists` condition and exactly one wins.
//!
//! Key layout: `prefix ++ unit_id ++ 0x00 ++ version`. The NUL separator keeps
//! one unit's versions in a contiguous key range that no other unit id can
//! reach into.

use std::collections::BTreeMap;
use std::sync::Arc;

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::adapter::prefix_range_end;
use crate::config::Config;
use crate::error::{MetaKvError, Result};
use crate::store::{Condition, KeyValueStorage, Operation, Transaction};

use super::version::UnitVersion;

/// Lifecycle status of a deployed unit version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeploymentStatus {
    /// Unit content is available on this node
    Deployed,
    /// Unit is superseded and awaiting cleanup
    Obsolete,
}

/// Stored record for one `(unit id, version)` pair
#[derive(Debug, Clone, Serialize, Deserialize)]
struct UnitRecord {
    status: DeploymentStatus,
    content: Vec<u8>,
}

/// Status summary for one unit id
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitStatus {
    /// The unit id
    pub id: String,

    /// Deployed versions and their statuses, in version order
    pub versions: BTreeMap<UnitVersion, DeploymentStatus>,
}

/// Deployment bookkeeping over a conditional transaction backend
pub struct DeploymentUnitStore<B> {
    backend: Arc<B>,
    prefix: Vec<u8>,
}

impl<B: KeyValueStorage> DeploymentUnitStore<B> {
    /// Create a store namespaced under `config.deploy_key_prefix`
    pub fn new(backend: Arc<B>, config: &Config) -> Self {
        Self {
            backend,
            prefix: config.deploy_key_prefix.clone(),
        }
    }

    /// Record a unit version as deployed.
    ///
    /// Fails with `MissingUnitId`/`MissingUnitContent` on empty inputs,
    /// `InvalidUnitVersion` on a malformed version, and `UnitAlreadyDeployed`
    /// when the pair already exists.
    pub fn deploy(&self, unit_id: &str, version: &str, content: &[u8]) -> Result<()> {
        if unit_id.is_empty() {
            return Err(MetaKvError::MissingUnitId);
        }
        if content.is_empty() {
            return Err(MetaKvError::MissingUnitContent);
        }
        let version: UnitVersion = version.parse()?;

        let key = self.unit_key(unit_id, version);
        let record = UnitRecord {
            status: DeploymentStatus::Deployed,
            content: content.to_vec(),
        };
        let value = bincode::serialize(&record).map_err(|e| MetaKvError::Codec(e.to_string()))?;

        let deployed = self.backend.invoke(&Transaction::on_success(
            Condition::NotExists(key.clone()),
            vec![Operation::Put {
                key,
                value: Bytes::from(value),
            }],
        ))?;

        if !deployed {
            return Err(MetaKvError::UnitAlreadyDeployed {
                id: unit_id.to_string(),
                version: version.to_string(),
            });
        }

        tracing::info!("deployed unit {}:{}", unit_id, version);
        Ok(())
    }

    /// Remove a deployed unit version; `UnitNotFound` when the pair does not
    /// exist
    pub fn undeploy(&self, unit_id: &str, version: &str) -> Result<()> {
        if unit_id.is_empty() {
            return Err(MetaKvError::MissingUnitId);
        }
        let version: UnitVersion = version.parse()?;

        let key = self.unit_key(unit_id, version);
        let removed = self.backend.invoke(&Transaction::on_success(
            Condition::Exists(key.clone()),
            vec![Operation::Remove { key }],
        ))?;

        if !removed {
            return Err(MetaKvError::UnitNotFound {
                id: unit_id.to_string(),
                version: version.to_string(),
            });
        }

        tracing::info!("undeployed unit {}:{}", unit_id, version);
        Ok(())
    }

    /// Deployed versions of a unit in semantic-version order; empty for an
    /// unknown unit id
    pub fn versions(&self, unit_id: &str) -> Result<Vec<UnitVersion>> {
        let mut versions: Vec<UnitVersion> = self
            .unit_entries(unit_id)?
            .keys()
            .copied()
            .collect();
        versions.sort();
        Ok(versions)
    }

    /// Status summary for one unit id
    pub fn status(&self, unit_id: &str) -> Result<UnitStatus> {
        let versions = self
            .unit_entries(unit_id)?
            .into_iter()
            .map(|(version, record)| (version, record.status))
            .collect();

        Ok(UnitStatus {
            id: unit_id.to_string(),
            versions,
        })
    }

    /// Content of one deployed unit version, if present
    pub fn content(&self, unit_id: &str, version: &str) -> Result<Option<Bytes>> {
        let version: UnitVersion = version.parse()?;
        let entry = self.backend.get(&self.unit_key(unit_id, version))?;

        match entry.and_then(|e| e.value) {
            Some(value) => {
                let record: UnitRecord = bincode::deserialize(&value)
                    .map_err(|e| MetaKvError::Codec(e.to_string()))?;
                Ok(Some(Bytes::from(record.content)))
            }
            None => Ok(None),
        }
    }

    /// Store key for one `(unit id, version)` pair
    fn unit_key(&self, unit_id: &str, version: UnitVersion) -> Bytes {
        let mut key = self.unit_prefix(unit_id);
        key.extend_from_slice(version.to_string().as_bytes());
        Bytes::from(key)
    }

    /// Key prefix covering every version of one unit id
    fn unit_prefix(&self, unit_id: &str) -> Vec<u8> {
        let mut prefix = self.prefix.clone();
        prefix.extend_from_slice(unit_id.as_bytes());
        prefix.push(0x00);
        prefix
    }

    /// Scan and decode every record for one unit id
    fn unit_entries(&self, unit_id: &str) -> Result<BTreeMap<UnitVersion, UnitRecord>> {
        let from = self.unit_prefix(unit_id);
        let to = prefix_range_end(&from);
        let scan = self.backend.range(&from, to.as_deref(), false)?;

        let mut entries = BTreeMap::new();
        for entry in scan {
            let Some(suffix) = entry.key.strip_prefix(from.as_slice()) else {
                continue;
            };
            let Ok(version) = std::str::from_utf8(suffix)
                .map_err(|_| ())
                .and_then(|s| s.parse::<UnitVersion>().map_err(|_| ()))
            else {
                continue;
            };
            if let Some(value) = entry.value {
                let record: UnitRecord = bincode::deserialize(&value)
                    .map_err(|e| MetaKvError::Codec(e.to_string()))?;
                entries.insert(version, record);
            }
        }
        Ok(entries)
    }
}
