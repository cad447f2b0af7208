//! Condition definitions and evaluation
//!
//! A condition is a predicate over the *current* entry of exactly one key,
//! evaluated just before a transaction commits. Conditions are a closed enum
//! with exhaustive matching: adding a condition kind is a compile-time-checked
//! exercise, and an unsupported kind is unrepresentable.

use serde::{Deserialize, Serialize};

use super::entry::{Key, Revision};
use super::table::EntryTable;

/// Comparison operator for revision conditions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RevisionOp {
    Less,
    LessOrEqual,
    Greater,
    GreaterOrEqual,
    Equal,
}

/// Single-key predicate gating which operation branch a transaction applies
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Condition {
    /// True iff the key holds a live (non-tombstoned) entry
    Exists(Key),

    /// True iff the key has never been written or is tombstoned
    NotExists(Key),

    /// Compares the key's current assigned revision (0 if the key has never
    /// existed) against a caller-supplied threshold
    Revision {
        key: Key,
        op: RevisionOp,
        threshold: Revision,
    },
}

impl Condition {
    /// The key this condition guards
    pub fn key(&self) -> &Key {
        match self {
            Condition::Exists(key) => key,
            Condition::NotExists(key) => key,
            Condition::Revision { key, .. } => key,
        }
    }

    /// Evaluate against the current table state. Side-effect free; safe to
    /// call repeatedly.
    pub fn evaluate(&self, table: &EntryTable) -> bool {
        match self {
            Condition::Exists(key) => table.exists(key),
            Condition::NotExists(key) => !table.exists(key),
            Condition::Revision { key, op, threshold } => {
                let revision = table.revision_of(key);
                match op {
                    RevisionOp::Less => revision < *threshold,
                    RevisionOp::LessOrEqual => revision <= *threshold,
                    RevisionOp::Greater => revision > *threshold,
                    RevisionOp::GreaterOrEqual => revision >= *threshold,
                    RevisionOp::Equal => revision == *threshold,
                }
            }
        }
    }
}
