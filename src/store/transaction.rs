//! Transaction definitions
//!
//! A transaction is a condition plus two ordered operation branches. Exactly
//! one branch is applied, chosen solely by the condition's result, and the
//! chosen branch is applied as a single indivisible step.
//!
//! Operations name their own keys independently of the condition's key, which
//! enables multi-key updates guarded by a single-key condition.

use serde::{Deserialize, Serialize};

use super::condition::Condition;
use super::entry::{Key, Value};

/// An action applied to one key if its branch is selected
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operation {
    /// Write a value for a key
    Put { key: Key, value: Value },

    /// Tombstone a key
    Remove { key: Key },
}

impl Operation {
    /// The key this operation targets
    pub fn key(&self) -> &Key {
        match self {
            Operation::Put { key, .. } => key,
            Operation::Remove { key } => key,
        }
    }
}

/// A compare-and-apply unit of work
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    /// The guard predicate, evaluated just before commit
    pub condition: Condition,

    /// Operations applied in sequence order when the condition holds
    pub success_ops: Vec<Operation>,

    /// Operations applied in sequence order when the condition fails
    pub failure_ops: Vec<Operation>,
}

impl Transaction {
    /// Create a transaction with both branches
    pub fn new(
        condition: Condition,
        success_ops: Vec<Operation>,
        failure_ops: Vec<Operation>,
    ) -> Self {
        Self {
            condition,
            success_ops,
            failure_ops,
        }
    }

    /// Create a transaction with only a success branch; a failed condition
    /// commits an empty branch (and still advances the revision clock)
    pub fn on_success(condition: Condition, success_ops: Vec<Operation>) -> Self {
        Self::new(condition, success_ops, Vec::new())
    }

    /// Select the branch for a condition result
    pub fn branch(&self, condition_held: bool) -> &[Operation] {
        if condition_held {
            &self.success_ops
        } else {
            &self.failure_ops
        }
    }
}
