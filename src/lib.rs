//! # metakv
//!
//! A revisioned, in-memory key-value core with:
//! - Compare-and-apply transactions (condition + success/failure branches)
//! - A store-wide monotonic revision clock
//! - Consistent ordered range scans over byte-key intervals
//! - Range-scoped watches and snapshot/restore
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌──────────────────────────┐   ┌──────────────────────────┐
//! │  ConfigurationStorage    │   │   DeploymentUnitStore    │
//! │   (write intents)        │   │  ((unitId, version))     │
//! └────────────┬─────────────┘   └────────────┬─────────────┘
//!              │                              │
//! ┌────────────▼──────────────────────────────▼─────────────┐
//! │              KeyValueStorage (backend trait)             │
//! └────────────────────────────┬─────────────────────────────┘
//!                              │
//! ┌────────────────────────────▼─────────────────────────────┐
//! │                MemoryStorage (one mutex)                  │
//! │   ┌────────────┐  ┌───────────────┐  ┌───────────────┐   │
//! │   │ EntryTable │  │ RevisionClock │  │   Watchers    │   │
//! │   │ (BTreeMap) │  │  (monotonic)  │  │  (crossbeam)  │   │
//! │   └────────────┘  └───────────────┘  └───────────────┘   │
//! └───────────────────────────────────────────────────────────┘
//! ```
//!
//! The store is the backing primitive beneath a distributed configuration
//! service: the layers above translate write intents into conditional
//! transactions and rely on `invoke` for compare-and-swap semantics instead
//! of implementing concurrency control themselves. Replication and
//! persistence are external collaborators; a replicated backend applying the
//! same transactions through a consensus log satisfies the same trait.

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod store;
pub mod adapter;
pub mod deployment;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{MetaKvError, Result};
pub use config::Config;
pub use store::{
    Condition, Entry, KeyValueStorage, MemoryStorage, Operation, RangeScan, Revision, RevisionOp,
    StoreSnapshot, Transaction,
};
pub use adapter::ConfigurationStorage;
pub use deployment::{DeploymentUnitStore, UnitVersion};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of metakv
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
