//! Error types for metakv
//!
//! Provides a unified error type for all operations.
//!
//! A false condition result is *not* an error: `invoke` reports it as a normal
//! boolean outcome and callers decide whether to retry. The variants here cover
//! invalid arguments, lifecycle violations, and internal faults only.

use thiserror::Error;

/// Result type alias using MetaKvError
pub type Result<T> = std::result::Result<T, MetaKvError>;

/// Unified error type for metakv operations
#[derive(Debug, Error)]
pub enum MetaKvError {
    // -------------------------------------------------------------------------
    // Argument Errors
    // -------------------------------------------------------------------------
    #[error("invalid range: upper bound must be greater than lower bound")]
    InvalidRange,

    // -------------------------------------------------------------------------
    // Lifecycle Errors
    // -------------------------------------------------------------------------
    #[error("storage is stopped")]
    Stopped,

    // -------------------------------------------------------------------------
    // Commit Errors
    // -------------------------------------------------------------------------
    #[error("internal fault during commit: {0}")]
    Internal(String),

    // -------------------------------------------------------------------------
    // Serialization Errors
    // -------------------------------------------------------------------------
    #[error("codec error: {0}")]
    Codec(String),

    // -------------------------------------------------------------------------
    // Deployment Errors
    // -------------------------------------------------------------------------
    #[error("unit id must not be empty")]
    MissingUnitId,

    #[error("unit content must not be empty")]
    MissingUnitContent,

    #[error("invalid unit version: {0}")]
    InvalidUnitVersion(String),

    #[error("unit {id}:{version} is already deployed")]
    UnitAlreadyDeployed { id: String, version: String },

    #[error("unit {id}:{version} is not deployed")]
    UnitNotFound { id: String, version: String },
}
