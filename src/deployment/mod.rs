//! Deployment Module
//!
//! In-process contract of the unit-management service: deployment-status
//! bookkeeping keyed by `(unit id, version)` on top of the configuration
//! store's conditional transactions. The REST/upload surface that would sit
//! in front of this is an external collaborator; its client-error, conflict,
//! and not-found responses map 1:1 onto this module's error variants.

pub mod units;
pub mod version;

pub use units::{DeploymentStatus, DeploymentUnitStore, UnitStatus};
pub use version::UnitVersion;
