//! Deployment unit versions
//!
//! Versions are `major.minor.patch` with numeric per-component comparison,
//! never lexicographic string comparison. Missing components default to 0, so
//! `"2.0"` parses as `2.0.0` and renders that way too.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::MetaKvError;

/// A deployment unit version
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct UnitVersion {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

impl UnitVersion {
    /// Create a version from its components
    pub const fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }
}

impl FromStr for UnitVersion {
    type Err = MetaKvError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || MetaKvError::InvalidUnitVersion(s.to_string());

        let mut parts = s.split('.');
        let mut component = |required: bool| -> Result<u32, Self::Err> {
            match parts.next() {
                Some(part) => part.parse().map_err(|_| invalid()),
                None if required => Err(invalid()),
                None => Ok(0),
            }
        };

        let major = component(true)?;
        let minor = component(false)?;
        let patch = component(false)?;

        if parts.next().is_some() {
            return Err(invalid());
        }

        Ok(Self {
            major,
            minor,
            patch,
        })
    }
}

impl fmt::Display for UnitVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}
