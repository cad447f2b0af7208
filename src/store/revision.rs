//! Revision clock
//!
//! The store-wide logical clock. Advanced exactly once per committed
//! transaction, including transactions whose chosen branch is empty: a branch
//! was still selected and applied, so the commit counts.
//!
//! Owned by the storage and advanced only inside the transaction engine's
//! exclusive section; never a free-floating static.

use super::entry::Revision;

/// Monotonically increasing revision counter
#[derive(Debug, Default)]
pub struct RevisionClock {
    current: Revision,
}

impl RevisionClock {
    /// Create a clock starting at revision 0 (no transaction committed yet)
    pub fn new() -> Self {
        Self { current: 0 }
    }

    /// Create a clock resuming from a known revision (snapshot restore)
    pub fn starting_at(revision: Revision) -> Self {
        Self { current: revision }
    }

    /// The revision assigned to the most recent committed transaction
    pub fn current(&self) -> Revision {
        self.current
    }

    /// Advance the clock and return the new revision, strictly greater than
    /// any previously returned value
    pub fn advance(&mut self) -> Revision {
        self.current += 1;
        self.current
    }
}
