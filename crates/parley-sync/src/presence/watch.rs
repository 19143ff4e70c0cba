//! Client-side presence cache
//!
//! Holds whichever presence snapshot arrived most recently. Replacement is
//! wholesale, which makes duplicate and out-of-order delivery harmless;
//! transient disagreement between clients during propagation is accepted.

use parking_lot::RwLock;
use parley_core::Snowflake;
use std::collections::BTreeSet;

/// Most-recently-received active-user set
#[derive(Debug, Default)]
pub struct PresenceWatch {
    active: RwLock<BTreeSet<Snowflake>>,
}

impl PresenceWatch {
    /// Create an empty watch (nobody online until the first snapshot)
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the cached set with a freshly received snapshot
    pub fn apply_snapshot(&self, users: BTreeSet<Snowflake>) {
        *self.active.write() = users;
    }

    /// Whether the user is in the last received snapshot
    pub fn is_active(&self, user_id: Snowflake) -> bool {
        self.active.read().contains(&user_id)
    }

    /// Copy of the cached active set
    pub fn snapshot(&self) -> BTreeSet<Snowflake> {
        self.active.read().clone()
    }
}
