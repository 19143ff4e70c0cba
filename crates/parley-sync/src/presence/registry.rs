//! Presence registry
//!
//! Process-wide map from user id to the set of that user's live connection
//! ids. A user is online iff the set is non-empty, so multiple tabs or
//! devices never cause flapping: the user goes offline only when the last
//! session closes.
//!
//! All updates touch exactly one user's entry; there is no cross-user
//! locking. Disconnect detection is best-effort: a client that crashes
//! without signalling leaves its entry behind until the transport's
//! liveness timeout fires the removal.

use dashmap::DashMap;
use parley_core::Snowflake;
use std::collections::{BTreeSet, HashSet};

/// Outcome of a session add/remove
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresenceChange {
    /// The user's first session appeared; they are newly online
    CameOnline,
    /// The user's last session closed; they are newly offline
    WentOffline,
    /// Session count changed (or didn't) without crossing zero
    Unchanged,
}

impl PresenceChange {
    /// Whether this change moves the user across the online/offline line
    #[inline]
    pub fn is_transition(self) -> bool {
        !matches!(self, Self::Unchanged)
    }
}

/// Process-wide presence registry
///
/// Invariant: an entry exists iff its session set is non-empty, so
/// `active_users` is exactly the key set.
#[derive(Debug, Default)]
pub struct PresenceRegistry {
    sessions: DashMap<Snowflake, HashSet<String>>,
}

impl PresenceRegistry {
    /// Create an empty registry
    #[must_use]
    pub fn new() -> Self {
        Self {
            sessions: DashMap::new(),
        }
    }

    /// Record a new session for a user
    ///
    /// Re-adding a connection id that is already registered is a no-op, so
    /// duplicate connect signals cannot inflate the count.
    pub fn add_session(&self, user_id: Snowflake, connection_id: &str) -> PresenceChange {
        let mut entry = self.sessions.entry(user_id).or_default();
        let was_empty = entry.is_empty();
        let inserted = entry.insert(connection_id.to_string());
        drop(entry);

        if was_empty && inserted {
            tracing::debug!(user_id = %user_id, "User came online");
            PresenceChange::CameOnline
        } else {
            PresenceChange::Unchanged
        }
    }

    /// Remove a session for a user
    ///
    /// Removing an unknown connection or user is a no-op; disconnect
    /// signals may race or repeat.
    pub fn remove_session(&self, user_id: Snowflake, connection_id: &str) -> PresenceChange {
        let went_offline = match self.sessions.get_mut(&user_id) {
            Some(mut entry) => entry.remove(connection_id) && entry.is_empty(),
            None => false,
        };

        if went_offline {
            // Only drop the entry if it is still empty; a concurrent
            // add_session for the same user wins.
            self.sessions.remove_if(&user_id, |_, set| set.is_empty());
            tracing::debug!(user_id = %user_id, "User went offline");
            PresenceChange::WentOffline
        } else {
            PresenceChange::Unchanged
        }
    }

    /// The full set of currently online users
    pub fn active_users(&self) -> BTreeSet<Snowflake> {
        self.sessions.iter().map(|entry| *entry.key()).collect()
    }

    /// Whether the user has at least one live session
    pub fn is_active(&self, user_id: Snowflake) -> bool {
        self.sessions.contains_key(&user_id)
    }

    /// Number of live sessions for a user
    pub fn session_count(&self, user_id: Snowflake) -> usize {
        self.sessions
            .get(&user_id)
            .map_or(0, |entry| entry.len())
    }

    /// Number of online users
    pub fn online_count(&self) -> usize {
        self.sessions.len()
    }
}
