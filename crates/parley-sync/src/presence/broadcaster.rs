//! Presence broadcaster
//!
//! Publishes the full active-user set to the presence channel on every
//! online/offline transition. Snapshots are totals, never diffs: each one
//! fully replaces client state, so a dropped or reordered broadcast is
//! corrected by the next.

use parley_core::Snowflake;
use std::sync::Arc;
use tracing::instrument;

use crate::presence::{PresenceChange, PresenceRegistry};
use crate::transport::EventPublisher;

/// Server-side presence fan-out
pub struct PresenceBroadcaster {
    registry: Arc<PresenceRegistry>,
    publisher: Arc<dyn EventPublisher>,
}

impl PresenceBroadcaster {
    /// Create a broadcaster over a registry and a publisher
    pub fn new(registry: Arc<PresenceRegistry>, publisher: Arc<dyn EventPublisher>) -> Self {
        Self {
            registry,
            publisher,
        }
    }

    /// The underlying registry
    pub fn registry(&self) -> &PresenceRegistry {
        &self.registry
    }

    /// Record a connect signal; broadcasts when the user comes online
    #[instrument(skip(self))]
    pub async fn session_connected(
        &self,
        user_id: Snowflake,
        connection_id: &str,
    ) -> PresenceChange {
        let change = self.registry.add_session(user_id, connection_id);
        self.broadcast_on_transition(change).await;
        change
    }

    /// Record a disconnect signal; broadcasts when the user goes offline
    #[instrument(skip(self))]
    pub async fn session_disconnected(
        &self,
        user_id: Snowflake,
        connection_id: &str,
    ) -> PresenceChange {
        let change = self.registry.remove_session(user_id, connection_id);
        self.broadcast_on_transition(change).await;
        change
    }

    async fn broadcast_on_transition(&self, change: PresenceChange) {
        if !change.is_transition() {
            return;
        }

        let users = self.registry.active_users();
        let event = parley_core::SyncEvent::presence_snapshot(users);

        // A lost snapshot is transient: the next transition republishes the
        // whole set. Log and move on rather than failing the session signal.
        if let Err(e) = self
            .publisher
            .publish(&parley_cache::SyncChannel::presence(), &event)
            .await
        {
            tracing::warn!(error = %e, "Failed to broadcast presence snapshot");
        }
    }
}

impl std::fmt::Debug for PresenceBroadcaster {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PresenceBroadcaster")
            .field("online", &self.registry.online_count())
            .finish()
    }
}
