//! Presence tracking
//!
//! Server side: [`PresenceRegistry`] aggregates raw connect/disconnect
//! signals into a per-user online boolean, and [`PresenceBroadcaster`]
//! publishes the full active set on every transition. Client side:
//! [`PresenceWatch`] caches the most recently received snapshot.

mod broadcaster;
mod registry;
mod watch;

pub use broadcaster::PresenceBroadcaster;
pub use registry::{PresenceChange, PresenceRegistry};
pub use watch::PresenceWatch;

/// Generate a connection identifier for a new session
///
/// The transport layer usually brings its own connection ids; this is for
/// hosts that do not.
#[must_use]
pub fn generate_connection_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
