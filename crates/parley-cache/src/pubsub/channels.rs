//! Pub/Sub channel definitions
//!
//! Channel names partition event delivery: one channel per conversation,
//! one per user (for conversation-list refreshes), and a single broadcast
//! channel for presence snapshots.

use parley_core::Snowflake;

/// Channel prefix for conversation-scoped events
pub const CONVERSATION_CHANNEL_PREFIX: &str = "conversation:";
/// Channel prefix for user-scoped events
pub const USER_CHANNEL_PREFIX: &str = "user:";
/// Broadcast channel carrying presence snapshots to every client
pub const PRESENCE_CHANNEL: &str = "presence";

/// Pub/Sub channel types
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SyncChannel {
    /// Events for one conversation (all open viewers)
    Conversation(Snowflake),
    /// Events for one user (all their sessions)
    User(Snowflake),
    /// Presence snapshots, delivered to every connected client
    Presence,
    /// Escape hatch for non-standard channel names
    Custom(String),
}

impl SyncChannel {
    /// Channel for a conversation's events
    #[must_use]
    pub fn conversation(conversation_id: Snowflake) -> Self {
        Self::Conversation(conversation_id)
    }

    /// Channel for a user's events
    #[must_use]
    pub fn user(user_id: Snowflake) -> Self {
        Self::User(user_id)
    }

    /// The presence broadcast channel
    #[must_use]
    pub fn presence() -> Self {
        Self::Presence
    }

    /// A custom channel
    #[must_use]
    pub fn custom(name: impl Into<String>) -> Self {
        Self::Custom(name.into())
    }

    /// The Redis channel name
    #[must_use]
    pub fn name(&self) -> String {
        match self {
            Self::Conversation(id) => format!("{CONVERSATION_CHANNEL_PREFIX}{id}"),
            Self::User(id) => format!("{USER_CHANNEL_PREFIX}{id}"),
            Self::Presence => PRESENCE_CHANNEL.to_string(),
            Self::Custom(name) => name.clone(),
        }
    }

    /// Parse a channel name back to a `SyncChannel`
    #[must_use]
    pub fn parse(name: &str) -> Self {
        if name == PRESENCE_CHANNEL {
            return Self::Presence;
        }

        if let Some(id_str) = name.strip_prefix(CONVERSATION_CHANNEL_PREFIX) {
            if let Ok(id) = id_str.parse::<i64>() {
                return Self::Conversation(Snowflake::from(id));
            }
        }

        if let Some(id_str) = name.strip_prefix(USER_CHANNEL_PREFIX) {
            if let Ok(id) = id_str.parse::<i64>() {
                return Self::User(Snowflake::from(id));
            }
        }

        Self::Custom(name.to_string())
    }
}

impl std::fmt::Display for SyncChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}
