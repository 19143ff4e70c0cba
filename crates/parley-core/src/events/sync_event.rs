//! Synchronization events - the payload kinds carried on the wire
//!
//! Delivery is at-least-once and unordered across publishes, so every
//! payload is designed to be safely re-applied: message events carry full
//! snapshots (last-writer-wins on the receiving view) and presence events
//! carry the complete active set rather than a diff.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::entities::Message;
use crate::value_objects::Snowflake;

/// All event kinds delivered over the pub/sub transport
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SyncEvent {
    /// A message was appended to a conversation
    MessageCreated(MessageCreated),
    /// A message was replaced wholesale (seen-set recomputation republishes
    /// the full message through this kind)
    MessageUpdated(MessageUpdated),
    /// A message was hard-deleted
    MessageDeleted(MessageDeleted),
    /// Full snapshot of the currently online users
    PresenceSnapshot(PresenceSnapshot),
    /// A conversation's list entry changed (delivered on user channels)
    ConversationUpdated(ConversationUpdated),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageCreated {
    pub message: Message,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageUpdated {
    pub message: Message,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageDeleted {
    pub message_id: Snowflake,
    pub conversation_id: Snowflake,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresenceSnapshot {
    pub users: BTreeSet<Snowflake>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationUpdated {
    pub conversation_id: Snowflake,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_message_id: Option<Snowflake>,
}

impl SyncEvent {
    /// Wrap a created message
    pub fn message_created(message: Message) -> Self {
        Self::MessageCreated(MessageCreated { message })
    }

    /// Wrap an updated message
    pub fn message_updated(message: Message) -> Self {
        Self::MessageUpdated(MessageUpdated { message })
    }

    /// Record a deletion
    pub fn message_deleted(message_id: Snowflake, conversation_id: Snowflake) -> Self {
        Self::MessageDeleted(MessageDeleted {
            message_id,
            conversation_id,
        })
    }

    /// Snapshot the full active-user set
    pub fn presence_snapshot(users: BTreeSet<Snowflake>) -> Self {
        Self::PresenceSnapshot(PresenceSnapshot { users })
    }

    /// Notify a participant that a conversation's list entry changed
    pub fn conversation_updated(
        conversation_id: Snowflake,
        last_message_id: Option<Snowflake>,
    ) -> Self {
        Self::ConversationUpdated(ConversationUpdated {
            conversation_id,
            last_message_id,
        })
    }

    /// Event type name as it appears in the serialized `type` field
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::MessageCreated(_) => "MESSAGE_CREATED",
            Self::MessageUpdated(_) => "MESSAGE_UPDATED",
            Self::MessageDeleted(_) => "MESSAGE_DELETED",
            Self::PresenceSnapshot(_) => "PRESENCE_SNAPSHOT",
            Self::ConversationUpdated(_) => "CONVERSATION_UPDATED",
        }
    }
}
