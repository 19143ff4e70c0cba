//! Message entity - one entry in a conversation

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::value_objects::Snowflake;

/// Message body: text, an image reference, or both
///
/// A message with neither is invalid and is rejected before it reaches the
/// store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageBody {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

impl MessageBody {
    /// Text-only body
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            image: None,
        }
    }

    /// Image-only body
    pub fn image(image: impl Into<String>) -> Self {
        Self {
            text: None,
            image: Some(image.into()),
        }
    }

    /// True when the body carries neither text nor an image
    pub fn is_empty(&self) -> bool {
        self.text.as_deref().is_none_or(|t| t.trim().is_empty()) && self.image.is_none()
    }
}

/// Message entity
///
/// `seen_by` is derived state: it is recomputed from the participants'
/// last-seen pointers and republished whenever a pointer advances. The
/// store is authoritative; client views hold read-only copies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: Snowflake,
    pub conversation_id: Snowflake,
    pub sender_id: Snowflake,
    pub body: MessageBody,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub seen_by: BTreeSet<Snowflake>,
}

impl Message {
    /// Create a new Message; the sender has trivially seen their own message
    pub fn new(
        id: Snowflake,
        conversation_id: Snowflake,
        sender_id: Snowflake,
        body: MessageBody,
    ) -> Self {
        Self {
            id,
            conversation_id,
            sender_id,
            body,
            created_at: Utc::now(),
            seen_by: BTreeSet::from([sender_id]),
        }
    }

    /// Whether the given user is recorded as having seen this message
    #[inline]
    pub fn seen_by_user(&self, user_id: Snowflake) -> bool {
        self.seen_by.contains(&user_id)
    }

    /// Truncated text preview for notifications; respects char boundaries
    pub fn preview(&self, max_len: usize) -> &str {
        let Some(text) = self.body.text.as_deref() else {
            return "";
        };
        if text.len() <= max_len {
            return text;
        }
        let mut end = max_len;
        while !text.is_char_boundary(end) && end > 0 {
            end -= 1;
        }
        &text[..end]
    }
}
