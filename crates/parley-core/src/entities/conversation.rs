//! Conversation entity - a direct or group chat

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::value_objects::Snowflake;

/// A conversation between two or more participants
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conversation {
    pub id: Snowflake,
    /// Display name; `None` for direct conversations, which render the
    /// other participant's name instead
    pub name: Option<String>,
    pub participants: BTreeSet<Snowflake>,
}

impl Conversation {
    /// Create a direct conversation between two users
    pub fn direct(id: Snowflake, a: Snowflake, b: Snowflake) -> Self {
        Self {
            id,
            name: None,
            participants: BTreeSet::from([a, b]),
        }
    }

    /// Create a named group conversation
    pub fn group(
        id: Snowflake,
        name: impl Into<String>,
        participants: impl IntoIterator<Item = Snowflake>,
    ) -> Self {
        Self {
            id,
            name: Some(name.into()),
            participants: participants.into_iter().collect(),
        }
    }

    /// Whether the given user takes part in this conversation
    #[inline]
    pub fn has_participant(&self, user_id: Snowflake) -> bool {
        self.participants.contains(&user_id)
    }

    /// Whether this is a group conversation
    #[inline]
    pub fn is_group(&self) -> bool {
        self.participants.len() > 2 || self.name.is_some()
    }
}
