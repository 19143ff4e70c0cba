//! User entity - a participant as the sync core sees it
//!
//! Account management (registration, profiles, credentials) lives outside
//! this system; only the fields needed to render a message author and a
//! presence indicator are carried here.

use serde::{Deserialize, Serialize};

use crate::value_objects::Snowflake;

/// Chat participant
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: Snowflake,
    pub display_name: String,
    /// Avatar image reference, if the user has one
    pub avatar: Option<String>,
}

impl User {
    /// Create a new User
    pub fn new(id: Snowflake, display_name: impl Into<String>) -> Self {
        Self {
            id,
            display_name: display_name.into(),
            avatar: None,
        }
    }

    /// Attach an avatar reference
    #[must_use]
    pub fn with_avatar(mut self, avatar: impl Into<String>) -> Self {
        self.avatar = Some(avatar.into());
        self
    }
}
