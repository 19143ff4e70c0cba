//! Domain errors - error types for the domain layer

use thiserror::Error;

use crate::value_objects::Snowflake;

/// Domain layer errors
#[derive(Debug, Error)]
pub enum DomainError {
    // =========================================================================
    // Not Found
    // =========================================================================
    #[error("User not found: {0}")]
    UserNotFound(Snowflake),

    #[error("Conversation not found: {0}")]
    ConversationNotFound(Snowflake),

    #[error("Message not found: {0}")]
    MessageNotFound(Snowflake),

    // =========================================================================
    // Authorization
    // =========================================================================
    #[error("User {user_id} is not a participant of conversation {conversation_id}")]
    NotParticipant {
        user_id: Snowflake,
        conversation_id: Snowflake,
    },

    #[error("Only the sender may delete a message")]
    NotMessageSender,

    // =========================================================================
    // Validation
    // =========================================================================
    #[error("Message body must contain text or an image")]
    EmptyBody,

    #[error("Validation error: {0}")]
    ValidationError(String),

    // =========================================================================
    // Infrastructure (wrapped)
    // =========================================================================
    #[error("Storage error: {0}")]
    Storage(String),
}

impl DomainError {
    /// Whether this is a missing-resource error
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::UserNotFound(_) | Self::ConversationNotFound(_) | Self::MessageNotFound(_)
        )
    }

    /// Whether this is a permission failure
    pub fn is_permission(&self) -> bool {
        matches!(self, Self::NotParticipant { .. } | Self::NotMessageSender)
    }

    /// Whether retrying the operation can succeed; true only for storage
    /// faults, which are transient by contract
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Storage(_))
    }

    /// Stable machine-readable code for logs and API payloads
    pub fn code(&self) -> &'static str {
        match self {
            Self::UserNotFound(_) => "USER_NOT_FOUND",
            Self::ConversationNotFound(_) => "CONVERSATION_NOT_FOUND",
            Self::MessageNotFound(_) => "MESSAGE_NOT_FOUND",
            Self::NotParticipant { .. } => "NOT_PARTICIPANT",
            Self::NotMessageSender => "NOT_MESSAGE_SENDER",
            Self::EmptyBody => "EMPTY_BODY",
            Self::ValidationError(_) => "VALIDATION_ERROR",
            Self::Storage(_) => "STORAGE_ERROR",
        }
    }
}
