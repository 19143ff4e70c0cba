//! Store ports - the interfaces through which the sync core reads and
//! mutates persistent state
//!
//! The relational store itself is an external collaborator; the domain
//! layer defines what it needs and the hosting application provides the
//! implementation. Every method may suspend; all failures map into
//! `DomainError` (storage faults as the retryable `Storage` variant).

use async_trait::async_trait;
use std::collections::BTreeSet;

use crate::entities::{Conversation, Message};
use crate::error::DomainError;
use crate::value_objects::Snowflake;

/// Result type for store operations
pub type StoreResult<T> = Result<T, DomainError>;

/// Port for reading and mutating persisted messages
#[async_trait]
pub trait MessageStore: Send + Sync {
    /// All messages of a conversation in creation order; used to seed a
    /// freshly opened view
    async fn fetch_messages(&self, conversation_id: Snowflake) -> StoreResult<Vec<Message>>;

    /// The most recent message of a conversation, if any
    async fn latest_message(&self, conversation_id: Snowflake) -> StoreResult<Option<Message>>;

    /// Look up a single message
    async fn find_message(&self, message_id: Snowflake) -> StoreResult<Option<Message>>;

    /// Persist a new message
    async fn create_message(&self, message: &Message) -> StoreResult<()>;

    /// Hard-delete a message, returning the removed record
    ///
    /// Fails with `DomainError::MessageNotFound` if no such message exists.
    async fn delete_message(&self, message_id: Snowflake) -> StoreResult<Message>;
}

/// Port for conversation membership and per-user read pointers
#[async_trait]
pub trait ConversationStore: Send + Sync {
    /// Look up a conversation
    async fn find_conversation(
        &self,
        conversation_id: Snowflake,
    ) -> StoreResult<Option<Conversation>>;

    /// Participant set of a conversation
    ///
    /// Fails with `DomainError::ConversationNotFound` for unknown ids.
    async fn get_participants(
        &self,
        conversation_id: Snowflake,
    ) -> StoreResult<BTreeSet<Snowflake>>;

    /// Monotonically advance a user's last-seen pointer
    ///
    /// Returns `true` iff the pointer actually moved forward. A call with a
    /// message id at or behind the stored pointer is a no-op returning
    /// `false`; message ids are time-ordered, so "behind" is plain ordering
    /// on the id. The write must be atomic per (user, conversation) key but
    /// requires no cross-key coordination.
    async fn advance_last_seen(
        &self,
        user_id: Snowflake,
        conversation_id: Snowflake,
        message_id: Snowflake,
    ) -> StoreResult<bool>;

    /// The user's current last-seen pointer for a conversation
    async fn last_seen(
        &self,
        user_id: Snowflake,
        conversation_id: Snowflake,
    ) -> StoreResult<Option<Snowflake>>;
}
