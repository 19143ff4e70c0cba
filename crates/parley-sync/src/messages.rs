//! Message service
//!
//! The server-side send and delete path. Events go out only after the
//! store mutation commits: the store is authoritative, the channels carry
//! its echoes.

use parley_cache::SyncChannel;
use parley_core::{
    ConversationStore, DomainError, Message, MessageBody, MessageStore, Snowflake,
    SnowflakeGenerator, SyncEvent,
};
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{info, instrument};

use crate::error::SyncResult;
use crate::transport::EventPublisher;

/// Message creation and deletion
pub struct MessageService {
    messages: Arc<dyn MessageStore>,
    conversations: Arc<dyn ConversationStore>,
    publisher: Arc<dyn EventPublisher>,
    ids: Arc<SnowflakeGenerator>,
}

impl MessageService {
    /// Create a service over the store ports, a publisher, and an id
    /// generator
    pub fn new(
        messages: Arc<dyn MessageStore>,
        conversations: Arc<dyn ConversationStore>,
        publisher: Arc<dyn EventPublisher>,
        ids: Arc<SnowflakeGenerator>,
    ) -> Self {
        Self {
            messages,
            conversations,
            publisher,
            ids,
        }
    }

    /// Create a message in a conversation
    ///
    /// The sender must be a participant and the body must carry text or an
    /// image. On success the created event is published to the
    /// conversation channel and each participant's user channel.
    #[instrument(skip(self, body))]
    pub async fn send_message(
        &self,
        conversation_id: Snowflake,
        sender_id: Snowflake,
        body: MessageBody,
    ) -> SyncResult<Message> {
        if body.is_empty() {
            return Err(DomainError::EmptyBody.into());
        }

        let participants = self.conversations.get_participants(conversation_id).await?;
        if !participants.contains(&sender_id) {
            return Err(DomainError::NotParticipant {
                user_id: sender_id,
                conversation_id,
            }
            .into());
        }

        let message = Message::new(self.ids.generate(), conversation_id, sender_id, body);
        self.messages.create_message(&message).await?;

        // The sender has trivially seen their own message; a failure here
        // only delays the pointer, it does not undo the send.
        if let Err(e) = self
            .conversations
            .advance_last_seen(sender_id, conversation_id, message.id)
            .await
        {
            tracing::warn!(error = %e, "Failed to advance sender's last-seen pointer");
        }

        info!(
            message_id = %message.id,
            conversation_id = %conversation_id,
            sender_id = %sender_id,
            "Message created"
        );

        self.fan_out(
            conversation_id,
            &participants,
            SyncEvent::message_created(message.clone()),
            Some(message.id),
        )
        .await;

        Ok(message)
    }

    /// Hard-delete a message
    ///
    /// Only the sender may delete their message. On success the deleted
    /// event is published to the conversation channel and each
    /// participant's user channel.
    #[instrument(skip(self))]
    pub async fn delete_message(
        &self,
        message_id: Snowflake,
        user_id: Snowflake,
    ) -> SyncResult<Message> {
        let existing = self
            .messages
            .find_message(message_id)
            .await?
            .ok_or(DomainError::MessageNotFound(message_id))?;

        if existing.sender_id != user_id {
            return Err(DomainError::NotMessageSender.into());
        }

        // Participants are read before the delete; afterwards the message
        // no longer names its conversation.
        let conversation_id = existing.conversation_id;
        let participants = self.conversations.get_participants(conversation_id).await?;

        let deleted = self.messages.delete_message(message_id).await?;

        info!(
            message_id = %message_id,
            conversation_id = %conversation_id,
            "Message deleted"
        );

        self.fan_out(
            conversation_id,
            &participants,
            SyncEvent::message_deleted(message_id, conversation_id),
            None,
        )
        .await;

        Ok(deleted)
    }

    /// Publish an event to the conversation channel and a list-refresh
    /// notice to every participant's user channel
    ///
    /// Publish failures are logged, not surfaced: the store mutation is
    /// already committed, and viewers reconverge on their next open.
    async fn fan_out(
        &self,
        conversation_id: Snowflake,
        participants: &BTreeSet<Snowflake>,
        event: SyncEvent,
        last_message_id: Option<Snowflake>,
    ) {
        if let Err(e) = self
            .publisher
            .publish(&SyncChannel::conversation(conversation_id), &event)
            .await
        {
            tracing::warn!(error = %e, "Failed to publish conversation event");
        }

        let notice = SyncEvent::conversation_updated(conversation_id, last_message_id);
        let channels: Vec<SyncChannel> = participants
            .iter()
            .map(|&user_id| SyncChannel::user(user_id))
            .collect();
        if let Err(e) = self.publisher.publish_many(&channels, &notice).await {
            tracing::warn!(error = %e, "Failed to publish participant notices");
        }
    }
}

impl std::fmt::Debug for MessageService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MessageService").finish()
    }
}
