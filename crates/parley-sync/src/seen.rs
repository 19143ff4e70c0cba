//! Seen-status resolver
//!
//! Advances a user's last-seen pointer when they open or are actively
//! viewing a conversation, recomputes the seen-by set of the latest
//! message from every participant's pointer, and republishes the message
//! so peers refresh their read receipts.

use parley_cache::SyncChannel;
use parley_core::{ConversationStore, DomainError, Message, MessageStore, Snowflake, SyncEvent};
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::instrument;

use crate::error::SyncResult;
use crate::transport::EventPublisher;

/// Server-side read-receipt resolution
pub struct SeenService {
    messages: Arc<dyn MessageStore>,
    conversations: Arc<dyn ConversationStore>,
    publisher: Arc<dyn EventPublisher>,
}

impl SeenService {
    /// Create a resolver over the store ports and a publisher
    pub fn new(
        messages: Arc<dyn MessageStore>,
        conversations: Arc<dyn ConversationStore>,
        publisher: Arc<dyn EventPublisher>,
    ) -> Self {
        Self {
            messages,
            conversations,
            publisher,
        }
    }

    /// Record that `user_id` has seen the conversation up to its latest
    /// message
    ///
    /// Monotonic and idempotent: a call racing a newer one, or repeated
    /// with no new messages in between, advances nothing and publishes
    /// nothing. Returns the republished message when the pointer moved,
    /// `None` otherwise.
    #[instrument(skip(self))]
    pub async fn mark_seen(
        &self,
        user_id: Snowflake,
        conversation_id: Snowflake,
    ) -> SyncResult<Option<Message>> {
        let participants = self.conversations.get_participants(conversation_id).await?;
        if !participants.contains(&user_id) {
            tracing::warn!(
                user_id = %user_id,
                conversation_id = %conversation_id,
                "Rejected mark_seen from non-participant"
            );
            return Err(DomainError::NotParticipant {
                user_id,
                conversation_id,
            }
            .into());
        }

        // Nothing to see in an empty conversation
        let Some(latest) = self.messages.latest_message(conversation_id).await? else {
            return Ok(None);
        };

        let advanced = self
            .conversations
            .advance_last_seen(user_id, conversation_id, latest.id)
            .await?;
        if !advanced {
            tracing::debug!(
                user_id = %user_id,
                conversation_id = %conversation_id,
                "Last-seen pointer already current"
            );
            return Ok(None);
        }

        let seen_by = self
            .recompute_seen_by(&latest, &participants, conversation_id)
            .await?;

        let mut updated = latest;
        updated.seen_by = seen_by;

        tracing::info!(
            user_id = %user_id,
            conversation_id = %conversation_id,
            message_id = %updated.id,
            seen_count = updated.seen_by.len(),
            "Read receipt advanced"
        );

        // Peers with the conversation open refresh through the message
        // update; the caller's other sessions refresh their list entry.
        let event = SyncEvent::message_updated(updated.clone());
        if let Err(e) = self
            .publisher
            .publish(&SyncChannel::conversation(conversation_id), &event)
            .await
        {
            tracing::warn!(error = %e, "Failed to publish seen update");
        }

        let notice = SyncEvent::conversation_updated(conversation_id, Some(updated.id));
        if let Err(e) = self
            .publisher
            .publish(&SyncChannel::user(user_id), &notice)
            .await
        {
            tracing::warn!(error = %e, "Failed to publish conversation notice");
        }

        Ok(Some(updated))
    }

    /// Seen-by set of the latest message: the sender plus every participant
    /// whose pointer has reached it
    async fn recompute_seen_by(
        &self,
        latest: &Message,
        participants: &BTreeSet<Snowflake>,
        conversation_id: Snowflake,
    ) -> SyncResult<BTreeSet<Snowflake>> {
        let mut seen_by = BTreeSet::from([latest.sender_id]);

        for &participant in participants {
            if participant == latest.sender_id {
                continue;
            }
            if let Some(pointer) = self
                .conversations
                .last_seen(participant, conversation_id)
                .await?
            {
                if pointer >= latest.id {
                    seen_by.insert(participant);
                }
            }
        }

        Ok(seen_by)
    }
}

impl std::fmt::Debug for SeenService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SeenService").finish()
    }
}
