//! Client facade
//!
//! `SyncClient` wires the client-side components together and is the
//! surface the UI layer talks to: open/close conversations, read the
//! materialized list, check presence, send, delete, and mark seen.

use parley_cache::{ReceivedMessage, SyncChannel};
use parley_core::{
    ConversationStore, DomainError, Message, MessageBody, MessageStore, Snowflake,
    SnowflakeGenerator, SyncEvent,
};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::instrument;

use crate::conversation::{ConversationChannels, ConversationHandle};
use crate::error::SyncResult;
use crate::messages::MessageService;
use crate::presence::PresenceWatch;
use crate::router::EventRouter;
use crate::seen::SeenService;
use crate::transport::{ChannelSubscriptions, EventPublisher};

/// One user's synchronized view of the chat application
pub struct SyncClient {
    user_id: Snowflake,
    channels: Arc<ConversationChannels>,
    presence: Arc<PresenceWatch>,
    messages: Arc<MessageService>,
    seen: Arc<SeenService>,
    conversations: Arc<dyn ConversationStore>,
    subscriptions: Arc<dyn ChannelSubscriptions>,
    router: Arc<EventRouter>,
}

impl SyncClient {
    /// Wire up a client over the store and transport ports
    pub fn new(
        user_id: Snowflake,
        message_store: Arc<dyn MessageStore>,
        conversation_store: Arc<dyn ConversationStore>,
        publisher: Arc<dyn EventPublisher>,
        subscriptions: Arc<dyn ChannelSubscriptions>,
        ids: Arc<SnowflakeGenerator>,
    ) -> Self {
        let channels = Arc::new(ConversationChannels::new(
            message_store.clone(),
            subscriptions.clone(),
        ));
        let presence = Arc::new(PresenceWatch::new());
        let seen = Arc::new(SeenService::new(
            message_store.clone(),
            conversation_store.clone(),
            publisher.clone(),
        ));
        let messages = Arc::new(MessageService::new(
            message_store,
            conversation_store.clone(),
            publisher,
            ids,
        ));
        let router = Arc::new(EventRouter::new(
            user_id,
            channels.clone(),
            presence.clone(),
            seen.clone(),
        ));

        Self {
            user_id,
            channels,
            presence,
            messages,
            seen,
            conversations: conversation_store,
            subscriptions,
            router,
        }
    }

    /// The user this client belongs to
    pub fn user_id(&self) -> Snowflake {
        self.user_id
    }

    /// Subscribe the always-on channels (presence broadcast and this
    /// user's own channel) and start routing the given event stream
    pub async fn connect(
        &self,
        events: broadcast::Receiver<ReceivedMessage>,
    ) -> SyncResult<()> {
        self.subscriptions
            .subscribe(&[SyncChannel::presence(), SyncChannel::user(self.user_id)])
            .await?;
        self.router.clone().start(events);
        Ok(())
    }

    /// Stop routing events
    pub fn shutdown(&self) {
        self.router.stop();
    }

    /// Open a conversation: verify membership, subscribe, seed the view,
    /// bring it to the foreground, and record it as seen
    #[instrument(skip(self))]
    pub async fn open_conversation(
        &self,
        conversation_id: Snowflake,
    ) -> SyncResult<ConversationHandle> {
        // Channel subscription by a non-participant fails fast, before any
        // transport or view state is touched
        let participants = self.conversations.get_participants(conversation_id).await?;
        if !participants.contains(&self.user_id) {
            return Err(DomainError::NotParticipant {
                user_id: self.user_id,
                conversation_id,
            }
            .into());
        }

        let handle = self.channels.open(conversation_id).await?;
        self.channels.set_foreground(Some(conversation_id));

        if let Err(e) = self.seen.mark_seen(self.user_id, conversation_id).await {
            // Surface the failure without leaking the half-opened view
            self.channels.close(handle).await.ok();
            return Err(e);
        }

        Ok(handle)
    }

    /// Close a conversation handle
    pub async fn close_conversation(&self, handle: ConversationHandle) -> SyncResult<()> {
        self.channels.close(handle).await
    }

    /// The materialized message list of an open conversation
    pub fn messages(&self, conversation_id: Snowflake) -> SyncResult<Vec<Message>> {
        self.channels.messages(conversation_id)
    }

    /// Whether a user is in the most recently received presence snapshot
    pub fn is_user_active(&self, user_id: Snowflake) -> bool {
        self.presence.is_active(user_id)
    }

    /// Advance this user's read receipt for a conversation
    pub async fn mark_seen(&self, conversation_id: Snowflake) -> SyncResult<Option<Message>> {
        self.seen.mark_seen(self.user_id, conversation_id).await
    }

    /// Send a message and append it to the local view without waiting for
    /// the event echo (which the idempotent create then deduplicates)
    #[instrument(skip(self, body))]
    pub async fn send_message(
        &self,
        conversation_id: Snowflake,
        body: MessageBody,
    ) -> SyncResult<Message> {
        let message = self
            .messages
            .send_message(conversation_id, self.user_id, body)
            .await?;

        self.channels
            .deliver(conversation_id, &SyncEvent::message_created(message.clone()));

        Ok(message)
    }

    /// Delete one of this user's messages
    ///
    /// The local list is updated optimistically; if the store mutation
    /// fails the entry is restored at its original position and the
    /// retryable error surfaced.
    #[instrument(skip(self))]
    pub async fn delete_message(
        &self,
        conversation_id: Snowflake,
        message_id: Snowflake,
    ) -> SyncResult<Message> {
        let taken = self.channels.take_message(conversation_id, message_id);

        match self.messages.delete_message(message_id, self.user_id).await {
            Ok(deleted) => Ok(deleted),
            Err(e) => {
                if let Some((seq, message)) = taken {
                    self.channels.restore_message(conversation_id, seq, message);
                }
                Err(e)
            }
        }
    }

    /// Change which conversation is actively viewed (None when the user
    /// navigates away)
    pub fn set_foreground(&self, conversation_id: Option<Snowflake>) {
        self.channels.set_foreground(conversation_id);
    }

    /// The channel manager, for components that route events directly
    pub fn channels(&self) -> &Arc<ConversationChannels> {
        &self.channels
    }

    /// The router, for driving events in-process
    pub fn router(&self) -> &Arc<EventRouter> {
        &self.router
    }
}

impl std::fmt::Debug for SyncClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncClient")
            .field("user_id", &self.user_id)
            .field("open_conversations", &self.channels.open_count())
            .finish()
    }
}
