//! In-memory store and transport fakes

use async_trait::async_trait;
use dashmap::DashMap;
use parking_lot::Mutex;
use parley_cache::{ReceivedMessage, SyncChannel};
use parley_core::{
    Conversation, ConversationStore, DomainError, Message, MessageStore, Snowflake, StoreResult,
    SyncEvent,
};
use parley_sync::{ChannelSubscriptions, EventPublisher, SyncResult};
use std::collections::{BTreeSet, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::broadcast;

/// In-memory relational store fake
///
/// Implements both store ports over concurrent maps. Writes can be made to
/// fail on demand to exercise the retryable-fault paths.
#[derive(Debug, Default)]
pub struct MemoryStore {
    conversations: DashMap<Snowflake, Conversation>,
    /// Per-conversation message list in creation order
    messages: DashMap<Snowflake, Vec<Message>>,
    /// (user, conversation) -> last seen message id
    last_seen: DashMap<(Snowflake, Snowflake), Snowflake>,
    /// When set, every write fails with a storage error
    fail_writes: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a conversation
    pub fn insert_conversation(&self, conversation: Conversation) {
        self.conversations.insert(conversation.id, conversation);
    }

    /// Make subsequent writes fail (or succeed again)
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    fn check_writable(&self) -> StoreResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            Err(DomainError::Storage("store unavailable".into()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl MessageStore for MemoryStore {
    async fn fetch_messages(&self, conversation_id: Snowflake) -> StoreResult<Vec<Message>> {
        Ok(self
            .messages
            .get(&conversation_id)
            .map(|list| list.value().clone())
            .unwrap_or_default())
    }

    async fn latest_message(&self, conversation_id: Snowflake) -> StoreResult<Option<Message>> {
        Ok(self
            .messages
            .get(&conversation_id)
            .and_then(|list| list.last().cloned()))
    }

    async fn find_message(&self, message_id: Snowflake) -> StoreResult<Option<Message>> {
        for entry in self.messages.iter() {
            if let Some(message) = entry.value().iter().find(|m| m.id == message_id) {
                return Ok(Some(message.clone()));
            }
        }
        Ok(None)
    }

    async fn create_message(&self, message: &Message) -> StoreResult<()> {
        self.check_writable()?;
        self.messages
            .entry(message.conversation_id)
            .or_default()
            .push(message.clone());
        Ok(())
    }

    async fn delete_message(&self, message_id: Snowflake) -> StoreResult<Message> {
        self.check_writable()?;
        for mut entry in self.messages.iter_mut() {
            if let Some(pos) = entry.value().iter().position(|m| m.id == message_id) {
                return Ok(entry.value_mut().remove(pos));
            }
        }
        Err(DomainError::MessageNotFound(message_id))
    }
}

#[async_trait]
impl ConversationStore for MemoryStore {
    async fn find_conversation(
        &self,
        conversation_id: Snowflake,
    ) -> StoreResult<Option<Conversation>> {
        Ok(self
            .conversations
            .get(&conversation_id)
            .map(|c| c.value().clone()))
    }

    async fn get_participants(
        &self,
        conversation_id: Snowflake,
    ) -> StoreResult<BTreeSet<Snowflake>> {
        self.conversations
            .get(&conversation_id)
            .map(|c| c.participants.clone())
            .ok_or(DomainError::ConversationNotFound(conversation_id))
    }

    async fn advance_last_seen(
        &self,
        user_id: Snowflake,
        conversation_id: Snowflake,
        message_id: Snowflake,
    ) -> StoreResult<bool> {
        self.check_writable()?;

        // Monotonic max-write on a single key
        use dashmap::mapref::entry::Entry;
        let advanced = match self.last_seen.entry((user_id, conversation_id)) {
            Entry::Occupied(mut occupied) => {
                if message_id > *occupied.get() {
                    occupied.insert(message_id);
                    true
                } else {
                    false
                }
            }
            Entry::Vacant(vacant) => {
                vacant.insert(message_id);
                true
            }
        };
        Ok(advanced)
    }

    async fn last_seen(
        &self,
        user_id: Snowflake,
        conversation_id: Snowflake,
    ) -> StoreResult<Option<Snowflake>> {
        Ok(self
            .last_seen
            .get(&(user_id, conversation_id))
            .map(|entry| *entry))
    }
}

/// In-process transport fake
///
/// Publishes straight onto a broadcast channel that the routers under test
/// drain. Every client sees every publish - at-least-once with over-
/// delivery, which the routing and application rules must (and do)
/// tolerate. Published events and subscription changes are recorded for
/// assertions.
pub struct LoopbackTransport {
    bus: broadcast::Sender<ReceivedMessage>,
    published: Mutex<Vec<(SyncChannel, SyncEvent)>>,
    subscribed: Mutex<HashSet<String>>,
}

impl LoopbackTransport {
    pub fn new() -> Self {
        let (bus, _) = broadcast::channel(256);
        Self {
            bus,
            published: Mutex::new(Vec::new()),
            subscribed: Mutex::new(HashSet::new()),
        }
    }

    /// A receiver over everything published after this call
    pub fn receiver(&self) -> broadcast::Receiver<ReceivedMessage> {
        self.bus.subscribe()
    }

    /// Everything published so far
    pub fn published(&self) -> Vec<(SyncChannel, SyncEvent)> {
        self.published.lock().clone()
    }

    /// Count of published events matching a predicate
    pub fn published_count(&self, predicate: impl Fn(&SyncChannel, &SyncEvent) -> bool) -> usize {
        self.published
            .lock()
            .iter()
            .filter(|(channel, event)| predicate(channel, event))
            .count()
    }

    /// Currently subscribed channel names
    pub fn subscribed(&self) -> HashSet<String> {
        self.subscribed.lock().clone()
    }
}

impl Default for LoopbackTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EventPublisher for LoopbackTransport {
    async fn publish(&self, channel: &SyncChannel, event: &SyncEvent) -> SyncResult<()> {
        self.published.lock().push((channel.clone(), event.clone()));
        // A publish with nobody listening is still a successful publish
        let _ = self
            .bus
            .send(ReceivedMessage::from_event(channel.clone(), event.clone()));
        Ok(())
    }
}

#[async_trait]
impl ChannelSubscriptions for LoopbackTransport {
    async fn subscribe(&self, channels: &[SyncChannel]) -> SyncResult<()> {
        let mut subscribed = self.subscribed.lock();
        for channel in channels {
            subscribed.insert(channel.name());
        }
        Ok(())
    }

    async fn unsubscribe(&self, channels: &[SyncChannel]) -> SyncResult<()> {
        let mut subscribed = self.subscribed.lock();
        for channel in channels {
            subscribed.remove(&channel.name());
        }
        Ok(())
    }
}
