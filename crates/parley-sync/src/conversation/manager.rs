//! Conversation channel manager
//!
//! Owns the open-conversation table: subscribe-on-open, seed from a full
//! fetch, route incoming events to the right view, unsubscribe-on-close.
//!
//! Every open entry carries a generation stamped from a process-wide
//! counter. Delivery and close both check generations, so a callback that
//! races a close can never touch a stale view and a handle left over from
//! before a reopen cannot close the new view - the guarantee comes from the
//! generation check, not from unsubscribe timing.

use dashmap::DashMap;
use parking_lot::{Mutex, RwLock};
use parley_cache::SyncChannel;
use parley_core::{Message, MessageStore, Snowflake, SyncEvent};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::instrument;

use crate::conversation::ConversationView;
use crate::error::{SyncError, SyncResult};
use crate::transport::ChannelSubscriptions;

/// Handle to an open conversation
///
/// Closing is explicit; dropping a handle leaks a reference count on
/// purpose (the UI layer drives open/close symmetrically).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConversationHandle {
    conversation_id: Snowflake,
    generation: u64,
}

impl ConversationHandle {
    /// The conversation this handle refers to
    pub fn conversation_id(&self) -> Snowflake {
        self.conversation_id
    }
}

/// One open conversation
struct OpenConversation {
    generation: u64,
    handles: usize,
    view: Arc<Mutex<ConversationView>>,
}

/// Manages per-conversation channel subscriptions and event routing
pub struct ConversationChannels {
    open: DashMap<Snowflake, OpenConversation>,
    next_generation: AtomicU64,
    store: Arc<dyn MessageStore>,
    subscriptions: Arc<dyn ChannelSubscriptions>,
    /// The conversation currently shown to the user, if any
    foreground: RwLock<Option<Snowflake>>,
}

impl ConversationChannels {
    /// Create a manager over a message store and a subscription port
    pub fn new(
        store: Arc<dyn MessageStore>,
        subscriptions: Arc<dyn ChannelSubscriptions>,
    ) -> Self {
        Self {
            open: DashMap::new(),
            next_generation: AtomicU64::new(0),
            store,
            subscriptions,
            foreground: RwLock::new(None),
        }
    }

    /// Open a conversation: subscribe to its channel and seed the view
    /// from a full fetch
    ///
    /// Opening an already-open conversation only bumps the reference count
    /// and returns a handle to the same view.
    #[instrument(skip(self))]
    pub async fn open(&self, conversation_id: Snowflake) -> SyncResult<ConversationHandle> {
        // Fast path: another handle already holds this conversation open
        if let Some(mut entry) = self.open.get_mut(&conversation_id) {
            entry.handles += 1;
            return Ok(ConversationHandle {
                conversation_id,
                generation: entry.generation,
            });
        }

        // Subscribe before fetching so events published during the fetch
        // are already flowing; the seed then wins or loses per-id through
        // the idempotent application rules.
        let channel = SyncChannel::conversation(conversation_id);
        self.subscriptions.subscribe(&[channel.clone()]).await?;

        let seeded = match self.store.fetch_messages(conversation_id).await {
            Ok(messages) => messages,
            Err(e) => {
                // Leave no dangling subscription behind a failed open
                if !self.open.contains_key(&conversation_id) {
                    if let Err(unsub_err) = self.subscriptions.unsubscribe(&[channel]).await {
                        tracing::warn!(error = %unsub_err, "Failed to unsubscribe after seed error");
                    }
                }
                return Err(e.into());
            }
        };

        let generation = self.next_generation.fetch_add(1, Ordering::Relaxed) + 1;
        let mut entry = self
            .open
            .entry(conversation_id)
            .or_insert_with(|| OpenConversation {
                generation,
                handles: 0,
                view: Arc::new(Mutex::new(ConversationView::seeded(seeded))),
            });
        // A concurrent open may have won the insert; its entry (and its
        // seed) is the one we join.
        entry.handles += 1;
        let generation = entry.generation;
        let handles = entry.handles;
        drop(entry);

        tracing::debug!(
            conversation_id = %conversation_id,
            generation = generation,
            handles = handles,
            "Conversation opened"
        );

        Ok(ConversationHandle {
            conversation_id,
            generation,
        })
    }

    /// Close a handle; the last close discards the view and unsubscribes
    ///
    /// A handle from before a close/reopen cycle is stale and closing it is
    /// a no-op.
    #[instrument(skip(self))]
    pub async fn close(&self, handle: ConversationHandle) -> SyncResult<()> {
        if let Some(mut entry) = self.open.get_mut(&handle.conversation_id) {
            if entry.generation != handle.generation {
                tracing::debug!(
                    conversation_id = %handle.conversation_id,
                    "Ignoring close from a stale handle"
                );
                return Ok(());
            }
            entry.handles = entry.handles.saturating_sub(1);
        } else {
            return Ok(());
        }

        // Remove only if still drained; a concurrent open keeps it alive
        let removed = self
            .open
            .remove_if(&handle.conversation_id, |_, entry| {
                entry.handles == 0 && entry.generation == handle.generation
            })
            .is_some();

        if removed {
            let mut foreground = self.foreground.write();
            if *foreground == Some(handle.conversation_id) {
                *foreground = None;
            }
            drop(foreground);

            self.subscriptions
                .unsubscribe(&[SyncChannel::conversation(handle.conversation_id)])
                .await?;

            tracing::debug!(
                conversation_id = %handle.conversation_id,
                "Conversation closed"
            );
        }

        Ok(())
    }

    /// Route an incoming event to the conversation's view
    ///
    /// Events for conversations that are not open are dropped; `deliver`
    /// checks the live table, so anything arriving after the last close
    /// never reaches a view. Returns `true` if the view changed.
    pub fn deliver(&self, conversation_id: Snowflake, event: &SyncEvent) -> bool {
        let Some(entry) = self.open.get(&conversation_id) else {
            tracing::trace!(
                conversation_id = %conversation_id,
                event_type = %event.event_type(),
                "Dropping event for closed conversation"
            );
            return false;
        };
        let view = entry.view.clone();
        drop(entry);

        let mut view = view.lock();
        match event {
            SyncEvent::MessageCreated(payload) => view.apply_create(payload.message.clone()),
            SyncEvent::MessageUpdated(payload) => view.apply_update(payload.message.clone()),
            SyncEvent::MessageDeleted(payload) => {
                if payload.conversation_id != conversation_id {
                    tracing::warn!(
                        conversation_id = %conversation_id,
                        event_conversation_id = %payload.conversation_id,
                        "Delete event routed to the wrong conversation"
                    );
                    return false;
                }
                view.apply_delete(payload.message_id)
            }
            _ => false,
        }
    }

    /// The current message list of an open conversation, in arrival order
    pub fn messages(&self, conversation_id: Snowflake) -> SyncResult<Vec<Message>> {
        let entry = self
            .open
            .get(&conversation_id)
            .ok_or(SyncError::NotOpen(conversation_id))?;
        let messages = entry.view.lock().messages();
        Ok(messages)
    }

    /// Optimistically take a message out of an open view, keeping its
    /// position for a possible rollback
    pub fn take_message(
        &self,
        conversation_id: Snowflake,
        message_id: Snowflake,
    ) -> Option<(u64, Message)> {
        let entry = self.open.get(&conversation_id)?;
        let mut view = entry.view.lock();
        view.take(message_id)
    }

    /// Roll back an optimistic removal
    pub fn restore_message(&self, conversation_id: Snowflake, seq: u64, message: Message) {
        if let Some(entry) = self.open.get(&conversation_id) {
            entry.view.lock().restore(seq, message);
        }
    }

    /// Mark the conversation the user is actively viewing
    pub fn set_foreground(&self, conversation_id: Option<Snowflake>) {
        *self.foreground.write() = conversation_id;
    }

    /// The conversation the user is actively viewing, if any
    pub fn foreground(&self) -> Option<Snowflake> {
        *self.foreground.read()
    }

    /// Whether the conversation is open on this client
    pub fn is_open(&self, conversation_id: Snowflake) -> bool {
        self.open.contains_key(&conversation_id)
    }

    /// Number of conversations currently open
    pub fn open_count(&self) -> usize {
        self.open.len()
    }
}

impl std::fmt::Debug for ConversationChannels {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConversationChannels")
            .field("open", &self.open.len())
            .finish()
    }
}
