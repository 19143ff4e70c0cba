//! Event router
//!
//! Client-side pump: drains the subscriber's fan-in stream and routes each
//! message by channel - conversation events into the channel manager,
//! presence snapshots into the presence watch. Runs as a background task
//! until stopped.

use parley_cache::{ReceivedMessage, SyncChannel};
use parley_core::{Snowflake, SyncEvent};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::broadcast;

use crate::conversation::ConversationChannels;
use crate::presence::PresenceWatch;
use crate::seen::SeenService;

/// Routes received transport messages to the client-side components
pub struct EventRouter {
    /// The local user, on whose behalf foreground read receipts are sent
    user_id: Snowflake,
    channels: Arc<ConversationChannels>,
    presence: Arc<PresenceWatch>,
    seen: Arc<SeenService>,
    running: AtomicBool,
}

impl EventRouter {
    /// Create a router for one client
    pub fn new(
        user_id: Snowflake,
        channels: Arc<ConversationChannels>,
        presence: Arc<PresenceWatch>,
        seen: Arc<SeenService>,
    ) -> Self {
        Self {
            user_id,
            channels,
            presence,
            seen,
            running: AtomicBool::new(false),
        }
    }

    /// Start pumping the given receiver on a background task
    pub fn start(self: Arc<Self>, receiver: broadcast::Receiver<ReceivedMessage>) {
        if self.running.swap(true, Ordering::SeqCst) {
            tracing::warn!("Event router is already running");
            return;
        }

        let router = self.clone();
        tokio::spawn(async move {
            router.run(receiver).await;
        });

        tracing::info!(user_id = %self.user_id, "Event router started");
    }

    /// Stop the pump; the background task exits on its next wakeup
    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
        tracing::info!(user_id = %self.user_id, "Event router stopped");
    }

    /// Whether the pump is running
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    async fn run(&self, mut receiver: broadcast::Receiver<ReceivedMessage>) {
        while self.running.load(Ordering::SeqCst) {
            match receiver.recv().await {
                Ok(msg) => {
                    self.handle(msg).await;
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    // Dropped messages heal: snapshots are totals and
                    // reopened conversations reseed from the store.
                    tracing::warn!(lagged = n, "Event router lagged behind");
                }
                Err(broadcast::error::RecvError::Closed) => {
                    tracing::warn!("Event router channel closed");
                    break;
                }
            }
        }

        self.running.store(false, Ordering::SeqCst);
    }

    /// Route one received message
    pub async fn handle(&self, msg: ReceivedMessage) {
        let Some(event) = msg.event else {
            tracing::debug!(channel = %msg.channel, "Ignoring non-event payload");
            return;
        };

        tracing::trace!(
            channel = %msg.channel,
            event_type = %event.event_type(),
            "Routing event"
        );

        match msg.channel {
            SyncChannel::Conversation(conversation_id) => {
                let applied = self.channels.deliver(conversation_id, &event);

                // A new message landing in the foreground conversation is
                // seen immediately; mark_seen itself is idempotent and
                // monotonic, so racing deliveries are harmless.
                if applied
                    && matches!(event, SyncEvent::MessageCreated(_))
                    && self.channels.foreground() == Some(conversation_id)
                {
                    if let Err(e) = self.seen.mark_seen(self.user_id, conversation_id).await {
                        tracing::warn!(error = %e, "Failed to mark foreground conversation seen");
                    }
                }
            }
            SyncChannel::Presence => {
                if let SyncEvent::PresenceSnapshot(snapshot) = event {
                    self.presence.apply_snapshot(snapshot.users);
                }
            }
            SyncChannel::User(_) => {
                // Conversation-list refreshes are consumed by the list
                // view, which lives outside this core
                tracing::trace!(event_type = %event.event_type(), "User-channel event");
            }
            SyncChannel::Custom(name) => {
                tracing::debug!(channel = %name, "Ignoring event on unknown channel");
            }
        }
    }
}

impl std::fmt::Debug for EventRouter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventRouter")
            .field("user_id", &self.user_id)
            .field("running", &self.is_running())
            .finish()
    }
}
