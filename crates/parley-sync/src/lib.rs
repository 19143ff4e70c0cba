//! # parley-sync
//!
//! The real-time conversation synchronization core: presence tracking over
//! multi-session users, idempotent application of conversation events to
//! locally materialized message lists, and read-receipt resolution.
//!
//! The persistent store and the pub/sub transport are consumed through
//! ports (`parley_core::traits` and [`transport`]); everything here is
//! designed around at-least-once, unordered event delivery.

pub mod client;
pub mod conversation;
pub mod error;
pub mod messages;
pub mod presence;
pub mod router;
pub mod seen;
pub mod transport;

// Re-export the main entry points at crate root
pub use client::SyncClient;
pub use conversation::{ConversationChannels, ConversationHandle, ConversationView};
pub use error::{SyncError, SyncResult};
pub use messages::MessageService;
pub use presence::{PresenceBroadcaster, PresenceChange, PresenceRegistry, PresenceWatch};
pub use router::EventRouter;
pub use seen::SeenService;
pub use transport::{ChannelSubscriptions, EventPublisher};
