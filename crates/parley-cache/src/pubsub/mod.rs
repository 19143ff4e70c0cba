//! Redis Pub/Sub module
//!
//! Publish/subscribe plumbing for real-time event distribution.

mod channels;
mod publisher;
mod subscriber;

pub use channels::{
    SyncChannel, CONVERSATION_CHANNEL_PREFIX, PRESENCE_CHANNEL, USER_CHANNEL_PREFIX,
};
pub use publisher::Publisher;
pub use subscriber::{
    ReceivedMessage, Subscriber, SubscriberBuilder, SubscriberConfig, SubscriberError,
    SubscriberResult,
};
