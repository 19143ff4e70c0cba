//! # parley-cache
//!
//! Redis-backed transport layer: a managed connection pool and the pub/sub
//! channels that carry synchronization events between server instances and
//! connected clients.
//!
//! Delivery through Redis Pub/Sub is at-least-once from the consumer's
//! perspective (reconnects replay nothing, but fan-in duplication and
//! re-publishes do happen) and unordered across distinct publishes; the
//! event payloads in `parley-core` are designed for exactly that.

pub mod pool;
pub mod pubsub;

// Re-export pool types
pub use pool::{create_shared_pool, RedisPool, RedisPoolConfig, RedisPoolError, RedisResult, SharedRedisPool};

// Re-export pubsub types
pub use pubsub::{
    Publisher, ReceivedMessage, Subscriber, SubscriberBuilder, SubscriberConfig, SubscriberError,
    SubscriberResult, SyncChannel, CONVERSATION_CHANNEL_PREFIX, PRESENCE_CHANNEL,
    USER_CHANNEL_PREFIX,
};
