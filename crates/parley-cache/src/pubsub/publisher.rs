//! Redis Pub/Sub publisher
//!
//! Publishes typed synchronization events to Redis channels. Payloads are
//! the serde-tagged `SyncEvent` JSON, so subscribers need no side channel
//! to know what they received.

use crate::pool::{RedisPool, RedisResult};
use crate::pubsub::SyncChannel;
use parley_core::SyncEvent;
use redis::AsyncCommands;

/// Redis Pub/Sub publisher
#[derive(Clone)]
pub struct Publisher {
    pool: RedisPool,
}

impl Publisher {
    /// Create a new publisher
    #[must_use]
    pub fn new(pool: RedisPool) -> Self {
        Self { pool }
    }

    /// Publish an event to a channel, returning the receiver count
    pub async fn publish(&self, channel: &SyncChannel, event: &SyncEvent) -> RedisResult<u32> {
        let mut conn = self.pool.get().await?;
        let channel_name = channel.name();
        let payload = serde_json::to_string(event)?;

        let receivers: u32 = conn.publish(&channel_name, &payload).await?;

        tracing::debug!(
            channel = %channel_name,
            event_type = %event.event_type(),
            receivers = receivers,
            "Published event"
        );

        Ok(receivers)
    }

    /// Publish the same event to several channels
    pub async fn publish_many(
        &self,
        channels: &[SyncChannel],
        event: &SyncEvent,
    ) -> RedisResult<u32> {
        let payload = serde_json::to_string(event)?;
        let mut total_receivers = 0;
        let mut conn = self.pool.get().await?;

        for channel in channels {
            let receivers: u32 = conn.publish(channel.name(), &payload).await?;
            total_receivers += receivers;
        }

        tracing::debug!(
            channels = channels.len(),
            event_type = %event.event_type(),
            total_receivers = total_receivers,
            "Published event to multiple channels"
        );

        Ok(total_receivers)
    }
}

impl std::fmt::Debug for Publisher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Publisher").finish()
    }
}
