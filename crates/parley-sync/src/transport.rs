//! Transport ports - what the sync core needs from the pub/sub layer
//!
//! Delivery semantics assumed of any implementation: at-least-once,
//! unordered across distinct publishes, channels partitioned as described
//! in `parley_cache::pubsub::channels`. The Redis implementations live in
//! `parley-cache`; test fakes implement the same traits in-process.

use async_trait::async_trait;
use parley_cache::SyncChannel;
use parley_core::SyncEvent;

use crate::error::{SyncError, SyncResult};

/// Port for publishing events
#[async_trait]
pub trait EventPublisher: Send + Sync {
    /// Publish one event to one channel
    async fn publish(&self, channel: &SyncChannel, event: &SyncEvent) -> SyncResult<()>;

    /// Publish the same event to several channels
    async fn publish_many(&self, channels: &[SyncChannel], event: &SyncEvent) -> SyncResult<()> {
        for channel in channels {
            self.publish(channel, event).await?;
        }
        Ok(())
    }
}

/// Port for managing channel subscriptions
#[async_trait]
pub trait ChannelSubscriptions: Send + Sync {
    async fn subscribe(&self, channels: &[SyncChannel]) -> SyncResult<()>;

    async fn unsubscribe(&self, channels: &[SyncChannel]) -> SyncResult<()>;
}

#[async_trait]
impl EventPublisher for parley_cache::Publisher {
    async fn publish(&self, channel: &SyncChannel, event: &SyncEvent) -> SyncResult<()> {
        parley_cache::Publisher::publish(self, channel, event)
            .await
            .map(|_receivers| ())
            .map_err(|e| SyncError::Transport(e.to_string()))
    }

    async fn publish_many(&self, channels: &[SyncChannel], event: &SyncEvent) -> SyncResult<()> {
        parley_cache::Publisher::publish_many(self, channels, event)
            .await
            .map(|_receivers| ())
            .map_err(|e| SyncError::Transport(e.to_string()))
    }
}

#[async_trait]
impl ChannelSubscriptions for parley_cache::Subscriber {
    async fn subscribe(&self, channels: &[SyncChannel]) -> SyncResult<()> {
        parley_cache::Subscriber::subscribe(self, channels)
            .await
            .map_err(|e| SyncError::Transport(e.to_string()))
    }

    async fn unsubscribe(&self, channels: &[SyncChannel]) -> SyncResult<()> {
        parley_cache::Subscriber::unsubscribe(self, channels)
            .await
            .map_err(|e| SyncError::Transport(e.to_string()))
    }
}
