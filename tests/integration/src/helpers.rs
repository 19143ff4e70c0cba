//! Scenario-building helpers

use parley_cache::ReceivedMessage;
use parley_core::{Conversation, Snowflake, SnowflakeGenerator};
use parley_sync::SyncClient;
use std::sync::Arc;
use tokio::sync::broadcast;

use crate::fixtures::{LoopbackTransport, MemoryStore};

/// A wired-up client plus its event receiver
pub struct TestClient {
    pub client: SyncClient,
    pub events: broadcast::Receiver<ReceivedMessage>,
}

impl TestClient {
    /// Deliver everything currently queued on the transport to this
    /// client's router, synchronously
    pub async fn drain(&mut self) {
        while let Ok(msg) = self.events.try_recv() {
            self.client.router().handle(msg).await;
        }
    }
}

/// Shared backdrop for a scenario: one store, one transport, shared ids
pub struct TestWorld {
    pub store: Arc<MemoryStore>,
    pub transport: Arc<LoopbackTransport>,
    pub ids: Arc<SnowflakeGenerator>,
}

impl TestWorld {
    pub fn new() -> Self {
        Self {
            store: Arc::new(MemoryStore::new()),
            transport: Arc::new(LoopbackTransport::new()),
            ids: Arc::new(SnowflakeGenerator::new(0)),
        }
    }

    /// Register a direct conversation between two users
    pub fn direct_conversation(&self, a: Snowflake, b: Snowflake) -> Snowflake {
        let id = self.ids.generate();
        self.store
            .insert_conversation(Conversation::direct(id, a, b));
        id
    }

    /// Register a group conversation
    pub fn group_conversation(
        &self,
        name: &str,
        participants: impl IntoIterator<Item = Snowflake>,
    ) -> Snowflake {
        let id = self.ids.generate();
        self.store
            .insert_conversation(Conversation::group(id, name, participants));
        id
    }

    /// Wire up a client for a user; events are drained manually through
    /// `TestClient::drain` to keep scenarios deterministic
    pub fn client(&self, user_id: Snowflake) -> TestClient {
        let client = SyncClient::new(
            user_id,
            self.store.clone(),
            self.store.clone(),
            self.transport.clone(),
            self.transport.clone(),
            self.ids.clone(),
        );
        TestClient {
            client,
            events: self.transport.receiver(),
        }
    }

}

impl Default for TestWorld {
    fn default() -> Self {
        Self::new()
    }
}
