//! Store ports - interfaces to the persistent store

mod stores;

pub use stores::{ConversationStore, MessageStore, StoreResult};
