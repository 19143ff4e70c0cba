//! Wire events emitted when synchronized state changes

mod sync_event;

pub use sync_event::{
    ConversationUpdated, MessageCreated, MessageDeleted, MessageUpdated, PresenceSnapshot,
    SyncEvent,
};
