//! Conversation view - the locally materialized, insertion-ordered message
//! list for one open conversation
//!
//! Events arrive at-least-once and in no particular order, so every
//! application rule here is idempotent and self-healing:
//!
//! - a create for a known id is dropped (duplicate delivery, or the echo of
//!   a message this client just sent);
//! - an update replaces the entry wholesale in place; an update for an
//!   unknown id becomes a create (it raced ahead of one);
//! - a delete removes the entry if present and always records the id, so a
//!   delete observed before its create suppresses that message for the
//!   lifetime of the view instead of letting it resurrect.
//!
//! Entries are kept in an ordered map keyed by arrival sequence with an
//! id-to-sequence index, so applying an event never scans the whole list.

use parley_core::{Message, Snowflake};
use std::collections::{BTreeMap, HashMap, HashSet};

/// Ordered, deduplicated message list for one open conversation
#[derive(Debug, Default)]
pub struct ConversationView {
    /// Entries in arrival order
    entries: BTreeMap<u64, Message>,
    /// Message id -> arrival sequence
    index: HashMap<Snowflake, u64>,
    /// Ids deleted during this view's lifetime
    deleted: HashSet<Snowflake>,
    /// Next arrival sequence
    next_seq: u64,
}

impl ConversationView {
    /// Create an empty view
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a view seeded from a full fetch, already in creation order
    #[must_use]
    pub fn seeded(messages: Vec<Message>) -> Self {
        let mut view = Self::new();
        for message in messages {
            view.apply_create(message);
        }
        view
    }

    /// Apply a message-created event
    ///
    /// Returns `true` if the list changed.
    pub fn apply_create(&mut self, message: Message) -> bool {
        if self.deleted.contains(&message.id) || self.index.contains_key(&message.id) {
            return false;
        }

        let seq = self.next_seq;
        self.next_seq += 1;
        self.index.insert(message.id, seq);
        self.entries.insert(seq, message);
        true
    }

    /// Apply a message-updated event: wholesale last-writer-wins
    /// replacement, position preserved
    ///
    /// An update for an id never seen becomes a create; an update for a
    /// deleted id stays suppressed. Returns `true` if the list changed.
    pub fn apply_update(&mut self, message: Message) -> bool {
        if self.deleted.contains(&message.id) {
            return false;
        }

        match self.index.get(&message.id) {
            Some(&seq) => {
                if self.entries.get(&seq) == Some(&message) {
                    return false;
                }
                self.entries.insert(seq, message);
                true
            }
            // Update raced ahead of its create; converge by inserting
            None => self.apply_create(message),
        }
    }

    /// Apply a message-deleted event
    ///
    /// Never fails: deleting an absent id just records the deletion so a
    /// late-arriving create or update for it is suppressed. Returns `true`
    /// if the list changed.
    pub fn apply_delete(&mut self, message_id: Snowflake) -> bool {
        self.deleted.insert(message_id);
        match self.index.remove(&message_id) {
            Some(seq) => {
                self.entries.remove(&seq);
                true
            }
            None => false,
        }
    }

    /// Take a message out of the view, keeping its position for a possible
    /// [`Self::restore`]
    ///
    /// This is the optimistic half of a client-initiated delete; unlike
    /// [`Self::apply_delete`] it does not mark the id deleted, so a rolled
    /// back delete leaves the view as if nothing happened.
    pub fn take(&mut self, message_id: Snowflake) -> Option<(u64, Message)> {
        let seq = self.index.remove(&message_id)?;
        let message = self.entries.remove(&seq)?;
        Some((seq, message))
    }

    /// Put back a message taken with [`Self::take`], at its original
    /// position
    pub fn restore(&mut self, seq: u64, message: Message) {
        self.index.insert(message.id, seq);
        self.entries.insert(seq, message);
    }

    /// The messages in arrival order
    pub fn messages(&self) -> Vec<Message> {
        self.entries.values().cloned().collect()
    }

    /// Look up a message by id
    pub fn get(&self, message_id: Snowflake) -> Option<&Message> {
        let seq = self.index.get(&message_id)?;
        self.entries.get(seq)
    }

    /// Whether a message id is present
    pub fn contains(&self, message_id: Snowflake) -> bool {
        self.index.contains_key(&message_id)
    }

    /// Number of messages in the view
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the view holds no messages
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
