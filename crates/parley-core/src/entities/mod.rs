//! Domain entities

mod conversation;
mod message;
mod user;

pub use conversation::Conversation;
pub use message::{Message, MessageBody};
pub use user::User;
