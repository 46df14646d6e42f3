//! Chatrooms, messages, pagination and search.
//!
//! The current selection is kept as an id and resolved on every read, so a
//! chatroom can never be shown from a stale copy.

pub mod history;
pub mod search;
pub mod store;
pub mod types;

pub use search::filter_chatrooms;
pub use store::{ChatView, ConversationStore};
pub use types::{Chatroom, ChatroomSummary, Message, SenderKind};
