//! Chatroom and message model.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::ids::{ChatroomId, MessageId};

/// Author of a message.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SenderKind {
    /// Typed by the user.
    User,
    /// Produced by the reply simulator.
    Assistant,
}

impl SenderKind {
    /// Stable string form.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

impl fmt::Display for SenderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single chat message. Never modified after creation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Unique identifier.
    pub id: MessageId,
    /// Text; may be empty when an image is attached.
    pub content: String,
    /// Author.
    pub sender: SenderKind,
    /// Creation time, or a synthetic time for paged history.
    pub timestamp: DateTime<Utc>,
    /// Attached image (URL or data URL).
    pub image_url: Option<String>,
}

impl Message {
    /// Build a user message.
    #[must_use]
    pub fn user(
        content: impl Into<String>,
        image_url: Option<String>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            id: MessageId::new(),
            content: content.into(),
            sender: SenderKind::User,
            timestamp,
            image_url,
        }
    }

    /// Build an assistant message.
    #[must_use]
    pub fn assistant(content: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            id: MessageId::new(),
            content: content.into(),
            sender: SenderKind::Assistant,
            timestamp,
            image_url: None,
        }
    }
}

/// A named conversation with its ordered history (oldest first).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chatroom {
    /// Unique identifier.
    pub id: ChatroomId,
    /// Display title, never blank.
    pub title: String,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    messages: Vec<Message>,
}

impl Chatroom {
    /// Create an empty chatroom.
    #[must_use]
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            id: ChatroomId::new(),
            title: title.into(),
            created_at: Utc::now(),
            messages: Vec::new(),
        }
    }

    /// Messages, oldest first.
    #[must_use]
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Most recent message; always the last element of [`Self::messages`].
    #[must_use]
    pub fn last_message(&self) -> Option<&Message> {
        self.messages.last()
    }

    /// Timestamp of the oldest message.
    #[must_use]
    pub fn earliest_timestamp(&self) -> Option<DateTime<Utc>> {
        self.messages.first().map(|m| m.timestamp)
    }

    /// Timestamp for a new tail message, clamped so history never goes backwards.
    #[must_use]
    pub fn next_timestamp(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        self.last_message()
            .map_or(now, |last| now.max(last.timestamp))
    }

    /// Append a message at the tail.
    pub(crate) fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    /// Insert an already-ordered batch before every existing message.
    pub(crate) fn prepend(&mut self, batch: Vec<Message>) {
        self.messages.splice(0..0, batch);
    }

    /// Sidebar summary.
    #[must_use]
    pub fn summary(&self) -> ChatroomSummary {
        ChatroomSummary {
            id: self.id,
            title: self.title.clone(),
            created_at: self.created_at,
            message_count: self.messages.len(),
            last_message: self.last_message().cloned(),
        }
    }
}

/// Metadata for a chatroom displayed in the sidebar.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatroomSummary {
    /// Chatroom identifier.
    pub id: ChatroomId,
    /// Display title.
    pub title: String,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Number of messages.
    pub message_count: usize,
    /// Most recent message.
    pub last_message: Option<Message>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_last_message_tracks_tail() {
        let mut room = Chatroom::new("Trip");
        assert!(room.last_message().is_none());

        let now = Utc::now();
        room.push(Message::user("hi", None, now));
        room.push(Message::assistant("hello", now));
        assert_eq!(room.last_message().map(|m| m.sender), Some(SenderKind::Assistant));

        let older = Message::user("old", None, now - Duration::hours(1));
        room.prepend(vec![older.clone()]);
        assert_eq!(room.messages()[0], older);
        assert_eq!(room.last_message().map(|m| m.content.as_str()), Some("hello"));
        assert_eq!(room.summary().message_count, 3);
    }

    #[test]
    fn test_next_timestamp_never_goes_backwards() {
        let mut room = Chatroom::new("Clock");
        let now = Utc::now();
        room.push(Message::user("a", None, now));

        let skewed = now - Duration::seconds(30);
        assert_eq!(room.next_timestamp(skewed), now);

        let later = now + Duration::seconds(1);
        assert_eq!(room.next_timestamp(later), later);
    }

    #[test]
    fn test_sender_serializes_snake_case() {
        let json = serde_json::to_string(&SenderKind::Assistant).unwrap();
        assert_eq!(json, "\"assistant\"");
    }
}
