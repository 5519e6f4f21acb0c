//! Two-party chat conversations.

use crate::id::generate_id;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single message inside a chat. Messages are append-only and ordered by
/// `sent_at`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub id: String,
    pub sender_id: String,
    pub text: String,
    pub sent_at: DateTime<Utc>,
    #[serde(default)]
    pub is_read: bool,
}

impl ChatMessage {
    /// Build a new unread message stamped with the current time.
    pub fn new(sender_id: impl Into<String>, text: impl Into<String>) -> Self {
        ChatMessage {
            id: generate_id("msg"),
            sender_id: sender_id.into(),
            text: text.into(),
            sent_at: Utc::now(),
            is_read: false,
        }
    }
}

/// A conversation between exactly two participants.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Chat {
    pub id: String,
    pub participants: [String; 2],
    #[serde(default)]
    pub messages: Vec<ChatMessage>,
    #[serde(default)]
    pub archived: bool,
}

impl Chat {
    /// Create an empty chat between two users with a fresh ID.
    pub fn between(a: impl Into<String>, b: impl Into<String>) -> Self {
        Chat {
            id: generate_id("chat"),
            participants: [a.into(), b.into()],
            messages: Vec::new(),
            archived: false,
        }
    }

    /// Whether this chat connects exactly the given pair, in either order.
    pub fn connects(&self, a: &str, b: &str) -> bool {
        let [x, y] = &self.participants;
        (x == a && y == b) || (x == b && y == a)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connects_is_order_independent() {
        let chat = Chat::between("T1", "S1");

        assert!(chat.connects("T1", "S1"));
        assert!(chat.connects("S1", "T1"));
        assert!(!chat.connects("S1", "S2"));
    }

    #[test]
    fn test_new_message_is_unread() {
        let msg = ChatMessage::new("S1", "hello");

        assert!(msg.id.starts_with("msg-"));
        assert!(!msg.is_read);
    }
}
