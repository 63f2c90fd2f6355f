//! Domain model structs persisted in the local SQLite database.
//!
//! Every struct derives `Serialize` and `Deserialize` so it can be handed
//! directly to the HTTP layer.

use chrono::{DateTime, Utc};
use coderchat_shared::{ChatTurn, MessageId, Role, UserId};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// User
// ---------------------------------------------------------------------------

/// A registered account.  The stored credential never leaves the store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct User {
    /// Row id assigned on registration.
    pub id: UserId,
    /// Unique login name.
    pub username: String,
}

// ---------------------------------------------------------------------------
// Chat message
// ---------------------------------------------------------------------------

/// A single entry in a user's conversation log.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChatMessage {
    /// Row id; grows with insertion order.
    pub id: MessageId,
    /// Owner of the conversation.
    pub user_id: UserId,
    /// `user` or `assistant`.
    pub role: Role,
    /// Raw message text, possibly containing fenced code blocks.
    pub content: String,
    /// Server-assigned, non-decreasing per user.
    pub timestamp: DateTime<Utc>,
}

impl From<ChatMessage> for ChatTurn {
    fn from(m: ChatMessage) -> Self {
        ChatTurn::new(m.role, m.content)
    }
}
