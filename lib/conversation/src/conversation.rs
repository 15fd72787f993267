//! Conversation state: an owner-scoped message history.
//!
//! Invariants maintained here:
//! - the first message is always the system prompt and is never evicted
//! - the message count stays within the configured cap; eviction removes
//!   the oldest non-system messages first

use crate::message::{Message, MessageRole};
use chrono::{DateTime, Duration, Utc};
use megaphone_core::{ConversationId, UserId};
use serde::{Deserialize, Serialize};

/// A chat conversation owned by a single user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conversation {
    /// Unique conversation identifier.
    pub id: ConversationId,
    /// The user who owns this conversation.
    pub owner_id: UserId,
    /// Messages in insertion order. Index 0 is the system prompt.
    pub messages: Vec<Message>,
    /// When the conversation was created.
    pub created_at: DateTime<Utc>,
    /// When the conversation was last mutated. Drives TTL expiry.
    pub updated_at: DateTime<Utc>,
}

impl Conversation {
    /// Creates a new conversation seeded with the system prompt.
    #[must_use]
    pub fn new(owner_id: UserId, system_prompt: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: ConversationId::new(),
            owner_id,
            messages: vec![Message::system(system_prompt)],
            created_at: now,
            updated_at: now,
        }
    }

    /// Appends a message and bumps `updated_at`.
    pub fn push_message(&mut self, message: Message) {
        self.messages.push(message);
        self.updated_at = Utc::now();
    }

    /// Evicts the oldest non-system messages until the count is within
    /// `max_messages`. The system message at index 0 is never removed.
    pub fn enforce_cap(&mut self, max_messages: usize) {
        while self.messages.len() > max_messages {
            let oldest_evictable = self
                .messages
                .iter()
                .position(|m| m.role != MessageRole::System);
            match oldest_evictable {
                Some(index) => {
                    self.messages.remove(index);
                }
                None => break,
            }
        }
    }

    /// Returns true if the conversation has outlived the TTL.
    #[must_use]
    pub fn is_expired(&self, ttl: Duration) -> bool {
        Utc::now() - self.updated_at > ttl
    }

    /// Returns the number of messages.
    #[must_use]
    pub fn message_count(&self) -> usize {
        self.messages.len()
    }

    /// Returns the last message, if any.
    #[must_use]
    pub fn last_message(&self) -> Option<&Message> {
        self.messages.last()
    }
}
