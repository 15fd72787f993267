//! Conversation store for the megaphone platform.
//!
//! This crate provides:
//!
//! - **Message model**: role-tagged chat messages with tool-call payloads
//! - **Conversation**: per-owner message history with eviction invariants
//! - **Conversation Store**: owner-scoped session storage with TTL expiry,
//!   size caps, and file-backed snapshot persistence

pub mod conversation;
pub mod error;
pub mod message;
pub mod snapshot;
pub mod store;

pub use conversation::Conversation;
pub use error::StoreError;
pub use message::{Message, MessageRole, ToolCall};
pub use store::{ConversationStats, ConversationStore, StoreConfig, StoreStats};
