//! Error types for the conversation crate.

use megaphone_core::ConversationId;
use std::fmt;

/// Errors from conversation store operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Conversation not found.
    NotFound { id: ConversationId },
    /// Snapshot file I/O failed.
    Io { reason: String },
    /// Snapshot serialization or deserialization failed.
    Serialize { reason: String },
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound { id } => write!(f, "conversation not found: {id}"),
            Self::Io { reason } => write!(f, "conversation snapshot I/O failed: {reason}"),
            Self::Serialize { reason } => {
                write!(f, "conversation snapshot serialization failed: {reason}")
            }
        }
    }
}

impl std::error::Error for StoreError {}
