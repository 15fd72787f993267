//! Error types for tool execution.

use std::fmt;

/// Errors raised while executing a tool call.
///
/// These never cross the executor boundary as errors; [`crate::ToolExecutor`]
/// folds them into a failed [`crate::ToolOutcome`] so the model can read the
/// message and self-correct.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolError {
    /// The model asked for a tool that is not in the catalog.
    Unknown { name: String },
    /// The model's arguments were malformed or failed validation.
    InvalidArguments { reason: String },
    /// A backend collaborator failed.
    Backend { reason: String },
}

impl ToolError {
    /// Shorthand for an argument validation failure.
    pub fn invalid(reason: impl Into<String>) -> Self {
        Self::InvalidArguments {
            reason: reason.into(),
        }
    }

    /// Shorthand for a backend failure.
    pub fn backend(reason: impl fmt::Display) -> Self {
        Self::Backend {
            reason: reason.to_string(),
        }
    }
}

impl fmt::Display for ToolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unknown { name } => write!(f, "unknown tool: {name}"),
            Self::InvalidArguments { reason } => write!(f, "invalid arguments: {reason}"),
            Self::Backend { reason } => write!(f, "backend error: {reason}"),
        }
    }
}

impl std::error::Error for ToolError {}
