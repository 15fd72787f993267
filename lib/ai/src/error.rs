//! Error types for model invocations.
//!
//! Upstream failures are classified so the orchestrator can surface a
//! user-safe message plus a retryability flag instead of propagating an
//! exception to the HTTP layer.

use std::fmt;

/// Errors from chat-completion API calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LlmError {
    /// Rate limit exceeded. Retryable.
    RateLimited { retry_after_secs: Option<u64> },
    /// API key rejected. Fatal, not retryable.
    Unauthorized { reason: String },
    /// The request we built was rejected as malformed. Retryable (the
    /// next turn builds a fresh request).
    BadRequest { reason: String },
    /// Any other upstream failure. Retryable.
    Upstream { status: u16, reason: String },
    /// The request timed out. Retryable.
    Timeout,
    /// Could not reach the API endpoint. Retryable.
    Connect { reason: String },
    /// The response body could not be parsed. Retryable.
    ResponseParse { reason: String },
    /// Client-side configuration is invalid.
    InvalidConfig { reason: String },
}

impl LlmError {
    /// Returns whether the caller may usefully retry the turn.
    #[must_use]
    pub fn retryable(&self) -> bool {
        !matches!(
            self,
            Self::Unauthorized { .. } | Self::InvalidConfig { .. }
        )
    }

    /// A conversational, user-safe description of the failure.
    #[must_use]
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::RateLimited { .. } => {
                "I'm getting a lot of requests right now. Please try again in a moment."
            }
            Self::Unauthorized { .. } => {
                "I can't reach the language model because its credentials were rejected. Please contact support."
            }
            Self::Timeout => "That took longer than expected. Please try again.",
            Self::BadRequest { .. }
            | Self::Upstream { .. }
            | Self::Connect { .. }
            | Self::ResponseParse { .. }
            | Self::InvalidConfig { .. } => {
                "Something went wrong while processing your request. Please try again."
            }
        }
    }
}

impl fmt::Display for LlmError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RateLimited { retry_after_secs } => {
                if let Some(secs) = retry_after_secs {
                    write!(f, "rate limited, retry after {secs}s")
                } else {
                    write!(f, "rate limited")
                }
            }
            Self::Unauthorized { reason } => write!(f, "unauthorized: {reason}"),
            Self::BadRequest { reason } => write!(f, "model rejected request: {reason}"),
            Self::Upstream { status, reason } => {
                write!(f, "upstream model error ({status}): {reason}")
            }
            Self::Timeout => write!(f, "model request timed out"),
            Self::Connect { reason } => write!(f, "failed to reach model endpoint: {reason}"),
            Self::ResponseParse { reason } => {
                write!(f, "failed to parse model response: {reason}")
            }
            Self::InvalidConfig { reason } => write!(f, "invalid model client config: {reason}"),
        }
    }
}

impl std::error::Error for LlmError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rate_limited_is_retryable() {
        let err = LlmError::RateLimited {
            retry_after_secs: Some(30),
        };
        assert!(err.retryable());
        assert!(err.to_string().contains("30s"));
    }

    #[test]
    fn unauthorized_is_fatal() {
        let err = LlmError::Unauthorized {
            reason: "bad key".to_string(),
        };
        assert!(!err.retryable());
        assert!(err.user_message().contains("support"));
    }

    #[test]
    fn timeout_is_retryable() {
        assert!(LlmError::Timeout.retryable());
    }

    #[test]
    fn every_variant_has_a_non_empty_user_message() {
        let variants = [
            LlmError::RateLimited {
                retry_after_secs: None,
            },
            LlmError::Unauthorized {
                reason: String::new(),
            },
            LlmError::BadRequest {
                reason: String::new(),
            },
            LlmError::Upstream {
                status: 503,
                reason: String::new(),
            },
            LlmError::Timeout,
            LlmError::Connect {
                reason: String::new(),
            },
            LlmError::ResponseParse {
                reason: String::new(),
            },
            LlmError::InvalidConfig {
                reason: String::new(),
            },
        ];
        for err in variants {
            assert!(!err.user_message().is_empty());
        }
    }
}
