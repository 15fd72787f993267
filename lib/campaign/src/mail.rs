//! Outbound email seam.
//!
//! Bulk outreach goes through [`Mailer`]. The production deployment wires
//! a provider-backed implementation; [`TracingMailer`] logs sends instead
//! of delivering and backs tests and local development.

use crate::error::MailError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// A single outbound email.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutboundEmail {
    /// Recipient address or handle.
    pub to: String,
    /// Subject line.
    pub subject: String,
    /// Plain-text body.
    pub body: String,
}

/// Trait for outbound email delivery.
#[async_trait]
pub trait Mailer: Send + Sync {
    /// Delivers a single email.
    ///
    /// # Errors
    ///
    /// Returns an error if delivery fails.
    async fn send(&self, email: &OutboundEmail) -> Result<(), MailError>;
}

/// Mailer that logs instead of delivering.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingMailer;

impl TracingMailer {
    /// Creates a logging mailer.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Mailer for TracingMailer {
    async fn send(&self, email: &OutboundEmail) -> Result<(), MailError> {
        tracing::info!(
            to = %email.to,
            subject = %email.subject,
            body_len = email.body.len(),
            "outbound email"
        );
        Ok(())
    }
}
