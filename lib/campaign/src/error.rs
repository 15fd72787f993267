//! Error types for the campaign crate.

use megaphone_core::CampaignId;
use std::fmt;

/// Errors from campaign persistence operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CampaignError {
    /// Campaign not found.
    NotFound { id: CampaignId },
    /// Unrecognized campaign status string.
    UnknownStatus { value: String },
    /// Unrecognized outreach state string.
    UnknownOutreachState { value: String },
}

impl fmt::Display for CampaignError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound { id } => write!(f, "campaign not found: {id}"),
            Self::UnknownStatus { value } => write!(f, "unknown campaign status: {value}"),
            Self::UnknownOutreachState { value } => {
                write!(f, "unknown outreach state: {value}")
            }
        }
    }
}

impl std::error::Error for CampaignError {}

/// Errors from the creator discovery search API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DirectoryError {
    /// The discovery API could not be reached.
    Unavailable { reason: String },
    /// The discovery API returned an unusable response.
    BadResponse { reason: String },
    /// The discovery API rejected the search parameters.
    BadQuery { reason: String },
}

impl fmt::Display for DirectoryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unavailable { reason } => {
                write!(f, "creator directory unavailable: {reason}")
            }
            Self::BadResponse { reason } => {
                write!(f, "creator directory returned bad response: {reason}")
            }
            Self::BadQuery { reason } => {
                write!(f, "creator directory rejected query: {reason}")
            }
        }
    }
}

impl std::error::Error for DirectoryError {}

/// Errors from outbound email delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MailError {
    /// The send failed.
    SendFailed { reason: String },
}

impl fmt::Display for MailError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SendFailed { reason } => write!(f, "email send failed: {reason}"),
        }
    }
}

impl std::error::Error for MailError {}
