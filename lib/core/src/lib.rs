//! Core domain types and utilities for the megaphone platform.
//!
//! This crate provides the foundational identifier types and error handling
//! shared by the campaign, conversation, and chat crates.

pub mod error;
pub mod id;

pub use error::Result;
pub use id::{CampaignId, ConversationId, CreatorId, MessageId, ParseIdError, UserId};
