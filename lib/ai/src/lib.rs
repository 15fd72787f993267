//! Chat-completion model client for the megaphone platform.
//!
//! This crate provides:
//!
//! - **`ChatModel`**: the trait the orchestrator programs against
//! - **`OpenAiChatClient`**: an OpenAI-compatible HTTP implementation
//! - **`LlmError`**: upstream failure taxonomy with retryability

pub mod client;
pub mod error;
pub mod model;

pub use client::{ModelClientConfig, OpenAiChatClient};
pub use error::LlmError;
pub use model::{
    ChatModel, ChatReply, ChatRequest, RequestedToolCall, TokenUsage, WireFunctionCall,
    WireMessage, WireToolCall,
};
