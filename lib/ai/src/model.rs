//! Request/response types and the `ChatModel` trait.
//!
//! The wire types follow the OpenAI chat-completions format, which is the
//! lingua franca of hosted and local model servers alike.

use crate::error::LlmError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// A message in the chat-completions wire format.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WireMessage {
    /// Role string: `system`, `user`, `assistant`, or `tool`.
    pub role: String,
    /// Message text. Absent on assistant messages that only carry tool calls.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    /// Tool calls attached to an assistant message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<WireToolCall>>,
    /// Correlation id on tool messages.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
}

impl WireMessage {
    /// Creates a plain message with the given role and content.
    #[must_use]
    pub fn new(role: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            content: Some(content.into()),
            tool_calls: None,
            tool_call_id: None,
        }
    }
}

/// A tool call in the wire format.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WireToolCall {
    /// Model-assigned call id.
    pub id: String,
    /// Always `function` for the providers we target.
    #[serde(rename = "type")]
    pub call_type: String,
    /// The function being called.
    pub function: WireFunctionCall,
}

/// Function name and arguments within a tool call.
///
/// `arguments` is a JSON-encoded string, not a JSON value — the model is
/// free to emit malformed JSON here, so parsing is deferred to the
/// executor where failure becomes a structured tool error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WireFunctionCall {
    /// Function name.
    pub name: String,
    /// JSON-encoded argument string.
    pub arguments: String,
}

/// A chat-completion request.
#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
    /// Model identifier.
    pub model: String,
    /// Conversation messages, oldest first.
    pub messages: Vec<WireMessage>,
    /// Sampling temperature.
    pub temperature: f32,
    /// Output token budget.
    pub max_tokens: u32,
    /// Tool catalog in wire format, if tool calling is enabled.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<JsonValue>>,
    /// Tool choice mode (`auto` when tools are attached).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_choice: Option<String>,
}

impl ChatRequest {
    /// Creates a request without tools.
    #[must_use]
    pub fn new(model: impl Into<String>, messages: Vec<WireMessage>) -> Self {
        Self {
            model: model.into(),
            messages,
            temperature: 0.2,
            max_tokens: 1024,
            tools: None,
            tool_choice: None,
        }
    }

    /// Attaches a tool catalog with `tool_choice = auto`.
    #[must_use]
    pub fn with_tools(mut self, tools: Vec<JsonValue>) -> Self {
        self.tools = Some(tools);
        self.tool_choice = Some("auto".to_string());
        self
    }

    /// Sets the sampling temperature.
    #[must_use]
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Sets the output token budget.
    #[must_use]
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }
}

/// A tool call requested by the model, with raw argument text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestedToolCall {
    /// Model-assigned call id.
    pub id: String,
    /// Function name.
    pub name: String,
    /// JSON-encoded argument string, unparsed and untrusted.
    pub arguments: String,
}

/// Token usage statistics.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TokenUsage {
    /// Number of tokens in the prompt.
    pub prompt_tokens: u32,
    /// Number of tokens in the completion.
    pub completion_tokens: u32,
    /// Total tokens used.
    pub total_tokens: u32,
}

/// The single choice returned by a chat completion.
#[derive(Debug, Clone)]
pub struct ChatReply {
    /// Generated text. Empty when the reply only carries tool calls.
    pub content: String,
    /// Tool calls requested by the model, in request order.
    pub tool_calls: Vec<RequestedToolCall>,
    /// Model that produced the reply.
    pub model: String,
    /// Token usage, when the provider reports it.
    pub usage: Option<TokenUsage>,
}

impl ChatReply {
    /// Returns true if the model requested tool calls.
    #[must_use]
    pub fn has_tool_calls(&self) -> bool {
        !self.tool_calls.is_empty()
    }
}

/// Trait for chat-completion backends.
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Performs one chat completion.
    ///
    /// # Errors
    ///
    /// Returns a classified [`LlmError`] on upstream failure.
    async fn complete(&self, request: ChatRequest) -> Result<ChatReply, LlmError>;
}
