//! OpenAI-compatible chat-completions client.
//!
//! Works against any endpoint implementing the chat-completions API,
//! hosted or local. Upstream failures are classified into [`LlmError`]
//! variants so the orchestrator never has to inspect HTTP details.

use crate::error::LlmError;
use crate::model::{ChatModel, ChatReply, ChatRequest, RequestedToolCall, TokenUsage, WireToolCall};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::time::Duration;

const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 60;

/// Configuration for the chat-completions client.
#[derive(Debug, Clone)]
pub struct ModelClientConfig {
    /// Base URL of the API, e.g. `https://api.openai.com/v1`.
    pub base_url: String,
    /// Bearer token. Optional for local servers.
    pub api_key: Option<String>,
    /// Connection timeout.
    pub connect_timeout: Duration,
    /// Whole-request timeout. A hung upstream call fails as
    /// [`LlmError::Timeout`] instead of blocking the turn indefinitely.
    pub request_timeout: Duration,
}

impl ModelClientConfig {
    /// Creates a configuration with default timeouts.
    #[must_use]
    pub fn new(base_url: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key,
            connect_timeout: Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    choices: Vec<ApiChoice>,
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    usage: Option<ApiUsage>,
}

#[derive(Debug, Deserialize)]
struct ApiChoice {
    message: ApiMessage,
}

#[derive(Debug, Deserialize)]
struct ApiMessage {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    tool_calls: Option<Vec<WireToolCall>>,
}

#[derive(Debug, Deserialize)]
struct ApiUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
    total_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: String,
}

/// Chat-completions client over an OpenAI-compatible endpoint.
#[derive(Debug, Clone)]
pub struct OpenAiChatClient {
    client: Client,
    config: ModelClientConfig,
}

impl OpenAiChatClient {
    /// Creates a new client.
    ///
    /// # Errors
    ///
    /// Returns [`LlmError::InvalidConfig`] if the HTTP client cannot be
    /// built.
    pub fn new(config: ModelClientConfig) -> Result<Self, LlmError> {
        let client = Client::builder()
            .connect_timeout(config.connect_timeout)
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| LlmError::InvalidConfig {
                reason: e.to_string(),
            })?;
        Ok(Self { client, config })
    }

    fn completions_url(&self) -> String {
        format!(
            "{}/chat/completions",
            self.config.base_url.trim_end_matches('/')
        )
    }

    fn classify_status(status: StatusCode, retry_after: Option<u64>, body: &str) -> LlmError {
        let reason = serde_json::from_str::<ApiErrorBody>(body)
            .map_or_else(|_| body.chars().take(200).collect(), |b| b.error.message);
        match status {
            StatusCode::TOO_MANY_REQUESTS => LlmError::RateLimited {
                retry_after_secs: retry_after,
            },
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => LlmError::Unauthorized { reason },
            StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
                LlmError::BadRequest { reason }
            }
            other => LlmError::Upstream {
                status: other.as_u16(),
                reason,
            },
        }
    }

    fn classify_transport(e: &reqwest::Error) -> LlmError {
        if e.is_timeout() {
            LlmError::Timeout
        } else if e.is_connect() {
            LlmError::Connect {
                reason: e.to_string(),
            }
        } else {
            LlmError::Upstream {
                status: 0,
                reason: e.to_string(),
            }
        }
    }
}

#[async_trait]
impl ChatModel for OpenAiChatClient {
    async fn complete(&self, request: ChatRequest) -> Result<ChatReply, LlmError> {
        tracing::debug!(
            model = %request.model,
            messages = request.messages.len(),
            has_tools = request.tools.is_some(),
            "sending chat completion request"
        );

        let mut http_request = self.client.post(self.completions_url()).json(&request);
        if let Some(ref key) = self.config.api_key {
            http_request = http_request.bearer_auth(key);
        }

        let response = http_request
            .send()
            .await
            .map_err(|e| Self::classify_transport(&e))?;

        let status = response.status();
        let retry_after = response
            .headers()
            .get("retry-after")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse().ok());
        let body = response
            .text()
            .await
            .map_err(|e| Self::classify_transport(&e))?;

        if !status.is_success() {
            let err = Self::classify_status(status, retry_after, &body);
            tracing::warn!(status = status.as_u16(), error = %err, "chat completion failed");
            return Err(err);
        }

        let api_response: ApiResponse =
            serde_json::from_str(&body).map_err(|e| LlmError::ResponseParse {
                reason: e.to_string(),
            })?;

        let choice = api_response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| LlmError::ResponseParse {
                reason: "response contained no choices".to_string(),
            })?;

        let tool_calls = choice
            .message
            .tool_calls
            .unwrap_or_default()
            .into_iter()
            .map(|call| RequestedToolCall {
                id: call.id,
                name: call.function.name,
                arguments: call.function.arguments,
            })
            .collect::<Vec<_>>();

        tracing::debug!(
            tool_calls = tool_calls.len(),
            "received chat completion reply"
        );

        Ok(ChatReply {
            content: choice.message.content.unwrap_or_default(),
            tool_calls,
            model: api_response.model.unwrap_or(request.model),
            usage: api_response.usage.map(|u| TokenUsage {
                prompt_tokens: u.prompt_tokens,
                completion_tokens: u.completion_tokens,
                total_tokens: u.total_tokens,
            }),
        })
    }
}
