//! HTTP surface for the chat agent.
//!
//! The chat route has an error-in-body contract: once a request carries a
//! caller identity and a non-empty message, the response is always 200 and
//! failures are described by `is_error`/`retryable` flags in the payload.
//! The conversation read/delete routes never error either; absent or
//! invalid ids read as empty and delete as a no-op.

use crate::config::ServerConfig;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use megaphone_core::{ConversationId, UserId};
use megaphone_ai::{ModelClientConfig, OpenAiChatClient};
use megaphone_campaign::{HttpCreatorDirectory, InMemoryCampaignService, TracingMailer};
use megaphone_chat::{ChatConfig, ChatOrchestrator};
use megaphone_conversation::{ConversationStore, StoreConfig};
use megaphone_tools::{default_registry, ToolExecutor};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use ulid::Ulid;

/// Shared application state.
pub struct AppState {
    /// The per-turn chat state machine.
    pub orchestrator: ChatOrchestrator,
    /// The conversation store, shared with the sweep task.
    pub store: Arc<ConversationStore>,
}

/// Error raised while wiring the application state.
#[derive(Debug)]
pub struct WiringError {
    reason: String,
}

impl std::fmt::Display for WiringError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "failed to wire application state: {}", self.reason)
    }
}

impl std::error::Error for WiringError {}

impl AppState {
    /// Builds the application state from configuration, wiring the real
    /// collaborators.
    ///
    /// # Errors
    ///
    /// Returns an error if an HTTP client cannot be constructed.
    pub fn from_config(config: &ServerConfig) -> Result<Self, WiringError> {
        let store = Arc::new(ConversationStore::new(StoreConfig {
            data_dir: config.data_dir.clone(),
            ..StoreConfig::default()
        }));

        let model = OpenAiChatClient::new(ModelClientConfig::new(
            config.model.base_url.clone(),
            config.model.api_key.clone(),
        ))
        .map_err(|e| WiringError {
            reason: e.to_string(),
        })?;

        let directory =
            HttpCreatorDirectory::new(config.discovery.base_url.clone(), config.discovery.api_key.clone())
                .map_err(|e| WiringError {
                    reason: e.to_string(),
                })?;

        let executor = ToolExecutor::new(
            Arc::new(InMemoryCampaignService::new()),
            Arc::new(directory),
            Arc::new(TracingMailer::new()),
        );

        let orchestrator = ChatOrchestrator::new(
            Arc::clone(&store),
            Arc::new(model),
            default_registry(),
            executor,
            ChatConfig::new(
                config.model.tool_model.clone(),
                config.model.summary_model.clone(),
            ),
        );

        Ok(Self {
            orchestrator,
            store,
        })
    }
}

/// Builds the application router.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/chat/message", post(chat_message))
        .route(
            "/chat/conversation/{id}",
            get(get_conversation).delete(delete_conversation),
        )
        .route("/chat/stats", get(stats))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[derive(Debug, Deserialize)]
struct ChatMessageRequest {
    message: String,
    #[serde(default)]
    conversation_id: Option<ConversationId>,
}

async fn chat_message(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<ChatMessageRequest>,
) -> Response {
    let Some(claim) = headers.get("x-user-id").and_then(|v| v.to_str().ok()) else {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({"error": "missing x-user-id header"})),
        )
            .into_response();
    };

    if body.message.trim().is_empty() {
        return (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({"error": "message must not be empty"})),
        )
            .into_response();
    }

    let owner_id = user_id_from_claim(claim);
    let output = state
        .orchestrator
        .handle_message(owner_id, &body.message, body.conversation_id)
        .await;
    Json(output).into_response()
}

async fn get_conversation(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Response {
    let messages = match id.parse::<ConversationId>() {
        Ok(id) => match state.store.get_conversation(id).await {
            Ok(Some(conversation)) => conversation.messages,
            Ok(None) => Vec::new(),
            Err(e) => {
                tracing::warn!(conversation_id = %id, error = %e, "conversation read failed");
                Vec::new()
            }
        },
        Err(_) => Vec::new(),
    };

    Json(json!({"conversation_id": id, "messages": messages})).into_response()
}

async fn delete_conversation(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Response {
    let deleted = match id.parse::<ConversationId>() {
        Ok(id) => match state.store.delete_conversation(id).await {
            Ok(deleted) => deleted,
            Err(e) => {
                tracing::warn!(conversation_id = %id, error = %e, "conversation delete failed");
                false
            }
        },
        Err(_) => false,
    };

    Json(json!({"deleted": deleted})).into_response()
}

async fn stats(State(state): State<Arc<AppState>>) -> Response {
    Json(state.store.stats().await).into_response()
}

async fn health() -> Response {
    Json(json!({"status": "ok"})).into_response()
}

/// Maps the opaque `x-user-id` claim to a stable internal id.
///
/// Claims already in id form parse directly; anything else is hashed
/// (FNV-1a, 128-bit) so the same subject always lands on the same owner,
/// across restarts included.
fn user_id_from_claim(claim: &str) -> UserId {
    if let Ok(id) = claim.parse() {
        return id;
    }

    const FNV_OFFSET: u128 = 0x6c62_272e_07bb_0142_62b8_2175_6295_c58d;
    const FNV_PRIME: u128 = 0x0000_0000_0100_0000_0000_0000_0000_013b;
    let mut hash = FNV_OFFSET;
    for byte in claim.bytes() {
        hash ^= u128::from(byte);
        hash = hash.wrapping_mul(FNV_PRIME);
    }
    UserId::from_ulid(Ulid::from(hash))
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::Request;
    use megaphone_ai::{ChatModel, ChatReply, ChatRequest, LlmError};
    use megaphone_campaign::{CreatorDirectory, CreatorProfile, DirectoryError, DiscoveryQuery};
    use megaphone_conversation::Message;
    use serde_json::Value as JsonValue;
    use tempfile::TempDir;
    use tower::ServiceExt;

    struct EchoModel;

    #[async_trait]
    impl ChatModel for EchoModel {
        async fn complete(&self, _request: ChatRequest) -> Result<ChatReply, LlmError> {
            Ok(ChatReply {
                content: "Happy to help.".to_string(),
                tool_calls: Vec::new(),
                model: "fake".to_string(),
                usage: None,
            })
        }
    }

    struct EmptyDirectory;

    #[async_trait]
    impl CreatorDirectory for EmptyDirectory {
        async fn search(
            &self,
            _query: &DiscoveryQuery,
        ) -> Result<Vec<CreatorProfile>, DirectoryError> {
            Ok(Vec::new())
        }
    }

    fn test_state(dir: &TempDir) -> Arc<AppState> {
        let store = Arc::new(ConversationStore::new(StoreConfig {
            data_dir: dir.path().to_path_buf(),
            ..StoreConfig::default()
        }));
        let executor = ToolExecutor::new(
            Arc::new(InMemoryCampaignService::new()),
            Arc::new(EmptyDirectory),
            Arc::new(TracingMailer::new()),
        );
        let orchestrator = ChatOrchestrator::new(
            Arc::clone(&store),
            Arc::new(EchoModel),
            default_registry(),
            executor,
            ChatConfig::new("router", "summarizer"),
        );
        Arc::new(AppState {
            orchestrator,
            store,
        })
    }

    async fn body_json(response: Response) -> JsonValue {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body");
        serde_json::from_slice(&bytes).expect("json body")
    }

    fn chat_request(user: Option<&str>, payload: JsonValue) -> Request<Body> {
        let mut builder = Request::builder()
            .method("POST")
            .uri("/chat/message")
            .header("content-type", "application/json");
        if let Some(user) = user {
            builder = builder.header("x-user-id", user);
        }
        builder
            .body(Body::from(payload.to_string()))
            .expect("request")
    }

    #[tokio::test]
    async fn health_reports_ok() {
        let dir = TempDir::new().expect("tempdir");
        let app = router(test_state(&dir));

        let response = app
            .oneshot(Request::get("/health").body(Body::empty()).expect("request"))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["status"], "ok");
    }

    #[tokio::test]
    async fn missing_identity_is_unauthorized() {
        let dir = TempDir::new().expect("tempdir");
        let app = router(test_state(&dir));

        let response = app
            .oneshot(chat_request(None, json!({"message": "hi"})))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn empty_message_is_unprocessable() {
        let dir = TempDir::new().expect("tempdir");
        let app = router(test_state(&dir));

        let response = app
            .oneshot(chat_request(Some("brand-42"), json!({"message": "   "})))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn chat_turn_returns_reply_and_conversation_id() {
        let dir = TempDir::new().expect("tempdir");
        let app = router(test_state(&dir));

        let response = app
            .oneshot(chat_request(
                Some("brand-42"),
                json!({"message": "What can you do?"}),
            ))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        assert_eq!(body["message"], "Happy to help.");
        assert_eq!(body["is_error"], false);
        assert!(body["conversation_id"].is_string());
    }

    #[tokio::test]
    async fn unknown_conversation_reads_as_empty() {
        let dir = TempDir::new().expect("tempdir");
        let app = router(test_state(&dir));

        let id = ConversationId::new();
        let response = app
            .oneshot(
                Request::get(format!("/chat/conversation/{id}"))
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["messages"], json!([]));
    }

    #[tokio::test]
    async fn conversation_read_returns_stored_messages_verbatim() {
        let dir = TempDir::new().expect("tempdir");
        let state = test_state(&dir);
        let app = router(Arc::clone(&state));

        let conversation = state
            .store
            .create_conversation(UserId::new(), "You are the campaign assistant.")
            .await
            .expect("create");
        state
            .store
            .add_message(conversation.id, Message::user("hello"))
            .await
            .expect("add");

        let response = app
            .oneshot(
                Request::get(format!("/chat/conversation/{}", conversation.id))
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");
        let body = body_json(response).await;
        let messages = body["messages"].as_array().expect("messages");
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0]["role"], "system");
        assert_eq!(messages[1]["content"], "hello");
    }

    #[tokio::test]
    async fn delete_is_idempotent() {
        let dir = TempDir::new().expect("tempdir");
        let state = test_state(&dir);

        let conversation = state
            .store
            .create_conversation(UserId::new(), "system")
            .await
            .expect("create");
        let uri = format!("/chat/conversation/{}", conversation.id);

        let response = router(Arc::clone(&state))
            .oneshot(
                Request::delete(&uri)
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");
        assert_eq!(body_json(response).await["deleted"], true);

        let response = router(Arc::clone(&state))
            .oneshot(
                Request::delete(&uri)
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");
        assert_eq!(body_json(response).await["deleted"], false);
    }

    #[tokio::test]
    async fn stats_counts_conversations() {
        let dir = TempDir::new().expect("tempdir");
        let state = test_state(&dir);

        state
            .store
            .create_conversation(UserId::new(), "system")
            .await
            .expect("create");

        let response = router(Arc::clone(&state))
            .oneshot(
                Request::get("/chat/stats")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");
        let body = body_json(response).await;
        assert_eq!(body["conversation_count"], 1);
    }

    #[test]
    fn claim_mapping_is_stable_and_distinct() {
        let a = user_id_from_claim("auth0|brand-42");
        let b = user_id_from_claim("auth0|brand-42");
        let c = user_id_from_claim("auth0|brand-43");
        assert_eq!(a, b);
        assert_ne!(a, c);

        let id = UserId::new();
        assert_eq!(user_id_from_claim(&id.to_string()), id);
    }
}
