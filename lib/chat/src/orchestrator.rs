//! The per-turn chat state machine.
//!
//! A turn is two model passes around a tool fan-out: the first pass sees
//! the full history and the tool catalog and decides what to do; the tool
//! results are folded back into the conversation; the second pass sees only
//! the tail and phrases the reply. All failure modes terminate in a
//! readable [`ChatTurnOutput`], never in an error.

use crate::projection::to_wire;
use crate::prompts;
use futures::future::join_all;
use megaphone_ai::{ChatModel, ChatRequest, LlmError, RequestedToolCall, WireMessage};
use megaphone_conversation::{ConversationStore, Message, StoreError, ToolCall};
use megaphone_core::{ConversationId, UserId};
use megaphone_tools::{ToolExecutor, ToolOutcome, ToolRegistry};
use serde::Serialize;
use serde_json::Value as JsonValue;
use std::fmt;
use std::sync::Arc;

/// Reply when the turn fails in a way no classifier anticipated.
const FALLBACK_MESSAGE: &str =
    "Sorry, something went wrong on our side while handling that. Please try again.";

/// Per-pass model settings.
#[derive(Debug, Clone)]
pub struct ChatConfig {
    /// Model for the tool-routing pass.
    pub tool_model: String,
    /// Model for the summarization pass.
    pub summary_model: String,
    /// Routing runs cold so tool arguments stay literal.
    pub tool_temperature: f32,
    /// Output budget for the routing pass.
    pub tool_max_tokens: u32,
    /// Summarization runs warmer for readable prose.
    pub summary_temperature: f32,
    /// Output budget for the summarization pass.
    pub summary_max_tokens: u32,
    /// How many trailing messages the summarization pass sees.
    pub summary_window: usize,
}

impl ChatConfig {
    /// Creates a config with the standard pass settings.
    #[must_use]
    pub fn new(tool_model: impl Into<String>, summary_model: impl Into<String>) -> Self {
        Self {
            tool_model: tool_model.into(),
            summary_model: summary_model.into(),
            tool_temperature: 0.1,
            tool_max_tokens: 1024,
            summary_temperature: 0.5,
            summary_max_tokens: 2048,
            summary_window: 6,
        }
    }
}

/// The executed result of one model-issued tool call.
#[derive(Debug, Clone, Serialize)]
pub struct ToolCallResult {
    /// Model-assigned call id.
    pub tool_call_id: String,
    /// The tool that ran.
    pub function_name: String,
    /// What it produced.
    pub result: ToolOutcome,
}

/// What one turn hands back to the HTTP layer.
#[derive(Debug, Clone, Serialize)]
pub struct ChatTurnOutput {
    /// Assistant text for the user.
    pub message: String,
    /// Tool calls executed this turn, in issue order.
    pub tool_calls: Vec<ToolCallResult>,
    /// The conversation this turn belongs to.
    pub conversation_id: ConversationId,
    /// True when the message describes a failure instead of an answer.
    pub is_error: bool,
    /// Present on errors: whether retrying the turn may help.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retryable: Option<bool>,
}

impl ChatTurnOutput {
    fn reply(message: String, tool_calls: Vec<ToolCallResult>, id: ConversationId) -> Self {
        Self {
            message,
            tool_calls,
            conversation_id: id,
            is_error: false,
            retryable: None,
        }
    }
}

/// Internal turn failures; only the catch-all in `handle_message` sees
/// these.
#[derive(Debug)]
enum TurnError {
    Store(StoreError),
    Serialize(serde_json::Error),
}

impl fmt::Display for TurnError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Store(e) => write!(f, "store error: {e}"),
            Self::Serialize(e) => write!(f, "serialization error: {e}"),
        }
    }
}

impl From<StoreError> for TurnError {
    fn from(e: StoreError) -> Self {
        Self::Store(e)
    }
}

impl From<serde_json::Error> for TurnError {
    fn from(e: serde_json::Error) -> Self {
        Self::Serialize(e)
    }
}

/// Runs chat turns against the store, the model, and the tool stack.
pub struct ChatOrchestrator {
    store: Arc<ConversationStore>,
    model: Arc<dyn ChatModel>,
    registry: ToolRegistry,
    executor: ToolExecutor,
    config: ChatConfig,
}

impl ChatOrchestrator {
    /// Creates an orchestrator.
    #[must_use]
    pub fn new(
        store: Arc<ConversationStore>,
        model: Arc<dyn ChatModel>,
        registry: ToolRegistry,
        executor: ToolExecutor,
        config: ChatConfig,
    ) -> Self {
        Self {
            store,
            model,
            registry,
            executor,
            config,
        }
    }

    /// Handles one user message. Infallible by contract: model failures are
    /// classified into the reply, and anything else becomes an apologetic
    /// fallback that still carries a conversation id.
    pub async fn handle_message(
        &self,
        owner_id: UserId,
        text: &str,
        conversation_id: Option<ConversationId>,
    ) -> ChatTurnOutput {
        match self.run_turn(owner_id, text, conversation_id).await {
            Ok(output) => output,
            Err(e) => {
                tracing::error!(owner_id = %owner_id, error = %e, "chat turn failed");
                ChatTurnOutput {
                    message: FALLBACK_MESSAGE.to_string(),
                    tool_calls: Vec::new(),
                    conversation_id: conversation_id.unwrap_or_else(ConversationId::new),
                    is_error: true,
                    retryable: Some(true),
                }
            }
        }
    }

    async fn run_turn(
        &self,
        owner_id: UserId,
        text: &str,
        requested_id: Option<ConversationId>,
    ) -> Result<ChatTurnOutput, TurnError> {
        // A supplied id that no longer resolves (expired, evicted, deleted)
        // falls back to the owner's live conversation.
        let conversation = match requested_id {
            Some(id) => match self.store.get_conversation(id).await? {
                Some(conversation) => conversation,
                None => {
                    self.store
                        .get_or_create_for_owner(owner_id, prompts::ROUTING_PROMPT)
                        .await?
                }
            },
            None => {
                self.store
                    .get_or_create_for_owner(owner_id, prompts::ROUTING_PROMPT)
                    .await?
            }
        };
        let id = conversation.id;

        self.store.add_message(id, Message::user(text)).await?;

        let request = ChatRequest::new(&self.config.tool_model, self.history(id).await?)
            .with_tools(self.registry.to_wire_format())
            .with_temperature(self.config.tool_temperature)
            .with_max_tokens(self.config.tool_max_tokens);

        let reply = match self.model.complete(request).await {
            Ok(reply) => reply,
            Err(e) => return self.model_failure(id, &e, Vec::new()).await,
        };

        if !reply.has_tool_calls() {
            self.store
                .add_message(id, Message::assistant(&reply.content))
                .await?;
            return Ok(ChatTurnOutput::reply(reply.content, Vec::new(), id));
        }

        // Persist the assistant's tool-call message before executing, so the
        // stored history mirrors what the model saw and said.
        let stored_calls: Vec<ToolCall> = reply.tool_calls.iter().map(to_stored_call).collect();
        self.store
            .add_message(
                id,
                Message::assistant(&reply.content).with_tool_calls(stored_calls),
            )
            .await?;

        let results = self.execute_calls(&reply.tool_calls).await;
        for result in &results {
            let content = serde_json::to_string(&result.result)?;
            self.store
                .add_message(id, Message::tool(result.tool_call_id.clone(), content))
                .await?;
        }

        let request = ChatRequest::new(&self.config.summary_model, self.summary_window(id).await?)
            .with_temperature(self.config.summary_temperature)
            .with_max_tokens(self.config.summary_max_tokens);

        let summary = match self.model.complete(request).await {
            Ok(reply) => reply,
            Err(e) => return self.model_failure(id, &e, results).await,
        };

        self.store
            .add_message(id, Message::assistant(&summary.content))
            .await?;
        Ok(ChatTurnOutput::reply(summary.content, results, id))
    }

    /// Runs every call the model issued concurrently. The executor is
    /// infallible, so a malformed or failing call yields a failed outcome
    /// without touching its siblings.
    async fn execute_calls(&self, calls: &[RequestedToolCall]) -> Vec<ToolCallResult> {
        let executions = calls.iter().map(|call| async move {
            let outcome = self.executor.execute(&call.name, &call.arguments).await;
            ToolCallResult {
                tool_call_id: call.id.clone(),
                function_name: call.name.clone(),
                result: outcome,
            }
        });
        join_all(executions).await
    }

    /// Projects the full stored history for the tool-routing pass.
    async fn history(&self, id: ConversationId) -> Result<Vec<WireMessage>, TurnError> {
        let conversation = self
            .store
            .get_conversation(id)
            .await?
            .ok_or(StoreError::NotFound { id })?;
        Ok(conversation.messages.iter().map(to_wire).collect())
    }

    /// Projects the summarization context: the summary system prompt plus
    /// the trailing window of the conversation.
    async fn summary_window(&self, id: ConversationId) -> Result<Vec<WireMessage>, TurnError> {
        let conversation = self
            .store
            .get_conversation(id)
            .await?
            .ok_or(StoreError::NotFound { id })?;

        let tail_start = conversation
            .messages
            .len()
            .saturating_sub(self.config.summary_window);
        let mut messages = vec![WireMessage::new("system", prompts::SUMMARY_PROMPT)];
        messages.extend(conversation.messages[tail_start..].iter().map(to_wire));
        Ok(messages)
    }

    /// Classifies a model failure into a normal reply and persists it so
    /// the conversation stays coherent across the failure.
    async fn model_failure(
        &self,
        id: ConversationId,
        error: &LlmError,
        tool_calls: Vec<ToolCallResult>,
    ) -> Result<ChatTurnOutput, TurnError> {
        tracing::warn!(conversation_id = %id, error = %error, "model invocation failed");
        let message = error.user_message().to_string();
        self.store
            .add_message(id, Message::assistant(&message))
            .await?;

        Ok(ChatTurnOutput {
            message,
            tool_calls,
            conversation_id: id,
            is_error: true,
            retryable: Some(error.retryable()),
        })
    }
}

/// Converts a model-issued call into its stored form. Arguments that parse
/// as JSON are stored structurally; malformed argument text is stored as a
/// JSON string so it can be replayed verbatim.
fn to_stored_call(call: &RequestedToolCall) -> ToolCall {
    let arguments = serde_json::from_str::<JsonValue>(&call.arguments)
        .unwrap_or_else(|_| JsonValue::String(call.arguments.clone()));
    ToolCall::new(call.id.clone(), call.name.clone(), arguments)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use megaphone_ai::ChatReply;
    use megaphone_campaign::{
        CreatorDirectory, CreatorProfile, DirectoryError, DiscoveryQuery, FollowerTier,
        InMemoryCampaignService, TracingMailer,
    };
    use megaphone_conversation::{MessageRole, StoreConfig};
    use megaphone_tools::default_registry;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use tempfile::TempDir;

    struct FakeModel {
        replies: Mutex<VecDeque<Result<ChatReply, LlmError>>>,
        requests: Mutex<Vec<ChatRequest>>,
    }

    impl FakeModel {
        fn scripted(replies: Vec<Result<ChatReply, LlmError>>) -> Arc<Self> {
            Arc::new(Self {
                replies: Mutex::new(replies.into()),
                requests: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl ChatModel for FakeModel {
        async fn complete(&self, request: ChatRequest) -> Result<ChatReply, LlmError> {
            self.requests.lock().expect("lock").push(request);
            self.replies
                .lock()
                .expect("lock")
                .pop_front()
                .expect("unscripted model call")
        }
    }

    #[derive(Default)]
    struct RecordingDirectory {
        queries: Mutex<Vec<DiscoveryQuery>>,
        results: Vec<CreatorProfile>,
    }

    #[async_trait]
    impl CreatorDirectory for RecordingDirectory {
        async fn search(
            &self,
            query: &DiscoveryQuery,
        ) -> Result<Vec<CreatorProfile>, DirectoryError> {
            self.queries.lock().expect("lock").push(query.clone());
            Ok(self.results.clone())
        }
    }

    fn text_reply(content: &str) -> Result<ChatReply, LlmError> {
        Ok(ChatReply {
            content: content.to_string(),
            tool_calls: Vec::new(),
            model: "fake".to_string(),
            usage: None,
        })
    }

    fn tool_reply(calls: Vec<(&str, &str, &str)>) -> Result<ChatReply, LlmError> {
        Ok(ChatReply {
            content: String::new(),
            tool_calls: calls
                .into_iter()
                .map(|(id, name, arguments)| RequestedToolCall {
                    id: id.to_string(),
                    name: name.to_string(),
                    arguments: arguments.to_string(),
                })
                .collect(),
            model: "fake".to_string(),
            usage: None,
        })
    }

    fn nano_creator(handle: &str) -> CreatorProfile {
        CreatorProfile {
            handle: handle.to_string(),
            full_name: "Test Creator".to_string(),
            followers: 8_000,
            engagement_rate: 0.04,
            country: "IN".to_string(),
            category: "fashion".to_string(),
            language: "en".to_string(),
            bio: "Fashion from Mumbai.".to_string(),
        }
    }

    struct Harness {
        orchestrator: ChatOrchestrator,
        directory: Arc<RecordingDirectory>,
        store: Arc<ConversationStore>,
        _dir: TempDir,
    }

    fn harness(model: Arc<FakeModel>, directory: RecordingDirectory) -> Harness {
        let dir = TempDir::new().expect("tempdir");
        let store = Arc::new(ConversationStore::new(StoreConfig {
            data_dir: dir.path().to_path_buf(),
            ..StoreConfig::default()
        }));
        let directory = Arc::new(directory);
        let executor = ToolExecutor::new(
            Arc::new(InMemoryCampaignService::new()),
            Arc::clone(&directory) as Arc<dyn CreatorDirectory>,
            Arc::new(TracingMailer::new()),
        );
        let orchestrator = ChatOrchestrator::new(
            Arc::clone(&store),
            model,
            default_registry(),
            executor,
            ChatConfig::new("router", "summarizer"),
        );
        Harness {
            orchestrator,
            directory,
            store,
            _dir: dir,
        }
    }

    #[tokio::test]
    async fn plain_reply_persists_and_returns_text() {
        let model = FakeModel::scripted(vec![text_reply("Campaigns let brands hire creators.")]);
        let h = harness(Arc::clone(&model), RecordingDirectory::default());

        let owner = UserId::new();
        let output = h
            .orchestrator
            .handle_message(owner, "What is a campaign?", None)
            .await;

        assert!(!output.is_error);
        assert!(output.tool_calls.is_empty());
        assert_eq!(output.message, "Campaigns let brands hire creators.");

        let conversation = h
            .store
            .get_conversation(output.conversation_id)
            .await
            .expect("get")
            .expect("present");
        let roles: Vec<MessageRole> = conversation.messages.iter().map(|m| m.role).collect();
        assert_eq!(
            roles,
            vec![MessageRole::System, MessageRole::User, MessageRole::Assistant]
        );
    }

    #[tokio::test]
    async fn discovery_request_drives_one_tool_call() {
        let model = FakeModel::scripted(vec![
            tool_reply(vec![(
                "call_1",
                "discover_creators",
                r#"{"country":"IN","tier":"nano","category":"fashion","limit":5}"#,
            )]),
            text_reply("I found 3 nano fashion creators in India."),
        ]);
        let directory = RecordingDirectory {
            results: vec![
                nano_creator("@a"),
                nano_creator("@b"),
                nano_creator("@c"),
            ],
            ..RecordingDirectory::default()
        };
        let h = harness(Arc::clone(&model), directory);

        let output = h
            .orchestrator
            .handle_message(UserId::new(), "Find 5 fashion nano creators in India", None)
            .await;

        let queries = h.directory.queries.lock().expect("lock");
        assert_eq!(queries.len(), 1);
        assert_eq!(queries[0].country.as_deref(), Some("IN"));
        assert_eq!(queries[0].tier, Some(FollowerTier::Nano));
        assert_eq!(queries[0].category.as_deref(), Some("fashion"));
        assert!(queries[0].limit <= 5);

        assert!(!output.is_error);
        assert!(!output.message.is_empty());
        assert_eq!(output.tool_calls.len(), 1);
        assert!(output.tool_calls[0].result.success);
        assert_eq!(output.tool_calls[0].function_name, "discover_creators");
    }

    #[tokio::test]
    async fn second_pass_sees_only_the_tail_and_no_tools() {
        let model = FakeModel::scripted(vec![
            tool_reply(vec![("call_1", "list_campaigns", "{}")]),
            text_reply("You have no campaigns yet."),
        ]);
        let h = harness(Arc::clone(&model), RecordingDirectory::default());

        h.orchestrator
            .handle_message(UserId::new(), "List my campaigns", None)
            .await;

        let requests = model.requests.lock().expect("lock");
        assert_eq!(requests.len(), 2);

        let routing = &requests[0];
        assert_eq!(routing.model, "router");
        assert!(routing.tools.is_some());
        assert_eq!(routing.tool_choice.as_deref(), Some("auto"));

        let summary = &requests[1];
        assert_eq!(summary.model, "summarizer");
        assert!(summary.tools.is_none());
        assert!(summary.messages.len() <= 7);
        assert_eq!(summary.messages[0].role, "system");
        assert_eq!(
            summary.messages[0].content.as_deref(),
            Some(prompts::SUMMARY_PROMPT)
        );
    }

    #[tokio::test]
    async fn rate_limited_model_becomes_a_retryable_reply() {
        let model = FakeModel::scripted(vec![Err(LlmError::RateLimited {
            retry_after_secs: Some(10),
        })]);
        let h = harness(model, RecordingDirectory::default());

        let output = h
            .orchestrator
            .handle_message(UserId::new(), "Find creators", None)
            .await;

        assert!(output.is_error);
        assert_eq!(output.retryable, Some(true));
        assert!(!output.message.is_empty());

        // The failure is persisted, keeping the conversation coherent.
        let conversation = h
            .store
            .get_conversation(output.conversation_id)
            .await
            .expect("get")
            .expect("present");
        assert_eq!(
            conversation.last_message().expect("last").role,
            MessageRole::Assistant
        );
    }

    #[tokio::test]
    async fn unauthorized_model_is_not_retryable() {
        let model = FakeModel::scripted(vec![Err(LlmError::Unauthorized {
            reason: "bad key".to_string(),
        })]);
        let h = harness(model, RecordingDirectory::default());

        let output = h
            .orchestrator
            .handle_message(UserId::new(), "Hello", None)
            .await;

        assert!(output.is_error);
        assert_eq!(output.retryable, Some(false));
    }

    #[tokio::test]
    async fn malformed_arguments_fail_one_call_not_the_turn() {
        let model = FakeModel::scripted(vec![
            tool_reply(vec![
                ("call_bad", "discover_creators", "{not valid json"),
                ("call_ok", "list_campaigns", "{}"),
            ]),
            text_reply("One search failed, but your campaign list is empty."),
        ]);
        let h = harness(Arc::clone(&model), RecordingDirectory::default());

        let output = h
            .orchestrator
            .handle_message(UserId::new(), "Search and list", None)
            .await;

        assert!(!output.is_error);
        assert_eq!(output.tool_calls.len(), 2);

        let bad = &output.tool_calls[0];
        assert!(!bad.result.success);
        assert!(bad
            .result
            .error
            .as_deref()
            .is_some_and(|e| e.contains("not valid JSON")));

        let ok = &output.tool_calls[1];
        assert!(ok.result.success);

        // Every call got exactly one tool message, keyed by its id.
        let conversation = h
            .store
            .get_conversation(output.conversation_id)
            .await
            .expect("get")
            .expect("present");
        let tool_ids: Vec<&str> = conversation
            .messages
            .iter()
            .filter(|m| m.role == MessageRole::Tool)
            .filter_map(|m| m.tool_call_id.as_deref())
            .collect();
        assert_eq!(tool_ids, vec!["call_bad", "call_ok"]);
    }

    #[tokio::test]
    async fn stale_conversation_id_falls_back_to_a_live_one() {
        let model = FakeModel::scripted(vec![text_reply("Hi!")]);
        let h = harness(model, RecordingDirectory::default());

        let stale = ConversationId::new();
        let output = h
            .orchestrator
            .handle_message(UserId::new(), "Hello", Some(stale))
            .await;

        assert!(!output.is_error);
        assert_ne!(output.conversation_id, stale);
        assert!(h
            .store
            .get_conversation(output.conversation_id)
            .await
            .expect("get")
            .is_some());
    }

    #[tokio::test]
    async fn consecutive_turns_reuse_the_owner_conversation() {
        let model = FakeModel::scripted(vec![text_reply("First."), text_reply("Second.")]);
        let h = harness(model, RecordingDirectory::default());
        let owner = UserId::new();

        let first = h.orchestrator.handle_message(owner, "One", None).await;
        let second = h.orchestrator.handle_message(owner, "Two", None).await;

        assert_eq!(first.conversation_id, second.conversation_id);
        let conversation = h
            .store
            .get_conversation(second.conversation_id)
            .await
            .expect("get")
            .expect("present");
        // system + (user, assistant) x 2
        assert_eq!(conversation.message_count(), 5);
    }
}
