//! Chat orchestration for the megaphone campaign agent.
//!
//! One turn of conversation runs through [`ChatOrchestrator::handle_message`]:
//! resolve the caller's conversation, let the model route to tools, execute
//! whatever it asked for, then let a second model pass phrase the results.
//! The orchestrator never surfaces an error to its caller; every failure
//! mode becomes a readable reply with `is_error` and `retryable` flags.

pub mod orchestrator;
pub mod projection;
pub mod prompts;

pub use orchestrator::{ChatConfig, ChatOrchestrator, ChatTurnOutput, ToolCallResult};
pub use projection::to_wire;
