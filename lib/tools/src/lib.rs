//! Tool catalog and executors for the megaphone chat agent.
//!
//! This crate provides:
//!
//! - **`ToolRegistry`**: declarative catalog of the operations the model may
//!   call, convertible to the chat-completions `tools` wire format
//! - **`ToolExecutor`**: dispatches a model-issued tool call to its handler,
//!   treating the model's argument JSON as untrusted input
//! - **`ToolOutcome`**: the uniform success/data/error envelope every
//!   handler produces
//!
//! Executors never panic on bad input and never propagate errors past their
//! boundary; every failure becomes a structured [`ToolOutcome`] the model
//! can read back.

pub mod args;
pub mod campaigns;
pub mod discover;
pub mod error;
pub mod executor;
pub mod outcome;
pub mod outreach;
pub mod registry;

pub use error::ToolError;
pub use executor::ToolExecutor;
pub use outcome::ToolOutcome;
pub use registry::{default_registry, ToolDefinition, ToolRegistry};
