//! Centralized server configuration.
//!
//! Strongly-typed configuration loaded via the `config` crate from
//! environment variables, with a `__` separator for nesting
//! (`MODEL__API_KEY`, `DISCOVERY__BASE_URL`).

use serde::Deserialize;
use std::path::PathBuf;

/// Server configuration.
#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    /// Address the HTTP server binds to.
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// Directory for conversation snapshots.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Interval between expired-conversation sweeps, in seconds.
    #[serde(default = "default_sweep_interval_seconds")]
    pub sweep_interval_seconds: u64,

    /// Chat-completions model configuration.
    pub model: ModelConfig,

    /// Creator discovery API configuration.
    pub discovery: DiscoveryConfig,
}

/// Chat-completions model configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ModelConfig {
    /// Base URL of the chat-completions API.
    #[serde(default = "default_model_base_url")]
    pub base_url: String,

    /// Bearer token for the API. Optional for local model servers.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Model for the tool-routing pass.
    #[serde(default = "default_model_name")]
    pub tool_model: String,

    /// Model for the summarization pass. May differ from the routing model.
    #[serde(default = "default_model_name")]
    pub summary_model: String,
}

/// Creator discovery API configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DiscoveryConfig {
    /// Base URL of the discovery search API.
    pub base_url: String,

    /// Bearer token for the discovery API.
    pub api_key: String,
}

fn default_bind_addr() -> String {
    "127.0.0.1:8080".to_string()
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./data")
}

fn default_sweep_interval_seconds() -> u64 {
    3600
}

fn default_model_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_model_name() -> String {
    "gpt-4o-mini".to_string()
}

impl ServerConfig {
    /// Loads configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if required configuration is missing or invalid.
    pub fn from_env() -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(
                config::Environment::default()
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }
}
