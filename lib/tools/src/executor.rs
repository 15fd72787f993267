//! Dispatch from model-issued tool calls to their handlers.

use crate::error::ToolError;
use crate::outcome::ToolOutcome;
use crate::{args, campaigns, discover, outreach};
use megaphone_campaign::{CampaignService, CreatorDirectory, Mailer};
use serde_json::Value as JsonValue;
use std::sync::Arc;

/// Executes tool calls against the backend collaborators.
///
/// `execute` is infallible by contract: whatever the model sends, the
/// caller gets a [`ToolOutcome`] back.
#[derive(Clone)]
pub struct ToolExecutor {
    campaigns: Arc<dyn CampaignService>,
    directory: Arc<dyn CreatorDirectory>,
    mailer: Arc<dyn Mailer>,
}

impl ToolExecutor {
    /// Creates an executor over the given collaborators.
    #[must_use]
    pub fn new(
        campaigns: Arc<dyn CampaignService>,
        directory: Arc<dyn CreatorDirectory>,
        mailer: Arc<dyn Mailer>,
    ) -> Self {
        Self {
            campaigns,
            directory,
            mailer,
        }
    }

    /// Executes one tool call. `raw_arguments` is the model's argument
    /// string, taken as untrusted input; malformed JSON becomes a failed
    /// outcome, not an error.
    pub async fn execute(&self, name: &str, raw_arguments: &str) -> ToolOutcome {
        match self.dispatch(name, raw_arguments).await {
            Ok(data) => ToolOutcome::success(data),
            Err(err) => {
                tracing::warn!(tool = name, error = %err, "tool call failed");
                ToolOutcome::from(err)
            }
        }
    }

    async fn dispatch(&self, name: &str, raw_arguments: &str) -> Result<JsonValue, ToolError> {
        let arguments = args::parse_object(raw_arguments)?;
        match name {
            "discover_creators" => discover::run(self.directory.as_ref(), &arguments).await,
            "create_campaign" => campaigns::create(self.campaigns.as_ref(), &arguments).await,
            "list_campaigns" => campaigns::list(self.campaigns.as_ref(), &arguments).await,
            "get_campaign_details" => campaigns::get(self.campaigns.as_ref(), &arguments).await,
            "add_creators_to_campaign" => {
                campaigns::add_creators(self.campaigns.as_ref(), &arguments).await
            }
            "update_campaign_status" => {
                campaigns::update_status(self.campaigns.as_ref(), &arguments).await
            }
            "delete_campaign" => campaigns::delete(self.campaigns.as_ref(), &arguments).await,
            "bulk_outreach" => {
                outreach::run(self.campaigns.as_ref(), self.mailer.as_ref(), &arguments).await
            }
            other => Err(ToolError::Unknown {
                name: other.to_string(),
            }),
        }
    }
}
