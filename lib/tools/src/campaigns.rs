//! Executors for the campaign CRUD tools.
//!
//! These are thin validated pass-throughs to [`CampaignService`]; the only
//! policy they add is the explicit `confirm_delete` gate on deletion.

use crate::args;
use crate::error::ToolError;
use megaphone_campaign::{CampaignService, CampaignStatus, NewCampaign};
use serde_json::{json, Value as JsonValue};

/// Handles `create_campaign`.
///
/// # Errors
///
/// Returns `InvalidArguments` on missing fields and `Backend` on service
/// failure.
pub async fn create(
    service: &dyn CampaignService,
    arguments: &JsonValue,
) -> Result<JsonValue, ToolError> {
    let params = NewCampaign {
        name: args::require_str(arguments, "name")?,
        brand: args::require_str(arguments, "brand")?,
        description: args::optional_str(arguments, "description")?.unwrap_or_default(),
        budget_cents: args::optional_i64(arguments, "budget_cents")?.unwrap_or(0),
    };
    if params.budget_cents < 0 {
        return Err(ToolError::invalid("budget_cents must not be negative"));
    }

    let campaign = service.create(params).await.map_err(ToolError::backend)?;
    Ok(json!({ "campaign": campaign }))
}

/// Handles `list_campaigns`.
///
/// # Errors
///
/// Returns `InvalidArguments` on a bad status filter and `Backend` on
/// service failure.
pub async fn list(
    service: &dyn CampaignService,
    arguments: &JsonValue,
) -> Result<JsonValue, ToolError> {
    let status = args::optional_str(arguments, "status")?
        .map(|s| s.parse::<CampaignStatus>())
        .transpose()
        .map_err(|e| ToolError::invalid(e.to_string()))?;

    let campaigns = service.list(status).await.map_err(ToolError::backend)?;
    let count = campaigns.len();
    Ok(json!({ "campaigns": campaigns, "count": count }))
}

/// Handles `get_campaign_details`.
///
/// # Errors
///
/// Returns `InvalidArguments` on a bad id and `Backend` when the campaign
/// is missing or the service fails.
pub async fn get(
    service: &dyn CampaignService,
    arguments: &JsonValue,
) -> Result<JsonValue, ToolError> {
    let id = args::require_campaign_id(arguments, "campaign_id")?;
    let campaign = service.get(id).await.map_err(ToolError::backend)?;
    Ok(json!({ "campaign": campaign }))
}

/// Handles `add_creators_to_campaign`.
///
/// # Errors
///
/// Returns `InvalidArguments` on bad inputs and `Backend` on service
/// failure.
pub async fn add_creators(
    service: &dyn CampaignService,
    arguments: &JsonValue,
) -> Result<JsonValue, ToolError> {
    let id = args::require_campaign_id(arguments, "campaign_id")?;
    let handles = args::require_str_array(arguments, "handles")?;
    if handles.is_empty() {
        return Err(ToolError::invalid("handles must not be empty"));
    }

    let campaign = service
        .add_creators(id, handles)
        .await
        .map_err(ToolError::backend)?;
    let linked = campaign.creators.len();
    Ok(json!({ "campaign": campaign, "linked_creators": linked }))
}

/// Handles `update_campaign_status`.
///
/// # Errors
///
/// Returns `InvalidArguments` on bad inputs and `Backend` on service
/// failure.
pub async fn update_status(
    service: &dyn CampaignService,
    arguments: &JsonValue,
) -> Result<JsonValue, ToolError> {
    let id = args::require_campaign_id(arguments, "campaign_id")?;
    let status: CampaignStatus = args::require_str(arguments, "status")?
        .parse()
        .map_err(|e: megaphone_campaign::CampaignError| ToolError::invalid(e.to_string()))?;

    let campaign = service
        .update_status(id, status)
        .await
        .map_err(ToolError::backend)?;
    Ok(json!({ "campaign": campaign }))
}

/// Handles `delete_campaign`. Refuses to act unless `confirm_delete` is
/// literally `true`.
///
/// # Errors
///
/// Returns `InvalidArguments` when confirmation is absent and `Backend` on
/// service failure.
pub async fn delete(
    service: &dyn CampaignService,
    arguments: &JsonValue,
) -> Result<JsonValue, ToolError> {
    let id = args::require_campaign_id(arguments, "campaign_id")?;
    if !args::require_bool(arguments, "confirm_delete")? {
        return Err(ToolError::invalid(
            "deletion requires confirm_delete: true after the user confirms",
        ));
    }

    service.delete(id).await.map_err(ToolError::backend)?;
    tracing::info!(campaign_id = %id, "campaign deleted");
    Ok(json!({ "deleted": true, "campaign_id": id }))
}
