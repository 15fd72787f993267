//! Executor for the `discover_creators` tool.

use crate::args;
use crate::error::ToolError;
use megaphone_campaign::{CreatorDirectory, DiscoveryQuery, EngagementBucket, FollowerTier};
use serde_json::{json, Value as JsonValue};

/// Builds a discovery query from model arguments and runs the search.
///
/// The platform is fixed to Instagram by the directory client; the model
/// cannot select another platform.
///
/// # Errors
///
/// Returns `InvalidArguments` on bad filters and `Backend` when the
/// directory call fails.
pub async fn run(
    directory: &dyn CreatorDirectory,
    arguments: &JsonValue,
) -> Result<JsonValue, ToolError> {
    let query = build_query(arguments)?;
    let creators = directory
        .search(&query)
        .await
        .map_err(ToolError::backend)?;

    let count = creators.len();
    tracing::info!(count, "creator discovery completed");
    Ok(json!({
        "creators": creators,
        "count": count,
        "skip": query.skip,
        "limit": query.limit,
    }))
}

fn build_query(arguments: &JsonValue) -> Result<DiscoveryQuery, ToolError> {
    let tier = args::optional_str(arguments, "tier")?
        .map(|s| s.parse::<FollowerTier>())
        .transpose()
        .map_err(|e| ToolError::invalid(e.to_string()))?;
    let engagement = args::optional_str(arguments, "engagement")?
        .map(|s| s.parse::<EngagementBucket>())
        .transpose()
        .map_err(|e| ToolError::invalid(e.to_string()))?;

    Ok(DiscoveryQuery {
        country: args::optional_str(arguments, "country")?.map(|c| c.to_uppercase()),
        tier,
        engagement,
        category: args::optional_str(arguments, "category")?,
        gender: args::optional_str(arguments, "gender")?,
        language: args::optional_str(arguments, "language")?,
        bio_keyword: args::optional_str(arguments, "bio_keyword")?,
        skip: args::parse_skip(arguments)?,
        limit: args::parse_limit(arguments)?,
    })
}
