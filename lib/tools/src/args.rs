//! Validation and coercion of model-supplied tool arguments.
//!
//! The model's argument JSON is untrusted: it may be malformed, omit
//! required fields, or carry the wrong types. Every helper here returns a
//! [`ToolError`] with a message the model can act on instead of panicking.

use crate::error::ToolError;
use megaphone_core::CampaignId;
use serde_json::Value as JsonValue;

/// Default page size when the model omits `limit`.
pub const DEFAULT_LIMIT: usize = 12;
/// Largest page the discovery API is asked for.
pub const MAX_LIMIT: usize = 50;

/// Parses the raw argument string into a JSON object.
///
/// # Errors
///
/// Returns `InvalidArguments` when the payload is not valid JSON or not an
/// object.
pub fn parse_object(raw: &str) -> Result<JsonValue, ToolError> {
    let value: JsonValue = serde_json::from_str(raw)
        .map_err(|e| ToolError::invalid(format!("arguments are not valid JSON: {e}")))?;
    if !value.is_object() {
        return Err(ToolError::invalid("arguments must be a JSON object"));
    }
    Ok(value)
}

/// Extracts a required string field.
///
/// # Errors
///
/// Returns `InvalidArguments` when the field is missing, null, or not a
/// string.
pub fn require_str(args: &JsonValue, key: &str) -> Result<String, ToolError> {
    optional_str(args, key)?
        .ok_or_else(|| ToolError::invalid(format!("missing required field: {key}")))
}

/// Extracts an optional string field; absent and null both read as `None`.
///
/// # Errors
///
/// Returns `InvalidArguments` when the field is present but not a string.
pub fn optional_str(args: &JsonValue, key: &str) -> Result<Option<String>, ToolError> {
    match args.get(key) {
        None | Some(JsonValue::Null) => Ok(None),
        Some(JsonValue::String(s)) if s.trim().is_empty() => Ok(None),
        Some(JsonValue::String(s)) => Ok(Some(s.clone())),
        Some(other) => Err(ToolError::invalid(format!(
            "field {key} must be a string, got {other}"
        ))),
    }
}

/// Extracts a required boolean field.
///
/// # Errors
///
/// Returns `InvalidArguments` when the field is missing or not a boolean.
pub fn require_bool(args: &JsonValue, key: &str) -> Result<bool, ToolError> {
    match args.get(key) {
        Some(JsonValue::Bool(b)) => Ok(*b),
        None | Some(JsonValue::Null) => {
            Err(ToolError::invalid(format!("missing required field: {key}")))
        }
        Some(other) => Err(ToolError::invalid(format!(
            "field {key} must be a boolean, got {other}"
        ))),
    }
}

/// Extracts a required array of non-empty strings.
///
/// # Errors
///
/// Returns `InvalidArguments` when the field is missing, not an array, or
/// contains non-string entries.
pub fn require_str_array(args: &JsonValue, key: &str) -> Result<Vec<String>, ToolError> {
    let Some(value) = args.get(key) else {
        return Err(ToolError::invalid(format!("missing required field: {key}")));
    };
    let Some(items) = value.as_array() else {
        return Err(ToolError::invalid(format!(
            "field {key} must be an array of strings"
        )));
    };
    let mut out = Vec::with_capacity(items.len());
    for item in items {
        match item.as_str() {
            Some(s) if !s.trim().is_empty() => out.push(s.to_string()),
            _ => {
                return Err(ToolError::invalid(format!(
                    "field {key} must contain only non-empty strings"
                )));
            }
        }
    }
    Ok(out)
}

/// Extracts an optional integer field.
///
/// Models sometimes quote numbers, so numeric strings are accepted; anything
/// else non-numeric is rejected.
///
/// # Errors
///
/// Returns `InvalidArguments` when the field is present but not numeric.
pub fn optional_u64(args: &JsonValue, key: &str) -> Result<Option<u64>, ToolError> {
    match args.get(key) {
        None | Some(JsonValue::Null) => Ok(None),
        Some(JsonValue::Number(n)) => n.as_u64().map(Some).ok_or_else(|| {
            ToolError::invalid(format!("field {key} must be a non-negative integer"))
        }),
        Some(JsonValue::String(s)) => s.trim().parse::<u64>().map(Some).map_err(|_| {
            ToolError::invalid(format!("field {key} must be a number, got \"{s}\""))
        }),
        Some(other) => Err(ToolError::invalid(format!(
            "field {key} must be a number, got {other}"
        ))),
    }
}

/// Extracts an optional signed integer field with the same string coercion
/// as [`optional_u64`].
///
/// # Errors
///
/// Returns `InvalidArguments` when the field is present but not numeric.
pub fn optional_i64(args: &JsonValue, key: &str) -> Result<Option<i64>, ToolError> {
    match args.get(key) {
        None | Some(JsonValue::Null) => Ok(None),
        Some(JsonValue::Number(n)) => n
            .as_i64()
            .map(Some)
            .ok_or_else(|| ToolError::invalid(format!("field {key} must be an integer"))),
        Some(JsonValue::String(s)) => s.trim().parse::<i64>().map(Some).map_err(|_| {
            ToolError::invalid(format!("field {key} must be a number, got \"{s}\""))
        }),
        Some(other) => Err(ToolError::invalid(format!(
            "field {key} must be a number, got {other}"
        ))),
    }
}

/// Resolves the page size: defaults to [`DEFAULT_LIMIT`], clamps to
/// `[1, MAX_LIMIT]`.
///
/// # Errors
///
/// Returns `InvalidArguments` when `limit` is present but not numeric.
pub fn parse_limit(args: &JsonValue) -> Result<usize, ToolError> {
    let Some(raw) = optional_u64(args, "limit")? else {
        return Ok(DEFAULT_LIMIT);
    };
    Ok((raw as usize).clamp(1, MAX_LIMIT))
}

/// Resolves the page offset, defaulting to zero.
///
/// # Errors
///
/// Returns `InvalidArguments` when `skip` is present but not numeric.
pub fn parse_skip(args: &JsonValue) -> Result<usize, ToolError> {
    Ok(optional_u64(args, "skip")?.unwrap_or(0) as usize)
}

/// Extracts and parses a required campaign id.
///
/// # Errors
///
/// Returns `InvalidArguments` when the field is missing or not a valid id.
pub fn require_campaign_id(args: &JsonValue, key: &str) -> Result<CampaignId, ToolError> {
    let raw = require_str(args, key)?;
    raw.parse()
        .map_err(|e| ToolError::invalid(format!("field {key}: {e}")))
}
