//! Projection from stored messages to the chat-completions wire format.
//!
//! Both model passes project through [`to_wire`], so a message can never
//! look different to the tool pass and the summary pass.

use megaphone_ai::{WireFunctionCall, WireMessage, WireToolCall};
use megaphone_conversation::{Message, ToolCall};
use serde_json::Value as JsonValue;

/// Projects one stored message into the wire format.
///
/// Roles map verbatim; assistant tool calls and tool-message correlation
/// ids are re-attached so the model sees the same structure it produced.
#[must_use]
pub fn to_wire(message: &Message) -> WireMessage {
    let tool_calls = if message.tool_calls.is_empty() {
        None
    } else {
        Some(message.tool_calls.iter().map(call_to_wire).collect())
    };

    WireMessage {
        role: message.role.as_str().to_string(),
        content: Some(message.content.clone()),
        tool_calls,
        tool_call_id: message.tool_call_id.clone(),
    }
}

fn call_to_wire(call: &ToolCall) -> WireToolCall {
    // Arguments stored as a JSON string are the model's original text,
    // preserved verbatim even when it was not valid JSON.
    let arguments = match &call.arguments {
        JsonValue::String(raw) => raw.clone(),
        value => value.to_string(),
    };

    WireToolCall {
        id: call.id.clone(),
        call_type: "function".to_string(),
        function: WireFunctionCall {
            name: call.name.clone(),
            arguments,
        },
    }
}
