//! Declarative catalog of the tools the chat model may call.
//!
//! The registry is the single source of truth for what the model sees: the
//! orchestrator attaches [`ToolRegistry::to_wire_format`] to every tool-choice
//! pass, and the executor refuses anything that is not in it.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value as JsonValue};
use std::collections::HashMap;

/// Definition of a tool available to the model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// Unique tool name.
    pub name: String,
    /// Human-readable description the model routes on.
    pub description: String,
    /// JSON schema for the tool's arguments.
    pub parameters: JsonValue,
    /// Whether this tool gates a destructive or outward-facing action
    /// behind an explicit confirmation argument.
    pub requires_confirmation: bool,
}

impl ToolDefinition {
    /// Creates a new tool definition with an empty parameter schema.
    #[must_use]
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters: json!({"type": "object", "properties": {}}),
            requires_confirmation: false,
        }
    }

    /// Sets the parameter schema.
    #[must_use]
    pub fn with_parameters(mut self, parameters: JsonValue) -> Self {
        self.parameters = parameters;
        self
    }

    /// Marks this tool as confirmation-gated.
    #[must_use]
    pub fn requires_confirmation(mut self) -> Self {
        self.requires_confirmation = true;
        self
    }
}

/// Registry of available tools.
#[derive(Debug, Default)]
pub struct ToolRegistry {
    definitions: HashMap<String, ToolDefinition>,
}

impl ToolRegistry {
    /// Creates a new empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            definitions: HashMap::new(),
        }
    }

    /// Registers a tool definition, replacing any prior entry by that name.
    pub fn register(&mut self, definition: ToolDefinition) {
        self.definitions.insert(definition.name.clone(), definition);
    }

    /// Gets a tool definition by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&ToolDefinition> {
        self.definitions.get(name)
    }

    /// Returns all registered tool definitions.
    pub fn all(&self) -> impl Iterator<Item = &ToolDefinition> {
        self.definitions.values()
    }

    /// Returns the number of registered tools.
    #[must_use]
    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    /// Returns whether the registry is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    /// Converts definitions to the chat-completions `tools` array.
    #[must_use]
    pub fn to_wire_format(&self) -> Vec<JsonValue> {
        self.definitions
            .values()
            .map(|def| {
                json!({
                    "type": "function",
                    "function": {
                        "name": def.name,
                        "description": def.description,
                        "parameters": def.parameters,
                    }
                })
            })
            .collect()
    }
}

/// Builds the catalog the chat agent ships with.
#[must_use]
pub fn default_registry() -> ToolRegistry {
    let mut registry = ToolRegistry::new();

    registry.register(
        ToolDefinition::new(
            "discover_creators",
            "Search the creator directory for Instagram creators matching \
             audience filters. Returns creator profiles with follower counts \
             and engagement rates.",
        )
        .with_parameters(json!({
            "type": "object",
            "properties": {
                "country": {
                    "type": "string",
                    "description": "ISO country code, e.g. IN or US"
                },
                "tier": {
                    "type": "string",
                    "enum": ["nano", "micro", "mid", "macro", "mega"],
                    "description": "Follower tier"
                },
                "engagement": {
                    "type": "string",
                    "enum": ["low", "average", "high"],
                    "description": "Engagement-rate bucket"
                },
                "category": {
                    "type": "string",
                    "description": "Content category, e.g. fashion, fitness"
                },
                "gender": { "type": "string" },
                "language": { "type": "string" },
                "bio_keyword": {
                    "type": "string",
                    "description": "Keyword matched against creator bios"
                },
                "skip": {
                    "type": "integer",
                    "description": "Result offset for pagination"
                },
                "limit": {
                    "type": "integer",
                    "description": "Maximum results, 1 to 50"
                }
            }
        })),
    );

    registry.register(
        ToolDefinition::new(
            "create_campaign",
            "Create a new draft marketing campaign for a brand.",
        )
        .with_parameters(json!({
            "type": "object",
            "properties": {
                "name": { "type": "string", "description": "Campaign name" },
                "brand": { "type": "string", "description": "Brand running the campaign" },
                "description": { "type": "string", "description": "Campaign brief" },
                "budget_cents": {
                    "type": "integer",
                    "description": "Total budget in cents"
                }
            },
            "required": ["name", "brand"]
        })),
    );

    registry.register(
        ToolDefinition::new(
            "list_campaigns",
            "List campaigns, optionally filtered by lifecycle status.",
        )
        .with_parameters(json!({
            "type": "object",
            "properties": {
                "status": {
                    "type": "string",
                    "enum": ["draft", "active", "paused", "completed"]
                }
            }
        })),
    );

    registry.register(
        ToolDefinition::new(
            "get_campaign_details",
            "Get a campaign by id, including its linked creators and their \
             outreach states.",
        )
        .with_parameters(json!({
            "type": "object",
            "properties": {
                "campaign_id": { "type": "string" }
            },
            "required": ["campaign_id"]
        })),
    );

    registry.register(
        ToolDefinition::new(
            "add_creators_to_campaign",
            "Link creators to a campaign by handle. Already-linked handles \
             are skipped.",
        )
        .with_parameters(json!({
            "type": "object",
            "properties": {
                "campaign_id": { "type": "string" },
                "handles": {
                    "type": "array",
                    "items": { "type": "string" },
                    "description": "Creator handles to link"
                }
            },
            "required": ["campaign_id", "handles"]
        })),
    );

    registry.register(
        ToolDefinition::new(
            "update_campaign_status",
            "Move a campaign to a new lifecycle status.",
        )
        .with_parameters(json!({
            "type": "object",
            "properties": {
                "campaign_id": { "type": "string" },
                "status": {
                    "type": "string",
                    "enum": ["draft", "active", "paused", "completed"]
                }
            },
            "required": ["campaign_id", "status"]
        })),
    );

    registry.register(
        ToolDefinition::new(
            "delete_campaign",
            "Permanently delete a campaign. Only call this after the user has \
             explicitly confirmed the deletion; confirm_delete must be true.",
        )
        .with_parameters(json!({
            "type": "object",
            "properties": {
                "campaign_id": { "type": "string" },
                "confirm_delete": {
                    "type": "boolean",
                    "description": "Must be true; set only after the user confirms"
                }
            },
            "required": ["campaign_id", "confirm_delete"]
        }))
        .requires_confirmation(),
    );

    registry.register(
        ToolDefinition::new(
            "bulk_outreach",
            "Send an outreach email to every creator linked to a campaign. \
             Call first with confirm_template true to get a preview for the \
             user; only after the user approves the preview, call again with \
             confirm_template false to actually send.",
        )
        .with_parameters(json!({
            "type": "object",
            "properties": {
                "campaign_id": { "type": "string" },
                "subject": { "type": "string", "description": "Email subject line" },
                "template": {
                    "type": "string",
                    "description": "Email body; {{handle}} is replaced per creator"
                },
                "confirm_template": {
                    "type": "boolean",
                    "description": "true to preview without sending, false to send"
                }
            },
            "required": ["campaign_id", "subject", "template", "confirm_template"]
        }))
        .requires_confirmation(),
    );

    registry
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn definition_builder() {
        let tool = ToolDefinition::new("discover_creators", "Search creators")
            .with_parameters(json!({
                "type": "object",
                "properties": { "country": { "type": "string" } }
            }))
            .requires_confirmation();

        assert_eq!(tool.name, "discover_creators");
        assert!(tool.requires_confirmation);
    }

    #[test]
    fn registry_operations() {
        let mut registry = ToolRegistry::new();
        registry.register(ToolDefinition::new("a", "First"));
        registry.register(ToolDefinition::new("b", "Second"));

        assert_eq!(registry.len(), 2);
        assert!(registry.get("a").is_some());
        assert!(registry.get("missing").is_none());
        assert!(!registry.is_empty());
    }

    #[test]
    fn wire_format_wraps_functions() {
        let mut registry = ToolRegistry::new();
        registry.register(ToolDefinition::new("list_campaigns", "List campaigns"));

        let wire = registry.to_wire_format();
        assert_eq!(wire.len(), 1);
        assert_eq!(wire[0]["type"], "function");
        assert_eq!(wire[0]["function"]["name"], "list_campaigns");
        assert!(wire[0]["function"]["parameters"].is_object());
    }

    #[test]
    fn default_registry_declares_full_catalog() {
        let registry = default_registry();
        for name in [
            "discover_creators",
            "create_campaign",
            "list_campaigns",
            "get_campaign_details",
            "add_creators_to_campaign",
            "update_campaign_status",
            "delete_campaign",
            "bulk_outreach",
        ] {
            assert!(registry.get(name).is_some(), "missing tool: {name}");
        }
        assert_eq!(registry.len(), 8);
    }

    #[test]
    fn destructive_tools_are_confirmation_gated() {
        let registry = default_registry();
        assert!(registry.get("delete_campaign").is_some_and(|t| t.requires_confirmation));
        assert!(registry.get("bulk_outreach").is_some_and(|t| t.requires_confirmation));
        assert!(registry.get("list_campaigns").is_some_and(|t| !t.requires_confirmation));
    }
}
