//! Language-neutral description of the registry for external tooling.

use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;

use crate::handler::HandlerType;
use crate::registry::{defaults_for_empty_input, Registry};

/// One handler as seen by a programmatic caller.
#[derive(Debug, Clone, Serialize)]
pub struct PromptSchema {
    pub id: String,
    pub env: String,
    #[serde(rename = "type")]
    pub kind: HandlerType,
    pub label: String,
    pub description: String,
    /// Accepted value to label; empty for types without options.
    pub options: IndexMap<String, String>,
    /// Default under an empty input.
    pub default: Option<Value>,
    pub required: bool,
    pub depends_on: Option<Value>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Schema {
    pub prompts: Vec<PromptSchema>,
}

/// Renders every handler in declaration order.
pub fn render_schema(registry: &Registry) -> Schema {
    let defaults = defaults_for_empty_input(registry);

    let prompts = registry
        .handlers()
        .iter()
        .zip(defaults)
        .map(|(handler, default)| PromptSchema {
            id: handler.id.to_string(),
            env: handler.alt_key.clone(),
            kind: handler.kind,
            label: handler.label.to_string(),
            description: handler.description.to_string(),
            options: handler
                .options
                .iter()
                .map(|(key, label)| (key.to_string(), label.to_string()))
                .collect(),
            default,
            required: handler.required,
            depends_on: handler.depends_on.as_ref().map(|d| d.to_value()),
        })
        .collect();

    Schema { prompts }
}
