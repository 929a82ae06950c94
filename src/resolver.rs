//! Resolution of raw answers into a validated configuration.
//!
//! Every handler is evaluated, in registry order, and every problem is
//! collected. Nothing here touches the filesystem, so a caller can always ask
//! "would this configuration work" without side effects.

use indexmap::IndexMap;
use log::{debug, warn};
use serde::Serialize;
use serde_json::Value;

use crate::config::{json_kind, RawInput, ResolvedConfig};
use crate::handler::{Dependency, HandlerDescriptor, HandlerType};
use crate::registry::Registry;

/// A problem attached to one handler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Issue {
    #[serde(rename = "prompt")]
    pub handler: String,
    pub message: String,
}

impl Issue {
    fn new<S: Into<String>>(handler: &str, message: S) -> Self {
        Self { handler: handler.to_string(), message: message.into() }
    }
}

impl std::fmt::Display for Issue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.handler, self.message)
    }
}

/// Outcome of a resolution pass.
///
/// `resolved` holds what would be used if the run proceeded, even when
/// `valid` is false.
#[derive(Debug, Clone, Serialize)]
pub struct ValidationResult {
    pub valid: bool,
    pub errors: Vec<Issue>,
    pub warnings: Vec<Issue>,
    pub resolved: ResolvedConfig,
}

impl ValidationResult {
    pub fn has_issues_for(&self, handler: &str) -> bool {
        self.errors.iter().chain(&self.warnings).any(|i| i.handler == handler)
    }
}

/// Checks a supplied value against the handler type, returning the normalized value.
type TypeValidator = fn(&HandlerDescriptor, &Value) -> Result<Value, String>;

/// Validation dispatch table keyed by handler type.
const TYPE_VALIDATORS: [(HandlerType, TypeValidator); 5] = [
    (HandlerType::Text, validate_text),
    (HandlerType::Select, validate_select),
    (HandlerType::MultiSelect, validate_multiselect),
    (HandlerType::Confirm, validate_confirm),
    (HandlerType::Suggest, validate_text),
];

fn type_validator(kind: HandlerType) -> TypeValidator {
    TYPE_VALIDATORS
        .iter()
        .find(|(k, _)| *k == kind)
        .map(|(_, validator)| *validator)
        .unwrap_or(validate_text)
}

fn validate_text(handler: &HandlerDescriptor, value: &Value) -> Result<Value, String> {
    let Some(text) = value.as_str() else {
        return Err(format!("Expected a string value for '{}', got {}", handler.id, json_kind(value)));
    };
    match handler.validate.and_then(|validate| validate(text)) {
        Some(message) => Err(message),
        None => Ok(value.clone()),
    }
}

fn validate_select(handler: &HandlerDescriptor, value: &Value) -> Result<Value, String> {
    match value.as_str() {
        Some(choice) if handler.has_option(choice) => Ok(value.clone()),
        _ => Err(format!(
            "Invalid value {} for '{}'. Valid values: {}",
            value,
            handler.id,
            handler.option_keys().join(", ")
        )),
    }
}

fn validate_multiselect(handler: &HandlerDescriptor, value: &Value) -> Result<Value, String> {
    let Some(items) = value.as_array() else {
        return Err(format!("Expected a list of values for '{}', got {}", handler.id, json_kind(value)));
    };

    let mut selected: Vec<Value> = Vec::with_capacity(items.len());
    for item in items {
        match item.as_str() {
            Some(choice) if handler.has_option(choice) => {
                if !selected.contains(item) {
                    selected.push(item.clone());
                }
            }
            _ => {
                return Err(format!(
                    "Invalid value {} for '{}'. Valid values: {}",
                    item,
                    handler.id,
                    handler.option_keys().join(", ")
                ))
            }
        }
    }
    Ok(Value::Array(selected))
}

fn validate_confirm(handler: &HandlerDescriptor, value: &Value) -> Result<Value, String> {
    if value.is_boolean() {
        Ok(value.clone())
    } else {
        Err(format!("Expected a boolean value for '{}', got {}", handler.id, json_kind(value)))
    }
}

/// Maps input keys onto handler ids. An id wins over the alternate key of the
/// same handler; unknown keys are returned separately, untouched.
fn normalize_input(raw: &RawInput, registry: &Registry) -> (IndexMap<String, Value>, IndexMap<String, Value>) {
    let mut known = IndexMap::new();
    let mut unknown = IndexMap::new();

    for (key, value) in raw {
        match registry.lookup_key(key) {
            Some(handler) if handler.id == key => {
                known.insert(handler.id.to_string(), value.clone());
            }
            Some(handler) => {
                if !raw.contains_key(handler.id) {
                    known.insert(handler.id.to_string(), value.clone());
                }
            }
            None => {
                unknown.insert(key.clone(), value.clone());
            }
        }
    }

    (known, unknown)
}

/// Resolves raw answers against the registry.
///
/// Per handler: check the dependency condition, then fall back to the
/// default rule or validate the supplied value. Problems are accumulated;
/// the pass never stops early.
pub fn resolve(raw: &RawInput, registry: &Registry) -> ValidationResult {
    let (input, passthrough) = normalize_input(raw, registry);

    let mut resolved = ResolvedConfig::default();
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    for handler in registry.handlers() {
        let supplied = input.get(handler.id).filter(|v| !v.is_null());

        match &handler.depends_on {
            Some(Dependency::System) => {
                if let Some(value) = supplied {
                    resolved.insert(handler.id, value.clone());
                    continue;
                }
            }
            Some(dependency) if !dependency.is_met(&resolved) => {
                if supplied.is_some() {
                    warn!("Ignoring value for '{}': requires {}", handler.id, dependency.describe());
                    warnings.push(Issue::new(
                        handler.id,
                        format!(
                            "Value will be ignored - dependency not met (requires {})",
                            dependency.describe()
                        ),
                    ));
                }
                continue;
            }
            _ => {}
        }

        match supplied {
            None => match handler.default_value(&resolved) {
                Some(default) => {
                    debug!("Using default for '{}': {}", handler.id, default);
                    resolved.insert(handler.id, default);
                }
                None if handler.required => {
                    errors.push(Issue::new(
                        handler.id,
                        format!("Missing required value for '{}'", handler.id),
                    ));
                }
                None => {}
            },
            Some(value) => match type_validator(handler.kind)(handler, value) {
                Ok(normalized) => resolved.insert(handler.id, normalized),
                Err(message) => errors.push(Issue::new(handler.id, message)),
            },
        }
    }

    for (key, value) in passthrough {
        debug!("Passing through unknown key '{}'", key);
        resolved.insert(key, value);
    }

    ValidationResult { valid: errors.is_empty(), errors, warnings, resolved }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_type_validator_table_covers_every_type() {
        for kind in [
            HandlerType::Text,
            HandlerType::Select,
            HandlerType::MultiSelect,
            HandlerType::Confirm,
            HandlerType::Suggest,
        ] {
            assert!(TYPE_VALIDATORS.iter().any(|(k, _)| *k == kind), "{kind} has no validator");
        }
    }

    #[test]
    fn test_multiselect_removes_duplicates_keeping_order() {
        let handler = HandlerDescriptor::new("services", HandlerType::MultiSelect)
            .options(&[("solr", "Solr"), ("valkey", "Valkey")]);
        let value = validate_multiselect(&handler, &json!(["valkey", "solr", "valkey"])).unwrap();
        assert_eq!(value, json!(["valkey", "solr"]));
    }
}
