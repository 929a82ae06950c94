//! Descriptors of the configuration decision points ("handlers").
//!
//! A handler describes one question the template asks: which values it
//! accepts, how its default is computed from earlier answers and under which
//! condition it applies at all.

use serde::Serialize;
use serde_json::Value;

use crate::config::ResolvedConfig;
use crate::constants::SYSTEM_DEPENDENCY;

/// Kind of value a handler accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HandlerType {
    /// Free text.
    Text,
    /// One of `options`.
    Select,
    /// An ordered set of `options`.
    #[serde(rename = "multiselect")]
    MultiSelect,
    /// A boolean.
    Confirm,
    /// Free text with a suggested default.
    Suggest,
}

impl std::fmt::Display for HandlerType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            HandlerType::Text => "text",
            HandlerType::Select => "select",
            HandlerType::MultiSelect => "multiselect",
            HandlerType::Confirm => "confirm",
            HandlerType::Suggest => "suggest",
        };
        write!(f, "{name}")
    }
}

/// Computes a default from the configuration resolved so far.
pub type DefaultRule = fn(&ResolvedConfig) -> Option<Value>;

/// Checks a free-text value, returning a message when it is rejected.
pub type TextValidator = fn(&str) -> Option<String>;

/// Condition under which a handler applies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dependency {
    /// Depends on runtime state; never evaluated against other handlers.
    System,
    /// Every listed handler must resolve to one of its accepted values.
    On(Vec<(&'static str, Vec<&'static str>)>),
}

impl Dependency {
    /// Returns true when every condition holds against `resolved`.
    ///
    /// Values are compared by their string form: booleans as `true`/`false`,
    /// lists match when any member is accepted.
    pub fn is_met(&self, resolved: &ResolvedConfig) -> bool {
        match self {
            Dependency::System => true,
            Dependency::On(conditions) => conditions.iter().all(|(id, accepted)| {
                resolved.get(id).is_some_and(|value| value_matches(value, accepted))
            }),
        }
    }

    /// Renders the condition for the schema document.
    pub fn to_value(&self) -> Value {
        let mut map = serde_json::Map::new();
        match self {
            Dependency::System => {
                map.insert(SYSTEM_DEPENDENCY.to_string(), Value::Array(Vec::new()));
            }
            Dependency::On(conditions) => {
                for (id, accepted) in conditions {
                    map.insert(id.to_string(), serde_json::json!(accepted));
                }
            }
        }
        Value::Object(map)
    }

    /// Human readable form used in warnings, e.g. `hosting_provider in [lagoon, acquia]`.
    pub fn describe(&self) -> String {
        match self {
            Dependency::System => SYSTEM_DEPENDENCY.to_string(),
            Dependency::On(conditions) => conditions
                .iter()
                .map(|(id, accepted)| format!("{id} in [{}]", accepted.join(", ")))
                .collect::<Vec<_>>()
                .join(" and "),
        }
    }
}

fn value_matches(value: &Value, accepted: &[&str]) -> bool {
    match value {
        Value::String(s) => accepted.contains(&s.as_str()),
        Value::Bool(b) => accepted.contains(&if *b { "true" } else { "false" }),
        Value::Number(n) => accepted.contains(&n.to_string().as_str()),
        Value::Array(items) => items.iter().any(|item| value_matches(item, accepted)),
        _ => false,
    }
}

/// Immutable definition of one decision point.
#[derive(Debug, Clone)]
pub struct HandlerDescriptor {
    pub id: &'static str,
    /// Alternate input key, usually an environment variable name.
    pub alt_key: String,
    pub kind: HandlerType,
    pub label: &'static str,
    pub description: &'static str,
    /// Accepted value to display label, in presentation order.
    pub options: Vec<(&'static str, &'static str)>,
    pub default: Option<DefaultRule>,
    pub required: bool,
    pub depends_on: Option<Dependency>,
    pub validate: Option<TextValidator>,
}

impl HandlerDescriptor {
    /// Starts a descriptor with `KILN_<ID>` as its alternate key.
    pub fn new(id: &'static str, kind: HandlerType) -> Self {
        Self {
            id,
            alt_key: format!("KILN_{}", id.to_uppercase()),
            kind,
            label: id,
            description: "",
            options: Vec::new(),
            default: None,
            required: false,
            depends_on: None,
            validate: None,
        }
    }

    pub fn label(mut self, label: &'static str) -> Self {
        self.label = label;
        self
    }

    pub fn description(mut self, description: &'static str) -> Self {
        self.description = description;
        self
    }

    pub fn alt_key<S: Into<String>>(mut self, alt_key: S) -> Self {
        self.alt_key = alt_key.into();
        self
    }

    pub fn options(mut self, options: &[(&'static str, &'static str)]) -> Self {
        self.options = options.to_vec();
        self
    }

    pub fn default_with(mut self, rule: DefaultRule) -> Self {
        self.default = Some(rule);
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn depends_on(mut self, conditions: &[(&'static str, &[&'static str])]) -> Self {
        self.depends_on = Some(Dependency::On(
            conditions.iter().map(|(id, accepted)| (*id, accepted.to_vec())).collect(),
        ));
        self
    }

    pub fn depends_on_system(mut self) -> Self {
        self.depends_on = Some(Dependency::System);
        self
    }

    pub fn validate_with(mut self, validator: TextValidator) -> Self {
        self.validate = Some(validator);
        self
    }

    /// Evaluates the default rule, if any, against the configuration so far.
    pub fn default_value(&self, resolved: &ResolvedConfig) -> Option<Value> {
        self.default.and_then(|rule| rule(resolved))
    }

    pub fn has_option(&self, value: &str) -> bool {
        self.options.iter().any(|(key, _)| *key == value)
    }

    pub fn option_keys(&self) -> Vec<&'static str> {
        self.options.iter().map(|(key, _)| *key).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alt_key_defaults_to_prefixed_uppercase_id() {
        let handler = HandlerDescriptor::new("hosting_provider", HandlerType::Select);
        assert_eq!(handler.alt_key, "KILN_HOSTING_PROVIDER");
        assert!(!handler.required);
    }

    #[test]
    fn test_dependency_matches_lists_and_booleans() {
        let mut resolved = ResolvedConfig::default();
        resolved.insert("services", serde_json::json!(["solr", "valkey"]));
        resolved.insert("preserve_docs", Value::Bool(false));

        let on_services = Dependency::On(vec![("services", vec!["solr"])]);
        assert!(on_services.is_met(&resolved));

        let on_docs = Dependency::On(vec![("preserve_docs", vec!["true"])]);
        assert!(!on_docs.is_met(&resolved));

        let on_missing = Dependency::On(vec![("hosting_provider", vec!["lagoon"])]);
        assert!(!on_missing.is_met(&resolved));
    }

    #[test]
    fn test_dependency_describe() {
        let dependency = Dependency::On(vec![("hosting_provider", vec!["lagoon", "acquia"])]);
        assert_eq!(dependency.describe(), "hosting_provider in [lagoon, acquia]");
    }
}
