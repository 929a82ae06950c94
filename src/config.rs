//! Configuration values for Kiln.
//! This module loads the raw answers supplied by a caller (inline JSON, JSON or
//! YAML files, environment variables) and holds the resolved configuration
//! passed to every processor.

use indexmap::IndexMap;
use log::debug;
use serde::Serialize;
use serde_json::Value;
use std::path::Path;

use crate::error::{Error, Result};
use crate::handler::HandlerType;
use crate::registry::Registry;

/// Raw, unvalidated answers keyed by handler id, alternate key or anything else.
pub type RawInput = IndexMap<String, Value>;

/// Concrete values keyed by handler id, in resolution order.
///
/// Built once per run by the resolver and only read afterwards.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ResolvedConfig(IndexMap<String, Value>);

impl ResolvedConfig {
    pub(crate) fn insert<K: Into<String>>(&mut self, key: K, value: Value) {
        self.0.insert(key.into(), value);
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Value::as_str)
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.get(key).and_then(Value::as_bool)
    }

    /// Members of a list value; empty when the key is absent.
    pub fn get_list(&self, key: &str) -> Vec<&str> {
        self.get(key)
            .and_then(Value::as_array)
            .map(|items| items.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default()
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.0.keys()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }
}

impl FromIterator<(String, Value)> for ResolvedConfig {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Parses a JSON or YAML document into raw input. The document must be a mapping.
pub fn parse_config_input(content: &str, yaml: bool) -> Result<RawInput> {
    let value: Value = if yaml {
        serde_yaml::from_str(content)?
    } else {
        serde_json::from_str(content)?
    };

    match value {
        Value::Object(map) => Ok(map.into_iter().collect()),
        Value::Null => Ok(RawInput::new()),
        other => Err(Error::ConfigError(format!(
            "expected a mapping of answers, got {}",
            json_kind(&other)
        ))),
    }
}

/// Loads raw input from the `--config` argument.
///
/// An argument starting with `{` is parsed as inline JSON, anything else is
/// treated as a path. Files ending in `.yml` or `.yaml` are parsed as YAML.
pub fn load_config_input(config: &str) -> Result<RawInput> {
    let trimmed = config.trim_start();
    if trimmed.starts_with('{') {
        return parse_config_input(trimmed, false);
    }

    let path = Path::new(config);
    if !path.is_file() {
        return Err(Error::ConfigError(format!(
            "'{config}' is neither inline JSON nor a readable file"
        )));
    }

    debug!("Loading configuration from {}", path.display());
    let content = std::fs::read_to_string(path)?;
    let yaml = matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yml") | Some("yaml")
    );
    parse_config_input(&content, yaml)
}

/// Collects answers from environment variables named after handler alternate keys.
///
/// Values are coerced from strings according to the handler type. Variables
/// that cannot be coerced are passed on as strings so the resolver reports them.
pub fn input_from_env<I, K, V>(registry: &Registry, vars: I) -> RawInput
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: AsRef<str>,
{
    let vars: IndexMap<String, String> = vars
        .into_iter()
        .map(|(k, v)| (k.as_ref().to_string(), v.as_ref().to_string()))
        .collect();

    let mut input = RawInput::new();
    for handler in registry.handlers() {
        if let Some(raw) = vars.get(&handler.alt_key) {
            debug!("Using {} from the environment for '{}'", handler.alt_key, handler.id);
            input.insert(handler.id.to_string(), coerce_env_value(handler.kind, raw));
        }
    }
    input
}

/// Merges `fallback` under `primary`. A handler supplied in `primary` under
/// either of its keys shadows the same handler in `fallback`.
pub fn merge_input(registry: &Registry, primary: RawInput, fallback: RawInput) -> RawInput {
    let mut merged = primary;
    for (key, value) in fallback {
        let shadowed = match registry.lookup_key(&key) {
            Some(handler) => {
                merged.contains_key(handler.id) || merged.contains_key(&handler.alt_key)
            }
            None => merged.contains_key(&key),
        };
        if !shadowed {
            merged.insert(key, value);
        }
    }
    merged
}

fn coerce_env_value(kind: HandlerType, raw: &str) -> Value {
    match kind {
        HandlerType::Confirm => match raw.trim().to_lowercase().as_str() {
            "1" | "true" | "yes" | "y" => Value::Bool(true),
            "0" | "false" | "no" | "n" | "" => Value::Bool(false),
            _ => Value::String(raw.to_string()),
        },
        HandlerType::MultiSelect => Value::Array(
            raw.split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(|s| Value::String(s.to_string()))
                .collect(),
        ),
        _ => Value::String(raw.to_string()),
    }
}

pub(crate) fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "a mapping",
    }
}
