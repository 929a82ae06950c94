//! User input and interaction handling.
//!
//! Interactive answers are gathered handler by handler and then go through the
//! same resolver as answers supplied with `--config`.

use dialoguer::{Confirm, Input, MultiSelect, Select};
use serde_json::Value;

use crate::config::RawInput;
use crate::error::{Error, Result};
use crate::handler::{HandlerDescriptor, HandlerType};
use crate::registry::Registry;
use crate::resolver::resolve;

/// Asks a single question for a handler.
pub trait Prompter {
    /// Returns the answer for `handler`, offering `default` when there is one.
    fn ask(&self, handler: &HandlerDescriptor, default: Option<&Value>) -> Result<Value>;
}

/// Terminal prompts backed by dialoguer.
#[derive(Debug, Default)]
pub struct DialoguerPrompter;

impl DialoguerPrompter {
    pub fn new() -> Self {
        Self
    }
}

fn prompt_error(e: dialoguer::Error) -> Error {
    Error::PromptError(e.to_string())
}

impl Prompter for DialoguerPrompter {
    fn ask(&self, handler: &HandlerDescriptor, default: Option<&Value>) -> Result<Value> {
        let labels: Vec<String> = handler.options.iter().map(|(_, label)| label.to_string()).collect();

        match handler.kind {
            HandlerType::Select => {
                let position = default
                    .and_then(Value::as_str)
                    .and_then(|d| handler.options.iter().position(|(key, _)| *key == d))
                    .unwrap_or(0);
                let selection = Select::new()
                    .with_prompt(handler.label)
                    .items(&labels)
                    .default(position)
                    .interact()
                    .map_err(prompt_error)?;
                Ok(Value::String(handler.options[selection].0.to_string()))
            }
            HandlerType::MultiSelect => {
                let preselected: Vec<&str> = default
                    .and_then(Value::as_array)
                    .map(|items| items.iter().filter_map(Value::as_str).collect())
                    .unwrap_or_default();
                let defaults: Vec<bool> =
                    handler.options.iter().map(|(key, _)| preselected.contains(key)).collect();
                let selection = MultiSelect::new()
                    .with_prompt(handler.label)
                    .items(&labels)
                    .defaults(&defaults)
                    .interact()
                    .map_err(prompt_error)?;
                Ok(Value::Array(
                    selection
                        .into_iter()
                        .map(|i| Value::String(handler.options[i].0.to_string()))
                        .collect(),
                ))
            }
            HandlerType::Confirm => {
                let answer = Confirm::new()
                    .with_prompt(handler.label)
                    .default(default.and_then(Value::as_bool).unwrap_or(false))
                    .interact()
                    .map_err(prompt_error)?;
                Ok(Value::Bool(answer))
            }
            HandlerType::Text | HandlerType::Suggest => {
                let validator = handler.validate;
                let mut input = Input::<String>::new().with_prompt(handler.label);
                if let Some(default) = default.and_then(Value::as_str) {
                    input = input.default(default.to_string());
                }
                if let Some(validate) = validator {
                    input = input.validate_with(move |value: &String| -> std::result::Result<(), String> {
                        match validate(value) {
                            Some(message) => Err(message),
                            None => Ok(()),
                        }
                    });
                }
                Ok(Value::String(input.interact_text().map_err(prompt_error)?))
            }
        }
    }
}

/// Asks for every handler that applies and has no preloaded answer.
///
/// Before each question the answers so far are resolved, so dependency
/// conditions and defaults see earlier answers. Handlers whose dependency is
/// not met are skipped.
pub fn collect_answers(
    registry: &Registry,
    prompter: &dyn Prompter,
    preloaded: RawInput,
) -> Result<RawInput> {
    let mut answers = preloaded;

    for handler in registry.handlers() {
        if answers.contains_key(handler.id) || answers.contains_key(&handler.alt_key) {
            continue;
        }

        let so_far = resolve(&answers, registry).resolved;
        if let Some(dependency) = &handler.depends_on {
            if !dependency.is_met(&so_far) {
                continue;
            }
        }

        let default = handler.default_value(&so_far);
        let answer = prompter.ask(handler, default.as_ref())?;
        answers.insert(handler.id.to_string(), answer);
    }

    Ok(answers)
}
