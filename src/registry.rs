//! The ordered table of handlers known to Kiln.
//!
//! Declaration order is also evaluation order: a handler may only depend on
//! handlers declared before it, which [`Registry::new`] enforces.

use cruet::Inflector;
use log::debug;
use serde_json::{json, Value};
use std::collections::HashSet;

use crate::config::ResolvedConfig;
use crate::error::{Error, Result};
use crate::handler::{Dependency, HandlerDescriptor, HandlerType};

/// Validated, ordered collection of handler descriptors.
#[derive(Debug, Clone)]
pub struct Registry {
    handlers: Vec<HandlerDescriptor>,
}

impl Registry {
    /// Builds a registry, rejecting duplicate ids and dependencies on handlers
    /// that are not declared earlier (which also rules out cycles).
    pub fn new(handlers: Vec<HandlerDescriptor>) -> Result<Self> {
        let mut seen: HashSet<&str> = HashSet::new();

        for (position, handler) in handlers.iter().enumerate() {
            if !seen.insert(handler.id) {
                return Err(Error::DuplicateHandlerError { id: handler.id.to_string() });
            }

            let Some(Dependency::On(conditions)) = &handler.depends_on else {
                continue;
            };

            for (dependency, accepted) in conditions {
                let target = handlers[..position].iter().find(|h| h.id == *dependency).ok_or_else(
                    || Error::UnknownDependencyError {
                        handler: handler.id.to_string(),
                        dependency: dependency.to_string(),
                    },
                )?;

                if let Some(value) = accepted.iter().find(|v| !accepts_value(target, v)) {
                    return Err(Error::UnknownDependencyValueError {
                        handler: handler.id.to_string(),
                        dependency: dependency.to_string(),
                        value: value.to_string(),
                    });
                }
            }
        }

        debug!("Registered {} handlers", handlers.len());
        Ok(Self { handlers })
    }

    /// The handlers shipped with Kiln.
    pub fn builtin() -> Result<Self> {
        Self::new(builtin_handlers())
    }

    pub fn handlers(&self) -> &[HandlerDescriptor] {
        &self.handlers
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    pub fn get(&self, id: &str) -> Result<&HandlerDescriptor> {
        self.handlers
            .iter()
            .find(|h| h.id == id)
            .ok_or_else(|| Error::HandlerNotFoundError { id: id.to_string() })
    }

    /// Finds the handler an input key refers to, by id or alternate key.
    pub fn lookup_key(&self, key: &str) -> Option<&HandlerDescriptor> {
        self.handlers
            .iter()
            .find(|h| h.id == key)
            .or_else(|| self.handlers.iter().find(|h| h.alt_key == key))
    }
}

fn accepts_value(target: &HandlerDescriptor, value: &str) -> bool {
    match target.kind {
        HandlerType::Select | HandlerType::MultiSelect => target.has_option(value),
        HandlerType::Confirm => value == "true" || value == "false",
        HandlerType::Text | HandlerType::Suggest => true,
    }
}

const HOSTING_PROVIDERS: &[(&str, &str)] = &[
    ("none", "None"),
    ("lagoon", "Lagoon"),
    ("acquia", "Acquia Cloud"),
    ("other", "Other"),
];

const SERVICES: &[(&str, &str)] = &[("clamav", "ClamAV"), ("solr", "Solr"), ("valkey", "Valkey")];

const DEPLOY_TYPES: &[(&str, &str)] = &[
    ("artifact", "Code artifact"),
    ("lagoon", "Lagoon webhook"),
    ("container_image", "Container image"),
    ("webhook", "Custom webhook"),
];

const DATABASE_DOWNLOAD_SOURCES: &[(&str, &str)] = &[
    ("url", "URL download"),
    ("ftp", "FTP download"),
    ("acquia", "Acquia backup"),
    ("lagoon", "Lagoon environment"),
    ("container_registry", "Container registry"),
    ("none", "None"),
];

/// Handlers in evaluation order.
pub fn builtin_handlers() -> Vec<HandlerDescriptor> {
    vec![
        HandlerDescriptor::new("name", HandlerType::Text)
            .label("Site name")
            .description("Human-readable name of the project.")
            .required()
            .validate_with(validate_human_name),
        HandlerDescriptor::new("machine_name", HandlerType::Text)
            .label("Site machine name")
            .description("Used for directories, packages and placeholders in code.")
            .required()
            .default_with(|c| c.get_str("name").map(|n| json!(n.to_snake_case())))
            .validate_with(validate_machine_name),
        HandlerDescriptor::new("org", HandlerType::Text)
            .label("Organization name")
            .required()
            .default_with(|c| c.get_str("name").map(|n| json!(format!("{n} Org"))))
            .validate_with(validate_human_name),
        HandlerDescriptor::new("org_machine_name", HandlerType::Text)
            .label("Organization machine name")
            .required()
            .default_with(|c| c.get_str("org").map(|o| json!(o.to_snake_case())))
            .validate_with(validate_machine_name),
        HandlerDescriptor::new("domain", HandlerType::Text)
            .label("Public domain")
            .description("Domain name without the scheme, e.g. example.com.")
            .required()
            .default_with(|c| {
                c.get_str("machine_name").map(|m| json!(format!("{}.com", m.to_kebab_case())))
            })
            .validate_with(validate_domain),
        HandlerDescriptor::new("code_provider", HandlerType::Select)
            .label("Repository provider")
            .options(&[("github", "GitHub"), ("other", "Other")])
            .required()
            .default_with(|_| Some(json!("github"))),
        HandlerDescriptor::new("profile", HandlerType::Suggest)
            .label("Installation profile")
            .description("A profile machine name or a path to a custom profile.")
            .required()
            .default_with(|_| Some(json!("standard")))
            .validate_with(validate_profile),
        HandlerDescriptor::new("module_prefix", HandlerType::Text)
            .label("Module prefix")
            .description("Prefix of custom module names.")
            .required()
            .default_with(|c| c.get_str("machine_name").map(|m| json!(abbreviate(m))))
            .validate_with(validate_machine_name),
        HandlerDescriptor::new("theme", HandlerType::Text)
            .label("Theme machine name")
            .required()
            .default_with(|c| c.get_str("machine_name").map(|m| json!(m)))
            .validate_with(validate_machine_name),
        HandlerDescriptor::new("hosting_provider", HandlerType::Select)
            .label("Hosting provider")
            .options(HOSTING_PROVIDERS)
            .required()
            .default_with(|_| Some(json!("none"))),
        HandlerDescriptor::new("hosting_project_name", HandlerType::Text)
            .label("Hosting project name")
            .description("Project name as registered with the hosting provider.")
            .required()
            .depends_on(&[("hosting_provider", &["lagoon", "acquia"])])
            .validate_with(validate_hosting_project_name),
        HandlerDescriptor::new("webroot", HandlerType::Suggest)
            .label("Web root directory")
            .required()
            .default_with(|c| match c.get_str("hosting_provider") {
                Some("acquia") => Some(json!("docroot")),
                _ => Some(json!("web")),
            })
            .validate_with(validate_directory_name),
        HandlerDescriptor::new("services", HandlerType::MultiSelect)
            .label("Services")
            .options(SERVICES)
            .default_with(|_| Some(json!(["clamav", "solr", "valkey"]))),
        HandlerDescriptor::new("deploy_types", HandlerType::MultiSelect)
            .label("Deployment types")
            .options(DEPLOY_TYPES)
            .default_with(|c| match c.get_str("hosting_provider") {
                Some("lagoon") => Some(json!(["lagoon"])),
                Some("acquia") => Some(json!(["artifact"])),
                _ => Some(json!(["webhook"])),
            }),
        HandlerDescriptor::new("provision_type", HandlerType::Select)
            .label("Provision type")
            .options(&[("database", "Import from database dump"), ("profile", "Install from profile")])
            .required()
            .default_with(|_| Some(json!("database"))),
        HandlerDescriptor::new("database_download_source", HandlerType::Select)
            .label("Database source")
            .options(DATABASE_DOWNLOAD_SOURCES)
            .required()
            .depends_on(&[("provision_type", &["database"])])
            .default_with(|c| match c.get_str("hosting_provider") {
                Some("acquia") => Some(json!("acquia")),
                Some("lagoon") => Some(json!("lagoon")),
                _ => Some(json!("url")),
            }),
        HandlerDescriptor::new("database_image", HandlerType::Text)
            .label("Database container image")
            .required()
            .depends_on(&[("database_download_source", &["container_registry"])])
            .default_with(|c| {
                let org = c.get_str("org_machine_name")?;
                let machine_name = c.get_str("machine_name")?;
                Some(json!(format!("{org}/{machine_name}-data:latest")))
            })
            .validate_with(validate_image_name),
        HandlerDescriptor::new("ci_provider", HandlerType::Select)
            .label("Continuous integration provider")
            .options(&[("gha", "GitHub Actions"), ("circleci", "CircleCI"), ("none", "None")])
            .required()
            .default_with(|c| match c.get_str("code_provider") {
                Some("github") => Some(json!("gha")),
                _ => Some(json!("circleci")),
            }),
        HandlerDescriptor::new("dependency_updates_provider", HandlerType::Select)
            .label("Dependency updates provider")
            .options(&[
                ("renovatebot_ci", "Renovate self-hosted in CI"),
                ("renovatebot_app", "Renovate app"),
                ("none", "None"),
            ])
            .required()
            .default_with(|_| Some(json!("renovatebot_ci"))),
        HandlerDescriptor::new("auto_assign_pr", HandlerType::Confirm)
            .label("Auto-assign the author to their pull requests?")
            .depends_on(&[("code_provider", &["github"])])
            .default_with(|_| Some(Value::Bool(true))),
        HandlerDescriptor::new("label_merge_conflicts_pr", HandlerType::Confirm)
            .label("Auto-label pull requests with merge conflicts?")
            .depends_on(&[("code_provider", &["github"])])
            .default_with(|_| Some(Value::Bool(true))),
        HandlerDescriptor::new("preserve_docs", HandlerType::Confirm)
            .label("Preserve project documentation?")
            .default_with(|_| Some(Value::Bool(true))),
        HandlerDescriptor::new("ai_code_instructions", HandlerType::Select)
            .label("AI coding assistant instructions")
            .options(&[("claude", "Claude"), ("none", "None")])
            .default_with(|_| Some(json!("none"))),
        HandlerDescriptor::new("timezone", HandlerType::Text)
            .label("Timezone")
            .description("Taken from the host when available.")
            .depends_on_system()
            .default_with(|_| Some(json!("UTC"))),
    ]
}

/// Initials of a snake_case name, or its first four characters for a single word.
fn abbreviate(machine_name: &str) -> String {
    let parts: Vec<&str> = machine_name.split('_').filter(|p| !p.is_empty()).collect();
    if parts.len() > 1 {
        parts.iter().filter_map(|p| p.chars().next()).collect()
    } else {
        machine_name.chars().take(4).collect()
    }
}

fn validate_human_name(value: &str) -> Option<String> {
    if value.trim().is_empty() {
        return Some("Name must not be empty".to_string());
    }
    if !value.chars().all(|c| c.is_alphanumeric() || " -_'.&".contains(c)) {
        return Some(format!("'{value}' contains unsupported characters"));
    }
    None
}

fn validate_machine_name(value: &str) -> Option<String> {
    let mut chars = value.chars();
    let valid = chars.next().is_some_and(|c| c.is_ascii_lowercase())
        && chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_');
    (!valid).then(|| {
        format!("'{value}' must start with a lowercase letter and contain only lowercase letters, digits and underscores")
    })
}

fn validate_domain(value: &str) -> Option<String> {
    let labels: Vec<&str> = value.split('.').collect();
    let valid = labels.len() > 1
        && labels.iter().all(|label| {
            !label.is_empty()
                && !label.starts_with('-')
                && !label.ends_with('-')
                && label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
        });
    (!valid).then(|| format!("'{value}' is not a valid domain name"))
}

fn validate_profile(value: &str) -> Option<String> {
    if value.contains('/') {
        return None;
    }
    validate_machine_name(value)
}

fn validate_hosting_project_name(value: &str) -> Option<String> {
    let mut chars = value.chars();
    let valid = chars.next().is_some_and(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
        && chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-');
    (!valid).then(|| {
        format!("'{value}' must contain only lowercase letters, digits and hyphens")
    })
}

fn validate_directory_name(value: &str) -> Option<String> {
    let mut chars = value.chars();
    let valid = chars.next().is_some_and(|c| c.is_ascii_lowercase())
        && chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' || c == '-');
    (!valid).then(|| format!("'{value}' is not a valid directory name"))
}

fn validate_image_name(value: &str) -> Option<String> {
    let valid = !value.is_empty()
        && !value.contains(char::is_whitespace)
        && value.chars().all(|c| c.is_ascii_alphanumeric() || "/:._-".contains(c));
    (!valid).then(|| format!("'{value}' is not a valid container image name"))
}

/// Resolves the defaults of every handler against an empty input.
pub(crate) fn defaults_for_empty_input(registry: &Registry) -> Vec<Option<Value>> {
    let mut resolved = ResolvedConfig::default();
    registry
        .handlers()
        .iter()
        .map(|handler| {
            let default = handler.default_value(&resolved);
            if let Some(value) = &default {
                resolved.insert(handler.id, value.clone());
            }
            default
        })
        .collect()
}
