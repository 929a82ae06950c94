//! Processors shipped with Kiln, one per configuration concern.
//!
//! Placeholders are replaced longest first across processors: `your_site_theme`,
//! `your-site-domain.example` and the database image all contain the shorter
//! `your_site`/`your-site`/`your_org` placeholders, so their processors weigh less
//! than `org` and `name`.

use cruet::Inflector;
use log::debug;
use std::path::Path;

use super::ProcessorDescriptor;
use crate::config::ResolvedConfig;
use crate::error::Result;
use crate::token::{
    remove_paths, remove_token_in_tree, rename_paths_containing, replace_in_tree, TokenMode,
};

pub const PLACEHOLDER_NAME: &str = "Your Site";
pub const PLACEHOLDER_MACHINE_NAME: &str = "your_site";
pub const PLACEHOLDER_MACHINE_NAME_KEBAB: &str = "your-site";
pub const PLACEHOLDER_ORG: &str = "Your Org";
pub const PLACEHOLDER_ORG_MACHINE_NAME: &str = "your_org";
pub const PLACEHOLDER_DOMAIN: &str = "your-site-domain.example";
pub const PLACEHOLDER_THEME: &str = "your_site_theme";
pub const PLACEHOLDER_HOSTING_PROJECT: &str = "your-hosting-project";
pub const PLACEHOLDER_DATABASE_IMAGE: &str = "your_org/your_site-data:latest";
pub const DEFAULT_WEBROOT: &str = "web";
pub const DEFAULT_TIMEZONE: &str = "UTC";

/// Processors in declaration order.
pub fn processors() -> Vec<ProcessorDescriptor> {
    vec![
        ProcessorDescriptor::new("theme", 10, process_theme),
        ProcessorDescriptor::new("module_prefix", 20, process_module_prefix),
        ProcessorDescriptor::new("domain", 30, process_domain),
        ProcessorDescriptor::new("database_image", 35, process_database_image),
        ProcessorDescriptor::new("org", 40, process_org),
        ProcessorDescriptor::new("hosting_project_name", 45, process_hosting_project_name),
        ProcessorDescriptor::new("name", 50, process_name),
        ProcessorDescriptor::new("code_provider", 60, process_code_provider),
        ProcessorDescriptor::new("hosting_provider", 70, process_hosting_provider),
        ProcessorDescriptor::new("webroot", 90, process_webroot),
        ProcessorDescriptor::new("services", 100, process_services),
        ProcessorDescriptor::new("deploy_types", 110, process_deploy_types),
        ProcessorDescriptor::new("provision_type", 120, process_provision_type),
        ProcessorDescriptor::new("database_download_source", 130, process_database_download_source),
        ProcessorDescriptor::new("ci_provider", 140, process_ci_provider),
        ProcessorDescriptor::new("dependency_updates_provider", 150, process_dependency_updates),
        ProcessorDescriptor::new("auto_assign_pr", 160, process_auto_assign_pr),
        ProcessorDescriptor::new("label_merge_conflicts_pr", 170, process_label_merge_conflicts_pr),
        ProcessorDescriptor::new("preserve_docs", 180, process_preserve_docs),
        ProcessorDescriptor::new("ai_code_instructions", 190, process_ai_code_instructions),
        ProcessorDescriptor::new("timezone", 200, process_timezone),
        ProcessorDescriptor::new("cleanup", 1000, process_cleanup),
        ProcessorDescriptor::new("uncomment", 0, process_uncomment),
    ]
}

/// Keeps the content of the `name` blocks (markers only) or drops it.
fn keep_block(root: &Path, name: &str, keep: bool) -> Result<()> {
    let mode = if keep { TokenMode::MarkersOnly } else { TokenMode::WithContent };
    let changed = remove_token_in_tree(root, name, mode)?;
    debug!("{} '{}' blocks in {} file(s)", if keep { "Kept" } else { "Dropped" }, name, changed);
    Ok(())
}

/// Handles a set of per-option blocks named `<prefix>_<OPTION>`.
fn keep_option_blocks(root: &Path, prefix: &str, options: &[&str], selected: &[&str]) -> Result<()> {
    for option in options {
        keep_block(root, &format!("{prefix}_{}", option.to_uppercase()), selected.contains(option))?;
    }
    Ok(())
}

fn process_theme(config: &ResolvedConfig, root: &Path) -> Result<()> {
    if let Some(theme) = config.get_str("theme") {
        replace_in_tree(root, PLACEHOLDER_THEME, theme)?;
        rename_paths_containing(root, PLACEHOLDER_THEME, theme)?;
    }
    Ok(())
}

fn process_module_prefix(config: &ResolvedConfig, root: &Path) -> Result<()> {
    if let Some(prefix) = config.get_str("module_prefix") {
        replace_in_tree(root, r"/\bys_/", &format!("{prefix}_"))?;
        replace_in_tree(root, r"/\bYS_/", &format!("{}_", prefix.to_uppercase()))?;
        rename_paths_containing(root, "/ys_", &format!("/{prefix}_"))?;
    }
    Ok(())
}

fn process_domain(config: &ResolvedConfig, root: &Path) -> Result<()> {
    if let Some(domain) = config.get_str("domain") {
        replace_in_tree(root, PLACEHOLDER_DOMAIN, domain)?;
    }
    Ok(())
}

fn process_database_image(config: &ResolvedConfig, root: &Path) -> Result<()> {
    match config.get_str("database_image") {
        Some(image) => {
            replace_in_tree(root, PLACEHOLDER_DATABASE_IMAGE, image)?;
            keep_block(root, "DB_IMAGE", true)
        }
        None => keep_block(root, "DB_IMAGE", false),
    }
}

fn process_org(config: &ResolvedConfig, root: &Path) -> Result<()> {
    if let Some(org_machine_name) = config.get_str("org_machine_name") {
        replace_in_tree(root, PLACEHOLDER_ORG_MACHINE_NAME, org_machine_name)?;
        replace_in_tree(root, "your-org", &org_machine_name.to_kebab_case())?;
        rename_paths_containing(root, PLACEHOLDER_ORG_MACHINE_NAME, org_machine_name)?;
    }
    if let Some(org) = config.get_str("org") {
        replace_in_tree(root, PLACEHOLDER_ORG, org)?;
    }
    Ok(())
}

fn process_hosting_project_name(config: &ResolvedConfig, root: &Path) -> Result<()> {
    if let Some(project) = config.get_str("hosting_project_name") {
        replace_in_tree(root, PLACEHOLDER_HOSTING_PROJECT, project)?;
    }
    Ok(())
}

fn process_name(config: &ResolvedConfig, root: &Path) -> Result<()> {
    if let Some(machine_name) = config.get_str("machine_name") {
        let kebab = machine_name.to_kebab_case();
        replace_in_tree(root, PLACEHOLDER_MACHINE_NAME, machine_name)?;
        replace_in_tree(root, PLACEHOLDER_MACHINE_NAME_KEBAB, &kebab)?;
        rename_paths_containing(root, PLACEHOLDER_MACHINE_NAME, machine_name)?;
        rename_paths_containing(root, PLACEHOLDER_MACHINE_NAME_KEBAB, &kebab)?;
    }
    if let Some(name) = config.get_str("name") {
        replace_in_tree(root, PLACEHOLDER_NAME, name)?;
    }
    Ok(())
}

fn process_code_provider(config: &ResolvedConfig, root: &Path) -> Result<()> {
    let github = config.get_str("code_provider") == Some("github");
    if !github {
        remove_paths(root, &[".github"])?;
    }
    keep_block(root, "CODE_PROVIDER_GITHUB", github)
}

fn process_hosting_provider(config: &ResolvedConfig, root: &Path) -> Result<()> {
    const PROVIDER_FILES: &[(&str, &[&str])] = &[
        ("lagoon", &[".lagoon.yml", "drush/sites/lagoon.site.yml"]),
        ("acquia", &["hooks", "drush/sites/ac.site.yml"]),
    ];

    let selected = config.get_str("hosting_provider").unwrap_or("none");
    for (provider, files) in PROVIDER_FILES {
        if *provider != selected {
            remove_paths(root, files)?;
        }
    }

    keep_option_blocks(root, "HOSTING", &["lagoon", "acquia"], &[selected])?;
    keep_block(root, "HOSTING_ANY", selected != "none")
}

/// Renames the web root first, then rewrites references to it.
fn process_webroot(config: &ResolvedConfig, root: &Path) -> Result<()> {
    let webroot = config.get_str("webroot").unwrap_or(DEFAULT_WEBROOT);
    if webroot == DEFAULT_WEBROOT {
        return Ok(());
    }

    rename_paths_containing(root, "/web/", &format!("/{webroot}/"))?;
    replace_in_tree(root, r"#\bweb/#", &format!("{webroot}/"))?;
    replace_in_tree(root, r"#WEBROOT=web\b#", &format!("WEBROOT={webroot}"))?;
    Ok(())
}

fn process_services(config: &ResolvedConfig, root: &Path) -> Result<()> {
    const SERVICE_FILES: &[(&str, &[&str])] = &[
        ("clamav", &[".docker/clamav.dockerfile", ".docker/config/clamav"]),
        ("solr", &[".docker/solr.dockerfile", ".docker/config/solr"]),
        ("valkey", &[".docker/valkey.dockerfile"]),
    ];

    let selected = config.get_list("services");
    for (service, files) in SERVICE_FILES {
        if !selected.contains(service) {
            remove_paths(root, files)?;
        }
    }

    keep_option_blocks(root, "SERVICE", &["clamav", "solr", "valkey"], &selected)
}

fn process_deploy_types(config: &ResolvedConfig, root: &Path) -> Result<()> {
    let selected = config.get_list("deploy_types");
    keep_option_blocks(
        root,
        "DEPLOY_TYPE",
        &["artifact", "lagoon", "container_image", "webhook"],
        &selected,
    )?;

    if selected.is_empty() {
        remove_paths(root, &["docs/deployment.md"])?;
    }
    keep_block(root, "DEPLOYMENT", !selected.is_empty())
}

fn process_provision_type(config: &ResolvedConfig, root: &Path) -> Result<()> {
    let profile = config.get_str("provision_type") == Some("profile");
    keep_block(root, "PROVISION_TYPE_PROFILE", profile)?;
    keep_block(root, "!PROVISION_TYPE_PROFILE", !profile)
}

fn process_database_download_source(config: &ResolvedConfig, root: &Path) -> Result<()> {
    let selected: Vec<&str> = config.get_str("database_download_source").into_iter().collect();
    keep_option_blocks(
        root,
        "DB_DOWNLOAD_SOURCE",
        &["url", "ftp", "acquia", "lagoon", "container_registry", "none"],
        &selected,
    )
}

fn process_ci_provider(config: &ResolvedConfig, root: &Path) -> Result<()> {
    let selected = config.get_str("ci_provider").unwrap_or("none");

    if selected != "gha" {
        remove_paths(root, &[".github/workflows/build-test-deploy.yml"])?;
    }
    if selected != "circleci" {
        remove_paths(root, &[".circleci"])?;
    }

    keep_option_blocks(root, "CI_PROVIDER", &["gha", "circleci"], &[selected])?;
    keep_block(root, "CI_PROVIDER_ANY", selected != "none")
}

fn process_dependency_updates(config: &ResolvedConfig, root: &Path) -> Result<()> {
    let selected = config.get_str("dependency_updates_provider").unwrap_or("none");

    if selected != "renovatebot_ci" {
        remove_paths(root, &[".github/workflows/update-dependencies.yml"])?;
    }
    if selected == "none" {
        remove_paths(root, &["renovate.json"])?;
    }

    keep_block(root, "DEPS_UPDATE_PROVIDER_CI", selected == "renovatebot_ci")?;
    keep_block(root, "DEPS_UPDATE_PROVIDER_ANY", selected != "none")
}

fn process_auto_assign_pr(config: &ResolvedConfig, root: &Path) -> Result<()> {
    if !config.get_bool("auto_assign_pr").unwrap_or(false) {
        remove_paths(root, &[".github/workflows/assign-author.yml"])?;
    }
    Ok(())
}

fn process_label_merge_conflicts_pr(config: &ResolvedConfig, root: &Path) -> Result<()> {
    if !config.get_bool("label_merge_conflicts_pr").unwrap_or(false) {
        remove_paths(root, &[".github/workflows/label-merge-conflict.yml"])?;
    }
    Ok(())
}

fn process_preserve_docs(config: &ResolvedConfig, root: &Path) -> Result<()> {
    let preserve = config.get_bool("preserve_docs").unwrap_or(false);
    if !preserve {
        remove_paths(root, &["docs"])?;
    }
    keep_block(root, "DOCS", preserve)
}

fn process_ai_code_instructions(config: &ResolvedConfig, root: &Path) -> Result<()> {
    if config.get_str("ai_code_instructions") != Some("claude") {
        remove_paths(root, &["CLAUDE.md"])?;
    }
    Ok(())
}

fn process_timezone(config: &ResolvedConfig, root: &Path) -> Result<()> {
    match config.get_str("timezone") {
        Some(timezone) if timezone != DEFAULT_TIMEZONE => {
            // Taken unchecked from the host, so `$` must not expand as a group reference.
            let replacement = format!("TZ={}", timezone.replace('$', "$$"));
            replace_in_tree(root, r"#\bTZ=UTC\b#", &replacement)?;
            Ok(())
        }
        _ => Ok(()),
    }
}

/// Drops tool development blocks and any marker line left behind.
fn process_cleanup(_config: &ResolvedConfig, root: &Path) -> Result<()> {
    keep_block(root, "KILN_DEV", false)?;
    replace_in_tree(root, r"/^[ \t]*#;[<>] [^\n]*(\r?\n)?/m", "")?;
    Ok(())
}

/// Uncomments lines prefixed with `##### `. Only runs on request.
fn process_uncomment(_config: &ResolvedConfig, root: &Path) -> Result<()> {
    replace_in_tree(root, r"/^([ \t]*)##### /m", "${1}")?;
    Ok(())
}
