//! Kiln's main application entry point and orchestration logic.
//! Handles command-line argument parsing and dispatches to schema output,
//! validation, single processor runs or a full install.

use log::warn;

use kiln::{
    cli::{get_args, Args, AGENT_HELP},
    config::{input_from_env, load_config_input, merge_input, RawInput},
    error::{default_error_handler, Error, Result},
    installer::Installer,
    logger::init_logger,
    processor::Pipeline,
    prompt::{collect_answers, DialoguerPrompter},
    registry::Registry,
    resolver::ValidationResult,
    schema::render_schema,
    transfer::LocalTransfer,
};

/// Main application entry point.
fn main() {
    let args = get_args();
    init_logger(args.verbose);

    if let Err(err) = run(args) {
        default_error_handler(err);
    }
}

fn report_issues(result: &ValidationResult) {
    for warning in &result.warnings {
        warn!("{warning}");
    }
    for error in &result.errors {
        eprintln!("Error: {error}");
    }
}

/// Main application logic execution.
///
/// # Flow
/// 1. `--agent-help` and `--schema` print static documents
/// 2. Answers are loaded from `--config`, then the environment
/// 3. `--validate` prints the resolution result and exits
/// 4. Missing answers are prompted for unless `--no-interaction`
/// 5. A valid configuration is materialized in the destination
fn run(args: Args) -> Result<()> {
    if args.agent_help {
        print!("{AGENT_HELP}");
        return Ok(());
    }

    let registry = Registry::builtin()?;

    if args.schema {
        println!("{}", serde_json::to_string_pretty(&render_schema(&registry))?);
        return Ok(());
    }

    let config_input = match &args.config {
        Some(config) => load_config_input(config)?,
        None => RawInput::new(),
    };
    let env_input = input_from_env(&registry, std::env::vars());
    let mut raw = merge_input(&registry, config_input, env_input);

    let pipeline = Pipeline::builtin();
    let transfer = LocalTransfer::new();
    let installer = Installer::new(&registry, &pipeline, &transfer);

    if args.validate {
        let result = installer.validate(&raw);
        println!("{}", serde_json::to_string_pretty(&result)?);
        if !result.valid {
            std::process::exit(1);
        }
        return Ok(());
    }

    if !args.no_interaction {
        raw = collect_answers(&registry, &DialoguerPrompter::new(), raw)?;
    }

    let result = installer.validate(&raw);
    report_issues(&result);
    if !result.valid {
        return Err(Error::InvalidConfigurationError { errors: result.errors.len() });
    }

    if let Some(processor) = &args.run_processor {
        pipeline.run_one(processor, &result.resolved, &args.destination)?;
        println!("Processor '{}' applied to {}.", processor, args.destination.display());
        return Ok(());
    }

    let summary = installer.install(&result, args.source.as_deref(), &args.destination)?;
    print!("{summary}");
    Ok(())
}
