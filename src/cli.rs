//! Command-line interface implementation for Kiln.
//! Provides argument parsing and help text formatting using clap.

use clap::{error::ErrorKind, CommandFactory, Parser};
use std::path::PathBuf;

/// Command-line arguments structure for Kiln.
#[derive(Parser, Debug)]
#[command(author, version, about = "Kiln: turns a project template into a configured project", long_about = None)]
pub struct Args {
    /// Print the prompts schema as JSON and exit
    #[arg(long, conflicts_with_all = ["validate", "agent_help"])]
    pub schema: bool,

    /// Validate the configuration given with --config and print the result as JSON
    #[arg(long, requires = "config")]
    pub validate: bool,

    /// Answers as inline JSON or a path to a JSON/YAML file.
    /// Keys may be prompt ids or their environment variable names.
    #[arg(long, value_name = "JSON|FILE")]
    pub config: Option<String>,

    /// Directory to materialize the project in
    #[arg(long, value_name = "DIR", default_value = ".")]
    pub destination: PathBuf,

    /// Local template directory copied into the destination before processing
    #[arg(long, value_name = "DIR")]
    pub source: Option<PathBuf>,

    /// Never prompt; take answers from --config and the environment only
    #[arg(long)]
    pub no_interaction: bool,

    /// Print a usage guide for programmatic callers and exit
    #[arg(long)]
    pub agent_help: bool,

    /// Run a single processor by id, including ones that never run automatically
    #[arg(long, value_name = "PROCESSOR")]
    pub run_processor: Option<String>,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,
}

/// Usage guide printed by `--agent-help`.
pub const AGENT_HELP: &str = r#"Kiln non-interactive workflow

1. Discover the prompts:
     kiln --schema
   Prints {"prompts": [...]}. Each prompt has an "id", an "env" name, a "type"
   (text, select, multiselect, confirm, suggest), "options" for select types,
   the "default" used for an empty configuration, "required" and "depends_on".

2. Build a configuration object. Keys are prompt ids (or env names):
     {"name": "My Site", "hosting_provider": "lagoon", "hosting_project_name": "my-site"}
   select takes one option key, multiselect a list of option keys, confirm a
   boolean, text and suggest a string. Omitted prompts fall back to defaults.
   A prompt whose "depends_on" is not satisfied is ignored with a warning.

3. Validate without touching any files:
     kiln --validate --config '<json or path>'
   Prints {"valid", "errors": [{"prompt", "message"}], "warnings", "resolved"}.
   Exit code is 0 only when the configuration is valid.

4. Install:
     kiln --no-interaction --config '<json or path>' --destination <dir> [--source <template dir>]
   Nothing is written unless the configuration is valid.
"#;

/// Parses command line arguments and returns the Args structure.
///
/// # Exits
/// * With clap's default error handling for argument errors
pub fn get_args() -> Args {
    match Args::try_parse() {
        Ok(args) => args,
        Err(e) => {
            if e.kind() == ErrorKind::MissingRequiredArgument {
                let _ = Args::command()
                    .help_template(
                        r#"{about-section}
{usage-heading} {usage}

{all-args}
{after-help}
"#,
                    )
                    .print_help();
                std::process::exit(1);
            } else {
                e.exit();
            }
        }
    }
}
