//! Error handling for the Kiln application.
//! Defines custom error types and results used throughout the application.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Custom error types for Kiln operations.
///
/// Validation problems found while resolving a configuration are not errors:
/// they are collected as [`crate::resolver::Issue`] records. The variants below
/// are the conditions that stop an operation.
#[derive(Error, Debug)]
pub enum Error {
    /// Represents errors that occur during file system operations
    #[error("IO error: {0}.")]
    IoError(#[from] io::Error),

    #[error("Failed to parse JSON: {0}.")]
    JSONParseError(#[from] serde_json::Error),

    #[error("Failed to parse YAML: {0}.")]
    YAMLParseError(#[from] serde_yaml::Error),

    #[error("Failed to traverse directory: {0}.")]
    WalkdirError(#[from] walkdir::Error),

    #[error("Failed to build ignore patterns: {0}.")]
    GlobSetParseError(#[from] globset::Error),

    /// Raw configuration input could not be read or has the wrong shape
    #[error("Configuration error: {0}.")]
    ConfigError(String),

    #[error("Prompt error: {0}.")]
    PromptError(String),

    #[error("Handler '{id}' is declared more than once.")]
    DuplicateHandlerError { id: String },

    #[error("Handler '{handler}' depends on '{dependency}', which is not declared before it.")]
    UnknownDependencyError { handler: String, dependency: String },

    #[error("Handler '{handler}' depends on '{dependency}' being '{value}', which is not a value '{dependency}' accepts.")]
    UnknownDependencyValueError { handler: String, dependency: String, value: String },

    #[error("Handler '{id}' not found.")]
    HandlerNotFoundError { id: String },

    #[error("Processor '{id}' not found.")]
    ProcessorNotFoundError { id: String },

    /// The begin and end markers of a conditional block are not paired
    #[error(
        "Unbalanced markers in '{}': {begin_count} line(s) with '{begin}' but {end_count} line(s) with '{end}'.",
        path.display()
    )]
    TemplateConsistencyError {
        path: PathBuf,
        begin: String,
        end: String,
        begin_count: usize,
        end_count: usize,
    },

    #[error("Failed to move '{}' to '{}': {source}.", from.display(), to.display())]
    RenameError {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Configuration is invalid: {errors} error(s) found.")]
    InvalidConfigurationError { errors: usize },

    #[error("Processor '{processor}' failed: {source}")]
    ProcessorError {
        processor: String,
        #[source]
        source: Box<Error>,
    },
}

/// Convenience type alias for Results with Error as the error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Default error handler that prints the error and exits the program.
///
/// # Arguments
/// * `err` - The Error to handle
///
/// # Behavior
/// Prints the error message to stderr and exits with status code 1
pub fn default_error_handler(err: Error) {
    eprintln!("{err}");
    std::process::exit(1);
}
