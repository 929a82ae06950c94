//! Kiln turns a generic project template into a configured project.
//! It resolves a set of interdependent answers against a registry of
//! handlers, then rewrites the destination tree through an ordered pipeline
//! of processors driven by marker tokens and placeholder substitution.

/// Command-line interface module for the Kiln application
pub mod cli;

/// Raw answers input and the resolved configuration value
pub mod config;

/// Common constants: markers, ignore lists, binary extensions
pub mod constants;

/// Error types and handling for the Kiln application
pub mod error;

/// Handler descriptors: types, defaults, dependency conditions
pub mod handler;

/// Ignore patterns applied when copying a template source
pub mod ignore;

/// Resolve, copy, process and report
pub mod installer;

/// Logger setup for the binary
pub mod logger;

/// Weight-ordered processors applied to the destination tree
pub mod processor;

/// User input and interaction handling
pub mod prompt;

/// The ordered table of handlers
pub mod registry;

/// Resolution and validation of answers
pub mod resolver;

/// JSON schema document describing the registry
pub mod schema;

/// Marker, substitution and rename operations on file trees
pub mod token;

/// Copying template sources into the destination
pub mod transfer;
