//! Install orchestration: resolve, copy, process, report.
//!
//! The pipeline only ever runs on a valid configuration, so configuration
//! mistakes never leave a half-materialized destination behind.

use log::info;
use std::path::{Path, PathBuf};

use crate::config::{RawInput, ResolvedConfig};
use crate::error::{Error, Result};
use crate::processor::Pipeline;
use crate::registry::Registry;
use crate::resolver::{resolve, ValidationResult};
use crate::transfer::FileTransfer;

/// What an install did.
#[derive(Debug, Clone)]
pub struct InstallSummary {
    pub destination: PathBuf,
    pub copied_files: usize,
    pub processors: Vec<&'static str>,
    pub resolved: ResolvedConfig,
}

impl std::fmt::Display for InstallSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Project materialized in {}.", self.destination.display())?;
        if self.copied_files > 0 {
            writeln!(f, "Copied {} template file(s).", self.copied_files)?;
        }
        writeln!(f, "Applied {} processor(s): {}", self.processors.len(), self.processors.join(", "))?;
        for (key, value) in self.resolved.iter() {
            writeln!(f, "  {key}: {value}")?;
        }
        Ok(())
    }
}

pub struct Installer<'a> {
    registry: &'a Registry,
    pipeline: &'a Pipeline,
    transfer: &'a dyn FileTransfer,
}

impl<'a> Installer<'a> {
    pub fn new(registry: &'a Registry, pipeline: &'a Pipeline, transfer: &'a dyn FileTransfer) -> Self {
        Self { registry, pipeline, transfer }
    }

    /// Resolves raw answers without touching the filesystem.
    pub fn validate(&self, raw: &RawInput) -> ValidationResult {
        resolve(raw, self.registry)
    }

    /// Materializes the destination from a validation result.
    ///
    /// # Errors
    /// * `Error::InvalidConfigurationError` before anything is written when
    ///   `result` is not valid
    /// * any copy failure, or the first fatal processor error
    pub fn install(
        &self,
        result: &ValidationResult,
        source: Option<&Path>,
        destination: &Path,
    ) -> Result<InstallSummary> {
        if !result.valid {
            return Err(Error::InvalidConfigurationError { errors: result.errors.len() });
        }

        let copied_files = match source {
            Some(source) => {
                info!("Copying template from {}", source.display());
                self.transfer.transfer(source, destination)?
            }
            None => 0,
        };

        let processors = self.pipeline.run(&result.resolved, destination)?;

        Ok(InstallSummary {
            destination: destination.to_path_buf(),
            copied_files,
            processors,
            resolved: result.resolved.clone(),
        })
    }
}
