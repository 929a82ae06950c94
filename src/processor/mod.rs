//! Ordered application of configuration decisions to a destination tree.
//!
//! Each processor owns one concern. They run in ascending weight against the
//! same directory, so later processors see what earlier ones did.

use log::info;
use std::path::Path;

use crate::config::ResolvedConfig;
use crate::error::{Error, Result};

pub mod builtin;

/// Mutates the destination tree according to the resolved configuration.
pub type ProcessorFn = fn(&ResolvedConfig, &Path) -> Result<()>;

/// One step of the pipeline.
#[derive(Debug, Clone, Copy)]
pub struct ProcessorDescriptor {
    pub id: &'static str,
    /// Lower runs earlier; `0` means the step only runs when asked for by id.
    pub weight: u32,
    pub run: ProcessorFn,
}

impl ProcessorDescriptor {
    pub fn new(id: &'static str, weight: u32, run: ProcessorFn) -> Self {
        Self { id, weight, run }
    }

    pub fn is_manual(&self) -> bool {
        self.weight == 0
    }
}

/// Immutable list of processors, in declaration order.
#[derive(Debug, Clone)]
pub struct Pipeline {
    processors: Vec<ProcessorDescriptor>,
}

impl Pipeline {
    pub fn new(processors: Vec<ProcessorDescriptor>) -> Self {
        Self { processors }
    }

    /// The processors shipped with Kiln.
    pub fn builtin() -> Self {
        Self::new(builtin::processors())
    }

    pub fn processors(&self) -> &[ProcessorDescriptor] {
        &self.processors
    }

    /// Automatically run processors by ascending weight. Equal weights keep
    /// their declaration order.
    pub fn ordered(&self) -> Vec<&ProcessorDescriptor> {
        let mut ordered: Vec<&ProcessorDescriptor> =
            self.processors.iter().filter(|p| !p.is_manual()).collect();
        ordered.sort_by_key(|p| p.weight);
        ordered
    }

    /// Runs every automatic processor against `destination`.
    ///
    /// The first failure aborts the run; processors that already ran keep
    /// their effects. Returns the ids of the processors that ran.
    pub fn run(&self, config: &ResolvedConfig, destination: &Path) -> Result<Vec<&'static str>> {
        let mut ran = Vec::new();
        for processor in self.ordered() {
            execute(processor, config, destination)?;
            ran.push(processor.id);
        }
        Ok(ran)
    }

    /// Runs a single processor by id, including manual ones.
    pub fn run_one(&self, id: &str, config: &ResolvedConfig, destination: &Path) -> Result<()> {
        let processor = self
            .processors
            .iter()
            .find(|p| p.id == id)
            .ok_or_else(|| Error::ProcessorNotFoundError { id: id.to_string() })?;
        execute(processor, config, destination)
    }
}

fn execute(processor: &ProcessorDescriptor, config: &ResolvedConfig, destination: &Path) -> Result<()> {
    info!("Running processor '{}' (weight {})", processor.id, processor.weight);
    (processor.run)(config, destination).map_err(|e| Error::ProcessorError {
        processor: processor.id.to_string(),
        source: Box::new(e),
    })
}
