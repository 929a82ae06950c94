//! Copies template sources into the destination directory.

use globset::GlobSet;
use log::debug;
use std::fs;
use std::path::Path;
use walkdir::WalkDir;

use crate::error::{Error, Result};
use crate::ignore::parse_ignore_file;

/// Places the raw template files in the destination before processing.
pub trait FileTransfer {
    /// Copies `source` into `destination`, returning the number of files written.
    fn transfer(&self, source: &Path, destination: &Path) -> Result<usize>;
}

/// Copies a template from the local filesystem.
#[derive(Debug, Default)]
pub struct LocalTransfer;

impl LocalTransfer {
    pub fn new() -> Self {
        Self
    }
}

fn copy_file(source: &Path, dest: &Path) -> Result<()> {
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::copy(source, dest).map(|_| ()).map_err(Error::IoError)
}

fn copy_tree(source: &Path, destination: &Path, ignored: &GlobSet) -> Result<usize> {
    let mut copied = 0;

    for entry in WalkDir::new(source).min_depth(1).sort_by_file_name() {
        let entry = entry?;
        let relative = entry
            .path()
            .strip_prefix(source)
            .map_err(|e| Error::ConfigError(e.to_string()))?;

        if ignored.is_match(relative) {
            debug!("Skipping ignored path {}", relative.display());
            continue;
        }

        let target = destination.join(relative);
        if entry.file_type().is_dir() {
            fs::create_dir_all(&target)?;
        } else {
            copy_file(entry.path(), &target)?;
            copied += 1;
        }
    }

    Ok(copied)
}

impl FileTransfer for LocalTransfer {
    fn transfer(&self, source: &Path, destination: &Path) -> Result<usize> {
        if !source.is_dir() {
            return Err(Error::ConfigError(format!(
                "template source '{}' is not a directory",
                source.display()
            )));
        }

        let ignored = parse_ignore_file(source)?;
        fs::create_dir_all(destination)?;
        let copied = copy_tree(source, destination, &ignored)?;
        debug!("Copied {} file(s) from {} to {}", copied, source.display(), destination.display());
        Ok(copied)
    }
}
