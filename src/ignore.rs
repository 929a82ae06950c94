//! File and directory ignore pattern handling for template sources.
//! A `.kilnignore` file in the template source lists glob patterns, one per
//! line, of paths never copied into the destination.

use globset::{Glob, GlobSet, GlobSetBuilder};
use log::debug;
use std::{fs::read_to_string, path::Path};

use crate::constants::{DEFAULT_IGNORE_PATTERNS, IGNORE_FILE};
use crate::error::Result;

/// Builds the set of ignore globs for a template source.
///
/// # Arguments
/// * `template_root` - Directory that may contain a `.kilnignore` file
///
/// # Returns
/// * `Result<GlobSet>` - Default patterns plus those from `.kilnignore`
///
/// # Notes
/// - A missing `.kilnignore` only yields the default patterns
/// - Blank lines and lines starting with `#` are skipped
pub fn parse_ignore_file<P: AsRef<Path>>(template_root: P) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();

    for pattern in DEFAULT_IGNORE_PATTERNS {
        builder.add(Glob::new(pattern)?);
    }

    let ignore_path = template_root.as_ref().join(IGNORE_FILE);
    if let Ok(contents) = read_to_string(&ignore_path) {
        for line in contents.lines().map(str::trim) {
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            builder.add(Glob::new(line)?);
        }
    } else {
        debug!("No {} in {}", IGNORE_FILE, template_root.as_ref().display());
    }

    Ok(builder.build()?)
}
