//! Common constants used throughout the Kiln application.

/// Prefix of a line opening a conditional block.
pub const BEGIN_MARKER_PREFIX: &str = "#;< ";

/// Prefix of a line closing a conditional block.
pub const END_MARKER_PREFIX: &str = "#;> ";

/// Dependency key meaning "depends on runtime state rather than on another handler".
pub const SYSTEM_DEPENDENCY: &str = "_system";

/// Kiln's ignore file name, read from the template source
pub const IGNORE_FILE: &str = ".kilnignore";

/// Glob patterns never copied from a template source
pub const DEFAULT_IGNORE_PATTERNS: &[&str] =
    &["**/.git/**", "**/.git", "**/.DS_Store", "**/.kilnignore"];

/// Path fragments skipped by every tree operation.
pub const DEFAULT_IGNORE_PATHS: &[&str] =
    &["/.git/", "/.idea/", "/vendor/", "/node_modules/", "/.data/"];

/// Files that belong to the tool itself rather than to the generated project.
pub const INTERNAL_PATHS: &[&str] = &[
    "/LICENSE",
    "/CODE_OF_CONDUCT.md",
    "/CONTRIBUTING.md",
    "/SECURITY.md",
    "/.kiln/",
    IGNORE_FILE,
];

/// Extensions of files whose content is never rewritten.
pub const BINARY_EXTENSIONS: &[&str] =
    &["png", "jpg", "jpeg", "gif", "ico", "webp", "bmp", "tif", "tiff", "avif"];
