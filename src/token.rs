//! File tree transformations driven by plain strings and marker tokens.
//!
//! Nothing here knows about handlers or configuration: processors pass the
//! concrete needles, replacements and marker names.
//!
//! A conditional block in a template looks like:
//! ```text
//! #;< HOSTING_LAGOON
//! LAGOON_PROJECT=your-hosting-project
//! #;> HOSTING_LAGOON
//! ```

use log::debug;
use regex::{Regex, RegexBuilder};
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

use crate::constants::{
    BEGIN_MARKER_PREFIX, BINARY_EXTENSIONS, DEFAULT_IGNORE_PATHS, END_MARKER_PREFIX,
    INTERNAL_PATHS,
};
use crate::error::{Error, Result};

const REGEX_DELIMITERS: &[char] = &['/', '#', '~', '|', '@', '%'];

/// What a search string is matched as.
#[derive(Debug, Clone)]
pub enum Needle {
    Literal(String),
    Pattern(Regex),
}

impl Needle {
    /// Treats `needle` as a regular expression when it is delimited like
    /// `/pattern/flags` and compiles; otherwise as a literal substring.
    ///
    /// Supported flags: `i`, `m`, `s`, `x`, `U` (swap greed) and `u` (no-op).
    pub fn parse(needle: &str) -> Self {
        match parse_delimited_regex(needle) {
            Some(regex) => Needle::Pattern(regex),
            None => Needle::Literal(needle.to_string()),
        }
    }

    pub fn is_pattern(&self) -> bool {
        matches!(self, Needle::Pattern(_))
    }

    /// Replaces every match. Pattern replacements may refer to groups as `$1`.
    pub fn replace_all(&self, haystack: &str, replacement: &str) -> String {
        match self {
            Needle::Literal(literal) => haystack.replace(literal.as_str(), replacement),
            Needle::Pattern(regex) => regex.replace_all(haystack, replacement).into_owned(),
        }
    }
}

fn parse_delimited_regex(needle: &str) -> Option<Regex> {
    let delimiter = needle.chars().next().filter(|c| REGEX_DELIMITERS.contains(c))?;
    let body = &needle[delimiter.len_utf8()..];
    let closing = body.rfind(delimiter)?;
    let (pattern, flags) = (&body[..closing], &body[closing + delimiter.len_utf8()..]);

    if pattern.is_empty() || !flags.chars().all(|f| "imsxuU".contains(f)) {
        return None;
    }

    RegexBuilder::new(pattern)
        .case_insensitive(flags.contains('i'))
        .multi_line(flags.contains('m'))
        .dot_matches_new_line(flags.contains('s'))
        .ignore_whitespace(flags.contains('x'))
        .swap_greed(flags.contains('U'))
        .build()
        .ok()
}

/// Whether a marker block is removed together with its content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenMode {
    /// Drop the marker lines and every line between them.
    WithContent,
    /// Drop the marker lines only.
    MarkersOnly,
}

/// A conditional region delimited by a begin and an end marker line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub begin: String,
    pub end: String,
    pub mode: TokenMode,
}

impl Token {
    /// A token whose end marker is the same as its begin marker.
    pub fn new<S: Into<String>>(begin: S, mode: TokenMode) -> Self {
        let begin = begin.into();
        Self { end: begin.clone(), begin, mode }
    }

    pub fn with_end<S: Into<String>>(mut self, end: S) -> Self {
        self.end = end.into();
        self
    }

    /// The `#;< NAME` / `#;> NAME` pair. A name prefixed with `!` is the
    /// negated branch of the same decision.
    pub fn named(name: &str, mode: TokenMode) -> Self {
        Self::new(format!("{BEGIN_MARKER_PREFIX}{name}"), mode)
            .with_end(format!("{END_MARKER_PREFIX}{name}"))
    }
}

fn relative_string(root: &Path, path: &Path, is_dir: bool) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);
    let mut s = String::from("/");
    s.push_str(
        &relative.components().map(|c| c.as_os_str().to_string_lossy()).collect::<Vec<_>>().join("/"),
    );
    if is_dir {
        s.push('/');
    }
    s
}

fn is_ignored(relative: &str, ignore: &[&str]) -> bool {
    ignore
        .iter()
        .chain(DEFAULT_IGNORE_PATHS)
        .chain(INTERNAL_PATHS)
        .any(|fragment| relative.contains(fragment))
}

fn walk<'a>(
    root: &'a Path,
    ignore: &'a [&'a str],
    contents_first: bool,
) -> impl Iterator<Item = DirEntry> + 'a {
    WalkDir::new(root)
        .min_depth(1)
        .sort_by_file_name()
        .contents_first(contents_first)
        .into_iter()
        .filter_entry(move |entry| {
            let relative = relative_string(root, entry.path(), entry.file_type().is_dir());
            !is_ignored(&relative, ignore)
        })
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                debug!("Skipping unreadable entry: {e}");
                None
            }
        })
}

/// Lists every path under `root`, sorted by name, depth first.
///
/// A path is excluded when any `ignore` fragment (or any built-in fragment)
/// occurs in its root-relative form, e.g. `/vendor/` or `/LICENSE`.
/// Directories are listed only when `include_dirs` is set.
pub fn scan_tree<P: AsRef<Path>>(root: P, ignore: &[&str], include_dirs: bool) -> Vec<PathBuf> {
    let root = root.as_ref();
    walk(root, ignore, false)
        .filter(|entry| include_dirs || !entry.file_type().is_dir())
        .map(|entry| entry.into_path())
        .collect()
}

fn is_binary(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| BINARY_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
}

fn read_text(path: &Path) -> Option<String> {
    if is_binary(path) {
        debug!("Skipping binary file {}", path.display());
        return None;
    }
    match fs::read_to_string(path) {
        Ok(content) => Some(content),
        Err(e) => {
            debug!("Skipping unreadable file {}: {}", path.display(), e);
            None
        }
    }
}

fn replace_needle_in_file(path: &Path, needle: &Needle, replacement: &str) -> Result<bool> {
    let Some(content) = read_text(path) else {
        return Ok(false);
    };

    let replaced = needle.replace_all(&content, replacement);
    if replaced == content {
        return Ok(false);
    }

    fs::write(path, replaced)?;
    Ok(true)
}

/// Replaces `needle` in one file. Returns whether the file was rewritten.
pub fn replace_in_file<P: AsRef<Path>>(path: P, needle: &str, replacement: &str) -> Result<bool> {
    replace_needle_in_file(path.as_ref(), &Needle::parse(needle), replacement)
}

/// Replaces `needle` in every scanned file under `root`. Returns the number of files rewritten.
pub fn replace_in_tree<P: AsRef<Path>>(root: P, needle: &str, replacement: &str) -> Result<usize> {
    let needle = Needle::parse(needle);
    let mut changed = 0;
    for path in scan_tree(root, &[], false) {
        if replace_needle_in_file(&path, &needle, replacement)? {
            changed += 1;
        }
    }
    Ok(changed)
}

/// Removes the blocks delimited by `token` from one file.
///
/// The marker lines are always dropped; lines between them are dropped in
/// [`TokenMode::WithContent`]. Fails without touching the file when the
/// number of begin lines differs from the number of end lines.
pub fn remove_token<P: AsRef<Path>>(path: P, token: &Token) -> Result<bool> {
    let path = path.as_ref();
    let Some(content) = read_text(path) else {
        return Ok(false);
    };

    let begin_count = content.lines().filter(|line| line.contains(&token.begin)).count();
    let end_count = content.lines().filter(|line| line.contains(&token.end)).count();
    let inconsistent = || Error::TemplateConsistencyError {
        path: path.to_path_buf(),
        begin: token.begin.clone(),
        end: token.end.clone(),
        begin_count,
        end_count,
    };

    if begin_count != end_count {
        return Err(inconsistent());
    }
    if begin_count == 0 {
        return Ok(false);
    }

    let same_markers = token.begin == token.end;
    let mut depth = 0usize;
    let mut output = String::with_capacity(content.len());

    for line in content.split_inclusive('\n') {
        if line.contains(&token.begin) && (depth == 0 || !same_markers) {
            depth += 1;
            continue;
        }
        if line.contains(&token.end) {
            // An end marker with no open block.
            depth = depth.checked_sub(1).ok_or_else(inconsistent)?;
            continue;
        }
        if depth > 0 && token.mode == TokenMode::WithContent {
            continue;
        }
        output.push_str(line);
    }

    // A block left open would swallow the rest of the file.
    if depth != 0 {
        return Err(inconsistent());
    }

    debug!("Removed '{}' blocks from {}", token.begin, path.display());
    fs::write(path, output)?;
    Ok(true)
}

/// Removes `#;< name` / `#;> name` blocks from every scanned file under `root`.
///
/// Stops at the first unbalanced file; files processed before it keep their changes.
pub fn remove_token_in_tree<P: AsRef<Path>>(root: P, name: &str, mode: TokenMode) -> Result<usize> {
    let token = Token::named(name, mode);
    let mut changed = 0;
    for path in scan_tree(root, &[], false) {
        if remove_token(&path, &token)? {
            changed += 1;
        }
    }
    Ok(changed)
}

/// Moves every file whose root-relative path contains `search` to the path
/// with `search` replaced, creating parent directories first. Directories
/// left empty by the moves are removed. Returns the number of files moved.
pub fn rename_paths_containing<P: AsRef<Path>>(root: P, search: &str, replace: &str) -> Result<usize> {
    let root = root.as_ref();
    if search.is_empty() || search == replace {
        return Ok(0);
    }

    let mut moved = 0;
    for from in scan_tree(root, &[], false) {
        let relative = relative_string(root, &from, false);
        if !relative.contains(search) {
            continue;
        }

        let to = root.join(relative.replace(search, replace).trim_start_matches('/'));
        move_path(&from, &to)?;
        debug!("Moved {} to {}", from.display(), to.display());
        moved += 1;
    }

    let directories: Vec<PathBuf> = walk(root, &[], true)
        .filter(|entry| entry.file_type().is_dir())
        .map(|entry| entry.into_path())
        .collect();

    for dir in directories {
        let relative = relative_string(root, &dir, true);
        if !relative.contains(search) || !is_empty_dir(&dir) {
            continue;
        }
        let target = root.join(relative.replace(search, replace).trim_matches('/'));
        fs::create_dir_all(&target)
            .map_err(|source| Error::RenameError { from: dir.clone(), to: target.clone(), source })?;
        fs::remove_dir(&dir)
            .map_err(|source| Error::RenameError { from: dir.clone(), to: target, source })?;
    }

    Ok(moved)
}

fn move_path(from: &Path, to: &Path) -> Result<()> {
    if let Some(parent) = to.parent() {
        fs::create_dir_all(parent).map_err(|source| Error::RenameError {
            from: from.to_path_buf(),
            to: to.to_path_buf(),
            source,
        })?;
    }
    fs::rename(from, to).map_err(|source| Error::RenameError {
        from: from.to_path_buf(),
        to: to.to_path_buf(),
        source,
    })
}

fn is_empty_dir(path: &Path) -> bool {
    fs::read_dir(path).map(|mut entries| entries.next().is_none()).unwrap_or(false)
}

/// Deletes files or whole directories given relative to `root`. Missing paths are ignored.
pub fn remove_paths<P: AsRef<Path>>(root: P, relative: &[&str]) -> Result<()> {
    let root = root.as_ref();
    for rel in relative {
        let path = root.join(rel);
        if path.is_dir() {
            debug!("Removing directory {}", path.display());
            fs::remove_dir_all(&path)?;
        } else if path.exists() {
            debug!("Removing file {}", path.display());
            fs::remove_file(&path)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_needle_detects_delimited_regex() {
        assert!(Needle::parse("/your_(site|org)/").is_pattern());
        assert!(Needle::parse("#^TZ=.*$#m").is_pattern());
        assert!(Needle::parse("~web/~i").is_pattern());
    }

    #[test]
    fn test_needle_falls_back_to_literal() {
        assert!(!Needle::parse("your_site").is_pattern());
        assert!(!Needle::parse("#;< FOO").is_pattern());
        assert!(!Needle::parse("/unclosed(/").is_pattern());
        assert!(!Needle::parse("/pattern/q").is_pattern());
        assert!(!Needle::parse("//").is_pattern());
    }

    #[test]
    fn test_needle_flags() {
        let needle = Needle::parse("/^tz=utc$/im");
        assert_eq!(needle.replace_all("A=1\nTZ=UTC\n", "TZ=CET"), "A=1\nTZ=CET\n");
    }

    #[test]
    fn test_relative_string() {
        let root = Path::new("/tmp/root");
        assert_eq!(relative_string(root, Path::new("/tmp/root/web/index.php"), false), "/web/index.php");
        assert_eq!(relative_string(root, Path::new("/tmp/root/web"), true), "/web/");
    }

    #[test]
    fn test_binary_extensions_are_case_insensitive() {
        assert!(is_binary(Path::new("logo.PNG")));
        assert!(!is_binary(Path::new("logo.svg")));
    }
}
