// src/watch/patterns.rs

//! The watch root and the include/exclude path predicates.
//!
//! Both are built once during setup and never change afterwards. Patterns are
//! regular expressions evaluated against the full (absolute) path string:
//!
//! - `include` is checked against paths named by file events;
//! - `exclude` is checked against directory paths, both while walking the tree
//!   and for the ancestors of every event path.

use std::fmt;
use std::path::{Path, PathBuf};

use regex::Regex;

use crate::errors::{AutobuildError, Result};

/// Default include pattern: common compiled-source extensions.
pub const DEFAULT_INCLUDE: &str = r"(.+\.go|.+\.c)$";

/// Default exclude pattern: version-control and vendor directories.
pub const DEFAULT_EXCLUDE: &str = r"(.git|vendor)$";

/// Absolute, existing directory that is watched recursively.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchRoot(PathBuf);

impl WatchRoot {
    /// Wrap a path that the caller has already checked to be an absolute
    /// directory. See `config::validate` for the checked constructor.
    pub fn new_unchecked(path: impl Into<PathBuf>) -> Self {
        Self(path.into())
    }

    pub fn path(&self) -> &Path {
        &self.0
    }

    /// True if `path` is the root itself or lies beneath it.
    pub fn contains(&self, path: &Path) -> bool {
        path.starts_with(&self.0)
    }
}

impl fmt::Display for WatchRoot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.display())
    }
}

/// Optional include/exclude regexes used as pure predicates.
#[derive(Clone, Default)]
pub struct PathMatcher {
    include: Option<Regex>,
    exclude: Option<Regex>,
}

impl fmt::Debug for PathMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PathMatcher")
            .field("include", &self.include_pattern())
            .field("exclude", &self.exclude_pattern())
            .finish()
    }
}

impl PathMatcher {
    /// Compile both patterns. An empty string disables that side.
    pub fn compile(include: &str, exclude: &str) -> Result<Self> {
        Ok(Self {
            include: compile_optional("include", include)?,
            exclude: compile_optional("exclude", exclude)?,
        })
    }

    pub fn include_pattern(&self) -> Option<&str> {
        self.include.as_ref().map(Regex::as_str)
    }

    pub fn exclude_pattern(&self) -> Option<&str> {
        self.exclude.as_ref().map(Regex::as_str)
    }

    /// Whether a file event path passes the include filter.
    ///
    /// Without an include pattern every path is included.
    pub fn is_included(&self, path: &Path) -> bool {
        match &self.include {
            Some(re) => re.is_match(&path.to_string_lossy()),
            None => true,
        }
    }

    /// Whether a directory should be skipped (together with its subtree).
    pub fn is_excluded_dir(&self, dir: &Path) -> bool {
        match &self.exclude {
            Some(re) => re.is_match(&dir.to_string_lossy()),
            None => false,
        }
    }

    /// Whether any directory between `root` (inclusive) and `path`
    /// (exclusive) is excluded.
    ///
    /// Excluded directories are never registered, but some backends still
    /// report events for them, e.g. the creation of a file in a directory
    /// that was renamed into an excluded name.
    pub fn lies_in_excluded_dir(&self, root: &WatchRoot, path: &Path) -> bool {
        if self.exclude.is_none() {
            return false;
        }
        path.ancestors()
            .skip(1)
            .take_while(|dir| root.contains(dir))
            .any(|dir| self.is_excluded_dir(dir))
    }
}

fn compile_optional(name: &'static str, pattern: &str) -> Result<Option<Regex>> {
    if pattern.is_empty() {
        return Ok(None);
    }
    Regex::new(pattern)
        .map(Some)
        .map_err(|source| AutobuildError::InvalidPattern { name, source })
}
