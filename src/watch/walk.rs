// src/watch/walk.rs

//! Directory enumeration and per-directory watch registration.
//!
//! Every directory under the root is registered individually
//! (non-recursively), so an excluded directory and its whole subtree never
//! produce events in the first place.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result as AnyResult};
use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use tracing::{debug, warn};

use crate::errors::{AutobuildError, Result};
use crate::fs::FileSystem;
use crate::watch::patterns::PathMatcher;

/// Something that can subscribe a single directory for change notifications.
///
/// Implemented for notify's `RecommendedWatcher` in production; tests use a
/// recording fake.
pub trait WatchRegistry: Send {
    fn register(&mut self, dir: &Path) -> AnyResult<()>;
}

impl WatchRegistry for RecommendedWatcher {
    fn register(&mut self, dir: &Path) -> AnyResult<()> {
        self.watch(dir, RecursiveMode::NonRecursive)
            .with_context(|| format!("adding {:?} to watcher", dir))
    }
}

/// Counters describing one walk.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WalkSummary {
    /// Directories successfully registered.
    pub registered: usize,
    /// Excluded directories (their subtrees are not counted).
    pub excluded: usize,
    /// Directories that could not be registered or enumerated.
    pub failed: usize,
}

/// Walk `top` and register every directory that is not excluded.
///
/// Failing to enumerate `top` itself is fatal: the caller asked for that
/// directory specifically. Problems further down are logged and counted.
pub fn register_tree(
    fs: &dyn FileSystem,
    registry: &mut dyn WatchRegistry,
    top: &Path,
    matcher: &PathMatcher,
) -> Result<WalkSummary> {
    let mut summary = WalkSummary::default();

    if matcher.is_excluded_dir(top) {
        debug!(dir = ?top, "watch root itself is excluded; nothing to register");
        summary.excluded += 1;
        return Ok(summary);
    }

    let top_entries = fs
        .read_dir(top)
        .map_err(|source| AutobuildError::WalkFailed {
            path: top.to_path_buf(),
            source,
        })?;

    register_one(registry, top, &mut summary);

    let mut stack: Vec<PathBuf> = subdirs(fs, top_entries);
    stack.reverse();

    while let Some(dir) = stack.pop() {
        if matcher.is_excluded_dir(&dir) {
            debug!(dir = ?dir, "skipping excluded directory");
            summary.excluded += 1;
            continue;
        }

        register_one(registry, &dir, &mut summary);

        match fs.read_dir(&dir) {
            Ok(entries) => {
                let mut children = subdirs(fs, entries);
                children.reverse();
                stack.extend(children);
            }
            Err(err) => {
                warn!(
                    dir = ?dir,
                    error = %err,
                    "could not read directory; its subtree is not watched"
                );
                summary.failed += 1;
            }
        }
    }

    Ok(summary)
}

fn register_one(registry: &mut dyn WatchRegistry, dir: &Path, summary: &mut WalkSummary) {
    match registry.register(dir) {
        Ok(()) => {
            debug!(dir = ?dir, "watching directory");
            summary.registered += 1;
        }
        Err(err) => {
            warn!(dir = ?dir, error = %err, "issue adding directory to watch");
            summary.failed += 1;
        }
    }
}

fn subdirs(fs: &dyn FileSystem, entries: Vec<PathBuf>) -> Vec<PathBuf> {
    entries.into_iter().filter(|p| fs.is_dir(p)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::mock::MockFileSystem;
    use anyhow::anyhow;

    #[derive(Default)]
    struct Recorder {
        dirs: Vec<PathBuf>,
        reject: Vec<PathBuf>,
    }

    impl WatchRegistry for Recorder {
        fn register(&mut self, dir: &Path) -> AnyResult<()> {
            if self.reject.iter().any(|r| r == dir) {
                return Err(anyhow!("too many watches"));
            }
            self.dirs.push(dir.to_path_buf());
            Ok(())
        }
    }

    fn project() -> MockFileSystem {
        let fs = MockFileSystem::new();
        fs.add_file("/proj/main.go", b"package main".to_vec());
        fs.add_file("/proj/pkg/api/api.go", b"package api".to_vec());
        fs.add_file("/proj/vendor/lib/x.go", b"package lib".to_vec());
        fs.add_dir("/proj/.git/objects");
        fs
    }

    #[test]
    fn registers_every_directory_except_excluded_subtrees() {
        let fs = project();
        let matcher = PathMatcher::compile(r"\.go$", r"(.git|vendor)$").unwrap();
        let mut rec = Recorder::default();

        let summary = register_tree(&fs, &mut rec, Path::new("/proj"), &matcher).unwrap();

        assert_eq!(
            rec.dirs,
            vec![
                PathBuf::from("/proj"),
                PathBuf::from("/proj/pkg"),
                PathBuf::from("/proj/pkg/api"),
            ]
        );
        assert_eq!(summary.registered, 3);
        assert_eq!(summary.excluded, 2);
        assert_eq!(summary.failed, 0);
    }

    #[test]
    fn missing_root_is_fatal() {
        let fs = MockFileSystem::new();
        let mut rec = Recorder::default();
        let err = register_tree(&fs, &mut rec, Path::new("/nope"), &PathMatcher::default())
            .unwrap_err();
        assert!(matches!(err, AutobuildError::WalkFailed { .. }));
        assert!(rec.dirs.is_empty());
    }

    #[test]
    fn registration_and_read_failures_are_not_fatal() {
        let fs = project();
        fs.mark_unreadable("/proj/pkg");
        let mut rec = Recorder {
            reject: vec![PathBuf::from("/proj/vendor")],
            ..Recorder::default()
        };

        let summary =
            register_tree(&fs, &mut rec, Path::new("/proj"), &PathMatcher::default()).unwrap();

        // /proj/pkg is registered but not descended; /proj/vendor is rejected
        // by the registry but its children are still walked.
        assert!(rec.dirs.contains(&PathBuf::from("/proj/pkg")));
        assert!(!rec.dirs.contains(&PathBuf::from("/proj/pkg/api")));
        assert!(rec.dirs.contains(&PathBuf::from("/proj/vendor/lib")));
        assert_eq!(summary.failed, 2);
    }

    #[test]
    fn excluded_root_registers_nothing() {
        let fs = project();
        let matcher = PathMatcher::compile("", "proj$").unwrap();
        let mut rec = Recorder::default();
        let summary = register_tree(&fs, &mut rec, Path::new("/proj"), &matcher).unwrap();
        assert!(rec.dirs.is_empty());
        assert_eq!(summary.excluded, 1);
    }
}
