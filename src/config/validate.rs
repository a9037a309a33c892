// src/config/validate.rs

use std::path::{Component, Path, PathBuf};
use std::time::Duration;

use crate::config::model::{
    CommandSpec, DebounceSettings, Settings, SettingsInputs, WatchSettings,
};
use crate::errors::{AutobuildError, Result};
use crate::fs::FileSystem;
use crate::supervisor::CommandLine;
use crate::watch::{PathMatcher, WatchRoot};

impl Settings {
    /// Check merged inputs and build the immutable session settings.
    ///
    /// Every failure here is a fatal setup error.
    pub fn validate(inputs: SettingsInputs, fs: &dyn FileSystem, cwd: &Path) -> Result<Settings> {
        let root = validate_watch_root(&inputs.watch_dir, fs, cwd)?;
        let matcher = PathMatcher::compile(&inputs.include, &inputs.exclude)?;
        let build = validate_command("build", Some(&inputs.build))?;
        let run = validate_command("run", inputs.run.as_ref())?;

        if inputs.debounce_ms == 0 {
            return Err(AutobuildError::ConfigError(
                "debounce_ms must be >= 1 (got 0)".to_string(),
            ));
        }

        Ok(Settings {
            watch: WatchSettings {
                root,
                matcher,
                debounce: DebounceSettings {
                    delay: Duration::from_millis(inputs.debounce_ms),
                    policy: inputs.debounce_policy,
                },
            },
            build,
            run,
        })
    }
}

fn validate_watch_root(raw: &str, fs: &dyn FileSystem, cwd: &Path) -> Result<WatchRoot> {
    let path = absolutize(cwd, Path::new(raw));
    if !fs.is_dir(&path) {
        let reason = if fs.exists(&path) {
            "not a directory"
        } else {
            "no such directory"
        };
        return Err(AutobuildError::InvalidWatchDir {
            path,
            reason: reason.to_string(),
        });
    }
    // Backends may report resolved paths (symlinked roots, /var -> /private/var).
    let path = fs.canonicalize(&path).unwrap_or(path);
    Ok(WatchRoot::new_unchecked(path))
}

fn validate_command(name: &'static str, spec: Option<&CommandSpec>) -> Result<CommandLine> {
    let parsed = match spec {
        Some(CommandSpec::Line(line)) => CommandLine::parse(line),
        Some(CommandSpec::Argv(argv)) => CommandLine::from_argv(argv.clone()),
        None => None,
    };
    parsed.ok_or(AutobuildError::MissingCommand(name))
}

/// Make `path` absolute against `cwd` and drop `.`/`..` components lexically,
/// without resolving symlinks.
pub fn absolutize(cwd: &Path, path: &Path) -> PathBuf {
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        cwd.join(path)
    };

    let mut out = PathBuf::new();
    for component in joined.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}
