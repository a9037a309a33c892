// src/config/loader.rs

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::cli::CliArgs;
use crate::config::model::{CommandSpec, RawConfigFile, Settings, SettingsInputs};
use crate::errors::{AutobuildError, Result};
use crate::fs::FileSystem;
use crate::watch::{DEFAULT_DEBOUNCE, DEFAULT_EXCLUDE, DEFAULT_INCLUDE};

/// Config file picked up from the working directory when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "Autobuild.toml";

/// Default build command.
pub const DEFAULT_BUILD: &str = "go install -v";

/// Default watch directory.
pub const DEFAULT_WATCH_DIR: &str = "./";

/// Load a configuration file and return the raw `RawConfigFile`.
///
/// This only performs TOML deserialization; it does **not** check the values.
pub fn load_from_path(fs: &dyn FileSystem, path: &Path) -> Result<RawConfigFile> {
    let contents = fs.read_to_string(path)?;
    let config: RawConfigFile = toml::from_str(&contents)?;
    Ok(config)
}

/// Resolve the final [`Settings`] from CLI flags, the optional config file and
/// built-in defaults, then validate them.
///
/// - An explicit `--config` must exist.
/// - Without it, `Autobuild.toml` in `cwd` is used only if present.
pub fn resolve_settings(args: &CliArgs, fs: &dyn FileSystem, cwd: &Path) -> Result<Settings> {
    let file = load_config_file(args, fs, cwd)?;
    let inputs = merge_inputs(args, file);
    debug!(?inputs, "merged configuration inputs");
    Settings::validate(inputs, fs, cwd)
}

fn load_config_file(args: &CliArgs, fs: &dyn FileSystem, cwd: &Path) -> Result<RawConfigFile> {
    match &args.config {
        Some(path) => {
            let path = cwd.join(path);
            if !fs.exists(&path) {
                return Err(AutobuildError::ConfigError(format!(
                    "config file {:?} does not exist",
                    path
                )));
            }
            debug!(?path, "loading config file");
            load_from_path(fs, &path)
        }
        None => {
            let path: PathBuf = cwd.join(DEFAULT_CONFIG_FILE);
            if fs.exists(&path) {
                debug!(?path, "loading default config file");
                load_from_path(fs, &path)
            } else {
                Ok(RawConfigFile::default())
            }
        }
    }
}

/// Apply precedence: CLI flag > config file > built-in default.
pub fn merge_inputs(args: &CliArgs, file: RawConfigFile) -> SettingsInputs {
    let watch = file.watch;
    let commands = file.commands;

    SettingsInputs {
        watch_dir: args
            .watch
            .clone()
            .or(watch.dir)
            .unwrap_or_else(|| DEFAULT_WATCH_DIR.to_string()),
        include: args
            .include
            .clone()
            .or(watch.include)
            .unwrap_or_else(|| DEFAULT_INCLUDE.to_string()),
        exclude: args
            .exclude
            .clone()
            .or(watch.exclude)
            .unwrap_or_else(|| DEFAULT_EXCLUDE.to_string()),
        build: args
            .build
            .clone()
            .map(CommandSpec::Line)
            .or(commands.build)
            .unwrap_or_else(|| CommandSpec::Line(DEFAULT_BUILD.to_string())),
        run: args.run.clone().map(CommandSpec::Line).or(commands.run),
        debounce_ms: args
            .debounce_ms
            .or(watch.debounce_ms)
            .unwrap_or(DEFAULT_DEBOUNCE.as_millis() as u64),
        debounce_policy: args
            .debounce_policy
            .or(watch.debounce_policy)
            .unwrap_or_default(),
    }
}
