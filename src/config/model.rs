// src/config/model.rs

use std::time::Duration;

use serde::Deserialize;

use crate::supervisor::CommandLine;
use crate::types::DebouncePolicy;
use crate::watch::{PathMatcher, WatchRoot};

/// Optional config file as read from TOML.
///
/// ```toml
/// [watch]
/// dir = "./"
/// include = '(.+\.go|.+\.c)$'
/// exclude = '(.git|vendor)$'
/// debounce_ms = 700
/// debounce_policy = "restart"
///
/// [commands]
/// build = "go install -v"
/// run = ["./app", "--port", "8080"]
/// ```
///
/// Every key is optional; CLI flags override whatever is set here.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawConfigFile {
    #[serde(default)]
    pub watch: WatchSection,

    #[serde(default)]
    pub commands: CommandsSection,
}

/// `[watch]` section.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WatchSection {
    /// Directory to watch, relative to the current working directory.
    pub dir: Option<String>,
    /// Regex of files to include; `""` disables the filter.
    pub include: Option<String>,
    /// Regex of directories to exclude; `""` disables the filter.
    pub exclude: Option<String>,
    pub debounce_ms: Option<u64>,
    pub debounce_policy: Option<DebouncePolicy>,
}

/// `[commands]` section.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CommandsSection {
    pub build: Option<CommandSpec>,
    pub run: Option<CommandSpec>,
}

/// A command either as one whitespace-separated line or as an explicit argv.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum CommandSpec {
    Line(String),
    Argv(Vec<String>),
}

/// Inputs after precedence (CLI > file > default) has been applied, but
/// before anything has been checked.
#[derive(Debug, Clone)]
pub struct SettingsInputs {
    pub watch_dir: String,
    pub include: String,
    pub exclude: String,
    pub build: CommandSpec,
    pub run: Option<CommandSpec>,
    pub debounce_ms: u64,
    pub debounce_policy: DebouncePolicy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DebounceSettings {
    pub delay: Duration,
    pub policy: DebouncePolicy,
}

/// Everything the watcher needs.
#[derive(Debug, Clone)]
pub struct WatchSettings {
    pub root: WatchRoot,
    pub matcher: PathMatcher,
    pub debounce: DebounceSettings,
}

/// Validated settings for one autobuild session. Immutable once built.
#[derive(Debug, Clone)]
pub struct Settings {
    pub watch: WatchSettings,
    pub build: CommandLine,
    pub run: CommandLine,
}
