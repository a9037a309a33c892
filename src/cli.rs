// src/cli.rs

//! CLI argument parsing using `clap`.
//!
//! Every setting is optional here so that [`crate::config`] can tell an
//! explicit flag apart from a value that should come from the config file or
//! the built-in defaults.

use clap::{Parser, ValueEnum};

use crate::types::DebouncePolicy;

/// Command-line arguments for `autobuild`.
#[derive(Debug, Clone, Default, Parser)]
#[command(
    name = "autobuild",
    version,
    about = "Rebuild on source changes and restart your application.",
    long_about = None
)]
pub struct CliArgs {
    /// Directory to watch for changes (recursive).
    ///
    /// Default: `./`.
    #[arg(long, value_name = "DIR")]
    pub watch: Option<String>,

    /// Regex of file paths to include. An empty string disables the filter.
    #[arg(long, value_name = "REGEX")]
    pub include: Option<String>,

    /// Regex of directory paths to exclude. An empty string disables the filter.
    #[arg(long, value_name = "REGEX")]
    pub exclude: Option<String>,

    /// Command to build/compile the program.
    #[arg(long, value_name = "CMD")]
    pub build: Option<String>,

    /// Command to run your application.
    #[arg(long, value_name = "CMD")]
    pub run: Option<String>,

    /// Quiet period in milliseconds before a burst of changes triggers a build.
    #[arg(long, value_name = "MS")]
    pub debounce_ms: Option<u64>,

    /// How bursts of changes are coalesced (restart, fixed).
    #[arg(long, value_name = "POLICY")]
    pub debounce_policy: Option<DebouncePolicy>,

    /// Optional TOML config file.
    ///
    /// If omitted, `Autobuild.toml` in the current directory is used when present.
    #[arg(long, value_name = "PATH")]
    pub config: Option<String>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `AUTOBUILD_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Resolve and validate settings, print them, but don't run anything.
    #[arg(long)]
    pub dry_run: bool,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
