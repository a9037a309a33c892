// src/supervisor/mod.rs

//! Build/run process supervision.
//!
//! - [`command`] holds the argument-vector type for build and run commands.
//! - [`launcher`] provides the `ProcessLauncher` seam and the tokio-backed
//!   implementation used in production.
//! - [`managed`] owns the single managed process and its lock.
//! - [`build_loop`] is the supervisor loop that consumes rebuild signals.

pub mod build_loop;
pub mod command;
pub mod launcher;
pub mod managed;

pub use build_loop::Supervisor;
pub use command::CommandLine;
pub use launcher::{BoxFuture, ExitOutcome, LaunchedProcess, ProcessLauncher, TokioLauncher};
pub use managed::{restart_locked, ManagedProcess, ProcessGuard, ProcessSlot};
