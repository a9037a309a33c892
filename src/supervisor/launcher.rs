// src/supervisor/launcher.rs

//! Pluggable process launcher.
//!
//! The supervisor talks to a [`ProcessLauncher`] instead of spawning OS
//! processes directly. Production code uses [`TokioLauncher`]; tests provide
//! a fake that records builds, launches and kills without touching the OS.

use std::future::Future;
use std::pin::Pin;
use std::process::ExitStatus;

use anyhow::{Context, Result};
use tokio::process::Child;

use super::command::CommandLine;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// How a command finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitOutcome {
    Success,
    /// Non-zero exit code, or `-1` when terminated by a signal.
    Failed(i32),
}

impl ExitOutcome {
    pub fn from_status(status: ExitStatus) -> Self {
        if status.success() {
            ExitOutcome::Success
        } else {
            ExitOutcome::Failed(status.code().unwrap_or(-1))
        }
    }
}

/// Starts commands on behalf of the supervisor.
pub trait ProcessLauncher: Send + Sync + 'static {
    /// Run `cmd` and wait for it to exit (used for the build command).
    ///
    /// `Err` means the command could not be started or waited on.
    fn run_to_completion<'a>(&'a self, cmd: &'a CommandLine) -> BoxFuture<'a, Result<ExitOutcome>>;

    /// Start `cmd` and return as soon as it is running (used for the run command).
    fn launch(&self, cmd: &CommandLine) -> Result<Box<dyn LaunchedProcess>>;
}

/// A started long-running process.
pub trait LaunchedProcess: Send {
    /// OS process id, if the process is still known to the OS.
    fn id(&self) -> Option<u32>;

    /// Wait for the process to exit. Must be cancel-safe.
    fn wait(&mut self) -> BoxFuture<'_, Result<ExitOutcome>>;

    /// Forcefully terminate the process and reap it.
    fn kill(&mut self) -> BoxFuture<'_, Result<()>>;
}

/// Real launcher backed by `tokio::process`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioLauncher;

impl ProcessLauncher for TokioLauncher {
    fn run_to_completion<'a>(&'a self, cmd: &'a CommandLine) -> BoxFuture<'a, Result<ExitOutcome>> {
        Box::pin(async move {
            let status = cmd
                .to_command()
                .status()
                .await
                .with_context(|| format!("running `{cmd}`"))?;
            Ok(ExitOutcome::from_status(status))
        })
    }

    fn launch(&self, cmd: &CommandLine) -> Result<Box<dyn LaunchedProcess>> {
        let mut command = cmd.to_command();
        // Reaped by the supervising task; if that task is torn down with the
        // runtime, the child goes with it.
        command.kill_on_drop(true);
        let child = command
            .spawn()
            .with_context(|| format!("spawning `{cmd}`"))?;
        Ok(Box::new(TokioProcess { child }))
    }
}

struct TokioProcess {
    child: Child,
}

impl LaunchedProcess for TokioProcess {
    fn id(&self) -> Option<u32> {
        self.child.id()
    }

    fn wait(&mut self) -> BoxFuture<'_, Result<ExitOutcome>> {
        Box::pin(async move {
            let status = self.child.wait().await.context("waiting for run command")?;
            Ok(ExitOutcome::from_status(status))
        })
    }

    fn kill(&mut self) -> BoxFuture<'_, Result<()>> {
        Box::pin(async move { self.child.kill().await.context("killing run command") })
    }
}
