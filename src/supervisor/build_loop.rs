// src/supervisor/build_loop.rs

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::types::RebuildSignal;

use super::command::CommandLine;
use super::launcher::{ExitOutcome, ProcessLauncher};
use super::managed::{restart_locked, ManagedProcess};

/// Serializes rebuilds and owns the managed application process.
pub struct Supervisor {
    build: CommandLine,
    run: CommandLine,
    launcher: Arc<dyn ProcessLauncher>,
    managed: ManagedProcess,
}

impl std::fmt::Debug for Supervisor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Supervisor")
            .field("build", &self.build)
            .field("run", &self.run)
            .finish_non_exhaustive()
    }
}

impl Supervisor {
    pub fn new(build: CommandLine, run: CommandLine, launcher: Arc<dyn ProcessLauncher>) -> Self {
        Self {
            build,
            run,
            launcher,
            managed: ManagedProcess::new(),
        }
    }

    /// Handle to the managed process, e.g. for shutdown.
    pub fn managed(&self) -> ManagedProcess {
        self.managed.clone()
    }

    /// Main loop: one rebuild per signal, strictly one after another.
    ///
    /// Runs until every sender of `signals` is gone.
    pub async fn run(self, mut signals: mpsc::Receiver<RebuildSignal>) {
        info!("supervisor started");

        while let Some(RebuildSignal) = signals.recv().await {
            self.rebuild().await;
        }

        info!("rebuild channel closed; supervisor stopping");
    }

    /// Run the build command to completion and, on success, schedule a
    /// restart of the application. Returns whether the build succeeded.
    ///
    /// The restart runs in its own task, so this returns as soon as that task
    /// owns the process lock.
    pub async fn rebuild(&self) -> bool {
        info!(cmd = %self.build, "running build command");

        let outcome = match self.launcher.run_to_completion(&self.build).await {
            Ok(outcome) => outcome,
            Err(err) => {
                warn!(error = %err, "could not run build command");
                ExitOutcome::Failed(-1)
            }
        };

        match outcome {
            ExitOutcome::Success => {
                info!("build succeeded; restarting application");
                self.spawn_restart().await;
                true
            }
            ExitOutcome::Failed(code) => {
                warn!(exit_code = code, "build failed; waiting for next change");
                self.managed.kill().await;
                false
            }
        }
    }

    async fn spawn_restart(&self) {
        // Taken here rather than in the task so that a later failed build's
        // kill is ordered after this restart.
        let guard = self.managed.lock().await;
        let launcher = Arc::clone(&self.launcher);
        let cmd = self.run.clone();

        tokio::spawn(async move {
            restart_locked(guard, launcher.as_ref(), &cmd).await;
        });
    }
}
