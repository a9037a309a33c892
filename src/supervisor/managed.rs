// src/supervisor/managed.rs

//! The single managed application process.
//!
//! All state about "which process is current" lives in one [`ProcessSlot`]
//! behind one async mutex. Stopping the old process and recording the new one
//! happen while the same guard is held, so a concurrent `kill` either runs
//! entirely before the replacement (and finds nothing) or entirely after it
//! (and stops the new process). Two processes are never both current.
//!
//! The task that launches a process also supervises it: it waits for either
//! the process to exit on its own or a stop request, and acknowledges a stop
//! only after the process has been killed and reaped.

use std::sync::Arc;

use tokio::sync::{oneshot, Mutex, OwnedMutexGuard};
use tracing::{debug, error, info, warn};

use super::command::CommandLine;
use super::launcher::{ExitOutcome, ProcessLauncher};

/// Exclusive access to the slot. Held across kill-then-launch.
pub type ProcessGuard = OwnedMutexGuard<ProcessSlot>;

/// Shared handle to the managed process record.
#[derive(Debug, Clone, Default)]
pub struct ManagedProcess {
    slot: Arc<Mutex<ProcessSlot>>,
}

/// Current process (if any) and a launch counter.
#[derive(Debug, Default)]
pub struct ProcessSlot {
    current: Option<RunningProcess>,
    launches: u64,
}

#[derive(Debug)]
struct RunningProcess {
    generation: u64,
    pid: Option<u32>,
    stop_tx: oneshot::Sender<()>,
    exited_rx: oneshot::Receiver<()>,
}

impl ManagedProcess {
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquire the slot; the returned guard can be moved into another task.
    pub async fn lock(&self) -> ProcessGuard {
        Arc::clone(&self.slot).lock_owned().await
    }

    pub async fn is_running(&self) -> bool {
        self.slot.lock().await.is_running()
    }

    pub async fn current_pid(&self) -> Option<u32> {
        self.slot.lock().await.pid()
    }

    /// Stop the current process, if any, and release the lock.
    pub async fn kill(&self) {
        let mut guard = self.lock().await;
        guard.stop_current().await;
    }
}

impl ProcessSlot {
    pub fn is_running(&self) -> bool {
        self.current.is_some()
    }

    pub fn pid(&self) -> Option<u32> {
        self.current.as_ref().and_then(|p| p.pid)
    }

    /// Number of processes launched through this slot so far.
    pub fn launches(&self) -> u64 {
        self.launches
    }

    /// Stop the current process and wait until it is gone.
    ///
    /// Returns whether there was a process to stop. A process that already
    /// exited on its own counts as stopped.
    pub async fn stop_current(&mut self) -> bool {
        let Some(running) = self.current.take() else {
            return false;
        };

        debug!(pid = ?running.pid, generation = running.generation, "stopping run command");
        if running.stop_tx.send(()).is_err() {
            debug!(pid = ?running.pid, "run command already exited");
        }
        // Resolves once the supervising task has reaped the process, or
        // immediately if that task is gone.
        let _ = running.exited_rx.await;
        true
    }
}

/// Kill whatever the guard's slot holds, then launch `cmd` as the new
/// managed process. Used by the supervisor, which takes the guard before
/// spawning this so restarts are applied in build order.
pub async fn restart_locked(
    mut guard: ProcessGuard,
    launcher: &dyn ProcessLauncher,
    cmd: &CommandLine,
) {
    guard.stop_current().await;
    execute_managed(guard, launcher, cmd).await;
}

/// Launch `cmd`, record it in the slot, release the lock, and supervise the
/// process until it exits or is stopped.
///
/// The process ending, including because it was killed, is expected and not
/// reported as an error.
async fn execute_managed(
    mut guard: ProcessGuard,
    launcher: &dyn ProcessLauncher,
    cmd: &CommandLine,
) {
    let mut process = match launcher.launch(cmd) {
        Ok(process) => process,
        Err(err) => {
            error!(cmd = %cmd, error = %err, "could not start run command");
            return;
        }
    };

    let (stop_tx, mut stop_rx) = oneshot::channel::<()>();
    let (exited_tx, exited_rx) = oneshot::channel::<()>();

    guard.launches += 1;
    let generation = guard.launches;
    let pid = process.id();
    guard.current = Some(RunningProcess {
        generation,
        pid,
        stop_tx,
        exited_rx,
    });
    let slot = Arc::clone(OwnedMutexGuard::mutex(&guard));
    drop(guard);

    info!(pid = ?pid, cmd = %cmd, "executing run command");

    tokio::select! {
        outcome = process.wait() => {
            match outcome {
                Ok(ExitOutcome::Success) => info!(pid = ?pid, "run command exited"),
                Ok(ExitOutcome::Failed(code)) => {
                    info!(pid = ?pid, exit_code = code, "run command exited with non-zero status")
                }
                Err(err) => warn!(pid = ?pid, error = %err, "lost track of run command"),
            }
            // Acknowledge before locking: a stopper may be holding the lock
            // while it waits for this.
            let _ = exited_tx.send(());

            let mut slot = slot.lock().await;
            if slot.current.as_ref().is_some_and(|c| c.generation == generation) {
                slot.current = None;
            }
        }
        _ = &mut stop_rx => {
            match process.kill().await {
                Ok(()) => info!(pid = ?pid, "killed run command"),
                Err(err) => error!(pid = ?pid, error = %err, "could not kill process"),
            }
            let _ = exited_tx.send(());
        }
    }
}
