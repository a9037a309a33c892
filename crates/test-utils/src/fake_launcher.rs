use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::anyhow;
use tokio::sync::{oneshot, Notify};

use autobuild::supervisor::{
    BoxFuture, CommandLine, ExitOutcome, LaunchedProcess, ProcessLauncher,
};

/// Everything the fake launcher observed, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LauncherEvent {
    Build(String),
    Launch { id: u32, cmd: String },
    Kill { id: u32 },
    Exit { id: u32 },
}

#[derive(Default)]
struct Shared {
    events: Mutex<Vec<LauncherEvent>>,
    /// `None` makes the build fail to start.
    build_script: Mutex<VecDeque<Option<ExitOutcome>>>,
    build_delay: Mutex<Duration>,
    builds_in_flight: AtomicUsize,
    max_builds_in_flight: AtomicUsize,
    live: AtomicUsize,
    max_live: AtomicUsize,
    next_id: AtomicU32,
    fail_launches: AtomicBool,
    fail_kills: AtomicBool,
    exit_senders: Mutex<HashMap<u32, oneshot::Sender<ExitOutcome>>>,
    changed: Notify,
}

impl Shared {
    fn record(&self, event: LauncherEvent) {
        self.events.lock().unwrap().push(event);
        self.changed.notify_waiters();
    }
}

/// A launcher that never touches the OS.
///
/// - builds succeed unless an outcome was scripted with
///   [`FakeLauncher::push_build_outcome`];
/// - launched processes run until killed or until
///   [`FakeLauncher::exit_process`] is called;
/// - `live`/`max_live` count processes that are launched and not yet dead.
#[derive(Clone, Default)]
pub struct FakeLauncher {
    shared: Arc<Shared>,
}

impl FakeLauncher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_build_outcome(&self, outcome: ExitOutcome) {
        self.shared.build_script.lock().unwrap().push_back(Some(outcome));
    }

    pub fn push_build_start_failure(&self) {
        self.shared.build_script.lock().unwrap().push_back(None);
    }

    pub fn set_build_delay(&self, delay: Duration) {
        *self.shared.build_delay.lock().unwrap() = delay;
    }

    pub fn fail_launches(&self, fail: bool) {
        self.shared.fail_launches.store(fail, Ordering::SeqCst);
    }

    pub fn fail_kills(&self, fail: bool) {
        self.shared.fail_kills.store(fail, Ordering::SeqCst);
    }

    pub fn events(&self) -> Vec<LauncherEvent> {
        self.shared.events.lock().unwrap().clone()
    }

    pub fn builds(&self) -> usize {
        self.count(|e| matches!(e, LauncherEvent::Build(_)))
    }

    pub fn launches(&self) -> usize {
        self.count(|e| matches!(e, LauncherEvent::Launch { .. }))
    }

    pub fn kills(&self) -> usize {
        self.count(|e| matches!(e, LauncherEvent::Kill { .. }))
    }

    pub fn live(&self) -> usize {
        self.shared.live.load(Ordering::SeqCst)
    }

    pub fn max_live(&self) -> usize {
        self.shared.max_live.load(Ordering::SeqCst)
    }

    pub fn max_builds_in_flight(&self) -> usize {
        self.shared.max_builds_in_flight.load(Ordering::SeqCst)
    }

    /// Make process `id` exit on its own. Returns false if it is not running.
    pub fn exit_process(&self, id: u32, outcome: ExitOutcome) -> bool {
        let sender = self.shared.exit_senders.lock().unwrap().remove(&id);
        match sender {
            Some(tx) => tx.send(outcome).is_ok(),
            None => false,
        }
    }

    /// Wait until `pred` holds for the recorded events.
    pub async fn wait_until<F>(&self, pred: F)
    where
        F: Fn(&[LauncherEvent]) -> bool,
    {
        loop {
            let notified = self.shared.changed.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            let done = {
                let events = self.shared.events.lock().unwrap();
                pred(events.as_slice())
            };
            if done {
                return;
            }
            notified.await;
        }
    }

    fn count(&self, pred: impl Fn(&LauncherEvent) -> bool) -> usize {
        self.shared.events.lock().unwrap().iter().filter(|e| pred(e)).count()
    }
}

impl ProcessLauncher for FakeLauncher {
    fn run_to_completion<'a>(
        &'a self,
        cmd: &'a CommandLine,
    ) -> BoxFuture<'a, anyhow::Result<ExitOutcome>> {
        let shared = Arc::clone(&self.shared);
        Box::pin(async move {
            shared.record(LauncherEvent::Build(cmd.to_string()));

            let in_flight = shared.builds_in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            shared.max_builds_in_flight.fetch_max(in_flight, Ordering::SeqCst);

            let delay = *shared.build_delay.lock().unwrap();
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }

            shared.builds_in_flight.fetch_sub(1, Ordering::SeqCst);

            let scripted = shared.build_script.lock().unwrap().pop_front();
            match scripted {
                Some(Some(outcome)) => Ok(outcome),
                Some(None) => Err(anyhow!("build command not found")),
                None => Ok(ExitOutcome::Success),
            }
        })
    }

    fn launch(&self, cmd: &CommandLine) -> anyhow::Result<Box<dyn LaunchedProcess>> {
        if self.shared.fail_launches.load(Ordering::SeqCst) {
            return Err(anyhow!("run command not found"));
        }

        let id = self.shared.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        let live = self.shared.live.fetch_add(1, Ordering::SeqCst) + 1;
        self.shared.max_live.fetch_max(live, Ordering::SeqCst);

        let (exit_tx, exit_rx) = oneshot::channel();
        self.shared.exit_senders.lock().unwrap().insert(id, exit_tx);
        self.shared.record(LauncherEvent::Launch {
            id,
            cmd: cmd.to_string(),
        });

        Ok(Box::new(FakeProcess {
            id,
            shared: Arc::clone(&self.shared),
            exit_rx,
            alive: true,
        }))
    }
}

struct FakeProcess {
    id: u32,
    shared: Arc<Shared>,
    exit_rx: oneshot::Receiver<ExitOutcome>,
    alive: bool,
}

impl FakeProcess {
    fn mark_dead(&mut self, event: LauncherEvent) {
        if self.alive {
            self.alive = false;
            self.shared.live.fetch_sub(1, Ordering::SeqCst);
            self.shared.record(event);
        }
    }
}

impl LaunchedProcess for FakeProcess {
    fn id(&self) -> Option<u32> {
        Some(self.id)
    }

    fn wait(&mut self) -> BoxFuture<'_, anyhow::Result<ExitOutcome>> {
        Box::pin(async move {
            if !self.alive {
                return Ok(ExitOutcome::Failed(-1));
            }
            match (&mut self.exit_rx).await {
                Ok(outcome) => {
                    self.mark_dead(LauncherEvent::Exit { id: self.id });
                    Ok(outcome)
                }
                // Sender dropped without an exit: keep "running" forever.
                Err(_) => std::future::pending().await,
            }
        })
    }

    fn kill(&mut self) -> BoxFuture<'_, anyhow::Result<()>> {
        Box::pin(async move {
            self.shared.exit_senders.lock().unwrap().remove(&self.id);
            self.mark_dead(LauncherEvent::Kill { id: self.id });
            if self.shared.fail_kills.load(Ordering::SeqCst) {
                return Err(anyhow!("process already finished"));
            }
            Ok(())
        })
    }
}
