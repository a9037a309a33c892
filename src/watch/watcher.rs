// src/watch/watcher.rs

use std::path::Path;
use std::sync::Arc;

use notify::event::ModifyKind;
use notify::{Config, Event, EventKind, RecommendedWatcher, Watcher};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Instant};
use tracing::{debug, error, info, trace, warn};

use crate::config::{DebounceSettings, WatchSettings};
use crate::errors::Result;
use crate::fs::FileSystem;
use crate::types::RebuildSignal;
use crate::watch::debounce::Debounce;
use crate::watch::patterns::{PathMatcher, WatchRoot};
use crate::watch::walk::{register_tree, WatchRegistry};

/// Raw message from the notification backend: an event or a backend error.
pub type RawWatchMessage = notify::Result<Event>;

/// Handle for the spawned watch loop.
///
/// The loop owns the notify watcher, so watching continues for as long as the
/// task runs. Dropping the handle detaches it; [`WatcherHandle::abort`] stops it.
pub struct WatcherHandle {
    task: JoinHandle<()>,
}

impl std::fmt::Debug for WatcherHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatcherHandle")
            .field("finished", &self.task.is_finished())
            .finish()
    }
}

impl WatcherHandle {
    pub fn abort(&self) {
        self.task.abort();
    }
}

/// Create the notify watcher, register the tree under `settings.root`, and
/// spawn the watch loop that sends [`RebuildSignal`]s on `signal_tx`.
///
/// Backend creation and walking the root are fatal; everything after that is
/// logged and absorbed by the loop.
pub fn spawn_watcher(
    settings: &WatchSettings,
    fs: Arc<dyn FileSystem>,
    signal_tx: mpsc::Sender<RebuildSignal>,
) -> Result<WatcherHandle> {
    // Channel from the blocking notify callback into the async world.
    let (event_tx, event_rx) = mpsc::unbounded_channel::<RawWatchMessage>();

    let mut watcher = RecommendedWatcher::new(
        move |res: RawWatchMessage| {
            if event_tx.send(res).is_err() {
                trace!("watch loop gone; dropping notify message");
            }
        },
        Config::default(),
    )?;

    let summary = register_tree(
        fs.as_ref(),
        &mut watcher,
        settings.root.path(),
        &settings.matcher,
    )?;

    info!(
        root = %settings.root,
        registered = summary.registered,
        excluded = summary.excluded,
        failed = summary.failed,
        "file watcher started"
    );

    let watch_loop = WatchLoop::new(
        settings.root.clone(),
        settings.matcher.clone(),
        settings.debounce,
        fs,
        Box::new(watcher),
        signal_tx,
    );

    let task = tokio::spawn(watch_loop.run(event_rx));
    Ok(WatcherHandle { task })
}

/// Filters raw events and turns bursts into debounced rebuild signals.
pub struct WatchLoop {
    root: WatchRoot,
    matcher: PathMatcher,
    fs: Arc<dyn FileSystem>,
    registry: Box<dyn WatchRegistry>,
    debounce: Debounce,
    signal_tx: mpsc::Sender<RebuildSignal>,
}

impl WatchLoop {
    pub fn new(
        root: WatchRoot,
        matcher: PathMatcher,
        debounce: DebounceSettings,
        fs: Arc<dyn FileSystem>,
        registry: Box<dyn WatchRegistry>,
        signal_tx: mpsc::Sender<RebuildSignal>,
    ) -> Self {
        Self {
            root,
            matcher,
            fs,
            registry,
            debounce: Debounce::new(debounce.policy, debounce.delay),
            signal_tx,
        }
    }

    /// Run until the raw event channel closes or the supervisor goes away.
    ///
    /// Sending a signal waits for room in the channel; events that arrive in
    /// the meantime stay queued and start a fresh cycle afterwards.
    pub async fn run(mut self, mut events: mpsc::UnboundedReceiver<RawWatchMessage>) {
        loop {
            let deadline = self.debounce.deadline();

            tokio::select! {
                msg = events.recv() => {
                    match msg {
                        Some(Ok(event)) => self.handle_event(event),
                        Some(Err(err)) => error!(error = %err, "watcher error"),
                        None => {
                            debug!("notify channel closed; stopping watch loop");
                            break;
                        }
                    }
                }
                () = sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                    if self.debounce.fire(Instant::now()) {
                        debug!("quiet period elapsed; requesting rebuild");
                        if self.signal_tx.send(RebuildSignal).await.is_err() {
                            info!("supervisor stopped; stopping watch loop");
                            break;
                        }
                    }
                }
            }
        }
    }

    fn handle_event(&mut self, event: Event) {
        if !is_relevant_kind(&event.kind) {
            trace!(kind = ?event.kind, "ignoring event kind");
            return;
        }

        if creates_entries(&event.kind) {
            for path in &event.paths {
                self.register_new_dir(path);
            }
        }

        let Some(path) = event.paths.iter().find(|p| self.qualifies(p)) else {
            trace!(paths = ?event.paths, "event did not match filters");
            return;
        };

        let action = self.debounce.on_event(Instant::now());
        debug!(path = ?path, kind = ?event.kind, ?action, "change detected");
    }

    fn qualifies(&self, path: &Path) -> bool {
        self.root.contains(path)
            && self.matcher.is_included(path)
            && !self.matcher.lies_in_excluded_dir(&self.root, path)
    }

    /// Directories created or renamed into the tree after startup need their
    /// own registration.
    fn register_new_dir(&mut self, path: &Path) {
        if !self.root.contains(path)
            || !self.fs.is_dir(path)
            || self.matcher.lies_in_excluded_dir(&self.root, path)
        {
            return;
        }

        match register_tree(self.fs.as_ref(), self.registry.as_mut(), path, &self.matcher) {
            Ok(summary) if summary.registered > 0 => {
                info!(dir = ?path, registered = summary.registered, "watching new directory");
            }
            Ok(_) => {}
            Err(err) => warn!(dir = ?path, error = %err, "could not watch new directory"),
        }
    }
}

/// Create, write and remove count; pure accesses don't.
pub fn is_relevant_kind(kind: &EventKind) -> bool {
    matches!(
        kind,
        EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_) | EventKind::Any
    )
}

fn creates_entries(kind: &EventKind) -> bool {
    matches!(
        kind,
        EventKind::Create(_) | EventKind::Modify(ModifyKind::Name(_))
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::event::{AccessKind, CreateKind, DataChange, RenameMode};

    #[test]
    fn relevant_kinds() {
        assert!(is_relevant_kind(&EventKind::Create(CreateKind::File)));
        assert!(is_relevant_kind(&EventKind::Modify(ModifyKind::Data(DataChange::Content))));
        assert!(is_relevant_kind(&EventKind::Remove(notify::event::RemoveKind::File)));
        assert!(is_relevant_kind(&EventKind::Modify(ModifyKind::Name(RenameMode::To))));
        assert!(!is_relevant_kind(&EventKind::Access(AccessKind::Read)));
        assert!(!is_relevant_kind(&EventKind::Other));
    }

    #[test]
    fn renames_and_creates_may_add_directories() {
        assert!(creates_entries(&EventKind::Create(CreateKind::Folder)));
        assert!(creates_entries(&EventKind::Modify(ModifyKind::Name(RenameMode::Both))));
        assert!(!creates_entries(&EventKind::Modify(ModifyKind::Data(DataChange::Any))));
    }
}
