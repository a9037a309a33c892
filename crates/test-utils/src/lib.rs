pub mod fake_launcher;
pub mod fake_registry;

use std::path::Path;
use std::sync::Once;

use notify::event::{CreateKind, DataChange, ModifyKind};
use notify::{Event, EventKind};
use tracing_subscriber::{fmt, EnvFilter};

pub use fake_launcher::{FakeLauncher, LauncherEvent};
pub use fake_registry::FakeRegistry;

static INIT: Once = Once::new();

/// Initialise tracing for tests.
///
/// - Uses `with_test_writer()`, so logs are captured per-test.
/// - The Rust test harness only prints captured output for **failing** tests
///   (unless you run with `-- --nocapture`).
///
/// Enable levels with e.g.:
/// `RUST_LOG=debug cargo test`
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

        fmt()
            .with_env_filter(filter)
            .with_test_writer() // print only for failing tests unless --nocapture
            .with_target(true)
            .init();
    });
}

/// Run a future with a 5-second timeout.
pub async fn with_timeout<F, T>(f: F) -> T
where
    F: std::future::Future<Output = T>,
{
    tokio::time::timeout(std::time::Duration::from_secs(5), f)
        .await
        .expect("Test timed out after 5 seconds")
}

/// A content write to `path`, as notify would report it.
pub fn write_event(path: impl AsRef<Path>) -> Event {
    Event::new(EventKind::Modify(ModifyKind::Data(DataChange::Content)))
        .add_path(path.as_ref().to_path_buf())
}

/// Creation of a directory at `path`.
pub fn create_dir_event(path: impl AsRef<Path>) -> Event {
    Event::new(EventKind::Create(CreateKind::Folder)).add_path(path.as_ref().to_path_buf())
}
