use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use autobuild::watch::WatchRegistry;

/// Watch registry that only records which directories were registered.
#[derive(Debug, Clone, Default)]
pub struct FakeRegistry {
    dirs: Arc<Mutex<Vec<PathBuf>>>,
}

impl FakeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn registered(&self) -> Vec<PathBuf> {
        self.dirs.lock().unwrap().clone()
    }
}

impl WatchRegistry for FakeRegistry {
    fn register(&mut self, dir: &Path) -> anyhow::Result<()> {
        self.dirs.lock().unwrap().push(dir.to_path_buf());
        Ok(())
    }
}
