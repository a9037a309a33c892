// src/watch/mod.rs

//! File watching and change coalescing.
//!
//! This module is responsible for:
//! - Holding the watch root and the include/exclude matchers.
//! - Walking the tree once and registering every non-excluded directory with
//!   a cross-platform filesystem watcher (`notify`).
//! - Debouncing bursts of relevant events into single [`RebuildSignal`]s.
//!
//! It never sees build or run outcomes; the coupling to the supervisor is the
//! one-way signal channel.
//!
//! [`RebuildSignal`]: crate::types::RebuildSignal

pub mod debounce;
pub mod patterns;
pub mod walk;
pub mod watcher;

pub use debounce::{Debounce, DebounceAction, DebounceState, DEFAULT_DEBOUNCE};
pub use patterns::{PathMatcher, WatchRoot, DEFAULT_EXCLUDE, DEFAULT_INCLUDE};
pub use walk::{register_tree, WalkSummary, WatchRegistry};
pub use watcher::{spawn_watcher, RawWatchMessage, WatchLoop, WatcherHandle};
