// src/config/mod.rs

//! Configuration loading and validation for autobuild.
//!
//! Responsibilities:
//! - Define the TOML-backed data model and the validated [`Settings`] (`model.rs`).
//! - Load an optional config file and merge CLI overrides (`loader.rs`).
//! - Turn merged inputs into settings the runtime can trust (`validate.rs`).

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{load_from_path, resolve_settings, DEFAULT_CONFIG_FILE};
pub use model::{
    CommandSpec, CommandsSection, DebounceSettings, RawConfigFile, Settings, SettingsInputs,
    WatchSection, WatchSettings,
};
