// src/errors.rs

//! Crate-wide error type and result alias.
//!
//! Everything in here is a *setup-time* failure: the runtime loops log and
//! absorb their own errors instead of returning them.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AutobuildError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Invalid watch directory {path:?}: {reason}")]
    InvalidWatchDir { path: PathBuf, reason: String },

    #[error("Invalid {name} regex: {source}")]
    InvalidPattern {
        name: &'static str,
        #[source]
        source: regex::Error,
    },

    #[error("{0} is a required argument")]
    MissingCommand(&'static str),

    #[error("Watch backend error: {0}")]
    WatchBackend(#[from] notify::Error),

    #[error("Could not walk watch path {path:?}: {source}")]
    WalkFailed {
        path: PathBuf,
        #[source]
        source: anyhow::Error,
    },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, AutobuildError>;
