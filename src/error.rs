//! Error types for supervisor control
//!
//! Stale or unparsable pid files have no variant here:
//! they resolve to "not running" instead of failing.

use std::path::PathBuf;
use thiserror::Error;

/// Supervisor control errors
#[derive(Debug, Error)]
pub enum SupervisorError {
    #[error("Failed to prepare workspace folder {path:?}: {source}")]
    Workspace {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Configuration store error at {path:?}: {source}")]
    ConfigStore {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to render program configuration: {0}")]
    Render(String),

    #[error("Supervisor driver failed: {0}")]
    Driver(String),

    #[error("Failed to deliver signal to process {pid}: {reason}")]
    Signal { pid: u32, reason: String },

    #[error("Invalid worker declaration: {0}")]
    InvalidWorker(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Result alias used across the crate
pub type Result<T> = std::result::Result<T, SupervisorError>;
