//! Error types for the temperature manager

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for the temperature manager
pub type Result<T> = std::result::Result<T, TempManagerError>;

/// Main error type for the temperature manager
///
/// Probe failures are reported through this type internally but never leave
/// the probe boundary: callers of [`crate::probe::SystemProbe`] only see an
/// absent reading. Everything else here is fatal at startup or logged per cycle.
#[derive(Error, Debug)]
pub enum TempManagerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Command `{program}` failed: {reason}")]
    Command { program: String, reason: String },

    #[error("Could not parse {what} from {input:?}")]
    Parse { what: &'static str, input: String },

    #[error("Required asset missing: {}", path.display())]
    AssetMissing { path: PathBuf },

    #[error("Invalid boot logo {}: {reason}", path.display())]
    InvalidLogo { path: PathBuf, reason: String },

    #[error("Hardware error: {0}")]
    Hardware(String),

    #[error("Display error: {0}")]
    Display(String),
}

impl TempManagerError {
    pub(crate) fn parse(what: &'static str, input: impl Into<String>) -> Self {
        Self::Parse {
            what,
            input: input.into(),
        }
    }
}
