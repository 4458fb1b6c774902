//! Error types for brats-core

use std::path::PathBuf;

/// Result type for brats-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while preparing or running the suite
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Suite configuration could not be loaded or is invalid
    #[error("Invalid configuration at {path}: {message}")]
    Config { path: PathBuf, message: String },

    /// A test application or artifact could not be prepared
    #[error("Fixture error at {path}: {message}")]
    Fixture { path: PathBuf, message: String },

    /// An assertion pattern failed to compile
    #[error("Invalid pattern '{pattern}': {message}")]
    Pattern { pattern: String, message: String },

    // Transparent wrappers for underlying crate errors
    /// Manifest error from brats-manifest
    #[error(transparent)]
    Manifest(#[from] brats_manifest::Error),

    /// Platform or packaging error from brats-cutlass
    #[error(transparent)]
    Platform(#[from] brats_cutlass::Error),

    /// Standard I/O error
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub fn fixture(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Fixture {
            path: path.into(),
            message: message.into(),
        }
    }

    pub fn config(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Config {
            path: path.into(),
            message: message.into(),
        }
    }
}
