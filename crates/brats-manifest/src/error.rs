//! Error types for brats-manifest

use std::path::PathBuf;

/// Result type for brats-manifest operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while reading a manifest
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse manifest at {path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("No default version declared for {name}")]
    NoDefaultVersion { name: String },

    #[error("Multiple default versions declared for {name}")]
    AmbiguousDefaultVersion { name: String },

    #[error("No version of {name} matches {pattern}")]
    NoMatchingVersion { name: String, pattern: String },

    #[error("Invalid version pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },
}

impl Error {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
