//! Error types for brats-cutlass

use std::path::PathBuf;

/// Result type for brats-cutlass operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by platform and packaging collaborators
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to spawn `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("`{command}` exited with code {code}: {stderr}")]
    CommandFailed {
        command: String,
        code: i32,
        stderr: String,
    },

    #[error("Push of {app} failed:\n{log}")]
    PushFailed { app: String, log: String },

    #[error("Application {app} has no route")]
    NoRoute { app: String },

    #[error("Application {app} did not reach RUNNING (last states: {states:?})")]
    NotRunning { app: String, states: Vec<String> },

    #[error("HTTP request to {url} failed: {message}")]
    Http { url: String, message: String },

    #[error("Failed to parse {what}: {message}")]
    Parse { what: String, message: String },

    #[error("Packaged artifact not found at {path}")]
    ArtifactMissing { path: PathBuf },
}

impl Error {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
