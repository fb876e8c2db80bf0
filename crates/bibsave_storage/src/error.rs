//! Error types for sinks and save sessions.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors that can occur while writing or committing output.
#[derive(Debug, Error)]
pub enum StorageError {
    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The session was already committed or cancelled.
    #[error("save session is {state}")]
    SessionClosed {
        /// The terminal state the session is in.
        state: &'static str,
    },

    /// The staged output could not be moved over the destination.
    #[error("could not replace destination: {message}")]
    Persist {
        /// Description of the failure.
        message: String,
    },

    /// Another writer holds the destination lock.
    #[error("destination locked: {}", path.display())]
    Locked {
        /// Path of the lock file.
        path: PathBuf,
    },

    /// The requested character encoding is not supported.
    #[error("unsupported encoding: {0}")]
    UnsupportedEncoding(String),
}
