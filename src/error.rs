//! Error taxonomy shared by every command.
//!
//! Each variant maps to one line of user-facing output. A reply that fails to
//! decode is not an error at all; see [`crate::interpreter::Interpreted`].

use std::path::PathBuf;
use thiserror::Error;

/// Failures a single command can end with.
#[derive(Debug, Error)]
pub enum AppError {
    /// The service rejected the credential (HTTP 401). Re-run `/login`.
    #[error("Invalid API key. Please check your credentials or run /login again.")]
    Authentication,

    /// The service is throttling requests (HTTP 429).
    #[error("Rate limit exceeded. Please try again later.")]
    RateLimited,

    /// Any other network or service failure.
    #[error("API request failed: {0}")]
    Transport(String),

    /// A configuration value or command argument was rejected before any
    /// network call.
    #[error("{0}")]
    Validation(String),

    /// An input file could not be read or an output file could not be written.
    #[error("{action} {}: {source}", path.display())]
    Filesystem {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The console could not be read from or written to.
    #[error("Console I/O failed: {0}")]
    Console(#[from] std::io::Error),
}

impl AppError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn read_failed(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Filesystem {
            action: "Failed to read",
            path: path.into(),
            source,
        }
    }

    pub fn write_failed(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Filesystem {
            action: "Failed to write",
            path: path.into(),
            source,
        }
    }

    /// True when the caller should ask for a new key instead of retrying.
    pub fn needs_reauthentication(&self) -> bool {
        matches!(self, Self::Authentication)
    }
}

pub type AppResult<T> = std::result::Result<T, AppError>;
