//! Error types for rollcoord

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    // === I/O Errors ===
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // === Rollover Errors ===
    #[error("Alias resolution failed for [{alias}]: {reason}")]
    AliasResolution { alias: String, reason: String },

    #[error("Stats fetch failed for [{0}]: {1}")]
    StatsFetch(String, String),

    #[error("Invalid creation parameters: {0}")]
    CreationValidation(String),

    #[error("Concurrent modification of alias [{0}] during rollover")]
    ConcurrentModification(String),

    // === Coordinator Errors ===
    #[error("Commit failed: {0}")]
    Commit(String),

    // === Request / Config Errors ===
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // === Generic ===
    #[error("Operation timeout: {0}")]
    Timeout(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Is this a retryable error?
    ///
    /// A stats fetch failure or a timeout happens before any mutation is
    /// submitted, so the whole request can be resubmitted safely. A
    /// concurrent modification means another rollover already won this
    /// metadata generation and must not be retried blindly.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::StatsFetch(_, _) | Error::Timeout(_))
    }
}

// Implement From for common error types
impl From<&str> for Error {
    fn from(s: &str) -> Self {
        Error::Other(s.to_string())
    }
}

impl From<String> for Error {
    fn from(s: String) -> Self {
        Error::Other(s)
    }
}

impl From<anyhow::Error> for Error {
    fn from(e: anyhow::Error) -> Self {
        Error::Other(e.to_string())
    }
}
