//! Error types for Repository calls

use nfreg_core::ProblemDetails;
use thiserror::Error;

/// Failure of a Register, Update or Deregister call
///
/// An abandoned (canceled) call has no variant here; it is not a failure.
#[derive(Debug, Clone, Error)]
pub enum RepositoryError {
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Timeout: {0}")]
    Timeout(String),

    #[error("Repository rejected request: {0}")]
    Problem(ProblemDetails),

    #[error("Unexpected status {status}: {body}")]
    UnexpectedStatus { status: u16, body: String },

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl RepositoryError {
    /// HTTP status carried by the error, if the Repository answered at all
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Problem(problem) => problem.status,
            Self::UnexpectedStatus { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for RepositoryError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout(err.to_string())
        } else if err.is_decode() {
            Self::Serialization(err.to_string())
        } else {
            Self::Transport(err.to_string())
        }
    }
}

/// Result type for Repository calls
pub type Result<T> = std::result::Result<T, RepositoryError>;

/// Failure to fetch the served PLMN list from the webui
#[derive(Debug, Error)]
pub enum PollError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("webui returned status {0}")]
    Status(u16),

    #[error("invalid PLMN in webui response: {0}")]
    InvalidPlmn(String),
}
