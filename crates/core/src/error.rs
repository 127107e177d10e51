// Central Error Type for the Application

use thiserror::Error;

/// Application-level error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("domain error: {0}")]
    Domain(#[from] crate::domain::DomainError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("rejected: {0}")]
    Rejected(String),

    #[error("timeout after {0}ms")]
    Timeout(u64),

    #[error("internal error: {0}")]
    Internal(String),
}

/// Result type alias using AppError
pub type Result<T> = std::result::Result<T, AppError>;

// From impl for infra crates that surface errors as plain strings
// (keeps infra-http free of a circular dependency on its own error type).
impl From<String> for AppError {
    fn from(err: String) -> Self {
        AppError::Transport(err)
    }
}
