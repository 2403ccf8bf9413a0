// Central error type for the harness

use thiserror::Error;

/// Harness-level error type
#[derive(Error, Debug)]
pub enum HarnessError {
    #[error("Domain error: {0}")]
    Domain(#[from] crate::domain::DomainError),

    #[error("Supervision error: {0}")]
    Supervise(#[from] crate::port::SuperviseError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias using HarnessError
pub type Result<T> = std::result::Result<T, HarnessError>;
