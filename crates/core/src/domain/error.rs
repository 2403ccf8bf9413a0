// Domain error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Unknown server kind: {0}")]
    UnknownServerKind(String),

    #[error("No such collection: {0}")]
    UnknownCollection(String),
}

pub type Result<T> = std::result::Result<T, DomainError>;
