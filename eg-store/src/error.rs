//! Error types for eg-store
//!
//! Defines module-specific error types using thiserror for clear error
//! propagation. Every user-visible failure maps onto one of these
//! variants; none of them is fatal to the service.

use thiserror::Error;

/// Main error type for the storefront service
#[derive(Error, Debug)]
pub enum Error {
    /// Order form validation errors (shown inline, block submission)
    #[error("{0}")]
    Validation(String),

    /// Missing or placeholder payment configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Payment provider call failed or returned an error object
    #[error("{0}")]
    Provider(String),

    /// Best-effort order notification failed (logged, never surfaced)
    #[error("Notification error: {0}")]
    Notification(String),

    /// Session or stored order not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Operation not allowed in the current checkout phase
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Invalid request
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// File I/O errors
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Other errors
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<eg_common::Error> for Error {
    fn from(err: eg_common::Error) -> Self {
        match err {
            eg_common::Error::InvalidInput(msg) => Error::Validation(msg),
            eg_common::Error::Config(msg) => Error::Config(msg),
            eg_common::Error::NotFound(msg) => Error::NotFound(msg),
            eg_common::Error::Io(e) => Error::Io(e),
            eg_common::Error::Internal(msg) => Error::Internal(msg),
        }
    }
}

/// Convenience Result type using the storefront Error
pub type Result<T> = std::result::Result<T, Error>;
