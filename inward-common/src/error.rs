//! Common error types for the inward register

use thiserror::Error;

/// Common result type for inward register operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across the inward register
#[derive(Error, Debug)]
pub enum Error {
    /// Missing or malformed entry fields, raised before any write is attempted
    #[error("Validation error: {0}")]
    Validation(String),

    /// Primary store operation failed (wraps sqlx::Error)
    #[error("Persist error: {0}")]
    Persist(#[from] sqlx::Error),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Requested record not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Session role does not permit the operation
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// No session, or credentials did not match
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}
