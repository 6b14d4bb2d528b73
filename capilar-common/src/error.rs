//! Common error types for Capilar

use thiserror::Error;

/// Common result type for Capilar operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across the catalog core and the dashboard service
#[derive(Error, Debug)]
pub enum Error {
    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON encode/decode error (wraps serde_json::Error)
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Overlay could not be written to its key-value store
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// Requested resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid user input or request parameter
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Operation not valid in the current edit session state
    #[error("Invalid state: {0}")]
    InvalidState(String),
}
