//! Error types for the status server.

use thiserror::Error;

/// Errors that can occur while running the status server.
#[derive(Debug, Error)]
pub enum StatusError {
    /// Binding or serving the listener failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for status server operations.
pub type Result<T> = std::result::Result<T, StatusError>;
