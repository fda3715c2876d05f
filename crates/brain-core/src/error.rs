//! Error types for brain operations.

use thiserror::Error;

/// Errors that can occur during brain processing.
///
/// Every variant is an upstream failure from the dispatcher's point of view:
/// it is turned into a localized apology for the user and never recorded.
#[derive(Debug, Error)]
pub enum BrainError {
    /// The brain is misconfigured (missing key, bad URL, ...).
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The completion endpoint could not be reached.
    #[error("network error: {0}")]
    Network(String),

    /// The brain is temporarily unavailable.
    #[error("brain unavailable: {0}")]
    Unavailable(String),

    /// The message could not be processed.
    #[error("processing failed: {0}")]
    ProcessingFailed(String),

    /// The brain has been shut down.
    #[error("brain shut down")]
    ShutDown,

    /// A timeout occurred during processing.
    #[error("processing timed out")]
    Timeout,
}
