//! Error types for the dispatcher.

use std::time::Duration;

use brain_core::BrainError;
use telegram_client::TelegramError;
use thiserror::Error;

/// Errors that can occur while dispatching an update.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// Error from the Telegram Bot API.
    #[error("telegram error: {0}")]
    Telegram(#[from] TelegramError),

    /// Error from the brain during processing.
    #[error("brain error: {0}")]
    Brain(#[from] BrainError),

    /// Brain processing timed out.
    #[error("brain processing timed out after {0:?}")]
    Timeout(Duration),

    /// Invalid configuration.
    #[error("configuration error: {0}")]
    Config(String),

    /// The update stream ended unexpectedly.
    #[error("update stream ended")]
    StreamEnded,
}

impl DispatchError {
    /// Whether the completion side failed (and the user gets the fallback).
    pub fn is_upstream(&self) -> bool {
        matches!(self, DispatchError::Brain(_) | DispatchError::Timeout(_))
    }
}
