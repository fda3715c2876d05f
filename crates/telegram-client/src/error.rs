//! Error types for telegram-client.

use thiserror::Error;

/// Errors that can occur when talking to the Telegram Bot API.
#[derive(Debug, Error)]
pub enum TelegramError {
    /// HTTP request failed. The request URL is stripped, since it carries
    /// the bot token.
    #[error("HTTP error: {0}")]
    Http(reqwest::Error),

    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The Bot API answered `ok: false`.
    #[error("API error {code}: {description}")]
    Api { code: i32, description: String },

    /// Connecting to the Bot API failed.
    #[error("Connection failed: {0}")]
    Connection(String),

    /// Invalid configuration.
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// A file could not be resolved or downloaded.
    #[error("File error: {0}")]
    File(String),
}

impl From<reqwest::Error> for TelegramError {
    fn from(e: reqwest::Error) -> Self {
        TelegramError::Http(e.without_url())
    }
}

impl TelegramError {
    /// Whether the API rejected the bot token.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, TelegramError::Api { code: 401, .. })
    }
}
