//! Configuration types for telegram-client.

use std::env;
use std::time::Duration;

use crate::error::TelegramError;

/// Default Bot API base URL.
pub const DEFAULT_API_URL: &str = "https://api.telegram.org";

/// Default long-poll timeout.
pub const DEFAULT_POLL_TIMEOUT: Duration = Duration::from_secs(30);

/// Configuration for connecting to the Telegram Bot API.
#[derive(Clone)]
pub struct TelegramConfig {
    /// Base URL of the Bot API (e.g., "https://api.telegram.org").
    pub api_url: String,
    /// Bot token from @BotFather.
    pub token: String,
    /// How long `getUpdates` waits for new updates.
    pub poll_timeout: Duration,
    /// Timeout for regular (non-polling) requests.
    pub request_timeout: Duration,
}

impl TelegramConfig {
    /// Create a configuration for the given token against the public API.
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            token: token.into(),
            poll_timeout: DEFAULT_POLL_TIMEOUT,
            request_timeout: Duration::from_secs(30),
        }
    }

    /// Load configuration from environment variables.
    ///
    /// - `TELEGRAM_BOT_TOKEN` (required)
    /// - `TELEGRAM_API_URL` (default: https://api.telegram.org)
    /// - `TELEGRAM_POLL_TIMEOUT_SECS` (default: 30)
    pub fn from_env() -> Result<Self, TelegramError> {
        let token = env::var("TELEGRAM_BOT_TOKEN")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| TelegramError::Config("TELEGRAM_BOT_TOKEN not set".to_string()))?;

        let mut config = Self::new(token);

        if let Ok(url) = env::var("TELEGRAM_API_URL") {
            config.api_url = url;
        }
        if let Some(secs) = env::var("TELEGRAM_POLL_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
        {
            config.poll_timeout = Duration::from_secs(secs);
        }

        Ok(config)
    }

    /// Use a different API base URL (a local Bot API server, or a mock).
    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self
    }

    /// Set the long-poll timeout.
    pub fn with_poll_timeout(mut self, timeout: Duration) -> Self {
        self.poll_timeout = timeout;
        self
    }

    /// URL of a Bot API method.
    pub fn method_url(&self, method: &str) -> String {
        format!(
            "{}/bot{}/{}",
            self.api_url.trim_end_matches('/'),
            self.token,
            method
        )
    }

    /// Download URL of a file resolved with `getFile`.
    pub fn file_url(&self, file_path: &str) -> String {
        format!(
            "{}/file/bot{}/{}",
            self.api_url.trim_end_matches('/'),
            self.token,
            file_path
        )
    }
}

impl std::fmt::Debug for TelegramConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramConfig")
            .field("api_url", &self.api_url)
            .field("token", &"***")
            .field("poll_timeout", &self.poll_timeout)
            .finish()
    }
}
