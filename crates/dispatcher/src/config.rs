//! Dispatcher configuration.

use std::env;
use std::time::Duration;

use brain_core::Language;

use crate::error::DispatchError;

/// Default timeout for brain processing (60 seconds).
pub const DEFAULT_BRAIN_TIMEOUT: Duration = Duration::from_secs(60);

/// Telegram shows "typing" for about five seconds; refresh a bit earlier.
pub const DEFAULT_TYPING_REFRESH: Duration = Duration::from_secs(4);

/// Configuration for the dispatcher.
#[derive(Debug, Clone)]
pub struct DispatcherConfig {
    /// Language used when a message has no language markers.
    pub default_language: Language,

    /// Timeout for brain processing. A brain that takes longer is treated as
    /// failed and the user gets the fallback message.
    pub brain_timeout: Duration,

    /// Whether to show the typing indicator while the brain works.
    pub send_typing_indicators: bool,

    /// How often the typing indicator is re-sent.
    pub typing_refresh: Duration,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            default_language: Language::default(),
            brain_timeout: DEFAULT_BRAIN_TIMEOUT,
            send_typing_indicators: true,
            typing_refresh: DEFAULT_TYPING_REFRESH,
        }
    }
}

impl DispatcherConfig {
    /// Load configuration from environment variables.
    ///
    /// - `DEFAULT_LANGUAGE` - `en` or `id` (default: en)
    /// - `BRAIN_TIMEOUT_SECS` - brain timeout (default: 60)
    pub fn from_env() -> Result<Self, DispatchError> {
        let mut config = Self::default();

        if let Ok(code) = env::var("DEFAULT_LANGUAGE") {
            config.default_language = code
                .parse()
                .map_err(|e| DispatchError::Config(format!("DEFAULT_LANGUAGE: {}", e)))?;
        }
        if let Some(secs) = env::var("BRAIN_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
        {
            config.brain_timeout = Duration::from_secs(secs);
        }

        Ok(config)
    }

    /// Set the default language.
    pub fn with_default_language(mut self, language: Language) -> Self {
        self.default_language = language;
        self
    }

    /// Set the brain timeout.
    pub fn with_brain_timeout(mut self, timeout: Duration) -> Self {
        self.brain_timeout = timeout;
        self
    }
}
