//! Long-polling update stream.

use std::collections::VecDeque;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;

use futures::stream::{self, Stream};
use tracing::{error, info, warn};

use crate::client::TelegramClient;
use crate::error::TelegramError;
use crate::types::Update;

/// Backoff applied between failed polls.
#[derive(Debug, Clone)]
pub struct ReconnectConfig {
    /// Maximum number of consecutive failures tolerated (None = infinite).
    pub max_retries: Option<u32>,
    /// Delay after the first failure.
    pub initial_delay: Duration,
    /// Maximum delay between retries.
    pub max_delay: Duration,
    /// Backoff multiplier for each retry.
    pub backoff_multiplier: f64,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            max_retries: None,
            initial_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(30),
            backoff_multiplier: 2.0,
        }
    }
}

impl ReconnectConfig {
    /// Calculate delay for a given attempt number.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let delay_ms = self.initial_delay.as_millis() as f64
            * self.backoff_multiplier.powi(attempt as i32);
        let delay = Duration::from_millis(delay_ms as u64);
        delay.min(self.max_delay)
    }

    /// Check if we should retry after the given number of attempts.
    pub fn should_retry(&self, attempts: u32) -> bool {
        self.max_retries.map_or(true, |max| attempts < max)
    }
}

/// A stream of incoming updates.
///
/// Acknowledges updates by advancing the poll offset past the last update
/// fetched. A failed poll yields the error and retries after a backoff; the
/// stream ends when retries are exhausted or the token is rejected.
pub struct UpdateStream {
    inner: Pin<Box<dyn Stream<Item = Result<Update, TelegramError>> + Send>>,
}

struct PollState {
    client: TelegramClient,
    offset: Option<i64>,
    buffered: VecDeque<Update>,
    reconnect: ReconnectConfig,
    failures: u32,
    backoff: Option<Duration>,
    done: bool,
}

impl UpdateStream {
    /// Create an update stream with default backoff.
    pub fn new(client: &TelegramClient) -> Self {
        Self::with_reconnect(client, ReconnectConfig::default())
    }

    /// Create an update stream with custom backoff.
    pub fn with_reconnect(client: &TelegramClient, reconnect: ReconnectConfig) -> Self {
        info!(
            "Starting Telegram long polling (timeout {:?})",
            client.config().poll_timeout
        );

        let state = PollState {
            client: client.clone(),
            offset: None,
            buffered: VecDeque::new(),
            reconnect,
            failures: 0,
            backoff: None,
            done: false,
        };

        Self {
            inner: Box::pin(stream::unfold(state, next_update)),
        }
    }
}

async fn next_update(mut state: PollState) -> Option<(Result<Update, TelegramError>, PollState)> {
    loop {
        if let Some(update) = state.buffered.pop_front() {
            return Some((Ok(update), state));
        }
        if state.done {
            return None;
        }
        if let Some(delay) = state.backoff.take() {
            tokio::time::sleep(delay).await;
        }

        match state.client.get_updates(state.offset).await {
            Ok(updates) => {
                if state.failures > 0 {
                    info!("Telegram polling restored after {} failures", state.failures);
                }
                state.failures = 0;
                if let Some(last) = updates.last() {
                    state.offset = Some(last.update_id + 1);
                }
                state.buffered.extend(updates);
            }
            Err(e) => {
                state.failures += 1;
                if e.is_unauthorized() {
                    error!("Telegram rejected the bot token; stopping polling");
                    state.done = true;
                } else if state.reconnect.should_retry(state.failures) {
                    let delay = state.reconnect.delay_for_attempt(state.failures - 1);
                    warn!(
                        "Telegram poll failed: {} (failures: {}, retrying in {:?})",
                        e, state.failures, delay
                    );
                    state.backoff = Some(delay);
                } else {
                    error!("Telegram poll failed {} times; giving up", state.failures);
                    state.done = true;
                }
                return Some((Err(e), state));
            }
        }
    }
}

impl Stream for UpdateStream {
    type Item = Result<Update, TelegramError>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.inner.as_mut().poll_next(cx)
    }
}

/// Create an update stream from a TelegramClient.
pub fn subscribe(client: &TelegramClient) -> UpdateStream {
    UpdateStream::new(client)
}

/// Create an update stream with custom backoff configuration.
pub fn subscribe_with_reconnect(
    client: &TelegramClient,
    reconnect_config: ReconnectConfig,
) -> UpdateStream {
    UpdateStream::with_reconnect(client, reconnect_config)
}
