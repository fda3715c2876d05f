//! Update dispatcher that connects the Telegram update stream to a Brain.

use std::time::Duration;

use brain_core::{Brain, BrainError, ImageInput, InboundMessage, Language, OutboundMessage};
use database::{ChannelType, ConversationRecorder, MessageKind, NewConversation, IMAGE_QUESTION};
use futures::{Stream, StreamExt};
use telegram_client::{ChatKind, Message, PhotoSize, TelegramError, Update};
use tokio::time::error::Elapsed;
use tokio::time::{interval, timeout};
use tracing::{debug, error, info, warn};

use crate::config::DispatcherConfig;
use crate::error::DispatchError;
use crate::language::{detect_language, ChannelLanguages};
use crate::messages::{fallback_message, WELCOME_MESSAGE};
use crate::transport::Transport;

/// Lower bound on the typing refresh period.
const MIN_TYPING_REFRESH: Duration = Duration::from_secs(1);

/// Result of handling a single update.
#[derive(Debug)]
pub enum DispatchOutcome {
    /// A reply was sent. `record_id` is set when the exchange was persisted.
    Responded {
        channel_id: i64,
        reply: String,
        record_id: Option<i64>,
    },
    /// The welcome message was sent in answer to `/start`.
    Welcomed { channel_id: i64 },
    /// Nothing to answer.
    Skipped { reason: String },
    /// No reply could be produced or delivered.
    Failed(DispatchError),
}

/// Answers incoming messages through a Brain and records each exchange.
pub struct Dispatcher<B: Brain, T: Transport> {
    brain: B,
    transport: T,
    recorder: ConversationRecorder,
    languages: ChannelLanguages,
    config: DispatcherConfig,
}

impl<B: Brain, T: Transport> Dispatcher<B, T> {
    /// Create a new dispatcher.
    pub fn new(
        brain: B,
        transport: T,
        recorder: ConversationRecorder,
        config: DispatcherConfig,
    ) -> Self {
        Self {
            brain,
            transport,
            recorder,
            languages: ChannelLanguages::new(),
            config,
        }
    }

    /// Create a dispatcher with default configuration.
    pub fn with_defaults(brain: B, transport: T, recorder: ConversationRecorder) -> Self {
        Self::new(brain, transport, recorder, DispatcherConfig::default())
    }

    /// Get a reference to the brain.
    pub fn brain(&self) -> &B {
        &self.brain
    }

    /// Get a reference to the transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Per-channel language cache.
    pub fn languages(&self) -> &ChannelLanguages {
        &self.languages
    }

    /// Handle one update and return what happened.
    pub async fn handle_update(&self, update: &Update) -> DispatchOutcome {
        let Some(message) = update.message.as_ref() else {
            return skipped("no new message");
        };

        if message.is_command() {
            return match message.command() {
                Some("start") => self.welcome(message.chat.id).await,
                other => skipped(format!("unsupported command /{}", other.unwrap_or_default())),
            };
        }

        if let Some(photo) = message.largest_photo() {
            self.handle_photo(message, photo).await
        } else if let Some(text) = message.text() {
            self.handle_text(message, text).await
        } else {
            skipped("no text or photo")
        }
    }

    async fn welcome(&self, channel_id: i64) -> DispatchOutcome {
        match self.transport.send_text(channel_id, WELCOME_MESSAGE).await {
            Ok(()) => {
                info!(channel_id, "Sent welcome message");
                DispatchOutcome::Welcomed { channel_id }
            }
            Err(e) => {
                error!(channel_id, "Failed to send welcome message: {}", e);
                DispatchOutcome::Failed(e.into())
            }
        }
    }

    async fn handle_text(&self, message: &Message, text: &str) -> DispatchOutcome {
        let channel_id = message.chat.id;
        let language = detect_language(text, self.config.default_language);
        self.languages.set(channel_id, language).await;

        let inbound = InboundMessage::text(channel_id, text, language).with_timestamp(message.date);
        self.answer(message, inbound, text.to_string(), MessageKind::Text)
            .await
    }

    async fn handle_photo(&self, message: &Message, photo: &PhotoSize) -> DispatchOutcome {
        let channel_id = message.chat.id;
        let language = self
            .languages
            .get_or(channel_id, self.config.default_language)
            .await;

        let bytes = match self.transport.download_photo(photo).await {
            Ok(bytes) => bytes,
            Err(e) => {
                error!(channel_id, file_id = %photo.file_id, "Failed to download photo: {}", e);
                self.send_fallback(channel_id, language).await;
                return DispatchOutcome::Failed(e.into());
            }
        };

        let caption = message.caption().unwrap_or_default();
        let inbound = InboundMessage::image(channel_id, ImageInput::jpeg(bytes), caption, language)
            .with_timestamp(message.date);
        let question = message.caption().unwrap_or(IMAGE_QUESTION).to_string();
        self.answer(message, inbound, question, MessageKind::Image)
            .await
    }

    /// Generate a reply, send it, then record the exchange.
    async fn answer(
        &self,
        message: &Message,
        inbound: InboundMessage,
        question: String,
        kind: MessageKind,
    ) -> DispatchOutcome {
        let channel_id = inbound.channel_id;
        let language = inbound.language;
        info!(channel_id, %language, %kind, "Processing message: {}", question);

        let reply = match self.think(inbound).await {
            Ok(reply) => reply,
            Err(e) => {
                error!(channel_id, "Failed to generate reply: {}", e);
                self.send_fallback(channel_id, language).await;
                return DispatchOutcome::Failed(e);
            }
        };

        if let Err(e) = self.transport.send_text(channel_id, &reply.text).await {
            error!(channel_id, "Failed to send reply: {}", e);
            return DispatchOutcome::Failed(e.into());
        }
        debug!(channel_id, "Sent reply: {}", reply.text);

        let (user_id, username, first_name, last_name) = match &message.from {
            Some(user) => (
                user.id,
                user.username.clone(),
                Some(user.first_name.clone()),
                user.last_name.clone(),
            ),
            None => (channel_id, message.chat.username.clone(), None, None),
        };
        let record = NewConversation::new(
            channel_id,
            channel_type(message.chat.kind),
            user_id,
            question,
            reply.text.clone(),
        )
        .with_user_names(username, first_name, last_name)
        .with_message_type(kind)
        .with_language(language);

        let record_id = self.recorder.record(record).await;

        DispatchOutcome::Responded {
            channel_id,
            reply: reply.text,
            record_id,
        }
    }

    /// Run the brain under the configured timeout, keeping the typing
    /// indicator alive until it settles.
    async fn think(&self, inbound: InboundMessage) -> Result<OutboundMessage, DispatchError> {
        let channel_id = inbound.channel_id;
        let limit = self.config.brain_timeout;
        let process = timeout(limit, self.brain.process(inbound));
        tokio::pin!(process);

        if !self.config.send_typing_indicators {
            return settle(process.await, limit);
        }

        let mut typing = interval(self.config.typing_refresh.max(MIN_TYPING_REFRESH));
        loop {
            tokio::select! {
                biased;

                _ = typing.tick() => {
                    if let Err(e) = self.transport.send_typing(channel_id).await {
                        warn!(channel_id, "Failed to send typing indicator: {}", e);
                    }
                }

                result = &mut process => return settle(result, limit),
            }
        }
    }

    async fn send_fallback(&self, channel_id: i64, language: Language) {
        if let Err(e) = self
            .transport
            .send_text(channel_id, fallback_message(language))
            .await
        {
            error!(channel_id, "Failed to send fallback message: {}", e);
        }
    }

    /// Run the dispatcher with graceful shutdown support.
    ///
    /// Updates are handled one at a time in the order they arrive. Runs
    /// until the shutdown signal completes or the update stream ends.
    pub async fn run_with_shutdown<S, F>(
        self,
        mut updates: S,
        shutdown_signal: F,
    ) -> Result<(), DispatchError>
    where
        S: Stream<Item = Result<Update, TelegramError>> + Unpin + Send,
        F: std::future::Future<Output = ()> + Send,
    {
        info!(
            "Starting dispatcher with brain: {} (graceful shutdown enabled)",
            self.brain.name()
        );

        tokio::pin!(shutdown_signal);

        loop {
            tokio::select! {
                biased;

                () = &mut shutdown_signal => {
                    info!("Shutdown signal received, stopping dispatcher");
                    if let Err(e) = self.brain.shutdown().await {
                        warn!("Error during brain shutdown: {}", e);
                    }
                    return Ok(());
                }

                result = updates.next() => {
                    match result {
                        Some(Ok(update)) => match self.handle_update(&update).await {
                            DispatchOutcome::Responded { channel_id, record_id, .. } => {
                                debug!(channel_id, ?record_id, "Responded");
                            }
                            DispatchOutcome::Welcomed { channel_id } => {
                                debug!(channel_id, "Welcomed");
                            }
                            DispatchOutcome::Skipped { reason } => {
                                debug!("Skipped update {}: {}", update.update_id, reason);
                            }
                            DispatchOutcome::Failed(e) => {
                                warn!("Error handling update {}: {}", update.update_id, e);
                            }
                        },
                        Some(Err(e)) => {
                            error!("Update stream error: {}", e);
                        }
                        None => {
                            warn!("Update stream ended");
                            return Err(DispatchError::StreamEnded);
                        }
                    }
                }
            }
        }
    }
}

fn settle(
    result: Result<Result<OutboundMessage, BrainError>, Elapsed>,
    limit: Duration,
) -> Result<OutboundMessage, DispatchError> {
    match result {
        Ok(reply) => reply.map_err(DispatchError::from),
        Err(_elapsed) => Err(DispatchError::Timeout(limit)),
    }
}

fn skipped(reason: impl Into<String>) -> DispatchOutcome {
    DispatchOutcome::Skipped {
        reason: reason.into(),
    }
}

fn channel_type(kind: ChatKind) -> ChannelType {
    match kind {
        ChatKind::Private => ChannelType::Private,
        ChatKind::Group => ChannelType::Group,
        ChatKind::Supergroup => ChannelType::Supergroup,
        ChatKind::Channel => ChannelType::Channel,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::RecordingTransport;
    use database::{ConnectionManager, MemoryDriver, StoreOptions};
    use mock_brain::{DelayedBrain, EchoBrain, FailingBrain};
    use serde_json::json;
    use std::sync::Arc;

    fn setup() -> (Arc<MemoryDriver>, ConversationRecorder) {
        let driver = Arc::new(MemoryDriver::new());
        let manager = ConnectionManager::new(
            driver.clone(),
            StoreOptions::new("memory://dispatcher").with_heartbeat_interval(Duration::ZERO),
        );
        (driver, ConversationRecorder::new(manager))
    }

    fn build<B: Brain>(brain: B) -> (Arc<MemoryDriver>, Dispatcher<B, RecordingTransport>) {
        let (driver, recorder) = setup();
        let dispatcher = Dispatcher::with_defaults(brain, RecordingTransport::new(), recorder);
        (driver, dispatcher)
    }

    fn update(message: serde_json::Value) -> Update {
        serde_json::from_value(json!({"update_id": 1, "message": message})).unwrap()
    }

    fn text_update(chat_id: i64, text: &str) -> Update {
        update(json!({
            "message_id": 10,
            "date": 1700000000,
            "chat": {"id": chat_id, "type": "private", "username": "budi"},
            "from": {"id": 7, "first_name": "Budi", "username": "budi"},
            "text": text
        }))
    }

    fn photo_update(chat_id: i64, caption: Option<&str>) -> Update {
        let mut message = json!({
            "message_id": 11,
            "date": 1700000100,
            "chat": {"id": chat_id, "type": "group", "title": "Buyers"},
            "from": {"id": 8, "first_name": "Sari"},
            "photo": [
                {"file_id": "small", "width": 90, "height": 90},
                {"file_id": "large", "width": 1280, "height": 960}
            ]
        });
        if let Some(caption) = caption {
            message["caption"] = json!(caption);
        }
        update(message)
    }

    #[tokio::test]
    async fn test_text_is_answered_and_recorded() {
        let (driver, dispatcher) = build(EchoBrain::new());

        let outcome = dispatcher.handle_update(&text_update(42, "berapa harga filter?")).await;

        match outcome {
            DispatchOutcome::Responded { channel_id, reply, record_id } => {
                assert_eq!(channel_id, 42);
                assert_eq!(reply, "berapa harga filter?");
                assert!(record_id.is_some());
            }
            other => panic!("Expected Responded, got {:?}", other),
        }
        assert_eq!(
            dispatcher.transport().sent(),
            vec![(42, "berapa harga filter?".to_string())]
        );

        let records = driver.records().await;
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].channel_type, ChannelType::Private);
        assert_eq!(records[0].user_id, 7);
        assert_eq!(records[0].first_name.as_deref(), Some("Budi"));
        assert_eq!(records[0].language, Language::Id);
        assert_eq!(records[0].message_type, MessageKind::Text);
    }

    #[tokio::test]
    async fn test_language_is_cached_per_channel() {
        let (_driver, dispatcher) = build(EchoBrain::new());

        dispatcher.handle_update(&text_update(1, "terima kasih")).await;
        dispatcher.handle_update(&text_update(2, "thanks")).await;

        assert_eq!(dispatcher.languages().get(1).await, Some(Language::Id));
        assert_eq!(dispatcher.languages().get(2).await, Some(Language::En));
    }

    #[tokio::test]
    async fn test_start_sends_welcome_without_recording() {
        let (driver, dispatcher) = build(EchoBrain::new());

        let outcome = dispatcher.handle_update(&text_update(5, "/start")).await;

        assert!(matches!(outcome, DispatchOutcome::Welcomed { channel_id: 5 }));
        assert_eq!(dispatcher.transport().sent(), vec![(5, WELCOME_MESSAGE.to_string())]);
        assert_eq!(dispatcher.brain().calls(), 0);
        assert!(driver.records().await.is_empty());
    }

    #[tokio::test]
    async fn test_other_commands_and_empty_updates_are_skipped() {
        let (_driver, dispatcher) = build(EchoBrain::new());

        let help = dispatcher.handle_update(&text_update(5, "/help")).await;
        assert!(matches!(help, DispatchOutcome::Skipped { .. }));

        let edited: Update = serde_json::from_value(json!({"update_id": 2})).unwrap();
        let empty = dispatcher.handle_update(&edited).await;
        assert!(matches!(empty, DispatchOutcome::Skipped { .. }));

        assert!(dispatcher.transport().sent().is_empty());
        assert_eq!(dispatcher.brain().calls(), 0);
    }

    #[tokio::test]
    async fn test_photo_without_caption_uses_placeholder() {
        let (driver, dispatcher) = build(EchoBrain::new());
        dispatcher.languages().set(-100, Language::Id).await;

        let outcome = dispatcher.handle_update(&photo_update(-100, None)).await;

        assert!(matches!(outcome, DispatchOutcome::Responded { .. }));
        assert_eq!(dispatcher.transport().sent(), vec![(-100, "[image:3]".to_string())]);

        let records = driver.records().await;
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].question, IMAGE_QUESTION);
        assert_eq!(records[0].message_type, MessageKind::Image);
        assert_eq!(records[0].channel_type, ChannelType::Group);
        assert_eq!(records[0].language, Language::Id);
    }

    #[tokio::test]
    async fn test_photo_caption_becomes_question() {
        let (driver, dispatcher) = build(EchoBrain::new());

        dispatcher
            .handle_update(&photo_update(-100, Some("filter apa ini?")))
            .await;

        let records = driver.records().await;
        assert_eq!(records[0].question, "filter apa ini?");
        // No text seen on this channel yet, so the default applies
        assert_eq!(records[0].language, Language::En);
    }

    #[tokio::test]
    async fn test_photo_download_failure_sends_fallback() {
        let (driver, dispatcher) = build(EchoBrain::new());
        dispatcher.transport().set_fail_downloads(true);

        let outcome = dispatcher.handle_update(&photo_update(-100, None)).await;

        assert!(matches!(outcome, DispatchOutcome::Failed(DispatchError::Telegram(_))));
        assert_eq!(
            dispatcher.transport().sent(),
            vec![(-100, fallback_message(Language::En).to_string())]
        );
        assert_eq!(dispatcher.brain().calls(), 0);
        assert!(driver.records().await.is_empty());
    }

    #[tokio::test]
    async fn test_brain_failure_sends_localized_fallback() {
        let (driver, dispatcher) = build(FailingBrain::default());

        let outcome = dispatcher.handle_update(&text_update(42, "tolong bantu saya")).await;

        match outcome {
            DispatchOutcome::Failed(e) => assert!(e.is_upstream()),
            other => panic!("Expected Failed, got {:?}", other),
        }
        assert_eq!(
            dispatcher.transport().sent(),
            vec![(42, "Maaf, terjadi kesalahan. Silakan coba lagi.".to_string())]
        );
        assert!(driver.records().await.is_empty());
    }

    #[tokio::test]
    async fn test_send_failure_skips_recording() {
        let (driver, dispatcher) = build(EchoBrain::new());
        dispatcher.transport().set_fail_sends(true);

        let outcome = dispatcher.handle_update(&text_update(42, "hello")).await;

        assert!(matches!(outcome, DispatchOutcome::Failed(DispatchError::Telegram(_))));
        assert!(driver.records().await.is_empty());
    }

    #[tokio::test]
    async fn test_reply_still_sent_when_store_unreachable() {
        let (driver, dispatcher) = build(EchoBrain::new());
        driver.set_fail_connect(true);

        let outcome = dispatcher.handle_update(&text_update(42, "hello")).await;

        match outcome {
            DispatchOutcome::Responded { record_id, .. } => assert_eq!(record_id, None),
            other => panic!("Expected Responded, got {:?}", other),
        }
        assert_eq!(dispatcher.transport().sent(), vec![(42, "hello".to_string())]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_typing_refreshed_while_brain_works() {
        let (_driver, dispatcher) = build(DelayedBrain::with_secs(EchoBrain::new(), 10));

        let outcome = dispatcher.handle_update(&text_update(42, "hello")).await;

        assert!(matches!(outcome, DispatchOutcome::Responded { .. }));
        // Ticks at 0s, 4s and 8s; the brain settles at 10s
        assert_eq!(dispatcher.transport().typing_count(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_brain_timeout_is_upstream_failure() {
        let (driver, recorder) = setup();
        let config = DispatcherConfig::default().with_brain_timeout(Duration::from_secs(5));
        let dispatcher = Dispatcher::new(
            DelayedBrain::with_secs(EchoBrain::new(), 30),
            RecordingTransport::new(),
            recorder,
            config,
        );

        let outcome = dispatcher.handle_update(&text_update(42, "hello")).await;

        assert!(matches!(outcome, DispatchOutcome::Failed(DispatchError::Timeout(_))));
        assert_eq!(
            dispatcher.transport().sent(),
            vec![(42, fallback_message(Language::En).to_string())]
        );
        assert!(driver.records().await.is_empty());
    }

    #[tokio::test]
    async fn test_run_handles_updates_in_order_until_stream_ends() {
        let (driver, dispatcher) = build(EchoBrain::new());
        let updates = futures::stream::iter(vec![
            Ok(text_update(42, "first")),
            Err(TelegramError::Connection("poll failed".to_string())),
            Ok(text_update(42, "second")),
        ]);

        let result = dispatcher
            .run_with_shutdown(updates, std::future::pending::<()>())
            .await;

        assert!(matches!(result, Err(DispatchError::StreamEnded)));
        let questions: Vec<String> = driver
            .records()
            .await
            .into_iter()
            .map(|r| r.question)
            .collect();
        assert_eq!(questions, vec!["first", "second"]);
    }

    #[tokio::test]
    async fn test_run_stops_on_shutdown() {
        let (_driver, dispatcher) = build(EchoBrain::new());
        let updates = futures::stream::pending::<Result<Update, TelegramError>>();

        let result = dispatcher.run_with_shutdown(updates, async {}).await;

        assert!(result.is_ok());
    }
}
