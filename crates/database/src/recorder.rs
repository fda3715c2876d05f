//! Best-effort conversation recording.

use tracing::{debug, info, warn};

use crate::best_effort::best_effort;
use crate::error::DatabaseError;
use crate::manager::ConnectionManager;
use crate::models::NewConversation;
use crate::state::ConnectionState;

/// Writes conversation records through a [`ConnectionManager`].
///
/// Recording never fails from the caller's point of view: a record that
/// cannot be written is logged and dropped.
#[derive(Debug, Clone)]
pub struct ConversationRecorder {
    manager: ConnectionManager,
}

impl ConversationRecorder {
    pub fn new(manager: ConnectionManager) -> Self {
        Self { manager }
    }

    /// Persist one exchange, connecting first if needed.
    ///
    /// Returns the assigned record id when the write went through.
    pub async fn record(&self, record: NewConversation) -> Option<i64> {
        match self.manager.state() {
            ConnectionState::Connected => {}
            ConnectionState::Disconnecting => {
                debug!(
                    channel_id = record.channel_id,
                    "Conversation store disconnecting; dropping record"
                );
                return None;
            }
            ConnectionState::Disconnected | ConnectionState::Connecting => {
                if let Err(e) = self.manager.connect().await {
                    warn!(
                        channel_id = record.channel_id,
                        error = %e,
                        "Conversation store unavailable; dropping record"
                    );
                    return None;
                }
            }
        }

        let channel_id = record.channel_id;
        let id = best_effort("record", async {
            record.validate()?;
            let store = self
                .manager
                .store()
                .await
                .ok_or(DatabaseError::NotConnected)?;
            store.insert(&record).await
        })
        .await?;

        info!(
            id,
            channel_id,
            message_type = %record.message_type,
            language = %record.language,
            "Conversation recorded"
        );
        Some(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StoreOptions;
    use crate::memory::MemoryDriver;
    use crate::models::{ChannelType, Language, MessageKind};
    use std::sync::Arc;
    use std::time::Duration;

    fn setup() -> (Arc<MemoryDriver>, ConnectionManager, ConversationRecorder) {
        let driver = Arc::new(MemoryDriver::new());
        let manager = ConnectionManager::new(
            driver.clone(),
            StoreOptions::new("memory://test").with_heartbeat_interval(Duration::ZERO),
        );
        let recorder = ConversationRecorder::new(manager.clone());
        (driver, manager, recorder)
    }

    fn sample() -> NewConversation {
        NewConversation::new(42, ChannelType::Private, 7, "harga filter?", "Harga mulai dari...")
            .with_language(Language::Id)
    }

    #[tokio::test]
    async fn test_record_connects_lazily() {
        let (driver, manager, recorder) = setup();
        assert!(!manager.is_connected());

        let id = recorder.record(sample()).await;

        assert_eq!(id, Some(1));
        assert!(manager.is_connected());
        assert_eq!(driver.connect_attempts(), 1);

        let records = driver.records().await;
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].language, Language::Id);
        assert_eq!(records[0].message_type, MessageKind::Text);
    }

    #[tokio::test]
    async fn test_record_drops_when_connect_fails() {
        let (driver, manager, recorder) = setup();
        driver.set_fail_connect(true);

        assert_eq!(recorder.record(sample()).await, None);

        assert_eq!(driver.connect_attempts(), 1);
        assert_eq!(manager.state(), ConnectionState::Disconnected);
        assert!(driver.records().await.is_empty());
    }

    #[tokio::test]
    async fn test_record_absorbs_write_failure() {
        let (driver, manager, recorder) = setup();
        manager.connect().await.unwrap();
        driver.set_fail_writes(true);

        assert_eq!(recorder.record(sample()).await, None);
        assert!(driver.records().await.is_empty());
        // The connection itself is untouched
        assert!(manager.is_connected());
    }

    #[tokio::test]
    async fn test_record_absorbs_validation_failure() {
        let (driver, _manager, recorder) = setup();
        let invalid = NewConversation::new(42, ChannelType::Group, 7, "  ", "");

        assert_eq!(recorder.record(invalid).await, None);
        assert!(driver.records().await.is_empty());
    }

    #[tokio::test]
    async fn test_record_retries_connect_on_next_call() {
        let (driver, _manager, recorder) = setup();
        driver.set_fail_connect(true);
        assert_eq!(recorder.record(sample()).await, None);

        driver.set_fail_connect(false);
        assert_eq!(recorder.record(sample()).await, Some(1));
        assert_eq!(driver.connect_attempts(), 2);
    }
}
