//! Store driver abstraction.
//!
//! A [`StoreDriver`] opens connections; each open connection is a
//! [`ConversationStore`]. Drivers report link changes they notice on their
//! own (lost server, recovered link) through an [`EventSink`] handed to them
//! at connect time.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::config::StoreOptions;
use crate::error::Result;
use crate::models::{Conversation, NewConversation};

/// Link event reported by a driver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DriverEvent {
    Connecting,
    Connected,
    Reconnected,
    Disconnected,
    Error(String),
}

/// Sending half of the driver event channel.
#[derive(Debug, Clone)]
pub struct EventSink {
    tx: mpsc::UnboundedSender<DriverEvent>,
}

impl EventSink {
    /// Create a sink and the receiver its events arrive on.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<DriverEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    /// Report an event. Events sent after the manager is gone are dropped.
    pub fn emit(&self, event: DriverEvent) {
        let _ = self.tx.send(event);
    }
}

/// Opens connections to a conversation store.
#[async_trait]
pub trait StoreDriver: Send + Sync + 'static {
    /// Open a connection. The driver keeps `events` to report link changes
    /// for as long as the returned store is open.
    async fn connect(
        &self,
        options: &StoreOptions,
        events: EventSink,
    ) -> Result<Arc<dyn ConversationStore>>;
}

/// An open connection to the conversation store.
#[async_trait]
pub trait ConversationStore: Send + Sync {
    /// Name of the store (database) reached.
    fn name(&self) -> &str;

    /// Check the link is alive.
    async fn ping(&self) -> Result<()>;

    /// Append a record, returning its assigned id.
    async fn insert(&self, record: &NewConversation) -> Result<i64>;

    /// Most recent records for a channel, newest first.
    async fn by_channel(&self, channel_id: i64, limit: u32) -> Result<Vec<Conversation>>;

    /// Most recent records for a user across channels, newest first.
    async fn by_user(&self, user_id: i64, limit: u32) -> Result<Vec<Conversation>>;

    /// Every channel id with at least one record.
    async fn distinct_channel_ids(&self) -> Result<Vec<i64>>;

    /// Release the connection.
    async fn close(&self) -> Result<()>;
}
