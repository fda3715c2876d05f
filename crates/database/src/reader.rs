//! Read-only queries over recorded conversations.
//!
//! Reads never connect: while the store is down every query returns an
//! empty result.

use std::future::Future;
use std::sync::Arc;

use tracing::debug;

use crate::best_effort::best_effort;
use crate::driver::ConversationStore;
use crate::error::Result;
use crate::manager::ConnectionManager;
use crate::models::{ChannelSummary, Conversation};

/// Default cap on records returned by a query.
pub const DEFAULT_LIMIT: u32 = 50;

/// Queries conversation records through a [`ConnectionManager`].
#[derive(Debug, Clone)]
pub struct ConversationReader {
    manager: ConnectionManager,
}

impl ConversationReader {
    pub fn new(manager: ConnectionManager) -> Self {
        Self { manager }
    }

    /// Most recent records for a channel, newest first.
    pub async fn by_channel(&self, channel_id: i64, limit: u32) -> Vec<Conversation> {
        self.query("by_channel", |store| async move {
            store.by_channel(channel_id, limit).await
        })
        .await
    }

    /// Most recent records for a user across channels, newest first.
    pub async fn by_user(&self, user_id: i64, limit: u32) -> Vec<Conversation> {
        self.query("by_user", |store| async move {
            store.by_user(user_id, limit).await
        })
        .await
    }

    /// Every channel id with at least one record.
    pub async fn distinct_channel_ids(&self) -> Vec<i64> {
        self.query("distinct_channel_ids", |store| async move {
            store.distinct_channel_ids().await
        })
        .await
    }

    /// Recent activity for up to `max_channels` channels.
    ///
    /// `conversation_count` counts at most `per_channel` recent records.
    pub async fn channel_summaries(
        &self,
        max_channels: usize,
        per_channel: u32,
    ) -> Vec<ChannelSummary> {
        let mut summaries = Vec::new();

        for channel_id in self.distinct_channel_ids().await.into_iter().take(max_channels) {
            let recent = self.by_channel(channel_id, per_channel).await;
            summaries.push(ChannelSummary {
                channel_id,
                conversation_count: recent.len(),
                latest: recent.into_iter().next(),
            });
        }

        summaries
    }

    async fn query<T, F, Fut>(&self, operation: &'static str, run: F) -> Vec<T>
    where
        F: FnOnce(Arc<dyn ConversationStore>) -> Fut,
        Fut: Future<Output = Result<Vec<T>>>,
    {
        if !self.manager.is_connected() {
            debug!(operation, "Conversation store not connected; returning empty result");
            return Vec::new();
        }

        let Some(store) = self.manager.store().await else {
            return Vec::new();
        };

        best_effort(operation, run(store)).await.unwrap_or_default()
    }
}
