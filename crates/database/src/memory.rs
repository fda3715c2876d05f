//! In-process store driver.
//!
//! Keeps records in memory for the lifetime of the driver, across
//! connections, so a test can reconnect and still see earlier writes. Knobs
//! let a test make connects slow or failing, make writes fail, and inject
//! driver events the way a real driver would.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;

use crate::config::StoreOptions;
use crate::driver::{ConversationStore, DriverEvent, EventSink, StoreDriver};
use crate::error::{DatabaseError, Result};
use crate::models::{Conversation, NewConversation};

#[derive(Debug, Default)]
struct MemoryData {
    next_id: i64,
    records: Vec<Conversation>,
}

/// Driver backed by a shared in-memory record list.
#[derive(Debug, Default)]
pub struct MemoryDriver {
    data: Arc<Mutex<MemoryData>>,
    sink: Mutex<Option<EventSink>>,
    connect_attempts: AtomicUsize,
    connect_delay_ms: AtomicUsize,
    fail_connect: AtomicBool,
    fail_writes: Arc<AtomicBool>,
}

impl MemoryDriver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent connect attempts fail (or succeed again).
    pub fn set_fail_connect(&self, fail: bool) {
        self.fail_connect.store(fail, Ordering::SeqCst);
    }

    /// Make subsequent writes fail with a store error.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Delay every connect attempt by `delay`.
    pub fn set_connect_delay(&self, delay: Duration) {
        self.connect_delay_ms
            .store(delay.as_millis() as usize, Ordering::SeqCst);
    }

    /// Number of connect attempts seen so far.
    pub fn connect_attempts(&self) -> usize {
        self.connect_attempts.load(Ordering::SeqCst)
    }

    /// Snapshot of all stored records, in insertion order.
    pub async fn records(&self) -> Vec<Conversation> {
        self.data.lock().await.records.clone()
    }

    /// Report a driver event as if the link changed underneath the manager.
    pub async fn emit(&self, event: DriverEvent) {
        if let Some(sink) = self.sink.lock().await.as_ref() {
            sink.emit(event);
        }
    }
}

#[async_trait]
impl StoreDriver for MemoryDriver {
    async fn connect(
        &self,
        _options: &StoreOptions,
        events: EventSink,
    ) -> Result<Arc<dyn ConversationStore>> {
        self.connect_attempts.fetch_add(1, Ordering::SeqCst);
        events.emit(DriverEvent::Connecting);

        let delay = self.connect_delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay as u64)).await;
        }

        if self.fail_connect.load(Ordering::SeqCst) {
            return Err(DatabaseError::Connection(
                "connection refused by memory driver".to_string(),
            ));
        }

        *self.sink.lock().await = Some(events.clone());
        events.emit(DriverEvent::Connected);

        Ok(Arc::new(MemoryStore {
            data: Arc::clone(&self.data),
            fail_writes: Arc::clone(&self.fail_writes),
            open: AtomicBool::new(true),
        }))
    }
}

/// One open connection to a [`MemoryDriver`].
#[derive(Debug)]
pub struct MemoryStore {
    data: Arc<Mutex<MemoryData>>,
    fail_writes: Arc<AtomicBool>,
    open: AtomicBool,
}

impl MemoryStore {
    fn ensure_open(&self) -> Result<()> {
        if self.open.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(DatabaseError::NotConnected)
        }
    }

    async fn newest_first<F>(&self, limit: u32, filter: F) -> Result<Vec<Conversation>>
    where
        F: Fn(&Conversation) -> bool,
    {
        self.ensure_open()?;
        let data = self.data.lock().await;
        let mut matching: Vec<Conversation> =
            data.records.iter().filter(|r| filter(r)).cloned().collect();
        matching.sort_by(|a, b| b.timestamp.cmp(&a.timestamp).then(b.id.cmp(&a.id)));
        matching.truncate(limit as usize);
        Ok(matching)
    }
}

#[async_trait]
impl ConversationStore for MemoryStore {
    fn name(&self) -> &str {
        "memory"
    }

    async fn ping(&self) -> Result<()> {
        self.ensure_open()
    }

    async fn insert(&self, record: &NewConversation) -> Result<i64> {
        self.ensure_open()?;
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(DatabaseError::Sqlx(sqlx::Error::PoolTimedOut));
        }

        let mut data = self.data.lock().await;
        data.next_id += 1;
        let id = data.next_id;
        data.records
            .push(Conversation::from_new(id, record.clone(), Utc::now()));
        Ok(id)
    }

    async fn by_channel(&self, channel_id: i64, limit: u32) -> Result<Vec<Conversation>> {
        self.newest_first(limit, |r| r.channel_id == channel_id)
            .await
    }

    async fn by_user(&self, user_id: i64, limit: u32) -> Result<Vec<Conversation>> {
        self.newest_first(limit, |r| r.user_id == user_id).await
    }

    async fn distinct_channel_ids(&self) -> Result<Vec<i64>> {
        self.ensure_open()?;
        let data = self.data.lock().await;
        let mut ids: Vec<i64> = data.records.iter().map(|r| r.channel_id).collect();
        ids.sort_unstable();
        ids.dedup();
        Ok(ids)
    }

    async fn close(&self) -> Result<()> {
        self.open.store(false, Ordering::SeqCst);
        Ok(())
    }
}
