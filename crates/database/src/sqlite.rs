//! SQLite store driver.

use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::StoreOptions;
use crate::conversation;
use crate::driver::{ConversationStore, DriverEvent, EventSink, StoreDriver};
use crate::error::Result;
use crate::models::{Conversation, NewConversation};

/// SQLite connection pool wrapper.
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Connect to a SQLite database.
    ///
    /// The URL should be in the format `sqlite:path/to/db.sqlite?mode=rwc`.
    /// `sqlite::memory:` gives a private in-memory database (for testing).
    pub async fn connect(options: &StoreOptions) -> Result<Self> {
        let connect_options = SqliteConnectOptions::from_str(&options.url)?
            .create_if_missing(true)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(options.pool_size.max(1))
            .acquire_timeout(options.connect_timeout)
            .connect_with(connect_options)
            .await?;

        debug!(
            "Opened SQLite pool: {} (pool size: {})",
            options.redacted_url(),
            options.pool_size
        );

        Ok(Self { pool })
    }

    /// Run database migrations.
    pub async fn migrate(&self) -> Result<()> {
        debug!("Running conversation store migrations...");
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }

    /// Get a reference to the connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Close the connection pool.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

/// Name of the database a SQLite URL points at (file stem, or `memory`).
pub fn store_name_from_url(url: &str) -> String {
    let path = url
        .trim_start_matches("sqlite://")
        .trim_start_matches("sqlite:");
    let path = path.split('?').next().unwrap_or_default();

    if path.is_empty() || path == ":memory:" {
        return "memory".to_string();
    }

    Path::new(path)
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or(path)
        .to_string()
}

/// Driver that opens SQLite pools and watches them with a heartbeat.
#[derive(Debug, Clone, Default)]
pub struct SqliteDriver;

impl SqliteDriver {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl StoreDriver for SqliteDriver {
    async fn connect(
        &self,
        options: &StoreOptions,
        events: EventSink,
    ) -> Result<Arc<dyn ConversationStore>> {
        events.emit(DriverEvent::Connecting);

        let db = Database::connect(options).await?;
        db.migrate().await?;

        let name = store_name_from_url(&options.url);
        let heartbeat = if options.heartbeat_interval.is_zero() {
            None
        } else {
            Some(spawn_heartbeat(
                db.clone(),
                options.heartbeat_interval,
                events.clone(),
            ))
        };

        events.emit(DriverEvent::Connected);

        Ok(Arc::new(SqliteStore {
            db,
            name,
            heartbeat: Mutex::new(heartbeat),
        }))
    }
}

/// Ping the pool until it stops answering, then report the link as lost.
fn spawn_heartbeat(db: Database, interval: Duration, events: EventSink) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            tokio::time::sleep(interval).await;

            if let Err(e) = ping(db.pool()).await {
                warn!("Conversation store heartbeat failed: {}", e);
                events.emit(DriverEvent::Error(e.to_string()));
                events.emit(DriverEvent::Disconnected);
                break;
            }
        }
    })
}

async fn ping(pool: &SqlitePool) -> Result<()> {
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}

/// An open SQLite conversation store.
pub struct SqliteStore {
    db: Database,
    name: String,
    heartbeat: Mutex<Option<JoinHandle<()>>>,
}

impl SqliteStore {
    /// Underlying database handle.
    pub fn database(&self) -> &Database {
        &self.db
    }
}

#[async_trait]
impl ConversationStore for SqliteStore {
    fn name(&self) -> &str {
        &self.name
    }

    async fn ping(&self) -> Result<()> {
        ping(self.db.pool()).await
    }

    async fn insert(&self, record: &NewConversation) -> Result<i64> {
        conversation::insert_conversation(self.db.pool(), record, Utc::now()).await
    }

    async fn by_channel(&self, channel_id: i64, limit: u32) -> Result<Vec<Conversation>> {
        conversation::list_by_channel(self.db.pool(), channel_id, limit).await
    }

    async fn by_user(&self, user_id: i64, limit: u32) -> Result<Vec<Conversation>> {
        conversation::list_by_user(self.db.pool(), user_id, limit).await
    }

    async fn distinct_channel_ids(&self) -> Result<Vec<i64>> {
        conversation::distinct_channel_ids(self.db.pool()).await
    }

    async fn close(&self) -> Result<()> {
        if let Some(heartbeat) = self.heartbeat.lock().await.take() {
            heartbeat.abort();
        }
        self.db.close().await;
        info!("Closed conversation store {}", self.name);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_name_from_url() {
        assert_eq!(store_name_from_url("sqlite:data/mubai.db?mode=rwc"), "mubai");
        assert_eq!(store_name_from_url("sqlite://conversations.sqlite"), "conversations");
        assert_eq!(store_name_from_url("sqlite::memory:"), "memory");
    }

    #[tokio::test]
    async fn test_connect_migrate_and_count() {
        let options = StoreOptions::new("sqlite::memory:").with_heartbeat_interval(Duration::ZERO);
        let (events, mut rx) = EventSink::channel();

        let store = SqliteDriver::new().connect(&options, events).await.unwrap();
        assert_eq!(store.name(), "memory");
        assert_eq!(rx.recv().await, Some(DriverEvent::Connecting));
        assert_eq!(rx.recv().await, Some(DriverEvent::Connected));

        store.ping().await.unwrap();
        store.close().await.unwrap();
        assert!(store.ping().await.is_err());
    }

    #[tokio::test]
    async fn test_heartbeat_reports_lost_link() {
        let options = StoreOptions::new("sqlite::memory:")
            .with_heartbeat_interval(Duration::from_millis(20));
        let (events, mut rx) = EventSink::channel();

        let db = Database::connect(&options).await.unwrap();
        let heartbeat = spawn_heartbeat(db.clone(), options.heartbeat_interval, events);
        db.close().await;

        assert!(matches!(rx.recv().await, Some(DriverEvent::Error(_))));
        assert_eq!(rx.recv().await, Some(DriverEvent::Disconnected));
        heartbeat.await.unwrap();
    }
}
