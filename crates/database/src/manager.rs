//! Connection manager for the conversation store.
//!
//! Owns the single store connection and its [`ConnectionState`]. The
//! recorder and reader receive a clone of the manager instead of reaching
//! for a global.
//!
//! - `connect` is idempotent and coalesced: callers arriving while an attempt
//!   is in flight await that same attempt.
//! - Driver events are consumed by one background task, which is the only
//!   place unsolicited transitions happen.
//! - An unsolicited disconnect schedules exactly one reconnect after
//!   `reconnect_delay`. A failed reconnect is logged and not retried.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use futures::future::{BoxFuture, FutureExt, Shared};
use tokio::sync::{mpsc, watch, Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::{debug, error, info, warn};

use crate::config::StoreOptions;
use crate::driver::{ConversationStore, DriverEvent, EventSink, StoreDriver};
use crate::error::{DatabaseError, Result};
use crate::sqlite::SqliteDriver;
use crate::state::ConnectionState;

/// Outcome of one connect attempt: the store name, or the driver message.
type AttemptOutcome = std::result::Result<String, String>;

type ConnectAttempt = Shared<BoxFuture<'static, AttemptOutcome>>;

const SHUT_DOWN: &str = "connection manager is shut down";

/// Manages the lazily established connection to the conversation store.
///
/// Cheap to clone; all clones share one connection and one state.
#[derive(Clone)]
pub struct ConnectionManager {
    inner: Arc<Inner>,
}

struct Inner {
    driver: Arc<dyn StoreDriver>,
    options: StoreOptions,
    state: watch::Sender<ConnectionState>,
    store: RwLock<Option<Arc<dyn ConversationStore>>>,
    store_name: RwLock<Option<String>>,
    /// Attempt currently in flight. Cleared, together with the final state
    /// transition, under this lock.
    in_flight: Mutex<Option<ConnectAttempt>>,
    /// Reconnect waiting for its timer. Taken by the task itself when the
    /// timer fires.
    reconnect: Mutex<Option<JoinHandle<()>>>,
    events: EventSink,
    event_task: Mutex<Option<JoinHandle<()>>>,
    /// Set by `shutdown`; no store is installed afterwards.
    closed: AtomicBool,
}

impl ConnectionManager {
    /// Create a manager for the given driver. Nothing is connected yet.
    ///
    /// Must be called from within a Tokio runtime: the driver-event task is
    /// spawned here.
    pub fn new(driver: Arc<dyn StoreDriver>, options: StoreOptions) -> Self {
        let (events, rx) = EventSink::channel();
        let (state, _) = watch::channel(ConnectionState::Disconnected);

        let inner = Arc::new_cyclic(|weak: &Weak<Inner>| {
            let event_task = tokio::spawn(run_events(weak.clone(), rx));
            Inner {
                driver,
                options,
                state,
                store: RwLock::new(None),
                store_name: RwLock::new(None),
                in_flight: Mutex::new(None),
                reconnect: Mutex::new(None),
                events,
                event_task: Mutex::new(Some(event_task)),
                closed: AtomicBool::new(false),
            }
        });

        Self { inner }
    }

    /// Create a manager backed by the SQLite driver.
    pub fn sqlite(options: StoreOptions) -> Self {
        Self::new(Arc::new(SqliteDriver::new()), options)
    }

    /// Establish the connection if it is not already up.
    ///
    /// Returns immediately when connected. Concurrent callers share one
    /// attempt and its outcome.
    pub async fn connect(&self) -> Result<()> {
        self.inner.connect().await
    }

    /// Release the connection. A no-op unless connected; close failures are
    /// logged, not returned.
    pub async fn disconnect(&self) {
        self.inner.disconnect().await;
    }

    /// Cancel any pending reconnect, stop consuming driver events and
    /// disconnect.
    ///
    /// An attempt already in flight is awaited and its store released, so
    /// the manager always ends `Disconnected`. Later connects fail.
    pub async fn shutdown(&self) {
        self.inner.closed.store(true, Ordering::SeqCst);

        if let Some(pending) = self.inner.reconnect.lock().await.take() {
            pending.abort();
            info!("Cancelled pending conversation store reconnect");
        }

        let in_flight = self.inner.in_flight.lock().await.clone();
        if let Some(attempt) = in_flight {
            debug!("Waiting for in-flight conversation store connect");
            let _ = attempt.await;
        }

        self.inner.disconnect().await;

        if let Some(task) = self.inner.event_task.lock().await.take() {
            task.abort();
        }
    }

    /// Current connection state.
    pub fn state(&self) -> ConnectionState {
        self.inner.current_state()
    }

    /// Whether the store is connected right now.
    pub fn is_connected(&self) -> bool {
        self.state().is_connected()
    }

    /// Watch state transitions.
    pub fn subscribe_state(&self) -> watch::Receiver<ConnectionState> {
        self.inner.state.subscribe()
    }

    /// Name of the store reached by the last successful connect.
    pub async fn store_name(&self) -> Option<String> {
        self.inner.store_name.read().await.clone()
    }

    /// Options this manager connects with.
    pub fn options(&self) -> &StoreOptions {
        &self.inner.options
    }

    /// Sink for reporting driver events from outside the driver.
    pub fn event_sink(&self) -> EventSink {
        self.inner.events.clone()
    }

    /// Open store handle, if connected.
    pub(crate) async fn store(&self) -> Option<Arc<dyn ConversationStore>> {
        self.inner.store.read().await.clone()
    }
}

impl std::fmt::Debug for ConnectionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionManager")
            .field("url", &self.inner.options.redacted_url())
            .field("state", &self.state())
            .finish()
    }
}

impl Inner {
    fn current_state(&self) -> ConnectionState {
        *self.state.borrow()
    }

    fn set_state(&self, next: ConnectionState) {
        self.state.send_if_modified(|current| {
            if *current == next {
                return false;
            }
            info!(from = %current, to = %next, "Conversation store state changed");
            *current = next;
            true
        });
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    async fn connect(self: &Arc<Self>) -> Result<()> {
        if self.current_state().is_connected() {
            debug!("Conversation store already connected");
            return Ok(());
        }
        if self.is_closed() {
            return Err(DatabaseError::Connection(SHUT_DOWN.to_string()));
        }

        let attempt = {
            let mut slot = self.in_flight.lock().await;
            // Re-check under the lock: an attempt may have finished meanwhile.
            if self.current_state().is_connected() {
                return Ok(());
            }
            match slot.as_ref() {
                Some(attempt) => {
                    debug!("Joining in-flight conversation store connect");
                    attempt.clone()
                }
                None => {
                    let attempt = Arc::clone(self).establish().boxed().shared();
                    *slot = Some(attempt.clone());
                    attempt
                }
            }
        };

        attempt.await.map(|_| ()).map_err(DatabaseError::Connection)
    }

    async fn establish(self: Arc<Self>) -> AttemptOutcome {
        self.set_state(ConnectionState::Connecting);
        info!(url = %self.options.redacted_url(), "Connecting to conversation store");

        let attempt = timeout(
            self.options.connect_timeout,
            self.driver.connect(&self.options, self.events.clone()),
        )
        .await;

        let outcome = match attempt {
            Ok(Ok(store)) => Ok(store),
            Ok(Err(DatabaseError::Connection(message))) => Err(message),
            Ok(Err(e)) => Err(e.to_string()),
            Err(_) => Err(format!(
                "connection attempt timed out after {:?}",
                self.options.connect_timeout
            )),
        };

        let mut slot = self.in_flight.lock().await;
        let result = match outcome {
            Ok(store) if self.is_closed() => {
                if let Err(e) = store.close().await {
                    debug!("Error releasing store opened during shutdown: {}", e);
                }
                self.set_state(ConnectionState::Disconnected);
                info!("Discarded conversation store connection opened during shutdown");
                Err(SHUT_DOWN.to_string())
            }
            Ok(store) => {
                let name = store.name().to_string();
                *self.store.write().await = Some(store);
                *self.store_name.write().await = Some(name.clone());
                self.set_state(ConnectionState::Connected);
                info!(store = %name, "Conversation store connected");
                Ok(name)
            }
            Err(message) => {
                self.set_state(ConnectionState::Disconnected);
                error!(error = %message, "Conversation store connection failed");
                Err(message)
            }
        };
        slot.take();

        result
    }

    async fn disconnect(&self) {
        if !self.current_state().is_connected() {
            debug!("Conversation store not connected; nothing to disconnect");
            return;
        }

        self.set_state(ConnectionState::Disconnecting);

        let store = self.store.write().await.take();
        if let Some(store) = store {
            if let Err(e) = store.close().await {
                error!(error = %e, "Error while disconnecting from conversation store");
            }
        }

        self.set_state(ConnectionState::Disconnected);
        info!("Conversation store disconnected");
    }

    async fn handle_event(self: &Arc<Self>, event: DriverEvent) {
        match event {
            DriverEvent::Connecting => debug!("Conversation store driver connecting"),
            DriverEvent::Connected | DriverEvent::Reconnected => {
                info!(event = ?event, "Conversation store driver reports link up");
                let has_store = self.store.read().await.is_some();
                if has_store && self.current_state() != ConnectionState::Disconnecting {
                    self.set_state(ConnectionState::Connected);
                }
            }
            DriverEvent::Error(message) => {
                error!(error = %message, "Conversation store driver error");
            }
            DriverEvent::Disconnected => self.handle_disconnect().await,
        }
    }

    async fn handle_disconnect(self: &Arc<Self>) {
        let state = self.current_state();
        if !state.is_connected() {
            debug!(state = %state, "Ignoring disconnect event; not connected");
            return;
        }

        warn!("Conversation store connection lost");
        self.set_state(ConnectionState::Disconnected);

        let store = self.store.write().await.take();
        if let Some(store) = store {
            if let Err(e) = store.close().await {
                debug!("Error releasing lost store connection: {}", e);
            }
        }

        self.schedule_reconnect().await;
    }

    async fn schedule_reconnect(self: &Arc<Self>) {
        if self.in_flight.lock().await.is_some() {
            info!("Connect already in flight; not scheduling a reconnect");
            return;
        }

        let mut pending = self.reconnect.lock().await;
        if pending.is_some() {
            debug!("Reconnect already scheduled");
            return;
        }

        let delay = self.options.reconnect_delay;
        info!("Attempting to reconnect to conversation store in {:?}", delay);

        let weak = Arc::downgrade(self);
        *pending = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;

            let Some(inner) = weak.upgrade() else {
                return;
            };
            // Fired: from here on the attempt is no longer cancellable.
            inner.reconnect.lock().await.take();

            if inner.current_state() != ConnectionState::Disconnected {
                debug!("Store state changed before reconnect fired; skipping");
                return;
            }

            match inner.connect().await {
                Ok(()) => info!("Conversation store reconnected"),
                Err(e) => error!(error = %e, "Reconnection attempt failed"),
            }
        }));
    }
}

async fn run_events(inner: Weak<Inner>, mut rx: mpsc::UnboundedReceiver<DriverEvent>) {
    while let Some(event) = rx.recv().await {
        let Some(inner) = inner.upgrade() else {
            break;
        };
        inner.handle_event(event).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryDriver;
    use std::time::Duration;
    use tokio::time::sleep;

    fn options() -> StoreOptions {
        StoreOptions::new("memory://test")
            .with_reconnect_delay(Duration::from_secs(5))
            .with_heartbeat_interval(Duration::ZERO)
    }

    fn manager(driver: &Arc<MemoryDriver>) -> ConnectionManager {
        ConnectionManager::new(driver.clone(), options())
    }

    /// Let the event task drain its queue.
    async fn settle() {
        sleep(Duration::from_millis(10)).await;
    }

    #[tokio::test]
    async fn test_connect_is_idempotent() {
        let driver = Arc::new(MemoryDriver::new());
        let manager = manager(&driver);
        assert_eq!(manager.state(), ConnectionState::Disconnected);

        manager.connect().await.unwrap();
        manager.connect().await.unwrap();

        assert_eq!(driver.connect_attempts(), 1);
        assert_eq!(manager.state(), ConnectionState::Connected);
        assert_eq!(manager.store_name().await.as_deref(), Some("memory"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_connects_coalesce() {
        let driver = Arc::new(MemoryDriver::new());
        driver.set_connect_delay(Duration::from_millis(100));
        let manager = manager(&driver);

        let (a, b, c) = tokio::join!(manager.connect(), manager.connect(), manager.connect());

        assert!(a.is_ok() && b.is_ok() && c.is_ok());
        assert_eq!(driver.connect_attempts(), 1);
        assert!(manager.is_connected());
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_failed_connects_share_outcome() {
        let driver = Arc::new(MemoryDriver::new());
        driver.set_connect_delay(Duration::from_millis(100));
        driver.set_fail_connect(true);
        let manager = manager(&driver);

        let (a, b) = tokio::join!(manager.connect(), manager.connect());

        assert!(matches!(a, Err(DatabaseError::Connection(_))));
        assert!(matches!(b, Err(DatabaseError::Connection(_))));
        assert_eq!(driver.connect_attempts(), 1);
        assert_eq!(manager.state(), ConnectionState::Disconnected);
    }

    #[tokio::test]
    async fn test_connect_failure_carries_driver_message() {
        let driver = Arc::new(MemoryDriver::new());
        driver.set_fail_connect(true);
        let manager = manager(&driver);

        let err = manager.connect().await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "connection error: connection refused by memory driver"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_connect_timeout_is_a_failure() {
        let driver = Arc::new(MemoryDriver::new());
        driver.set_connect_delay(Duration::from_secs(60));
        let manager = ConnectionManager::new(
            driver.clone(),
            options().with_connect_timeout(Duration::from_secs(1)),
        );

        let err = manager.connect().await.unwrap_err();
        assert!(err.to_string().contains("timed out"));
        assert_eq!(manager.state(), ConnectionState::Disconnected);
    }

    #[tokio::test]
    async fn test_disconnect() {
        let driver = Arc::new(MemoryDriver::new());
        let manager = manager(&driver);

        // No-op while disconnected
        manager.disconnect().await;
        assert_eq!(manager.state(), ConnectionState::Disconnected);

        manager.connect().await.unwrap();
        manager.disconnect().await;
        assert_eq!(manager.state(), ConnectionState::Disconnected);
        assert!(manager.store().await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_unsolicited_disconnect_schedules_one_reconnect() {
        let driver = Arc::new(MemoryDriver::new());
        let manager = manager(&driver);
        manager.connect().await.unwrap();

        driver.emit(DriverEvent::Disconnected).await;
        settle().await;
        assert_eq!(manager.state(), ConnectionState::Disconnected);

        // A second disconnect in the interim must not schedule another attempt
        driver.emit(DriverEvent::Disconnected).await;
        settle().await;

        sleep(Duration::from_secs(4)).await;
        assert_eq!(driver.connect_attempts(), 1);

        sleep(Duration::from_secs(2)).await;
        assert_eq!(driver.connect_attempts(), 2);
        assert_eq!(manager.state(), ConnectionState::Connected);

        sleep(Duration::from_secs(30)).await;
        assert_eq!(driver.connect_attempts(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_disconnect_during_reconnect_is_ignored() {
        let driver = Arc::new(MemoryDriver::new());
        let manager = manager(&driver);
        manager.connect().await.unwrap();

        driver.set_connect_delay(Duration::from_secs(3));
        driver.emit(DriverEvent::Disconnected).await;
        settle().await;

        // Reconnect fires at ~5s and stays in flight until ~8s
        sleep(Duration::from_secs(6)).await;
        assert_eq!(manager.state(), ConnectionState::Connecting);
        driver.emit(DriverEvent::Disconnected).await;
        settle().await;

        sleep(Duration::from_secs(3)).await;
        assert_eq!(manager.state(), ConnectionState::Connected);
        assert_eq!(driver.connect_attempts(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_reconnect_is_not_rescheduled() {
        let driver = Arc::new(MemoryDriver::new());
        let manager = manager(&driver);
        manager.connect().await.unwrap();

        driver.set_fail_connect(true);
        driver.emit(DriverEvent::Disconnected).await;
        settle().await;

        sleep(Duration::from_secs(6)).await;
        assert_eq!(driver.connect_attempts(), 2);
        assert_eq!(manager.state(), ConnectionState::Disconnected);

        sleep(Duration::from_secs(60)).await;
        assert_eq!(driver.connect_attempts(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_cancels_pending_reconnect() {
        let driver = Arc::new(MemoryDriver::new());
        let manager = manager(&driver);
        manager.connect().await.unwrap();

        driver.emit(DriverEvent::Disconnected).await;
        settle().await;
        manager.shutdown().await;

        sleep(Duration::from_secs(10)).await;
        assert_eq!(driver.connect_attempts(), 1);
        assert_eq!(manager.state(), ConnectionState::Disconnected);
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_during_fired_reconnect_ends_disconnected() {
        let driver = Arc::new(MemoryDriver::new());
        let manager = manager(&driver);
        manager.connect().await.unwrap();

        driver.set_connect_delay(Duration::from_secs(3));
        driver.emit(DriverEvent::Disconnected).await;
        settle().await;

        // Reconnect fires at ~5s and stays in flight until ~8s
        sleep(Duration::from_secs(6)).await;
        assert_eq!(manager.state(), ConnectionState::Connecting);

        manager.shutdown().await;
        assert_eq!(manager.state(), ConnectionState::Disconnected);
        assert!(manager.store().await.is_none());

        sleep(Duration::from_secs(5)).await;
        assert_eq!(manager.state(), ConnectionState::Disconnected);
        assert_eq!(driver.connect_attempts(), 2);
        assert!(manager.connect().await.is_err());
        assert_eq!(driver.connect_attempts(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_disconnect_event_while_disconnected_is_ignored() {
        let driver = Arc::new(MemoryDriver::new());
        let manager = manager(&driver);

        manager.event_sink().emit(DriverEvent::Disconnected);
        settle().await;

        sleep(Duration::from_secs(10)).await;
        assert_eq!(driver.connect_attempts(), 0);
    }

    #[tokio::test]
    async fn test_state_subscription_sees_transitions() {
        let driver = Arc::new(MemoryDriver::new());
        let manager = manager(&driver);
        let mut rx = manager.subscribe_state();

        manager.connect().await.unwrap();
        rx.changed().await.unwrap();
        assert_eq!(*rx.borrow_and_update(), ConnectionState::Connected);
    }
}
