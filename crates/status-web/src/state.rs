//! Application state shared across handlers.

use std::time::{Duration, Instant};

use database::ConnectionManager;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Store connection whose state is reported.
    pub manager: ConnectionManager,
    /// Process start, for uptime.
    pub started: Instant,
}

impl AppState {
    /// Create new application state. Uptime is measured from `started`.
    pub fn new(manager: ConnectionManager, started: Instant) -> Self {
        Self { manager, started }
    }

    /// Time since the process started.
    pub fn uptime(&self) -> Duration {
        self.started.elapsed()
    }
}
