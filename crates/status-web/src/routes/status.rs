//! Bot status endpoint.

use axum::extract::State;
use axum::Json;
use chrono::{DateTime, Utc};
use database::ConnectionState;
use serde::Serialize;

use crate::state::AppState;

/// Reported when no store is open.
pub const NOT_CONNECTED: &str = "not connected";

#[derive(Debug, Serialize)]
pub struct Status {
    pub bot: &'static str,
    pub database: ConnectionState,
    /// Name of the open store.
    pub store: String,
    pub timestamp: DateTime<Utc>,
}

/// Bot status endpoint.
pub async fn status(State(state): State<AppState>) -> Json<Status> {
    let store = state
        .manager
        .store_name()
        .await
        .unwrap_or_else(|| NOT_CONNECTED.to_string());

    Json(Status {
        bot: "running",
        database: state.manager.state(),
        store,
        timestamp: Utc::now(),
    })
}
