//! Route handlers for the status server.

pub mod health;
pub mod index;
pub mod status;

use axum::routing::get;
use axum::Router;

use crate::state::AppState;

/// Build the router with all routes.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(index::index))
        .route("/health", get(health::health))
        .route("/status", get(status::status))
}
