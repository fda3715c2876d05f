//! Health and status HTTP endpoints for the MubAI bot.
//!
//! - `GET /` - service name, version and endpoint list
//! - `GET /health` - liveness, store connection state and uptime
//! - `GET /status` - bot status and the name of the open store
//!
//! The server only reads the [`ConnectionManager`] state; it never connects
//! or disconnects the store itself.

mod error;
pub mod routes;
mod state;

use std::net::SocketAddr;
use std::time::Instant;

use axum::Router;
use database::ConnectionManager;
use tracing::info;

pub use error::{Result, StatusError};
pub use state::AppState;

/// Build the application for the given store connection. `started` is the
/// process start that `/health` reports uptime from.
pub fn app(manager: ConnectionManager, started: Instant) -> Router {
    routes::router().with_state(AppState::new(manager, started))
}

/// Bind `addr` and serve until the process exits.
pub async fn serve(addr: SocketAddr, manager: ConnectionManager, started: Instant) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(addr = %addr, "Status server listening");
    info!("   Health check: http://localhost:{}/health", addr.port());
    info!("   Status: http://localhost:{}/status", addr.port());
    axum::serve(listener, app(manager, started)).await?;
    Ok(())
}
