//! Service description.

use std::collections::BTreeMap;

use axum::Json;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct Index {
    pub message: &'static str,
    pub version: &'static str,
    pub endpoints: BTreeMap<&'static str, &'static str>,
}

/// Root endpoint listing what the server offers.
pub async fn index() -> Json<Index> {
    Json(Index {
        message: "MubAI Bot API",
        version: env!("CARGO_PKG_VERSION"),
        endpoints: BTreeMap::from([("health", "/health"), ("status", "/status")]),
    })
}
