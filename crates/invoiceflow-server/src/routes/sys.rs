//! System routes: `/v1/sys/*`

use std::sync::Arc;

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;

use crate::state::AppState;

/// Build the `/v1/sys` router.
pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/health", get(health))
}

// ── Request / Response types ─────────────────────────────────────────

/// Response body for `GET /v1/sys/health`.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    /// Number of open tabs.
    pub tabs: usize,
    pub version: &'static str,
}

// ── Handlers ─────────────────────────────────────────────────────────

async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        tabs: state.tab_count().await,
        version: env!("CARGO_PKG_VERSION"),
    })
}
