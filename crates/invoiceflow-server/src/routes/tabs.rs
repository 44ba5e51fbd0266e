//! Tab lifecycle routes: `/v1/tabs/*`
//!
//! Opening a tab gives the client a fresh session scope and a location of
//! its own. The tab id it gets back goes in the `x-tab-id` header of every
//! later request.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Extension, Json, Router};
use serde::Serialize;

use invoiceflow_core::router::View;
use invoiceflow_core::user::User;

use crate::error::AppError;
use crate::middleware::TabContext;
use crate::state::AppState;

/// Build the `/v1/tabs` router.
pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/", post(open_tab))
}

// ── Request / Response types ─────────────────────────────────────────

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenTabResponse {
    pub tab_id: String,
    /// The view the tab resolved to on startup.
    pub view: View,
    pub user: Option<User>,
}

// ── Handlers ─────────────────────────────────────────────────────────

async fn open_tab(State(state): State<Arc<AppState>>) -> (StatusCode, Json<OpenTabResponse>) {
    let (tab_id, slot) = state.open_tab().await;
    let tab = slot.tab.lock().await;
    let body = OpenTabResponse {
        tab_id,
        view: tab.view(),
        user: tab.user().cloned(),
    };
    (StatusCode::CREATED, Json(body))
}

/// Close the calling tab. Its session scope goes with it.
pub async fn close_current(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<TabContext>,
) -> Result<StatusCode, AppError> {
    if state.close_tab(&ctx.id).await {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound(format!("no open tab with id {}", ctx.id)))
    }
}
