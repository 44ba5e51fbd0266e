//! Top-level navigation routes: `/v1/view/*`
//!
//! Mirrors the buttons of the landing, login and assessment pages. An
//! action that is not defined for the current view answers 409 and leaves
//! the tab where it was.

use std::sync::Arc;

use axum::routing::{get, post};
use axum::{Extension, Json, Router};
use serde::Serialize;

use invoiceflow_core::router::View;
use invoiceflow_core::user::User;

use crate::error::AppError;
use crate::middleware::TabContext;
use crate::state::AppState;
use crate::tab::Tab;

/// Build the `/v1/view` router.
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(current_view))
        .route("/login", post(login_click))
        .route("/assessment", post(navigate_to_assessment))
        .route("/back", post(back))
}

// ── Request / Response types ─────────────────────────────────────────

/// The tab's current view and signed-in user.
#[derive(Debug, Serialize)]
pub struct ViewResponse {
    pub view: View,
    pub user: Option<User>,
}

impl ViewResponse {
    pub fn of(tab: &Tab) -> Self {
        Self {
            view: tab.view(),
            user: tab.user().cloned(),
        }
    }
}

// ── Handlers ─────────────────────────────────────────────────────────

async fn current_view(Extension(ctx): Extension<TabContext>) -> Json<ViewResponse> {
    let tab = ctx.slot.tab.lock().await;
    Json(ViewResponse::of(&tab))
}

async fn login_click(
    Extension(ctx): Extension<TabContext>,
) -> Result<Json<ViewResponse>, AppError> {
    let mut tab = ctx.slot.tab.lock().await;
    tab.login_click().await?;
    Ok(Json(ViewResponse::of(&tab)))
}

async fn navigate_to_assessment(
    Extension(ctx): Extension<TabContext>,
) -> Result<Json<ViewResponse>, AppError> {
    let mut tab = ctx.slot.tab.lock().await;
    tab.navigate_to_assessment().await?;
    Ok(Json(ViewResponse::of(&tab)))
}

async fn back(Extension(ctx): Extension<TabContext>) -> Result<Json<ViewResponse>, AppError> {
    let mut tab = ctx.slot.tab.lock().await;
    tab.back().await?;
    Ok(Json(ViewResponse::of(&tab)))
}
