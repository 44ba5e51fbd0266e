//! Authentication routes: `/v1/auth/*`
//!
//! Login and signup run against the mock auth service while the tab lock is
//! released, so a tab can leave the login view mid-request. When that
//! happens the late result is dropped and reported as `stale`.

use std::sync::Arc;

use axum::extract::State;
use axum::routing::post;
use axum::{Extension, Json, Router};
use serde::Serialize;

use invoiceflow_core::auth::{LoginRequest, SignupRequest};
use invoiceflow_core::router::{LoginOutcome, LoginTicket, View};
use invoiceflow_core::user::User;

use crate::error::AppError;
use crate::middleware::TabContext;
use crate::routes::view::ViewResponse;
use crate::state::AppState;

/// Build the `/v1/auth` router.
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/login", post(login))
        .route("/signup", post(signup))
        .route("/logout", post(logout))
}

// ── Request / Response types ─────────────────────────────────────────

/// Response body for login and signup.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    /// `applied`, or `stale` if the tab left the login view meanwhile.
    pub outcome: &'static str,
    pub view: View,
    pub user: Option<User>,
}

// ── Handlers ─────────────────────────────────────────────────────────

async fn login(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<TabContext>,
    Json(body): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    let ticket = begin(&ctx).await?;
    let user = state.auth.login(&body).await?;
    Ok(Json(complete(&ctx, ticket, user).await))
}

async fn signup(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<TabContext>,
    Json(body): Json<SignupRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    let ticket = begin(&ctx).await?;
    let user = state.auth.signup(&body).await?;
    Ok(Json(complete(&ctx, ticket, user).await))
}

async fn logout(Extension(ctx): Extension<TabContext>) -> Result<Json<ViewResponse>, AppError> {
    let mut tab = ctx.slot.tab.lock().await;
    tab.logout().await?;
    Ok(Json(ViewResponse::of(&tab)))
}

// ── Helpers ──────────────────────────────────────────────────────────

async fn begin(ctx: &TabContext) -> Result<LoginTicket, AppError> {
    let tab = ctx.slot.tab.lock().await;
    Ok(tab.begin_login()?)
}

async fn complete(ctx: &TabContext, ticket: LoginTicket, user: User) -> AuthResponse {
    let mut tab = ctx.slot.tab.lock().await;
    let outcome = match tab.complete_login(ticket, user).await {
        LoginOutcome::Applied(_) => "applied",
        LoginOutcome::Stale => "stale",
    };
    AuthResponse {
        outcome,
        view: tab.view(),
        user: tab.user().cloned(),
    }
}
