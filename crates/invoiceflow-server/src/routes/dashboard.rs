//! Dashboard shell routes: `/v1/dashboard/*`
//!
//! Page selection through the URL fragment, keyboard shortcuts, the command
//! palette and the sidebar preference. Every route answers 401 unless the
//! tab is on the dashboard.

use std::sync::Arc;

use axum::extract::Query;
use axum::routing::{get, post, put};
use axum::{Extension, Json, Router};
use serde::{Deserialize, Serialize};

use invoiceflow_core::dashboard::{MenuItem, ShellSnapshot};
use invoiceflow_core::hash_route::{Location, PageId};
use invoiceflow_core::shortcuts::{KeyPress, ShortcutAction};

use crate::error::AppError;
use crate::middleware::TabContext;
use crate::state::AppState;
use crate::tab::Tab;

/// Build the `/v1/dashboard` router.
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(shell))
        .route("/navigate", post(navigate))
        .route("/hash", post(set_hash))
        .route("/history/back", post(history_back))
        .route("/history/forward", post(history_forward))
        .route("/keys", post(key_press))
        .route("/palette", get(palette_entries).post(choose_palette_entry))
        .route("/sidebar", put(set_sidebar))
}

// ── Request / Response types ─────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct NavigateRequest {
    pub page: PageId,
}

/// A fragment typed into the address bar, with or without the `#`.
#[derive(Debug, Deserialize)]
pub struct HashRequest {
    pub hash: String,
}

#[derive(Debug, Deserialize)]
pub struct PaletteQuery {
    #[serde(default)]
    pub q: String,
}

#[derive(Debug, Serialize)]
pub struct PaletteResponse {
    pub entries: Vec<MenuItem>,
}

#[derive(Debug, Deserialize)]
pub struct SidebarRequest {
    pub collapsed: bool,
}

/// What a key press did, and the shell afterwards.
#[derive(Debug, Serialize)]
pub struct KeyResponse {
    #[serde(flatten)]
    pub action: ShortcutAction,
    pub shell: ShellSnapshot,
}

// ── Handlers ─────────────────────────────────────────────────────────

async fn shell(Extension(ctx): Extension<TabContext>) -> Result<Json<ShellSnapshot>, AppError> {
    let mut tab = ctx.slot.tab.lock().await;
    Ok(Json(tab.dashboard()?.shell.snapshot()))
}

async fn navigate(
    Extension(ctx): Extension<TabContext>,
    Json(body): Json<NavigateRequest>,
) -> Result<Json<ShellSnapshot>, AppError> {
    let mut tab = ctx.slot.tab.lock().await;
    let shell = &mut tab.dashboard()?.shell;
    shell.navigate(body.page);
    Ok(Json(shell.snapshot()))
}

async fn set_hash(
    Extension(ctx): Extension<TabContext>,
    Json(body): Json<HashRequest>,
) -> Result<Json<ShellSnapshot>, AppError> {
    let mut tab = ctx.slot.tab.lock().await;
    tab.dashboard()?;

    let hash = if body.hash.is_empty() || body.hash.starts_with('#') {
        body.hash
    } else {
        format!("#{}", body.hash)
    };
    tab.location().set_hash(&hash);

    let shell = &mut tab.dashboard()?.shell;
    shell.handle_hash_change();
    Ok(Json(shell.snapshot()))
}

async fn history_back(
    Extension(ctx): Extension<TabContext>,
) -> Result<Json<ShellSnapshot>, AppError> {
    traverse(&ctx, |tab| tab.location().back()).await
}

async fn history_forward(
    Extension(ctx): Extension<TabContext>,
) -> Result<Json<ShellSnapshot>, AppError> {
    traverse(&ctx, |tab| tab.location().forward()).await
}

async fn key_press(
    Extension(ctx): Extension<TabContext>,
    Json(key): Json<KeyPress>,
) -> Result<Json<KeyResponse>, AppError> {
    let mut tab = ctx.slot.tab.lock().await;
    let shell = &mut tab.dashboard()?.shell;
    let action = shell.handle_key(&key);
    Ok(Json(KeyResponse {
        action,
        shell: shell.snapshot(),
    }))
}

async fn palette_entries(
    Extension(ctx): Extension<TabContext>,
    Query(query): Query<PaletteQuery>,
) -> Result<Json<PaletteResponse>, AppError> {
    let mut tab = ctx.slot.tab.lock().await;
    let entries = tab.dashboard()?.shell.palette_entries(&query.q);
    Ok(Json(PaletteResponse { entries }))
}

async fn choose_palette_entry(
    Extension(ctx): Extension<TabContext>,
    Json(body): Json<NavigateRequest>,
) -> Result<Json<ShellSnapshot>, AppError> {
    let mut tab = ctx.slot.tab.lock().await;
    let shell = &mut tab.dashboard()?.shell;
    shell.choose_palette_entry(body.page);
    Ok(Json(shell.snapshot()))
}

async fn set_sidebar(
    Extension(ctx): Extension<TabContext>,
    Json(body): Json<SidebarRequest>,
) -> Result<Json<ShellSnapshot>, AppError> {
    let mut tab = ctx.slot.tab.lock().await;
    let shell = &mut tab.dashboard()?.shell;
    shell.set_sidebar_collapsed(body.collapsed).await;
    Ok(Json(shell.snapshot()))
}

// ── Helpers ──────────────────────────────────────────────────────────

/// Move through the tab's history, then let the shell follow.
async fn traverse(
    ctx: &TabContext,
    step: impl FnOnce(&Tab) -> bool,
) -> Result<Json<ShellSnapshot>, AppError> {
    let mut tab = ctx.slot.tab.lock().await;
    tab.dashboard()?;
    step(&*tab);
    let shell = &mut tab.dashboard()?.shell;
    shell.handle_hash_change();
    Ok(Json(shell.snapshot()))
}
