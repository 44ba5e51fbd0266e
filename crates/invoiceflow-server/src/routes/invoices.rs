//! Invoice list routes: `/v1/invoices/*`
//!
//! Search, filter, sort, selection, bulk actions and the derived views over
//! the mounted list. State lives in the tab and resets whenever the
//! dashboard is mounted again.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::header;
use axum::response::IntoResponse;
use axum::routing::{get, post, put};
use axum::{Extension, Json, Router};
use serde::{Deserialize, Serialize};

use invoiceflow_core::bulk::BulkAction;
use invoiceflow_core::export::export_filename;
use invoiceflow_core::list_view::{
    Column, InvoiceStats, KanbanColumn, ListSnapshot, SortDir, StatusFilter, ViewMode,
    VisibleWindow,
};

use crate::error::AppError;
use crate::middleware::TabContext;
use crate::state::AppState;

/// Build the `/v1/invoices` router.
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list))
        .route("/query", put(update_query))
        .route("/sort", post(sort))
        .route("/select-all", post(select_all))
        .route("/bulk", post(bulk))
        .route("/export", get(export))
        .route("/stats", get(stats))
        .route("/kanban", get(kanban))
        .route("/window", get(window))
        .route("/{id}/select", post(toggle_select))
        .route("/{id}/expand", post(toggle_expand))
}

// ── Request / Response types ─────────────────────────────────────────

/// The list snapshot, plus whether search focus was requested since the
/// last read.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListResponse {
    #[serde(flatten)]
    pub list: ListSnapshot,
    pub focus_search: bool,
}

/// Partial update of the query; absent fields are left alone.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryUpdate {
    pub search: Option<String>,
    pub status: Option<StatusFilter>,
    pub view_mode: Option<ViewMode>,
}

#[derive(Debug, Deserialize)]
pub struct SortRequest {
    pub column: Column,
}

#[derive(Debug, Serialize)]
pub struct SortResponse {
    pub column: Column,
    pub direction: SortDir,
}

#[derive(Debug, Serialize)]
pub struct ToggleResponse {
    pub id: String,
    /// Whether the row is now in the set.
    pub on: bool,
}

#[derive(Debug, Serialize)]
pub struct SelectAllResponse {
    pub selected: usize,
}

#[derive(Debug, Deserialize)]
pub struct BulkRequest {
    pub action: BulkAction,
}

#[derive(Debug, Serialize)]
pub struct BulkResponse {
    pub action: BulkAction,
    pub ids: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct KanbanResponse<'a> {
    pub columns: Vec<KanbanColumn<'a>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WindowQuery {
    #[serde(default)]
    pub scroll_top: usize,
    pub container_height: usize,
    pub item_height: usize,
}

// ── Handlers ─────────────────────────────────────────────────────────

async fn list(Extension(ctx): Extension<TabContext>) -> Result<Json<ListResponse>, AppError> {
    let mut tab = ctx.slot.tab.lock().await;
    let list = &mut tab.dashboard()?.list;
    let focus_search = list.take_focus_request();
    Ok(Json(ListResponse {
        list: list.snapshot(),
        focus_search,
    }))
}

async fn update_query(
    Extension(ctx): Extension<TabContext>,
    Json(body): Json<QueryUpdate>,
) -> Result<Json<ListResponse>, AppError> {
    let mut tab = ctx.slot.tab.lock().await;
    let list = &mut tab.dashboard()?.list;
    if let Some(search) = body.search {
        list.set_search(&search);
    }
    if let Some(status) = body.status {
        list.set_status_filter(status);
    }
    if let Some(mode) = body.view_mode {
        list.set_view_mode(mode);
    }
    let focus_search = list.take_focus_request();
    Ok(Json(ListResponse {
        list: list.snapshot(),
        focus_search,
    }))
}

async fn sort(
    Extension(ctx): Extension<TabContext>,
    Json(body): Json<SortRequest>,
) -> Result<Json<SortResponse>, AppError> {
    let mut tab = ctx.slot.tab.lock().await;
    let direction = tab.dashboard()?.list.sort_by(body.column)?;
    Ok(Json(SortResponse {
        column: body.column,
        direction,
    }))
}

async fn toggle_select(
    Extension(ctx): Extension<TabContext>,
    Path(id): Path<String>,
) -> Result<Json<ToggleResponse>, AppError> {
    let mut tab = ctx.slot.tab.lock().await;
    let on = tab.dashboard()?.list.toggle_one(&id)?;
    Ok(Json(ToggleResponse { id, on }))
}

async fn toggle_expand(
    Extension(ctx): Extension<TabContext>,
    Path(id): Path<String>,
) -> Result<Json<ToggleResponse>, AppError> {
    let mut tab = ctx.slot.tab.lock().await;
    let on = tab.dashboard()?.list.toggle_expand(&id)?;
    Ok(Json(ToggleResponse { id, on }))
}

async fn select_all(
    Extension(ctx): Extension<TabContext>,
) -> Result<Json<SelectAllResponse>, AppError> {
    let mut tab = ctx.slot.tab.lock().await;
    let selected = tab.dashboard()?.list.toggle_all();
    Ok(Json(SelectAllResponse { selected }))
}

async fn bulk(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<TabContext>,
    Json(body): Json<BulkRequest>,
) -> Result<Json<BulkResponse>, AppError> {
    let mut tab = ctx.slot.tab.lock().await;
    let ids = tab
        .dashboard()?
        .list
        .apply_bulk(body.action, state.bulk.as_ref())
        .await?;
    Ok(Json(BulkResponse {
        action: body.action,
        ids,
    }))
}

async fn export(Extension(ctx): Extension<TabContext>) -> Result<impl IntoResponse, AppError> {
    let mut tab = ctx.slot.tab.lock().await;
    let csv = tab.dashboard()?.list.export_csv();
    let filename = export_filename(chrono::Utc::now().date_naive());
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_owned()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        csv,
    ))
}

async fn stats(Extension(ctx): Extension<TabContext>) -> Result<Json<InvoiceStats>, AppError> {
    let mut tab = ctx.slot.tab.lock().await;
    Ok(Json(tab.dashboard()?.list.stats()))
}

async fn kanban(Extension(ctx): Extension<TabContext>) -> Result<impl IntoResponse, AppError> {
    let mut tab = ctx.slot.tab.lock().await;
    let columns = tab.dashboard()?.list.kanban();
    // Serialize while the columns still borrow the list.
    let body = serde_json::to_value(KanbanResponse { columns })
        .map_err(|e| AppError::Internal(format!("kanban serialization failed: {e}")))?;
    Ok(Json(body))
}

async fn window(
    Extension(ctx): Extension<TabContext>,
    Query(query): Query<WindowQuery>,
) -> Result<Json<VisibleWindow>, AppError> {
    if query.item_height == 0 {
        return Err(AppError::BadRequest("itemHeight must be positive".to_owned()));
    }
    let mut tab = ctx.slot.tab.lock().await;
    let window = tab.dashboard()?.list.visible_window(
        query.scroll_top,
        query.container_height,
        query.item_height,
    );
    Ok(Json(window))
}
