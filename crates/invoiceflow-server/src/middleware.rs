//! Tab resolution middleware for `InvoiceFlow`.
//!
//! Extracts the `x-tab-id` header, looks the tab up, and injects it into the
//! request extensions for downstream handlers.

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::Response;

use crate::error::AppError;
use crate::state::{AppState, TabSlot};

/// Header naming the tab a request belongs to.
pub const TAB_HEADER: &str = "x-tab-id";

/// Tab context injected into request extensions.
#[derive(Debug, Clone)]
pub struct TabContext {
    pub id: String,
    pub slot: TabSlot,
}

/// Middleware that resolves the `x-tab-id` header to an open tab.
///
/// # Errors
///
/// - [`AppError::BadRequest`] if the header is missing or not UTF-8.
/// - [`AppError::NotFound`] if no open tab has that id.
pub async fn tab_middleware(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let id = req
        .headers()
        .get(TAB_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned)
        .ok_or_else(|| AppError::BadRequest(format!("missing {TAB_HEADER} header")))?;

    let slot = state
        .tab(&id)
        .await
        .ok_or_else(|| AppError::NotFound(format!("no open tab with id {id}")))?;
    slot.touch();

    req.extensions_mut().insert(TabContext { id, slot });
    Ok(next.run(req).await)
}
