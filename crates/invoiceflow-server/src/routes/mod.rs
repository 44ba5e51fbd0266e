//! HTTP route handlers for `InvoiceFlow`.
//!
//! Routes are organized by subsystem:
//! - `sys`: Health
//! - `tabs`: Opening and closing tabs
//! - `view`: Top-level navigation (home, login, dashboard, assessment)
//! - `auth`: Login, signup, logout
//! - `dashboard`: Shell state, hash routing, shortcuts, palette, sidebar
//! - `invoices`: The invoice list view
//! - `assessment`: Compliance assessment booking

pub mod assessment;
pub mod auth;
pub mod dashboard;
pub mod invoices;
pub mod sys;
pub mod tabs;
pub mod view;

use std::sync::Arc;

use axum::Router;
use axum::http::HeaderValue;
use axum::middleware as axum_mw;
use axum::routing::delete;
use tower_http::cors::{Any, CorsLayer};
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;

use crate::middleware::{TAB_HEADER, tab_middleware};
use crate::state::AppState;

/// Assemble the full application router.
pub fn build_router(state: Arc<AppState>) -> Router {
    // Everything scoped to a tab goes through the tab middleware.
    let tab_routes = Router::new()
        .route("/v1/tabs/current", delete(tabs::close_current))
        .nest("/v1/view", view::router())
        .nest("/v1/auth", auth::router())
        .nest("/v1/dashboard", dashboard::router())
        .nest("/v1/invoices", invoices::router())
        .route_layer(axum_mw::from_fn_with_state(
            Arc::clone(&state),
            tab_middleware,
        ));

    let sys_routes = Router::new()
        .nest("/v1/sys", sys::router())
        .layer(tower::limit::ConcurrencyLimitLayer::new(10));

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            axum::http::Method::GET,
            axum::http::Method::POST,
            axum::http::Method::PUT,
            axum::http::Method::DELETE,
        ])
        .allow_headers([
            axum::http::header::CONTENT_TYPE,
            axum::http::HeaderName::from_static(TAB_HEADER),
        ]);

    Router::new()
        .merge(sys_routes)
        .nest("/v1/tabs", tabs::router())
        .nest("/v1/assessment", assessment::router())
        .merge(tab_routes)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(SetResponseHeaderLayer::overriding(
            axum::http::header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            axum::http::header::X_FRAME_OPTIONS,
            HeaderValue::from_static("DENY"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            axum::http::header::CACHE_CONTROL,
            HeaderValue::from_static("no-store"),
        ))
        .with_state(state)
}
