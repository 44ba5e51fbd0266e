//! HTTP-level tests for the `InvoiceFlow` API.
//!
//! Each test builds the full router over in-memory storage and drives it
//! with `oneshot` requests, the way a browser tab would.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode, header};
use serde_json::{Value, json};
use tower::ServiceExt;

use invoiceflow_server::config::ServerConfig;
use invoiceflow_server::routes::build_router;
use invoiceflow_server::state::AppState;
use invoiceflow_storage::MemoryBackend;

fn app() -> Router {
    let config = ServerConfig {
        auth_delay: Duration::ZERO,
        assessment_delay: Duration::ZERO,
        ..ServerConfig::default()
    };
    let state = AppState::new(Arc::new(MemoryBackend::new()), &config);
    build_router(Arc::new(state))
}

async fn raw(
    app: &Router,
    method: Method,
    uri: &str,
    tab: Option<&str>,
    body: Option<Value>,
) -> axum::response::Response {
    let mut req = Request::builder().method(method).uri(uri);
    if let Some(tab) = tab {
        req = req.header("x-tab-id", tab);
    }
    let req = match body {
        Some(body) => req
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => req.body(Body::empty()).unwrap(),
    };
    app.clone().oneshot(req).await.unwrap()
}

async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    tab: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let resp = raw(app, method, uri, tab, body).await;
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, value)
}

async fn open_tab(app: &Router) -> String {
    let (status, body) = send(app, Method::POST, "/v1/tabs", None, None).await;
    assert_eq!(status, StatusCode::CREATED);
    body["tabId"].as_str().expect("tab id").to_owned()
}

async fn sign_in(app: &Router, tab: &str) {
    let (status, _) = send(app, Method::POST, "/v1/view/login", Some(tab), None).await;
    assert_eq!(status, StatusCode::OK);
    let creds = json!({ "email": "a@gmail.com", "password": "Asdf@1234" });
    let (status, body) = send(app, Method::POST, "/v1/auth/login", Some(tab), Some(creds)).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["outcome"], "applied");
    assert_eq!(body["view"], "dashboard");
}

fn ids(list: &Value) -> Vec<&str> {
    list["rows"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["id"].as_str().unwrap())
        .collect()
}

// ── System & tabs ────────────────────────────────────────────────────

#[tokio::test]
async fn health_reports_open_tabs() {
    let app = app();
    open_tab(&app).await;
    let (status, body) = send(&app, Method::GET, "/v1/sys/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["tabs"], 1);
}

#[tokio::test]
async fn responses_carry_security_headers() {
    let app = app();
    let resp = raw(&app, Method::GET, "/v1/sys/health", None, None).await;
    let headers = resp.headers();
    assert_eq!(headers[header::X_CONTENT_TYPE_OPTIONS], "nosniff");
    assert_eq!(headers[header::X_FRAME_OPTIONS], "DENY");
    assert_eq!(headers[header::CACHE_CONTROL], "no-store");
}

#[tokio::test]
async fn new_tab_starts_home() {
    let app = app();
    let tab = open_tab(&app).await;
    let (status, body) = send(&app, Method::GET, "/v1/view", Some(&tab), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["view"], "home");
    assert!(body["user"].is_null());
}

#[tokio::test]
async fn tab_header_is_required_and_checked() {
    let app = app();
    let (status, body) = send(&app, Method::GET, "/v1/view", None, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "bad_request");

    let (status, _) = send(&app, Method::GET, "/v1/view", Some("nope"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn closed_tab_is_gone() {
    let app = app();
    let tab = open_tab(&app).await;
    let (status, _) = send(&app, Method::DELETE, "/v1/tabs/current", Some(&tab), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = send(&app, Method::GET, "/v1/view", Some(&tab), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

// ── Navigation & auth ────────────────────────────────────────────────

#[tokio::test]
async fn login_then_logout() {
    let app = app();
    let tab = open_tab(&app).await;
    sign_in(&app, &tab).await;

    let (_, body) = send(&app, Method::GET, "/v1/view", Some(&tab), None).await;
    assert_eq!(body["user"]["name"], "Demo User");

    let (status, body) = send(&app, Method::POST, "/v1/auth/logout", Some(&tab), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["view"], "home");
    assert!(body["user"].is_null());
}

#[tokio::test]
async fn wrong_password_stays_on_login() {
    let app = app();
    let tab = open_tab(&app).await;
    send(&app, Method::POST, "/v1/view/login", Some(&tab), None).await;

    let creds = json!({ "email": "a@gmail.com", "password": "wrong" });
    let (status, body) = send(&app, Method::POST, "/v1/auth/login", Some(&tab), Some(creds)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "unauthorized");

    let (_, body) = send(&app, Method::GET, "/v1/view", Some(&tab), None).await;
    assert_eq!(body["view"], "login");
}

#[tokio::test]
async fn malformed_login_reports_fields() {
    let app = app();
    let tab = open_tab(&app).await;
    send(&app, Method::POST, "/v1/view/login", Some(&tab), None).await;

    let creds = json!({ "email": "not-an-email", "password": "" });
    let (status, body) = send(&app, Method::POST, "/v1/auth/login", Some(&tab), Some(creds)).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "validation_failed");
    assert!(body["fields"]["email"].is_string());
    assert!(body["fields"]["password"].is_string());
}

#[tokio::test]
async fn signup_names_user_after_business() {
    let app = app();
    let tab = open_tab(&app).await;
    send(&app, Method::POST, "/v1/view/login", Some(&tab), None).await;

    let form = json!({
        "businessName": "Gulf Trading LLC",
        "email": "ops@gulftrading.ae",
        "password": "Str0ng!pass",
    });
    let (status, body) = send(&app, Method::POST, "/v1/auth/signup", Some(&tab), Some(form)).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["view"], "dashboard");
    assert_eq!(body["user"]["name"], "Gulf Trading LLC");
}

#[tokio::test]
async fn undefined_transition_is_a_conflict() {
    let app = app();
    let tab = open_tab(&app).await;
    let (status, body) = send(&app, Method::POST, "/v1/auth/logout", Some(&tab), None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "conflict");

    let (_, body) = send(&app, Method::GET, "/v1/view", Some(&tab), None).await;
    assert_eq!(body["view"], "home");
}

#[tokio::test]
async fn assessment_and_back() {
    let app = app();
    let tab = open_tab(&app).await;
    let (_, body) = send(&app, Method::POST, "/v1/view/assessment", Some(&tab), None).await;
    assert_eq!(body["view"], "assessment");
    let (_, body) = send(&app, Method::POST, "/v1/view/back", Some(&tab), None).await;
    assert_eq!(body["view"], "home");
}

#[tokio::test]
async fn other_tabs_do_not_inherit_the_session() {
    let app = app();
    let first = open_tab(&app).await;
    sign_in(&app, &first).await;

    let second = open_tab(&app).await;
    let (_, body) = send(&app, Method::GET, "/v1/view", Some(&second), None).await;
    assert_eq!(body["view"], "home");
}

// ── Dashboard shell ──────────────────────────────────────────────────

#[tokio::test]
async fn dashboard_requires_sign_in() {
    let app = app();
    let tab = open_tab(&app).await;
    let (status, _) = send(&app, Method::GET, "/v1/dashboard", Some(&tab), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let (status, _) = send(&app, Method::GET, "/v1/invoices", Some(&tab), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn navigation_follows_history() {
    let app = app();
    let tab = open_tab(&app).await;
    sign_in(&app, &tab).await;

    let (_, shell) = send(&app, Method::GET, "/v1/dashboard", Some(&tab), None).await;
    assert_eq!(shell["page"], "dashboard");
    assert_eq!(shell["menu"].as_array().unwrap().len(), 5);

    let (_, shell) = send(
        &app,
        Method::POST,
        "/v1/dashboard/navigate",
        Some(&tab),
        Some(json!({ "page": "invoices" })),
    )
    .await;
    assert_eq!(shell["page"], "invoices");
    assert_eq!(shell["hash"], "#invoices");

    let (_, shell) = send(&app, Method::POST, "/v1/dashboard/history/back", Some(&tab), None).await;
    assert_eq!(shell["page"], "dashboard");
    let (_, shell) =
        send(&app, Method::POST, "/v1/dashboard/history/forward", Some(&tab), None).await;
    assert_eq!(shell["page"], "invoices");
}

#[tokio::test]
async fn unknown_hash_falls_back_to_dashboard() {
    let app = app();
    let tab = open_tab(&app).await;
    sign_in(&app, &tab).await;

    let (_, shell) = send(
        &app,
        Method::POST,
        "/v1/dashboard/hash",
        Some(&tab),
        Some(json!({ "hash": "reports" })),
    )
    .await;
    assert_eq!(shell["page"], "reports");

    let (_, shell) = send(
        &app,
        Method::POST,
        "/v1/dashboard/hash",
        Some(&tab),
        Some(json!({ "hash": "#nowhere" })),
    )
    .await;
    assert_eq!(shell["page"], "dashboard");
}

#[tokio::test]
async fn shortcuts_drive_palette_and_chords() {
    let app = app();
    let tab = open_tab(&app).await;
    sign_in(&app, &tab).await;
    let key = |k: Value| send(&app, Method::POST, "/v1/dashboard/keys", Some(&tab), Some(k));

    let (_, body) = key(json!({ "key": "k", "ctrl": true })).await;
    assert_eq!(body["action"], "toggle-palette");
    assert_eq!(body["shell"]["paletteOpen"], true);

    let (_, body) = key(json!({ "key": "Escape" })).await;
    assert_eq!(body["action"], "close-palette");
    assert_eq!(body["shell"]["paletteOpen"], false);

    let (_, body) = key(json!({ "key": "g" })).await;
    assert_eq!(body["action"], "chord-started");
    let (_, body) = key(json!({ "key": "r" })).await;
    assert_eq!(body["action"], "navigate");
    assert_eq!(body["page"], "reports");
    assert_eq!(body["shell"]["page"], "reports");
}

#[tokio::test]
async fn slash_requests_search_focus_once() {
    let app = app();
    let tab = open_tab(&app).await;
    sign_in(&app, &tab).await;

    send(
        &app,
        Method::POST,
        "/v1/dashboard/keys",
        Some(&tab),
        Some(json!({ "key": "/" })),
    )
    .await;
    let (_, list) = send(&app, Method::GET, "/v1/invoices", Some(&tab), None).await;
    assert_eq!(list["focusSearch"], true);
    let (_, list) = send(&app, Method::GET, "/v1/invoices", Some(&tab), None).await;
    assert_eq!(list["focusSearch"], false);
}

#[tokio::test]
async fn palette_filters_and_chooses() {
    let app = app();
    let tab = open_tab(&app).await;
    sign_in(&app, &tab).await;

    let (_, body) = send(&app, Method::GET, "/v1/dashboard/palette?q=rep", Some(&tab), None).await;
    let entries = body["entries"].as_array().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["id"], "reports");

    let (_, shell) = send(
        &app,
        Method::POST,
        "/v1/dashboard/palette",
        Some(&tab),
        Some(json!({ "page": "settings" })),
    )
    .await;
    assert_eq!(shell["page"], "settings");
    assert_eq!(shell["paletteOpen"], false);
}

#[tokio::test]
async fn sidebar_preference_outlives_the_tab() {
    let app = app();
    let first = open_tab(&app).await;
    sign_in(&app, &first).await;
    let (_, shell) = send(
        &app,
        Method::PUT,
        "/v1/dashboard/sidebar",
        Some(&first),
        Some(json!({ "collapsed": true })),
    )
    .await;
    assert_eq!(shell["sidebarCollapsed"], true);

    let second = open_tab(&app).await;
    sign_in(&app, &second).await;
    let (_, shell) = send(&app, Method::GET, "/v1/dashboard", Some(&second), None).await;
    assert_eq!(shell["sidebarCollapsed"], true);
}

// ── Invoice list ─────────────────────────────────────────────────────

#[tokio::test]
async fn list_defaults_to_newest_first() {
    let app = app();
    let tab = open_tab(&app).await;
    sign_in(&app, &tab).await;

    let (status, list) = send(&app, Method::GET, "/v1/invoices", Some(&tab), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list["total"], 8);
    assert_eq!(ids(&list), ["1", "2", "3", "4", "5", "6", "7", "8"]);
    assert_eq!(list["query"]["sortBy"], "invoiceDate");
    assert_eq!(list["query"]["sortDir"], "desc");
    assert_eq!(list["viewMode"], "table");
}

#[tokio::test]
async fn search_and_status_filter() {
    let app = app();
    let tab = open_tab(&app).await;
    sign_in(&app, &tab).await;

    let (_, list) = send(
        &app,
        Method::PUT,
        "/v1/invoices/query",
        Some(&tab),
        Some(json!({ "search": "layla" })),
    )
    .await;
    assert_eq!(ids(&list), ["4"]);

    let (_, list) = send(
        &app,
        Method::PUT,
        "/v1/invoices/query",
        Some(&tab),
        Some(json!({ "search": "", "status": "pending", "viewMode": "kanban" })),
    )
    .await;
    assert_eq!(ids(&list), ["3", "7"]);
    assert_eq!(list["viewMode"], "kanban");

    let (status, _) = send(
        &app,
        Method::PUT,
        "/v1/invoices/query",
        Some(&tab),
        Some(json!({ "status": "archived" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn sorting_toggles_direction() {
    let app = app();
    let tab = open_tab(&app).await;
    sign_in(&app, &tab).await;
    let sort = |c: &'static str| {
        send(
            &app,
            Method::POST,
            "/v1/invoices/sort",
            Some(&tab),
            Some(json!({ "column": c })),
        )
    };

    let (_, body) = sort("client").await;
    assert_eq!(body["direction"], "asc");
    let (_, list) = send(&app, Method::GET, "/v1/invoices", Some(&tab), None).await;
    assert_eq!(ids(&list)[0], "7");

    let (_, body) = sort("client").await;
    assert_eq!(body["direction"], "desc");

    let (status, _) = sort("actions").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn selection_and_bulk_actions() {
    let app = app();
    let tab = open_tab(&app).await;
    sign_in(&app, &tab).await;

    let (status, _) = send(
        &app,
        Method::POST,
        "/v1/invoices/bulk",
        Some(&tab),
        Some(json!({ "action": "approve" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, body) = send(&app, Method::POST, "/v1/invoices/2/select", Some(&tab), None).await;
    assert_eq!(body["on"], true);
    send(&app, Method::POST, "/v1/invoices/5/select", Some(&tab), None).await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/v1/invoices/bulk",
        Some(&tab),
        Some(json!({ "action": "approve" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ids"], json!(["2", "5"]));

    let (_, list) = send(&app, Method::GET, "/v1/invoices", Some(&tab), None).await;
    assert_eq!(list["selected"], json!([]));

    let (status, _) = send(&app, Method::POST, "/v1/invoices/99/select", Some(&tab), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn select_all_toggles() {
    let app = app();
    let tab = open_tab(&app).await;
    sign_in(&app, &tab).await;

    let (_, body) = send(&app, Method::POST, "/v1/invoices/select-all", Some(&tab), None).await;
    assert_eq!(body["selected"], 8);
    let (_, body) = send(&app, Method::POST, "/v1/invoices/select-all", Some(&tab), None).await;
    assert_eq!(body["selected"], 0);
}

#[tokio::test]
async fn expand_toggles_row_details() {
    let app = app();
    let tab = open_tab(&app).await;
    sign_in(&app, &tab).await;

    let (_, body) = send(&app, Method::POST, "/v1/invoices/3/expand", Some(&tab), None).await;
    assert_eq!(body["on"], true);
    let (_, list) = send(&app, Method::GET, "/v1/invoices", Some(&tab), None).await;
    assert_eq!(list["expanded"], json!(["3"]));
    let (_, body) = send(&app, Method::POST, "/v1/invoices/3/expand", Some(&tab), None).await;
    assert_eq!(body["on"], false);
}

#[tokio::test]
async fn export_is_csv_attachment() {
    let app = app();
    let tab = open_tab(&app).await;
    sign_in(&app, &tab).await;
    send(
        &app,
        Method::PUT,
        "/v1/invoices/query",
        Some(&tab),
        Some(json!({ "status": "rejected" })),
    )
    .await;

    let resp = raw(&app, Method::GET, "/v1/invoices/export", Some(&tab), None).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let content_type = resp.headers()[header::CONTENT_TYPE].to_str().unwrap().to_owned();
    assert!(content_type.starts_with("text/csv"));
    let disposition = resp.headers()[header::CONTENT_DISPOSITION]
        .to_str()
        .unwrap()
        .to_owned();
    assert!(disposition.contains("filename=\"invoices-"));

    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap();
    let csv = String::from_utf8(bytes.to_vec()).unwrap();
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].starts_with("Invoice #,Client,Amount"));
    assert!(lines[1].contains("\"Emaar Properties\""));
}

#[tokio::test]
async fn stats_kanban_and_window() {
    let app = app();
    let tab = open_tab(&app).await;
    sign_in(&app, &tab).await;

    let (_, stats) = send(&app, Method::GET, "/v1/invoices/stats", Some(&tab), None).await;
    assert_eq!(stats["totalInvoices"], 8);

    let (_, board) = send(&app, Method::GET, "/v1/invoices/kanban", Some(&tab), None).await;
    let columns = board["columns"].as_array().unwrap();
    assert_eq!(columns.len(), 4);
    let cards: usize = columns
        .iter()
        .map(|c| c["invoices"].as_array().unwrap().len())
        .sum();
    assert_eq!(cards, 8);

    let (_, window) = send(
        &app,
        Method::GET,
        "/v1/invoices/window?scrollTop=0&containerHeight=200&itemHeight=100",
        Some(&tab),
        None,
    )
    .await;
    assert_eq!(window["start"], 0);
    assert_eq!(window["end"], 3);
    assert_eq!(window["totalHeight"], 800);

    let (status, _) = send(
        &app,
        Method::GET,
        "/v1/invoices/window?containerHeight=200&itemHeight=0",
        Some(&tab),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn list_state_resets_after_sign_out() {
    let app = app();
    let tab = open_tab(&app).await;
    sign_in(&app, &tab).await;
    send(
        &app,
        Method::PUT,
        "/v1/invoices/query",
        Some(&tab),
        Some(json!({ "search": "adnoc" })),
    )
    .await;
    send(&app, Method::POST, "/v1/auth/logout", Some(&tab), None).await;
    sign_in(&app, &tab).await;

    let (_, list) = send(&app, Method::GET, "/v1/invoices", Some(&tab), None).await;
    assert_eq!(list["query"]["search"], "");
    assert_eq!(list["rows"].as_array().unwrap().len(), 8);
}

// ── Assessment ───────────────────────────────────────────────────────

#[tokio::test]
async fn assessment_booking() {
    let app = app();
    let form = json!({
        "fullName": "Layla Ahmed",
        "email": "layla@emaar.ae",
        "phone": "+971 50 123 4567",
        "companyName": "Emaar Properties",
        "currentERP": "sap",
        "invoicesPerMonth": "100-500",
    });
    let (status, body) = send(&app, Method::POST, "/v1/assessment", None, Some(form)).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["firstName"], "Layla");
    assert_eq!(body["nextSteps"].as_array().unwrap().len(), 4);

    let (status, body) = send(&app, Method::POST, "/v1/assessment", None, Some(json!({}))).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["fields"]["email"], "Email is required");
}

#[tokio::test]
async fn assessment_deadline() {
    let app = app();
    let (status, body) = send(&app, Method::GET, "/v1/assessment/deadline", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["deadline"].as_str().unwrap().starts_with("2026-06-01"));
    assert!(body["daysRemaining"].is_i64());
}
