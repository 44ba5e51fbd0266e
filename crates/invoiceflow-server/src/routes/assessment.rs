//! Compliance assessment routes: `/v1/assessment/*`
//!
//! Booking does not depend on a tab or a signed-in user.

use std::sync::Arc;

use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::Serialize;

use invoiceflow_core::assessment::{
    AssessmentConfirmation, AssessmentRequest, compliance_deadline, days_until_deadline,
};

use crate::error::AppError;
use crate::state::AppState;

/// Build the `/v1/assessment` router.
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", post(book))
        .route("/deadline", get(deadline))
}

// ── Request / Response types ─────────────────────────────────────────

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeadlineResponse {
    pub deadline: DateTime<Utc>,
    /// Whole days left, rounded up. Negative once the deadline has passed.
    pub days_remaining: i64,
}

// ── Handlers ─────────────────────────────────────────────────────────

async fn book(
    State(state): State<Arc<AppState>>,
    Json(body): Json<AssessmentRequest>,
) -> Result<Json<AssessmentConfirmation>, AppError> {
    let confirmation = state.assessment.book(&body).await?;
    Ok(Json(confirmation))
}

async fn deadline() -> Json<DeadlineResponse> {
    Json(DeadlineResponse {
        deadline: compliance_deadline(),
        days_remaining: days_until_deadline(Utc::now()),
    })
}
