//! HTTP error types for the `InvoiceFlow` server.
//!
//! Maps domain errors from `invoiceflow-core` into HTTP responses. Every
//! error produces a JSON body with a machine-readable `error` field and a
//! human-readable `message`; validation errors add a `fields` map.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use invoiceflow_core::error::{
    AssessmentError, AuthError, ListViewError, RouterError, SessionError,
};
use invoiceflow_core::validation::FieldErrors;

/// Application-level error returned from HTTP handlers.
#[derive(Debug)]
pub enum AppError {
    /// No valid session, or wrong credentials.
    Unauthorized(String),
    /// Requested resource not found.
    NotFound(String),
    /// Client sent invalid input.
    BadRequest(String),
    /// The request does not fit the current state (e.g. logout from home).
    Conflict(String),
    /// One or more form fields failed validation.
    Validation(FieldErrors),
    /// Internal server error.
    Internal(String),
}

/// JSON error response body.
#[derive(Serialize)]
struct ErrorBody {
    error: &'static str,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    fields: Option<FieldErrors>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_type, message, fields) = match self {
            Self::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "unauthorized", msg, None),
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg, None),
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg, None),
            Self::Conflict(msg) => (StatusCode::CONFLICT, "conflict", msg, None),
            Self::Validation(fields) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "validation_failed",
                fields.to_string(),
                Some(fields),
            ),
            Self::Internal(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal_error",
                msg,
                None,
            ),
        };

        let body = ErrorBody {
            error: error_type,
            message,
            fields,
        };

        (status, axum::Json(body)).into_response()
    }
}

impl From<RouterError> for AppError {
    fn from(err: RouterError) -> Self {
        match err {
            RouterError::InvalidTransition { .. } => Self::Conflict(err.to_string()),
        }
    }
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::Validation(fields) => Self::Validation(fields),
            AuthError::InvalidCredentials => Self::Unauthorized(err.to_string()),
        }
    }
}

impl From<AssessmentError> for AppError {
    fn from(err: AssessmentError) -> Self {
        match err {
            AssessmentError::Validation(fields) => Self::Validation(fields),
        }
    }
}

impl From<ListViewError> for AppError {
    fn from(err: ListViewError) -> Self {
        match err {
            ListViewError::UnknownInvoice { .. } => Self::NotFound(err.to_string()),
            ListViewError::UnsortableColumn { .. } | ListViewError::EmptySelection => {
                Self::BadRequest(err.to_string())
            }
            ListViewError::BulkAction(_) => Self::Conflict(err.to_string()),
        }
    }
}

impl From<SessionError> for AppError {
    fn from(err: SessionError) -> Self {
        Self::Internal(err.to_string())
    }
}
