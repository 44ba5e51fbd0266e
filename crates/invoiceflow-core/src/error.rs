//! Error types for `invoiceflow-core`.
//!
//! Each subsystem has its own enum. None of these are fatal: storage problems
//! degrade to "no session", validation problems block a single submission.

use invoiceflow_storage::StorageError;

use crate::router::View;
use crate::validation::FieldErrors;

/// Errors from the session store.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The underlying storage refused the operation.
    #[error("session storage error: {0}")]
    Storage(#[from] StorageError),

    /// The session record could not be encoded.
    #[error("session serialization failed: {reason}")]
    Serialization { reason: String },
}

/// Errors from the top-level view router.
#[derive(Debug, thiserror::Error)]
pub enum RouterError {
    /// The requested transition is not defined from the current view.
    #[error("cannot {action} from the {from} view")]
    InvalidTransition { from: View, action: &'static str },
}

/// Errors from the mock auth service.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// One or more form fields failed validation.
    #[error("validation failed: {0}")]
    Validation(FieldErrors),

    /// The email/password pair is not the demo credential.
    #[error("Invalid email or password. Use a@gmail.com / Asdf@1234")]
    InvalidCredentials,
}

/// Errors from the assessment booking service.
#[derive(Debug, thiserror::Error)]
pub enum AssessmentError {
    /// One or more form fields failed validation.
    #[error("validation failed: {0}")]
    Validation(FieldErrors),
}

/// Errors raised by a bulk action collaborator.
#[derive(Debug, thiserror::Error)]
pub enum BulkActionError {
    /// The collaborator refused the action.
    #[error("bulk {action} rejected: {reason}")]
    Rejected { action: String, reason: String },
}

/// Errors from the invoice list view.
#[derive(Debug, thiserror::Error)]
pub enum ListViewError {
    /// No invoice with this id exists in the collection.
    #[error("invoice not found: {id}")]
    UnknownInvoice { id: String },

    /// The column cannot be sorted.
    #[error("column '{column}' is not sortable")]
    UnsortableColumn { column: String },

    /// A bulk action was requested with nothing selected.
    #[error("no invoices selected")]
    EmptySelection,

    /// The bulk action collaborator failed.
    #[error("list view bulk action error: {0}")]
    BulkAction(#[from] BulkActionError),
}
