//! Bulk actions over selected invoices.
//!
//! The list view only knows which ids are selected. What an action does to
//! them is up to a [`BulkActionHandler`].

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::BulkActionError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BulkAction {
    Approve,
    Export,
    Delete,
}

impl BulkAction {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Approve => "approve",
            Self::Export => "export",
            Self::Delete => "delete",
        }
    }
}

impl fmt::Display for BulkAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Carries out a bulk action.
#[async_trait::async_trait]
pub trait BulkActionHandler: Send + Sync + 'static {
    /// Apply `action` to `ids`.
    ///
    /// # Errors
    ///
    /// Returns [`BulkActionError::Rejected`] if the action cannot be applied.
    async fn apply(&self, ids: &[String], action: BulkAction) -> Result<(), BulkActionError>;
}

/// Records the request and changes nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogOnlyBulkActions;

#[async_trait::async_trait]
impl BulkActionHandler for LogOnlyBulkActions {
    async fn apply(&self, ids: &[String], action: BulkAction) -> Result<(), BulkActionError> {
        info!(%action, count = ids.len(), ids = ?ids, "bulk action requested");
        Ok(())
    }
}
