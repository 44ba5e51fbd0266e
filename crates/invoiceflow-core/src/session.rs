//! Session store over two Web Storage scopes.
//!
//! A signed-in session leaves two traces:
//!
//! - `invoiceflow_auth = "true"` in the **persistent** scope (shared by every
//!   tab, the `localStorage` analogue);
//! - `invoiceflow_session = {"user": .., "timestamp": <epoch ms>}` in the
//!   **tab** scope (the `sessionStorage` analogue).
//!
//! Which trace gates access depends on the [`ExpiryPolicy`]. Reads never fail:
//! a missing store, a storage error or corrupt JSON all mean "no session".

use std::sync::Arc;

use chrono::Duration;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use invoiceflow_storage::StorageBackend;

use crate::clock::{Clock, SystemClock};
use crate::error::SessionError;
use crate::user::User;

/// Persistent-scope key holding the literal `"true"` while signed in.
pub const AUTH_KEY: &str = "invoiceflow_auth";

/// Tab-scope key holding the JSON session record.
pub const SESSION_KEY: &str = "invoiceflow_session";

/// How long a saved session stays valid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpiryPolicy {
    /// The tab-scoped record is valid while `now - timestamp` is below the
    /// window. The timestamp is fixed at save time; reads do not extend it.
    Window(Duration),
    /// The persistent flag alone grants access until an explicit logout.
    Never,
}

impl Default for ExpiryPolicy {
    fn default() -> Self {
        Self::Window(Duration::hours(24))
    }
}

/// The record written to the tab scope on login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub user: User,
    /// Save time in milliseconds since the Unix epoch.
    pub timestamp: i64,
}

/// Either the full record or a bare user, as older writers stored it.
#[derive(Deserialize)]
#[serde(untagged)]
enum StoredSession {
    Record(SessionRecord),
    Bare(User),
}

/// Reads and writes the session traces.
#[derive(Clone)]
pub struct SessionStore {
    persistent: Arc<dyn StorageBackend>,
    tab: Arc<dyn StorageBackend>,
    policy: ExpiryPolicy,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStore")
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

impl SessionStore {
    /// Session store with the default 24-hour window and the system clock.
    #[must_use]
    pub fn new(persistent: Arc<dyn StorageBackend>, tab: Arc<dyn StorageBackend>) -> Self {
        Self {
            persistent,
            tab,
            policy: ExpiryPolicy::default(),
            clock: Arc::new(SystemClock),
        }
    }

    #[must_use]
    pub fn with_policy(mut self, policy: ExpiryPolicy) -> Self {
        self.policy = policy;
        self
    }

    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn policy(&self) -> ExpiryPolicy {
        self.policy
    }

    /// The persistent scope, shared with other consumers such as UI
    /// preferences.
    pub fn persistent(&self) -> &Arc<dyn StorageBackend> {
        &self.persistent
    }

    /// Whether a valid session exists. Fails open to `false`.
    pub async fn is_authenticated(&self) -> bool {
        match self.policy {
            ExpiryPolicy::Never => match self.persistent.get(AUTH_KEY).await {
                Ok(flag) => flag.as_deref() == Some("true"),
                Err(e) => {
                    warn!(error = %e, "auth flag unreadable, treating as signed out");
                    false
                }
            },
            ExpiryPolicy::Window(window) => {
                let Some(StoredSession::Record(record)) = self.read_stored().await else {
                    return false;
                };
                let age_ms = self
                    .clock
                    .now()
                    .timestamp_millis()
                    .saturating_sub(record.timestamp);
                age_ms < window.num_milliseconds()
            }
        }
    }

    /// Write `{user, timestamp: now}` to the tab scope, then raise the
    /// persistent flag.
    ///
    /// The record is written with a single `set`, so a reader sees either
    /// the previous record or the new one.
    ///
    /// # Errors
    ///
    /// - [`SessionError::Serialization`] if the record cannot be encoded.
    /// - [`SessionError::Storage`] if either scope refuses the write. A
    ///   record already written to the tab scope is removed again.
    pub async fn save_session(&self, user: &User) -> Result<(), SessionError> {
        let record = SessionRecord {
            user: user.clone(),
            timestamp: self.clock.now().timestamp_millis(),
        };
        let encoded = serde_json::to_string(&record).map_err(|e| SessionError::Serialization {
            reason: e.to_string(),
        })?;

        self.tab.set(SESSION_KEY, &encoded).await?;
        if let Err(e) = self.persistent.set(AUTH_KEY, "true").await {
            if let Err(undo) = self.tab.remove(SESSION_KEY).await {
                warn!(error = %undo, "failed to roll back session record");
            }
            return Err(e.into());
        }

        info!(email = %user.email, "session saved");
        Ok(())
    }

    /// Remove both traces. Removing what is already gone succeeds.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Storage`] if a scope fails to remove a key.
    pub async fn clear_session(&self) -> Result<(), SessionError> {
        self.tab.remove(SESSION_KEY).await?;
        self.persistent.remove(AUTH_KEY).await?;
        info!("session cleared");
        Ok(())
    }

    /// The stored user, or `None` when absent or corrupt.
    pub async fn get_user(&self) -> Option<User> {
        match self.read_stored().await? {
            StoredSession::Record(record) => Some(record.user),
            StoredSession::Bare(user) => Some(user),
        }
    }

    async fn read_stored(&self) -> Option<StoredSession> {
        let raw = match self.tab.get(SESSION_KEY).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                warn!(error = %e, "session record unreadable");
                return None;
            }
        };

        match serde_json::from_str(&raw) {
            Ok(stored) => Some(stored),
            Err(e) => {
                warn!(error = %e, "invalid session data, ignoring");
                None
            }
        }
    }
}
