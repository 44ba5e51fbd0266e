//! Shared application state for the `InvoiceFlow` server.
//!
//! A single [`AppState`] is constructed at startup and shared across all
//! Axum handlers via `Arc`. It holds the shared persistent scope, the open
//! tabs, and the mock services every tab talks to.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, RwLock};
use tokio::time::Instant;
use tracing::info;

use invoiceflow_core::assessment::AssessmentService;
use invoiceflow_core::auth::MockAuthService;
use invoiceflow_core::bulk::{BulkActionHandler, LogOnlyBulkActions};
use invoiceflow_core::invoice::{Invoice, seed};
use invoiceflow_core::session::ExpiryPolicy;
use invoiceflow_storage::StorageBackend;

use crate::config::ServerConfig;
use crate::tab::Tab;

/// An open tab and when it was last used.
#[derive(Debug, Clone)]
pub struct TabSlot {
    pub tab: Arc<Mutex<Tab>>,
    last_seen: Arc<std::sync::Mutex<Instant>>,
}

impl TabSlot {
    fn new(tab: Tab) -> Self {
        Self {
            tab: Arc::new(Mutex::new(tab)),
            last_seen: Arc::new(std::sync::Mutex::new(Instant::now())),
        }
    }

    /// Mark the tab as used now.
    pub fn touch(&self) {
        *self
            .last_seen
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner) = Instant::now();
    }

    fn idle_for(&self) -> Duration {
        self.last_seen
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .elapsed()
    }
}

/// Shared application state passed to all HTTP handlers.
pub struct AppState {
    /// The `localStorage` analogue shared by every tab.
    pub persistent: Arc<dyn StorageBackend>,
    /// Open tabs keyed by tab id.
    pub tabs: RwLock<HashMap<String, TabSlot>>,
    /// Mock login/signup.
    pub auth: MockAuthService,
    /// Assessment booking.
    pub assessment: AssessmentService,
    /// Receives bulk actions from every tab.
    pub bulk: Arc<dyn BulkActionHandler>,
    /// The invoice collection every list view starts from.
    pub invoices: Arc<[Invoice]>,
    /// Session expiry applied to new tabs.
    pub session_expiry: ExpiryPolicy,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState").finish_non_exhaustive()
    }
}

impl AppState {
    /// State over `persistent` with the services configured by `config`.
    pub fn new(persistent: Arc<dyn StorageBackend>, config: &ServerConfig) -> Self {
        Self {
            persistent,
            tabs: RwLock::new(HashMap::new()),
            auth: MockAuthService::new(config.auth_delay),
            assessment: AssessmentService::new(config.assessment_delay),
            bulk: Arc::new(LogOnlyBulkActions),
            invoices: seed().into(),
            session_expiry: config.session_expiry,
        }
    }

    /// Open a new tab and return its id.
    pub async fn open_tab(&self) -> (String, TabSlot) {
        let tab = Tab::open(
            Arc::clone(&self.persistent),
            self.session_expiry,
            Arc::clone(&self.invoices),
        )
        .await;
        let id = uuid::Uuid::new_v4().to_string();
        let slot = TabSlot::new(tab);
        self.tabs.write().await.insert(id.clone(), slot.clone());
        info!(tab = %id, "tab opened");
        (id, slot)
    }

    pub async fn tab(&self, id: &str) -> Option<TabSlot> {
        self.tabs.read().await.get(id).cloned()
    }

    /// Close a tab, dropping its session scope. Returns whether it existed.
    pub async fn close_tab(&self, id: &str) -> bool {
        let removed = self.tabs.write().await.remove(id).is_some();
        if removed {
            info!(tab = %id, "tab closed");
        }
        removed
    }

    pub async fn tab_count(&self) -> usize {
        self.tabs.read().await.len()
    }

    /// Close every tab idle for at least `max_idle`. Returns how many closed.
    pub async fn close_idle_tabs(&self, max_idle: Duration) -> usize {
        let mut tabs = self.tabs.write().await;
        let before = tabs.len();
        tabs.retain(|_, slot| slot.idle_for() < max_idle);
        before.saturating_sub(tabs.len())
    }
}

#[cfg(test)]
mod tests {
    use invoiceflow_core::router::View;
    use invoiceflow_storage::MemoryBackend;

    use super::*;

    fn state() -> AppState {
        AppState::new(Arc::new(MemoryBackend::new()), &ServerConfig::default())
    }

    #[tokio::test]
    async fn open_and_close() {
        let state = state();
        let (id, slot) = state.open_tab().await;
        assert_eq!(slot.tab.lock().await.view(), View::Home);
        assert_eq!(state.tab_count().await, 1);
        assert!(state.tab(&id).await.is_some());
        assert!(state.close_tab(&id).await);
        assert!(!state.close_tab(&id).await);
        assert!(state.tab(&id).await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn idle_tabs_are_closed() {
        let state = state();
        let (stale, _) = state.open_tab().await;
        tokio::time::advance(Duration::from_secs(600)).await;
        let (fresh, _) = state.open_tab().await;

        assert_eq!(state.close_idle_tabs(Duration::from_secs(300)).await, 1);
        assert!(state.tab(&stale).await.is_none());
        assert!(state.tab(&fresh).await.is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn touch_keeps_tab_alive() {
        let state = state();
        let (id, slot) = state.open_tab().await;
        tokio::time::advance(Duration::from_secs(600)).await;
        slot.touch();
        assert_eq!(state.close_idle_tabs(Duration::from_secs(300)).await, 0);
        assert!(state.tab(&id).await.is_some());
    }
}
