//! One tab's worth of application state.
//!
//! A tab owns its session scope, its location (URL fragment and history),
//! its event bus and its view router. The dashboard shell and the invoice
//! list exist only while the router is on the dashboard; leaving the
//! dashboard drops them, entering it mounts fresh ones.

use std::sync::Arc;

use invoiceflow_core::bus::EventBus;
use invoiceflow_core::dashboard::DashboardShell;
use invoiceflow_core::error::RouterError;
use invoiceflow_core::hash_route::{Location, MemoryLocation};
use invoiceflow_core::invoice::Invoice;
use invoiceflow_core::list_view::ListView;
use invoiceflow_core::router::{LoginOutcome, LoginTicket, View, ViewRouter};
use invoiceflow_core::session::{ExpiryPolicy, SessionStore};
use invoiceflow_core::user::User;
use invoiceflow_storage::{MemoryBackend, StorageBackend};
use tracing::debug;

use crate::error::AppError;

/// The dashboard's mounted components.
#[derive(Debug)]
pub struct DashboardMount {
    pub shell: DashboardShell,
    pub list: ListView,
}

pub struct Tab {
    router: ViewRouter,
    bus: EventBus,
    location: Arc<MemoryLocation>,
    persistent: Arc<dyn StorageBackend>,
    invoices: Arc<[Invoice]>,
    dashboard: Option<DashboardMount>,
}

impl std::fmt::Debug for Tab {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tab")
            .field("view", &self.router.current())
            .field("dashboard", &self.dashboard.is_some())
            .finish_non_exhaustive()
    }
}

impl Tab {
    /// Open a tab with a fresh session scope over the shared `persistent`
    /// scope, and resolve its initial view.
    pub async fn open(
        persistent: Arc<dyn StorageBackend>,
        policy: ExpiryPolicy,
        invoices: Arc<[Invoice]>,
    ) -> Self {
        let session = SessionStore::new(Arc::clone(&persistent), Arc::new(MemoryBackend::new()))
            .with_policy(policy);
        let router = ViewRouter::start(session).await;
        let bus = EventBus::new();
        let location = Arc::new(MemoryLocation::new("", bus.clone()));

        let mut tab = Self {
            router,
            bus,
            location,
            persistent,
            invoices,
            dashboard: None,
        };
        tab.remount().await;
        tab
    }

    pub fn view(&self) -> View {
        self.router.current()
    }

    pub fn user(&self) -> Option<&User> {
        self.router.user()
    }

    pub fn location(&self) -> &MemoryLocation {
        &self.location
    }

    // ── Top-level navigation ─────────────────────────────────────────

    /// # Errors
    ///
    /// Returns the router's error for an undefined transition.
    pub async fn login_click(&mut self) -> Result<View, RouterError> {
        let view = self.router.login_click().await?;
        self.remount().await;
        Ok(view)
    }

    /// # Errors
    ///
    /// Returns the router's error for an undefined transition.
    pub async fn navigate_to_assessment(&mut self) -> Result<View, RouterError> {
        let view = self.router.navigate_to_assessment()?;
        self.remount().await;
        Ok(view)
    }

    /// # Errors
    ///
    /// Returns the router's error for an undefined transition.
    pub async fn back(&mut self) -> Result<View, RouterError> {
        let view = self.router.back().await?;
        self.remount().await;
        Ok(view)
    }

    /// # Errors
    ///
    /// Returns the router's error unless the tab is on the login view.
    pub fn begin_login(&self) -> Result<LoginTicket, RouterError> {
        self.router.begin_login()
    }

    pub async fn complete_login(&mut self, ticket: LoginTicket, user: User) -> LoginOutcome {
        let outcome = self.router.complete_login(ticket, user).await;
        self.remount().await;
        outcome
    }

    /// # Errors
    ///
    /// Returns the router's error unless the tab is on the dashboard.
    pub async fn logout(&mut self) -> Result<View, RouterError> {
        let view = self.router.logout().await?;
        self.remount().await;
        Ok(view)
    }

    // ── Dashboard ────────────────────────────────────────────────────

    /// The mounted dashboard.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Unauthorized`] when the tab is not on the
    /// dashboard.
    pub fn dashboard(&mut self) -> Result<&mut DashboardMount, AppError> {
        self.dashboard
            .as_mut()
            .ok_or_else(|| AppError::Unauthorized("sign in to use the dashboard".to_owned()))
    }

    async fn remount(&mut self) {
        let on_dashboard = self.router.current() == View::Dashboard;
        match (on_dashboard, self.dashboard.is_some()) {
            (true, false) => {
                let location: Arc<dyn Location> = self.location.clone();
                let shell =
                    DashboardShell::mount(location, self.bus.clone(), Arc::clone(&self.persistent))
                        .await;
                let list = ListView::new(Arc::clone(&self.invoices)).with_focus_events(&self.bus);
                self.dashboard = Some(DashboardMount { shell, list });
                debug!("dashboard mounted");
            }
            (false, true) => {
                self.dashboard = None;
                debug!("dashboard unmounted");
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use invoiceflow_core::hash_route::PageId;
    use invoiceflow_core::invoice::seed;

    use super::*;

    async fn open(persistent: &MemoryBackend) -> Tab {
        Tab::open(
            Arc::new(persistent.clone()),
            ExpiryPolicy::default(),
            seed().into(),
        )
        .await
    }

    async fn sign_in(tab: &mut Tab) {
        tab.login_click().await.unwrap();
        let ticket = tab.begin_login().unwrap();
        tab.complete_login(ticket, User::new("Demo User", "a@gmail.com")).await;
    }

    #[tokio::test]
    async fn dashboard_mounts_only_while_signed_in() {
        let mut tab = open(&MemoryBackend::new()).await;
        assert!(tab.dashboard().is_err());

        sign_in(&mut tab).await;
        assert_eq!(tab.view(), View::Dashboard);
        assert!(tab.dashboard().is_ok());

        tab.logout().await.unwrap();
        assert!(tab.dashboard().is_err());
    }

    #[tokio::test]
    async fn remount_resets_list_state_but_keeps_location() {
        let mut tab = open(&MemoryBackend::new()).await;
        sign_in(&mut tab).await;
        {
            let mount = tab.dashboard().unwrap();
            mount.list.set_search("emaar");
            mount.shell.navigate(PageId::Invoices);
        }
        tab.logout().await.unwrap();
        sign_in(&mut tab).await;

        let mount = tab.dashboard().unwrap();
        assert_eq!(mount.list.query().search, "");
        assert_eq!(mount.shell.page(), PageId::Invoices);
    }

    #[tokio::test]
    async fn tabs_share_only_the_persistent_scope() {
        let persistent = MemoryBackend::new();
        let mut first = open(&persistent).await;
        sign_in(&mut first).await;

        // The new tab has no session record of its own.
        let second = open(&persistent).await;
        assert_eq!(second.view(), View::Home);
    }
}
