//! The dashboard shell: menu, command palette, keyboard shortcuts and the
//! sidebar preference, wrapped around the hash sub-router.

use std::sync::Arc;

use serde::Serialize;
use serde_json::json;
use tracing::{debug, info, warn};

use invoiceflow_storage::StorageBackend;

use crate::bus::{EventBus, Topic};
use crate::hash_route::{HashRouter, Location, PageId};
use crate::shortcuts::{KeyPress, ShortcutAction, ShortcutHandler};

/// Persistent-scope key for the collapsed sidebar flag (a JSON boolean).
pub const SIDEBAR_KEY: &str = "if.sidebarCollapsed";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MenuItem {
    pub id: PageId,
    pub label: &'static str,
    pub shortcut: &'static str,
}

pub const MENU: [MenuItem; 5] = [
    MenuItem {
        id: PageId::Dashboard,
        label: "Dashboard",
        shortcut: "g → d",
    },
    MenuItem {
        id: PageId::Invoices,
        label: "Invoices",
        shortcut: "g → i",
    },
    MenuItem {
        id: PageId::Clients,
        label: "Clients",
        shortcut: "g → c",
    },
    MenuItem {
        id: PageId::Reports,
        label: "Reports",
        shortcut: "g → r",
    },
    MenuItem {
        id: PageId::Settings,
        label: "Settings",
        shortcut: "g → s",
    },
];

/// Menu entries whose label or id contains `query`, ignoring case.
pub fn palette_matches(query: &str) -> Vec<MenuItem> {
    let query = query.trim().to_lowercase();
    MENU.iter()
        .filter(|item| {
            item.label.to_lowercase().contains(&query) || item.id.as_str().contains(&query)
        })
        .copied()
        .collect()
}

/// Serializable view of the shell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShellSnapshot {
    pub page: PageId,
    pub hash: String,
    pub palette_open: bool,
    pub sidebar_collapsed: bool,
    pub chord_armed: bool,
    pub menu: Vec<MenuItem>,
}

pub struct DashboardShell {
    router: HashRouter,
    keys: ShortcutHandler,
    bus: EventBus,
    prefs: Arc<dyn StorageBackend>,
    palette_open: bool,
    sidebar_collapsed: bool,
}

impl std::fmt::Debug for DashboardShell {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DashboardShell")
            .field("router", &self.router)
            .field("palette_open", &self.palette_open)
            .field("sidebar_collapsed", &self.sidebar_collapsed)
            .finish_non_exhaustive()
    }
}

impl DashboardShell {
    /// Mount the shell: page from the location, sidebar from `prefs`.
    pub async fn mount(
        location: Arc<dyn Location>,
        bus: EventBus,
        prefs: Arc<dyn StorageBackend>,
    ) -> Self {
        let router = HashRouter::new(location, &bus);
        let sidebar_collapsed = read_sidebar(prefs.as_ref()).await;
        debug!(page = %router.page(), sidebar_collapsed, "dashboard mounted");
        Self {
            router,
            keys: ShortcutHandler::new(),
            bus,
            prefs,
            palette_open: false,
            sidebar_collapsed,
        }
    }

    /// Current page, after applying pending hash changes.
    pub fn page(&mut self) -> PageId {
        self.router.sync()
    }

    pub fn palette_open(&self) -> bool {
        self.palette_open
    }

    pub fn sidebar_collapsed(&self) -> bool {
        self.sidebar_collapsed
    }

    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    /// Menu click or chord: write the fragment and follow it.
    pub fn navigate(&mut self, page: PageId) -> PageId {
        self.router.navigate(page);
        self.router.sync()
    }

    /// React to a fragment change made outside the shell.
    pub fn handle_hash_change(&mut self) -> PageId {
        self.router.sync()
    }

    /// Run a key press through the shortcut handler and apply the result.
    pub fn handle_key(&mut self, key: &KeyPress) -> ShortcutAction {
        let action = self.keys.handle(key);
        match action {
            ShortcutAction::TogglePalette => self.set_palette(!self.palette_open),
            ShortcutAction::ClosePalette => self.set_palette(false),
            ShortcutAction::FocusSearch => {
                self.bus.publish(Topic::FocusSearch, serde_json::Value::Null);
            }
            ShortcutAction::Navigate(page) => {
                self.navigate(page);
            }
            ShortcutAction::ChordStarted | ShortcutAction::None => {}
        }
        action
    }

    /// Palette entries for `query`.
    pub fn palette_entries(&self, query: &str) -> Vec<MenuItem> {
        palette_matches(query)
    }

    /// Choose a palette entry: navigate there and close the palette.
    pub fn choose_palette_entry(&mut self, page: PageId) -> PageId {
        let page = self.navigate(page);
        self.set_palette(false);
        page
    }

    /// Store the sidebar preference. A failed write is logged; the
    /// in-memory value still changes.
    pub async fn set_sidebar_collapsed(&mut self, collapsed: bool) {
        self.sidebar_collapsed = collapsed;
        let value = if collapsed { "true" } else { "false" };
        if let Err(e) = self.prefs.set(SIDEBAR_KEY, value).await {
            warn!(error = %e, "failed to store sidebar preference");
        }
    }

    pub fn snapshot(&mut self) -> ShellSnapshot {
        let page = self.router.sync();
        ShellSnapshot {
            page,
            hash: self.router.location().hash(),
            palette_open: self.palette_open,
            sidebar_collapsed: self.sidebar_collapsed,
            chord_armed: self.keys.chord_armed(),
            menu: MENU.to_vec(),
        }
    }

    fn set_palette(&mut self, open: bool) {
        if self.palette_open == open {
            return;
        }
        self.palette_open = open;
        info!(open, "command palette toggled");
        self.bus.publish(Topic::PaletteToggled, json!({ "open": open }));
    }
}

async fn read_sidebar(prefs: &dyn StorageBackend) -> bool {
    match prefs.get(SIDEBAR_KEY).await {
        Ok(Some(raw)) => serde_json::from_str::<bool>(&raw).unwrap_or_else(|_| {
            debug!(value = %raw, "ignoring malformed sidebar preference");
            false
        }),
        Ok(None) => false,
        Err(e) => {
            warn!(error = %e, "sidebar preference unreadable");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use invoiceflow_storage::MemoryBackend;

    use super::*;
    use crate::hash_route::MemoryLocation;

    async fn mount_at(hash: &str, prefs: &MemoryBackend) -> (Arc<MemoryLocation>, DashboardShell) {
        let bus = EventBus::new();
        let location = Arc::new(MemoryLocation::new(hash, bus.clone()));
        let shell = DashboardShell::mount(location.clone(), bus, Arc::new(prefs.clone())).await;
        (location, shell)
    }

    #[test]
    fn palette_filters_label_and_id() {
        let ids: Vec<_> = palette_matches("INV").iter().map(|m| m.id).collect();
        assert_eq!(ids, vec![PageId::Invoices]);
        assert_eq!(palette_matches("").len(), 5);
        assert_eq!(palette_matches("s").len(), 5);
        assert!(palette_matches("xyz").is_empty());
        let ids: Vec<_> = palette_matches("re").iter().map(|m| m.id).collect();
        assert_eq!(ids, vec![PageId::Reports]);
    }

    #[tokio::test]
    async fn chord_navigates_and_updates_hash() {
        let (location, mut shell) = mount_at("", &MemoryBackend::new()).await;
        shell.handle_key(&KeyPress::plain("g"));
        let action = shell.handle_key(&KeyPress::plain("c"));
        assert_eq!(action, ShortcutAction::Navigate(PageId::Clients));
        assert_eq!(shell.page(), PageId::Clients);
        assert_eq!(location.hash(), "#clients");
    }

    #[tokio::test]
    async fn palette_toggle_and_choose() {
        let (_, mut shell) = mount_at("#dashboard", &MemoryBackend::new()).await;
        let mut toggles = shell.bus().subscribe(Topic::PaletteToggled);

        shell.handle_key(&KeyPress::with_ctrl("k"));
        assert!(shell.palette_open());
        assert_eq!(shell.choose_palette_entry(PageId::Reports), PageId::Reports);
        assert!(!shell.palette_open());

        let events = toggles.drain();
        assert_eq!(events.len(), 2);
        assert_eq!(events[1].detail, json!({ "open": false }));
    }

    #[tokio::test]
    async fn escape_when_closed_publishes_nothing() {
        let (_, mut shell) = mount_at("", &MemoryBackend::new()).await;
        let mut toggles = shell.bus().subscribe(Topic::PaletteToggled);
        shell.handle_key(&KeyPress::plain("Escape"));
        assert!(toggles.drain().is_empty());
    }

    #[tokio::test]
    async fn slash_requests_focus() {
        let (_, mut shell) = mount_at("#invoices", &MemoryBackend::new()).await;
        let mut focus = shell.bus().subscribe(Topic::FocusSearch);
        shell.handle_key(&KeyPress::plain("/"));
        assert_eq!(focus.drain().len(), 1);
        shell.handle_key(&KeyPress::in_input("/"));
        assert!(focus.drain().is_empty());
    }

    #[tokio::test]
    async fn sidebar_preference_round_trips_through_storage() {
        let prefs = MemoryBackend::new();
        let (_, mut shell) = mount_at("", &prefs).await;
        assert!(!shell.sidebar_collapsed());

        shell.set_sidebar_collapsed(true).await;
        assert_eq!(prefs.get(SIDEBAR_KEY).await.unwrap().as_deref(), Some("true"));

        let (_, remounted) = mount_at("", &prefs).await;
        assert!(remounted.sidebar_collapsed());
    }

    #[tokio::test]
    async fn malformed_sidebar_preference_falls_back() {
        let prefs = MemoryBackend::new();
        for raw in ["yes", "1", "{\"collapsed\":true}", "\"true\""] {
            prefs.set(SIDEBAR_KEY, raw).await.unwrap();
            let (_, shell) = mount_at("", &prefs).await;
            assert!(!shell.sidebar_collapsed(), "{raw}");
        }
    }

    #[tokio::test]
    async fn failed_sidebar_write_keeps_value() {
        let prefs = MemoryBackend::with_quota(4);
        let (_, mut shell) = mount_at("", &prefs).await;
        shell.set_sidebar_collapsed(true).await;
        assert!(shell.sidebar_collapsed());
        assert_eq!(prefs.get(SIDEBAR_KEY).await.unwrap(), None);
    }

    #[tokio::test]
    async fn external_hash_change_is_followed() {
        let (location, mut shell) = mount_at("#dashboard", &MemoryBackend::new()).await;
        location.set_hash("#settings");
        assert_eq!(shell.handle_hash_change(), PageId::Settings);
        let snapshot = shell.snapshot();
        assert_eq!(snapshot.hash, "#settings");
        assert_eq!(snapshot.menu.len(), 5);
    }
}
