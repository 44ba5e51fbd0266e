//! Dashboard sub-router synchronized with the URL fragment.
//!
//! The fragment is the source of truth. [`HashRouter::navigate`] only writes
//! the fragment; the page changes when [`HashRouter::sync`] sees the
//! resulting `hash-change` event. Edits from outside (the address bar,
//! history back/forward) arrive the same way.

use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, info};

use crate::bus::{EventBus, Subscription, Topic};

/// A dashboard page, addressed by the URL fragment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PageId {
    #[default]
    Dashboard,
    Invoices,
    Clients,
    Reports,
    Settings,
}

impl PageId {
    pub const ALL: [Self; 5] = [
        Self::Dashboard,
        Self::Invoices,
        Self::Clients,
        Self::Reports,
        Self::Settings,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Dashboard => "dashboard",
            Self::Invoices => "invoices",
            Self::Clients => "clients",
            Self::Reports => "reports",
            Self::Settings => "settings",
        }
    }

    /// Parse a fragment with or without its leading `#`. Empty or unknown
    /// fragments fall back to the dashboard.
    pub fn from_fragment(fragment: &str) -> Self {
        let id = fragment.strip_prefix('#').unwrap_or(fragment);
        Self::ALL
            .into_iter()
            .find(|page| page.as_str() == id)
            .unwrap_or_default()
    }

    /// `#` followed by the page id.
    pub fn fragment(self) -> String {
        format!("#{}", self.as_str())
    }
}

impl fmt::Display for PageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where the current fragment lives.
pub trait Location: Send + Sync + 'static {
    /// The current fragment including `#`, or empty.
    fn hash(&self) -> String;

    /// Replace the fragment. Implementations announce the change on the
    /// `hash-change` topic.
    fn set_hash(&self, hash: &str);
}

#[derive(Debug)]
struct History {
    entries: Vec<String>,
    index: usize,
}

/// An in-memory location with browser-like history.
#[derive(Debug)]
pub struct MemoryLocation {
    history: Mutex<History>,
    bus: EventBus,
}

impl MemoryLocation {
    #[must_use]
    pub fn new(initial: &str, bus: EventBus) -> Self {
        Self {
            history: Mutex::new(History {
                entries: vec![initial.to_owned()],
                index: 0,
            }),
            bus,
        }
    }

    /// Step back one history entry. Returns `false` at the oldest entry.
    pub fn back(&self) -> bool {
        self.step(|h| h.index.checked_sub(1))
    }

    /// Step forward one history entry. Returns `false` at the newest entry.
    pub fn forward(&self) -> bool {
        self.step(|h| {
            let next = h.index.saturating_add(1);
            (next < h.entries.len()).then_some(next)
        })
    }

    pub fn history_len(&self) -> usize {
        self.lock().entries.len()
    }

    fn step(&self, target: impl FnOnce(&History) -> Option<usize>) -> bool {
        let hash = {
            let mut history = self.lock();
            let Some(index) = target(&history) else {
                return false;
            };
            history.index = index;
            history.entries.get(index).cloned().unwrap_or_default()
        };
        self.announce(&hash);
        true
    }

    fn announce(&self, hash: &str) {
        self.bus.publish(Topic::HashChange, json!({ "hash": hash }));
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, History> {
        self.history.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Location for MemoryLocation {
    fn hash(&self) -> String {
        let history = self.lock();
        history.entries.get(history.index).cloned().unwrap_or_default()
    }

    fn set_hash(&self, hash: &str) {
        {
            let mut history = self.lock();
            if history.entries.get(history.index).map(String::as_str) == Some(hash) {
                return;
            }
            let keep = history.index.saturating_add(1);
            history.entries.truncate(keep);
            history.entries.push(hash.to_owned());
            history.index = history.entries.len().saturating_sub(1);
        }
        self.announce(hash);
    }
}

/// The dashboard's page selector.
pub struct HashRouter {
    location: Arc<dyn Location>,
    changes: Subscription,
    page: PageId,
}

impl fmt::Debug for HashRouter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HashRouter")
            .field("page", &self.page)
            .finish_non_exhaustive()
    }
}

impl HashRouter {
    /// Mount on `location`, taking the initial page from its fragment.
    pub fn new(location: Arc<dyn Location>, bus: &EventBus) -> Self {
        let changes = bus.subscribe(Topic::HashChange);
        let page = PageId::from_fragment(&location.hash());
        Self {
            location,
            changes,
            page,
        }
    }

    pub fn page(&self) -> PageId {
        self.page
    }

    pub fn location(&self) -> &Arc<dyn Location> {
        &self.location
    }

    /// Write `#page` to the location unless it is already there.
    ///
    /// Returns whether the fragment was written. The page itself follows on
    /// the next [`sync`](Self::sync).
    pub fn navigate(&mut self, page: PageId) -> bool {
        let target = page.fragment();
        if self.location.hash() == target {
            debug!(%page, "already on page");
            return false;
        }
        self.location.set_hash(&target);
        true
    }

    /// Apply pending hash changes and return the current page.
    pub fn sync(&mut self) -> PageId {
        if !self.changes.drain().is_empty() {
            let page = PageId::from_fragment(&self.location.hash());
            if page != self.page {
                info!(from = %self.page, to = %page, "dashboard page changed");
                self.page = page;
            }
        }
        self.page
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mount(initial: &str) -> (Arc<MemoryLocation>, HashRouter) {
        let bus = EventBus::new();
        let location = Arc::new(MemoryLocation::new(initial, bus.clone()));
        let router = HashRouter::new(location.clone(), &bus);
        (location, router)
    }

    #[test]
    fn fragment_parsing() {
        assert_eq!(PageId::from_fragment("#clients"), PageId::Clients);
        assert_eq!(PageId::from_fragment("reports"), PageId::Reports);
        assert_eq!(PageId::from_fragment("#bogus"), PageId::Dashboard);
        assert_eq!(PageId::from_fragment(""), PageId::Dashboard);
        assert_eq!(PageId::from_fragment("#"), PageId::Dashboard);
        assert_eq!(PageId::Settings.fragment(), "#settings");
    }

    #[test]
    fn initial_page_from_location() {
        assert_eq!(mount("#clients").1.page(), PageId::Clients);
        assert_eq!(mount("#bogus").1.page(), PageId::Dashboard);
        assert_eq!(mount("").1.page(), PageId::Dashboard);
    }

    #[test]
    fn navigate_updates_page_after_sync() {
        let (location, mut router) = mount("");
        assert!(router.navigate(PageId::Invoices));
        assert_eq!(location.hash(), "#invoices");
        assert_eq!(router.page(), PageId::Dashboard);
        assert_eq!(router.sync(), PageId::Invoices);
    }

    #[test]
    fn navigate_to_current_fragment_adds_no_history() {
        let (location, mut router) = mount("#invoices");
        assert!(!router.navigate(PageId::Invoices));
        assert_eq!(location.history_len(), 1);
    }

    #[test]
    fn external_edit_is_picked_up() {
        let (location, mut router) = mount("#dashboard");
        location.set_hash("#bogus");
        assert_eq!(router.sync(), PageId::Dashboard);
        location.set_hash("#settings");
        assert_eq!(router.sync(), PageId::Settings);
    }

    #[test]
    fn history_back_and_forward() {
        let (location, mut router) = mount("#dashboard");
        router.navigate(PageId::Invoices);
        router.navigate(PageId::Clients);
        router.sync();

        assert!(location.back());
        assert_eq!(router.sync(), PageId::Invoices);
        assert!(location.back());
        assert_eq!(router.sync(), PageId::Dashboard);
        assert!(!location.back());

        assert!(location.forward());
        assert_eq!(router.sync(), PageId::Invoices);

        // A new entry drops the forward history.
        router.navigate(PageId::Reports);
        assert!(!location.forward());
        assert_eq!(router.sync(), PageId::Reports);
        assert_eq!(location.history_len(), 3);
    }
}
