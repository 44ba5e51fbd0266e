//! Keyboard shortcut state machine.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::hash_route::PageId;

/// A key press as seen by the dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyPress {
    /// The key value, e.g. `"k"`, `"Escape"`, `"/"`.
    pub key: String,
    #[serde(default)]
    pub ctrl: bool,
    #[serde(default)]
    pub meta: bool,
    /// Focus was in a text input when the key was pressed.
    #[serde(default)]
    pub in_text_input: bool,
}

impl KeyPress {
    #[must_use]
    pub fn plain(key: &str) -> Self {
        Self {
            key: key.to_owned(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_ctrl(key: &str) -> Self {
        Self {
            key: key.to_owned(),
            ctrl: true,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn in_input(key: &str) -> Self {
        Self {
            key: key.to_owned(),
            in_text_input: true,
            ..Self::default()
        }
    }
}

/// What a key press asks the shell to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "action", content = "page", rename_all = "kebab-case")]
pub enum ShortcutAction {
    TogglePalette,
    ClosePalette,
    FocusSearch,
    Navigate(PageId),
    /// `g` was pressed; the next key may complete a chord.
    ChordStarted,
    None,
}

/// Tracks the `g` chord between key presses.
#[derive(Debug, Default)]
pub struct ShortcutHandler {
    chord_armed: bool,
}

impl ShortcutHandler {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn chord_armed(&self) -> bool {
        self.chord_armed
    }

    /// Interpret one key press.
    ///
    /// `Ctrl/Cmd+K` and `Escape` work everywhere. Other shortcuts are
    /// ignored while typing in a text input. An armed chord is consumed by
    /// the very next key: `d i c r s` navigate, anything else falls through
    /// to normal handling.
    pub fn handle(&mut self, key: &KeyPress) -> ShortcutAction {
        let armed = std::mem::take(&mut self.chord_armed);
        let lower = key.key.to_lowercase();

        if armed && !key.in_text_input {
            if let Some(page) = chord_target(&lower) {
                debug!(%page, "chord completed");
                return ShortcutAction::Navigate(page);
            }
        }

        if (key.ctrl || key.meta) && lower == "k" {
            return ShortcutAction::TogglePalette;
        }
        if key.key == "Escape" {
            return ShortcutAction::ClosePalette;
        }
        if key.in_text_input {
            return ShortcutAction::None;
        }
        if key.key == "/" {
            return ShortcutAction::FocusSearch;
        }
        if lower == "g" && !key.ctrl && !key.meta {
            self.chord_armed = true;
            return ShortcutAction::ChordStarted;
        }
        ShortcutAction::None
    }
}

fn chord_target(key: &str) -> Option<PageId> {
    match key {
        "d" => Some(PageId::Dashboard),
        "i" => Some(PageId::Invoices),
        "c" => Some(PageId::Clients),
        "r" => Some(PageId::Reports),
        "s" => Some(PageId::Settings),
        _ => None,
    }
}
