//! Core controller state and accessors.

use std::collections::HashMap;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use tabweave_common::{SurfaceId, TabId};
use tracing::debug;

use crate::effects::Effect;
use crate::history::HistoryScheduler;
use crate::settings::TabSettings;
use crate::strip::TabStrip;
use crate::tab::{is_placeholder_url, Tab};

/// What the toolbar shows for the active tab.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Toolbar {
    pub url: String,
    pub title: String,
    pub favicon: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "url", rename_all = "kebab-case")]
pub enum ToolbarCommand {
    Back,
    Forward,
    Reload,
    LoadUrl(String),
    NewIncognitoTab,
}

/// A title re-read in flight for one tab.
#[derive(Debug, Clone, Copy)]
pub(super) struct TitlePoll {
    pub attempt: usize,
    /// `None` while a `QueryTitle` is outstanding.
    pub due: Option<Instant>,
    /// Surface the outstanding `QueryTitle` was sent to.
    pub surface: Option<SurfaceId>,
}

/// Owns the tabs of one browser window.
pub struct TabController {
    pub(super) settings: TabSettings,
    pub(super) strip: TabStrip,
    pub(super) tabs: HashMap<TabId, Tab>,
    pub(super) bindings: HashMap<SurfaceId, TabId>,
    pub(super) toolbar: Toolbar,
    pub(super) history: HistoryScheduler,
    pub(super) title_polls: HashMap<TabId, TitlePoll>,
    pub(super) last_new_window: Option<(String, Instant)>,
    pub(super) effects: Vec<Effect>,
    pub(super) closed: bool,
}

impl TabController {
    /// Create a controller holding one home tab.
    pub fn new(settings: TabSettings) -> Self {
        let history = HistoryScheduler::new(settings.history_debounce);
        let mut controller = Self {
            settings,
            strip: TabStrip::new(),
            tabs: HashMap::new(),
            bindings: HashMap::new(),
            toolbar: Toolbar::default(),
            history,
            title_polls: HashMap::new(),
            last_new_window: None,
            effects: Vec::new(),
            closed: false,
        };
        controller.spawn_tab(None, false);
        controller
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    pub fn settings(&self) -> &TabSettings {
        &self.settings
    }

    pub fn tab(&self, id: &TabId) -> Option<&Tab> {
        self.tabs.get(id)
    }

    /// Tabs in strip order.
    pub fn tabs(&self) -> Vec<&Tab> {
        self.strip
            .ids()
            .iter()
            .filter_map(|id| self.tabs.get(id))
            .collect()
    }

    pub fn order(&self) -> &[TabId] {
        self.strip.ids()
    }

    pub fn len(&self) -> usize {
        self.tabs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tabs.is_empty()
    }

    pub fn active_id(&self) -> Option<&TabId> {
        self.strip.active()
    }

    pub fn active(&self) -> Option<&Tab> {
        self.active_id().and_then(|id| self.tabs.get(id))
    }

    pub fn toolbar(&self) -> &Toolbar {
        &self.toolbar
    }

    pub fn tab_for_surface(&self, surface_id: SurfaceId) -> Option<&Tab> {
        self.bindings.get(&surface_id).and_then(|id| self.tabs.get(id))
    }

    /// `true` once the last tab has closed.
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn history_pending(&self, id: &TabId) -> bool {
        self.history.is_pending(id)
    }

    pub fn title_poll_pending(&self, id: &TabId) -> bool {
        self.title_polls.contains_key(id)
    }

    /// Take every queued effect, oldest first.
    pub fn drain_effects(&mut self) -> Vec<Effect> {
        std::mem::take(&mut self.effects)
    }

    // -----------------------------------------------------------------------
    // Internal helpers
    // -----------------------------------------------------------------------

    pub(super) fn emit(&mut self, effect: Effect) {
        debug!(?effect, "tab effect");
        self.effects.push(effect);
    }

    pub(super) fn is_active(&self, id: &TabId) -> bool {
        self.strip.active() == Some(id)
    }

    /// Copy the active tab's metadata into the toolbar. Placeholder URLs
    /// leave the toolbar URL untouched.
    pub(super) fn sync_toolbar(&mut self) {
        let Some(tab) = self.active() else {
            return;
        };
        let url = (!is_placeholder_url(&tab.url)).then(|| tab.url.clone());
        let title = tab.title.clone();
        let favicon = tab.favicon.clone();
        if let Some(url) = url {
            self.toolbar.url = url;
        }
        self.toolbar.title = title;
        self.toolbar.favicon = favicon;
    }

    pub(super) fn sync_toolbar_if_active(&mut self, id: &TabId) {
        if self.is_active(id) {
            self.sync_toolbar();
        }
    }
}
