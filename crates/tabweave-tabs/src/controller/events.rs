//! Relay events from bound surfaces.

use std::time::Instant;

use tabweave_common::{SurfaceId, TabId};
use tabweave_webview::{RelayEvent, RelayEventKind};
use tracing::{debug, trace, warn};

use super::types::TitlePoll;
use super::TabController;
use crate::error::{Result, TabError};
use crate::tab::{favicon_for_url, is_placeholder_url};

impl TabController {
    /// Apply one relayed event.
    ///
    /// Events carrying a surface id that no live tab is bound to are
    /// dropped with [`TabError::StaleEvent`].
    pub fn handle_event(&mut self, event: &RelayEvent, now: Instant) -> Result<()> {
        let Some(surface_id) = event.surface_id else {
            return self.handle_window_event(&event.kind, now);
        };
        let Some(tab_id) = self.bindings.get(&surface_id).cloned() else {
            debug!(%surface_id, kind = event.kind.name(), "dropping event from stale surface");
            return Err(TabError::StaleEvent(surface_id));
        };

        match &event.kind {
            RelayEventKind::FinishLoad { url } => self.on_load_finished(&tab_id, url, now),
            RelayEventKind::FailLoad {
                code,
                description,
                url,
            } => {
                warn!(tab_id = %tab_id, %surface_id, code, %description, %url, "page failed to load");
            }
            RelayEventKind::TitleUpdated { title } | RelayEventKind::TitleChanged { title } => {
                self.on_title(&tab_id, title, now)
            }
            RelayEventKind::FaviconUpdated { urls } => self.on_favicon(&tab_id, urls),
            RelayEventKind::DidNavigate { url }
            | RelayEventKind::DidNavigateInPage { url }
            | RelayEventKind::UrlChanged { url } => self.on_url_changed(&tab_id, url, now),
            RelayEventKind::NewWindow { url } => {
                let incognito = self.tabs.get(&tab_id).is_some_and(|t| t.incognito);
                self.on_new_window(url, incognito, now)?;
            }
            other => trace!(tab_id = %tab_id, kind = other.name(), "event not handled by tabs"),
        }
        Ok(())
    }

    /// Answer to an [`Effect::QueryTitle`](crate::Effect::QueryTitle).
    /// An empty answer schedules the next attempt until the retry policy
    /// runs out. Answers from a surface the tab is no longer bound to are
    /// dropped with [`TabError::StaleEvent`].
    pub fn on_title_polled(
        &mut self,
        tab_id: &TabId,
        surface_id: SurfaceId,
        title: Option<&str>,
        now: Instant,
    ) -> Result<()> {
        let Some(tab) = self.tabs.get(tab_id) else {
            return Err(TabError::NotFound(tab_id.clone()));
        };
        if tab.surface != Some(surface_id) {
            debug!(tab_id = %tab_id, %surface_id, "dropping title from unbound surface");
            return Err(TabError::StaleEvent(surface_id));
        }
        let Some(poll) = self.title_polls.get(tab_id).copied() else {
            return Ok(());
        };
        if poll.surface.is_some_and(|s| s != surface_id) {
            return Err(TabError::StaleEvent(surface_id));
        }

        if let Some(title) = title.filter(|t| is_usable_title(t)) {
            self.title_polls.remove(tab_id);
            self.set_title(tab_id, title);
            return Ok(());
        }

        let attempt = poll.attempt + 1;
        match self.settings.title_retry.deadline(attempt, now) {
            Some(due) => {
                self.title_polls.insert(
                    tab_id.clone(),
                    TitlePoll {
                        attempt,
                        due: Some(due),
                        surface: None,
                    },
                );
            }
            None => {
                debug!(tab_id = %tab_id, attempts = attempt, "title retry exhausted");
                self.title_polls.remove(tab_id);
            }
        }
        Ok(())
    }

    fn handle_window_event(&mut self, kind: &RelayEventKind, now: Instant) -> Result<()> {
        match kind {
            RelayEventKind::NewWindow { url } => self.on_new_window(url, false, now),
            other => {
                trace!(kind = other.name(), "window event not handled by tabs");
                Ok(())
            }
        }
    }

    fn on_new_window(&mut self, url: &str, incognito: bool, now: Instant) -> Result<()> {
        let url = url.trim();
        if url.is_empty() {
            return Ok(());
        }
        if let Some((last_url, at)) = &self.last_new_window {
            if last_url == url && now.saturating_duration_since(*at) < self.settings.new_window_dedupe {
                debug!(%url, "skipping duplicate new-window request");
                return Ok(());
            }
        }
        self.last_new_window = Some((url.to_string(), now));
        self.open_tab(Some(url), incognito).map(|_| ())
    }

    fn on_url_changed(&mut self, tab_id: &TabId, url: &str, now: Instant) {
        if is_placeholder_url(url) {
            return;
        }
        self.set_url(tab_id, url);
        if let Some(due) = self.settings.title_retry.deadline(0, now) {
            self.title_polls.insert(
                tab_id.clone(),
                TitlePoll {
                    attempt: 0,
                    due: Some(due),
                    surface: None,
                },
            );
        }
    }

    fn on_load_finished(&mut self, tab_id: &TabId, url: &str, now: Instant) {
        if is_placeholder_url(url) {
            return;
        }
        self.set_url(tab_id, url);
        self.arm_history(tab_id, now);
    }

    fn on_title(&mut self, tab_id: &TabId, title: &str, now: Instant) {
        if !is_usable_title(title) {
            return;
        }
        self.title_polls.remove(tab_id);
        self.set_title(tab_id, title);
        self.arm_history(tab_id, now);
    }

    fn on_favicon(&mut self, tab_id: &TabId, urls: &[String]) {
        let Some(tab) = self.tabs.get_mut(tab_id) else {
            return;
        };
        tab.favicon = urls.first().filter(|u| !u.is_empty()).cloned();
        self.sync_toolbar_if_active(tab_id);
    }

    fn set_url(&mut self, tab_id: &TabId, url: &str) {
        let Some(tab) = self.tabs.get_mut(tab_id) else {
            return;
        };
        tab.url = url.to_string();
        if let Some(favicon) = favicon_for_url(url) {
            tab.favicon = Some(favicon);
        }
        self.sync_toolbar_if_active(tab_id);
    }

    fn set_title(&mut self, tab_id: &TabId, title: &str) {
        let Some(tab) = self.tabs.get_mut(tab_id) else {
            return;
        };
        tab.title = title.to_string();
        self.sync_toolbar_if_active(tab_id);
    }

    fn arm_history(&mut self, tab_id: &TabId, now: Instant) {
        let Some(tab) = self.tabs.get(tab_id) else {
            return;
        };
        if tab.incognito || !self.settings.history_filter.should_record(&tab.url) {
            return;
        }
        self.history.arm(tab_id, now);
    }
}

fn is_usable_title(title: &str) -> bool {
    !title.trim().is_empty() && title != "about:blank"
}
