//! Toolbar commands, URL drops and explicit navigation.

use tabweave_common::{SurfaceId, TabId};
use tracing::debug;

use super::{TabController, ToolbarCommand};
use crate::effects::Effect;
use crate::error::{Result, TabError};
use crate::tab::{favicon_for_url, title_from_url};

impl TabController {
    pub fn toolbar_command(&mut self, command: ToolbarCommand) -> Result<()> {
        match command {
            ToolbarCommand::NewIncognitoTab => self.open_incognito().map(|_| ()),
            ToolbarCommand::LoadUrl(url) => {
                let active = self.require_active()?;
                self.navigate_tab(&active, &url)
            }
            ToolbarCommand::Back => {
                let active = self.require_active()?;
                self.on_active_surface(&active, |surface_id| Effect::GoBack { surface_id });
                Ok(())
            }
            ToolbarCommand::Forward => {
                let active = self.require_active()?;
                self.on_active_surface(&active, |surface_id| Effect::GoForward { surface_id });
                Ok(())
            }
            ToolbarCommand::Reload => {
                let active = self.require_active()?;
                self.on_active_surface(&active, |surface_id| Effect::Reload { surface_id });
                Ok(())
            }
        }
    }

    /// Point a tab at `url`. Blank input is ignored. An unbound tab loads
    /// the URL once its surface is bound.
    pub fn navigate_tab(&mut self, tab_id: &TabId, url: &str) -> Result<()> {
        let url = url.trim();
        if url.is_empty() {
            debug!(tab_id = %tab_id, "ignoring empty url");
            return Ok(());
        }
        let Some(tab) = self.tabs.get_mut(tab_id) else {
            return Err(TabError::NotFound(tab_id.clone()));
        };
        tab.url = url.to_string();
        let surface = if tab.is_bound() { tab.surface } else { None };
        if surface.is_none() {
            tab.pending_url = Some(url.to_string());
        }

        if self.is_active(tab_id) {
            self.toolbar.url = url.to_string();
        }
        if let Some(surface_id) = surface {
            self.navigate_surface(surface_id, url);
        }
        Ok(())
    }

    /// Handle a URL dropped onto the strip: onto `target` retargets that
    /// tab, otherwise a new active tab opens. Returns the tab that shows
    /// the URL.
    pub fn drop_url(&mut self, url: &str, target: Option<&TabId>) -> Result<TabId> {
        let url = url.trim();
        if url.is_empty() {
            return Err(TabError::EmptyUrl);
        }
        let tab_id = match target {
            Some(id) => {
                self.navigate_tab(id, url)?;
                id.clone()
            }
            None => self.open_tab(Some(url), false)?,
        };
        if let Some(tab) = self.tabs.get_mut(&tab_id) {
            tab.title = title_from_url(url);
            tab.favicon = favicon_for_url(url);
        }
        self.sync_toolbar_if_active(&tab_id);
        Ok(tab_id)
    }

    pub(super) fn navigate_surface(&mut self, surface_id: SurfaceId, url: &str) {
        let (target, visible) = self.settings.surface_target(url);
        let target = target.to_string();
        self.emit(Effect::Navigate {
            surface_id,
            url: target,
            visible,
        });
    }

    fn require_active(&self) -> Result<TabId> {
        self.active_id().cloned().ok_or(TabError::WindowClosed)
    }

    fn on_active_surface(&mut self, tab_id: &TabId, effect: impl FnOnce(SurfaceId) -> Effect) {
        match self.tabs.get(tab_id).filter(|t| t.is_bound()).and_then(|t| t.surface) {
            Some(surface_id) => self.emit(effect(surface_id)),
            None => debug!(tab_id = %tab_id, "active tab has no surface yet"),
        }
    }
}
