//! Opening, binding, closing and ordering tabs.

use tabweave_common::{SurfaceId, TabId};
use tracing::{debug, info, warn};

use super::TabController;
use crate::effects::Effect;
use crate::error::{Result, TabError};
use crate::tab::{Tab, TabState};

impl TabController {
    /// Open a tab at `url` (the home page when `None`) and activate it.
    pub fn open_tab(&mut self, url: Option<&str>, incognito: bool) -> Result<TabId> {
        if self.closed {
            return Err(TabError::WindowClosed);
        }
        Ok(self.spawn_tab(url, incognito))
    }

    pub fn open_incognito(&mut self) -> Result<TabId> {
        self.open_tab(None, true)
    }

    pub(super) fn spawn_tab(&mut self, url: Option<&str>, incognito: bool) -> TabId {
        let id = TabId::new();
        let url = url
            .map(str::trim)
            .filter(|u| !u.is_empty())
            .unwrap_or(self.settings.home_url.as_str())
            .to_string();
        let title = if incognito {
            self.settings.incognito_tab_title.clone()
        } else {
            self.settings.new_tab_title.clone()
        };
        let partition = self.settings.partition_for(&id, incognito).get().clone();

        let mut tab = Tab::new(id.clone(), url.clone(), title, incognito, partition.clone());
        let (surface_url, visible) = self.settings.surface_target(&url);
        let spawn = Effect::SpawnSurface {
            tab_id: id.clone(),
            url: surface_url.to_string(),
            partition: partition.clone(),
            visible,
        };
        tab.state = TabState::SurfaceBinding;

        info!(tab_id = %id, %partition, incognito, "tab opened");
        self.tabs.insert(id.clone(), tab);
        self.strip.push(id.clone());
        self.emit(spawn);
        self.sync_toolbar();
        id
    }

    /// A surface booted for `tab_id` and reported its host-assigned id.
    ///
    /// The first signal binds. A signal with a different id replaces the
    /// binding and destroys the old surface. A repeat is a no-op. A signal
    /// for a tab that no longer exists destroys the orphaned surface.
    pub fn on_surface_ready(&mut self, tab_id: &TabId, surface_id: SurfaceId) -> Result<()> {
        let Some(tab) = self.tabs.get(tab_id) else {
            warn!(tab_id = %tab_id, %surface_id, "surface ready for unknown tab; destroying it");
            self.emit(Effect::DestroySurface { surface_id });
            return Err(TabError::NotFound(tab_id.clone()));
        };
        if tab.surface == Some(surface_id) {
            debug!(tab_id = %tab_id, %surface_id, "surface already bound");
            return Ok(());
        }
        let previous = tab.surface;

        if let Some(owner) = self.bindings.get(&surface_id).cloned() {
            warn!(%surface_id, from = %owner, to = %tab_id, "surface moved between tabs");
            if let Some(other) = self.tabs.get_mut(&owner) {
                other.surface = None;
                other.state = TabState::SurfaceBinding;
            }
            self.title_polls.remove(&owner);
        }
        if let Some(old) = previous {
            info!(tab_id = %tab_id, old = %old, new = %surface_id, "replacing stale surface binding");
            self.bindings.remove(&old);
            self.title_polls.remove(tab_id);
            self.emit(Effect::DestroySurface { surface_id: old });
        }

        self.bindings.insert(surface_id, tab_id.clone());
        let Some(tab) = self.tabs.get_mut(tab_id) else {
            return Err(TabError::NotFound(tab_id.clone()));
        };
        tab.surface = Some(surface_id);
        tab.state = TabState::Bound;
        let partition = tab.partition.clone();
        let pending = tab.pending_url.take();

        info!(tab_id = %tab_id, %surface_id, %partition, "surface bound");
        self.emit(Effect::CreateSurface {
            tab_id: tab_id.clone(),
            surface_id,
            partition,
        });
        if let Some(url) = pending {
            self.navigate_surface(surface_id, &url);
        }
        Ok(())
    }

    /// Close a tab and return its final metadata.
    ///
    /// Pending history writes and title polls are cancelled. Closing the
    /// last tab closes the window.
    pub fn close_tab(&mut self, tab_id: &TabId) -> Result<Tab> {
        let Some(tab) = self.tabs.get_mut(tab_id) else {
            return Err(TabError::NotFound(tab_id.clone()));
        };
        tab.state = TabState::Closing;
        let surface = tab.surface;

        if let Some(surface_id) = surface {
            self.bindings.remove(&surface_id);
            self.emit(Effect::DestroySurface { surface_id });
        }
        self.history.cancel(tab_id);
        self.title_polls.remove(tab_id);
        self.strip.remove(tab_id);

        let Some(mut tab) = self.tabs.remove(tab_id) else {
            return Err(TabError::NotFound(tab_id.clone()));
        };
        tab.state = TabState::Gone;
        info!(tab_id = %tab_id, remaining = self.tabs.len(), "tab closed");

        if self.strip.is_empty() {
            info!("last tab closed; closing window");
            self.closed = true;
            self.emit(Effect::CloseWindow);
        } else {
            self.sync_toolbar();
        }
        Ok(tab)
    }

    pub fn activate(&mut self, tab_id: &TabId) -> Result<()> {
        if !self.strip.set_active(tab_id) {
            return Err(TabError::NotFound(tab_id.clone()));
        }
        self.sync_toolbar();
        Ok(())
    }

    /// Apply a new strip order. Must name every open tab exactly once.
    pub fn reorder(&mut self, order: &[TabId]) -> Result<()> {
        if self.strip.reorder(order) {
            Ok(())
        } else {
            Err(TabError::InvalidOrder)
        }
    }
}
