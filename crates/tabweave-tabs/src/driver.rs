//! Glue between one window's [`TabController`] and the [`Coordinator`].
//!
//! The driver carries out controller effects (spawning surfaces through a
//! [`SurfaceSpawner`], sending commands, forwarding navigation to content
//! handles, writing history) and feeds relayed events back until both
//! sides are quiet.

use std::rc::Rc;
use std::sync::Arc;
use std::time::Instant;

use serde_json::Value;
use tabweave_common::{KeyValueStore, StoreError, SurfaceId, WindowId};
use tabweave_webview::memory_host::MemoryHost;
use tabweave_webview::{CallerOrigin, ContentHandle, Coordinator, HostError, Partition, ScriptOutcome};
use tracing::{debug, warn};

use crate::controller::TabController;
use crate::effects::Effect;
use crate::error::TabError;
use crate::history::HistoryEntry;

/// Store key holding recorded history entries, oldest first.
pub const HISTORY_KEY: &str = "history";

/// Script answering a title poll.
pub const TITLE_SCRIPT: &str = "document.title";

/// Upper bound on effect/event rounds per [`WindowDriver::settle`].
const MAX_ROUNDS: usize = 64;

/// Boots rendering surfaces. Implemented by each embedding host.
pub trait SurfaceSpawner {
    fn spawn_surface(
        &self,
        url: &str,
        partition: &Partition,
        visible: bool,
    ) -> Result<SurfaceId, HostError>;

    /// Tear down a surface after the coordinator forgot it.
    fn release_surface(&self, surface_id: SurfaceId);
}

impl SurfaceSpawner for MemoryHost {
    fn spawn_surface(
        &self,
        url: &str,
        _partition: &Partition,
        _visible: bool,
    ) -> Result<SurfaceId, HostError> {
        Ok(MemoryHost::spawn_surface(self, url).surface_id())
    }

    fn release_surface(&self, surface_id: SurfaceId) {
        self.remove_surface(surface_id);
    }
}

pub struct WindowDriver {
    origin: CallerOrigin,
    window: WindowId,
    coordinator: Rc<Coordinator>,
    spawner: Rc<dyn SurfaceSpawner>,
    tabs: TabController,
    history: Option<Arc<dyn KeyValueStore>>,
    stale_events: usize,
}

impl WindowDriver {
    pub fn new(
        origin: CallerOrigin,
        window: WindowId,
        coordinator: Rc<Coordinator>,
        spawner: Rc<dyn SurfaceSpawner>,
        tabs: TabController,
    ) -> Self {
        Self {
            origin,
            window,
            coordinator,
            spawner,
            tabs,
            history: None,
            stale_events: 0,
        }
    }

    pub fn with_history(mut self, store: Arc<dyn KeyValueStore>) -> Self {
        self.history = Some(store);
        self
    }

    pub fn tabs(&self) -> &TabController {
        &self.tabs
    }

    pub fn tabs_mut(&mut self) -> &mut TabController {
        &mut self.tabs
    }

    pub fn coordinator(&self) -> &Coordinator {
        &self.coordinator
    }

    /// Events dropped because their surface was no longer bound.
    pub fn stale_events(&self) -> usize {
        self.stale_events
    }

    /// Fire due timers, then run effects and relay events until neither
    /// produces more work.
    pub async fn settle(&mut self, now: Instant) {
        self.tabs.poll(now);
        for _ in 0..MAX_ROUNDS {
            let effects = self.tabs.drain_effects();
            let events = self.coordinator.drain_events();
            if effects.is_empty() && events.is_empty() {
                return;
            }
            for effect in effects {
                self.apply(effect, now).await;
            }
            for event in events.into_iter().chain(self.coordinator.drain_events()) {
                if event.window != self.window {
                    debug!(window = %event.window, "event for another window");
                    continue;
                }
                match self.tabs.handle_event(&event, now) {
                    Ok(()) => {}
                    Err(TabError::StaleEvent(_)) => self.stale_events += 1,
                    Err(e) => warn!(kind = event.kind.name(), error = %e, "event rejected"),
                }
            }
        }
        warn!(rounds = MAX_ROUNDS, "window did not settle");
    }

    async fn apply(&mut self, effect: Effect, now: Instant) {
        if let Some(command) = effect.to_command() {
            let reply = self.coordinator.dispatch(self.origin, command).await;
            if !reply.success {
                warn!(?effect, message = ?reply.message, "coordinator refused effect");
            }
            if let Effect::DestroySurface { surface_id } = effect {
                self.spawner.release_surface(surface_id);
            }
            return;
        }

        match effect {
            Effect::SpawnSurface {
                tab_id,
                url,
                partition,
                visible,
            } => match self.spawner.spawn_surface(&url, &partition, visible) {
                Ok(surface_id) => {
                    if let Err(e) = self.tabs.on_surface_ready(&tab_id, surface_id) {
                        debug!(tab_id = %tab_id, error = %e, "ready signal not applied");
                    }
                }
                Err(e) => warn!(tab_id = %tab_id, error = %e, "surface spawn failed"),
            },
            Effect::Navigate { surface_id, url, .. } => {
                self.with_content(surface_id, |content| content.load_url(&url));
            }
            Effect::GoBack { surface_id } => self.with_content(surface_id, |c| c.go_back()),
            Effect::GoForward { surface_id } => self.with_content(surface_id, |c| c.go_forward()),
            Effect::Reload { surface_id } => self.with_content(surface_id, |c| c.reload()),
            Effect::QueryTitle { tab_id, surface_id } => {
                let title = match self.coordinator.execute_script(surface_id, TITLE_SCRIPT).await {
                    ScriptOutcome::Success(Value::String(title)) => Some(title),
                    ScriptOutcome::Success(_) => None,
                    ScriptOutcome::Failure(message) => {
                        debug!(tab_id = %tab_id, %message, "title poll failed");
                        None
                    }
                };
                if let Err(e) = self.tabs.on_title_polled(&tab_id, surface_id, title.as_deref(), now) {
                    debug!(tab_id = %tab_id, error = %e, "title poll answer dropped");
                }
            }
            Effect::WriteHistory { tab_id, entry } => {
                if let Err(e) = self.record_history(&entry) {
                    warn!(tab_id = %tab_id, error = %e, "history write failed");
                }
            }
            Effect::CloseWindow => {
                for surface_id in self.coordinator.registry().surfaces_in_window(self.window) {
                    self.coordinator.destroy_surface(surface_id);
                    self.spawner.release_surface(surface_id);
                }
            }
            Effect::CreateSurface { .. } | Effect::DestroySurface { .. } => {}
        }
    }

    fn with_content(
        &self,
        surface_id: SurfaceId,
        action: impl FnOnce(&dyn ContentHandle) -> Result<(), HostError>,
    ) {
        match self.coordinator.registry().content(surface_id) {
            Some(content) => {
                if let Err(e) = action(content.as_ref()) {
                    debug!(%surface_id, error = %e, "content action failed");
                }
            }
            None => debug!(%surface_id, "no content for surface"),
        }
    }

    fn record_history(&self, entry: &HistoryEntry) -> Result<(), StoreError> {
        let Some(store) = &self.history else {
            return Ok(());
        };
        let mut entries: Vec<HistoryEntry> = match store.get(HISTORY_KEY)? {
            Some(value) => serde_json::from_value(value)?,
            None => Vec::new(),
        };
        entries.push(entry.clone());
        store.set(HISTORY_KEY, serde_json::to_value(entries)?)
    }

    /// Recorded history, oldest first.
    pub fn history(&self) -> Result<Vec<HistoryEntry>, StoreError> {
        let Some(store) = &self.history else {
            return Ok(Vec::new());
        };
        match store.get(HISTORY_KEY)? {
            Some(value) => Ok(serde_json::from_value(value)?),
            None => Ok(Vec::new()),
        }
    }
}
