//! The live set of registered surfaces.
//!
//! Each entry bundles the host content, the owning window, the session for
//! its partition and the relay listeners attached to it. The registry
//! methods take `&self`: a script can be in flight for a surface while a
//! destroy for the same surface arrives, and both must see the same map.
//! No `RefCell` borrow is held across an `.await`.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use serde::Serialize;
use tabweave_common::{ContentHandleId, SurfaceId, WindowId};
use tracing::{debug, info, warn};

use crate::error::{Result, WebViewError};
use crate::events::EventQueue;
use crate::host::{CallerOrigin, ContentHandle, Host, Session, Subscription};
use crate::partition::Partition;
use crate::protocol::ScriptOutcome;
use crate::relay::attach_listeners;
use crate::session::SessionRegistry;

pub struct SurfaceInstance {
    pub surface_id: SurfaceId,
    pub window: WindowId,
    pub content: Rc<dyn ContentHandle>,
    pub partition: Partition,
    pub session: Rc<dyn Session>,
    generation: u64,
    subscriptions: Vec<Subscription>,
}

impl SurfaceInstance {
    pub fn content_handle_id(&self) -> ContentHandleId {
        self.content.id()
    }

    pub fn subscription_count(&self) -> usize {
        self.subscriptions.len()
    }

    fn info(&self) -> SurfaceInfo {
        SurfaceInfo {
            surface_id: self.surface_id,
            content_handle_id: self.content.id(),
            window: self.window,
            partition: self.partition.clone(),
        }
    }
}

/// Snapshot of a registered surface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SurfaceInfo {
    pub surface_id: SurfaceId,
    pub content_handle_id: ContentHandleId,
    pub window: WindowId,
    pub partition: Partition,
}

pub struct SurfaceRegistry {
    host: Rc<dyn Host>,
    events: EventQueue,
    sessions: RefCell<SessionRegistry>,
    surfaces: RefCell<HashMap<SurfaceId, SurfaceInstance>>,
    next_generation: Cell<u64>,
}

impl SurfaceRegistry {
    pub fn new(host: Rc<dyn Host>, events: EventQueue) -> Self {
        Self {
            host,
            events,
            sessions: RefCell::new(SessionRegistry::new()),
            surfaces: RefCell::new(HashMap::new()),
            next_generation: Cell::new(1),
        }
    }

    pub fn host(&self) -> &Rc<dyn Host> {
        &self.host
    }

    pub fn events(&self) -> &EventQueue {
        &self.events
    }

    /// Register a surface the host has just brought up.
    ///
    /// Idempotent: a second create for a registered surface returns the
    /// existing content handle id without touching listeners. An empty or
    /// missing partition falls back to `persist:default`.
    pub fn create(
        &self,
        origin: CallerOrigin,
        surface_id: SurfaceId,
        partition: Option<&str>,
    ) -> Result<ContentHandleId> {
        if let Some(existing) = self.surfaces.borrow().get(&surface_id) {
            debug!(%surface_id, "surface already registered");
            return Ok(existing.content_handle_id());
        }

        let window = self
            .host
            .resolve_window(origin)
            .ok_or(WebViewError::NoHostWindow(origin))?;
        let content = self
            .host
            .content(surface_id)
            .ok_or(WebViewError::NotFound(surface_id))?;
        let partition = Partition::from_wire(partition.unwrap_or_default());
        let session = self.session_for(&partition);
        let subscriptions = attach_listeners(&content, window, &self.events);

        let generation = self.next_generation.get();
        self.next_generation.set(generation + 1);

        let content_id = content.id();
        info!(%surface_id, %window, %partition, content = %content_id, "surface registered");
        self.surfaces.borrow_mut().insert(
            surface_id,
            SurfaceInstance {
                surface_id,
                window,
                content,
                partition,
                session,
                generation,
                subscriptions,
            },
        );
        Ok(content_id)
    }

    /// Detach listeners and forget the surface. Returns `false` if it was
    /// not registered.
    pub fn destroy(&self, surface_id: SurfaceId) -> bool {
        let removed = {
            let mut surfaces = self.surfaces.borrow_mut();
            if let Some(instance) = surfaces.get_mut(&surface_id) {
                instance.subscriptions.clear();
            }
            surfaces.remove(&surface_id)
        };
        match removed {
            Some(instance) => {
                info!(%surface_id, partition = %instance.partition, "surface destroyed");
                true
            }
            None => {
                debug!(%surface_id, "destroy for unknown surface ignored");
                false
            }
        }
    }

    pub fn destroy_all(&self) {
        for surface_id in self.active_surfaces() {
            self.destroy(surface_id);
        }
    }

    pub fn lookup(&self, surface_id: SurfaceId) -> Result<SurfaceInfo> {
        self.surfaces
            .borrow()
            .get(&surface_id)
            .map(SurfaceInstance::info)
            .ok_or(WebViewError::NotFound(surface_id))
    }

    pub fn content(&self, surface_id: SurfaceId) -> Option<Rc<dyn ContentHandle>> {
        self.surfaces
            .borrow()
            .get(&surface_id)
            .map(|i| Rc::clone(&i.content))
    }

    pub fn subscription_count(&self, surface_id: SurfaceId) -> usize {
        self.surfaces
            .borrow()
            .get(&surface_id)
            .map_or(0, SurfaceInstance::subscription_count)
    }

    /// Session for a partition, created through the host on first use.
    pub fn session_for(&self, partition: &Partition) -> Rc<dyn Session> {
        self.sessions
            .borrow_mut()
            .get_or_create(partition, |p| self.host.create_session(p))
    }

    pub fn session_count(&self) -> usize {
        self.sessions.borrow().len()
    }

    pub fn partitions(&self) -> Vec<Partition> {
        self.sessions.borrow().partitions()
    }

    /// Run script in a surface. Never fails outright: every problem comes
    /// back as [`ScriptOutcome::Failure`], including the surface being
    /// destroyed while the script was running.
    pub async fn execute_script(&self, surface_id: SurfaceId, code: &str) -> ScriptOutcome {
        let Some((content, generation)) = self
            .surfaces
            .borrow()
            .get(&surface_id)
            .map(|i| (Rc::clone(&i.content), i.generation))
        else {
            return ScriptOutcome::Failure(WebViewError::NotFound(surface_id).to_string());
        };

        let result = content.execute_script(code).await;

        if !self.is_live(surface_id, generation) {
            warn!(%surface_id, "surface destroyed while script was running, result discarded");
            return ScriptOutcome::Failure(format!(
                "{surface_id} was destroyed during script execution"
            ));
        }

        match result {
            Ok(value) => ScriptOutcome::Success(value),
            Err(e) => {
                debug!(%surface_id, error = %e, "script failed");
                ScriptOutcome::Failure(WebViewError::from(e).to_string())
            }
        }
    }

    /// Whether `surface_id` is still the same registration as `generation`.
    pub fn is_live(&self, surface_id: SurfaceId, generation: u64) -> bool {
        self.surfaces
            .borrow()
            .get(&surface_id)
            .is_some_and(|i| i.generation == generation)
    }

    pub fn generation(&self, surface_id: SurfaceId) -> Option<u64> {
        self.surfaces.borrow().get(&surface_id).map(|i| i.generation)
    }

    /// Registered surface ids, sorted.
    pub fn active_surfaces(&self) -> Vec<SurfaceId> {
        let mut ids: Vec<_> = self.surfaces.borrow().keys().copied().collect();
        ids.sort();
        ids
    }

    pub fn surfaces_in_window(&self, window: WindowId) -> Vec<SurfaceId> {
        let mut ids: Vec<_> = self
            .surfaces
            .borrow()
            .values()
            .filter(|i| i.window == window)
            .map(|i| i.surface_id)
            .collect();
        ids.sort();
        ids
    }

    pub fn count(&self) -> usize {
        self.surfaces.borrow().len()
    }
}
