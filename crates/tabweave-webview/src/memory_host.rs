//! In-process host with no rendering.
//!
//! Used by the `replay` command and as the test double for everything
//! above the [`Host`] seam. Content keeps a navigation history and can be
//! told what scripts return; sessions keep real cookie jars, and durable
//! partitions write theirs through to a [`KeyValueStore`].

use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, HashMap};
use std::rc::Rc;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tabweave_common::{ContentHandleId, KeyValueStore, SurfaceId, WindowId};
use tokio::sync::Notify;
use tracing::{debug, warn};

use crate::context_menu::EditCommand;
use crate::cookies::{Cookie, CookieFilter, CookieJar};
use crate::error::HostError;
use crate::host::{CallerOrigin, ContentEvent, ContentHandle, Host, Listener, ListenerId, Session};
use crate::partition::Partition;

pub struct MemoryHost {
    windows: RefCell<HashMap<CallerOrigin, WindowId>>,
    contents: RefCell<BTreeMap<SurfaceId, Rc<MemoryContent>>>,
    store: Option<Arc<dyn KeyValueStore>>,
    next_surface: Cell<u32>,
    next_content: Cell<u32>,
    sessions_created: Cell<usize>,
    opened_external: RefCell<Vec<String>>,
    clipboard: RefCell<Option<String>>,
}

impl MemoryHost {
    pub fn new() -> Self {
        Self {
            windows: RefCell::new(HashMap::new()),
            contents: RefCell::new(BTreeMap::new()),
            store: None,
            next_surface: Cell::new(1),
            next_content: Cell::new(1),
            sessions_created: Cell::new(0),
            opened_external: RefCell::new(Vec::new()),
            clipboard: RefCell::new(None),
        }
    }

    /// Durable sessions created from now on persist cookies to `store`.
    pub fn with_store(mut self, store: Arc<dyn KeyValueStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn add_window(&self, origin: CallerOrigin, window: WindowId) {
        self.windows.borrow_mut().insert(origin, window);
    }

    /// Bring up a surface with the next free id.
    pub fn spawn_surface(&self, url: &str) -> Rc<MemoryContent> {
        let id = SurfaceId(self.next_surface.get());
        self.spawn_surface_with_id(id, url)
    }

    pub fn spawn_surface_with_id(&self, surface_id: SurfaceId, url: &str) -> Rc<MemoryContent> {
        if surface_id.0 >= self.next_surface.get() {
            self.next_surface.set(surface_id.0 + 1);
        }
        let content_id = ContentHandleId(self.next_content.get());
        self.next_content.set(content_id.0 + 1);

        let content = Rc::new(MemoryContent::new(content_id, surface_id, url));
        self.contents
            .borrow_mut()
            .insert(surface_id, Rc::clone(&content));
        debug!(%surface_id, content = %content_id, url, "memory surface spawned");
        content
    }

    /// Drop the host side of a surface, as if its process went away.
    pub fn remove_surface(&self, surface_id: SurfaceId) -> Option<Rc<MemoryContent>> {
        self.contents.borrow_mut().remove(&surface_id)
    }

    pub fn surface(&self, surface_id: SurfaceId) -> Option<Rc<MemoryContent>> {
        self.contents.borrow().get(&surface_id).cloned()
    }

    pub fn sessions_created(&self) -> usize {
        self.sessions_created.get()
    }

    pub fn opened_external(&self) -> Vec<String> {
        self.opened_external.borrow().clone()
    }

    pub fn clipboard(&self) -> Option<String> {
        self.clipboard.borrow().clone()
    }
}

impl Default for MemoryHost {
    fn default() -> Self {
        Self::new()
    }
}

impl Host for MemoryHost {
    fn resolve_window(&self, origin: CallerOrigin) -> Option<WindowId> {
        self.windows.borrow().get(&origin).copied()
    }

    fn content(&self, surface_id: SurfaceId) -> Option<Rc<dyn ContentHandle>> {
        self.contents
            .borrow()
            .get(&surface_id)
            .map(|c| Rc::clone(c) as Rc<dyn ContentHandle>)
    }

    fn create_session(&self, partition: &Partition) -> Rc<dyn Session> {
        self.sessions_created.set(self.sessions_created.get() + 1);
        let store = if partition.is_durable() {
            self.store.clone()
        } else {
            None
        };
        Rc::new(MemorySession::open(partition.clone(), store))
    }

    fn open_external(&self, url: &str) -> Result<(), HostError> {
        self.opened_external.borrow_mut().push(url.to_string());
        Ok(())
    }

    fn write_clipboard(&self, text: &str) -> Result<(), HostError> {
        *self.clipboard.borrow_mut() = Some(text.to_string());
        Ok(())
    }
}

// =============================================================================
// CONTENT
// =============================================================================

struct History {
    entries: Vec<String>,
    index: usize,
}

impl History {
    fn current(&self) -> String {
        self.entries.get(self.index).cloned().unwrap_or_default()
    }
}

pub struct MemoryContent {
    id: ContentHandleId,
    surface_id: SurfaceId,
    listeners: RefCell<BTreeMap<ListenerId, Listener>>,
    next_listener: Cell<ListenerId>,
    history: RefCell<History>,
    scripts: RefCell<HashMap<String, Result<Value, HostError>>>,
    gate: RefCell<Option<Rc<Notify>>>,
    edits: RefCell<Vec<EditCommand>>,
    inspected: RefCell<Vec<(i32, i32)>>,
    reloads: Cell<usize>,
}

impl MemoryContent {
    fn new(id: ContentHandleId, surface_id: SurfaceId, url: &str) -> Self {
        Self {
            id,
            surface_id,
            listeners: RefCell::new(BTreeMap::new()),
            next_listener: Cell::new(1),
            history: RefCell::new(History {
                entries: vec![url.to_string()],
                index: 0,
            }),
            scripts: RefCell::new(HashMap::new()),
            gate: RefCell::new(None),
            edits: RefCell::new(Vec::new()),
            inspected: RefCell::new(Vec::new()),
            reloads: Cell::new(0),
        }
    }

    /// Deliver an event to every attached listener.
    ///
    /// Listeners are snapshotted first, so a listener may detach itself or
    /// others while running.
    pub fn emit(&self, event: ContentEvent) {
        let listeners: Vec<Listener> = self.listeners.borrow().values().cloned().collect();
        for listener in listeners {
            listener(&event);
        }
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.borrow().len()
    }

    pub fn set_script_result(&self, code: &str, result: Result<Value, HostError>) {
        self.scripts.borrow_mut().insert(code.to_string(), result);
    }

    /// Make scripts wait until the returned gate is notified.
    pub fn hold_scripts(&self) -> Rc<Notify> {
        let gate = Rc::new(Notify::new());
        *self.gate.borrow_mut() = Some(Rc::clone(&gate));
        gate
    }

    pub fn edits(&self) -> Vec<EditCommand> {
        self.edits.borrow().clone()
    }

    pub fn inspected(&self) -> Vec<(i32, i32)> {
        self.inspected.borrow().clone()
    }

    pub fn reloads(&self) -> usize {
        self.reloads.get()
    }

    /// Simulate a full navigation finishing: navigate + finish-load.
    pub fn finish_navigation(&self, url: &str) {
        self.emit(ContentEvent::DidNavigate { url: url.to_string() });
        self.emit(ContentEvent::DidFinishLoad { url: url.to_string() });
    }

    fn step(&self, delta: isize) -> Result<(), HostError> {
        let url = {
            let mut history = self.history.borrow_mut();
            let target = history.index as isize + delta;
            if target < 0 || target as usize >= history.entries.len() {
                return Err(HostError::Navigation("no history entry in that direction".into()));
            }
            history.index = target as usize;
            history.current()
        };
        self.finish_navigation(&url);
        Ok(())
    }
}

#[async_trait(?Send)]
impl ContentHandle for MemoryContent {
    fn id(&self) -> ContentHandleId {
        self.id
    }

    fn surface_id(&self) -> SurfaceId {
        self.surface_id
    }

    fn subscribe(&self, listener: Listener) -> ListenerId {
        let id = self.next_listener.get();
        self.next_listener.set(id + 1);
        self.listeners.borrow_mut().insert(id, listener);
        id
    }

    fn unsubscribe(&self, id: ListenerId) -> bool {
        self.listeners.borrow_mut().remove(&id).is_some()
    }

    fn url(&self) -> String {
        self.history.borrow().current()
    }

    fn can_go_back(&self) -> bool {
        self.history.borrow().index > 0
    }

    fn can_go_forward(&self) -> bool {
        let history = self.history.borrow();
        history.index + 1 < history.entries.len()
    }

    fn go_back(&self) -> Result<(), HostError> {
        self.step(-1)
    }

    fn go_forward(&self) -> Result<(), HostError> {
        self.step(1)
    }

    fn reload(&self) -> Result<(), HostError> {
        self.reloads.set(self.reloads.get() + 1);
        let url = self.url();
        self.emit(ContentEvent::DidFinishLoad { url });
        Ok(())
    }

    fn load_url(&self, url: &str) -> Result<(), HostError> {
        if url.is_empty() {
            return Err(HostError::Navigation("empty url".into()));
        }
        {
            let mut history = self.history.borrow_mut();
            let keep = history.index + 1;
            history.entries.truncate(keep);
            history.entries.push(url.to_string());
            history.index = keep;
        }
        self.finish_navigation(url);
        Ok(())
    }

    fn edit(&self, command: EditCommand) -> Result<(), HostError> {
        self.edits.borrow_mut().push(command);
        Ok(())
    }

    fn inspect_element(&self, x: i32, y: i32) -> Result<(), HostError> {
        self.inspected.borrow_mut().push((x, y));
        Ok(())
    }

    async fn execute_script(&self, code: &str) -> Result<Value, HostError> {
        let gate = self.gate.borrow().clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        self.scripts
            .borrow()
            .get(code)
            .cloned()
            .unwrap_or(Ok(Value::Null))
    }
}

// =============================================================================
// SESSION
// =============================================================================

pub struct MemorySession {
    partition: Partition,
    jar: RefCell<CookieJar>,
    store: Option<Arc<dyn KeyValueStore>>,
}

impl MemorySession {
    /// Open a session, loading saved cookies when backed by a store.
    pub fn open(partition: Partition, store: Option<Arc<dyn KeyValueStore>>) -> Self {
        let jar: CookieJar = store
            .as_ref()
            .and_then(|store| match store.get(&cookie_key(&partition)) {
                Ok(Some(value)) => serde_json::from_value(value)
                    .map_err(|e| warn!(%partition, error = %e, "saved cookies unreadable"))
                    .ok(),
                Ok(None) => None,
                Err(e) => {
                    warn!(%partition, error = %e, "failed to load saved cookies");
                    None
                }
            })
            .unwrap_or_default();
        Self {
            partition,
            jar: RefCell::new(jar),
            store,
        }
    }

    pub fn cookie_count(&self) -> usize {
        self.jar.borrow().len()
    }

    fn save(&self) -> Result<(), HostError> {
        let Some(store) = &self.store else {
            return Ok(());
        };
        let value = serde_json::to_value(&*self.jar.borrow())
            .map_err(|e| HostError::Cookie(e.to_string()))?;
        store
            .set(&cookie_key(&self.partition), value)
            .map_err(|e| HostError::Cookie(e.to_string()))
    }
}

fn cookie_key(partition: &Partition) -> String {
    format!("cookies:{partition}")
}

#[async_trait(?Send)]
impl Session for MemorySession {
    fn partition(&self) -> &Partition {
        &self.partition
    }

    async fn set_cookie(&self, cookie: Cookie) -> Result<(), HostError> {
        let cookie = cookie.normalized()?;
        self.jar.borrow_mut().set(cookie);
        self.save()
    }

    async fn get_cookies(&self, filter: &CookieFilter) -> Result<Vec<Cookie>, HostError> {
        Ok(self.jar.borrow().get(filter))
    }

    async fn remove_cookie(&self, url: &str, name: &str) -> Result<(), HostError> {
        let removed = self.jar.borrow_mut().remove(url, name)?;
        if removed > 0 {
            self.save()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tabweave_common::MemoryStore;

    #[test]
    fn spawned_ids_are_sequential_and_skip_explicit_ones() {
        let host = MemoryHost::new();
        assert_eq!(host.spawn_surface("about:blank").surface_id(), SurfaceId(1));
        host.spawn_surface_with_id(SurfaceId(7), "about:blank");
        assert_eq!(host.spawn_surface("about:blank").surface_id(), SurfaceId(8));
    }

    #[test]
    fn history_navigation() {
        let host = MemoryHost::new();
        let content = host.spawn_surface("https://a.test/1");
        assert!(!content.can_go_back());

        content.load_url("https://a.test/2").unwrap();
        content.load_url("https://a.test/3").unwrap();
        content.go_back().unwrap();
        assert_eq!(content.url(), "https://a.test/2");
        assert!(content.can_go_forward());

        content.load_url("https://a.test/x").unwrap();
        assert!(!content.can_go_forward());
        assert!(content.go_forward().is_err());
    }

    #[test]
    fn removed_surface_has_no_content() {
        let host = MemoryHost::new();
        let content = host.spawn_surface("about:blank");
        assert!(host.content(content.surface_id()).is_some());
        host.remove_surface(content.surface_id());
        assert!(host.content(content.surface_id()).is_none());
    }

    #[tokio::test]
    async fn unscripted_code_returns_null() {
        let host = MemoryHost::new();
        let content = host.spawn_surface("about:blank");
        assert_eq!(content.execute_script("anything").await, Ok(Value::Null));
    }

    #[tokio::test]
    async fn durable_session_cookies_survive_reopen() {
        let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        let host = MemoryHost::new().with_store(store.clone());
        let work = Partition::new("persist:work");

        let session = host.create_session(&work);
        session
            .set_cookie(Cookie::new("https://a.test", "sid", "1"))
            .await
            .unwrap();
        drop(session);

        let reopened = MemorySession::open(work, Some(store));
        assert_eq!(reopened.cookie_count(), 1);
    }

    #[tokio::test]
    async fn volatile_session_never_writes() {
        let store = Arc::new(MemoryStore::new());
        let host = MemoryHost::new().with_store(store.clone());

        let session = host.create_session(&Partition::new("memory:incognito-1"));
        session
            .set_cookie(Cookie::new("https://a.test", "sid", "1"))
            .await
            .unwrap();
        assert!(!store.has("cookies:memory:incognito-1").unwrap());
    }
}
