//! Host backed by real `wry` webviews.
//!
//! wry callbacks run on the event-loop thread but must be `Send`, so they
//! only push into per-surface inboxes. The UI loop calls [`WryHost::pump`]
//! to hand those events to listeners, the same drain pattern the rest of
//! the relay uses.
//!
//! Limits of this host: wry only reads cookies, through a live webview on
//! the partition, so cookie writes return [`HostError::Unsupported`];
//! back/forward availability is not reported, so both are assumed possible.

use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;
use std::rc::{Rc, Weak};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::Value;
use tabweave_common::{ContentHandleId, SurfaceId, WindowId};
use tracing::{debug, warn};
use wry::raw_window_handle;
use wry::{PageLoadEvent, WebContext, WebView, WebViewBuilder};

use crate::context_menu::{ContextMenuParams, EditCommand};
use crate::cookies::{Cookie, CookieFilter};
use crate::downloads::{sanitize_filename, unique_save_path};
use crate::error::HostError;
use crate::host::{CallerOrigin, ContentEvent, ContentHandle, Host, Listener, ListenerId, Session};
use crate::ipc::{ContentMessage, CONTENT_INIT_SCRIPT};
use crate::partition::Partition;

const CONTEXT_MENU_CHANNEL: &str = "__tabweave-context-menu";

const CONTEXT_MENU_SCRIPT: &str = r#"
(function() {
    document.addEventListener('contextmenu', function(e) {
        e.preventDefault();
        var t = e.target || {};
        var link = t.closest ? t.closest('a[href]') : null;
        var editable = !!(t.isContentEditable || t.tagName === 'INPUT' || t.tagName === 'TEXTAREA');
        var selection = String(window.getSelection() || '');
        window.ipc.postMessage(JSON.stringify({
            channel: '__tabweave-context-menu',
            args: [{
                x: e.clientX, y: e.clientY,
                linkUrl: link ? link.href : '',
                pageUrl: location.href,
                selectionText: selection,
                isEditable: editable,
                editFlags: { canCut: editable && selection.length > 0, canCopy: selection.length > 0, canPaste: editable }
            }]
        }));
    }, true);
})();
"#;

/// A download reported by a webview, waiting for the UI loop.
#[derive(Debug, Clone, PartialEq)]
pub enum DownloadNotice {
    Started {
        window: WindowId,
        url: String,
        save_path: PathBuf,
    },
    Finished {
        url: String,
        success: bool,
    },
}

/// Where and how a new surface should be created.
pub struct SurfaceOptions<'a> {
    pub url: &'a str,
    pub partition: &'a Partition,
    pub window: WindowId,
    pub bounds: wry::Rect,
    pub visible: bool,
}

type Inbox = Arc<Mutex<Vec<ContentEvent>>>;
type Contents = RefCell<BTreeMap<SurfaceId, Rc<WryContent>>>;

pub struct WryHost {
    windows: RefCell<HashMap<CallerOrigin, WindowId>>,
    contents: Rc<Contents>,
    contexts: RefCell<HashMap<Partition, WebContext>>,
    downloads: Arc<Mutex<Vec<DownloadNotice>>>,
    downloads_dir: PathBuf,
    user_agent: Option<String>,
    next_content: Cell<u32>,
}

impl WryHost {
    pub fn new(downloads_dir: PathBuf, user_agent: Option<String>) -> Self {
        Self {
            windows: RefCell::new(HashMap::new()),
            contents: Rc::new(RefCell::new(BTreeMap::new())),
            contexts: RefCell::new(HashMap::new()),
            downloads: Arc::new(Mutex::new(Vec::new())),
            downloads_dir,
            user_agent,
            next_content: Cell::new(1),
        }
    }

    pub fn add_window(&self, origin: CallerOrigin, window: WindowId) {
        self.windows.borrow_mut().insert(origin, window);
    }

    /// Build a child webview in `parent` and register it under `surface_id`.
    ///
    /// Durable partitions get an on-disk web context shared by every
    /// surface on that partition; everything else is incognito.
    pub fn create_surface<W: raw_window_handle::HasWindowHandle>(
        &self,
        surface_id: SurfaceId,
        parent: &W,
        options: SurfaceOptions<'_>,
    ) -> Result<Rc<WryContent>, wry::Error> {
        let inbox: Inbox = Arc::new(Mutex::new(Vec::new()));
        let mut contexts = self.contexts.borrow_mut();

        let mut builder = if options.partition.is_durable() {
            if !contexts.contains_key(options.partition) {
                let dir = tabweave_platform::partition_data_dir(options.partition.as_str())
                    .map_err(|e| warn!(partition = %options.partition, error = %e, "no data dir for partition"))
                    .ok();
                contexts.insert(options.partition.clone(), WebContext::new(dir));
            }
            match contexts.get_mut(options.partition) {
                Some(context) => WebViewBuilder::with_web_context(context),
                None => WebViewBuilder::new().with_incognito(true),
            }
        } else {
            WebViewBuilder::new().with_incognito(true)
        };

        builder = builder
            .with_bounds(options.bounds)
            .with_visible(options.visible)
            .with_devtools(true)
            .with_focused(false)
            .with_initialization_script(CONTENT_INIT_SCRIPT)
            .with_initialization_script(CONTEXT_MENU_SCRIPT)
            .with_url(options.url);

        if let Some(ua) = &self.user_agent {
            builder = builder.with_user_agent(ua);
        }

        let ipc_inbox = Arc::clone(&inbox);
        builder = builder.with_ipc_handler(move |request| {
            let body = request.body().to_string();
            push(&ipc_inbox, ipc_event(body));
        });

        let load_inbox = Arc::clone(&inbox);
        builder = builder.with_on_page_load_handler(move |event, url| match event {
            PageLoadEvent::Started => push(&load_inbox, ContentEvent::DidNavigate { url }),
            PageLoadEvent::Finished => push(&load_inbox, ContentEvent::DidFinishLoad { url }),
        });

        let title_inbox = Arc::clone(&inbox);
        builder = builder.with_document_title_changed_handler(move |title| {
            push(&title_inbox, ContentEvent::PageTitleUpdated { title });
        });

        let window = options.window;
        let dir = self.downloads_dir.clone();
        let started = Arc::clone(&self.downloads);
        builder = builder.with_download_started_handler(move |url, path| {
            let suggested = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            *path = unique_save_path(&dir, &sanitize_filename(&suggested), |p| p.exists());
            if let Ok(mut notices) = started.lock() {
                notices.push(DownloadNotice::Started {
                    window,
                    url,
                    save_path: path.clone(),
                });
            }
            true
        });

        let finished = Arc::clone(&self.downloads);
        builder = builder.with_download_completed_handler(move |url, _path, success| {
            if let Ok(mut notices) = finished.lock() {
                notices.push(DownloadNotice::Finished { url, success });
            }
        });

        let webview = builder.build_as_child(parent)?;
        drop(contexts);

        let id = ContentHandleId(self.next_content.get());
        self.next_content.set(id.0 + 1);
        let content = Rc::new(WryContent {
            id,
            surface_id,
            partition: options.partition.clone(),
            webview,
            inbox,
            url: RefCell::new(options.url.to_string()),
            listeners: RefCell::new(BTreeMap::new()),
            next_listener: Cell::new(1),
        });
        self.contents
            .borrow_mut()
            .insert(surface_id, Rc::clone(&content));
        debug!(%surface_id, partition = %options.partition, "webview created");
        Ok(content)
    }

    /// Drop the webview for a surface.
    pub fn remove_surface(&self, surface_id: SurfaceId) -> bool {
        self.contents.borrow_mut().remove(&surface_id).is_some()
    }

    /// Deliver queued webview events to listeners.
    pub fn pump(&self) {
        let contents: Vec<_> = self.contents.borrow().values().cloned().collect();
        for content in contents {
            content.pump();
        }
    }

    pub fn drain_downloads(&self) -> Vec<DownloadNotice> {
        match self.downloads.lock() {
            Ok(mut notices) => std::mem::take(&mut *notices),
            Err(_) => Vec::new(),
        }
    }
}

fn push(inbox: &Inbox, event: ContentEvent) {
    if let Ok(mut events) = inbox.lock() {
        events.push(event);
    }
}

fn ipc_event(body: String) -> ContentEvent {
    if let Some(msg) = ContentMessage::from_json(&body) {
        if msg.channel == CONTEXT_MENU_CHANNEL {
            let params = msg
                .args
                .into_iter()
                .next()
                .and_then(|v| serde_json::from_value::<ContextMenuParams>(v).ok())
                .unwrap_or_default();
            return ContentEvent::ContextMenu(params);
        }
    }
    ContentEvent::IpcMessage { body }
}

impl Host for WryHost {
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
        Rc::new(WrySession {
            partition: partition.clone(),
            contents: Rc::downgrade(&self.contents),
        })
    }

    fn open_external(&self, url: &str) -> Result<(), HostError> {
        debug!(url, "open external requested");
        Err(HostError::Unsupported("opening external links"))
    }

    fn write_clipboard(&self, _text: &str) -> Result<(), HostError> {
        Err(HostError::Unsupported("clipboard access"))
    }
}

pub struct WryContent {
    id: ContentHandleId,
    surface_id: SurfaceId,
    partition: Partition,
    webview: WebView,
    inbox: Inbox,
    url: RefCell<String>,
    listeners: RefCell<BTreeMap<ListenerId, Listener>>,
    next_listener: Cell<ListenerId>,
}

impl WryContent {
    fn pump(&self) {
        let events = match self.inbox.lock() {
            Ok(mut events) => std::mem::take(&mut *events),
            Err(_) => return,
        };
        for event in events {
            if let ContentEvent::DidNavigate { url } | ContentEvent::DidFinishLoad { url } = &event {
                *self.url.borrow_mut() = url.clone();
            }
            let listeners: Vec<Listener> = self.listeners.borrow().values().cloned().collect();
            for listener in listeners {
                listener(&event);
            }
        }
    }

    pub fn set_visible(&self, visible: bool) -> Result<(), wry::Error> {
        self.webview.set_visible(visible)
    }

    pub fn set_bounds(&self, bounds: wry::Rect) -> Result<(), wry::Error> {
        self.webview.set_bounds(bounds)
    }

    fn run(&self, js: &str) -> Result<(), HostError> {
        self.webview
            .evaluate_script(js)
            .map_err(|e| HostError::Navigation(e.to_string()))
    }
}

#[async_trait(?Send)]
impl ContentHandle for WryContent {
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
        self.url.borrow().clone()
    }

    fn can_go_back(&self) -> bool {
        true
    }

    fn can_go_forward(&self) -> bool {
        true
    }

    fn go_back(&self) -> Result<(), HostError> {
        self.run("history.back()")
    }

    fn go_forward(&self) -> Result<(), HostError> {
        self.run("history.forward()")
    }

    fn reload(&self) -> Result<(), HostError> {
        self.run("location.reload()")
    }

    fn load_url(&self, url: &str) -> Result<(), HostError> {
        *self.url.borrow_mut() = url.to_string();
        self.webview
            .load_url(url)
            .map_err(|e| HostError::Navigation(e.to_string()))
    }

    fn edit(&self, command: EditCommand) -> Result<(), HostError> {
        let name = match command {
            EditCommand::Cut => "cut",
            EditCommand::Copy => "copy",
            EditCommand::Paste => "paste",
        };
        self.run(&format!("document.execCommand('{name}')"))
    }

    fn inspect_element(&self, _x: i32, _y: i32) -> Result<(), HostError> {
        self.webview.open_devtools();
        Ok(())
    }

    async fn execute_script(&self, code: &str) -> Result<Value, HostError> {
        let code_json =
            serde_json::to_string(code).map_err(|e| HostError::Script(e.to_string()))?;
        let wrapped = format!(
            "(function() {{ try {{ return {{ ok: true, value: (0, eval)({code_json}) }}; }} \
             catch (e) {{ return {{ ok: false, error: String(e) }}; }} }})()"
        );

        let (tx, rx) = tokio::sync::oneshot::channel::<String>();
        let tx = Mutex::new(Some(tx));
        self.webview
            .evaluate_script_with_callback(&wrapped, move |raw| {
                if let Some(tx) = tx.lock().ok().and_then(|mut t| t.take()) {
                    let _ = tx.send(raw);
                }
            })
            .map_err(|e| HostError::Script(e.to_string()))?;

        let raw = rx
            .await
            .map_err(|_| HostError::Script("webview dropped the script result".into()))?;
        let envelope: Value =
            serde_json::from_str(&raw).map_err(|e| HostError::Script(e.to_string()))?;
        if envelope["ok"].as_bool() == Some(true) {
            Ok(envelope.get("value").cloned().unwrap_or(Value::Null))
        } else {
            Err(HostError::Script(
                envelope["error"].as_str().unwrap_or("script failed").to_string(),
            ))
        }
    }
}

struct WrySession {
    partition: Partition,
    contents: Weak<Contents>,
}

impl WrySession {
    /// Any live webview on this partition. Cookie reads go through it.
    fn surface(&self) -> Option<Rc<WryContent>> {
        let contents = self.contents.upgrade()?;
        let found = contents
            .borrow()
            .values()
            .find(|c| c.partition == self.partition)
            .cloned();
        found
    }
}

/// Convert a cookie read from the webview's store.
fn cookie_from_wry(cookie: &wry::cookie::Cookie<'_>) -> Cookie {
    let domain = cookie
        .domain()
        .map(|d| d.trim_start_matches('.').to_ascii_lowercase())
        .filter(|d| !d.is_empty());
    let path = cookie.path().unwrap_or("/").to_string();
    let secure = cookie.secure().unwrap_or(false);
    let url = match &domain {
        Some(domain) => {
            let scheme = if secure { "https" } else { "http" };
            format!("{scheme}://{domain}{path}")
        }
        None => String::new(),
    };
    Cookie {
        url,
        name: cookie.name().to_string(),
        value: cookie.value().to_string(),
        domain,
        path: Some(path),
        secure,
        http_only: cookie.http_only().unwrap_or(false),
        expiration_date: cookie.expires_datetime().map(|t| t.unix_timestamp() as f64),
    }
}

#[async_trait(?Send)]
impl Session for WrySession {
    fn partition(&self) -> &Partition {
        &self.partition
    }

    async fn set_cookie(&self, _cookie: Cookie) -> Result<(), HostError> {
        Err(HostError::Unsupported("cookie writes"))
    }

    async fn get_cookies(&self, filter: &CookieFilter) -> Result<Vec<Cookie>, HostError> {
        let Some(content) = self.surface() else {
            return Err(HostError::Cookie(format!(
                "no live surface on {} to read cookies from",
                self.partition
            )));
        };
        let raw = match filter.url.as_deref() {
            Some(url) => content.webview.cookies_for_url(url),
            None => content.webview.cookies(),
        }
        .map_err(|e| HostError::Cookie(e.to_string()))?;
        Ok(raw
            .iter()
            .map(cookie_from_wry)
            .filter(|c| filter.matches(c))
            .collect())
    }

    async fn remove_cookie(&self, _url: &str, _name: &str) -> Result<(), HostError> {
        Err(HostError::Unsupported("cookie writes"))
    }
}
