//! The seam between the coordinator and whatever actually renders pages.
//!
//! A host owns the real content processes. The coordinator only ever sees
//! them through these traits, which keeps the lifecycle logic testable
//! against [`crate::memory_host::MemoryHost`] and lets the `wry` feature
//! plug in real webviews.
//!
//! Handles are shared as `Rc` and the traits carry no `Send` bound:
//! native webviews must stay on the thread that created them.

mod subscription;

use std::fmt;
use std::rc::Rc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tabweave_common::{ContentHandleId, SurfaceId, WindowId};

use crate::context_menu::{ContextMenuParams, EditCommand};
use crate::cookies::{Cookie, CookieFilter};
use crate::error::HostError;
use crate::partition::Partition;

pub use subscription::Subscription;

pub type ListenerId = u64;

/// Callback attached to a content handle. Invoked synchronously, on the
/// host's thread, for every [`ContentEvent`].
pub type Listener = Rc<dyn Fn(&ContentEvent)>;

/// Identifies the UI frame that sent a command, so the coordinator can
/// find the window it lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CallerOrigin(pub u32);

impl fmt::Display for CallerOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "caller-{}", self.0)
    }
}

/// Raw events emitted by a surface's content.
#[derive(Debug, Clone, PartialEq)]
pub enum ContentEvent {
    DidFinishLoad { url: String },
    DidFailLoad { code: i32, description: String, url: String },
    PageTitleUpdated { title: String },
    PageFaviconUpdated { urls: Vec<String> },
    DidNavigate { url: String },
    DidNavigateInPage { url: String },
    /// Message posted by page script. Untrusted.
    IpcMessage { body: String },
    ContextMenu(ContextMenuParams),
}

/// Content backing one rendering surface.
#[async_trait(?Send)]
pub trait ContentHandle {
    fn id(&self) -> ContentHandleId;
    fn surface_id(&self) -> SurfaceId;

    fn subscribe(&self, listener: Listener) -> ListenerId;
    /// Returns `false` if the listener was already gone.
    fn unsubscribe(&self, id: ListenerId) -> bool;

    fn url(&self) -> String;
    fn can_go_back(&self) -> bool;
    fn can_go_forward(&self) -> bool;
    fn go_back(&self) -> Result<(), HostError>;
    fn go_forward(&self) -> Result<(), HostError>;
    fn reload(&self) -> Result<(), HostError>;
    fn load_url(&self, url: &str) -> Result<(), HostError>;
    fn edit(&self, command: EditCommand) -> Result<(), HostError>;
    fn inspect_element(&self, x: i32, y: i32) -> Result<(), HostError>;

    /// Evaluate `code` in the page and return its JSON result.
    async fn execute_script(&self, code: &str) -> Result<Value, HostError>;
}

/// A storage/cookie context shared by every surface on one partition.
#[async_trait(?Send)]
pub trait Session {
    fn partition(&self) -> &Partition;

    async fn set_cookie(&self, cookie: Cookie) -> Result<(), HostError>;
    async fn get_cookies(&self, filter: &CookieFilter) -> Result<Vec<Cookie>, HostError>;
    async fn remove_cookie(&self, url: &str, name: &str) -> Result<(), HostError>;
}

/// The embedding environment: windows, content lookup and session creation.
pub trait Host {
    fn resolve_window(&self, origin: CallerOrigin) -> Option<WindowId>;

    /// Content for a surface id the host assigned, if it still exists.
    fn content(&self, surface_id: SurfaceId) -> Option<Rc<dyn ContentHandle>>;

    /// Called at most once per partition by the session registry.
    fn create_session(&self, partition: &Partition) -> Rc<dyn Session>;

    fn open_external(&self, url: &str) -> Result<(), HostError>;
    fn write_clipboard(&self, text: &str) -> Result<(), HostError>;
}
