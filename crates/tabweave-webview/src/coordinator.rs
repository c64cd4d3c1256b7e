//! Privileged side of the relay: owns the surface registry, sessions and
//! downloads, and answers [`Command`]s from the UI.

use std::cell::RefCell;
use std::path::PathBuf;
use std::rc::Rc;
use std::sync::Arc;

use tabweave_common::{ContentHandleId, KeyValueStore, SurfaceId, WindowId};
use tracing::{debug, warn};

use crate::context_menu::{is_offered, view_source_url, ContextMenuParams, MenuAction};
use crate::cookies::{Cookie, CookieFilter};
use crate::downloads::{DownloadId, DownloadOutcome, DownloadRecord, DownloadTracker};
use crate::error::{Result, WebViewError};
use crate::events::{EventQueue, RelayEvent, RelayEventKind};
use crate::host::{CallerOrigin, Host};
use crate::partition::Partition;
use crate::protocol::{Command, Reply, ScriptOutcome};
use crate::registry::{SurfaceInfo, SurfaceRegistry};

pub struct Coordinator {
    registry: SurfaceRegistry,
    downloads: RefCell<DownloadTracker>,
}

impl Coordinator {
    pub fn new(
        host: Rc<dyn Host>,
        downloads_dir: impl Into<PathBuf>,
        store: Option<Arc<dyn KeyValueStore>>,
    ) -> Self {
        let events = EventQueue::new();
        Self {
            downloads: RefCell::new(DownloadTracker::new(downloads_dir, store, events.clone())),
            registry: SurfaceRegistry::new(host, events),
        }
    }

    pub fn registry(&self) -> &SurfaceRegistry {
        &self.registry
    }

    pub fn events(&self) -> &EventQueue {
        self.registry.events()
    }

    /// Pending outbound events, for the UI loop.
    pub fn drain_events(&self) -> Vec<RelayEvent> {
        self.registry.events().drain()
    }

    // -- Surfaces --

    pub fn create_surface(
        &self,
        origin: CallerOrigin,
        surface_id: SurfaceId,
        partition: Option<&str>,
    ) -> Result<ContentHandleId> {
        self.registry.create(origin, surface_id, partition)
    }

    pub fn destroy_surface(&self, surface_id: SurfaceId) -> bool {
        self.registry.destroy(surface_id)
    }

    pub async fn execute_script(&self, surface_id: SurfaceId, code: &str) -> ScriptOutcome {
        self.registry.execute_script(surface_id, code).await
    }

    pub fn surface_info(&self, surface_id: SurfaceId) -> Result<SurfaceInfo> {
        self.registry.lookup(surface_id)
    }

    pub fn session_partition(&self, surface_id: SurfaceId) -> Result<Partition> {
        self.registry.lookup(surface_id).map(|info| info.partition)
    }

    /// Tear down every surface. Sessions are kept.
    pub fn shutdown(&self) {
        let count = self.registry.count();
        self.registry.destroy_all();
        debug!(count, "all surfaces destroyed");
    }

    // -- Cookies --

    pub async fn set_cookie(&self, partition: &str, cookie: Cookie) -> Result<()> {
        let session = self.registry.session_for(&Partition::from_wire(partition));
        session.set_cookie(cookie).await?;
        Ok(())
    }

    pub async fn get_cookies(&self, partition: &str, filter: &CookieFilter) -> Result<Vec<Cookie>> {
        let session = self.registry.session_for(&Partition::from_wire(partition));
        Ok(session.get_cookies(filter).await?)
    }

    pub async fn remove_cookie(&self, partition: &str, url: &str, name: &str) -> Result<()> {
        let session = self.registry.session_for(&Partition::from_wire(partition));
        session.remove_cookie(url, name).await?;
        Ok(())
    }

    // -- Context menu --

    /// Carry out a menu item the user picked. `params` is the snapshot the
    /// menu was built from; actions it would not have offered are refused.
    pub fn context_menu_action(
        &self,
        surface_id: SurfaceId,
        action: MenuAction,
        params: &ContextMenuParams,
    ) -> Result<()> {
        let info = self.registry.lookup(surface_id)?;
        let content = self
            .registry
            .content(surface_id)
            .ok_or(WebViewError::NotFound(surface_id))?;

        let mut params = params.clone();
        params.can_go_back = content.can_go_back();
        params.can_go_forward = content.can_go_forward();
        if params.page_url.is_empty() {
            params.page_url = content.url();
        }
        if !is_offered(&params, action) {
            return Err(WebViewError::InvalidMessage(format!(
                "{action:?} is not available here"
            )));
        }

        debug!(%surface_id, ?action, "context menu action");
        let host = self.registry.host();
        match action {
            MenuAction::Back => content.go_back()?,
            MenuAction::Forward => content.go_forward()?,
            MenuAction::Reload => content.reload()?,
            MenuAction::Cut | MenuAction::Copy | MenuAction::Paste => {
                if let Some(command) = action.edit_command() {
                    content.edit(command)?;
                }
            }
            MenuAction::OpenLinkInNewTab => {
                self.registry.events().emit(
                    info.window,
                    Some(surface_id),
                    RelayEventKind::NewWindow {
                        url: params.link_url.clone(),
                    },
                );
            }
            MenuAction::OpenLinkExternally => host.open_external(&params.link_url)?,
            MenuAction::CopyLinkAddress => host.write_clipboard(&params.link_url)?,
            MenuAction::ViewSource => content.load_url(&view_source_url(&params.page_url))?,
            MenuAction::InspectElement => content.inspect_element(params.x, params.y)?,
        }
        Ok(())
    }

    // -- Downloads --

    pub fn download_started(
        &self,
        window: WindowId,
        url: &str,
        suggested_filename: &str,
        total_bytes: u64,
    ) -> Result<DownloadRecord> {
        self.downloads
            .borrow_mut()
            .start(window, url, suggested_filename, total_bytes)
    }

    pub fn download_progress(&self, id: DownloadId, received: u64, total: u64) -> Result<()> {
        self.downloads.borrow_mut().progress(id, received, total)
    }

    pub fn download_finished(&self, id: DownloadId, outcome: DownloadOutcome) -> Result<DownloadRecord> {
        self.downloads.borrow_mut().finish(id, outcome)
    }

    pub fn cancel_download(&self, id: DownloadId) -> Result<DownloadRecord> {
        self.downloads.borrow_mut().cancel(id)
    }

    pub fn active_download_for(&self, url: &str) -> Option<DownloadId> {
        self.downloads.borrow().find_active(url)
    }

    pub fn downloads(&self) -> Result<Vec<DownloadRecord>> {
        self.downloads.borrow().all()
    }

    // -- Command dispatch --

    /// Answer one command from the UI. Never panics and never returns an
    /// error: failures are folded into the reply.
    pub async fn dispatch(&self, origin: CallerOrigin, command: Command) -> Reply {
        let name = command.name();
        let reply = match command {
            Command::CreateSurface {
                surface_id,
                partition_id,
            } => self
                .create_surface(origin, surface_id, partition_id.as_deref())
                .map(Reply::created)
                .unwrap_or_else(failure),
            Command::DestroySurface { surface_id } => {
                self.destroy_surface(surface_id);
                Reply::ok()
            }
            Command::ExecuteScript { surface_id, code } => {
                self.execute_script(surface_id, &code).await.into()
            }
            Command::CookieSet {
                partition_id,
                cookie,
            } => self
                .set_cookie(&partition_id, cookie)
                .await
                .map(|()| Reply::ok())
                .unwrap_or_else(failure),
            Command::CookieGet {
                partition_id,
                filter,
            } => self
                .get_cookies(&partition_id, &filter)
                .await
                .map(Reply::cookies)
                .unwrap_or_else(failure),
            Command::CookieRemove {
                partition_id,
                url,
                name,
            } => self
                .remove_cookie(&partition_id, &url, &name)
                .await
                .map(|()| Reply::ok())
                .unwrap_or_else(failure),
            Command::GetSurfaceInfo { surface_id } => self
                .surface_info(surface_id)
                .map(|info| Reply::surface_info(info.content_handle_id, info.partition.as_str()))
                .unwrap_or_else(failure),
            Command::GetSession { surface_id } => self
                .session_partition(surface_id)
                .map(|partition| Reply::session(partition.as_str()))
                .unwrap_or_else(failure),
            Command::ContextMenuAction {
                surface_id,
                action,
                params,
            } => self
                .context_menu_action(surface_id, action, &params)
                .map(|()| Reply::ok())
                .unwrap_or_else(failure),
        };

        if !reply.success {
            warn!(
                command = name,
                %origin,
                reason = reply.message.as_deref().unwrap_or(""),
                "command failed"
            );
        }
        reply
    }
}

fn failure(e: WebViewError) -> Reply {
    Reply::failure(e.to_string())
}
