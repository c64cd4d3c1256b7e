//! Listeners that turn raw [`ContentEvent`]s into [`RelayEvent`]s.
//!
//! Every registered surface gets the same three listeners: direct
//! navigation events, page-script messages, and the context menu. Each is
//! returned as a [`Subscription`] so the registry can detach them by
//! dropping.
//!
//! [`RelayEvent`]: crate::events::RelayEvent

use std::rc::{Rc, Weak};

use tabweave_common::{SurfaceId, WindowId};
use tracing::{debug, warn};

use crate::context_menu::build_menu;
use crate::events::{EventQueue, RelayEventKind};
use crate::host::{ContentEvent, ContentHandle, Subscription};
use crate::ipc::parse_content_message;

/// Attach the full listener set for a surface owned by `window`.
pub fn attach_listeners(
    content: &Rc<dyn ContentHandle>,
    window: WindowId,
    events: &EventQueue,
) -> Vec<Subscription> {
    let surface_id = content.surface_id();
    vec![
        attach_navigation(content, window, surface_id, events.clone()),
        attach_content_messages(content, window, surface_id, events.clone()),
        attach_context_menu(content, window, surface_id, events.clone()),
    ]
}

fn attach_navigation(
    content: &Rc<dyn ContentHandle>,
    window: WindowId,
    surface_id: SurfaceId,
    events: EventQueue,
) -> Subscription {
    Subscription::attach(
        content,
        Rc::new(move |event: &ContentEvent| {
            let kind = match event {
                ContentEvent::DidFinishLoad { url } => RelayEventKind::FinishLoad { url: url.clone() },
                ContentEvent::DidFailLoad {
                    code,
                    description,
                    url,
                } => RelayEventKind::FailLoad {
                    code: *code,
                    description: description.clone(),
                    url: url.clone(),
                },
                ContentEvent::PageTitleUpdated { title } => {
                    RelayEventKind::TitleUpdated { title: title.clone() }
                }
                ContentEvent::PageFaviconUpdated { urls } => {
                    RelayEventKind::FaviconUpdated { urls: urls.clone() }
                }
                ContentEvent::DidNavigate { url } => RelayEventKind::DidNavigate { url: url.clone() },
                ContentEvent::DidNavigateInPage { url } => {
                    RelayEventKind::DidNavigateInPage { url: url.clone() }
                }
                ContentEvent::IpcMessage { .. } | ContentEvent::ContextMenu(_) => return,
            };
            events.emit(window, Some(surface_id), kind);
        }),
    )
}

fn attach_content_messages(
    content: &Rc<dyn ContentHandle>,
    window: WindowId,
    surface_id: SurfaceId,
    events: EventQueue,
) -> Subscription {
    Subscription::attach(
        content,
        Rc::new(move |event: &ContentEvent| {
            let ContentEvent::IpcMessage { body } = event else {
                return;
            };
            match parse_content_message(body) {
                Ok(kind) => {
                    debug!(%surface_id, kind = kind.name(), "content message relayed");
                    events.emit(window, Some(surface_id), kind);
                }
                Err(e) => {
                    warn!(%surface_id, body_len = body.len(), error = %e, "content message rejected");
                }
            }
        }),
    )
}

/// The listener holds the content weakly: the content owns its listeners,
/// so a strong reference here would keep it alive forever.
fn attach_context_menu(
    content: &Rc<dyn ContentHandle>,
    window: WindowId,
    surface_id: SurfaceId,
    events: EventQueue,
) -> Subscription {
    let weak: Weak<dyn ContentHandle> = Rc::downgrade(content);
    Subscription::attach(
        content,
        Rc::new(move |event: &ContentEvent| {
            let ContentEvent::ContextMenu(params) = event else {
                return;
            };
            let mut params = params.clone();
            if let Some(content) = weak.upgrade() {
                params.can_go_back = content.can_go_back();
                params.can_go_forward = content.can_go_forward();
                if params.page_url.is_empty() {
                    params.page_url = content.url();
                }
            }
            debug!(%surface_id, x = params.x, y = params.y, "context menu requested");
            events.emit(
                window,
                Some(surface_id),
                RelayEventKind::ContextMenu {
                    menu: build_menu(&params),
                    params,
                },
            );
        }),
    )
}
