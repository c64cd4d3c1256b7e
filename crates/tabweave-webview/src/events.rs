//! Events relayed from surfaces (and the download tracker) to the UI.

use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};
use tabweave_common::{SurfaceId, WindowId};

use crate::context_menu::{ContextMenuParams, MenuItem};
use crate::downloads::{DownloadId, DownloadRecord};

/// One outbound notification, addressed to the window that owns the
/// originating surface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelayEvent {
    pub window: WindowId,
    /// `None` for events that do not come from a surface (downloads).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub surface_id: Option<SurfaceId>,
    #[serde(flatten)]
    pub kind: RelayEventKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case", rename_all_fields = "camelCase")]
pub enum RelayEventKind {
    FinishLoad {
        url: String,
    },
    FailLoad {
        code: i32,
        description: String,
        url: String,
    },
    TitleUpdated {
        title: String,
    },
    FaviconUpdated {
        urls: Vec<String>,
    },
    DidNavigate {
        url: String,
    },
    DidNavigateInPage {
        url: String,
    },
    ContextMenu {
        menu: Vec<MenuItem>,
        params: ContextMenuParams,
    },
    /// Page asked for a new tab (window.open, target=_blank, menu item).
    NewWindow {
        url: String,
    },
    /// In-page URL change reported by page script (pushState, hash).
    UrlChanged {
        url: String,
    },
    TitleChanged {
        title: String,
    },
    DownloadStarted {
        download: DownloadRecord,
    },
    DownloadProgress {
        id: DownloadId,
        received_bytes: u64,
        total_bytes: u64,
    },
    DownloadCompleted {
        download: DownloadRecord,
    },
    DownloadCancelled {
        id: DownloadId,
    },
    DownloadInterrupted {
        download: DownloadRecord,
    },
}

impl RelayEventKind {
    pub fn name(&self) -> &'static str {
        match self {
            Self::FinishLoad { .. } => "finish-load",
            Self::FailLoad { .. } => "fail-load",
            Self::TitleUpdated { .. } => "title-updated",
            Self::FaviconUpdated { .. } => "favicon-updated",
            Self::DidNavigate { .. } => "did-navigate",
            Self::DidNavigateInPage { .. } => "did-navigate-in-page",
            Self::ContextMenu { .. } => "context-menu",
            Self::NewWindow { .. } => "new-window",
            Self::UrlChanged { .. } => "url-changed",
            Self::TitleChanged { .. } => "title-changed",
            Self::DownloadStarted { .. } => "download-started",
            Self::DownloadProgress { .. } => "download-progress",
            Self::DownloadCompleted { .. } => "download-completed",
            Self::DownloadCancelled { .. } => "download-cancelled",
            Self::DownloadInterrupted { .. } => "download-interrupted",
        }
    }
}

/// Shared sink that listeners push into and the UI loop drains.
#[derive(Debug, Clone, Default)]
pub struct EventQueue {
    events: Arc<Mutex<Vec<RelayEvent>>>,
}

impl EventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, event: RelayEvent) {
        match self.events.lock() {
            Ok(mut events) => events.push(event),
            Err(poisoned) => poisoned.into_inner().push(event),
        }
    }

    pub fn emit(&self, window: WindowId, surface_id: Option<SurfaceId>, kind: RelayEventKind) {
        self.push(RelayEvent {
            window,
            surface_id,
            kind,
        });
    }

    /// Take every pending event, oldest first.
    pub fn drain(&self) -> Vec<RelayEvent> {
        match self.events.lock() {
            Ok(mut events) => std::mem::take(&mut *events),
            Err(poisoned) => std::mem::take(&mut *poisoned.into_inner()),
        }
    }

    pub fn len(&self) -> usize {
        match self.events.lock() {
            Ok(events) => events.len(),
            Err(poisoned) => poisoned.into_inner().len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
