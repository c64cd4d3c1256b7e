//! Work the controller asks its caller to carry out.

use serde::{Deserialize, Serialize};
use tabweave_common::{SurfaceId, TabId};
use tabweave_webview::{Command, Partition};

use crate::history::HistoryEntry;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case", rename_all_fields = "camelCase")]
pub enum Effect {
    /// Boot a rendering surface for a tab. The host answers with a ready
    /// signal carrying the surface id.
    SpawnSurface {
        tab_id: TabId,
        url: String,
        partition: Partition,
        visible: bool,
    },
    CreateSurface {
        tab_id: TabId,
        surface_id: SurfaceId,
        partition: Partition,
    },
    DestroySurface {
        surface_id: SurfaceId,
    },
    Navigate {
        surface_id: SurfaceId,
        url: String,
        visible: bool,
    },
    GoBack {
        surface_id: SurfaceId,
    },
    GoForward {
        surface_id: SurfaceId,
    },
    Reload {
        surface_id: SurfaceId,
    },
    /// Read the current document title; answer with
    /// [`TabController::on_title_polled`](crate::TabController::on_title_polled).
    QueryTitle {
        tab_id: TabId,
        surface_id: SurfaceId,
    },
    WriteHistory {
        tab_id: TabId,
        entry: HistoryEntry,
    },
    CloseWindow,
}

impl Effect {
    /// The coordinator command for effects that map onto one.
    pub fn to_command(&self) -> Option<Command> {
        match self {
            Self::CreateSurface {
                surface_id,
                partition,
                ..
            } => Some(Command::CreateSurface {
                surface_id: *surface_id,
                partition_id: Some(partition.as_str().to_string()),
            }),
            Self::DestroySurface { surface_id } => Some(Command::DestroySurface {
                surface_id: *surface_id,
            }),
            _ => None,
        }
    }
}
