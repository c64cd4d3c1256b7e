//! Commands the UI sends to the coordinator, and the replies it gets back.
//!
//! Both sides are JSON: a kebab-case `kind` tag with camelCase fields.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tabweave_common::{ContentHandleId, SurfaceId};

use crate::context_menu::{ContextMenuParams, MenuAction};
use crate::cookies::{Cookie, CookieFilter};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case", rename_all_fields = "camelCase")]
pub enum Command {
    CreateSurface {
        surface_id: SurfaceId,
        #[serde(default)]
        partition_id: Option<String>,
    },
    DestroySurface {
        surface_id: SurfaceId,
    },
    ExecuteScript {
        surface_id: SurfaceId,
        code: String,
    },
    CookieSet {
        partition_id: String,
        cookie: Cookie,
    },
    CookieGet {
        partition_id: String,
        #[serde(default)]
        filter: CookieFilter,
    },
    CookieRemove {
        partition_id: String,
        url: String,
        name: String,
    },
    GetSurfaceInfo {
        surface_id: SurfaceId,
    },
    GetSession {
        surface_id: SurfaceId,
    },
    ContextMenuAction {
        surface_id: SurfaceId,
        action: MenuAction,
        #[serde(default)]
        params: ContextMenuParams,
    },
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Self::CreateSurface { .. } => "create-surface",
            Self::DestroySurface { .. } => "destroy-surface",
            Self::ExecuteScript { .. } => "execute-script",
            Self::CookieSet { .. } => "cookie-set",
            Self::CookieGet { .. } => "cookie-get",
            Self::CookieRemove { .. } => "cookie-remove",
            Self::GetSurfaceInfo { .. } => "get-surface-info",
            Self::GetSession { .. } => "get-session",
            Self::ContextMenuAction { .. } => "context-menu-action",
        }
    }
}

/// Structured answer to every [`Command`]. Failures never panic or throw;
/// they come back with `success: false` and a message.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reply {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cookies: Option<Vec<Cookie>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_handle_id: Option<ContentHandleId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub partition_id: Option<String>,
}

impl Reply {
    pub fn ok() -> Self {
        Self {
            success: true,
            ..Default::default()
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: Some(message.into()),
            ..Default::default()
        }
    }

    pub fn created(id: ContentHandleId) -> Self {
        Self {
            content_handle_id: Some(id),
            ..Self::ok()
        }
    }

    pub fn cookies(cookies: Vec<Cookie>) -> Self {
        Self {
            cookies: Some(cookies),
            ..Self::ok()
        }
    }

    pub fn surface_info(id: ContentHandleId, partition: impl Into<String>) -> Self {
        Self {
            content_handle_id: Some(id),
            partition_id: Some(partition.into()),
            ..Self::ok()
        }
    }

    pub fn session(partition: impl Into<String>) -> Self {
        Self {
            partition_id: Some(partition.into()),
            ..Self::ok()
        }
    }
}

/// Result of running script in a surface.
#[derive(Debug, Clone, PartialEq)]
pub enum ScriptOutcome {
    Success(Value),
    Failure(String),
}

impl ScriptOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }
}

impl From<ScriptOutcome> for Reply {
    fn from(outcome: ScriptOutcome) -> Self {
        match outcome {
            ScriptOutcome::Success(value) => Reply {
                result: Some(value),
                ..Reply::ok()
            },
            ScriptOutcome::Failure(message) => Reply::failure(message),
        }
    }
}
