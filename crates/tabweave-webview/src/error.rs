use tabweave_common::{StoreError, SurfaceId, TabweaveError};
use thiserror::Error;

use crate::downloads::DownloadId;
use crate::host::CallerOrigin;

/// Errors raised by the coordinator side of the surface lifecycle.
#[derive(Debug, Error)]
pub enum WebViewError {
    /// Surface is not registered, or the host has no content for it yet.
    #[error("{0} not found")]
    NotFound(SurfaceId),

    #[error("no host window for caller {0}")]
    NoHostWindow(CallerOrigin),

    #[error("script execution failed: {0}")]
    ScriptExecution(String),

    #[error("session error: {0}")]
    Session(String),

    #[error("invalid content message: {0}")]
    InvalidMessage(String),

    #[error("download already in progress: {0}")]
    DuplicateDownload(String),

    #[error("unknown download: {0}")]
    UnknownDownload(DownloadId),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Failures reported by the embedding host's primitives.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HostError {
    #[error("{0}")]
    Script(String),

    #[error("{0}")]
    Cookie(String),

    #[error("{0}")]
    Navigation(String),

    #[error("{0} is not supported by this host")]
    Unsupported(&'static str),
}

impl From<HostError> for WebViewError {
    fn from(e: HostError) -> Self {
        match e {
            HostError::Script(msg) => Self::ScriptExecution(msg),
            other => Self::Session(other.to_string()),
        }
    }
}

impl From<WebViewError> for TabweaveError {
    fn from(e: WebViewError) -> Self {
        TabweaveError::WebView(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, WebViewError>;
