use tabweave_common::{SurfaceId, TabId, TabweaveError};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TabError {
    #[error("tab {0} not found")]
    NotFound(TabId),

    /// Event from a surface that no live tab is bound to.
    #[error("no tab is bound to {0}")]
    StaleEvent(SurfaceId),

    /// The last tab was closed; the controller accepts no more tabs.
    #[error("window is closed")]
    WindowClosed,

    #[error("tab order does not match the open tabs")]
    InvalidOrder,

    #[error("empty url")]
    EmptyUrl,
}

impl From<TabError> for TabweaveError {
    fn from(e: TabError) -> Self {
        TabweaveError::Tab(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, TabError>;
