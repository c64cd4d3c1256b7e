//! Tab metadata and the URL helpers that derive titles and favicons.

use serde::{Deserialize, Serialize};
use tabweave_common::{SurfaceId, TabId};
use tabweave_webview::Partition;
use url::Url;

/// Lifecycle of one tab.
///
/// `Created → SurfaceBinding → Bound → Closing → Gone`. A `Bound` tab may
/// go back through `Bound` when a new ready signal replaces its surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TabState {
    Created,
    SurfaceBinding,
    Bound,
    Closing,
    Gone,
}

impl TabState {
    pub fn is_live(&self) -> bool {
        !matches!(self, Self::Closing | Self::Gone)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tab {
    pub id: TabId,
    pub url: String,
    pub title: String,
    pub favicon: Option<String>,
    pub incognito: bool,
    pub partition: Partition,
    pub surface: Option<SurfaceId>,
    pub state: TabState,
    /// Navigation requested before the surface was bound.
    #[serde(skip)]
    pub(crate) pending_url: Option<String>,
}

impl Tab {
    pub fn new(
        id: TabId,
        url: impl Into<String>,
        title: impl Into<String>,
        incognito: bool,
        partition: Partition,
    ) -> Self {
        Self {
            id,
            url: url.into(),
            title: title.into(),
            favicon: None,
            incognito,
            partition,
            surface: None,
            state: TabState::Created,
            pending_url: None,
        }
    }

    pub fn is_bound(&self) -> bool {
        self.state == TabState::Bound && self.surface.is_some()
    }

    /// Title to record for this tab: the page title, else the URL.
    pub fn display_title(&self) -> &str {
        if self.title.trim().is_empty() {
            &self.url
        } else {
            &self.title
        }
    }
}

/// URLs a surface reports while it has nothing real to show.
pub fn is_placeholder_url(url: &str) -> bool {
    url.is_empty() || url == "about:blank"
}

/// `<origin>/favicon.ico` for URLs with a network origin.
pub fn favicon_for_url(url: &str) -> Option<String> {
    if is_placeholder_url(url) {
        return None;
    }
    let parsed = Url::parse(url).ok()?;
    let origin = parsed.origin();
    if !origin.is_tuple() {
        return None;
    }
    Some(format!("{}/favicon.ico", origin.ascii_serialization()))
}

/// Host part of a URL, or the URL itself when it has none.
pub fn title_from_url(url: &str) -> String {
    Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(str::to_string))
        .unwrap_or_else(|| url.to_string())
}
