//! Tab strip behaviour: home page, placeholder titles, new-window handling.

use serde::{Deserialize, Serialize};

/// Chrome-compatible UA; many sites degrade for unknown engines.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TabsConfig {
    /// URL opened by "new tab". `about:home` renders the built-in home page.
    pub home_url: String,
    pub new_tab_title: String,
    pub incognito_tab_title: String,
    pub user_agent: Option<String>,
}

impl Default for TabsConfig {
    fn default() -> Self {
        Self {
            home_url: "about:home".into(),
            new_tab_title: "New Tab".into(),
            incognito_tab_title: "New Incognito Tab".into(),
            user_agent: Some(DEFAULT_USER_AGENT.into()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NewWindowConfig {
    /// Repeated new-window requests for the same URL inside this window
    /// (milliseconds) are ignored.
    pub dedupe_window_ms: u64,
}

impl Default for NewWindowConfig {
    fn default() -> Self {
        Self {
            dedupe_window_ms: 300,
        }
    }
}

/// Delay schedule for re-reading a page title after an in-page navigation.
///
/// One poll is made per entry; polling stops at the first non-empty title.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TitleRetryConfig {
    pub delays_ms: Vec<u64>,
}

impl Default for TitleRetryConfig {
    fn default() -> Self {
        Self {
            delays_ms: vec![200, 300, 300, 300],
        }
    }
}
