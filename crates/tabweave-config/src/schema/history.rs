//! History recording and download defaults.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    /// Per-tab single-flight debounce before a history write (milliseconds).
    pub debounce_ms: u64,
    /// Exact URLs that never produce a history entry.
    pub excluded_urls: Vec<String>,
    /// URL prefixes that never produce a history entry.
    pub excluded_prefixes: Vec<String>,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            debounce_ms: 500,
            excluded_urls: vec!["about:blank".into(), "about:home".into()],
            excluded_prefixes: vec!["chrome://".into(), "chrome-extension://".into()],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct DownloadsConfig {
    /// Overrides the platform downloads directory.
    pub directory: Option<PathBuf>,
}
