//! Partition defaults applied when a tab does not request a specific one.

use serde::{Deserialize, Serialize};
use tabweave_common::CacheType;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PartitionsConfig {
    /// Cache type for ordinary (non-incognito) tabs.
    pub default_cache_type: CacheType,
    /// Tag for ordinary tabs. Tabs sharing a tag share cookies.
    pub default_tag: String,
}

impl Default for PartitionsConfig {
    fn default() -> Self {
        Self {
            default_cache_type: CacheType::Persistent,
            default_tag: "default".into(),
        }
    }
}
