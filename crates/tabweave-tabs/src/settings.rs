//! Controller settings derived from [`TabweaveConfig`].

use std::time::Duration;

use tabweave_common::{CacheType, TabId};
use tabweave_config::TabweaveConfig;
use tabweave_webview::{PartitionRequest, ResolvedPartition};

use crate::history::HistoryFilter;
use crate::retry::RetryPolicy;

#[derive(Debug, Clone)]
pub struct TabSettings {
    pub home_url: String,
    pub new_tab_title: String,
    pub incognito_tab_title: String,
    pub cache_type: CacheType,
    pub partition_tag: String,
    pub history_filter: HistoryFilter,
    pub history_debounce: Duration,
    pub title_retry: RetryPolicy,
    pub new_window_dedupe: Duration,
}

impl TabSettings {
    pub fn from_config(config: &TabweaveConfig) -> Self {
        Self {
            home_url: config.tabs.home_url.clone(),
            new_tab_title: config.tabs.new_tab_title.clone(),
            incognito_tab_title: config.tabs.incognito_tab_title.clone(),
            cache_type: config.partitions.default_cache_type,
            partition_tag: config.partitions.default_tag.clone(),
            history_filter: HistoryFilter::from_config(&config.history),
            history_debounce: Duration::from_millis(config.history.debounce_ms),
            title_retry: RetryPolicy::from_millis(&config.title_retry.delays_ms),
            new_window_dedupe: Duration::from_millis(config.new_window.dedupe_window_ms),
        }
    }

    /// Partition for a new tab under these settings.
    pub fn partition_for(&self, tab_id: &TabId, incognito: bool) -> ResolvedPartition {
        let request = if incognito {
            PartitionRequest::incognito()
        } else if self.cache_type == CacheType::Isolated {
            // every isolated tab gets its own random partition
            PartitionRequest::with_cache(CacheType::Isolated, None)
        } else {
            PartitionRequest::with_cache(self.cache_type, Some(&self.partition_tag))
        };
        ResolvedPartition::new(tab_id.clone(), request)
    }

    /// What the surface actually loads for a tab URL, and whether it is
    /// shown. The home page is drawn by the UI over a hidden blank surface.
    pub fn surface_target<'a>(&self, url: &'a str) -> (&'a str, bool) {
        if url == self.home_url {
            ("about:blank", false)
        } else {
            (url, true)
        }
    }
}

impl Default for TabSettings {
    fn default() -> Self {
        Self::from_config(&TabweaveConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_follow_config_defaults() {
        let settings = TabSettings::default();
        assert_eq!(settings.home_url, "about:home");
        assert_eq!(settings.history_debounce, Duration::from_millis(500));
        assert_eq!(settings.new_window_dedupe, Duration::from_millis(300));
        assert_eq!(settings.title_retry, RetryPolicy::default());
    }

    #[test]
    fn partition_uses_configured_tag() {
        let mut config = TabweaveConfig::default();
        config.partitions.default_tag = "work".into();
        let settings = TabSettings::from_config(&config);
        let resolved = settings.partition_for(&TabId::from("t1"), false);
        assert_eq!(resolved.get().as_str(), "persist:work");
    }

    #[test]
    fn isolated_tabs_do_not_share_the_tag() {
        let mut config = TabweaveConfig::default();
        config.partitions.default_cache_type = CacheType::Isolated;
        let settings = TabSettings::from_config(&config);
        let a = settings.partition_for(&TabId::from("a"), false);
        let b = settings.partition_for(&TabId::from("b"), false);
        assert!(a.get().as_str().starts_with("isolated:"));
        assert_ne!(a.get(), b.get());
        assert_eq!(a.get(), a.get());
    }

    #[test]
    fn incognito_partition_is_per_tab() {
        let settings = TabSettings::default();
        let a = settings.partition_for(&TabId::from("a"), true);
        let b = settings.partition_for(&TabId::from("b"), true);
        assert_eq!(a.get().as_str(), "memory:incognito-a");
        assert_ne!(a.get(), b.get());
    }

    #[test]
    fn home_page_loads_hidden_blank_surface() {
        let settings = TabSettings::default();
        assert_eq!(settings.surface_target("about:home"), ("about:blank", false));
        assert_eq!(
            settings.surface_target("https://a.test/"),
            ("https://a.test/", true)
        );
    }
}
