//! History recording: which URLs qualify and the per-tab debounce.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tabweave_common::TabId;
use tabweave_config::schema::HistoryConfig;

/// Entry handed to the history store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub url: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub favicon: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryFilter {
    excluded_urls: Vec<String>,
    excluded_prefixes: Vec<String>,
}

impl HistoryFilter {
    pub fn new(excluded_urls: Vec<String>, excluded_prefixes: Vec<String>) -> Self {
        Self {
            excluded_urls,
            excluded_prefixes,
        }
    }

    pub fn from_config(config: &HistoryConfig) -> Self {
        Self::new(config.excluded_urls.clone(), config.excluded_prefixes.clone())
    }

    pub fn should_record(&self, url: &str) -> bool {
        let url = url.trim();
        if url.is_empty() {
            return false;
        }
        if self.excluded_urls.iter().any(|u| u == url) {
            return false;
        }
        !self.excluded_prefixes.iter().any(|p| url.starts_with(p.as_str()))
    }
}

impl Default for HistoryFilter {
    fn default() -> Self {
        Self::from_config(&HistoryConfig::default())
    }
}

/// Single-flight debounce per tab. Re-arming replaces the pending deadline.
#[derive(Debug, Clone)]
pub struct HistoryScheduler {
    debounce: Duration,
    pending: HashMap<TabId, Instant>,
}

impl HistoryScheduler {
    pub fn new(debounce: Duration) -> Self {
        Self {
            debounce,
            pending: HashMap::new(),
        }
    }

    pub fn arm(&mut self, tab: &TabId, now: Instant) {
        self.pending.insert(tab.clone(), now + self.debounce);
    }

    pub fn cancel(&mut self, tab: &TabId) -> bool {
        self.pending.remove(tab).is_some()
    }

    pub fn is_pending(&self, tab: &TabId) -> bool {
        self.pending.contains_key(tab)
    }

    /// Remove and return every tab whose deadline has passed, earliest
    /// first.
    pub fn take_due(&mut self, now: Instant) -> Vec<TabId> {
        let mut due: Vec<(Instant, TabId)> = self
            .pending
            .iter()
            .filter(|(_, deadline)| **deadline <= now)
            .map(|(tab, deadline)| (*deadline, tab.clone()))
            .collect();
        due.sort();
        for (_, tab) in &due {
            self.pending.remove(tab);
        }
        due.into_iter().map(|(_, tab)| tab).collect()
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.pending.values().min().copied()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn filter_rejects_internal_pages() {
        let filter = HistoryFilter::default();
        assert!(!filter.should_record(""));
        assert!(!filter.should_record("   "));
        assert!(!filter.should_record("about:blank"));
        assert!(!filter.should_record("about:home"));
        assert!(!filter.should_record("chrome://settings"));
        assert!(!filter.should_record("chrome-extension://abc/popup.html"));
    }

    #[test]
    fn filter_accepts_web_pages() {
        let filter = HistoryFilter::default();
        assert!(filter.should_record("https://example.com/"));
        assert!(filter.should_record("http://localhost:3000"));
        assert!(filter.should_record("about:config"));
    }

    #[test]
    fn filter_uses_configured_lists() {
        let config = HistoryConfig {
            debounce_ms: 500,
            excluded_urls: vec![],
            excluded_prefixes: vec!["file://".into()],
        };
        let filter = HistoryFilter::from_config(&config);
        assert!(filter.should_record("about:blank"));
        assert!(!filter.should_record("file:///etc/hosts"));
    }

    #[test]
    fn nothing_fires_before_the_debounce() {
        let mut scheduler = HistoryScheduler::new(ms(500));
        let t0 = Instant::now();
        let tab = TabId::from("a");
        scheduler.arm(&tab, t0);
        assert!(scheduler.take_due(t0 + ms(499)).is_empty());
        assert_eq!(scheduler.take_due(t0 + ms(500)), vec![tab.clone()]);
        assert!(!scheduler.is_pending(&tab));
    }

    #[test]
    fn rearm_replaces_the_deadline() {
        let mut scheduler = HistoryScheduler::new(ms(500));
        let t0 = Instant::now();
        let tab = TabId::from("a");
        scheduler.arm(&tab, t0);
        scheduler.arm(&tab, t0 + ms(400));
        assert_eq!(scheduler.len(), 1);
        assert!(scheduler.take_due(t0 + ms(600)).is_empty());
        assert_eq!(scheduler.next_deadline(), Some(t0 + ms(900)));
        assert_eq!(scheduler.take_due(t0 + ms(900)).len(), 1);
    }

    #[test]
    fn cancel_drops_pending_write() {
        let mut scheduler = HistoryScheduler::new(ms(500));
        let t0 = Instant::now();
        let tab = TabId::from("a");
        scheduler.arm(&tab, t0);
        assert!(scheduler.cancel(&tab));
        assert!(!scheduler.cancel(&tab));
        assert!(scheduler.take_due(t0 + ms(1000)).is_empty());
        assert!(scheduler.is_empty());
    }

    #[test]
    fn due_tabs_come_out_earliest_first() {
        let mut scheduler = HistoryScheduler::new(ms(100));
        let t0 = Instant::now();
        scheduler.arm(&TabId::from("late"), t0 + ms(50));
        scheduler.arm(&TabId::from("early"), t0);
        let due = scheduler.take_due(t0 + ms(200));
        assert_eq!(due, vec![TabId::from("early"), TabId::from("late")]);
    }
}
