//! Ordered tab strip with a single active entry.

use serde::{Deserialize, Serialize};
use tabweave_common::TabId;

/// Tab ids in display order plus the active position. The strip is only
/// empty before the first push or after the last removal.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TabStrip {
    tabs: Vec<TabId>,
    active_index: usize,
}

impl TabStrip {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a tab and make it active.
    pub fn push(&mut self, id: TabId) {
        self.tabs.push(id);
        self.active_index = self.tabs.len() - 1;
    }

    /// Remove a tab. Returns the index it occupied.
    ///
    /// Removing the active tab selects the previous one, or the first when
    /// the active tab was at the front.
    pub fn remove(&mut self, id: &TabId) -> Option<usize> {
        let idx = self.position(id)?;
        self.tabs.remove(idx);
        if self.tabs.is_empty() {
            self.active_index = 0;
        } else if idx == self.active_index {
            self.active_index = idx.saturating_sub(1);
        } else if idx < self.active_index {
            self.active_index -= 1;
        }
        Some(idx)
    }

    pub fn active(&self) -> Option<&TabId> {
        self.tabs.get(self.active_index)
    }

    pub fn set_active(&mut self, id: &TabId) -> bool {
        match self.position(id) {
            Some(idx) => {
                self.active_index = idx;
                true
            }
            None => false,
        }
    }

    /// Replace the order with a permutation of the current tabs. The active
    /// tab stays active.
    pub fn reorder(&mut self, order: &[TabId]) -> bool {
        if order.len() != self.tabs.len() || !self.tabs.iter().all(|id| order.contains(id)) {
            return false;
        }
        let active = self.active().cloned();
        self.tabs = order.to_vec();
        if let Some(active) = active {
            self.set_active(&active);
        }
        true
    }

    pub fn position(&self, id: &TabId) -> Option<usize> {
        self.tabs.iter().position(|t| t == id)
    }

    pub fn contains(&self, id: &TabId) -> bool {
        self.tabs.contains(id)
    }

    pub fn ids(&self) -> &[TabId] {
        &self.tabs
    }

    pub fn len(&self) -> usize {
        self.tabs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tabs.is_empty()
    }

    pub fn active_index(&self) -> Option<usize> {
        if self.tabs.is_empty() {
            None
        } else {
            Some(self.active_index)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strip(ids: &[&str]) -> TabStrip {
        let mut strip = TabStrip::new();
        for id in ids {
            strip.push(TabId::from(*id));
        }
        strip
    }

    fn id(s: &str) -> TabId {
        TabId::from(s)
    }

    #[test]
    fn push_makes_new_tab_active() {
        let strip = strip(&["a", "b"]);
        assert_eq!(strip.len(), 2);
        assert_eq!(strip.active(), Some(&id("b")));
    }

    #[test]
    fn removing_active_selects_previous() {
        let mut strip = strip(&["a", "b", "c"]);
        assert_eq!(strip.remove(&id("c")), Some(2));
        assert_eq!(strip.active(), Some(&id("b")));
    }

    #[test]
    fn removing_active_first_selects_new_first() {
        let mut strip = strip(&["a", "b", "c"]);
        strip.set_active(&id("a"));
        strip.remove(&id("a"));
        assert_eq!(strip.active(), Some(&id("b")));
    }

    #[test]
    fn removing_earlier_tab_keeps_active_tab() {
        let mut strip = strip(&["a", "b", "c"]);
        strip.remove(&id("a"));
        assert_eq!(strip.active(), Some(&id("c")));
        assert_eq!(strip.active_index(), Some(1));
    }

    #[test]
    fn removing_later_tab_keeps_active_tab() {
        let mut strip = strip(&["a", "b", "c"]);
        strip.set_active(&id("a"));
        strip.remove(&id("c"));
        assert_eq!(strip.active(), Some(&id("a")));
    }

    #[test]
    fn removing_last_tab_empties_strip() {
        let mut strip = strip(&["a"]);
        assert_eq!(strip.remove(&id("a")), Some(0));
        assert!(strip.is_empty());
        assert_eq!(strip.active(), None);
        assert_eq!(strip.active_index(), None);
    }

    #[test]
    fn remove_unknown_is_none() {
        let mut strip = strip(&["a"]);
        assert_eq!(strip.remove(&id("zz")), None);
        assert_eq!(strip.len(), 1);
    }

    #[test]
    fn reorder_keeps_active_tab() {
        let mut strip = strip(&["a", "b", "c"]);
        strip.set_active(&id("b"));
        assert!(strip.reorder(&[id("c"), id("b"), id("a")]));
        assert_eq!(strip.ids(), &[id("c"), id("b"), id("a")]);
        assert_eq!(strip.active(), Some(&id("b")));
        assert_eq!(strip.active_index(), Some(1));
    }

    #[test]
    fn reorder_rejects_non_permutations() {
        let mut strip = strip(&["a", "b"]);
        assert!(!strip.reorder(&[id("a")]));
        assert!(!strip.reorder(&[id("a"), id("x")]));
        assert_eq!(strip.ids(), &[id("a"), id("b")]);
    }

    #[test]
    fn set_active_unknown_fails() {
        let mut strip = strip(&["a", "b"]);
        assert!(!strip.set_active(&id("x")));
        assert_eq!(strip.active(), Some(&id("b")));
    }
}
