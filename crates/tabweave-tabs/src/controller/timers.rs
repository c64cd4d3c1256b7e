//! Deadline pump for history writes and title polls.

use std::time::Instant;

use tabweave_common::TabId;
use tracing::debug;

use super::TabController;
use crate::effects::Effect;
use crate::history::HistoryEntry;

impl TabController {
    /// Fire every deadline that has passed. Returns the number of effects
    /// queued.
    pub fn poll(&mut self, now: Instant) -> usize {
        let mut fired = 0;

        for tab_id in self.history.take_due(now) {
            if self.write_history(&tab_id) {
                fired += 1;
            }
        }

        let mut due: Vec<TabId> = self
            .title_polls
            .iter()
            .filter(|(_, poll)| poll.due.is_some_and(|d| d <= now))
            .map(|(id, _)| id.clone())
            .collect();
        due.sort();
        for tab_id in due {
            let surface = self
                .tabs
                .get(&tab_id)
                .filter(|t| t.is_bound())
                .and_then(|t| t.surface);
            match surface {
                Some(surface_id) => {
                    if let Some(poll) = self.title_polls.get_mut(&tab_id) {
                        poll.due = None;
                        poll.surface = Some(surface_id);
                    }
                    self.emit(Effect::QueryTitle { tab_id, surface_id });
                    fired += 1;
                }
                None => {
                    self.title_polls.remove(&tab_id);
                }
            }
        }
        fired
    }

    /// Earliest pending deadline, for scheduling the next wake-up.
    pub fn next_deadline(&self) -> Option<Instant> {
        let polls = self.title_polls.values().filter_map(|p| p.due);
        polls.chain(self.history.next_deadline()).min()
    }

    fn write_history(&mut self, tab_id: &TabId) -> bool {
        let Some(tab) = self.tabs.get(tab_id) else {
            return false;
        };
        if tab.incognito || !self.settings.history_filter.should_record(&tab.url) {
            debug!(tab_id = %tab_id, url = %tab.url, "history write skipped");
            return false;
        }
        let entry = HistoryEntry {
            url: tab.url.clone(),
            title: tab.display_title().to_string(),
            favicon: tab.favicon.clone(),
        };
        self.emit(Effect::WriteHistory {
            tab_id: tab_id.clone(),
            entry,
        });
        true
    }
}
