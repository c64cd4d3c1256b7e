//! Transcript replay: drives a window on the in-process host from a
//! JSON-lines file and reports where the tabs ended up.
//!
//! One step per line, `#` comments and blank lines skipped:
//!
//! ```text
//! {"kind":"open-tab","url":"https://example.com/"}
//! {"kind":"load","tab":1,"url":"https://example.com/docs"}
//! {"kind":"advance","ms":600}
//! ```
//!
//! `tab` fields are positions in the tab strip at the time of the step.

use std::rc::Rc;
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tabweave_common::{KeyValueStore, StoreError, SurfaceId, TabId, WindowId};
use tabweave_tabs::{
    HistoryEntry, Tab, TabController, TabError, TabSettings, Toolbar, ToolbarCommand, WindowDriver,
};
use tabweave_webview::memory_host::{MemoryContent, MemoryHost};
use tabweave_webview::{CallerOrigin, ContentEvent, ContentHandle, Coordinator};
use thiserror::Error;
use tracing::{debug, info};

const ORIGIN: CallerOrigin = CallerOrigin(1);
const WINDOW: WindowId = WindowId(1);

#[derive(Debug, Error)]
pub enum ReplayError {
    #[error("line {line}: {source}")]
    Parse {
        line: usize,
        source: serde_json::Error,
    },

    #[error("step {step}: no tab at position {index}")]
    UnknownTab { step: usize, index: usize },

    #[error("step {step}: tab {index} has no surface")]
    Unbound { step: usize, index: usize },

    #[error("step {step}: {source}")]
    Tab { step: usize, source: TabError },

    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case", rename_all_fields = "camelCase")]
pub enum Step {
    OpenTab {
        #[serde(default)]
        url: Option<String>,
        #[serde(default)]
        incognito: bool,
    },
    CloseTab {
        tab: usize,
    },
    Activate {
        tab: usize,
    },
    Toolbar {
        command: ToolbarCommand,
    },
    DropUrl {
        url: String,
        #[serde(default)]
        tab: Option<usize>,
    },
    Reorder {
        order: Vec<usize>,
    },
    /// The page in `tab` navigates by itself.
    Load {
        tab: usize,
        url: String,
    },
    PageTitle {
        tab: usize,
        title: String,
    },
    /// Page script posts an IPC message.
    Message {
        tab: usize,
        body: Value,
    },
    /// Answer `code` with `result` when the tab's surface runs it.
    ScriptResult {
        tab: usize,
        code: String,
        result: Value,
    },
    Advance {
        ms: u64,
    },
}

/// Final state printed by `tabweave replay`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplayReport {
    pub tabs: Vec<Tab>,
    pub active: Option<TabId>,
    pub toolbar: Toolbar,
    pub history: Vec<HistoryEntry>,
    pub window_closed: bool,
    pub live_surfaces: Vec<SurfaceId>,
    pub sessions: Vec<String>,
    pub stale_events: usize,
}

pub fn parse_transcript(text: &str) -> Result<Vec<Step>, ReplayError> {
    text.lines()
        .enumerate()
        .filter(|(_, line)| {
            let line = line.trim();
            !line.is_empty() && !line.starts_with('#')
        })
        .map(|(i, line)| {
            serde_json::from_str(line).map_err(|source| ReplayError::Parse {
                line: i + 1,
                source,
            })
        })
        .collect()
}

pub struct Replay {
    host: Rc<MemoryHost>,
    driver: WindowDriver,
    start: Instant,
    elapsed: Duration,
}

impl Replay {
    pub fn new(settings: TabSettings, store: Arc<dyn KeyValueStore>, downloads_dir: std::path::PathBuf) -> Self {
        let host = Rc::new(MemoryHost::new().with_store(Arc::clone(&store)));
        host.add_window(ORIGIN, WINDOW);
        let coordinator = Rc::new(Coordinator::new(
            host.clone(),
            downloads_dir,
            Some(Arc::clone(&store)),
        ));
        let driver = WindowDriver::new(
            ORIGIN,
            WINDOW,
            coordinator,
            host.clone(),
            TabController::new(settings),
        )
        .with_history(store);
        Self {
            host,
            driver,
            start: Instant::now(),
            elapsed: Duration::ZERO,
        }
    }

    fn now(&self) -> Instant {
        self.start + self.elapsed
    }

    pub async fn run(&mut self, steps: &[Step]) -> Result<(), ReplayError> {
        self.driver.settle(self.now()).await;
        for (i, step) in steps.iter().enumerate() {
            let step_no = i + 1;
            if self.driver.tabs().is_closed() {
                info!(step = step_no, "window closed; ignoring remaining steps");
                break;
            }
            debug!(step = step_no, ?step, "replay step");
            self.apply(step_no, step)?;
            self.driver.settle(self.now()).await;
        }
        Ok(())
    }

    fn apply(&mut self, step_no: usize, step: &Step) -> Result<(), ReplayError> {
        let tab_err = |source| ReplayError::Tab {
            step: step_no,
            source,
        };
        match step {
            Step::OpenTab { url, incognito } => {
                self.driver
                    .tabs_mut()
                    .open_tab(url.as_deref(), *incognito)
                    .map_err(tab_err)?;
            }
            Step::CloseTab { tab } => {
                let id = self.tab_id(step_no, *tab)?;
                self.driver.tabs_mut().close_tab(&id).map_err(tab_err)?;
            }
            Step::Activate { tab } => {
                let id = self.tab_id(step_no, *tab)?;
                self.driver.tabs_mut().activate(&id).map_err(tab_err)?;
            }
            Step::Toolbar { command } => {
                self.driver
                    .tabs_mut()
                    .toolbar_command(command.clone())
                    .map_err(tab_err)?;
            }
            Step::DropUrl { url, tab } => {
                let target = tab.map(|t| self.tab_id(step_no, t)).transpose()?;
                self.driver
                    .tabs_mut()
                    .drop_url(url, target.as_ref())
                    .map_err(tab_err)?;
            }
            Step::Reorder { order } => {
                let ids = order
                    .iter()
                    .map(|&t| self.tab_id(step_no, t))
                    .collect::<Result<Vec<_>, _>>()?;
                self.driver.tabs_mut().reorder(&ids).map_err(tab_err)?;
            }
            Step::Load { tab, url } => {
                let content = self.content(step_no, *tab)?;
                if let Err(e) = content.load_url(url) {
                    debug!(step = step_no, error = %e, "page load refused");
                }
            }
            Step::PageTitle { tab, title } => {
                let content = self.content(step_no, *tab)?;
                content.emit(ContentEvent::PageTitleUpdated {
                    title: title.clone(),
                });
            }
            Step::Message { tab, body } => {
                let content = self.content(step_no, *tab)?;
                content.emit(ContentEvent::IpcMessage {
                    body: body.to_string(),
                });
            }
            Step::ScriptResult { tab, code, result } => {
                let content = self.content(step_no, *tab)?;
                content.set_script_result(code, Ok(result.clone()));
            }
            Step::Advance { ms } => {
                self.elapsed += Duration::from_millis(*ms);
            }
        }
        Ok(())
    }

    fn tab_id(&self, step: usize, index: usize) -> Result<TabId, ReplayError> {
        self.driver
            .tabs()
            .order()
            .get(index)
            .cloned()
            .ok_or(ReplayError::UnknownTab { step, index })
    }

    fn content(&self, step: usize, index: usize) -> Result<Rc<MemoryContent>, ReplayError> {
        let id = self.tab_id(step, index)?;
        self.driver
            .tabs()
            .tab(&id)
            .and_then(|t| t.surface)
            .and_then(|surface| self.host.surface(surface))
            .ok_or(ReplayError::Unbound { step, index })
    }

    pub fn report(&self) -> Result<ReplayReport, ReplayError> {
        let tabs = self.driver.tabs();
        let registry = self.driver.coordinator().registry();
        Ok(ReplayReport {
            tabs: tabs.tabs().into_iter().cloned().collect(),
            active: tabs.active_id().cloned(),
            toolbar: tabs.toolbar().clone(),
            history: self.driver.history()?,
            window_closed: tabs.is_closed(),
            live_surfaces: registry.active_surfaces(),
            sessions: registry
                .partitions()
                .iter()
                .map(|p| p.as_str().to_string())
                .collect(),
            stale_events: self.driver.stale_events(),
        })
    }
}
