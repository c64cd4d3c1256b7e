//! UI-side tab lifecycle.
//!
//! [`TabController`] owns tab metadata and the tab strip. It never talks to
//! surfaces directly: every side effect (spawn, bind, destroy, navigate,
//! history write) is queued as an [`Effect`] for the caller to carry out,
//! and timers are deadlines pumped through [`TabController::poll`].

pub mod controller;
pub mod driver;
pub mod effects;
pub mod error;
pub mod history;
pub mod retry;
pub mod settings;
pub mod strip;
pub mod tab;

pub use controller::{TabController, Toolbar, ToolbarCommand};
pub use driver::{SurfaceSpawner, WindowDriver, HISTORY_KEY};
pub use effects::Effect;
pub use error::{Result, TabError};
pub use history::{HistoryEntry, HistoryFilter, HistoryScheduler};
pub use retry::RetryPolicy;
pub use settings::TabSettings;
pub use strip::TabStrip;
pub use tab::{favicon_for_url, title_from_url, Tab, TabState};
