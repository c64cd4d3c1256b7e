//! Download bookkeeping.
//!
//! The host reports downloads as they start, progress and finish; the
//! tracker picks a non-clobbering save path, relays each step to the UI and
//! appends completed records to the key/value store.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use tabweave_common::{KeyValueStore, WindowId};
use tracing::{debug, info, warn};

use crate::error::{Result, WebViewError};
use crate::events::{EventQueue, RelayEventKind};

pub const DOWNLOADS_KEY: &str = "downloads";

const FALLBACK_FILENAME: &str = "download";

/// Millisecond timestamp times 10 000 plus a per-process counter.
///
/// Exceeds 2^53, so it travels as a string on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DownloadId(pub u64);

impl fmt::Display for DownloadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Serialize for DownloadId {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0.to_string())
    }
}

impl<'de> Deserialize<'de> for DownloadId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Text(String),
            Number(u64),
        }
        match Raw::deserialize(deserializer)? {
            Raw::Number(n) => Ok(Self(n)),
            Raw::Text(s) => s.parse().map(Self).map_err(serde::de::Error::custom),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DownloadState {
    Progressing,
    Completed,
    Cancelled,
    Interrupted,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadRecord {
    pub id: DownloadId,
    pub url: String,
    pub filename: String,
    pub save_path: PathBuf,
    pub total_bytes: u64,
    pub received_bytes: u64,
    pub state: DownloadState,
    /// Milliseconds since the UNIX epoch.
    pub start_time: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// How a download ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadOutcome {
    Completed,
    Cancelled,
    Interrupted(String),
}

struct ActiveDownload {
    window: WindowId,
    record: DownloadRecord,
}

pub struct DownloadTracker {
    directory: PathBuf,
    store: Option<Arc<dyn KeyValueStore>>,
    events: EventQueue,
    active: BTreeMap<DownloadId, ActiveDownload>,
    counter: u64,
}

impl DownloadTracker {
    pub fn new(
        directory: impl Into<PathBuf>,
        store: Option<Arc<dyn KeyValueStore>>,
        events: EventQueue,
    ) -> Self {
        Self {
            directory: directory.into(),
            store,
            events,
            active: BTreeMap::new(),
            counter: 0,
        }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Register a download the host is about to start.
    ///
    /// A second request for a URL that is still progressing is refused with
    /// [`WebViewError::DuplicateDownload`]; the caller should let the first
    /// one run.
    pub fn start(
        &mut self,
        window: WindowId,
        url: &str,
        suggested_filename: &str,
        total_bytes: u64,
    ) -> Result<DownloadRecord> {
        if self
            .active
            .values()
            .any(|d| d.record.url == url && d.record.state == DownloadState::Progressing)
        {
            info!(url, "download already in progress, ignoring duplicate");
            return Err(WebViewError::DuplicateDownload(url.to_string()));
        }

        let filename = sanitize_filename(suggested_filename);
        let save_path = unique_save_path(&self.directory, &filename, |candidate| {
            candidate.exists() || self.active.values().any(|d| d.record.save_path == candidate)
        });
        let filename = save_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or(filename);

        self.counter += 1;
        let now = now_millis();
        let id = DownloadId(now.max(0) as u64 * 10_000 + self.counter);

        let record = DownloadRecord {
            id,
            url: url.to_string(),
            filename,
            save_path,
            total_bytes,
            received_bytes: 0,
            state: DownloadState::Progressing,
            start_time: now,
            end_time: None,
            error: None,
        };
        debug!(%id, url, path = %record.save_path.display(), "download started");

        self.active.insert(
            id,
            ActiveDownload {
                window,
                record: record.clone(),
            },
        );
        self.events.emit(
            window,
            None,
            RelayEventKind::DownloadStarted {
                download: record.clone(),
            },
        );
        Ok(record)
    }

    pub fn progress(&mut self, id: DownloadId, received_bytes: u64, total_bytes: u64) -> Result<()> {
        let active = self
            .active
            .get_mut(&id)
            .ok_or(WebViewError::UnknownDownload(id))?;
        active.record.received_bytes = received_bytes;
        active.record.total_bytes = total_bytes;
        self.events.emit(
            active.window,
            None,
            RelayEventKind::DownloadProgress {
                id,
                received_bytes,
                total_bytes,
            },
        );
        Ok(())
    }

    /// Close out a download. Completed records are persisted.
    pub fn finish(&mut self, id: DownloadId, outcome: DownloadOutcome) -> Result<DownloadRecord> {
        let ActiveDownload { window, mut record } = self
            .active
            .remove(&id)
            .ok_or(WebViewError::UnknownDownload(id))?;
        record.end_time = Some(now_millis());

        let kind = match outcome {
            DownloadOutcome::Completed => {
                record.state = DownloadState::Completed;
                if record.total_bytes > 0 {
                    record.received_bytes = record.total_bytes;
                }
                self.persist(&record)?;
                RelayEventKind::DownloadCompleted {
                    download: record.clone(),
                }
            }
            DownloadOutcome::Cancelled => {
                record.state = DownloadState::Cancelled;
                RelayEventKind::DownloadCancelled { id }
            }
            DownloadOutcome::Interrupted(reason) => {
                record.state = DownloadState::Interrupted;
                record.error = Some(reason);
                RelayEventKind::DownloadInterrupted {
                    download: record.clone(),
                }
            }
        };
        debug!(%id, state = ?record.state, "download finished");
        self.events.emit(window, None, kind);
        Ok(record)
    }

    pub fn cancel(&mut self, id: DownloadId) -> Result<DownloadRecord> {
        self.finish(id, DownloadOutcome::Cancelled)
    }

    /// Find the progressing download for `url`, if any.
    pub fn find_active(&self, url: &str) -> Option<DownloadId> {
        self.active
            .values()
            .find(|d| d.record.url == url)
            .map(|d| d.record.id)
    }

    pub fn active(&self) -> Vec<DownloadRecord> {
        self.active.values().map(|d| d.record.clone()).collect()
    }

    /// Active and persisted records, newest first.
    pub fn all(&self) -> Result<Vec<DownloadRecord>> {
        let mut all = self.active();
        for record in self.load_persisted()? {
            if !self.active.contains_key(&record.id) {
                all.push(record);
            }
        }
        all.sort_by(|a, b| b.start_time.cmp(&a.start_time));
        Ok(all)
    }

    pub fn delete(&mut self, id: DownloadId) -> Result<()> {
        self.active.remove(&id);
        let remaining: Vec<_> = self
            .load_persisted()?
            .into_iter()
            .filter(|r| r.id != id)
            .collect();
        self.save_persisted(&remaining)
    }

    pub fn clear(&mut self) -> Result<()> {
        self.active.clear();
        self.save_persisted(&[])
    }

    fn persist(&self, record: &DownloadRecord) -> Result<()> {
        let mut records = self.load_persisted()?;
        records.push(record.clone());
        self.save_persisted(&records)
    }

    fn load_persisted(&self) -> Result<Vec<DownloadRecord>> {
        let Some(store) = &self.store else {
            return Ok(Vec::new());
        };
        match store.get(DOWNLOADS_KEY)? {
            None => Ok(Vec::new()),
            Some(value) => match serde_json::from_value(value) {
                Ok(records) => Ok(records),
                Err(e) => {
                    warn!(error = %e, "stored download records are unreadable, ignoring");
                    Ok(Vec::new())
                }
            },
        }
    }

    fn save_persisted(&self, records: &[DownloadRecord]) -> Result<()> {
        let Some(store) = &self.store else {
            return Ok(());
        };
        let value = serde_json::to_value(records).map_err(tabweave_common::StoreError::from)?;
        store.set(DOWNLOADS_KEY, value)?;
        Ok(())
    }
}

fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Keep only the final path component of a suggested name.
pub fn sanitize_filename(suggested: &str) -> String {
    let name = suggested
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or("")
        .trim();
    if name.is_empty() || name == "." || name == ".." {
        FALLBACK_FILENAME.to_string()
    } else {
        name.to_string()
    }
}

/// `dir/name.ext`, or `dir/name (n).ext` for the first `n` not taken.
pub fn unique_save_path(dir: &Path, filename: &str, is_taken: impl Fn(&Path) -> bool) -> PathBuf {
    let candidate = dir.join(filename);
    if !is_taken(&candidate) {
        return candidate;
    }

    let (stem, ext) = match filename.rfind('.') {
        Some(idx) if idx > 0 => filename.split_at(idx),
        _ => (filename, ""),
    };
    let mut n = 1;
    loop {
        let candidate = dir.join(format!("{stem} ({n}){ext}"));
        if !is_taken(&candidate) {
            return candidate;
        }
        n += 1;
    }
}
