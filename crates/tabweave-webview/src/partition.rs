//! Partition resolution: which storage/cookie context a tab's surface uses.
//!
//! A partition is a plain string. Names starting with `persist:` are backed
//! by durable storage; everything else lives in memory and disappears with
//! its session.

use std::cell::OnceCell;
use std::fmt;

use serde::{Deserialize, Serialize};
use tabweave_common::{new_token, CacheType, TabId};

/// Partition used when a create request carries no partition at all.
pub const DEFAULT_PARTITION: &str = "persist:default";

const DEFAULT_TAG: &str = "default";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PartitionKind {
    /// `persist:<tag>`
    Persistent,
    /// `memory:<tag>`
    Memory,
    /// `isolated:<token>`
    Isolated,
    /// Any other caller-supplied name. Volatile.
    Custom,
}

/// A resolved partition identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Partition(String);

impl Partition {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Accepts the wire form of a partition, mapping an empty string to
    /// [`DEFAULT_PARTITION`].
    pub fn from_wire(name: &str) -> Self {
        if name.trim().is_empty() {
            Self(DEFAULT_PARTITION.to_string())
        } else {
            Self(name.to_string())
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn kind(&self) -> PartitionKind {
        if self.0.starts_with("persist:") {
            PartitionKind::Persistent
        } else if self.0.starts_with("memory:") {
            PartitionKind::Memory
        } else if self.0.starts_with("isolated:") {
            PartitionKind::Isolated
        } else {
            PartitionKind::Custom
        }
    }

    /// Whether cookies and storage outlive the process.
    pub fn is_durable(&self) -> bool {
        self.kind() == PartitionKind::Persistent
    }

    /// The part after the first `:`, or the whole name for custom partitions.
    pub fn tag(&self) -> &str {
        self.0.split_once(':').map(|(_, tag)| tag).unwrap_or(&self.0)
    }

    pub fn incognito(tab_id: &TabId) -> Self {
        Self(format!("memory:incognito-{tab_id}"))
    }
}

impl Default for Partition {
    fn default() -> Self {
        Self(DEFAULT_PARTITION.to_string())
    }
}

impl fmt::Display for Partition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// What a tab asks for when it is created.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PartitionRequest {
    pub explicit: Option<String>,
    pub cache_type: CacheType,
    pub tag: Option<String>,
    pub incognito: bool,
}

impl PartitionRequest {
    pub fn with_cache(cache_type: CacheType, tag: Option<&str>) -> Self {
        Self {
            cache_type,
            tag: tag.map(str::to_string),
            ..Default::default()
        }
    }

    pub fn incognito() -> Self {
        Self {
            cache_type: CacheType::Memory,
            incognito: true,
            ..Default::default()
        }
    }

    /// Derive the partition for `tab_id`.
    ///
    /// Incognito always wins and yields a partition unique to the tab.
    /// `isolated` without a tag draws a fresh random token on every call,
    /// so callers must cache the result (see [`ResolvedPartition`]).
    pub fn resolve(&self, tab_id: &TabId) -> Partition {
        if self.incognito {
            return Partition::incognito(tab_id);
        }

        if let Some(explicit) = self.explicit.as_deref().filter(|p| !p.trim().is_empty()) {
            return Partition::new(explicit);
        }

        let tag = self.tag.as_deref().filter(|t| !t.is_empty());
        match self.cache_type {
            CacheType::Default | CacheType::Persistent => {
                Partition::new(format!("persist:{}", tag.unwrap_or(DEFAULT_TAG)))
            }
            CacheType::Memory => Partition::new(format!("memory:{}", tag.unwrap_or(DEFAULT_TAG))),
            CacheType::Isolated => match tag {
                Some(tag) => Partition::new(format!("isolated:{tag}")),
                None => Partition::new(format!("isolated:{}", new_token())),
            },
        }
    }
}

/// A partition request bound to one tab, resolved at most once.
#[derive(Debug, Clone)]
pub struct ResolvedPartition {
    tab_id: TabId,
    request: PartitionRequest,
    resolved: OnceCell<Partition>,
}

impl ResolvedPartition {
    pub fn new(tab_id: TabId, request: PartitionRequest) -> Self {
        Self {
            tab_id,
            request,
            resolved: OnceCell::new(),
        }
    }

    pub fn get(&self) -> &Partition {
        self.resolved.get_or_init(|| self.request.resolve(&self.tab_id))
    }

    pub fn request(&self) -> &PartitionRequest {
        &self.request
    }
}
