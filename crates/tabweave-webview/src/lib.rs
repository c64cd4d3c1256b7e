//! Coordinator side of the tab/session lifecycle.
//!
//! Provides:
//! - Partition resolution and one session per partition
//! - A registry of live rendering surfaces with scoped listeners
//! - The event relay from untrusted page content to the UI
//! - Command handling for scripts, cookies and the context menu
//! - Download bookkeeping
//!
//! Rendering itself sits behind the [`host::Host`] trait: an in-process
//! [`memory_host::MemoryHost`] by default, real webviews with the `wry`
//! feature.

pub mod context_menu;
pub mod cookies;
pub mod coordinator;
pub mod downloads;
pub mod error;
pub mod events;
pub mod host;
pub mod ipc;
pub mod memory_host;
pub mod partition;
pub mod protocol;
pub mod registry;
pub mod relay;
pub mod session;
#[cfg(feature = "wry")]
pub mod wry_host;

pub use coordinator::Coordinator;
pub use error::{HostError, Result, WebViewError};
pub use events::{EventQueue, RelayEvent, RelayEventKind};
pub use host::{CallerOrigin, ContentEvent, ContentHandle, Host, Session, Subscription};
pub use partition::{Partition, PartitionKind, PartitionRequest, ResolvedPartition, DEFAULT_PARTITION};
pub use protocol::{Command, Reply, ScriptOutcome};
pub use registry::{SurfaceInfo, SurfaceRegistry};
