pub mod errors;
pub mod id;
pub mod store;
pub mod types;

pub use errors::{ConfigError, PlatformError, StoreError, TabweaveError};
pub use id::{new_id, new_token, TabId};
pub use store::{JsonFileStore, KeyValueStore, MemoryStore};
pub use types::{CacheType, ContentHandleId, SurfaceId, WindowId};

pub type Result<T> = std::result::Result<T, TabweaveError>;
