//! Configuration schema types for Tabweave.
//!
//! All structs use `serde(default)` so partial configs work correctly.

mod history;
mod partitions;
mod system;
mod tabs;

pub use history::*;
pub use partitions::*;
pub use system::*;
pub use tabs::*;

use serde::{Deserialize, Serialize};

/// Current config schema version.
pub const CONFIG_SCHEMA_VERSION: u32 = 1;

/// Root configuration for Tabweave.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct TabweaveConfig {
    pub partitions: PartitionsConfig,
    pub tabs: TabsConfig,
    pub new_window: NewWindowConfig,
    pub title_retry: TitleRetryConfig,
    pub history: HistoryConfig,
    pub downloads: DownloadsConfig,
    pub logging: LoggingConfig,
}

#[cfg(test)]
mod tests {
    use super::*;
    use tabweave_common::CacheType;

    #[test]
    fn defaults_match_browser_behaviour() {
        let config = TabweaveConfig::default();
        assert_eq!(config.partitions.default_cache_type, CacheType::Persistent);
        assert_eq!(config.partitions.default_tag, "default");
        assert_eq!(config.tabs.home_url, "about:home");
        assert_eq!(config.history.debounce_ms, 500);
        assert_eq!(config.new_window.dedupe_window_ms, 300);
        assert_eq!(config.title_retry.delays_ms, vec![200, 300, 300, 300]);
        assert_eq!(config.logging.level, LogLevel::Info);
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let config: TabweaveConfig = toml::from_str(
            r#"
[history]
debounce_ms = 750

[partitions]
default_tag = "work"
"#,
        )
        .unwrap();
        assert_eq!(config.history.debounce_ms, 750);
        assert_eq!(config.history.excluded_urls.len(), 2);
        assert_eq!(config.partitions.default_tag, "work");
        assert_eq!(config.partitions.default_cache_type, CacheType::Persistent);
        assert_eq!(config.tabs.new_tab_title, "New Tab");
    }

    #[test]
    fn cache_type_and_log_level_parse_lowercase() {
        let config: TabweaveConfig = toml::from_str(
            r#"
[partitions]
default_cache_type = "memory"

[logging]
level = "debug"
"#,
        )
        .unwrap();
        assert_eq!(config.partitions.default_cache_type, CacheType::Memory);
        assert_eq!(config.logging.level, LogLevel::Debug);
        assert_eq!(config.logging.level.directive(), "tabweave=debug");
    }

    #[test]
    fn downloads_directory_is_optional() {
        let config: TabweaveConfig = toml::from_str(
            r#"
[downloads]
directory = "/tmp/dl"
"#,
        )
        .unwrap();
        assert_eq!(
            config.downloads.directory.as_deref(),
            Some(std::path::Path::new("/tmp/dl"))
        );
        assert!(TabweaveConfig::default().downloads.directory.is_none());
    }
}
