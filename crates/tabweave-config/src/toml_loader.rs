//! TOML config file loading and creation.

use crate::schema::TabweaveConfig;
use crate::validation;
use std::path::{Path, PathBuf};
use tabweave_common::ConfigError;
use tracing::{info, warn};

/// Load config from a specific TOML file path.
///
/// Missing fields take their serde defaults. A config that fails
/// validation is logged and replaced by the defaults.
pub fn load_from_path(path: &Path) -> Result<TabweaveConfig, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::FileNotFound(path.to_path_buf()));
    }

    let content = std::fs::read_to_string(path)
        .map_err(|e| ConfigError::ParseError(format!("failed to read {}: {e}", path.display())))?;

    let config: TabweaveConfig = toml::from_str(&content)
        .map_err(|e| ConfigError::ParseError(format!("failed to parse TOML: {e}")))?;

    if let Err(e) = validation::validate(&config) {
        warn!("config validation warning: {e}");
        warn!("falling back to default config");
        return Ok(TabweaveConfig::default());
    }

    info!("loaded config from {}", path.display());
    Ok(config)
}

/// Load config from the platform-specific default path, creating a
/// documented default file on first run.
pub fn load_default() -> Result<TabweaveConfig, ConfigError> {
    let path = default_config_path()?;

    if !path.exists() {
        info!("no config found at {}, creating default", path.display());
        create_default_config(&path)?;
        return Ok(TabweaveConfig::default());
    }

    load_from_path(&path)
}

/// Get the platform-specific default config file path.
pub fn default_config_path() -> Result<PathBuf, ConfigError> {
    let config_dir = dirs::config_dir()
        .ok_or_else(|| ConfigError::ParseError("could not determine config directory".into()))?;
    Ok(config_dir.join("tabweave").join("config.toml"))
}

/// Create a default TOML config file with documentation comments.
pub fn create_default_config(path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| {
            ConfigError::ParseError(format!(
                "failed to create config directory {}: {e}",
                parent.display()
            ))
        })?;
    }

    std::fs::write(path, DEFAULT_CONFIG_TOML).map_err(|e| {
        ConfigError::ParseError(format!(
            "failed to write default config to {}: {e}",
            path.display()
        ))
    })?;

    info!("created default config at {}", path.display());
    Ok(())
}

const DEFAULT_CONFIG_TOML: &str = r#"# Tabweave Configuration
# All values are optional; missing keys use the defaults shown here.

[partitions]
# default | persistent | memory | isolated
default_cache_type = "persistent"
# Tabs sharing a tag share cookies and storage.
default_tag = "default"

[tabs]
home_url = "about:home"
new_tab_title = "New Tab"
incognito_tab_title = "New Incognito Tab"

[new_window]
# Ignore repeated new-window requests for the same URL within this window.
dedupe_window_ms = 300

[title_retry]
# Delays between title re-reads after an in-page navigation.
delays_ms = [200, 300, 300, 300]

[history]
debounce_ms = 500
excluded_urls = ["about:blank", "about:home"]
excluded_prefixes = ["chrome://", "chrome-extension://"]

[downloads]
# directory = "/path/to/downloads"

[logging]
# trace | debug | info | warn | error
level = "info"
"#;
