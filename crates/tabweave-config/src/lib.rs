//! Tabweave configuration system.
//!
//! TOML-based configuration with full validation. All sections use
//! defaults so partial configs work out of the box.

pub mod schema;
pub mod toml_loader;
pub mod validation;

pub use schema::{TabweaveConfig, CONFIG_SCHEMA_VERSION};

use std::path::Path;

use tabweave_common::ConfigError;

/// Load config from the platform default path and validate it.
pub fn load_config() -> Result<TabweaveConfig, ConfigError> {
    let config = toml_loader::load_default()?;
    validation::validate(&config)?;
    Ok(config)
}

/// Load config from an explicit path (the `--config` override).
pub fn load_config_from(path: &Path) -> Result<TabweaveConfig, ConfigError> {
    let config = toml_loader::load_from_path(path)?;
    validation::validate(&config)?;
    Ok(config)
}

/// Serialize a config to a pretty-printed JSON string.
pub fn config_to_json(config: &TabweaveConfig) -> String {
    serde_json::to_string_pretty(config)
        .unwrap_or_else(|e| format!("{{\"error\": \"failed to serialize config: {e}\"}}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_to_json_contains_all_sections() {
        let json = config_to_json(&TabweaveConfig::default());
        for section in [
            "\"partitions\"",
            "\"tabs\"",
            "\"new_window\"",
            "\"title_retry\"",
            "\"history\"",
            "\"downloads\"",
            "\"logging\"",
        ] {
            assert!(json.contains(section), "missing {section}");
        }
    }

    #[test]
    fn config_schema_version_is_1() {
        assert_eq!(CONFIG_SCHEMA_VERSION, 1);
    }

    #[test]
    fn load_config_from_explicit_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[partitions]\ndefault_tag = \"work\"\n").unwrap();
        let config = load_config_from(&path).unwrap();
        assert_eq!(config.partitions.default_tag, "work");
    }
}
