use std::fs;
use std::path::PathBuf;

use tabweave_common::PlatformError;

const APP_NAME: &str = "tabweave";

/// Returns the platform-specific configuration directory for Tabweave.
///
/// - macOS: `~/Library/Application Support/tabweave`
/// - Linux: `$XDG_CONFIG_HOME/tabweave` (defaults to `~/.config/tabweave`)
/// - Windows: `%APPDATA%\tabweave`
pub fn config_dir() -> Result<PathBuf, PlatformError> {
    dirs::config_dir()
        .map(|p| p.join(APP_NAME))
        .ok_or_else(|| PlatformError::PathError("could not determine config directory".into()))
}

/// Returns the platform-specific data directory for Tabweave.
pub fn data_dir() -> Result<PathBuf, PlatformError> {
    dirs::data_dir()
        .map(|p| p.join(APP_NAME))
        .ok_or_else(|| PlatformError::PathError("could not determine data directory".into()))
}

/// Returns the platform-specific cache directory for Tabweave.
pub fn cache_dir() -> Result<PathBuf, PlatformError> {
    dirs::cache_dir()
        .map(|p| p.join(APP_NAME))
        .ok_or_else(|| PlatformError::PathError("could not determine cache directory".into()))
}

/// `data_dir()/logs`
pub fn log_dir() -> Result<PathBuf, PlatformError> {
    Ok(data_dir()?.join("logs"))
}

/// `log_dir()/crash-reports`
pub fn crash_report_dir() -> Result<PathBuf, PlatformError> {
    Ok(log_dir()?.join("crash-reports"))
}

/// Key/value store backing favorites, history and downloads.
pub fn store_file() -> Result<PathBuf, PlatformError> {
    Ok(data_dir()?.join("store.json"))
}

/// The user's downloads directory, or `override_dir` when configured.
pub fn downloads_dir(override_dir: Option<&std::path::Path>) -> Result<PathBuf, PlatformError> {
    if let Some(dir) = override_dir {
        return Ok(dir.to_path_buf());
    }
    dirs::download_dir()
        .ok_or_else(|| PlatformError::PathError("could not determine downloads directory".into()))
}

/// On-disk storage directory for a durable partition such as `persist:work`.
///
/// Characters outside `[A-Za-z0-9_-]` are replaced so that a partition
/// name can never escape the partitions directory.
pub fn partition_data_dir(partition: &str) -> Result<PathBuf, PlatformError> {
    let safe: String = partition
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    if safe.is_empty() {
        return Err(PlatformError::PathError("empty partition name".into()));
    }
    Ok(data_dir()?.join("partitions").join(safe))
}

/// Creates all Tabweave directories if they do not already exist.
pub fn ensure_dirs() -> Result<(), PlatformError> {
    let dirs = [config_dir()?, data_dir()?, cache_dir()?, log_dir()?, crash_report_dir()?];
    for dir in dirs {
        fs::create_dir_all(&dir).map_err(|e| {
            PlatformError::PathError(format!("failed to create {}: {e}", dir.display()))
        })?;
        tracing::debug!(path = %dir.display(), "directory ready");
    }
    Ok(())
}
