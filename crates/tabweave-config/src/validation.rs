//! Full configuration validation.
//!
//! Collects every violation and reports them together.

use crate::schema::TabweaveConfig;
use tabweave_common::ConfigError;

/// Longest title re-poll schedule accepted.
const MAX_TITLE_POLLS: usize = 10;

/// Run all validations on a config, collecting all errors.
pub fn validate(config: &TabweaveConfig) -> Result<(), ConfigError> {
    let mut errors: Vec<String> = Vec::new();

    // Partitions
    let tag = &config.partitions.default_tag;
    if tag.trim().is_empty() {
        errors.push("partitions.default_tag must not be empty".into());
    } else if tag.contains(char::is_whitespace) {
        errors.push(format!(
            "partitions.default_tag = {tag:?} must not contain whitespace"
        ));
    }

    // Tabs
    if config.tabs.home_url.trim().is_empty() {
        errors.push("tabs.home_url must not be empty".into());
    }

    // Timers
    validate_range(&mut errors, "history.debounce_ms", config.history.debounce_ms, 0, 10_000);
    validate_range(
        &mut errors,
        "new_window.dedupe_window_ms",
        config.new_window.dedupe_window_ms,
        0,
        5_000,
    );

    let delays = &config.title_retry.delays_ms;
    if delays.is_empty() {
        errors.push("title_retry.delays_ms must contain at least one delay".into());
    } else if delays.len() > MAX_TITLE_POLLS {
        errors.push(format!(
            "title_retry.delays_ms has {} entries, at most {MAX_TITLE_POLLS} allowed",
            delays.len()
        ));
    }
    for (i, delay) in delays.iter().enumerate() {
        validate_range(
            &mut errors,
            &format!("title_retry.delays_ms[{i}]"),
            *delay,
            0,
            10_000,
        );
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ConfigError::ValidationError(errors.join("; ")))
    }
}

fn validate_range(errors: &mut Vec<String>, name: &str, value: u64, min: u64, max: u64) {
    if value < min || value > max {
        errors.push(format!("{name} = {value} is out of range [{min}, {max}]"));
    }
}
