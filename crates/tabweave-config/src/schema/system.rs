//! Logging configuration.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// `tracing_subscriber::EnvFilter` directive for the workspace crates.
    pub fn directive(&self) -> &'static str {
        match self {
            Self::Trace => "tabweave=trace",
            Self::Debug => "tabweave=debug",
            Self::Info => "tabweave=info",
            Self::Warn => "tabweave=warn",
            Self::Error => "tabweave=error",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: LogLevel,
}
