use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tabweave_common::CacheType;

/// Tabweave: tab and session lifecycle manager for a webview browser shell.
#[derive(Parser, Debug)]
#[command(name = "tabweave", version, about)]
pub struct Args {
    /// Config file path override.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Log level override (trace, debug, info, warn, error).
    #[arg(long)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print the partition a tab with these options would use.
    Resolve {
        /// Tab id the partition is derived for.
        #[arg(long, default_value = "1")]
        tab: String,
        /// Explicit partition; wins over cache type and tag.
        #[arg(long)]
        partition: Option<String>,
        /// default, persistent, memory or isolated.
        #[arg(long, value_parser = parse_cache_type)]
        cache_type: Option<CacheType>,
        #[arg(long)]
        tag: Option<String>,
        #[arg(long)]
        incognito: bool,
    },
    /// Run a JSON-lines transcript of UI actions and page events against
    /// the in-process host and print the resulting tab state.
    Replay {
        file: PathBuf,
        /// Persist history and downloads to this JSON file instead of
        /// memory.
        #[arg(long)]
        store: Option<PathBuf>,
    },
    /// Print the effective configuration as JSON.
    Config,
}

pub fn parse() -> Args {
    Args::parse()
}

fn parse_cache_type(s: &str) -> Result<CacheType, String> {
    match s.to_ascii_lowercase().as_str() {
        "default" => Ok(CacheType::Default),
        "persistent" | "persist" => Ok(CacheType::Persistent),
        "memory" => Ok(CacheType::Memory),
        "isolated" => Ok(CacheType::Isolated),
        other => Err(format!(
            "unknown cache type {other:?} (expected default, persistent, memory or isolated)"
        )),
    }
}
