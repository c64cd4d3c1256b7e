mod cli;
mod replay;

use std::process::ExitCode;
use std::sync::Arc;

use tabweave_common::{CacheType, JsonFileStore, KeyValueStore, MemoryStore, TabId, TabweaveError};
use tabweave_config::TabweaveConfig;
use tabweave_tabs::TabSettings;
use tabweave_webview::PartitionRequest;
use tracing_subscriber::EnvFilter;

use crate::cli::{Args, Command};
use crate::replay::{parse_transcript, Replay};

fn install_panic_hook() {
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let path = tabweave_platform::crash_report::write_crash_report(info);

        eprintln!("\n--- Tabweave crashed ---");
        if let Some(p) = &path {
            eprintln!("Crash report written to: {}", p.display());
        }
        eprintln!("------------------------\n");

        default_hook(info);
    }));
}

/// A bare level applies to the workspace crates; anything else is taken
/// as a full filter directive.
fn log_directive(args: &Args, config: &TabweaveConfig) -> String {
    match args.log_level.as_deref() {
        Some(level) if level.contains('=') => level.to_string(),
        Some(level) => format!("tabweave={level}"),
        None => config.logging.level.directive().to_string(),
    }
}

fn load_config(args: &Args) -> TabweaveConfig {
    let loaded = match &args.config {
        Some(path) => tabweave_config::load_config_from(path),
        None => tabweave_config::load_config(),
    };
    loaded.unwrap_or_else(|e| {
        eprintln!("tabweave: config load failed, using defaults: {e}");
        TabweaveConfig::default()
    })
}

fn main() -> ExitCode {
    install_panic_hook();

    let args = cli::parse();
    let config = load_config(&args);

    let directive = log_directive(&args, &config);
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&directive));
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .init();

    tracing::info!("Tabweave v{} starting...", env!("CARGO_PKG_VERSION"));
    if let Some(path) = &args.config {
        tracing::info!("Using config override: {}", path.display());
    }

    if let Err(e) = tabweave_platform::ensure_dirs() {
        tracing::warn!("Failed to create directories: {e}");
    }

    match run(&args, config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{e}");
            eprintln!("tabweave: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args, config: TabweaveConfig) -> Result<(), TabweaveError> {
    match &args.command {
        Command::Resolve {
            tab,
            partition,
            cache_type,
            tag,
            incognito,
        } => {
            let cache_type = cache_type.unwrap_or(config.partitions.default_cache_type);
            // isolated partitions only take a tag when one is asked for
            let tag = tag.clone().or_else(|| {
                (cache_type != CacheType::Isolated).then(|| config.partitions.default_tag.clone())
            });
            let request = PartitionRequest {
                explicit: partition.clone(),
                cache_type,
                tag,
                incognito: *incognito,
            };
            let resolved = request.resolve(&TabId::from(tab.as_str()));
            let out = serde_json::json!({
                "partition": resolved.as_str(),
                "kind": resolved.kind(),
                "durable": resolved.is_durable(),
            });
            println!("{}", to_pretty(&out)?);
        }
        Command::Config => {
            println!("{}", tabweave_config::config_to_json(&config));
        }
        Command::Replay { file, store } => {
            let text = std::fs::read_to_string(file)?;
            let steps = parse_transcript(&text).map_err(|e| TabweaveError::Other(e.to_string()))?;
            tracing::info!(steps = steps.len(), file = %file.display(), "replaying transcript");

            let store: Arc<dyn KeyValueStore> = match store {
                Some(path) => Arc::new(JsonFileStore::open(path)?),
                None => Arc::new(MemoryStore::new()),
            };
            let downloads = tabweave_platform::downloads_dir(config.downloads.directory.as_deref())?;

            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()?;
            let mut replay = Replay::new(TabSettings::from_config(&config), store, downloads);
            runtime
                .block_on(replay.run(&steps))
                .map_err(|e| TabweaveError::Other(e.to_string()))?;
            let report = replay.report().map_err(|e| TabweaveError::Other(e.to_string()))?;
            println!("{}", to_pretty(&report)?);
        }
    }
    Ok(())
}

fn to_pretty<T: serde::Serialize>(value: &T) -> Result<String, TabweaveError> {
    serde_json::to_string_pretty(value).map_err(|e| TabweaveError::Other(e.to_string()))
}
