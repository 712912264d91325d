//! `episode-ingest` -- load transcript files into the episode store.
//!
//! Exit status: `0` clean run, `1` fatal error, `2` finished but some
//! episodes or line groups did not reach the store.

use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use episode_ingest::{IngestConfig, IngestOptions, RunSummary, DEFAULT_CACHE_FILE};

#[derive(Parser, Debug)]
#[command(name = "episode-ingest", version, about = "Parse episode transcripts and load them into the store")]
struct Args {
    /// Config file with PATH= and SERVER= lines; prompted for when omitted
    config: Option<PathBuf>,

    /// Where the parsed batch is cached between runs
    #[arg(long, default_value = DEFAULT_CACHE_FILE)]
    cache: PathBuf,

    /// Re-parse transcripts even if the cache is readable
    #[arg(long)]
    rebuild: bool,

    /// Build and cache the batch without writing to the store
    #[arg(long)]
    no_store: bool,
}

fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "episode_ingest=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    let config_path = match args.config.clone().map(Ok).unwrap_or_else(prompt_config_path) {
        Ok(path) => path,
        Err(e) => {
            tracing::error!("{:#}", e);
            return ExitCode::FAILURE;
        }
    };

    let config = match IngestConfig::load(&config_path).and_then(IngestConfig::resolve) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    tracing::info!(
        transcripts = %config.transcript_directory,
        store = %config.store_endpoint,
        "Starting ingestion"
    );

    let options = IngestOptions {
        config,
        cache_path: args.cache,
        rebuild: args.rebuild,
        skip_store: args.no_store,
    };

    match episode_ingest::run(&options) {
        Ok(summary) => report(&summary),
        Err(e) => {
            tracing::error!("Ingestion failed: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn prompt_config_path() -> anyhow::Result<PathBuf> {
    print!("Config file (.ini): ");
    std::io::stdout().flush()?;
    let mut line = String::new();
    std::io::stdin()
        .lock()
        .read_line(&mut line)
        .context("failed to read config path from stdin")?;
    let path = line.trim();
    anyhow::ensure!(!path.is_empty(), "no config file given");
    Ok(PathBuf::from(path))
}

fn report(summary: &RunSummary) -> ExitCode {
    // per-file and per-episode problems were already logged as they happened
    tracing::info!(
        episodes = summary.episodes,
        from_cache = summary.from_cache,
        skipped_files = summary.diagnostics.len(),
        "Episode batch ready"
    );

    if let Some(lines) = &summary.lines {
        tracing::info!(
            episodes_inserted = summary.episode_ids.len() - summary.missing_ids(),
            episodes_missing_id = summary.missing_ids(),
            lines_inserted = lines.lines_inserted,
            line_groups_rolled_back = lines.failed.len(),
            "Store updated"
        );
    }

    ExitCode::from(summary.exit_code())
}
