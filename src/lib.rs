pub mod cache;
pub mod catalog;
pub mod config;
pub mod database;
pub mod error;
pub mod gateway;

use std::path::{Path, PathBuf};

use catalog::Diagnostic;
use config::ResolvedConfig;
use database::{EpisodeBatch, PersistedEpisodeId, SqliteConnector};
use error::Result;
use gateway::{LineInsertReport, PersistenceGateway, StoreConnector};

pub use catalog::{build_batch, parse_file, resolve_season, SeasonMap};
pub use config::IngestConfig;
pub use database::{CharacterEntry, Database, EpisodeRecord};
pub use error::{IngestError, ParseError, StoreError};

/// Cache file used when the caller does not name one.
pub const DEFAULT_CACHE_FILE: &str = "episodes_data.json";

#[derive(Debug, Clone)]
pub struct IngestOptions {
    pub config: ResolvedConfig,
    pub cache_path: PathBuf,
    /// Ignore any existing cache and re-parse the transcripts.
    pub rebuild: bool,
    /// Stop after the cache step.
    pub skip_store: bool,
}

impl IngestOptions {
    pub fn new(config: ResolvedConfig) -> Self {
        Self {
            config,
            cache_path: PathBuf::from(DEFAULT_CACHE_FILE),
            rebuild: false,
            skip_store: false,
        }
    }
}

/// What a run did, for logging and the exit status.
#[derive(Debug, Default)]
pub struct RunSummary {
    pub episodes: usize,
    pub from_cache: bool,
    pub diagnostics: Vec<Diagnostic>,
    pub episode_ids: Vec<Option<PersistedEpisodeId>>,
    pub lines: Option<LineInsertReport>,
}

impl RunSummary {
    pub fn missing_ids(&self) -> usize {
        self.episode_ids.iter().filter(|id| id.is_none()).count()
    }

    /// True when every episode got an id and every line group committed.
    pub fn store_complete(&self) -> bool {
        self.missing_ids() == 0 && self.lines.as_ref().map_or(true, |r| r.failed.is_empty())
    }

    /// Process exit status for a run that finished: `0` clean, `2` when some
    /// episodes or line groups did not reach the store.
    pub fn exit_code(&self) -> u8 {
        if self.store_complete() {
            0
        } else {
            2
        }
    }
}

/// Cached batch if there is one, otherwise a fresh parse saved to the cache.
pub fn load_or_build(
    transcript_directory: &Path,
    seasons: &SeasonMap,
    cache_path: &Path,
    rebuild: bool,
) -> Result<(EpisodeBatch, Vec<Diagnostic>, bool)> {
    if !rebuild {
        let cached = cache::load(cache_path);
        if !cached.is_empty() {
            return Ok((cached, Vec::new(), true));
        }
    }

    let build = build_batch(transcript_directory, seasons)?;
    if let Err(e) = cache::save(&build.batch, cache_path) {
        log::error!("Error saving episode data to {}: {}", cache_path.display(), e);
    }
    Ok((build.batch, build.diagnostics, false))
}

/// Write a batch through both gateway phases.
pub fn persist<C: StoreConnector>(
    gateway: &PersistenceGateway<C>,
    batch: &EpisodeBatch,
) -> Result<(Vec<Option<PersistedEpisodeId>>, LineInsertReport)> {
    let ids = gateway.insert_episodes(batch)?;
    let report = gateway.insert_character_lines(batch, &ids)?;
    Ok((ids, report))
}

/// Full ingestion: cache or parse, then insert episodes and their lines.
pub fn run(options: &IngestOptions) -> Result<RunSummary> {
    let config = &options.config;
    let (batch, diagnostics, from_cache) = load_or_build(
        Path::new(&config.transcript_directory),
        &config.seasons,
        &options.cache_path,
        options.rebuild,
    )?;

    let mut summary = RunSummary {
        episodes: batch.len(),
        from_cache,
        diagnostics,
        ..Default::default()
    };

    if options.skip_store {
        log::info!("Store step skipped; {} episodes ready", batch.len());
        return Ok(summary);
    }

    let gateway = PersistenceGateway::new(SqliteConnector::new(&config.store_endpoint));
    let (ids, report) = persist(&gateway, &batch)?;
    summary.episode_ids = ids;
    summary.lines = Some(report);
    Ok(summary)
}
