pub mod naming;
pub mod parser;


use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::database::models::EpisodeBatch;
use crate::error::{IngestError, Result};

pub use naming::{parse_episode_name, resolve_season, EpisodeName, SeasonMap};
pub use parser::{parse_file, parse_script, TRANSCRIPT_EXTENSION};

/// A transcript file that was left out of the batch, and why.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub file: String,
    pub message: String,
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.file, self.message)
    }
}

/// Result of scanning a transcript directory.
#[derive(Debug, Default)]
pub struct CatalogBuild {
    pub batch: EpisodeBatch,
    pub diagnostics: Vec<Diagnostic>,
}

/// Regular `.txt` files in `directory`, sorted by file name.
pub fn find_transcripts(directory: &Path) -> Result<Vec<PathBuf>> {
    let entries = std::fs::read_dir(directory).map_err(|e| {
        IngestError::Io(format!(
            "Cannot read transcript directory {}: {}",
            directory.display(),
            e
        ))
    })?;

    Ok(select_transcripts(
        entries.map(|entry| entry.map(|e| e.path())),
        directory,
    ))
}

/// Keep the regular `.txt` paths, sorted. An entry that cannot be read is
/// logged and left out.
fn select_transcripts<I>(entries: I, directory: &Path) -> Vec<PathBuf>
where
    I: IntoIterator<Item = std::io::Result<PathBuf>>,
{
    let mut files = Vec::new();
    for entry in entries {
        let path = match entry {
            Ok(path) => path,
            Err(e) => {
                log::warn!("Unreadable entry in {}: {}. Ignored.", directory.display(), e);
                continue;
            }
        };
        let is_transcript = path
            .file_name()
            .and_then(|name| name.to_str())
            .map(|name| name.ends_with(TRANSCRIPT_EXTENSION))
            .unwrap_or(false);
        if is_transcript && path.is_file() {
            files.push(path);
        }
    }
    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    files
}

/// Parse every transcript in `directory` into an episode batch.
///
/// Files that fail to parse are skipped and reported in `diagnostics`; only
/// an unreadable directory is an error.
pub fn build_batch(directory: &Path, seasons: &SeasonMap) -> Result<CatalogBuild> {
    let files = find_transcripts(directory)?;
    log::info!(
        "Found {} transcript files in {}",
        files.len(),
        directory.display()
    );

    let mut build = CatalogBuild::default();
    for path in files {
        match parse_file(&path, seasons) {
            Ok(record) => {
                log::debug!(
                    "Parsed episode {} (season {}): {} characters, {} lines",
                    record.episode_number,
                    record.season,
                    record.script.len(),
                    record.line_count()
                );
                build.batch.push(record);
            }
            Err(e) => {
                log::warn!("{}. Ignored.", e);
                build.diagnostics.push(Diagnostic {
                    file: e.file().to_string(),
                    message: e.to_string(),
                });
            }
        }
    }

    Ok(build)
}
