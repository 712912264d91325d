//! Key/value run configuration.
//!
//! ```text
//! PATH=/data/transcripts
//! SERVER=/data/episodes.db
//! SEASONS=VOY:1,ENT:2
//! ```
//!
//! Line 1 is always `PATH` and line 2 always `SERVER`. Extra keys may follow.

use std::path::Path;

use crate::catalog::SeasonMap;
use crate::error::{IngestError, Result};

/// Config file contents; a field is `None` when its line lacked the key.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngestConfig {
    pub transcript_directory: Option<String>,
    pub store_endpoint: Option<String>,
    pub seasons: Option<SeasonMap>,
}

/// Config with both required values present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedConfig {
    pub transcript_directory: String,
    pub store_endpoint: String,
    pub seasons: SeasonMap,
}

impl IngestConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            IngestError::Config(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self> {
        let mut config = Self::default();
        let mut lines = content.lines();

        if let Some(line) = lines.next() {
            config.transcript_directory = keyed_value(line, "PATH", 1)?;
        }
        if let Some(line) = lines.next() {
            config.store_endpoint = keyed_value(line, "SERVER", 2)?;
        }

        for (offset, line) in lines.enumerate() {
            let line_no = offset + 3;
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') || trimmed.starts_with(';') {
                continue;
            }
            match trimmed.split_once('=') {
                Some((key, value)) if key.trim() == "SEASONS" => {
                    config.seasons = Some(SeasonMap::parse(value)?);
                }
                Some((key, _)) => {
                    log::warn!("Ignoring unknown config key '{}' on line {}", key.trim(), line_no);
                }
                None => {
                    return Err(IngestError::Config(format!(
                        "line {} is not KEY=VALUE",
                        line_no
                    )));
                }
            }
        }

        Ok(config)
    }

    pub fn resolve(self) -> Result<ResolvedConfig> {
        let transcript_directory = self
            .transcript_directory
            .ok_or_else(|| IngestError::Config("PATH is not set (expected on line 1)".to_string()))?;
        let store_endpoint = self
            .store_endpoint
            .ok_or_else(|| IngestError::Config("SERVER is not set (expected on line 2)".to_string()))?;
        Ok(ResolvedConfig {
            transcript_directory,
            store_endpoint,
            seasons: self.seasons.unwrap_or_default(),
        })
    }
}

/// Value after the first `=` when `line` starts with `key`.
fn keyed_value(line: &str, key: &str, line_no: usize) -> Result<Option<String>> {
    if !line.starts_with(key) {
        return Ok(None);
    }
    match line.split_once('=') {
        Some((_, value)) => Ok(Some(value.trim().to_string())),
        None => Err(IngestError::Config(format!(
            "line {} starts with {} but has no '='",
            line_no, key
        ))),
    }
}
