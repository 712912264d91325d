//! JSON side-cache of the parsed episode batch.
//!
//! A readable cache lets a re-run skip transcript parsing. Anything wrong
//! with the cache file is treated as a miss: the caller rebuilds from the
//! transcripts either way.

use serde::Serialize;
use std::io::Write;
use std::path::Path;

use crate::database::models::EpisodeBatch;
use crate::error::{IngestError, Result};

/// Load a cached batch, returning an empty batch on any failure.
pub fn load(location: &Path) -> EpisodeBatch {
    match try_load(location) {
        Ok(batch) => {
            log::info!(
                "Episode data loaded from {} ({} episodes)",
                location.display(),
                batch.len()
            );
            batch
        }
        Err(e) => {
            log::warn!("Episode cache unavailable, rebuilding: {}", e);
            Vec::new()
        }
    }
}

/// Load a cached batch, reporting why it could not be read.
pub fn try_load(location: &Path) -> Result<EpisodeBatch> {
    let content = std::fs::read_to_string(location).map_err(|e| {
        IngestError::Cache(format!("cannot read {}: {}", location.display(), e))
    })?;
    if content.trim().is_empty() {
        return Err(IngestError::Cache(format!("{} is empty", location.display())));
    }
    serde_json::from_str(&content).map_err(|e| {
        IngestError::Cache(format!("malformed cache {}: {}", location.display(), e))
    })
}

/// Write the batch as pretty JSON, replacing `location` atomically.
pub fn save(batch: &EpisodeBatch, location: &Path) -> Result<()> {
    let dir = match location.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut file = tempfile::NamedTempFile::new_in(dir)?;
    {
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut serializer = serde_json::Serializer::with_formatter(&mut file, formatter);
        batch.serialize(&mut serializer)?;
    }
    file.write_all(b"\n")?;
    file.as_file().sync_all()?;
    file.persist(location)
        .map_err(|e| IngestError::Cache(format!("cannot replace {}: {}", location.display(), e)))?;

    log::info!(
        "Episode data saved to {} ({} episodes)",
        location.display(),
        batch.len()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::models::{CharacterEntry, EpisodeRecord};
    use tempfile::TempDir;

    fn sample_batch() -> EpisodeBatch {
        vec![
            EpisodeRecord {
                episode_number: 1,
                season: 1,
                script: vec![
                    CharacterEntry {
                        character_name: "PICARD".to_string(),
                        lines: vec!["Engage.".to_string(), "Make it so.".to_string()],
                    },
                    CharacterEntry {
                        character_name: "WORF".to_string(),
                        lines: vec!["Qapla'! Señor, 日本語 🖖".to_string()],
                    },
                ],
            },
            EpisodeRecord {
                episode_number: 42,
                season: 0,
                script: vec![CharacterEntry {
                    character_name: "Q".to_string(),
                    lines: vec![],
                }],
            },
            EpisodeRecord {
                episode_number: 3,
                season: 6,
                script: vec![],
            },
        ]
    }

    #[test]
    fn test_save_then_load_round_trips() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("episodes_data.json");
        let batch = sample_batch();

        save(&batch, &path).unwrap();
        assert_eq!(load(&path), batch);
    }

    #[test]
    fn test_save_writes_non_ascii_unescaped() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("episodes_data.json");

        save(&sample_batch(), &path).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("日本語 🖖"));
        assert!(text.contains("\n    {"));
    }

    #[test]
    fn test_save_overwrites_existing_cache() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("episodes_data.json");

        save(&sample_batch(), &path).unwrap();
        save(&Vec::new(), &path).unwrap();
        assert!(load(&path).is_empty());
        assert_eq!(std::fs::read_dir(temp.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_load_missing_file_is_empty() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("missing.json");
        assert!(load(&path).is_empty());
        assert!(matches!(try_load(&path), Err(IngestError::Cache(_))));
    }

    #[test]
    fn test_load_empty_or_malformed_file_is_empty() {
        let temp = TempDir::new().unwrap();
        let empty = temp.path().join("empty.json");
        let broken = temp.path().join("broken.json");
        std::fs::write(&empty, "  \n").unwrap();
        std::fs::write(&broken, "[{\"episode_number\": ").unwrap();

        assert!(load(&empty).is_empty());
        assert!(load(&broken).is_empty());
        assert!(try_load(&broken).is_err());
    }

    #[test]
    fn test_load_legacy_key_names() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("legacy.json");
        std::fs::write(
            &path,
            r#"[
    {
        "episode_number": 5,
        "script": [
            {"nome personaggio": "KIRK", "battute": ["Beam me up."]}
        ]
    }
]"#,
        )
        .unwrap();

        let batch = try_load(&path).unwrap();
        assert_eq!(batch.len(), 1);
        assert_eq!(batch[0].episode_number, 5);
        assert_eq!(batch[0].season, 0);
        assert_eq!(batch[0].script[0].character_name, "KIRK");
        assert_eq!(batch[0].script[0].lines, vec!["Beam me up."]);
    }

    #[test]
    fn test_save_into_missing_directory_fails() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("no_such_dir").join("cache.json");
        assert!(save(&sample_batch(), &path).is_err());
    }
}
