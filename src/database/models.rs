use serde::{Deserialize, Serialize};

/// One speaker's dialogue within a single episode, in file order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CharacterEntry {
    #[serde(rename = "character", alias = "nome personaggio")]
    pub character_name: String,
    #[serde(alias = "battute")]
    pub lines: Vec<String>,
}

impl CharacterEntry {
    pub fn new(character_name: impl Into<String>) -> Self {
        Self {
            character_name: character_name.into(),
            lines: Vec::new(),
        }
    }
}

/// A parsed transcript file.
///
/// `script` is ordered by each speaker's first appearance in the source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EpisodeRecord {
    pub episode_number: i64,
    /// 0 = prefix not in the season map
    #[serde(default)]
    pub season: u32,
    #[serde(default)]
    pub script: Vec<CharacterEntry>,
}

impl EpisodeRecord {
    pub fn line_count(&self) -> usize {
        self.script.iter().map(|entry| entry.lines.len()).sum()
    }
}

/// Records from one ingestion pass, in catalog order.
pub type EpisodeBatch = Vec<EpisodeRecord>;

/// Surrogate id assigned by the store to an inserted episode.
pub type PersistedEpisodeId = i64;

/// Episode row as stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredEpisode {
    pub id: i64,
    pub episode_number: i64,
    pub season: u32,
    pub added_date: String,
}

/// Character line row joined with its speaker's name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredLine {
    pub id: i64,
    pub episode_id: i64,
    pub character_name: String,
    pub line_text: String,
}
