//! Filename conventions: `<prefix>_e_<episode>` stems and the
//! prefix → season mapping.

use crate::error::{IngestError, Result};

/// Separator between the series prefix and the episode number in a stem.
pub const EPISODE_DELIMITER: &str = "_e_";

/// Ordered prefix → season mapping. Earlier entries win on overlap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeasonMap {
    entries: Vec<(String, u32)>,
}

impl Default for SeasonMap {
    fn default() -> Self {
        Self::from_pairs([
            ("VOY", 1),
            ("ENT", 2),
            ("TNG", 3),
            ("DS9", 4),
            ("TOS", 5),
            ("TAS", 6),
        ])
    }
}

impl SeasonMap {
    pub fn from_pairs<I, S>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (S, u32)>,
        S: Into<String>,
    {
        Self {
            entries: pairs
                .into_iter()
                .map(|(prefix, season)| (prefix.into(), season))
                .collect(),
        }
    }

    /// Parse `VOY:1,ENT:2,...` as written in the config file.
    pub fn parse(value: &str) -> Result<Self> {
        let mut entries = Vec::new();
        for item in value.split(',').map(str::trim).filter(|s| !s.is_empty()) {
            let (prefix, season) = item.split_once(':').ok_or_else(|| {
                IngestError::Config(format!("season entry '{}' is not PREFIX:SEASON", item))
            })?;
            let season = season.trim().parse::<u32>().map_err(|_| {
                IngestError::Config(format!("season for prefix '{}' is not a number", prefix.trim()))
            })?;
            entries.push((prefix.trim().to_string(), season));
        }
        if entries.is_empty() {
            return Err(IngestError::Config("SEASONS is empty".to_string()));
        }
        Ok(Self { entries })
    }

    pub fn resolve(&self, name: &str) -> u32 {
        resolve_season(name, self)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u32)> {
        self.entries.iter().map(|(prefix, season)| (prefix.as_str(), *season))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Season for a filename stem, or 0 if no prefix matches.
///
/// Prefixes are compared case-insensitively and tried in map order.
pub fn resolve_season(name: &str, prefix_map: &SeasonMap) -> u32 {
    let name = name.to_lowercase();
    prefix_map
        .iter()
        .find(|(prefix, _)| name.starts_with(&prefix.to_lowercase()))
        .map(|(_, season)| season)
        .unwrap_or(0)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EpisodeName {
    pub prefix: String,
    pub episode_number: i64,
}

/// Split a stem on the single `_e_` delimiter.
///
/// `None` when the delimiter is missing, repeated, or the episode part is
/// not an integer. The episode number must fit the store's 64-bit integer
/// column, so larger values are rejected here rather than at insert time.
pub fn parse_episode_name(stem: &str) -> Option<EpisodeName> {
    let mut parts = stem.split(EPISODE_DELIMITER);
    match (parts.next(), parts.next(), parts.next()) {
        (Some(prefix), Some(episode), None) => {
            let episode_number = episode.trim().parse::<i64>().ok()?;
            Some(EpisodeName {
                prefix: prefix.to_string(),
                episode_number,
            })
        }
        _ => None,
    }
}
