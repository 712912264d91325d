use std::collections::HashMap;
use std::path::Path;

use crate::database::models::{CharacterEntry, EpisodeRecord};
use crate::error::ParseError;

use super::naming::{parse_episode_name, SeasonMap};

/// Extension every transcript file carries.
pub const TRANSCRIPT_EXTENSION: &str = ".txt";

/// Parse one transcript file into an episode record.
///
/// The file name decides the episode number and season; the body is read as
/// `<speaker>:<utterance>` lines.
pub fn parse_file(path: &Path, seasons: &SeasonMap) -> Result<EpisodeRecord, ParseError> {
    let file = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());

    let stem = file.strip_suffix(TRANSCRIPT_EXTENSION).unwrap_or(&file);
    let name = parse_episode_name(stem).ok_or_else(|| ParseError::MalformedName {
        file: file.clone(),
    })?;

    let content = std::fs::read_to_string(path).map_err(|source| ParseError::Io {
        file: file.clone(),
        source,
    })?;

    Ok(EpisodeRecord {
        episode_number: name.episode_number,
        season: seasons.resolve(&name.prefix),
        script: parse_script(&content),
    })
}

/// Group transcript lines by speaker.
///
/// Lines are split on the first colon and both halves trimmed; lines with no
/// colon are dropped. Speakers are matched exactly, so `Data` and `DATA` are
/// separate entries.
pub fn parse_script(content: &str) -> Vec<CharacterEntry> {
    let mut script = ScriptBuilder::default();
    for line in content.lines() {
        if let Some((speaker, utterance)) = line.split_once(':') {
            script.push(speaker.trim(), utterance.trim());
        }
    }
    script.finish()
}

/// Entries in first-appearance order plus a name → position index.
#[derive(Default)]
struct ScriptBuilder {
    entries: Vec<CharacterEntry>,
    index: HashMap<String, usize>,
}

impl ScriptBuilder {
    fn push(&mut self, speaker: &str, utterance: &str) {
        let position = match self.index.get(speaker) {
            Some(&position) => position,
            None => {
                self.entries.push(CharacterEntry::new(speaker));
                self.index.insert(speaker.to_string(), self.entries.len() - 1);
                self.entries.len() - 1
            }
        };
        self.entries[position].lines.push(utterance.to_string());
    }

    fn finish(self) -> Vec<CharacterEntry> {
        self.entries
    }
}
