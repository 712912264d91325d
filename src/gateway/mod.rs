//! Two-phase write of an episode batch into the relational store.
//!
//! Phase one inserts every episode and captures the store-assigned ids,
//! keeping one slot per batch entry. Phase two inserts each episode's
//! character lines against its id. Each phase runs on its own session,
//! which is released on every exit path.


use serde::Serialize;

use crate::database::models::{EpisodeBatch, EpisodeRecord, PersistedEpisodeId};
use crate::error::{IngestError, Result, StoreError};

/// One open connection with one open transaction.
///
/// Dropping a session that was never committed must roll back everything
/// it issued and release the connection.
pub trait StoreSession {
    /// `InsertEpisode`: `Ok(None)` when the store assigned no id.
    fn insert_episode(
        &mut self,
        episode_number: i64,
        season: u32,
    ) -> Result<Option<PersistedEpisodeId>, StoreError>;

    /// `InsertCharacterLines` for a single line.
    fn insert_character_line(
        &mut self,
        character_name: &str,
        episode_id: PersistedEpisodeId,
        line_text: &str,
    ) -> Result<(), StoreError>;

    /// Open a nested unit that can be undone without ending the session.
    fn begin_group(&mut self) -> Result<(), StoreError>;

    fn commit_group(&mut self) -> Result<(), StoreError>;

    fn rollback_group(&mut self) -> Result<(), StoreError>;

    fn commit(self: Box<Self>) -> Result<(), StoreError>;
}

/// Opens sessions against a store endpoint.
pub trait StoreConnector {
    fn connect(&self) -> Result<Box<dyn StoreSession + '_>, StoreError>;
}

/// An episode whose character lines were not written because it has no id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedEpisode {
    pub index: usize,
    pub episode_number: i64,
    pub reason: String,
}

/// An episode whose line group was rolled back after a row failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedEpisode {
    pub index: usize,
    pub episode_number: i64,
    pub character_name: String,
    pub line_text: String,
    pub error: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LineInsertReport {
    pub lines_inserted: usize,
    pub episodes_written: usize,
    pub skipped: Vec<SkippedEpisode>,
    pub failed: Vec<FailedEpisode>,
}

impl LineInsertReport {
    pub fn is_complete(&self) -> bool {
        self.skipped.is_empty() && self.failed.is_empty()
    }
}

pub struct PersistenceGateway<C> {
    connector: C,
}

impl<C: StoreConnector> PersistenceGateway<C> {
    pub fn new(connector: C) -> Self {
        Self { connector }
    }

    pub fn connector(&self) -> &C {
        &self.connector
    }

    /// Insert every episode and return one id slot per batch entry.
    ///
    /// A row the store rejects leaves `None` in its slot and the loop moves
    /// on. A connection-level failure abandons the whole call; the session
    /// is dropped, which rolls back what was already inserted.
    pub fn insert_episodes(
        &self,
        batch: &EpisodeBatch,
    ) -> Result<Vec<Option<PersistedEpisodeId>>> {
        let mut session = self.connector.connect()?;
        let mut ids = Vec::with_capacity(batch.len());

        for record in batch {
            match session.insert_episode(record.episode_number, record.season) {
                Ok(Some(id)) => ids.push(Some(id)),
                Ok(None) => {
                    log::warn!(
                        "Error inserting episode {}, season {}: no id returned",
                        record.episode_number,
                        record.season
                    );
                    ids.push(None);
                }
                Err(StoreError::Row(e)) => {
                    log::warn!(
                        "Error inserting episode {}, season {}: {}",
                        record.episode_number,
                        record.season,
                        e
                    );
                    ids.push(None);
                }
                Err(e @ StoreError::Connection(_)) => {
                    log::error!(
                        "Store connection lost while inserting episode {}: {}",
                        record.episode_number,
                        e
                    );
                    return Err(e.into());
                }
            }
        }

        session.commit()?;
        log::info!(
            "Episodes inserted: {} of {}",
            ids.iter().filter(|id| id.is_some()).count(),
            batch.len()
        );
        Ok(ids)
    }

    /// Insert each episode's character lines under its id.
    ///
    /// `ids` must line up with `batch` index for index. Episodes without an
    /// id are skipped. Each episode's lines are written as one group: a row
    /// failure rolls that group back and the next episode proceeds.
    pub fn insert_character_lines(
        &self,
        batch: &EpisodeBatch,
        ids: &[Option<PersistedEpisodeId>],
    ) -> Result<LineInsertReport> {
        if ids.len() != batch.len() {
            return Err(IngestError::IdMismatch {
                ids: ids.len(),
                episodes: batch.len(),
            });
        }

        let mut session = self.connector.connect()?;
        let mut report = LineInsertReport::default();

        for (index, (record, id)) in batch.iter().zip(ids).enumerate() {
            let Some(episode_id) = *id else {
                log::warn!(
                    "Skipping lines for episode {} (index {}): its id could not be obtained",
                    record.episode_number,
                    index
                );
                report.skipped.push(SkippedEpisode {
                    index,
                    episode_number: record.episode_number,
                    reason: "episode id could not be obtained".to_string(),
                });
                continue;
            };

            session.begin_group()?;
            match insert_script(session.as_mut(), record, episode_id) {
                Ok(count) => {
                    session.commit_group()?;
                    report.lines_inserted += count;
                    report.episodes_written += 1;
                }
                Err(LineFailure { character_name, line_text, error: StoreError::Row(e) }) => {
                    log::warn!(
                        "Rolling back lines for episode {}: character '{}' failed: {}",
                        record.episode_number,
                        character_name,
                        e
                    );
                    session.rollback_group()?;
                    report.failed.push(FailedEpisode {
                        index,
                        episode_number: record.episode_number,
                        character_name,
                        line_text,
                        error: e,
                    });
                }
                Err(LineFailure { error, .. }) => {
                    log::error!(
                        "Store connection lost while inserting lines for episode {}: {}",
                        record.episode_number,
                        error
                    );
                    return Err(error.into());
                }
            }
        }

        session.commit()?;
        log::info!(
            "Characters and lines inserted: {} lines across {} episodes",
            report.lines_inserted,
            report.episodes_written
        );
        Ok(report)
    }
}

struct LineFailure {
    character_name: String,
    line_text: String,
    error: StoreError,
}

fn insert_script<S: StoreSession + ?Sized>(
    session: &mut S,
    record: &EpisodeRecord,
    episode_id: PersistedEpisodeId,
) -> std::result::Result<usize, LineFailure> {
    let mut count = 0;
    for entry in &record.script {
        for line in &entry.lines {
            session
                .insert_character_line(&entry.character_name, episode_id, line)
                .map_err(|error| LineFailure {
                    character_name: entry.character_name.clone(),
                    line_text: line.clone(),
                    error,
                })?;
            count += 1;
        }
    }
    Ok(count)
}
