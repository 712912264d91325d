pub mod models;

#[cfg(test)]
mod tests;

use rusqlite::{params, Connection, OptionalExtension};
use std::path::{Path, PathBuf};

use crate::error::{Result, StoreError};
use crate::gateway::{StoreConnector, StoreSession};

pub use models::*;

const LINE_GROUP: &str = "episode_lines";

/// SQLite-backed episode store.
pub struct Database {
    conn: Connection,
}

impl Database {
    pub fn new(db_path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open(db_path).map_err(|e| {
            StoreError::Connection(format!("cannot open {}: {}", db_path.display(), e))
        })?;

        conn.execute_batch(
            "
            PRAGMA journal_mode=WAL;
            PRAGMA synchronous=NORMAL;
            PRAGMA foreign_keys=ON;
        ",
        )
        .map_err(|e| StoreError::Connection(e.to_string()))?;

        let db = Self { conn };
        db.init_schema()?;
        Ok(db)
    }

    fn init_schema(&self) -> Result<(), StoreError> {
        self.conn
            .execute_batch(
                r#"
            CREATE TABLE IF NOT EXISTS episodes (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                episode_number INTEGER NOT NULL,
                season INTEGER NOT NULL DEFAULT 0,
                added_date TEXT NOT NULL DEFAULT (datetime('now'))
            );

            CREATE INDEX IF NOT EXISTS idx_episodes_number ON episodes(season, episode_number);

            CREATE TABLE IF NOT EXISTS characters (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL UNIQUE
            );

            CREATE TABLE IF NOT EXISTS character_lines (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                character_id INTEGER NOT NULL,
                episode_id INTEGER NOT NULL,
                line_text TEXT NOT NULL,
                FOREIGN KEY (character_id) REFERENCES characters(id) ON DELETE CASCADE,
                FOREIGN KEY (episode_id) REFERENCES episodes(id) ON DELETE CASCADE
            );

            CREATE INDEX IF NOT EXISTS idx_lines_episode ON character_lines(episode_id);
            CREATE INDEX IF NOT EXISTS idx_lines_character ON character_lines(character_id);
            "#,
            )
            .map_err(|e| StoreError::Connection(format!("schema setup failed: {}", e)))
    }

    // =========================================================================
    // Store operations
    // =========================================================================

    /// `InsertEpisode`: add an episode row and return its id.
    pub fn insert_episode(&self, episode_number: i64, season: u32) -> Result<i64, StoreError> {
        let now = chrono::Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO episodes (episode_number, season, added_date) VALUES (?1, ?2, ?3)",
            params![episode_number, season, now],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// `InsertCharacterLines`: attach one line to an episode, creating the
    /// character on first use.
    pub fn insert_character_line(
        &self,
        character_name: &str,
        episode_id: i64,
        line_text: &str,
    ) -> Result<i64, StoreError> {
        self.conn
            .prepare_cached("INSERT INTO characters (name) VALUES (?1) ON CONFLICT(name) DO NOTHING")?
            .execute(params![character_name])?;
        let character_id: i64 = self
            .conn
            .prepare_cached("SELECT id FROM characters WHERE name = ?1")?
            .query_row(params![character_name], |row| row.get(0))?;
        self.conn
            .prepare_cached(
                "INSERT INTO character_lines (character_id, episode_id, line_text) VALUES (?1, ?2, ?3)",
            )?
            .execute(params![character_id, episode_id, line_text])?;
        Ok(self.conn.last_insert_rowid())
    }

    // =========================================================================
    // Queries
    // =========================================================================

    pub fn get_episodes(&self) -> Result<Vec<StoredEpisode>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, episode_number, season, added_date FROM episodes ORDER BY id",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(StoredEpisode {
                id: row.get(0)?,
                episode_number: row.get(1)?,
                season: row.get(2)?,
                added_date: row.get(3)?,
            })
        })?;
        let mut episodes = Vec::new();
        for row in rows {
            episodes.push(row?);
        }
        Ok(episodes)
    }

    pub fn get_episode(&self, id: i64) -> Result<Option<StoredEpisode>> {
        let episode = self
            .conn
            .query_row(
                "SELECT id, episode_number, season, added_date FROM episodes WHERE id = ?1",
                params![id],
                |row| {
                    Ok(StoredEpisode {
                        id: row.get(0)?,
                        episode_number: row.get(1)?,
                        season: row.get(2)?,
                        added_date: row.get(3)?,
                    })
                },
            )
            .optional()?;
        Ok(episode)
    }

    /// Lines for one episode in insertion order.
    pub fn get_character_lines(&self, episode_id: i64) -> Result<Vec<StoredLine>> {
        let mut stmt = self.conn.prepare(
            "SELECT l.id, l.episode_id, c.name, l.line_text
             FROM character_lines l
             JOIN characters c ON c.id = l.character_id
             WHERE l.episode_id = ?1
             ORDER BY l.id",
        )?;
        let rows = stmt.query_map(params![episode_id], |row| {
            Ok(StoredLine {
                id: row.get(0)?,
                episode_id: row.get(1)?,
                character_name: row.get(2)?,
                line_text: row.get(3)?,
            })
        })?;
        let mut lines = Vec::new();
        for row in rows {
            lines.push(row?);
        }
        Ok(lines)
    }

    pub fn count_character_lines(&self) -> Result<i64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM character_lines", [], |row| row.get(0))?;
        Ok(count)
    }

    pub fn count_characters(&self) -> Result<i64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM characters", [], |row| row.get(0))?;
        Ok(count)
    }
}

// =============================================================================
// Sessions
// =============================================================================

/// Opens a fresh [`Database`] per session at a fixed path.
#[derive(Debug, Clone)]
pub struct SqliteConnector {
    path: PathBuf,
}

impl SqliteConnector {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn open(&self) -> Result<SqliteSession, StoreError> {
        SqliteSession::begin(Database::new(&self.path)?)
    }
}

impl StoreConnector for SqliteConnector {
    fn connect(&self) -> Result<Box<dyn StoreSession + '_>, StoreError> {
        Ok(Box::new(self.open()?))
    }
}

/// One connection holding one transaction.
///
/// Dropped without [`StoreSession::commit`], the transaction is rolled back
/// and the connection closed.
pub struct SqliteSession {
    db: Database,
    finished: bool,
}

impl SqliteSession {
    fn begin(db: Database) -> Result<Self, StoreError> {
        db.conn
            .execute_batch("BEGIN")
            .map_err(|e| StoreError::Connection(format!("cannot begin transaction: {}", e)))?;
        Ok(Self { db, finished: false })
    }

    fn run(&self, sql: &str) -> Result<(), StoreError> {
        self.db
            .conn
            .execute_batch(sql)
            .map_err(|e| StoreError::Connection(e.to_string()))
    }
}

impl StoreSession for SqliteSession {
    fn insert_episode(&mut self, episode_number: i64, season: u32) -> Result<Option<i64>, StoreError> {
        self.db.insert_episode(episode_number, season).map(Some)
    }

    fn insert_character_line(
        &mut self,
        character_name: &str,
        episode_id: i64,
        line_text: &str,
    ) -> Result<(), StoreError> {
        self.db
            .insert_character_line(character_name, episode_id, line_text)
            .map(|_| ())
    }

    fn begin_group(&mut self) -> Result<(), StoreError> {
        self.run(&format!("SAVEPOINT {}", LINE_GROUP))
    }

    fn commit_group(&mut self) -> Result<(), StoreError> {
        self.run(&format!("RELEASE {}", LINE_GROUP))
    }

    fn rollback_group(&mut self) -> Result<(), StoreError> {
        self.run(&format!("ROLLBACK TO {0}; RELEASE {0}", LINE_GROUP))
    }

    fn commit(mut self: Box<Self>) -> Result<(), StoreError> {
        self.run("COMMIT")?;
        self.finished = true;
        Ok(())
    }
}

impl Drop for SqliteSession {
    fn drop(&mut self) {
        if !self.finished {
            if let Err(e) = self.db.conn.execute_batch("ROLLBACK") {
                log::warn!("Rollback on session release failed: {}", e);
            }
        }
    }
}
