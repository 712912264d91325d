use thiserror::Error;

/// Typed error hierarchy for an ingestion run.
///
/// File- and row-level problems are recovered close to where they happen
/// and only show up here when a caller asks for them explicitly; the
/// variants that escape `run` are the fatal ones (config, directory,
/// connection-level store failures).
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("Config error: {0}")]
    Config(String),

    #[error("Cache error: {0}")]
    Cache(String),

    #[error("Store connection error: {0}")]
    StoreConnection(String),

    #[error("Store row error: {0}")]
    StoreRow(String),

    #[error("{0}")]
    Io(String),

    #[error("Episode id list has {ids} entries but the batch has {episodes}")]
    IdMismatch { ids: usize, episodes: usize },
}

/// Per-file failure; the catalog builder skips the file and moves on.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("Incorrect naming format for file {file}")]
    MalformedName { file: String },

    #[error("Error reading file {file}: {source}")]
    Io {
        file: String,
        #[source]
        source: std::io::Error,
    },
}

impl ParseError {
    /// File name the error refers to.
    pub fn file(&self) -> &str {
        match self {
            ParseError::MalformedName { file } | ParseError::Io { file, .. } => file,
        }
    }
}

/// Failure reported by a store session.
///
/// `Row` covers a single rejected insert and leaves the session usable;
/// `Connection` means the session itself is gone.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("{0}")]
    Connection(String),

    #[error("{0}")]
    Row(String),
}

// ── From impls ─────────────────────────────────────────────────────────────

impl From<StoreError> for IngestError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Connection(msg) => IngestError::StoreConnection(msg),
            StoreError::Row(msg) => IngestError::StoreRow(msg),
        }
    }
}

impl From<rusqlite::Error> for IngestError {
    fn from(e: rusqlite::Error) -> Self {
        IngestError::from(StoreError::from(e))
    }
}

impl From<std::io::Error> for IngestError {
    fn from(e: std::io::Error) -> Self {
        IngestError::Io(e.to_string())
    }
}

impl From<serde_json::Error> for IngestError {
    fn from(e: serde_json::Error) -> Self {
        IngestError::Cache(e.to_string())
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(e: rusqlite::Error) -> Self {
        use rusqlite::ErrorCode;

        match &e {
            rusqlite::Error::SqliteFailure(err, _)
                if matches!(
                    err.code,
                    ErrorCode::ConstraintViolation | ErrorCode::TypeMismatch | ErrorCode::TooBig
                ) =>
            {
                StoreError::Row(e.to_string())
            }
            rusqlite::Error::QueryReturnedNoRows
            | rusqlite::Error::FromSqlConversionFailure(..)
            | rusqlite::Error::ToSqlConversionFailure(_)
            | rusqlite::Error::IntegralValueOutOfRange(..) => StoreError::Row(e.to_string()),
            _ => StoreError::Connection(e.to_string()),
        }
    }
}

pub type Result<T, E = IngestError> = std::result::Result<T, E>;
