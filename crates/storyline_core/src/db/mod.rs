//! Project database bootstrap and schema steps.
//!
//! # Responsibility
//! - Open a `.storyline` project file (or an in-memory project) with the
//!   pragmas the repository layer relies on.
//! - Bring the file up to the project schema this build writes.
//!
//! # Invariants
//! - The project schema version lives in `PRAGMA user_version`.
//! - Repositories only see connections whose schema steps all succeeded.

use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod migrations;
mod open;

pub use migrations::AppliedStep;
pub use open::{open_db, open_db_in_memory};

pub type DbResult<T> = Result<T, DbError>;

/// Location label used for in-memory projects in errors and logs.
pub const IN_MEMORY_LOCATION: &str = ":memory:";

#[derive(Debug)]
pub enum DbError {
    /// The project file could not be opened or configured.
    Open {
        location: String,
        source: rusqlite::Error,
    },
    /// A schema step failed; the file keeps its previous version.
    SchemaStep {
        version: u32,
        name: &'static str,
        source: rusqlite::Error,
    },
    /// The project file was written by a newer build.
    UnsupportedSchemaVersion {
        db_version: u32,
        latest_supported: u32,
    },
    /// Any other SQLite failure on an open project.
    Sqlite(rusqlite::Error),
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Open { location, source } => {
                write!(f, "cannot open project `{location}`: {source}")
            }
            Self::SchemaStep {
                version,
                name,
                source,
            } => write!(f, "project schema step {version} ({name}) failed: {source}"),
            Self::UnsupportedSchemaVersion {
                db_version,
                latest_supported,
            } => write!(
                f,
                "project schema version {db_version} is newer than supported {latest_supported}"
            ),
            Self::Sqlite(err) => write!(f, "project database error: {err}"),
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Open { source, .. } | Self::SchemaStep { source, .. } => Some(source),
            Self::Sqlite(err) => Some(err),
            Self::UnsupportedSchemaVersion { .. } => None,
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}
