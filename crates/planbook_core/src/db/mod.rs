//! SQLite entity store bootstrap.
//!
//! # Responsibility
//! - Open planbook store connections with the pragmas the repositories rely on.
//! - Bring the schema up to date before any entity is read or written.
//!
//! # Invariants
//! - The schema version lives in `PRAGMA user_version`.
//! - A store written by a newer binary is refused, never downgraded.

use rusqlite::Connection;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

pub mod migrations;
mod open;

pub use open::{open_db, open_db_existing, open_db_in_memory};

pub type DbResult<T> = Result<T, DbError>;

/// Failures while opening or migrating a planbook store.
#[derive(Debug)]
pub enum DbError {
    /// SQLite rejected a pragma, migration statement or open call.
    Sqlite(rusqlite::Error),
    /// `open_db_existing` was pointed at a path with no store file.
    MissingStore(PathBuf),
    /// The store's `user_version` is ahead of every migration this build
    /// ships, i.e. it was written by a newer planbook release.
    UnsupportedSchemaVersion {
        db_version: u32,
        latest_supported: u32,
    },
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "sqlite error: {err}"),
            Self::MissingStore(path) => {
                write!(f, "no planbook store at `{}`", path.display())
            }
            Self::UnsupportedSchemaVersion {
                db_version,
                latest_supported,
            } => write!(
                f,
                "store schema version {db_version} is newer than supported {latest_supported}"
            ),
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) => Some(err),
            Self::MissingStore(_) | Self::UnsupportedSchemaVersion { .. } => None,
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}

/// Reads the entity-store schema version recorded on `conn`; `0` means the
/// `entities` table has never been created.
pub fn schema_version(conn: &Connection) -> DbResult<u32> {
    Ok(conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?)
}
