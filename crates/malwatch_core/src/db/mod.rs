//! Crawl database: connection setup and schema versioning.
//!
//! One connection serves a whole run and is the only writer. Schema changes
//! ship as numbered SQL files and the applied number lives in
//! `PRAGMA user_version`, so a store written by a newer binary is refused
//! instead of being half-understood.
//!
//! `repositories.account_id` is declared as a foreign key for documentation
//! only. Enforcement stays off: untracking a human account must not touch the
//! repositories already recorded under its id.

use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

pub mod migrations;
mod open;

pub use open::{open_db, open_db_in_memory, open_existing_db};

pub type DbResult<T> = Result<T, DbError>;

#[derive(Debug)]
pub enum DbError {
    Sqlite(rusqlite::Error),
    /// `open_existing_db` was pointed at a path with no database file.
    MissingDatabase(PathBuf),
    /// The file was migrated by a newer malwatch build.
    SchemaTooNew { found: u32, supported: u32 },
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "sqlite: {err}"),
            Self::MissingDatabase(path) => {
                write!(f, "no crawl database at `{}`", path.display())
            }
            Self::SchemaTooNew { found, supported } => write!(
                f,
                "crawl store uses schema v{found}, this build understands up to v{supported}"
            ),
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) => Some(err),
            _ => None,
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}
