//! Storage for accounts, venues and reviews in a single SQLite file.
//!
//! # Responsibility
//! - Open the one connection a process shares between its repositories.
//! - Bring the schema up to the version this binary knows.
//!
//! # Invariants
//! - `PRAGMA user_version` equals the last applied migration; a file
//!   written by a newer binary is refused, never downgraded.
//! - `accounts.handle` is indexed but not unique; only the admin bootstrap
//!   path guards against duplicates.
//! - `reviews.venue_id` carries no foreign key, so reviews may outlive
//!   their venue. `review_flags` rows cascade with their review.

use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod migrations;
mod open;

pub use open::{open_db, open_db_in_memory};

pub type DbResult<T> = Result<T, DbError>;

#[derive(Debug)]
pub enum DbError {
    Sqlite(rusqlite::Error),
    UnsupportedSchemaVersion {
        db_version: u32,
        latest_supported: u32,
    },
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "{err}"),
            Self::UnsupportedSchemaVersion {
                db_version,
                latest_supported,
            } => write!(
                f,
                "database schema version {db_version} is newer than supported {latest_supported}"
            ),
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
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
