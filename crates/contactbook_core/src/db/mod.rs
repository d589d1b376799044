//! SQLite storage bootstrap and schema entry points.
//!
//! # Responsibility
//! - Open and configure SQLite connections for the contact store.
//! - Make sure the schema matches before any repository touches data.
//!
//! # Invariants
//! - Schema version is tracked via `PRAGMA user_version`.
//! - A mismatching schema is replaced, never upgraded in place.

use std::error::Error;
use std::fmt::{Display, Formatter};

mod open;
pub mod schema;

pub use open::{open_db, open_db_in_memory};

pub type DbResult<T> = Result<T, DbError>;

#[derive(Debug)]
pub enum DbError {
    Sqlite(rusqlite::Error),
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "{err}"),
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) => Some(err),
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}
