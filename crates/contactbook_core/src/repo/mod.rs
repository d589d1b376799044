//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define contact/group data access contracts.
//! - Isolate SQLite query details from queue and service orchestration.
//!
//! # Invariants
//! - Repository writes validate records before persistence.
//! - Repository APIs return semantic errors (`*NotFound`, `DuplicateGroupName`,
//!   `GroupInUse`) in addition to DB transport errors.
//! - Multi-row writes run in one IMMEDIATE transaction.

use crate::db::schema::schema_version;
use crate::db::DbError;
use crate::model::contact::ContactId;
use crate::model::group::GroupId;
use crate::model::validate::ValidationError;
use rusqlite::Connection;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

pub mod contact_repo;
pub mod group_repo;

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for contact/group persistence and queries.
#[derive(Debug)]
pub enum RepoError {
    Validation(ValidationError),
    Db(DbError),
    ContactNotFound(ContactId),
    GroupNotFound(GroupId),
    /// Another group already uses this exact name.
    DuplicateGroupName(String),
    /// Plain group delete refused while contacts still reference the group.
    GroupInUse { group_id: GroupId, contacts: usize },
    /// Connection schema is not at the expected version.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    InvalidData(String),
}

impl RepoError {
    /// Returns whether this error means the target record is absent.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::ContactNotFound(_) | Self::GroupNotFound(_))
    }

    /// Stable short code used in log events.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation",
            Self::Db(_) => "storage_failure",
            Self::ContactNotFound(_) | Self::GroupNotFound(_) => "not_found",
            Self::DuplicateGroupName(_) => "duplicate_name",
            Self::GroupInUse { .. } => "group_in_use",
            Self::UninitializedConnection { .. } => "uninitialized_connection",
            Self::InvalidData(_) => "invalid_data",
        }
    }
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::ContactNotFound(id) => write!(f, "contact not found: {id}"),
            Self::GroupNotFound(id) => write!(f, "group not found: {id}"),
            Self::DuplicateGroupName(name) => write!(f, "group name already exists: `{name}`"),
            Self::GroupInUse { group_id, contacts } => write!(
                f,
                "group {group_id} is still referenced by {contacts} contact(s)"
            ),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "contact store requires schema version {expected_version}, got {actual_version}"
            ),
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ValidationError> for RepoError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

pub(crate) fn ensure_connection_ready(conn: &Connection) -> RepoResult<()> {
    let expected_version = schema_version();
    let actual_version: u32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    if actual_version != expected_version {
        return Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }
    Ok(())
}

pub(crate) fn parse_uuid(value: &str, column: &str) -> RepoResult<Uuid> {
    Uuid::parse_str(value)
        .map_err(|_| RepoError::InvalidData(format!("invalid uuid value `{value}` in {column}")))
}

pub(crate) fn group_exists(conn: &Connection, group_id: GroupId) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM groups WHERE uuid = ?1);",
        [group_id.to_string()],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}
