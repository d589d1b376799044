//! Group repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide CRUD over the `groups` table.
//! - Own the transactional cascade delete and rename propagation.
//!
//! # Invariants
//! - Group names are unique by exact, case-sensitive match.
//! - A plain delete never leaves contacts pointing at a missing group.
//! - Cascade delete removes the group and its contacts atomically.
//! - Rename refreshes `contacts.group_name` in the same transaction.

use crate::model::group::{Group, GroupId};
use crate::model::validate::validate_group_name;
use crate::repo::{ensure_connection_ready, parse_uuid, RepoError, RepoResult};
use rusqlite::{params, Connection, OptionalExtension, Row, Transaction, TransactionBehavior};
use uuid::Uuid;

/// Repository interface for group operations.
pub trait GroupRepository {
    /// Inserts a group after the uniqueness check and returns its id.
    fn insert_group(&self, name: &str) -> RepoResult<GroupId>;
    /// Renames a group and returns how many contacts had their cached
    /// group name refreshed.
    fn rename_group(&self, id: GroupId, name: &str) -> RepoResult<usize>;
    /// Deletes a group that no contact references.
    fn delete_group(&self, id: GroupId) -> RepoResult<()>;
    /// Deletes a group and every contact referencing it; returns the number
    /// of contacts removed.
    fn delete_group_cascade(&self, id: GroupId) -> RepoResult<usize>;
    fn get_group(&self, id: GroupId) -> RepoResult<Option<Group>>;
    fn find_group_by_name(&self, name: &str) -> RepoResult<Option<Group>>;
    /// Lists all groups in insertion order.
    fn list_groups(&self) -> RepoResult<Vec<Group>>;
}

/// SQLite-backed group repository.
pub struct SqliteGroupRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteGroupRepository<'conn> {
    /// Constructs a repository from a connection carrying the current schema.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn)?;
        Ok(Self { conn })
    }
}

impl GroupRepository for SqliteGroupRepository<'_> {
    fn insert_group(&self, name: &str) -> RepoResult<GroupId> {
        validate_group_name(name)?;
        if self.find_group_by_name(name)?.is_some() {
            return Err(RepoError::DuplicateGroupName(name.to_string()));
        }

        let id = Uuid::new_v4();
        self.conn
            .execute(
                "INSERT INTO groups (uuid, name) VALUES (?1, ?2);",
                params![id.to_string(), name],
            )
            .map_err(|err| map_unique_violation(err, name))?;

        Ok(id)
    }

    fn rename_group(&self, id: GroupId, name: &str) -> RepoResult<usize> {
        validate_group_name(name)?;

        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        if !group_exists_in_tx(&tx, id)? {
            return Err(RepoError::GroupNotFound(id));
        }

        let holder: Option<String> = tx
            .query_row(
                "SELECT uuid FROM groups WHERE name = ?1;",
                [name],
                |row| row.get(0),
            )
            .optional()?;
        if holder.is_some_and(|uuid| uuid != id.to_string()) {
            return Err(RepoError::DuplicateGroupName(name.to_string()));
        }

        tx.execute(
            "UPDATE groups SET name = ?2 WHERE uuid = ?1;",
            params![id.to_string(), name],
        )
        .map_err(|err| map_unique_violation(err, name))?;
        let refreshed = tx.execute(
            "UPDATE contacts SET group_name = ?2 WHERE group_uuid = ?1;",
            params![id.to_string(), name],
        )?;

        tx.commit()?;
        Ok(refreshed)
    }

    fn delete_group(&self, id: GroupId) -> RepoResult<()> {
        let dependents = count_group_contacts(self.conn, id)?;
        if dependents > 0 {
            return Err(RepoError::GroupInUse {
                group_id: id,
                contacts: dependents,
            });
        }

        let changed = self
            .conn
            .execute("DELETE FROM groups WHERE uuid = ?1;", [id.to_string()])?;
        if changed == 0 {
            return Err(RepoError::GroupNotFound(id));
        }

        Ok(())
    }

    fn delete_group_cascade(&self, id: GroupId) -> RepoResult<usize> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        if !group_exists_in_tx(&tx, id)? {
            return Err(RepoError::GroupNotFound(id));
        }

        let removed = tx.execute(
            "DELETE FROM contacts WHERE group_uuid = ?1;",
            [id.to_string()],
        )?;
        tx.execute("DELETE FROM groups WHERE uuid = ?1;", [id.to_string()])?;

        tx.commit()?;
        Ok(removed)
    }

    fn get_group(&self, id: GroupId) -> RepoResult<Option<Group>> {
        let mut stmt = self
            .conn
            .prepare("SELECT uuid, name FROM groups WHERE uuid = ?1;")?;
        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_group_row(row)?));
        }
        Ok(None)
    }

    fn find_group_by_name(&self, name: &str) -> RepoResult<Option<Group>> {
        let mut stmt = self
            .conn
            .prepare("SELECT uuid, name FROM groups WHERE name = ?1;")?;
        let mut rows = stmt.query([name])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_group_row(row)?));
        }
        Ok(None)
    }

    fn list_groups(&self) -> RepoResult<Vec<Group>> {
        let mut stmt = self
            .conn
            .prepare("SELECT uuid, name FROM groups ORDER BY seq ASC;")?;
        let mut rows = stmt.query([])?;
        let mut groups = Vec::new();
        while let Some(row) = rows.next()? {
            groups.push(parse_group_row(row)?);
        }
        Ok(groups)
    }
}

fn parse_group_row(row: &Row<'_>) -> RepoResult<Group> {
    let uuid_text: String = row.get("uuid")?;
    Ok(Group {
        id: parse_uuid(&uuid_text, "groups.uuid")?,
        name: row.get("name")?,
    })
}

fn group_exists_in_tx(tx: &Transaction<'_>, id: GroupId) -> RepoResult<bool> {
    let exists: i64 = tx.query_row(
        "SELECT EXISTS(SELECT 1 FROM groups WHERE uuid = ?1);",
        [id.to_string()],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn count_group_contacts(conn: &Connection, id: GroupId) -> RepoResult<usize> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM contacts WHERE group_uuid = ?1;",
        [id.to_string()],
        |row| row.get(0),
    )?;
    Ok(usize::try_from(count).unwrap_or(0))
}

fn map_unique_violation(err: rusqlite::Error, name: &str) -> RepoError {
    match &err {
        rusqlite::Error::SqliteFailure(failure, _)
            if failure.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE =>
        {
            RepoError::DuplicateGroupName(name.to_string())
        }
        _ => err.into(),
    }
}
