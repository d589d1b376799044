//! Schema version check and destructive replacement.
//!
//! # Responsibility
//! - Create the contact/group schema on a fresh database.
//! - Replace the whole schema when the stored version is not the expected one.
//!
//! # Invariants
//! - Schema version is tracked via `PRAGMA user_version`.
//! - Any version other than [`schema_version`] wipes managed tables, including
//!   version `0` files that already carry them; stored data does not survive
//!   a schema bump.

use crate::db::DbResult;
use rusqlite::Connection;

const SCHEMA_VERSION: u32 = 1;
const SCHEMA_SQL: &str = include_str!("contacts_v1.sql");

/// Tables owned by this schema, in drop order (dependents first).
const MANAGED_TABLES: &[&str] = &["contacts", "groups"];

/// What [`ensure_schema`] did to the connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaOutcome {
    /// No managed table existed, schema created.
    Created,
    /// Stored version already matches.
    Current,
    /// Stored version did not match; all managed tables were recreated.
    Replaced { previous_version: u32 },
}

/// Returns the schema version this binary expects.
pub fn schema_version() -> u32 {
    SCHEMA_VERSION
}

/// Brings the connection to the expected schema version.
pub fn ensure_schema(conn: &mut Connection) -> DbResult<SchemaOutcome> {
    let current_version = current_user_version(conn)?;
    if current_version == SCHEMA_VERSION {
        return Ok(SchemaOutcome::Current);
    }

    let tx = conn.transaction()?;
    let had_tables = has_managed_tables(&tx)?;
    for table in MANAGED_TABLES {
        tx.execute_batch(&format!("DROP TABLE IF EXISTS {table};"))?;
    }
    tx.execute_batch(SCHEMA_SQL)?;
    tx.execute_batch(&format!("PRAGMA user_version = {SCHEMA_VERSION};"))?;
    tx.commit()?;

    if current_version == 0 && !had_tables {
        Ok(SchemaOutcome::Created)
    } else {
        Ok(SchemaOutcome::Replaced {
            previous_version: current_version,
        })
    }
}

fn has_managed_tables(conn: &Connection) -> DbResult<bool> {
    for table in MANAGED_TABLES {
        let exists: bool = conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1);",
            [*table],
            |row| row.get(0),
        )?;
        if exists {
            return Ok(true);
        }
    }
    Ok(false)
}

fn current_user_version(conn: &Connection) -> DbResult<u32> {
    let version = conn.query_row("PRAGMA user_version;", [], |row| row.get::<_, u32>(0))?;
    Ok(version)
}
