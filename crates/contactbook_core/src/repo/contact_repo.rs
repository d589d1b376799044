//! Contact repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide CRUD over the `contacts` table.
//! - Enforce the group reference rule on every write.
//!
//! # Invariants
//! - Write paths validate field shapes before SQL mutations.
//! - `group_id`, when set, references an existing group at write time.
//! - Listing order is insertion order (`seq ASC`).
//! - Update/delete of a missing id is `ContactNotFound`, never a no-op.

use crate::model::contact::{Contact, ContactDraft, ContactId};
use crate::model::group::GroupId;
use crate::repo::{ensure_connection_ready, group_exists, parse_uuid, RepoError, RepoResult};
use rusqlite::{params, Connection, Row};
use uuid::Uuid;

const CONTACT_SELECT_SQL: &str = "SELECT
    uuid,
    name,
    phone,
    email,
    group_uuid,
    group_name,
    photo_ref
FROM contacts";

/// Repository interface for contact CRUD operations.
pub trait ContactRepository {
    /// Inserts a new contact and returns its store-assigned id.
    fn insert_contact(&self, draft: &ContactDraft) -> RepoResult<ContactId>;
    /// Replaces every field of an existing contact.
    fn update_contact(&self, contact: &Contact) -> RepoResult<()>;
    fn delete_contact(&self, id: ContactId) -> RepoResult<()>;
    fn get_contact(&self, id: ContactId) -> RepoResult<Option<Contact>>;
    /// Lists all contacts in insertion order.
    fn list_contacts(&self) -> RepoResult<Vec<Contact>>;
    /// Lists contacts referencing one group, in insertion order.
    fn list_contacts_in_group(&self, group_id: GroupId) -> RepoResult<Vec<Contact>>;
}

/// SQLite-backed contact repository.
pub struct SqliteContactRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteContactRepository<'conn> {
    /// Constructs a repository from a connection carrying the current schema.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn)?;
        Ok(Self { conn })
    }
}

impl ContactRepository for SqliteContactRepository<'_> {
    fn insert_contact(&self, draft: &ContactDraft) -> RepoResult<ContactId> {
        draft.validate()?;
        ensure_group_reference(self.conn, draft.group_id)?;

        let id = Uuid::new_v4();
        self.conn.execute(
            "INSERT INTO contacts (
                uuid,
                name,
                phone,
                email,
                group_uuid,
                group_name,
                photo_ref
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7);",
            params![
                id.to_string(),
                draft.name.as_str(),
                draft.phone.as_str(),
                draft.email.as_deref(),
                draft.group_id.map(|value| value.to_string()),
                draft.group_name.as_deref(),
                draft.photo_ref.as_deref(),
            ],
        )?;

        Ok(id)
    }

    fn update_contact(&self, contact: &Contact) -> RepoResult<()> {
        contact.validate()?;
        ensure_group_reference(self.conn, contact.group_id)?;

        let changed = self.conn.execute(
            "UPDATE contacts
             SET
                name = ?2,
                phone = ?3,
                email = ?4,
                group_uuid = ?5,
                group_name = ?6,
                photo_ref = ?7
             WHERE uuid = ?1;",
            params![
                contact.id.to_string(),
                contact.name.as_str(),
                contact.phone.as_str(),
                contact.email.as_deref(),
                contact.group_id.map(|value| value.to_string()),
                contact.group_name.as_deref(),
                contact.photo_ref.as_deref(),
            ],
        )?;

        if changed == 0 {
            return Err(RepoError::ContactNotFound(contact.id));
        }

        Ok(())
    }

    fn delete_contact(&self, id: ContactId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM contacts WHERE uuid = ?1;", [id.to_string()])?;

        if changed == 0 {
            return Err(RepoError::ContactNotFound(id));
        }

        Ok(())
    }

    fn get_contact(&self, id: ContactId) -> RepoResult<Option<Contact>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{CONTACT_SELECT_SQL} WHERE uuid = ?1;"))?;

        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_contact_row(row)?));
        }

        Ok(None)
    }

    fn list_contacts(&self) -> RepoResult<Vec<Contact>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{CONTACT_SELECT_SQL} ORDER BY seq ASC;"))?;
        let mut rows = stmt.query([])?;
        let mut contacts = Vec::new();
        while let Some(row) = rows.next()? {
            contacts.push(parse_contact_row(row)?);
        }
        Ok(contacts)
    }

    fn list_contacts_in_group(&self, group_id: GroupId) -> RepoResult<Vec<Contact>> {
        let mut stmt = self.conn.prepare(&format!(
            "{CONTACT_SELECT_SQL} WHERE group_uuid = ?1 ORDER BY seq ASC;"
        ))?;
        let mut rows = stmt.query([group_id.to_string()])?;
        let mut contacts = Vec::new();
        while let Some(row) = rows.next()? {
            contacts.push(parse_contact_row(row)?);
        }
        Ok(contacts)
    }
}

fn ensure_group_reference(conn: &Connection, group_id: Option<GroupId>) -> RepoResult<()> {
    match group_id {
        Some(group_id) if !group_exists(conn, group_id)? => Err(RepoError::GroupNotFound(group_id)),
        _ => Ok(()),
    }
}

fn parse_contact_row(row: &Row<'_>) -> RepoResult<Contact> {
    let uuid_text: String = row.get("uuid")?;
    let id = parse_uuid(&uuid_text, "contacts.uuid")?;

    let group_id = match row.get::<_, Option<String>>("group_uuid")? {
        Some(value) => Some(parse_uuid(&value, "contacts.group_uuid")?),
        None => None,
    };

    Ok(Contact {
        id,
        name: row.get("name")?,
        phone: row.get("phone")?,
        email: row.get("email")?,
        group_id,
        group_name: row.get("group_name")?,
        photo_ref: row.get("photo_ref")?,
    })
}
