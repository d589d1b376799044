//! Contact book facade.
//!
//! # Responsibility
//! - Own the store connection, both mutation queues and the dispatcher.
//! - Validate mutations synchronously, then hand them to the workers.
//! - Serve synchronous reads, sectioned views and text transfer.
//!
//! # Invariants
//! - Mutation entry points never block on storage I/O beyond the duplicate
//!   group-name pre-check.
//! - Dropping the book drains both queues before the dispatcher stops.
//! - Workers and synchronous reads share one connection behind one lock, so a
//!   read waits for the mutation in flight, including a whole import batch.

use crate::config::{BookConfig, ConfigError};
use crate::db::{open_db, open_db_in_memory, DbError};
use crate::index::build_index;
use crate::index::sections::SectionedEntry;
use crate::index::visibility::{group_listing, GroupSection, GroupVisibility};
use crate::live::hub::Hub;
use crate::live::queue::{
    contact_worker, group_worker, ContactMutation, GroupMutation, MutationQueue, QueueClosed,
    SharedConnection,
};
use crate::live::{EntityKind, MutationFailure, SectionStream, Snapshot, Subscription};
use crate::logging::{init_logging, LoggingError};
use crate::model::contact::{Contact, ContactDraft, ContactId};
use crate::model::group::{Group, GroupId};
use crate::model::validate::{validate_group_name, ValidationError};
use crate::repo::contact_repo::{ContactRepository, SqliteContactRepository};
use crate::repo::group_repo::{GroupRepository, SqliteGroupRepository};
use crate::repo::{RepoError, RepoResult};
use crate::transfer::{export_contacts, parse_import, ImportReport, TransferError};
use crossbeam_channel::bounded;
use log::{info, warn};
use parking_lot::Mutex;
use rusqlite::Connection;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::io::{BufRead, Write};
use std::sync::Arc;
use std::time::Instant;

/// Error returned by `ContactBook` entry points.
#[derive(Debug)]
pub enum BookError {
    Validation(ValidationError),
    DuplicateGroupName(String),
    ContactNotFound(ContactId),
    GroupNotFound(GroupId),
    Repo(RepoError),
    Db(DbError),
    Transfer(TransferError),
    Config(ConfigError),
    Logging(LoggingError),
    /// The worker for this kind has stopped.
    QueueClosed(EntityKind),
    /// A worker or dispatcher thread could not be started.
    Spawn(std::io::Error),
}

impl BookError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::ContactNotFound(_) | Self::GroupNotFound(_))
    }
}

impl Display for BookError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::DuplicateGroupName(name) => write!(f, "group name already exists: `{name}`"),
            Self::ContactNotFound(id) => write!(f, "contact not found: {id}"),
            Self::GroupNotFound(id) => write!(f, "group not found: {id}"),
            Self::Repo(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::Transfer(err) => write!(f, "{err}"),
            Self::Config(err) => write!(f, "{err}"),
            Self::Logging(err) => write!(f, "{err}"),
            Self::QueueClosed(kind) => write!(f, "{kind} mutation queue is closed"),
            Self::Spawn(err) => write!(f, "failed to start worker thread: {err}"),
        }
    }
}

impl Error for BookError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Repo(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::Transfer(err) => Some(err),
            Self::Config(err) => Some(err),
            Self::Logging(err) => Some(err),
            Self::Spawn(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for BookError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::Validation(err) => Self::Validation(err),
            RepoError::Db(err) => Self::Db(err),
            RepoError::ContactNotFound(id) => Self::ContactNotFound(id),
            RepoError::GroupNotFound(id) => Self::GroupNotFound(id),
            RepoError::DuplicateGroupName(name) => Self::DuplicateGroupName(name),
            other => Self::Repo(other),
        }
    }
}

impl From<ValidationError> for BookError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for BookError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<TransferError> for BookError {
    fn from(value: TransferError) -> Self {
        Self::Transfer(value)
    }
}

impl From<ConfigError> for BookError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<LoggingError> for BookError {
    fn from(value: LoggingError) -> Self {
        Self::Logging(value)
    }
}

impl From<QueueClosed> for BookError {
    fn from(value: QueueClosed) -> Self {
        Self::QueueClosed(value.0)
    }
}

pub type BookResult<T> = Result<T, BookError>;

/// Reactive contact store.
pub struct ContactBook {
    // Field order is drop order: workers stop before the dispatcher.
    contact_queue: MutationQueue<ContactMutation>,
    group_queue: MutationQueue<GroupMutation>,
    hub: Hub,
    conn: SharedConnection,
    visibility: Mutex<GroupVisibility>,
}

impl ContactBook {
    /// Wraps a connection that already carries the current schema.
    pub fn new(conn: Connection) -> BookResult<Self> {
        let (contacts, groups) = {
            let contacts = SqliteContactRepository::try_new(&conn)?.list_contacts()?;
            let groups = SqliteGroupRepository::try_new(&conn)?.list_groups()?;
            (contacts, groups)
        };
        info!(
            "event=book_open module=service status=ok contacts={} groups={}",
            contacts.len(),
            groups.len()
        );

        let hub = Hub::start(contacts, groups).map_err(BookError::Spawn)?;
        let conn: SharedConnection = Arc::new(Mutex::new(conn));
        let contact_queue = MutationQueue::spawn(
            EntityKind::Contact,
            contact_worker(Arc::clone(&conn), hub.publisher()),
        )
        .map_err(BookError::Spawn)?;
        let group_queue = MutationQueue::spawn(
            EntityKind::Group,
            group_worker(Arc::clone(&conn), hub.publisher()),
        )
        .map_err(BookError::Spawn)?;

        Ok(Self {
            contact_queue,
            group_queue,
            hub,
            conn,
            visibility: Mutex::new(GroupVisibility::new()),
        })
    }

    /// Starts logging (when `log_dir` is set), opens the store and applies
    /// the configured group visibility.
    pub fn open(config: &BookConfig) -> BookResult<Self> {
        if let Some(log_dir) = &config.log_dir {
            init_logging(&config.log_level, log_dir)?;
        }
        let conn = match &config.database {
            Some(path) => open_db(path)?,
            None => open_db_in_memory()?,
        };
        let book = Self::new(conn)?;
        *book.visibility.lock() = config.visibility();
        Ok(book)
    }

    pub fn open_in_memory() -> BookResult<Self> {
        Self::new(open_db_in_memory()?)
    }

    pub fn subscribe_contacts(&self) -> Subscription<Snapshot<Contact>> {
        self.hub.subscribe_contacts()
    }

    pub fn subscribe_groups(&self) -> Subscription<Snapshot<Group>> {
        self.hub.subscribe_groups()
    }

    /// Receives one report per queued mutation that failed after submission.
    pub fn subscribe_failures(&self) -> Subscription<MutationFailure> {
        self.hub.subscribe_failures()
    }

    /// Sectioned, filtered and diffed view over the contact stream.
    pub fn subscribe_sections(&self, query: &str) -> SectionStream {
        SectionStream::new(
            self.hub.subscribe_contacts(),
            query,
            self.group_visibility(),
        )
    }

    pub fn insert_contact(&self, draft: ContactDraft) -> BookResult<()> {
        draft.validate()?;
        self.contact_queue.submit(ContactMutation::Insert(draft))?;
        Ok(())
    }

    /// Replaces every field of the contact with the same id.
    pub fn update_contact(&self, contact: Contact) -> BookResult<()> {
        let contact = contact.normalized();
        contact.validate()?;
        self.contact_queue.submit(ContactMutation::Update(contact))?;
        Ok(())
    }

    pub fn delete_contact(&self, id: ContactId) -> BookResult<()> {
        self.contact_queue.submit(ContactMutation::Delete(id))?;
        Ok(())
    }

    pub fn insert_group(&self, name: &str) -> BookResult<()> {
        let name = name.trim();
        validate_group_name(name)?;
        if self.find_group_by_name(name)?.is_some() {
            return Err(BookError::DuplicateGroupName(name.to_string()));
        }
        self.group_queue
            .submit(GroupMutation::Insert(name.to_string()))?;
        Ok(())
    }

    /// Renames a group; member contacts pick up the new name in the same commit.
    pub fn rename_group(&self, id: GroupId, name: &str) -> BookResult<()> {
        let name = name.trim();
        validate_group_name(name)?;
        if self
            .find_group_by_name(name)?
            .is_some_and(|holder| holder.id != id)
        {
            return Err(BookError::DuplicateGroupName(name.to_string()));
        }
        self.group_queue.submit(GroupMutation::Rename {
            id,
            name: name.to_string(),
        })?;
        Ok(())
    }

    /// Deletes a group together with every contact referencing it.
    pub fn delete_group(&self, id: GroupId) -> BookResult<()> {
        self.group_queue.submit(GroupMutation::DeleteCascade(id))?;
        Ok(())
    }

    /// Blocks until everything submitted so far is applied and delivered.
    pub fn flush(&self) -> BookResult<()> {
        let (reply, done) = bounded(2);
        self.contact_queue
            .submit(ContactMutation::Barrier(reply.clone()))?;
        self.group_queue.submit(GroupMutation::Barrier(reply))?;
        for kind in [EntityKind::Contact, EntityKind::Group] {
            done.recv().map_err(|_| BookError::QueueClosed(kind))?;
        }
        Ok(())
    }

    pub fn get_contact(&self, id: ContactId) -> BookResult<Contact> {
        self.read(|conn| SqliteContactRepository::try_new(conn)?.get_contact(id))?
            .ok_or(BookError::ContactNotFound(id))
    }

    pub fn list_contacts(&self) -> BookResult<Vec<Contact>> {
        self.read(|conn| SqliteContactRepository::try_new(conn)?.list_contacts())
    }

    pub fn list_contacts_in_group(&self, group_id: GroupId) -> BookResult<Vec<Contact>> {
        self.read(|conn| {
            let groups = SqliteGroupRepository::try_new(conn)?;
            if groups.get_group(group_id)?.is_none() {
                return Err(RepoError::GroupNotFound(group_id));
            }
            SqliteContactRepository::try_new(conn)?.list_contacts_in_group(group_id)
        })
    }

    pub fn get_group(&self, id: GroupId) -> BookResult<Group> {
        self.read(|conn| SqliteGroupRepository::try_new(conn)?.get_group(id))?
            .ok_or(BookError::GroupNotFound(id))
    }

    pub fn find_group_by_name(&self, name: &str) -> BookResult<Option<Group>> {
        self.read(|conn| SqliteGroupRepository::try_new(conn)?.find_group_by_name(name))
    }

    pub fn list_groups(&self) -> BookResult<Vec<Group>> {
        self.read(|conn| SqliteGroupRepository::try_new(conn)?.list_groups())
    }

    /// One-shot sectioned list of the stored contacts.
    pub fn sections(&self, query: &str) -> BookResult<Vec<SectionedEntry>> {
        let contacts = self.list_contacts()?;
        let visible = self.visibility.lock().retain_visible(&contacts);
        Ok(build_index(&visible, query))
    }

    /// Visible groups with their members.
    pub fn group_listing(&self) -> BookResult<Vec<GroupSection>> {
        let (groups, contacts) = self.read(|conn| {
            let groups = SqliteGroupRepository::try_new(conn)?.list_groups()?;
            let contacts = SqliteContactRepository::try_new(conn)?.list_contacts()?;
            Ok((groups, contacts))
        })?;
        Ok(group_listing(&groups, &contacts, &self.visibility.lock()))
    }

    pub fn group_visibility(&self) -> GroupVisibility {
        self.visibility.lock().clone()
    }

    /// Applies to later `sections`, `group_listing` and `subscribe_sections`
    /// calls; open streams keep their own overlay.
    pub fn set_group_visible(&self, group_id: GroupId, visible: bool) {
        self.visibility.lock().set_visible(group_id, visible);
    }

    /// Writes every stored contact as one line; returns the count.
    pub fn export_contacts<W: Write>(&self, writer: W) -> BookResult<usize> {
        let started_at = Instant::now();
        let contacts = self.list_contacts()?;
        let written = export_contacts(writer, &contacts)?;
        info!(
            "event=contacts_export module=service status=ok count={written} duration_ms={}",
            started_at.elapsed().as_millis()
        );
        Ok(written)
    }

    /// Parses `reader` and queues every valid record as a new contact.
    ///
    /// A record keeps its group when the group id still exists, otherwise it
    /// joins a group of the same name, otherwise it is imported ungrouped.
    pub fn import_contacts<R: BufRead>(&self, reader: R) -> BookResult<ImportReport> {
        let started_at = Instant::now();
        let mut report = parse_import(reader)?;
        let groups = self.list_groups()?;
        for draft in &mut report.drafts {
            resolve_import_group(draft, &groups);
        }

        if !report.failures.is_empty() {
            warn!(
                "event=contacts_import module=service status=partial rejected={}",
                report.failures.len()
            );
        }
        if !report.drafts.is_empty() {
            self.contact_queue
                .submit(ContactMutation::InsertBatch(report.drafts.clone()))?;
        }
        info!(
            "event=contacts_import module=service status=ok queued={} duration_ms={}",
            report.drafts.len(),
            started_at.elapsed().as_millis()
        );
        Ok(report)
    }

    fn read<T>(&self, f: impl FnOnce(&Connection) -> RepoResult<T>) -> BookResult<T> {
        let guard = self.conn.lock();
        Ok(f(&guard)?)
    }
}

fn resolve_import_group(draft: &mut ContactDraft, groups: &[Group]) {
    let by_id = draft
        .group_id
        .and_then(|id| groups.iter().find(|group| group.id == id));
    let by_name = || {
        draft
            .group_name
            .as_deref()
            .and_then(|name| groups.iter().find(|group| group.name == name))
    };
    let resolved = by_id.or_else(by_name).map(|group| group.id);
    draft.group_id = resolved;
    // The worker fills the cached name from the resolved group.
    draft.group_name = None;
}
