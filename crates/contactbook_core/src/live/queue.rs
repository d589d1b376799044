//! Per-kind mutation workers.
//!
//! # Responsibility
//! - Drain one unbounded channel per entity kind on a dedicated thread.
//! - Apply each mutation through the repositories and publish snapshots.
//!
//! # Invariants
//! - A mutation and the snapshot read after it share one lock acquisition;
//!   the snapshot reaches the dispatcher before the lock is released.
//! - Contacts always carry the current name of the group they reference.

use crate::live::hub::Publisher;
use crate::live::{EntityKind, MutationFailure};
use crate::model::contact::{Contact, ContactDraft, ContactId};
use crate::model::group::{Group, GroupId};
use crate::repo::contact_repo::{ContactRepository, SqliteContactRepository};
use crate::repo::group_repo::{GroupRepository, SqliteGroupRepository};
use crate::repo::{RepoError, RepoResult};
use crossbeam_channel::{unbounded, Sender};
use log::{debug, error, info, warn};
use parking_lot::Mutex;
use rusqlite::{Connection, Transaction, TransactionBehavior};
use std::io;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Instant;

/// Store connection shared by both workers and synchronous reads.
pub(crate) type SharedConnection = Arc<Mutex<Connection>>;

pub(crate) enum ContactMutation {
    Insert(ContactDraft),
    /// Inserts every draft in one transaction; one snapshot for the batch.
    InsertBatch(Vec<ContactDraft>),
    Update(Contact),
    Delete(ContactId),
    Barrier(Sender<()>),
}

impl ContactMutation {
    fn operation(&self) -> &'static str {
        match self {
            Self::Insert(_) => "insert",
            Self::InsertBatch(_) => "insert_batch",
            Self::Update(_) => "update",
            Self::Delete(_) => "delete",
            Self::Barrier(_) => "barrier",
        }
    }
}

pub(crate) enum GroupMutation {
    Insert(String),
    Rename { id: GroupId, name: String },
    DeleteCascade(GroupId),
    Barrier(Sender<()>),
}

impl GroupMutation {
    fn operation(&self) -> &'static str {
        match self {
            Self::Insert(_) => "insert",
            Self::Rename { .. } => "rename",
            Self::DeleteCascade(_) => "delete_cascade",
            Self::Barrier(_) => "barrier",
        }
    }
}

/// Returned by `submit` after the worker has stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct QueueClosed(pub EntityKind);

/// FIFO queue drained by one named worker thread.
pub(crate) struct MutationQueue<M: Send + 'static> {
    kind: EntityKind,
    sender: Option<Sender<M>>,
    handle: Option<JoinHandle<()>>,
}

impl<M: Send + 'static> MutationQueue<M> {
    pub(crate) fn spawn(
        kind: EntityKind,
        mut apply: impl FnMut(M) + Send + 'static,
    ) -> io::Result<Self> {
        let (sender, receiver) = unbounded::<M>();
        let handle = thread::Builder::new()
            .name(format!("contactbook-{kind}-queue"))
            .spawn(move || {
                for mutation in receiver.iter() {
                    apply(mutation);
                }
                debug!("event=queue_stop module=live status=ok kind={kind}");
            })?;

        Ok(Self {
            kind,
            sender: Some(sender),
            handle: Some(handle),
        })
    }

    pub(crate) fn submit(&self, mutation: M) -> Result<(), QueueClosed> {
        match &self.sender {
            Some(sender) => sender.send(mutation).map_err(|_| QueueClosed(self.kind)),
            None => Err(QueueClosed(self.kind)),
        }
    }
}

impl<M: Send + 'static> Drop for MutationQueue<M> {
    fn drop(&mut self) {
        // Closing the channel lets the worker drain what is queued, then exit.
        self.sender.take();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

pub(crate) fn contact_worker(
    conn: SharedConnection,
    publisher: Publisher,
) -> impl FnMut(ContactMutation) + Send + 'static {
    move |mutation| apply_contact_mutation(&conn, &publisher, mutation)
}

pub(crate) fn group_worker(
    conn: SharedConnection,
    publisher: Publisher,
) -> impl FnMut(GroupMutation) + Send + 'static {
    move |mutation| apply_group_mutation(&conn, &publisher, mutation)
}

fn apply_contact_mutation(
    conn: &SharedConnection,
    publisher: &Publisher,
    mutation: ContactMutation,
) {
    let operation = mutation.operation();
    if let ContactMutation::Barrier(reply) = mutation {
        publisher.barrier(reply);
        return;
    }

    let started_at = Instant::now();
    let guard = conn.lock();
    let outcome = run_contact_mutation(&guard, mutation).and_then(|affected| {
        let snapshot = SqliteContactRepository::try_new(&guard)?.list_contacts()?;
        Ok((affected, snapshot))
    });

    match outcome {
        Ok((affected, snapshot)) => {
            info!(
                "event=contact_mutation module=live status=ok operation={operation} affected={affected} contacts={} duration_ms={}",
                snapshot.len(),
                started_at.elapsed().as_millis()
            );
            publisher.contacts(snapshot);
        }
        Err(err) => report_failure(publisher, EntityKind::Contact, operation, &err, started_at),
    }
    drop(guard);
}

fn run_contact_mutation(conn: &Connection, mutation: ContactMutation) -> RepoResult<usize> {
    match mutation {
        ContactMutation::Insert(mut draft) => {
            draft.group_name = resolve_group_name(conn, draft.group_id)?;
            SqliteContactRepository::try_new(conn)?.insert_contact(&draft)?;
            Ok(1)
        }
        ContactMutation::InsertBatch(drafts) => {
            let tx = Transaction::new_unchecked(conn, TransactionBehavior::Immediate)?;
            {
                let repo = SqliteContactRepository::try_new(&tx)?;
                for mut draft in drafts.iter().cloned() {
                    draft.group_name = resolve_group_name(&tx, draft.group_id)?;
                    repo.insert_contact(&draft)?;
                }
            }
            tx.commit()?;
            Ok(drafts.len())
        }
        ContactMutation::Update(mut contact) => {
            contact.group_name = resolve_group_name(conn, contact.group_id)?;
            SqliteContactRepository::try_new(conn)?.update_contact(&contact)?;
            Ok(1)
        }
        ContactMutation::Delete(id) => {
            SqliteContactRepository::try_new(conn)?.delete_contact(id)?;
            Ok(1)
        }
        ContactMutation::Barrier(_) => Ok(0),
    }
}

fn apply_group_mutation(conn: &SharedConnection, publisher: &Publisher, mutation: GroupMutation) {
    let operation = mutation.operation();
    if let GroupMutation::Barrier(reply) = mutation {
        publisher.barrier(reply);
        return;
    }

    let started_at = Instant::now();
    let guard = conn.lock();
    match run_group_mutation(&guard, mutation) {
        Ok(published) => {
            info!(
                "event=group_mutation module=live status=ok operation={operation} contacts_touched={} duration_ms={}",
                published.contacts_touched,
                started_at.elapsed().as_millis()
            );
            if let Some(contacts) = published.contacts {
                publisher.contacts(contacts);
            }
            publisher.groups(published.groups);
        }
        Err(err) => report_failure(publisher, EntityKind::Group, operation, &err, started_at),
    }
    drop(guard);
}

struct GroupPublish {
    contacts_touched: usize,
    contacts: Option<Vec<Contact>>,
    groups: Vec<Group>,
}

fn run_group_mutation(conn: &Connection, mutation: GroupMutation) -> RepoResult<GroupPublish> {
    let groups = SqliteGroupRepository::try_new(conn)?;
    let contacts_touched = match mutation {
        GroupMutation::Insert(name) => {
            groups.insert_group(&name)?;
            0
        }
        GroupMutation::Rename { id, name } => groups.rename_group(id, &name)?,
        GroupMutation::DeleteCascade(id) => groups.delete_group_cascade(id)?,
        GroupMutation::Barrier(_) => 0,
    };

    let contacts = if contacts_touched > 0 {
        Some(SqliteContactRepository::try_new(conn)?.list_contacts()?)
    } else {
        None
    };

    Ok(GroupPublish {
        contacts_touched,
        contacts,
        groups: groups.list_groups()?,
    })
}

fn resolve_group_name(conn: &Connection, group_id: Option<GroupId>) -> RepoResult<Option<String>> {
    let Some(id) = group_id else {
        return Ok(None);
    };
    let group = SqliteGroupRepository::try_new(conn)?
        .get_group(id)?
        .ok_or(RepoError::GroupNotFound(id))?;
    Ok(Some(group.name))
}

fn report_failure(
    publisher: &Publisher,
    kind: EntityKind,
    operation: &'static str,
    err: &RepoError,
    started_at: Instant,
) {
    let duration_ms = started_at.elapsed().as_millis();
    if matches!(err, RepoError::Db(_) | RepoError::InvalidData(_)) {
        error!(
            "event={kind}_mutation module=live status=error operation={operation} duration_ms={duration_ms} error_code={} error={err}",
            err.code()
        );
    } else {
        // Semantic failures carry ids only, never field values.
        warn!(
            "event={kind}_mutation module=live status=error operation={operation} duration_ms={duration_ms} error_code={}",
            err.code()
        );
    }

    publisher.failure(MutationFailure {
        kind,
        operation,
        code: err.code(),
        message: err.to_string(),
    });
}

#[cfg(test)]
mod tests {
    use super::{contact_worker, ContactMutation, MutationQueue, SharedConnection};
    use crate::db::open_db_in_memory;
    use crate::live::hub::Hub;
    use crate::live::EntityKind;
    use crate::model::contact::ContactDraft;
    use parking_lot::Mutex;
    use std::sync::Arc;
    use std::time::Duration;
    use uuid::Uuid;

    const WAIT: Duration = Duration::from_secs(5);

    #[test]
    fn worker_publishes_snapshot_after_commit() {
        let conn: SharedConnection = Arc::new(Mutex::new(open_db_in_memory().unwrap()));
        let hub = Hub::start(Vec::new(), Vec::new()).unwrap();
        let contacts = hub.subscribe_contacts();
        assert!(contacts.recv_timeout(WAIT).unwrap().is_empty());

        let queue = MutationQueue::spawn(
            EntityKind::Contact,
            contact_worker(Arc::clone(&conn), hub.publisher()),
        )
        .unwrap();
        queue
            .submit(ContactMutation::Insert(ContactDraft::new("Bob", "5551234567")))
            .unwrap();

        let snapshot = contacts.recv_timeout(WAIT).unwrap();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].name, "Bob");
        drop(queue);
    }

    #[test]
    fn unknown_group_is_reported_without_snapshot() {
        let conn: SharedConnection = Arc::new(Mutex::new(open_db_in_memory().unwrap()));
        let hub = Hub::start(Vec::new(), Vec::new()).unwrap();
        let contacts = hub.subscribe_contacts();
        let failures = hub.subscribe_failures();
        contacts.recv_timeout(WAIT).unwrap();

        let queue = MutationQueue::spawn(
            EntityKind::Contact,
            contact_worker(Arc::clone(&conn), hub.publisher()),
        )
        .unwrap();
        let draft = ContactDraft::new("Bob", "5551234567").with_group(Uuid::new_v4());
        queue.submit(ContactMutation::Insert(draft)).unwrap();

        let failure = failures.recv_timeout(WAIT).unwrap();
        assert_eq!(failure.code, "not_found");
        assert_eq!(failure.operation, "insert");
        assert!(contacts.try_recv().is_none());
        drop(queue);
    }
}
