use contactbook_core::{
    apply_edits, BookConfig, BookError, ContactBook, ContactDraft, EntityKind, SectionedEntry,
    ValidationError,
};
use std::io::Cursor;
use std::time::Duration;
use uuid::Uuid;

const WAIT: Duration = Duration::from_secs(5);

#[test]
fn subscriber_gets_current_snapshot_then_one_per_commit() {
    let book = ContactBook::open_in_memory().unwrap();
    let contacts = book.subscribe_contacts();
    assert!(contacts.recv_timeout(WAIT).unwrap().is_empty());

    book.insert_contact(ContactDraft::new("Bob", "5551234567"))
        .unwrap();
    book.insert_contact(ContactDraft::new("Alice", "5557654321"))
        .unwrap();
    book.flush().unwrap();

    let first = contacts.recv_timeout(WAIT).unwrap();
    let second = contacts.recv_timeout(WAIT).unwrap();
    assert_eq!(first.len(), 1);
    let names: Vec<&str> = second.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["Bob", "Alice"]);
    assert!(contacts.try_recv().is_none());
}

#[test]
fn validation_fails_synchronously_and_queues_nothing() {
    let book = ContactBook::open_in_memory().unwrap();
    let contacts = book.subscribe_contacts();
    contacts.recv_timeout(WAIT).unwrap();

    let err = book
        .insert_contact(ContactDraft::new("Mallory", "abc"))
        .unwrap_err();
    assert!(matches!(
        err,
        BookError::Validation(ValidationError::InvalidPhone(_))
    ));
    book.insert_contact(ContactDraft::new("Dial", "+1 555-123-4567"))
        .unwrap();
    assert!(matches!(
        book.insert_group("   ").unwrap_err(),
        BookError::Validation(ValidationError::EmptyGroupName)
    ));

    book.flush().unwrap();
    assert_eq!(contacts.latest().unwrap().len(), 1);
}

#[test]
fn missing_contact_update_is_reported_on_failure_channel() {
    let book = ContactBook::open_in_memory().unwrap();
    let contacts = book.subscribe_contacts();
    let failures = book.subscribe_failures();
    contacts.recv_timeout(WAIT).unwrap();

    let ghost = contactbook_core::Contact::from_draft(
        Uuid::new_v4(),
        ContactDraft::new("Ghost", "5551234567"),
    );
    book.update_contact(ghost).unwrap();
    book.flush().unwrap();

    let failure = failures.try_recv().unwrap();
    assert_eq!(failure.kind, EntityKind::Contact);
    assert_eq!(failure.operation, "update");
    assert_eq!(failure.code, "not_found");
    assert!(contacts.try_recv().is_none());
}

#[test]
fn duplicate_group_name_is_rejected_synchronously() {
    let book = ContactBook::open_in_memory().unwrap();
    book.insert_group("Family").unwrap();
    book.flush().unwrap();

    let err = book.insert_group(" Family ").unwrap_err();
    assert!(matches!(err, BookError::DuplicateGroupName(name) if name == "Family"));
}

#[test]
fn group_cascade_publishes_contacts_then_groups() {
    let book = ContactBook::open_in_memory().unwrap();
    book.insert_group("Family").unwrap();
    book.flush().unwrap();
    let family = book.find_group_by_name("Family").unwrap().unwrap();

    book.insert_contact(ContactDraft::new("Mom", "5551234567").with_group(family.id))
        .unwrap();
    book.insert_contact(ContactDraft::new("Solo", "5551234567"))
        .unwrap();
    book.flush().unwrap();
    let members = book.list_contacts_in_group(family.id).unwrap();
    assert_eq!(members[0].group_name.as_deref(), Some("Family"));

    let contacts = book.subscribe_contacts();
    let groups = book.subscribe_groups();
    contacts.recv_timeout(WAIT).unwrap();
    groups.recv_timeout(WAIT).unwrap();

    book.delete_group(family.id).unwrap();
    book.flush().unwrap();

    let after = contacts.recv_timeout(WAIT).unwrap();
    assert!(after.iter().all(|contact| contact.group_id != Some(family.id)));
    assert_eq!(after.len(), 1);
    assert!(groups.recv_timeout(WAIT).unwrap().is_empty());
    assert!(matches!(
        book.get_group(family.id).unwrap_err(),
        BookError::GroupNotFound(_)
    ));
}

#[test]
fn rename_group_refreshes_member_rows() {
    let book = ContactBook::open_in_memory().unwrap();
    book.insert_group("Family").unwrap();
    book.flush().unwrap();
    let family = book.find_group_by_name("Family").unwrap().unwrap();
    book.insert_contact(ContactDraft::new("Mom", "5551234567").with_group(family.id))
        .unwrap();
    book.flush().unwrap();

    book.rename_group(family.id, "Home").unwrap();
    book.flush().unwrap();

    let contacts = book.list_contacts().unwrap();
    assert_eq!(contacts[0].group_name.as_deref(), Some("Home"));
    assert_eq!(book.get_group(family.id).unwrap().name, "Home");
}

#[test]
fn section_stream_turns_snapshots_into_edits() {
    let book = ContactBook::open_in_memory().unwrap();
    let mut stream = book.subscribe_sections("");
    let initial = stream.recv_timeout(WAIT).unwrap();
    assert!(initial.entries.is_empty());

    book.insert_contact(ContactDraft::new("张三", "5551234567"))
        .unwrap();
    book.insert_contact(ContactDraft::new("Bob", "5551234567"))
        .unwrap();
    book.insert_contact(ContactDraft::new("7-Eleven", "5551234567"))
        .unwrap();
    book.flush().unwrap();

    let mut replayed = initial.entries.clone();
    for _ in 0..3 {
        let update = stream.recv_timeout(WAIT).unwrap();
        apply_edits(&mut replayed, &update.edits);
        assert_eq!(replayed, update.entries);
    }

    let rendered: Vec<String> = stream.entries().iter().map(render).collect();
    assert_eq!(rendered, vec!["#", "7-Eleven", "B", "Bob", "Z", "张三"]);

    let filtered = stream.set_query("bo");
    let rendered: Vec<String> = filtered.entries.iter().map(render).collect();
    assert_eq!(rendered, vec!["B", "Bob"]);
}

#[test]
fn update_trims_fields_before_sectioning() {
    let book = ContactBook::open_in_memory().unwrap();
    book.insert_contact(ContactDraft::new("Amy", "5551234567"))
        .unwrap();
    book.flush().unwrap();

    let mut contact = book.list_contacts().unwrap().remove(0);
    contact.name = " Bob".to_string();
    contact.email = Some(" bob@example.com ".to_string());
    book.update_contact(contact).unwrap();
    book.flush().unwrap();

    let stored = book.list_contacts().unwrap();
    assert_eq!(stored[0].name, "Bob");
    assert_eq!(stored[0].email.as_deref(), Some("bob@example.com"));
    let rendered: Vec<String> = book.sections("").unwrap().iter().map(render).collect();
    assert_eq!(rendered, vec!["B", "Bob"]);
}

#[test]
fn sync_reads_report_not_found() {
    let book = ContactBook::open_in_memory().unwrap();
    let err = book.get_contact(Uuid::new_v4()).unwrap_err();
    assert!(err.is_not_found());
    assert!(book.list_contacts_in_group(Uuid::new_v4()).is_err());
}

#[test]
fn export_then_import_into_fresh_book() {
    let source = ContactBook::open_in_memory().unwrap();
    source.insert_group("Work").unwrap();
    source.flush().unwrap();
    let work = source.find_group_by_name("Work").unwrap().unwrap();
    source
        .insert_contact(
            ContactDraft::new("Boss", "5551234567")
                .with_email("boss@example.com")
                .with_group(work.id),
        )
        .unwrap();
    source
        .insert_contact(ContactDraft::new("Solo", "5557654321"))
        .unwrap();
    source.flush().unwrap();

    let mut exported = Vec::new();
    assert_eq!(source.export_contacts(&mut exported).unwrap(), 2);

    let target = ContactBook::open_in_memory().unwrap();
    target.insert_group("Work").unwrap();
    target.flush().unwrap();
    let report = target.import_contacts(Cursor::new(exported)).unwrap();
    assert!(report.is_clean());
    target.flush().unwrap();

    let imported = target.list_contacts().unwrap();
    assert_eq!(imported.len(), 2);
    let target_work = target.find_group_by_name("Work").unwrap().unwrap();
    assert_eq!(imported[0].group_id, Some(target_work.id));
    assert_eq!(imported[0].group_name.as_deref(), Some("Work"));
    assert_eq!(imported[0].email.as_deref(), Some("boss@example.com"));
    assert_eq!(imported[1].group_id, None);
}

#[test]
fn on_disk_book_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let config = BookConfig::with_database(dir.path().join("contacts.db"));

    {
        let book = ContactBook::open(&config).unwrap();
        book.insert_contact(ContactDraft::new("Bob", "5551234567"))
            .unwrap();
        // Dropping drains the queue.
    }

    let book = ContactBook::open(&config).unwrap();
    assert_eq!(book.list_contacts().unwrap().len(), 1);
}

#[test]
fn hidden_group_is_excluded_from_sections() {
    let book = ContactBook::open_in_memory().unwrap();
    book.insert_group("Work").unwrap();
    book.flush().unwrap();
    let work = book.find_group_by_name("Work").unwrap().unwrap();
    book.insert_contact(ContactDraft::new("Boss", "5551234567").with_group(work.id))
        .unwrap();
    book.insert_contact(ContactDraft::new("Amy", "5551234567"))
        .unwrap();
    book.flush().unwrap();

    book.set_group_visible(work.id, false);
    let rendered: Vec<String> = book.sections("").unwrap().iter().map(render).collect();
    assert_eq!(rendered, vec!["A", "Amy"]);
    assert!(book.group_listing().unwrap().is_empty());
}

fn render(entry: &SectionedEntry) -> String {
    match entry {
        SectionedEntry::Header(glyph) => glyph.to_string(),
        SectionedEntry::Contact(contact) => contact.name.clone(),
    }
}
