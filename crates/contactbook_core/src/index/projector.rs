//! Stateful view projection over contact snapshots.
//!
//! # Responsibility
//! - Remember the last rendered sectioned list, query and visibility.
//! - Turn every new input into a full list plus an edit script against the
//!   previous rendering.
//!
//! # Invariants
//! - `entries()` always equals the list described by the last update.
//! - Applying an update's edits to the previous entries yields its entries.

use crate::index::build_index;
use crate::index::diff::{diff, EditOp};
use crate::index::sections::SectionedEntry;
use crate::index::visibility::GroupVisibility;
use crate::model::contact::Contact;
use std::sync::Arc;

/// Result of one projection step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionUpdate {
    /// Full list after this step.
    pub entries: Vec<SectionedEntry>,
    /// Edit script from the previous list to `entries`.
    pub edits: Vec<EditOp>,
}

impl SectionUpdate {
    pub fn is_unchanged(&self) -> bool {
        self.edits.is_empty()
    }
}

#[derive(Debug, Default)]
pub struct SectionProjector {
    contacts: Arc<Vec<Contact>>,
    query: String,
    visibility: GroupVisibility,
    rendered: Vec<SectionedEntry>,
}

impl SectionProjector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_query(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            ..Self::default()
        }
    }

    /// Projects a fresh contact snapshot with the current query.
    pub fn apply_snapshot(&mut self, contacts: Arc<Vec<Contact>>) -> SectionUpdate {
        self.contacts = contacts;
        self.render()
    }

    /// Re-projects the last snapshot under a new query.
    pub fn set_query(&mut self, query: impl Into<String>) -> SectionUpdate {
        self.query = query.into();
        self.render()
    }

    /// Re-projects the last snapshot under a new group visibility.
    pub fn set_visibility(&mut self, visibility: GroupVisibility) -> SectionUpdate {
        self.visibility = visibility;
        self.render()
    }

    pub fn entries(&self) -> &[SectionedEntry] {
        &self.rendered
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    fn render(&mut self) -> SectionUpdate {
        let visible = self.visibility.retain_visible(&self.contacts);
        let entries = build_index(&visible, &self.query);
        let edits = diff(&self.rendered, &entries);
        self.rendered = entries.clone();
        SectionUpdate { entries, edits }
    }
}

#[cfg(test)]
mod tests {
    use super::SectionProjector;
    use crate::index::diff::apply_edits;
    use crate::index::sections::SectionedEntry;
    use crate::model::contact::{Contact, ContactDraft};
    use std::sync::Arc;
    use uuid::Uuid;

    fn contact(name: &str) -> Contact {
        Contact::from_draft(Uuid::new_v4(), ContactDraft::new(name, "5551234567"))
    }

    #[test]
    fn query_change_reuses_last_snapshot() {
        let mut projector = SectionProjector::new();
        let first = projector.apply_snapshot(Arc::new(vec![contact("Bob"), contact("Alice")]));
        assert_eq!(first.entries.len(), 4);

        let filtered = projector.set_query("bo");
        assert_eq!(filtered.entries.len(), 2);
        assert_eq!(filtered.entries[0], SectionedEntry::Header('B'));

        let mut replayed = first.entries.clone();
        apply_edits(&mut replayed, &filtered.edits);
        assert_eq!(replayed, filtered.entries);
    }

    #[test]
    fn same_snapshot_twice_is_unchanged() {
        let snapshot = Arc::new(vec![contact("Bob")]);
        let mut projector = SectionProjector::with_query("");
        projector.apply_snapshot(Arc::clone(&snapshot));
        assert!(projector.apply_snapshot(snapshot).is_unchanged());
    }
}
