use crate::index::projector::{SectionProjector, SectionUpdate};
use crate::index::sections::SectionedEntry;
use crate::index::visibility::GroupVisibility;
use crate::live::{Snapshot, Subscription};
use crate::model::contact::Contact;
use std::time::Duration;

/// Contact subscription projected into sectioned list updates.
///
/// Projection runs on the thread that calls `recv*`, never on the
/// dispatcher.
pub struct SectionStream {
    subscription: Subscription<Snapshot<Contact>>,
    projector: SectionProjector,
}

impl SectionStream {
    pub(crate) fn new(
        subscription: Subscription<Snapshot<Contact>>,
        query: &str,
        visibility: GroupVisibility,
    ) -> Self {
        let mut projector = SectionProjector::with_query(query);
        // Nothing rendered yet, so the returned update is empty.
        projector.set_visibility(visibility);
        Self {
            subscription,
            projector,
        }
    }

    /// Blocks for the next snapshot and projects it.
    pub fn recv(&mut self) -> Option<SectionUpdate> {
        let snapshot = self.subscription.recv()?;
        Some(self.projector.apply_snapshot(snapshot))
    }

    pub fn recv_timeout(&mut self, timeout: Duration) -> Option<SectionUpdate> {
        let snapshot = self.subscription.recv_timeout(timeout)?;
        Some(self.projector.apply_snapshot(snapshot))
    }

    pub fn try_recv(&mut self) -> Option<SectionUpdate> {
        let snapshot = self.subscription.try_recv()?;
        Some(self.projector.apply_snapshot(snapshot))
    }

    /// Re-projects the last received snapshot under a new query.
    pub fn set_query(&mut self, query: &str) -> SectionUpdate {
        self.projector.set_query(query)
    }

    pub fn set_visibility(&mut self, visibility: GroupVisibility) -> SectionUpdate {
        self.projector.set_visibility(visibility)
    }

    /// Entries as of the last returned update.
    pub fn entries(&self) -> &[SectionedEntry] {
        self.projector.entries()
    }

    pub fn query(&self) -> &str {
        self.projector.query()
    }
}
