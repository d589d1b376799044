//! Mutation queues and snapshot delivery.
//!
//! # Responsibility
//! - Run store mutations off the caller's thread, one worker per entity kind.
//! - Deliver post-commit snapshots to subscribers from a single dispatcher.
//!
//! # Invariants
//! - Mutations of one kind apply in submission order.
//! - Subscribers see snapshots in commit order, starting with the snapshot
//!   current at subscription time.
//! - A failed mutation publishes no snapshot; it is logged and reported on
//!   the failure channel.

pub(crate) mod hub;
pub(crate) mod queue;
mod section_stream;
mod subscription;

pub use section_stream::SectionStream;
pub use subscription::Subscription;

use std::fmt::{Display, Formatter};
use std::sync::Arc;

/// Immutable, shared copy of one table's full listing.
pub type Snapshot<T> = Arc<Vec<T>>;

/// Entity kinds with independent mutation queues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Contact,
    Group,
}

impl EntityKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Contact => "contact",
            Self::Group => "group",
        }
    }
}

impl Display for EntityKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Report of a queued mutation that did not commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MutationFailure {
    pub kind: EntityKind,
    /// Operation name, e.g. `update` or `delete_cascade`.
    pub operation: &'static str,
    /// Stable error code, see `RepoError::code`.
    pub code: &'static str,
    pub message: String,
}
