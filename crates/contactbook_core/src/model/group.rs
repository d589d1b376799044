//! Group domain model.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable identifier for a stored group.
pub type GroupId = Uuid;

/// Named bucket of contacts. Names are unique, compared case-sensitively.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    pub id: GroupId,
    pub name: String,
}
