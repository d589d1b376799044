//! Contact book domain model.
//!
//! # Responsibility
//! - Define the persisted records (`Contact`, `Group`) and their drafts.
//! - Own the field-shape validation shared by every write path.
//!
//! # Invariants
//! - Ids are assigned by the store on insert and never reused.
//! - Records are validated before they are queued or persisted.

pub mod contact;
pub mod group;
pub mod validate;
