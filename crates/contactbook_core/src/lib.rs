//! Core of the contact book: a reactive, sectioned contact index.
//! Storage, mutation queues and the phonetic index all live here; the CLI
//! crate is a thin shell over `ContactBook`.

pub mod config;
pub mod db;
pub mod index;
pub mod live;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;
pub mod transfer;

pub use config::{BookConfig, ConfigError};
pub use index::diff::{apply_edits, diff, EditOp};
pub use index::filter::filter_contacts;
pub use index::phonetic::{derive_sort_key, section_glyph, SortKey, CATCH_ALL_GLYPH};
pub use index::projector::{SectionProjector, SectionUpdate};
pub use index::sections::{build_sections, position_for_section, EntryKey, SectionedEntry};
pub use index::visibility::{group_listing, GroupSection, GroupVisibility};
pub use index::{build_index, sort_by_phonetic_key};
pub use live::{EntityKind, MutationFailure, SectionStream, Snapshot, Subscription};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::contact::{Contact, ContactDraft, ContactId};
pub use model::group::{Group, GroupId};
pub use model::validate::{is_valid_email, is_valid_phone, ValidationError};
pub use repo::{RepoError, RepoResult};
pub use service::contact_book::{BookError, BookResult, ContactBook};
pub use transfer::{export_contacts, parse_import, ImportFailure, ImportReport, TransferError};

/// Minimal health-check API.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
