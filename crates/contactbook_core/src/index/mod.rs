//! Sectioned contact index.
//!
//! # Responsibility
//! - Derive phonetic sort keys and section glyphs.
//! - Build the header-interleaved list and diff successive versions.
//! - Filter by name substring before indexing.
//!
//! # Invariants
//! - The pipeline is filter → key → stable sort → sections; each stage
//!   preserves the relative order it receives.
//! - Nothing in this module touches storage.

pub mod diff;
pub mod filter;
pub mod phonetic;
pub mod projector;
pub mod sections;
pub mod visibility;

use crate::model::contact::Contact;
use filter::filter_contacts;
use phonetic::{compare_keys, derive_sort_key};
use sections::{build_sections, SectionedEntry};

/// Sorts contacts by phonetic key, case-insensitively.
///
/// The sort is stable: equal keys keep their input (insertion) order.
pub fn sort_by_phonetic_key(contacts: Vec<Contact>) -> Vec<Contact> {
    let mut keyed: Vec<(String, Contact)> = contacts
        .into_iter()
        .map(|contact| (derive_sort_key(&contact.name).key, contact))
        .collect();
    keyed.sort_by(|(left, _), (right, _)| compare_keys(left, right));
    keyed.into_iter().map(|(_, contact)| contact).collect()
}

/// Runs the full pipeline over one contact set.
pub fn build_index(contacts: &[Contact], query: &str) -> Vec<SectionedEntry> {
    let sorted = sort_by_phonetic_key(filter_contacts(contacts, query));
    build_sections(&sorted)
}
