//! Header-interleaved section list.
//!
//! # Invariants
//! - Exactly one header per maximal run of contacts sharing a glyph.
//! - Never two adjacent headers, never an empty section.
//! - Input order is kept; the builder does not sort.

use crate::index::phonetic::section_glyph;
use crate::model::contact::{Contact, ContactId};

/// One row of the sectioned list: a header marker or a contact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SectionedEntry {
    Header(char),
    Contact(Contact),
}

/// Identity of an entry for reconciliation purposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryKey {
    Header(char),
    Contact(ContactId),
}

impl SectionedEntry {
    pub fn key(&self) -> EntryKey {
        match self {
            Self::Header(glyph) => EntryKey::Header(*glyph),
            Self::Contact(contact) => EntryKey::Contact(contact.id),
        }
    }

    /// Whether both entries render identically.
    pub fn same_content(&self, other: &SectionedEntry) -> bool {
        match (self, other) {
            (Self::Header(left), Self::Header(right)) => left == right,
            (Self::Contact(left), Self::Contact(right)) => left.same_content(right),
            _ => false,
        }
    }
}

/// Interleaves section headers into an already sorted contact sequence.
pub fn build_sections(sorted: &[Contact]) -> Vec<SectionedEntry> {
    let mut entries = Vec::with_capacity(sorted.len() + sorted.len().min(27));
    let mut last_glyph: Option<char> = None;

    for contact in sorted {
        let glyph = section_glyph(&contact.name);
        if last_glyph != Some(glyph) {
            entries.push(SectionedEntry::Header(glyph));
            last_glyph = Some(glyph);
        }
        entries.push(SectionedEntry::Contact(contact.clone()));
    }

    entries
}

/// Returns the index of the first header carrying `glyph`.
pub fn position_for_section(entries: &[SectionedEntry], glyph: char) -> Option<usize> {
    entries
        .iter()
        .position(|entry| matches!(entry, SectionedEntry::Header(current) if *current == glyph))
}
