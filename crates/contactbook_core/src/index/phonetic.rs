//! Phonetic sort keys and section glyphs.
//!
//! # Responsibility
//! - Transliterate ideographs to latin pinyin for ordering.
//! - Pick the single-glyph section bucket for a display name.
//!
//! # Invariants
//! - Pure: the same name always yields the same `SortKey`.
//! - Multi-reading ideographs always use the table's first reading.
//! - The glyph comes from the original first character, not from the key.

use pinyin::ToPinyin;
use std::cmp::Ordering;

/// Bucket for names that do not start with a letter or a known ideograph.
pub const CATCH_ALL_GLYPH: char = '#';

/// Ordering key and section bucket derived from a display name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortKey {
    /// Concatenated per-character transliteration; never displayed.
    pub key: String,
    pub glyph: char,
}

/// Derives the phonetic sort key and section glyph for `name`.
///
/// Ideographs with a reading become their toneless lowercase pinyin; every
/// other character is copied unchanged. `"张三"` yields key `zhangsan` and
/// glyph `Z`; an empty name yields an empty key and `#`.
pub fn derive_sort_key(name: &str) -> SortKey {
    let mut key = String::with_capacity(name.len() * 2);
    for ch in name.chars() {
        match reading(ch) {
            Some(latin) => key.push_str(latin),
            None => key.push(ch),
        }
    }

    SortKey {
        key,
        glyph: section_glyph(name),
    }
}

/// Returns the section glyph of `name` without building the full key.
pub fn section_glyph(name: &str) -> char {
    name.chars().next().map_or(CATCH_ALL_GLYPH, glyph_for_char)
}

/// Case-insensitive lexicographic comparison of two sort keys.
pub fn compare_keys(left: &str, right: &str) -> Ordering {
    left.chars()
        .flat_map(char::to_lowercase)
        .cmp(right.chars().flat_map(char::to_lowercase))
}

fn glyph_for_char(first: char) -> char {
    if let Some(latin) = reading(first) {
        return latin
            .chars()
            .next()
            .map_or(CATCH_ALL_GLYPH, |letter| letter.to_ascii_uppercase());
    }
    // An ideograph the table does not know is not a letter bucket.
    if is_cjk_ideograph(first) {
        return CATCH_ALL_GLYPH;
    }
    if first.is_alphabetic() {
        return first.to_uppercase().next().unwrap_or(first);
    }
    CATCH_ALL_GLYPH
}

fn reading(ch: char) -> Option<&'static str> {
    ch.to_pinyin().map(|pinyin| pinyin.plain())
}

fn is_cjk_ideograph(ch: char) -> bool {
    matches!(
        ch,
        '\u{3400}'..='\u{4DBF}'
            | '\u{4E00}'..='\u{9FFF}'
            | '\u{F900}'..='\u{FAFF}'
            | '\u{20000}'..='\u{2EBEF}'
    )
}
