//! Per-group display preference.
//!
//! # Responsibility
//! - Decide which contacts are handed to the index, based on a per-group
//!   boolean preference.
//! - Build the per-group listing used by the group view.
//!
//! # Invariants
//! - Groups are visible unless explicitly hidden.
//! - Ungrouped contacts are always visible.
//! - The section index never consults this type directly.

use crate::model::contact::Contact;
use crate::model::group::{Group, GroupId};
use std::collections::BTreeSet;

/// Set of hidden groups.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupVisibility {
    hidden: BTreeSet<GroupId>,
}

impl GroupVisibility {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_hidden(hidden: impl IntoIterator<Item = GroupId>) -> Self {
        Self {
            hidden: hidden.into_iter().collect(),
        }
    }

    pub fn set_visible(&mut self, group_id: GroupId, visible: bool) {
        if visible {
            self.hidden.remove(&group_id);
        } else {
            self.hidden.insert(group_id);
        }
    }

    pub fn is_group_visible(&self, group_id: GroupId) -> bool {
        !self.hidden.contains(&group_id)
    }

    pub fn is_contact_visible(&self, contact: &Contact) -> bool {
        contact
            .group_id
            .map_or(true, |group_id| self.is_group_visible(group_id))
    }

    /// Returns the visible subset, keeping order.
    pub fn retain_visible(&self, contacts: &[Contact]) -> Vec<Contact> {
        if self.hidden.is_empty() {
            return contacts.to_vec();
        }
        contacts
            .iter()
            .filter(|contact| self.is_contact_visible(contact))
            .cloned()
            .collect()
    }
}

/// One visible group with its members.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupSection {
    pub group: Group,
    /// Members in the order they appear in the contact list.
    pub contacts: Vec<Contact>,
}

/// Groups contacts under their visible groups, in group insertion order.
///
/// Ungrouped contacts and contacts of hidden groups are not listed.
pub fn group_listing(
    groups: &[Group],
    contacts: &[Contact],
    visibility: &GroupVisibility,
) -> Vec<GroupSection> {
    groups
        .iter()
        .filter(|group| visibility.is_group_visible(group.id))
        .map(|group| GroupSection {
            group: group.clone(),
            contacts: contacts
                .iter()
                .filter(|contact| contact.group_id == Some(group.id))
                .cloned()
                .collect(),
        })
        .collect()
}
