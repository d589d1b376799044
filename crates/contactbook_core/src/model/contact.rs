//! Contact domain model.
//!
//! # Responsibility
//! - Define the persisted contact record and its id-less draft.
//! - Define the visible-content comparison used by list reconciliation.
//!
//! # Invariants
//! - `id` is assigned by the store and stable for the record lifetime.
//! - `group_name` mirrors the referenced group's name; writers keep it in
//!   sync, the store does not.

use crate::model::group::GroupId;
use crate::model::validate::{validate_contact_fields, ValidationError};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable identifier for a stored contact.
pub type ContactId = Uuid;

/// Persisted contact record.
///
/// Field order is the serialization order of the text transfer format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    pub id: ContactId,
    pub name: String,
    pub phone: String,
    pub email: Option<String>,
    /// `None` means ungrouped.
    pub group_id: Option<GroupId>,
    /// Cached display name of `group_id` at assignment time.
    pub group_name: Option<String>,
    /// Opaque handle to externally stored image data.
    pub photo_ref: Option<String>,
}

impl Contact {
    /// Attaches a store-assigned id to a draft.
    pub fn from_draft(id: ContactId, draft: ContactDraft) -> Self {
        Self {
            id,
            name: draft.name,
            phone: draft.phone,
            email: draft.email,
            group_id: draft.group_id,
            group_name: draft.group_name,
            photo_ref: draft.photo_ref,
        }
    }

    /// Trims name, phone and email the way [`ContactDraft::new`] does; a
    /// blank email becomes `None`.
    pub fn normalized(mut self) -> Self {
        self.name = self.name.trim().to_string();
        self.phone = self.phone.trim().to_string();
        self.email = self
            .email
            .map(|email| email.trim().to_string())
            .filter(|email| !email.is_empty());
        self
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_contact_fields(&self.name, &self.phone, self.email.as_deref())
    }

    pub fn has_photo(&self) -> bool {
        self.photo_ref.is_some()
    }

    /// Compares the fields a contact row renders.
    ///
    /// `group_id` and the photo handle value are not rendered; only photo
    /// presence is.
    pub fn same_content(&self, other: &Contact) -> bool {
        self.name == other.name
            && self.phone == other.phone
            && self.email == other.email
            && self.group_name == other.group_name
            && self.has_photo() == other.has_photo()
    }
}

/// Contact fields before the store assigns an id.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ContactDraft {
    pub name: String,
    pub phone: String,
    pub email: Option<String>,
    pub group_id: Option<GroupId>,
    pub group_name: Option<String>,
    pub photo_ref: Option<String>,
}

impl ContactDraft {
    /// Creates an ungrouped draft with trimmed name and phone.
    pub fn new(name: impl Into<String>, phone: impl Into<String>) -> Self {
        Self {
            name: name.into().trim().to_string(),
            phone: phone.into().trim().to_string(),
            ..Self::default()
        }
    }

    /// Sets the email; blank input clears it.
    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        let email = email.into().trim().to_string();
        self.email = if email.is_empty() { None } else { Some(email) };
        self
    }

    /// Assigns the draft to a group. The cached group name is filled in by
    /// the mutation worker when the draft is applied.
    pub fn with_group(mut self, group_id: GroupId) -> Self {
        self.group_id = Some(group_id);
        self
    }

    pub fn with_photo_ref(mut self, photo_ref: impl Into<String>) -> Self {
        self.photo_ref = Some(photo_ref.into());
        self
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_contact_fields(&self.name, &self.phone, self.email.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::{Contact, ContactDraft};
    use uuid::Uuid;

    #[test]
    fn draft_constructor_trims_and_clears_blank_email() {
        let draft = ContactDraft::new("  Bob ", " +1 555-123-4567 ").with_email("   ");
        assert_eq!(draft.name, "Bob");
        assert_eq!(draft.phone, "+1 555-123-4567");
        assert_eq!(draft.email, None);
    }

    #[test]
    fn normalized_trims_full_records() {
        let mut contact =
            Contact::from_draft(Uuid::new_v4(), ContactDraft::new("Bob", "5551234567"));
        contact.name = " Bob".to_string();
        contact.phone = "5551234567 ".to_string();
        contact.email = Some("  ".to_string());

        let contact = contact.normalized();
        assert_eq!(contact.name, "Bob");
        assert_eq!(contact.phone, "5551234567");
        assert_eq!(contact.email, None);
    }

    #[test]
    fn same_content_ignores_hidden_fields() {
        let base = Contact::from_draft(
            Uuid::new_v4(),
            ContactDraft::new("Bob", "+1 555-123-4567").with_photo_ref("a.png"),
        );
        let mut other = base.clone();
        other.photo_ref = Some("b.png".to_string());
        other.group_id = Some(Uuid::new_v4());
        assert!(base.same_content(&other));

        other.photo_ref = None;
        assert!(!base.same_content(&other));
    }
}
