//! Substring filter over contact names.

use crate::model::contact::Contact;

/// Keeps contacts whose name contains `query`, ignoring case.
///
/// Relative order is preserved. An empty query keeps every contact.
pub fn filter_contacts(contacts: &[Contact], query: &str) -> Vec<Contact> {
    if query.is_empty() {
        return contacts.to_vec();
    }

    let needle = query.to_lowercase();
    contacts
        .iter()
        .filter(|contact| contact.name.to_lowercase().contains(needle.as_str()))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::filter_contacts;
    use crate::model::contact::{Contact, ContactDraft};
    use uuid::Uuid;

    fn contacts(names: &[&str]) -> Vec<Contact> {
        names
            .iter()
            .map(|name| Contact::from_draft(Uuid::new_v4(), ContactDraft::new(*name, "5551234567")))
            .collect()
    }

    #[test]
    fn empty_query_returns_input() {
        let all = contacts(&["Bob", "张三"]);
        assert_eq!(filter_contacts(&all, ""), all);
    }

    #[test]
    fn match_is_case_insensitive_substring() {
        let all = contacts(&["Bobby", "Alice", "bob"]);
        let names: Vec<String> = filter_contacts(&all, "BOB")
            .into_iter()
            .map(|contact| contact.name)
            .collect();
        assert_eq!(names, vec!["Bobby".to_string(), "bob".to_string()]);
    }

    #[test]
    fn ideograph_queries_match_original_name() {
        let all = contacts(&["张三", "李四"]);
        assert_eq!(filter_contacts(&all, "三").len(), 1);
    }
}
