use contactbook_core::{
    apply_edits, build_index, build_sections, derive_sort_key, diff, filter_contacts,
    position_for_section, section_glyph, sort_by_phonetic_key, Contact, ContactDraft,
    SectionedEntry,
};
use proptest::prelude::*;
use uuid::Uuid;

const NAMES: &[&str] = &[
    "Alice", "alice", "Bob", "bob", "Zoe", "张三", "张伟", "李四", "王五", "7-Eleven", "110",
    "Émile", "Ölaf", "#hash", "Li 小明", "赵六", "~tilde",
];

fn contact(seed: u128, name: &str, phone: &str) -> Contact {
    Contact::from_draft(Uuid::from_u128(seed), ContactDraft::new(name, phone))
}

fn names(entries: &[SectionedEntry]) -> Vec<String> {
    entries
        .iter()
        .map(|entry| match entry {
            SectionedEntry::Header(glyph) => glyph.to_string(),
            SectionedEntry::Contact(contact) => contact.name.clone(),
        })
        .collect()
}

#[test]
fn mixed_script_example_sorts_and_sections() {
    let contacts = vec![
        contact(1, "张三", "5551234567"),
        contact(2, "Bob", "5551234567"),
        contact(3, "7-Eleven", "5551234567"),
    ];

    let key = derive_sort_key("张三");
    assert_eq!(key.key, "zhangsan");
    assert_eq!(key.glyph, 'Z');
    assert_eq!(section_glyph("Bob"), 'B');
    let eleven = derive_sort_key("7-Eleven");
    assert_eq!(eleven.key, "7-Eleven");
    assert_eq!(eleven.key.to_lowercase(), "7-eleven");
    assert_eq!(eleven.glyph, '#');

    let entries = build_index(&contacts, "");
    assert_eq!(names(&entries), vec!["#", "7-Eleven", "B", "Bob", "Z", "张三"]);
    assert_eq!(position_for_section(&entries, 'Z'), Some(4));
}

#[test]
fn equal_keys_keep_insertion_order() {
    let sorted = sort_by_phonetic_key(vec![
        contact(1, "bob", "5551234567"),
        contact(2, "Alice", "5551234567"),
        contact(3, "Bob", "5551234567"),
    ]);
    let ids: Vec<u128> = sorted.iter().map(|c| c.id.as_u128()).collect();
    assert_eq!(ids, vec![2, 1, 3]);
}

#[test]
fn filter_drops_headers_of_empty_sections() {
    let contacts = vec![
        contact(1, "Alice", "5551234567"),
        contact(2, "Bob", "5551234567"),
        contact(3, "Zoe", "5551234567"),
    ];
    let entries = build_index(&contacts, "O");
    assert_eq!(names(&entries), vec!["B", "Bob", "Z", "Zoe"]);
}

#[test]
fn rename_across_sections_diffs_to_move_and_change() {
    let before = vec![
        contact(1, "Alice", "5551234567"),
        contact(2, "Bob", "5551234567"),
        contact(3, "Carl", "5551234567"),
    ];
    let mut after = before.clone();
    after[0].name = "Zara".to_string();

    let old = build_index(&before, "");
    let new = build_index(&after, "");
    let edits = diff(&old, &new);
    assert!(!edits.is_empty());

    let mut replayed = old.clone();
    apply_edits(&mut replayed, &edits);
    assert_eq!(replayed, new);
}

#[test]
fn catch_all_glyph_can_head_two_runs() {
    let before = vec![
        contact(1, "7-Eleven", "5551234567"),
        contact(2, "Bob", "5551234567"),
        contact(3, "~tilde", "5551234567"),
    ];
    let old = build_index(&before, "");
    assert_eq!(names(&old), vec!["#", "7-Eleven", "B", "Bob", "#", "~tilde"]);

    let mut after = before.clone();
    after.remove(1);
    let new = build_index(&after, "");
    assert_eq!(names(&new), vec!["#", "7-Eleven", "~tilde"]);

    let mut replayed = old.clone();
    apply_edits(&mut replayed, &diff(&old, &new));
    assert_eq!(replayed, new);
}

/// One contact slot: present before, present after, name before, name after.
fn slots() -> impl Strategy<Value = Vec<(bool, bool, usize, usize, bool)>> {
    prop::collection::vec(
        (
            any::<bool>(),
            any::<bool>(),
            0..NAMES.len(),
            0..NAMES.len(),
            any::<bool>(),
        ),
        0..16,
    )
}

fn materialize(slots: &[(bool, bool, usize, usize, bool)]) -> (Vec<Contact>, Vec<Contact>) {
    let mut old = Vec::new();
    let mut new = Vec::new();
    for (index, (in_old, in_new, name_old, name_new, phone_changed)) in slots.iter().enumerate()
    {
        let seed = index as u128 + 1;
        if *in_old {
            old.push(contact(seed, NAMES[*name_old], "5551234567"));
        }
        if *in_new {
            let phone = if *phone_changed { "5559999999" } else { "5551234567" };
            new.push(contact(seed, NAMES[*name_new], phone));
        }
    }
    (old, new)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn sort_key_is_deterministic(name in "\\PC{0,12}") {
        let first = derive_sort_key(&name);
        let second = derive_sort_key(&name);
        prop_assert_eq!(&first, &second);
        prop_assert_eq!(first.glyph, section_glyph(&name));
    }

    #[test]
    fn sections_have_one_header_per_run(picks in prop::collection::vec(0..NAMES.len(), 0..20)) {
        let contacts: Vec<Contact> = picks
            .iter()
            .enumerate()
            .map(|(index, pick)| contact(index as u128 + 1, NAMES[*pick], "5551234567"))
            .collect();
        let sorted = sort_by_phonetic_key(contacts.clone());
        let entries = build_sections(&sorted);

        let mut current: Option<char> = None;
        let mut previous_was_header = false;
        let mut seen_contacts = 0;
        for entry in &entries {
            match entry {
                SectionedEntry::Header(glyph) => {
                    prop_assert!(!previous_was_header);
                    prop_assert_ne!(Some(*glyph), current);
                    current = Some(*glyph);
                    previous_was_header = true;
                }
                SectionedEntry::Contact(contact) => {
                    prop_assert_eq!(current, Some(section_glyph(&contact.name)));
                    previous_was_header = false;
                    seen_contacts += 1;
                }
            }
        }
        prop_assert!(!previous_was_header);
        prop_assert_eq!(seen_contacts, contacts.len());
    }

    #[test]
    fn diff_of_identical_lists_is_empty(slots in slots()) {
        let (old, _) = materialize(&slots);
        let entries = build_index(&old, "");
        prop_assert!(diff(&entries, &entries).is_empty());
    }

    #[test]
    fn applying_diff_reproduces_target(slots in slots()) {
        let (old, new) = materialize(&slots);
        let before = build_index(&old, "");
        let after = build_index(&new, "");

        let mut replayed = before.clone();
        apply_edits(&mut replayed, &diff(&before, &after));
        prop_assert_eq!(replayed, after);
    }

    #[test]
    fn filter_keeps_an_ordered_subsequence(
        picks in prop::collection::vec(0..NAMES.len(), 0..20),
        query in "[abloz张三]{0,2}",
    ) {
        let contacts: Vec<Contact> = picks
            .iter()
            .enumerate()
            .map(|(index, pick)| contact(index as u128 + 1, NAMES[*pick], "5551234567"))
            .collect();
        prop_assert_eq!(filter_contacts(&contacts, ""), contacts.clone());

        let filtered = filter_contacts(&contacts, &query);
        let mut cursor = contacts.iter();
        for kept in &filtered {
            prop_assert!(cursor.any(|candidate| candidate == kept));
            prop_assert!(kept.name.to_lowercase().contains(&query.to_lowercase()));
        }
    }
}
