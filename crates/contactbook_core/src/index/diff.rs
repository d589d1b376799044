//! Minimal edit scripts between two sectioned lists.
//!
//! # Responsibility
//! - Compute insert/remove/move/change operations turning the previously
//!   rendered list into the new one.
//!
//! # Invariants
//! - Identity is `EntryKey`: header glyph, or contact id.
//! - Entries on the longest common subsequence of identities never move.
//! - Ops apply in order; each position refers to the list as left by the
//!   previous op.
//! - `diff(list, list)` is empty.
//!
//! Contact ids are unique within a list and header glyphs repeat only in
//! rare layouts, so entries are paired by identity occurrence (k-th old with
//! k-th new) and the common subsequence reduces to a longest increasing
//! subsequence over the paired new positions.

use crate::index::sections::{EntryKey, SectionedEntry};
use std::collections::{BTreeSet, HashMap, VecDeque};

/// One step of an edit script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditOp {
    Insert { pos: usize, entry: SectionedEntry },
    Remove { pos: usize },
    /// Removes the entry at `from`, then inserts it at `to` of the shortened
    /// list.
    Move { from: usize, to: usize },
    /// Replaces the entry at `pos` with a same-identity entry whose visible
    /// content changed.
    ChangeContent { pos: usize, entry: SectionedEntry },
}

/// Computes the edit script turning `old` into `new`.
///
/// Script order: removals (back to front), moves, insertions (front to
/// back), content changes at final positions.
pub fn diff(old: &[SectionedEntry], new: &[SectionedEntry]) -> Vec<EditOp> {
    let mut pending: HashMap<EntryKey, VecDeque<usize>> = HashMap::with_capacity(new.len());
    for (index, entry) in new.iter().enumerate() {
        pending.entry(entry.key()).or_default().push_back(index);
    }

    // Paired new position for every old entry, `None` when it disappears.
    let targets: Vec<Option<usize>> = old
        .iter()
        .map(|entry| pending.get_mut(&entry.key()).and_then(VecDeque::pop_front))
        .collect();

    let mut paired_new = vec![false; new.len()];
    let paired: Vec<usize> = targets.iter().flatten().copied().collect();
    for &target in &paired {
        paired_new[target] = true;
    }

    let mut settled: BTreeSet<usize> = longest_increasing(&paired).into_iter().collect();
    let mut ops = Vec::new();

    for (pos, target) in targets.iter().enumerate().rev() {
        if target.is_none() {
            ops.push(EditOp::Remove { pos });
        }
    }

    let mut working = paired.clone();
    let mut movers: Vec<usize> = paired
        .iter()
        .copied()
        .filter(|target| !settled.contains(target))
        .collect();
    movers.sort_unstable();

    for target in movers {
        let Some(from) = working.iter().position(|current| *current == target) else {
            continue;
        };
        working.remove(from);
        let to = settled
            .range(..target)
            .next_back()
            .and_then(|predecessor| working.iter().position(|current| current == predecessor))
            .map_or(0, |pos| pos + 1);
        working.insert(to, target);
        settled.insert(target);
        if from != to {
            ops.push(EditOp::Move { from, to });
        }
    }

    for (pos, entry) in new.iter().enumerate() {
        if !paired_new[pos] {
            ops.push(EditOp::Insert {
                pos,
                entry: entry.clone(),
            });
        }
    }

    let mut changed: Vec<usize> = old
        .iter()
        .zip(&targets)
        .filter_map(|(entry, target)| target.filter(|pos| !entry.same_content(&new[*pos])))
        .collect();
    changed.sort_unstable();
    for pos in changed {
        ops.push(EditOp::ChangeContent {
            pos,
            entry: new[pos].clone(),
        });
    }

    ops
}

/// Applies an edit script produced by [`diff`] for this exact list.
///
/// # Panics
/// Panics when an op position is out of bounds, i.e. the script was
/// computed against a different list.
pub fn apply_edits(list: &mut Vec<SectionedEntry>, ops: &[EditOp]) {
    for op in ops {
        match op {
            EditOp::Insert { pos, entry } => list.insert(*pos, entry.clone()),
            EditOp::Remove { pos } => {
                list.remove(*pos);
            }
            EditOp::Move { from, to } => {
                let entry = list.remove(*from);
                list.insert(*to, entry);
            }
            EditOp::ChangeContent { pos, entry } => list[*pos] = entry.clone(),
        }
    }
}

/// Values of one longest strictly increasing subsequence of `values`.
fn longest_increasing(values: &[usize]) -> Vec<usize> {
    let mut tails: Vec<usize> = Vec::new();
    let mut previous: Vec<Option<usize>> = vec![None; values.len()];

    for (index, &value) in values.iter().enumerate() {
        let slot = tails.partition_point(|&tail| values[tail] < value);
        if slot > 0 {
            previous[index] = Some(tails[slot - 1]);
        }
        if slot == tails.len() {
            tails.push(index);
        } else {
            tails[slot] = index;
        }
    }

    let mut run = Vec::with_capacity(tails.len());
    let mut cursor = tails.last().copied();
    while let Some(index) = cursor {
        run.push(values[index]);
        cursor = previous[index];
    }
    run.reverse();
    run
}

#[cfg(test)]
mod tests {
    use super::{apply_edits, diff, longest_increasing, EditOp};
    use crate::index::sections::SectionedEntry;
    use crate::model::contact::{Contact, ContactDraft};
    use uuid::Uuid;

    fn contact(name: &str) -> Contact {
        Contact::from_draft(Uuid::new_v4(), ContactDraft::new(name, "+1 555-123-4567"))
    }

    fn entry(contact: &Contact) -> SectionedEntry {
        SectionedEntry::Contact(contact.clone())
    }

    #[test]
    fn longest_increasing_picks_longest_run() {
        assert_eq!(longest_increasing(&[3, 0, 1, 4, 2]), vec![0, 1, 2]);
        assert!(longest_increasing(&[]).is_empty());
    }

    #[test]
    fn identical_lists_produce_no_ops() {
        let bob = contact("Bob");
        let list = vec![SectionedEntry::Header('B'), entry(&bob)];
        assert!(diff(&list, &list).is_empty());
    }

    #[test]
    fn appended_entry_is_single_insert() {
        let adam = contact("Adam");
        let alice = contact("Alice");
        let old = vec![SectionedEntry::Header('A'), entry(&adam)];
        let new = vec![SectionedEntry::Header('A'), entry(&adam), entry(&alice)];
        assert_eq!(
            diff(&old, &new),
            vec![EditOp::Insert {
                pos: 2,
                entry: entry(&alice)
            }]
        );
    }

    #[test]
    fn swapped_pair_is_single_move() {
        let adam = contact("Adam");
        let alice = contact("Alice");
        let old = vec![entry(&adam), entry(&alice)];
        let new = vec![entry(&alice), entry(&adam)];
        let ops = diff(&old, &new);
        assert_eq!(ops.len(), 1);
        assert!(matches!(ops[0], EditOp::Move { .. }));

        let mut applied = old.clone();
        apply_edits(&mut applied, &ops);
        assert_eq!(applied, new);
    }

    #[test]
    fn edited_phone_is_content_change_in_place() {
        let bob = contact("Bob");
        let mut edited = bob.clone();
        edited.phone = "+86 138 0000 0000".to_string();
        let old = vec![SectionedEntry::Header('B'), entry(&bob)];
        let new = vec![SectionedEntry::Header('B'), entry(&edited)];
        assert_eq!(
            diff(&old, &new),
            vec![EditOp::ChangeContent {
                pos: 1,
                entry: entry(&edited)
            }]
        );
    }

    #[test]
    fn renamed_contact_moves_across_sections() {
        let adam = contact("Adam");
        let bob = contact("Bob");
        let mut renamed = adam.clone();
        renamed.name = "Zed".to_string();
        let old = vec![
            SectionedEntry::Header('A'),
            entry(&adam),
            SectionedEntry::Header('B'),
            entry(&bob),
        ];
        let new = vec![
            SectionedEntry::Header('B'),
            entry(&bob),
            SectionedEntry::Header('Z'),
            entry(&renamed),
        ];

        let ops = diff(&old, &new);
        let mut applied = old.clone();
        apply_edits(&mut applied, &ops);
        assert_eq!(applied, new);
        assert!(ops.contains(&EditOp::Remove { pos: 0 }));
    }
}
