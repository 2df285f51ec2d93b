//! Keyed sequence diff
//!
//! [`diff`] computes an edit script turning an old keyed sequence into a new
//! one. Survivors (keys present in both) whose old positions form a longest
//! increasing subsequence when read in new order are already in the right
//! relative order and are left in place; every other survivor is moved. The
//! number of moves is therefore `survivors - |LIS|`, the minimum for
//! single-element moves.
//!
//! Keys must be unique within each sequence. With duplicate keys the last
//! occurrence wins in the lookup tables and the script is unspecified.
//!
//! # Index conventions
//!
//! | Action   | Index refers to                          |
//! |----------|------------------------------------------|
//! | `Remove` | position in the old sequence             |
//! | `Update` | position in the old sequence             |
//! | `Insert` | position in the new sequence             |
//! | `Move`   | `from`: old position, `to`: new position |

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::hash::Hash;
use tracing::debug;

/// One step of an edit script
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum EditAction<T> {
    /// A new item at `index` in the new sequence
    Insert { index: usize, item: T },
    /// An item kept in place whose value changed; `index` is its old position
    Update { index: usize, item: T },
    /// A surviving item that must be repositioned
    Move { from: usize, to: usize, item: T },
    /// An item that no longer exists; `index` is its old position
    Remove { index: usize },
}

/// Discriminant of an [`EditAction`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EditKind {
    Insert,
    Update,
    Move,
    Remove,
}

impl<T> EditAction<T> {
    /// Which kind of action this is
    pub fn kind(&self) -> EditKind {
        match self {
            EditAction::Insert { .. } => EditKind::Insert,
            EditAction::Update { .. } => EditKind::Update,
            EditAction::Move { .. } => EditKind::Move,
            EditAction::Remove { .. } => EditKind::Remove,
        }
    }

    /// The item carried by the action, if any
    pub fn item(&self) -> Option<&T> {
        match self {
            EditAction::Insert { item, .. }
            | EditAction::Update { item, .. }
            | EditAction::Move { item, .. } => Some(item),
            EditAction::Remove { .. } => None,
        }
    }
}

/// Per-kind action counts of an edit script
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditSummary {
    pub inserts: usize,
    pub updates: usize,
    pub moves: usize,
    pub removes: usize,
}

impl EditSummary {
    /// Count the actions of a script
    pub fn of<T>(edits: &[EditAction<T>]) -> Self {
        let mut summary = Self::default();
        for edit in edits {
            match edit.kind() {
                EditKind::Insert => summary.inserts += 1,
                EditKind::Update => summary.updates += 1,
                EditKind::Move => summary.moves += 1,
                EditKind::Remove => summary.removes += 1,
            }
        }
        summary
    }

    /// Total number of actions
    pub fn total(&self) -> usize {
        self.inserts + self.updates + self.moves + self.removes
    }
}

/// Longest strictly increasing subsequence, by patience sorting
///
/// `tails[p]` is the index into `values` of the smallest tail of any
/// increasing subsequence of length `p + 1`; each value records the tail it
/// extended. Ties resolve toward the subsequence that ends earliest.
pub fn longest_increasing_subsequence<T: Ord + Copy>(values: &[T]) -> Vec<T> {
    let mut tails: Vec<usize> = Vec::new();
    let mut predecessors: Vec<Option<usize>> = Vec::with_capacity(values.len());

    for (i, value) in values.iter().enumerate() {
        let pos = tails.partition_point(|&tail| values[tail] < *value);
        predecessors.push(if pos > 0 { Some(tails[pos - 1]) } else { None });
        if pos == tails.len() {
            tails.push(i);
        } else {
            tails[pos] = i;
        }
    }

    let mut result = Vec::with_capacity(tails.len());
    let mut cursor = tails.last().copied();
    while let Some(i) = cursor {
        result.push(values[i]);
        cursor = predecessors[i];
    }
    result.reverse();
    result
}

/// Diff two keyed sequences, comparing surviving values with `PartialEq`
pub fn diff<T, K, F>(old: &[T], new: &[T], key_of: F) -> Vec<EditAction<T>>
where
    T: Clone + PartialEq,
    K: Hash + Eq,
    F: Fn(&T) -> K,
{
    diff_by(old, new, key_of, |a, b| a == b)
}

/// Diff two keyed sequences with a caller-supplied value equality
///
/// `same` decides whether a survivor kept in place needs an `Update`.
pub fn diff_by<T, K, F, E>(old: &[T], new: &[T], key_of: F, same: E) -> Vec<EditAction<T>>
where
    T: Clone,
    K: Hash + Eq,
    F: Fn(&T) -> K,
    E: Fn(&T, &T) -> bool,
{
    let old_index: HashMap<K, usize> = old
        .iter()
        .enumerate()
        .map(|(i, item)| (key_of(item), i))
        .collect();
    let new_index: HashMap<K, usize> = new
        .iter()
        .enumerate()
        .map(|(i, item)| (key_of(item), i))
        .collect();

    let mut edits = Vec::new();

    for (i, item) in old.iter().enumerate() {
        if !new_index.contains_key(&key_of(item)) {
            edits.push(EditAction::Remove { index: i });
        }
    }

    let survivors: Vec<usize> = new
        .iter()
        .filter_map(|item| old_index.get(&key_of(item)).copied())
        .collect();
    let stable = longest_increasing_subsequence(&survivors);

    let mut j = 0;
    for (i, item) in new.iter().enumerate() {
        match old_index.get(&key_of(item)).copied() {
            Some(from) if stable.get(j) == Some(&from) => {
                if !same(&old[from], item) {
                    edits.push(EditAction::Update {
                        index: from,
                        item: item.clone(),
                    });
                }
                j += 1;
            }
            Some(from) => edits.push(EditAction::Move {
                from,
                to: i,
                item: item.clone(),
            }),
            None => edits.push(EditAction::Insert {
                index: i,
                item: item.clone(),
            }),
        }
    }

    let summary = EditSummary::of(&edits);
    debug!(
        old = old.len(),
        new = new.len(),
        survivors = survivors.len(),
        stable = stable.len(),
        inserts = summary.inserts,
        updates = summary.updates,
        moves = summary.moves,
        removes = summary.removes,
        "computed edit script"
    );
    edits
}
