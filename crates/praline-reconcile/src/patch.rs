//! Edit-script application
//!
//! [`apply_edits`] applies a script produced by [`diff`](crate::diff) to the
//! children of a live container, in four phases:
//!
//! 1. **Update**: replace the node at each update's old position.
//! 2. **Remove**: detach nodes, highest old position first.
//! 3. **Insert**: build and insert new nodes, lowest new position first.
//! 4. **Move**: place the survivors that were not in the stable subsequence.
//!
//! Move sources are resolved by old position before any phase runs and are
//! lifted out of the container ahead of the insert phase. Insert positions
//! are rebased past the moved slots that precede them, and moves are placed
//! at their exact target. After all four phases the keyed region matches the
//! new sequence.
//!
//! A node missing at an expected position (the container was changed behind
//! the reconciler's back) makes that action a no-op instead of an error.

use crate::{EditAction, HostTree};
use tracing::{debug, warn};

/// What [`apply_edits`] did
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PatchStats {
    pub updated: usize,
    pub removed: usize,
    pub inserted: usize,
    pub moved: usize,
    /// Actions dropped because their node could not be found
    pub skipped: usize,
}

/// Apply `edits` to the children of `container`
///
/// Positions are relative to `start_offset`, the number of static children
/// that precede the keyed region. `create_node` builds nodes for inserted
/// and updated items; `notify_unmount` is raised on every node right before
/// it is replaced or removed.
pub fn apply_edits<H, T, C, U>(
    host: &H,
    container: &H::Node,
    edits: &[EditAction<T>],
    mut create_node: C,
    mut notify_unmount: U,
    start_offset: usize,
) -> PatchStats
where
    H: HostTree,
    C: FnMut(&T) -> H::Node,
    U: FnMut(&H::Node),
{
    let mut stats = PatchStats::default();

    let mut updates = Vec::new();
    let mut removes = Vec::new();
    let mut inserts = Vec::new();
    let mut moves = Vec::new();
    for edit in edits {
        match edit {
            EditAction::Update { index, item } => updates.push((*index, item)),
            EditAction::Remove { index } => removes.push(*index),
            EditAction::Insert { index, item } => inserts.push((*index, item)),
            EditAction::Move { from, to, .. } => moves.push((*from, *to)),
        }
    }
    removes.sort_unstable_by(|a, b| b.cmp(a));
    inserts.sort_by_key(|(index, _)| *index);
    moves.sort_by_key(|(from, _)| *from);

    let mut placements: Vec<(H::Node, usize)> = Vec::with_capacity(moves.len());
    for (from, to) in moves {
        match host.child_at(container, from + start_offset) {
            Some(node) => placements.push((node, to)),
            None => {
                warn!(from, to, "move source missing; skipping");
                stats.skipped += 1;
            }
        }
    }
    placements.sort_by_key(|(_, to)| *to);

    for (index, item) in updates {
        let Some(node) = host.child_at(container, index + start_offset) else {
            warn!(index, "update target missing; skipping");
            stats.skipped += 1;
            continue;
        };
        notify_unmount(&node);
        let replacement = create_node(item);
        if host.replace_child(container, &replacement, &node) {
            stats.updated += 1;
        } else {
            stats.skipped += 1;
        }
    }

    for index in removes {
        let Some(node) = host.child_at(container, index + start_offset) else {
            warn!(index, "remove target missing; skipping");
            stats.skipped += 1;
            continue;
        };
        notify_unmount(&node);
        if host.remove_child(container, &node) {
            stats.removed += 1;
        } else {
            stats.skipped += 1;
        }
    }

    for (node, _) in &placements {
        host.remove_child(container, node);
    }
    let targets: Vec<usize> = placements.iter().map(|(_, to)| *to).collect();

    for (index, item) in inserts {
        // Malformed scripts can aim several moves at one slot
        let preceding_moves = targets.partition_point(|to| *to < index);
        let position = index.saturating_sub(preceding_moves) + start_offset;
        let node = create_node(item);
        if host.insert_at(container, &node, position) {
            stats.inserted += 1;
        } else {
            stats.skipped += 1;
        }
    }

    for (node, to) in &placements {
        if host.insert_at(container, node, to + start_offset) {
            stats.moved += 1;
        } else {
            stats.skipped += 1;
        }
    }

    debug!(
        updated = stats.updated,
        removed = stats.removed,
        inserted = stats.inserted,
        moved = stats.moved,
        skipped = stats.skipped,
        "applied edit script"
    );
    stats
}
