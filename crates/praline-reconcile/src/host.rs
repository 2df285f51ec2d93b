//! Host-tree adapter
//!
//! The reconciler never owns rendered nodes. It reads and rearranges them
//! through a [`HostTree`], which follows DOM semantics: node handles are
//! cheap to clone, mutation goes through `&self`, and inserting a node that
//! already has a parent moves it.

use std::fmt::Debug;
use std::hash::Hash;

/// Operations the reconciler needs from the rendering target
///
/// Mutating methods return `false` instead of failing when the tree does not
/// have the expected shape (for example a reference node that is no longer a
/// child). Callers treat that as a no-op.
pub trait HostTree {
    /// Handle to a node; equality is node identity
    type Node: Clone + Eq + Hash + Debug + 'static;

    /// Number of children of `parent`
    fn child_count(&self, parent: &Self::Node) -> usize;

    /// The child of `parent` at `index`, if any
    fn child_at(&self, parent: &Self::Node, index: usize) -> Option<Self::Node>;

    /// Whether `node` may have children (elements can, text nodes cannot)
    fn can_have_children(&self, node: &Self::Node) -> bool;

    /// Insert `child` before `reference`, or append it when `reference` is `None`
    ///
    /// A `child` that is already attached somewhere is detached first.
    fn insert_before(
        &self,
        parent: &Self::Node,
        child: &Self::Node,
        reference: Option<&Self::Node>,
    ) -> bool;

    /// Detach `child` from `parent`
    fn remove_child(&self, parent: &Self::Node, child: &Self::Node) -> bool;

    /// Put `new_child` in the position of `old_child`, detaching `old_child`
    fn replace_child(&self, parent: &Self::Node, new_child: &Self::Node, old_child: &Self::Node)
        -> bool;

    /// Structural equality: same kind, same content, structurally equal children
    fn is_equal_node(&self, a: &Self::Node, b: &Self::Node) -> bool;

    /// Append `child` as the last child of `parent`
    fn append_child(&self, parent: &Self::Node, child: &Self::Node) -> bool {
        self.insert_before(parent, child, None)
    }

    /// All children of `parent`, in order
    fn children(&self, parent: &Self::Node) -> Vec<Self::Node> {
        (0..self.child_count(parent))
            .filter_map(|index| self.child_at(parent, index))
            .collect()
    }

    /// Position of `child` among the children of `parent`
    fn index_of(&self, parent: &Self::Node, child: &Self::Node) -> Option<usize> {
        (0..self.child_count(parent)).find(|index| self.child_at(parent, *index).as_ref() == Some(child))
    }

    /// Insert `child` at `position`, appending when `position` is past the end
    fn insert_at(&self, parent: &Self::Node, child: &Self::Node, position: usize) -> bool {
        if position >= self.child_count(parent) {
            return self.append_child(parent, child);
        }
        let reference = self.child_at(parent, position);
        self.insert_before(parent, child, reference.as_ref())
    }
}
