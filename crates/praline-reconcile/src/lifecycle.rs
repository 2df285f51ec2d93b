//! Unmount lifecycle
//!
//! Bindings register one-shot teardowns on the nodes they are attached to.
//! Unmounting a node walks its subtree depth-first, children before parents,
//! and runs every registered teardown exactly once. The reconciler unmounts a
//! node before detaching it, so bindings below it are torn down first.

use crate::HostTree;
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;
use std::rc::Rc;
use tracing::trace;

type Teardown = Box<dyn FnOnce()>;

/// Registry of unmount teardowns, keyed by node
pub struct Lifecycle<N> {
    teardowns: Rc<RefCell<HashMap<N, Vec<Teardown>>>>,
}

impl<N> Clone for Lifecycle<N> {
    fn clone(&self) -> Self {
        Self {
            teardowns: self.teardowns.clone(),
        }
    }
}

impl<N> Default for Lifecycle<N> {
    fn default() -> Self {
        Self {
            teardowns: Rc::new(RefCell::new(HashMap::new())),
        }
    }
}

impl<N: Clone + Eq + Hash + fmt::Debug> Lifecycle<N> {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `teardown` the next time `node` (or one of its ancestors) is unmounted
    pub fn on_unmount(&self, node: &N, teardown: impl FnOnce() + 'static) {
        self.teardowns
            .borrow_mut()
            .entry(node.clone())
            .or_default()
            .push(Box::new(teardown));
    }

    /// Whether any teardown is pending on `node` itself
    pub fn has_teardowns(&self, node: &N) -> bool {
        self.teardowns
            .borrow()
            .get(node)
            .is_some_and(|list| !list.is_empty())
    }

    /// Total number of pending teardowns across all nodes
    pub fn pending(&self) -> usize {
        self.teardowns.borrow().values().map(Vec::len).sum()
    }

    /// Raise unmount on `node` and its whole subtree
    ///
    /// Descendants are unmounted before `node`; a node's own teardowns run in
    /// registration order. Returns how many teardowns ran.
    pub fn unmount<H: HostTree<Node = N>>(&self, host: &H, node: &N) -> usize {
        let mut ran = 0;
        for child in host.children(node) {
            ran += self.unmount(host, &child);
        }

        // Taken out before running so teardowns may register or unmount freely
        let own = self.teardowns.borrow_mut().remove(node).unwrap_or_default();
        if !own.is_empty() {
            trace!(node = ?node, teardowns = own.len(), "unmounting node");
        }
        for teardown in own {
            teardown();
            ran += 1;
        }
        ran
    }
}

impl<N> fmt::Debug for Lifecycle<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.teardowns.try_borrow() {
            Ok(map) => f.debug_struct("Lifecycle").field("nodes", &map.len()).finish(),
            Err(_) => f.debug_struct("Lifecycle").finish_non_exhaustive(),
        }
    }
}
