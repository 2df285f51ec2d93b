//! Single-child bindings
//!
//! [`Renderer::bind_child`] keeps one child of a container rebuilt from
//! state; [`Renderer::bind_guarded_child`] mounts and unmounts a child as a
//! predicate over state flips.

use crate::{HostTree, Lifecycle, Renderer, Result};
use praline_core::{create_effect, Deps, Disposer};
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use tracing::debug;

impl<H: HostTree + Clone + 'static> Renderer<H> {
    /// Append a child built from `deps`, rebuilding it whenever they change
    ///
    /// A rebuilt node replaces the previous one in place unless the two are
    /// structurally equal, in which case the previous node stays.
    pub fn bind_child<D, B>(&self, container: &H::Node, deps: D, build: B) -> Result<Disposer>
    where
        D: Deps + 'static,
        B: Fn(D::Values) -> H::Node + 'static,
    {
        self.ensure_container(container)?;

        let first = build(deps.read(&self.store)?);
        self.host.append_child(container, &first);
        if deps.ids().is_empty() {
            return Ok(Disposer::noop());
        }

        let current = RefCell::new(first);
        let host = self.host.clone();
        let lifecycle = self.lifecycle.clone();
        let parent = container.clone();
        let disposer = create_effect(&self.store, deps, move |values| {
            let fresh = build(values);
            let previous = current.borrow().clone();
            if fresh == previous {
                return;
            }
            if host.is_equal_node(&fresh, &previous) {
                lifecycle.unmount(&host, &fresh);
                return;
            }
            lifecycle.unmount(&host, &previous);
            host.replace_child(&parent, &fresh, &previous);
            *current.borrow_mut() = fresh;
        })?;

        self.dispose_on_unmount(container, disposer.clone());
        debug!(container = ?container, "bound child");
        Ok(disposer)
    }

    /// Mount a child built from `deps` only while `predicate` holds
    ///
    /// The child is appended when the predicate turns true and unmounted and
    /// removed when it turns false. While it stays true nothing is rebuilt.
    pub fn bind_guarded_child<D, P, B>(
        &self,
        container: &H::Node,
        deps: D,
        predicate: P,
        build: B,
    ) -> Result<Disposer>
    where
        D: Deps + 'static,
        P: Fn(&D::Values) -> bool + 'static,
        B: Fn(&D::Values) -> H::Node + 'static,
    {
        self.ensure_container(container)?;

        let guard = Rc::new(Guard {
            host: self.host.clone(),
            lifecycle: self.lifecycle.clone(),
            container: container.clone(),
            shown: Cell::new(None),
            child: RefCell::new(None),
            predicate,
            build,
        });

        let initial = deps.read(&self.store)?;
        if deps.ids().is_empty() {
            guard.apply(&initial);
            return Ok(Disposer::noop());
        }

        let on_change = guard.clone();
        let disposer = create_effect(&self.store, deps, move |values| on_change.apply(&values))?;
        guard.apply(&initial);

        self.dispose_on_unmount(container, disposer.clone());
        debug!(container = ?container, "bound guarded child");
        Ok(disposer)
    }
}

struct Guard<H: HostTree, P, B> {
    host: H,
    lifecycle: Lifecycle<H::Node>,
    container: H::Node,
    shown: Cell<Option<bool>>,
    child: RefCell<Option<H::Node>>,
    predicate: P,
    build: B,
}

impl<H: HostTree, P, B> Guard<H, P, B> {
    fn apply<V>(&self, values: &V)
    where
        P: Fn(&V) -> bool,
        B: Fn(&V) -> H::Node,
    {
        let show = (self.predicate)(values);
        let was = self.shown.replace(Some(show));
        if was == Some(show) {
            return;
        }

        if show {
            let node = (self.build)(values);
            self.host.append_child(&self.container, &node);
            *self.child.borrow_mut() = Some(node);
        } else {
            let taken = self.child.borrow_mut().take();
            if let Some(node) = taken {
                self.lifecycle.unmount(&self.host, &node);
                self.host.remove_child(&self.container, &node);
            }
        }
    }
}
