//! The renderer ties a [`Store`] to a [`HostTree`]
//!
//! Bindings created through a [`Renderer`] subscribe to state and register
//! their own disposal as an unmount teardown on the node they are attached
//! to, so unmounting any ancestor tears them down.

use crate::{BindingConfig, Error, HostTree, Lifecycle, Result};
use praline_core::{create_effect, Deps, Disposer, Store};
use std::fmt;
use tracing::warn;

/// Shared context for bindings: state, host tree and unmount registry
pub struct Renderer<H: HostTree> {
    pub(crate) store: Store,
    pub(crate) host: H,
    pub(crate) lifecycle: Lifecycle<H::Node>,
    pub(crate) config: BindingConfig,
}

impl<H: HostTree + Clone> Clone for Renderer<H> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            host: self.host.clone(),
            lifecycle: self.lifecycle.clone(),
            config: self.config.clone(),
        }
    }
}

impl<H: HostTree + Clone + 'static> Renderer<H> {
    /// Create a renderer with the default binding configuration
    pub fn new(store: Store, host: H) -> Self {
        Self::with_config(store, host, BindingConfig::default())
    }

    /// Create a renderer with a specific binding configuration
    pub fn with_config(store: Store, host: H, config: BindingConfig) -> Self {
        Self {
            store,
            host,
            lifecycle: Lifecycle::new(),
            config,
        }
    }

    /// The store bindings subscribe to
    pub fn store(&self) -> &Store {
        &self.store
    }

    /// The host tree bindings render into
    pub fn host(&self) -> &H {
        &self.host
    }

    /// The unmount registry shared by all bindings
    pub fn lifecycle(&self) -> &Lifecycle<H::Node> {
        &self.lifecycle
    }

    /// Configuration applied to keyed-children bindings
    pub fn config(&self) -> &BindingConfig {
        &self.config
    }

    /// Run `teardown` when `node` is unmounted
    pub fn on_unmount(&self, node: &H::Node, teardown: impl FnOnce() + 'static) {
        self.lifecycle.on_unmount(node, teardown);
    }

    /// Raise unmount on `node` and its subtree; returns how many teardowns ran
    pub fn unmount(&self, node: &H::Node) -> usize {
        self.lifecycle.unmount(&self.host, node)
    }

    /// Unmount `node`, then detach it from `parent`
    pub fn detach(&self, parent: &H::Node, node: &H::Node) -> bool {
        self.unmount(node);
        self.host.remove_child(parent, node)
    }

    /// Run `callback` on every change of `deps` until `node` is unmounted
    ///
    /// The callback also runs once immediately, so the node starts out in sync.
    pub fn bind_effect<D, F>(&self, node: &H::Node, deps: D, callback: F) -> Result<Disposer>
    where
        D: Deps + 'static,
        F: Fn(D::Values) + 'static,
    {
        if deps.ids().is_empty() {
            return Ok(create_effect(&self.store, deps, callback)?);
        }
        let initial = deps.read(&self.store)?;
        let callback = std::rc::Rc::new(callback);
        let on_change = callback.clone();
        let disposer = create_effect(&self.store, deps, move |values| on_change(values))?;
        callback(initial);
        self.dispose_on_unmount(node, disposer.clone());
        Ok(disposer)
    }

    pub(crate) fn ensure_container(&self, container: &H::Node) -> Result<()> {
        if self.host.can_have_children(container) {
            Ok(())
        } else {
            Err(Error::InvalidArgument(format!(
                "{:?} cannot have children",
                container
            )))
        }
    }

    pub(crate) fn dispose_on_unmount(&self, node: &H::Node, disposer: Disposer) {
        self.lifecycle.on_unmount(node, move || {
            if let Err(err) = disposer.dispose() {
                warn!(%err, "failed to dispose binding");
            }
        });
    }
}

impl<H: HostTree> fmt::Debug for Renderer<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Renderer")
            .field("store", &self.store)
            .field("lifecycle", &self.lifecycle)
            .field("config", &self.config)
            .finish()
    }
}
