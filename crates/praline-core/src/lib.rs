//! Praline Core - Dependency-tracked state for fine-grained UI reactivity
//!
//! This crate provides the reactive half of praline:
//! - [`Store`]: an explicit, clonable owner of state cells
//! - [`State`]: typed, opaque handles to cells
//! - [`Dependent`]: callbacks registered on cells and re-run on every write
//! - [`create_effect`] / [`create_guarded_effect`]: effects over a [`Deps`] set
//!
//! ## Execution model
//!
//! Everything is single-threaded and synchronous. `Store::set_state` runs every
//! dependent of the written cell before returning, and dependents may write
//! further cells, which propagates recursively. There is no batching and no
//! scheduler.
//!
//! Host-tree reconciliation lives in `praline-reconcile`, which builds its
//! bindings on top of this crate.

mod effect;
mod error;
mod identity;
mod store;

pub use effect::{create_effect, create_guarded_effect, Deps, Disposer};
pub use error::{Error, Result};
pub use identity::{DependentId, Key, State, StateId};
pub use store::{Dependent, Store, WeakStore};
