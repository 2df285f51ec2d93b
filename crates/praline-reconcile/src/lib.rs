//! Praline Reconcile - Keep a host tree in step with praline state
//!
//! This crate provides the rendering half of praline, built on `praline-core`:
//!
//! ## Architecture
//!
//! ```text
//! Store (praline-core)
//!  │
//!  └── Renderer<H: HostTree>
//!       ├── bind_effect / bind_child / bind_guarded_child
//!       └── bind_keyed_children
//!            ├── Inline: walk keys, insert/replace/reposition
//!            └── Diff:   diff() → EditAction[] → apply_edits()
//! ```
//!
//! ## Key Components
//!
//! - [`HostTree`]: Trait over the tree being rendered into; [`MemoryTree`] is an
//!   in-memory implementation
//! - [`diff`]: Keyed sequence diff producing a minimal-move [`EditAction`] list
//! - [`apply_edits`]: Applies an edit list to a container's children
//! - [`Lifecycle`]: Unmount teardowns, raised children first
//! - [`Renderer`]: Ties a store, a host tree and a lifecycle registry together
//!
//! ## Example
//!
//! ```
//! use praline_core::Store;
//! use praline_reconcile::{HostTree, MemoryTree, Renderer};
//! use std::rc::Rc;
//!
//! let renderer = Renderer::new(Store::new(), MemoryTree::new());
//! let tree = renderer.host().clone();
//! let list = tree.create_element("ul");
//!
//! let fruits = renderer
//!     .store()
//!     .create_state(vec![Rc::new("apple".to_string()), Rc::new("pear".to_string())]);
//! renderer
//!     .bind_keyed_children(&list, fruits, |f: &String| f.clone(), move |f: &String| {
//!         tree.create_element_with_text("li", f.as_str())
//!     })
//!     .unwrap();
//! assert_eq!(renderer.host().render(list), "<ul><li>apple</li><li>pear</li></ul>");
//!
//! renderer
//!     .store()
//!     .set_state(&fruits, vec![Rc::new("pear".to_string()), Rc::new("fig".to_string())])
//!     .unwrap();
//! assert_eq!(renderer.host().child_texts(list), vec!["pear", "fig"]);
//! assert_eq!(renderer.host().child_count(&list), 2);
//! ```

mod bind;
mod config;
pub mod diff;
mod error;
mod host;
mod keyed;
mod lifecycle;
mod memory;
pub mod patch;
mod renderer;

pub use config::{BindingConfig, ReconcileStrategy};
pub use diff::{diff, diff_by, longest_increasing_subsequence, EditAction, EditKind, EditSummary};
pub use error::{Error, Result};
pub use host::HostTree;
pub use lifecycle::Lifecycle;
pub use memory::{MemoryTree, NodeId, NodeKind};
pub use patch::{apply_edits, PatchStats};
pub use renderer::Renderer;
