//! Keyed-children binding
//!
//! Keeps the children of a container in step with a list-valued state cell.
//! Each item is identified by a caller-supplied key; a node built for a key
//! is reused for as long as the key survives, and only replaced when a freshly
//! built node differs structurally from it.
//!
//! Items are held as `Rc<T>`. With memoization on, the node built for an
//! item is cached by the item's `Rc` identity, so handing the same `Rc` back
//! in the next list skips the builder entirely. Cache entries hold a `Weak`
//! and are dropped as soon as their item is dropped or their key leaves the
//! list.

use crate::{
    apply_edits, diff, BindingConfig, EditAction, HostTree, Lifecycle, ReconcileStrategy, Renderer,
    Result,
};
use indexmap::IndexMap;
use praline_core::{create_effect, Disposer, State, WeakStore};
use std::cell::{Cell, RefCell};
use std::collections::{HashMap, HashSet};
use std::fmt::Debug;
use std::hash::Hash;
use std::rc::{Rc, Weak};
use tracing::{debug, warn};

struct CacheEntry<T, K, N> {
    item: Weak<T>,
    key: K,
    node: N,
}

/// Built `(key, node)` pairs by item identity
struct NodeCache<T, K, N> {
    entries: HashMap<*const T, CacheEntry<T, K, N>>,
}

impl<T, K: Clone, N: Clone> NodeCache<T, K, N> {
    fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    fn get(&self, item: &Rc<T>) -> Option<(K, N)> {
        let entry = self.entries.get(&Rc::as_ptr(item))?;
        (entry.item.strong_count() > 0).then(|| (entry.key.clone(), entry.node.clone()))
    }

    fn insert(&mut self, item: &Rc<T>, key: K, node: N) {
        self.entries.insert(
            Rc::as_ptr(item),
            CacheEntry {
                item: Rc::downgrade(item),
                key,
                node,
            },
        );
    }

    fn retain(&mut self, keep: impl Fn(&K, &N) -> bool) {
        self.entries
            .retain(|_, entry| entry.item.strong_count() > 0 && keep(&entry.key, &entry.node));
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}

struct KeyedChildren<T, K, N> {
    /// Static children that precede the keyed region
    start_offset: usize,
    nodes: IndexMap<K, N>,
    rendered: Vec<Rc<T>>,
    cache: NodeCache<T, K, N>,
}

struct KeyedBinding<H: HostTree, T, K> {
    host: H,
    lifecycle: Lifecycle<H::Node>,
    container: H::Node,
    config: BindingConfig,
    key_of: Box<dyn Fn(&T) -> K>,
    build: Box<dyn Fn(&T) -> H::Node>,
    store: WeakStore,
    items: State<Vec<Rc<T>>>,
    state: RefCell<KeyedChildren<T, K, H::Node>>,
    /// Set when a write arrived while a pass was running
    pending: Cell<bool>,
}

impl<H, T, K> KeyedBinding<H, T, K>
where
    H: HostTree,
    T: PartialEq + 'static,
    K: Hash + Eq + Clone + Debug,
{
    fn reconcile(&self, items: Vec<Rc<T>>) {
        // A builder that writes the watched list re-enters here; the write is
        // picked up by the outer call once its pass is done
        let Ok(mut state) = self.state.try_borrow_mut() else {
            self.pending.set(true);
            debug!(container = ?self.container, "deferred re-entrant keyed reconciliation");
            return;
        };
        self.pass(&mut state, items);
        drop(state);

        while self.pending.replace(false) {
            let Some(store) = self.store.upgrade() else {
                return;
            };
            let latest = match store.get_state(&self.items) {
                Ok(latest) => latest,
                Err(err) => {
                    warn!(%err, container = ?self.container, "keyed list is gone");
                    return;
                }
            };
            let Ok(mut state) = self.state.try_borrow_mut() else {
                return;
            };
            self.pass(&mut state, latest);
        }
    }

    fn pass(&self, state: &mut KeyedChildren<T, K, H::Node>, items: Vec<Rc<T>>) {
        match self.config.strategy {
            ReconcileStrategy::Inline => self.reconcile_inline(state, &items),
            ReconcileStrategy::Diff => self.reconcile_diff(state, &items),
        }

        let KeyedChildren { nodes, cache, .. } = &mut *state;
        cache.retain(|key, node| nodes.get(key) == Some(node));
        debug!(
            container = ?self.container,
            strategy = ?self.config.strategy,
            items = items.len(),
            cached = cache.len(),
            "reconciled keyed children"
        );
        state.rendered = items;
    }

    fn build_item(&self, cache: &mut NodeCache<T, K, H::Node>, item: &Rc<T>) -> (K, H::Node) {
        if self.config.memoize {
            if let Some(hit) = cache.get(item) {
                return hit;
            }
        }
        let key = (self.key_of)(item);
        let node = (self.build)(item);
        if self.config.memoize {
            cache.insert(item, key.clone(), node.clone());
        }
        (key, node)
    }

    fn reconcile_inline(&self, state: &mut KeyedChildren<T, K, H::Node>, items: &[Rc<T>]) {
        let KeyedChildren {
            start_offset,
            nodes,
            cache,
            ..
        } = state;

        let built: Vec<(K, H::Node)> = items
            .iter()
            .map(|item| self.build_item(cache, item))
            .collect();

        let gone: Vec<K> = {
            let live: HashSet<&K> = built.iter().map(|(key, _)| key).collect();
            nodes.keys().filter(|key| !live.contains(key)).cloned().collect()
        };
        for key in gone {
            if let Some(node) = nodes.shift_remove(&key) {
                self.lifecycle.unmount(&self.host, &node);
                self.host.remove_child(&self.container, &node);
            }
        }

        let mut position = *start_offset;
        for (item, (key, fresh)) in items.iter().zip(built) {
            let current = match nodes.get(&key).cloned() {
                None => {
                    self.host.insert_at(&self.container, &fresh, position);
                    nodes.insert(key, fresh.clone());
                    fresh
                }
                Some(existing)
                    if existing != fresh && !self.host.is_equal_node(&fresh, &existing) =>
                {
                    self.lifecycle.unmount(&self.host, &existing);
                    self.host.replace_child(&self.container, &fresh, &existing);
                    nodes.insert(key, fresh.clone());
                    fresh
                }
                Some(existing) => {
                    if existing != fresh {
                        // The rebuilt node is dropped in favour of the mounted one
                        self.lifecycle.unmount(&self.host, &fresh);
                        if self.config.memoize {
                            cache.insert(item, key, existing.clone());
                        }
                    }
                    existing
                }
            };
            if self.host.child_at(&self.container, position).as_ref() != Some(&current) {
                self.host.insert_at(&self.container, &current, position);
            }
            position += 1;
        }
    }

    fn reconcile_diff(&self, state: &mut KeyedChildren<T, K, H::Node>, items: &[Rc<T>]) {
        let KeyedChildren {
            start_offset,
            nodes,
            rendered,
            cache,
        } = state;

        let edits = diff(rendered.as_slice(), items, |item| (self.key_of)(item));
        apply_edits(
            &self.host,
            &self.container,
            &edits,
            |item| self.build_item(cache, item).1,
            |node| {
                self.lifecycle.unmount(&self.host, node);
            },
            *start_offset,
        );

        // A moved survivor keeps its node; rebuild it if its value changed too
        let stale: Vec<EditAction<Rc<T>>> = edits
            .iter()
            .filter_map(|edit| match edit {
                EditAction::Move { from, to, item } if rendered[*from] != *item => {
                    Some(EditAction::Update {
                        index: *to,
                        item: item.clone(),
                    })
                }
                _ => None,
            })
            .collect();
        if !stale.is_empty() {
            apply_edits(
                &self.host,
                &self.container,
                &stale,
                |item| self.build_item(cache, item).1,
                |node| {
                    self.lifecycle.unmount(&self.host, node);
                },
                *start_offset,
            );
        }

        nodes.clear();
        for (i, item) in items.iter().enumerate() {
            if let Some(node) = self.host.child_at(&self.container, *start_offset + i) {
                nodes.insert((self.key_of)(item), node);
            }
        }
    }
}

impl<H: HostTree + Clone + 'static> Renderer<H> {
    /// Render one child per item of `items` into `container`, keyed by `key_of`
    ///
    /// Children already in `container` stay in front of the keyed region. The
    /// list is rendered immediately and re-reconciled on every write to
    /// `items` until `container` is unmounted or the disposer is called.
    ///
    /// Keys must be unique within one list; duplicates are not detected.
    pub fn bind_keyed_children<T, K, KF, BF>(
        &self,
        container: &H::Node,
        items: State<Vec<Rc<T>>>,
        key_of: KF,
        build: BF,
    ) -> Result<Disposer>
    where
        T: PartialEq + 'static,
        K: Hash + Eq + Clone + Debug + 'static,
        KF: Fn(&T) -> K + 'static,
        BF: Fn(&T) -> H::Node + 'static,
    {
        self.ensure_container(container)?;

        let binding = Rc::new(KeyedBinding {
            host: self.host.clone(),
            lifecycle: self.lifecycle.clone(),
            container: container.clone(),
            config: self.config.clone(),
            key_of: Box::new(key_of),
            build: Box::new(build),
            store: self.store.downgrade(),
            items,
            state: RefCell::new(KeyedChildren {
                start_offset: self.host.child_count(container),
                nodes: IndexMap::new(),
                rendered: Vec::new(),
                cache: NodeCache::new(),
            }),
            pending: Cell::new(false),
        });

        let on_change = binding.clone();
        let disposer = create_effect(&self.store, items, move |list| on_change.reconcile(list))?;
        binding.reconcile(self.store.get_state(&items)?);

        self.dispose_on_unmount(container, disposer.clone());
        Ok(disposer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{MemoryTree, NodeId};
    use praline_core::Store;
    use std::cell::Cell;

    #[derive(Debug, PartialEq)]
    struct Todo {
        id: u32,
        title: &'static str,
    }

    fn todo(id: u32, title: &'static str) -> Rc<Todo> {
        Rc::new(Todo { id, title })
    }

    struct Fixture {
        renderer: Renderer<MemoryTree>,
        list: NodeId,
        todos: State<Vec<Rc<Todo>>>,
        builds: Rc<Cell<usize>>,
    }

    fn fixture(config: BindingConfig, statics: &[&str], initial: Vec<Rc<Todo>>) -> Fixture {
        let renderer = Renderer::with_config(Store::new(), MemoryTree::new(), config);
        let tree = renderer.host().clone();
        let list = tree.create_element("ul");
        for text in statics {
            let li = tree.create_element_with_text("li", *text);
            tree.append_child(&list, &li);
        }
        let todos = renderer.store().create_state(initial);
        let builds = Rc::new(Cell::new(0));
        let counter = builds.clone();
        renderer
            .bind_keyed_children(
                &list,
                todos,
                |t: &Todo| t.id,
                move |t: &Todo| {
                    counter.set(counter.get() + 1);
                    tree.create_element_with_text("li", t.title)
                },
            )
            .unwrap();
        Fixture {
            renderer,
            list,
            todos,
            builds,
        }
    }

    fn both() -> [BindingConfig; 2] {
        [
            BindingConfig::with_strategy(ReconcileStrategy::Inline),
            BindingConfig::with_strategy(ReconcileStrategy::Diff),
        ]
    }

    impl Fixture {
        fn set(&self, todos: Vec<Rc<Todo>>) {
            self.renderer.store().set_state(&self.todos, todos).unwrap();
        }

        fn texts(&self) -> Vec<String> {
            self.renderer.host().child_texts(self.list)
        }
    }

    #[test]
    fn test_initial_render() {
        for config in both() {
            let f = fixture(config, &[], vec![todo(1, "a"), todo(2, "b")]);
            assert_eq!(f.texts(), vec!["a", "b"]);
        }
    }

    #[test]
    fn test_reorder_keeps_nodes() {
        for config in both() {
            let (a, b, c) = (todo(1, "a"), todo(2, "b"), todo(3, "c"));
            let f = fixture(config, &[], vec![a.clone(), b.clone(), c.clone()]);
            let host = f.renderer.host();
            let node_c = host.child_at(&f.list, 2).unwrap();

            f.set(vec![c, a, b]);
            assert_eq!(f.texts(), vec!["c", "a", "b"]);
            assert_eq!(host.child_at(&f.list, 0), Some(node_c));
            assert_eq!(f.builds.get(), 3);
        }
    }

    #[test]
    fn test_add_remove_and_change() {
        for config in both() {
            let (a, b, c) = (todo(1, "a"), todo(2, "b"), todo(3, "c"));
            let f = fixture(config, &[], vec![a.clone(), b, c.clone()]);
            let host = f.renderer.host();
            let node_a = host.child_at(&f.list, 0).unwrap();

            f.set(vec![c, todo(4, "d"), a, todo(5, "e")]);
            assert_eq!(f.texts(), vec!["c", "d", "a", "e"]);
            assert_eq!(host.child_at(&f.list, 2), Some(node_a));

            let mut changed = f.renderer.store().get_state(&f.todos).unwrap();
            changed[2] = todo(1, "a!");
            f.set(changed);
            assert_eq!(f.texts(), vec!["c", "d", "a!", "e"]);
        }
    }

    #[test]
    fn test_moved_and_changed_item_is_refreshed() {
        for config in both() {
            let f = fixture(config, &[], vec![todo(1, "a"), todo(2, "b"), todo(3, "c")]);
            f.set(vec![todo(3, "C"), todo(1, "a"), todo(2, "b")]);
            assert_eq!(f.texts(), vec!["C", "a", "b"]);
        }
    }

    #[test]
    fn test_static_children_stay_in_front() {
        for config in both() {
            let f = fixture(config, &["header"], vec![todo(1, "a")]);
            f.set(vec![todo(2, "b"), todo(1, "a")]);
            assert_eq!(f.texts(), vec!["header", "b", "a"]);
            f.set(vec![]);
            assert_eq!(f.texts(), vec!["header"]);
        }
    }

    #[test]
    fn test_structurally_equal_rebuild_is_not_replaced() {
        let f = fixture(BindingConfig::default(), &[], vec![todo(1, "a")]);
        let host = f.renderer.host();
        let before = host.child_at(&f.list, 0).unwrap();

        // A new Rc with equal content builds an equal node, which is discarded
        f.set(vec![todo(1, "a")]);
        assert_eq!(host.child_at(&f.list, 0), Some(before));
        assert_eq!(f.builds.get(), 2);
    }

    #[test]
    fn test_memoization_skips_builder() {
        let a = todo(1, "a");
        let f = fixture(BindingConfig::default(), &[], vec![a.clone()]);
        f.set(vec![a.clone(), todo(2, "b")]);
        f.set(vec![todo(2, "b2"), a.clone()]);
        // a built once; b and b2 each once
        assert_eq!(f.builds.get(), 3);

        let f = fixture(BindingConfig::default().without_memoization(), &[], vec![a.clone()]);
        f.set(vec![a.clone()]);
        assert_eq!(f.builds.get(), 2);
    }

    #[test]
    fn test_removed_items_leave_the_cache() {
        let a = todo(1, "a");
        let f = fixture(BindingConfig::default(), &[], vec![a.clone()]);
        let host = f.renderer.host();
        let first = host.child_at(&f.list, 0).unwrap();

        f.set(vec![]);
        f.set(vec![a]);
        // The item came back but its old node was unmounted, so it is rebuilt
        let second = host.child_at(&f.list, 0).unwrap();
        assert_ne!(first, second);
        assert_eq!(f.builds.get(), 2);
    }

    #[test]
    fn test_removed_child_is_unmounted() {
        for config in both() {
            let f = fixture(config, &[], vec![todo(1, "a"), todo(2, "b")]);
            let host = f.renderer.host();
            let node_b = host.child_at(&f.list, 1).unwrap();
            let unmounted = Rc::new(Cell::new(false));
            let flag = unmounted.clone();
            f.renderer.on_unmount(&node_b, move || flag.set(true));

            f.set(vec![todo(1, "a")]);
            assert!(unmounted.get());
            assert_eq!(host.parent(node_b), None);
        }
    }

    #[test]
    fn test_unmounting_container_disposes_binding() {
        let f = fixture(BindingConfig::default(), &[], vec![todo(1, "a")]);
        assert_eq!(f.renderer.store().dependent_count(f.todos.id()), Ok(1));

        f.renderer.unmount(&f.list);
        assert_eq!(f.renderer.store().dependent_count(f.todos.id()), Ok(0));

        f.set(vec![todo(2, "b")]);
        assert_eq!(f.texts(), vec!["a"]);
    }

    #[test]
    fn test_text_container_is_rejected() {
        let renderer = Renderer::new(Store::new(), MemoryTree::new());
        let text = renderer.host().create_text("x");
        let items = renderer.store().create_state(Vec::<Rc<Todo>>::new());
        let result = renderer.bind_keyed_children(&text, items, |t: &Todo| t.id, move |_: &Todo| text);
        assert!(matches!(result, Err(crate::Error::InvalidArgument(_))));
        assert_eq!(renderer.store().dependent_count(items.id()), Ok(0));
    }

    #[test]
    fn test_unknown_items_handle() {
        let renderer = Renderer::new(Store::new(), MemoryTree::new());
        let list = renderer.host().create_element("ul");
        let foreign = Store::new().create_state(Vec::<Rc<Todo>>::new());
        let result = renderer.bind_keyed_children(&list, foreign, |t: &Todo| t.id, move |_: &Todo| list);
        assert!(result.unwrap_err().is_unknown_handle());
    }

    #[test]
    fn test_builder_writing_its_own_list() {
        for config in both() {
            let renderer = Renderer::with_config(Store::new(), MemoryTree::new(), config);
            let tree = renderer.host().clone();
            let list = tree.create_element("ul");
            let todos = renderer.store().create_state(vec![todo(1, "a")]);

            let store = renderer.store().clone();
            let grown = Rc::new(Cell::new(false));
            renderer
                .bind_keyed_children(
                    &list,
                    todos,
                    |t: &Todo| t.id,
                    move |t: &Todo| {
                        if t.id == 1 && !grown.replace(true) {
                            store
                                .set_state(&todos, vec![todo(1, "a"), todo(2, "b")])
                                .unwrap();
                        }
                        tree.create_element_with_text("li", t.title)
                    },
                )
                .unwrap();

            assert_eq!(renderer.store().get_state(&todos).unwrap().len(), 2);
            assert_eq!(renderer.host().child_texts(list), vec!["a", "b"]);

            renderer
                .store()
                .set_state(&todos, vec![todo(2, "b"), todo(1, "a")])
                .unwrap();
            assert_eq!(renderer.host().child_texts(list), vec!["b", "a"]);
        }
    }
}
