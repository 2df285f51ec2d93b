//! End-to-end tests for keyed-children bindings against `MemoryTree`.

use praline_core::{Key, State, Store};
use praline_reconcile::{BindingConfig, HostTree, MemoryTree, NodeId, ReconcileStrategy, Renderer};
use proptest::prelude::*;
use std::rc::Rc;

#[derive(Debug, Clone, PartialEq)]
struct Row {
    id: u8,
    label: String,
}

fn row(id: u8, label: &str) -> Rc<Row> {
    Rc::new(Row {
        id,
        label: label.to_string(),
    })
}

fn strategies() -> [ReconcileStrategy; 2] {
    [ReconcileStrategy::Inline, ReconcileStrategy::Diff]
}

type Rows = State<Vec<Rc<Row>>>;

fn table(strategy: ReconcileStrategy, statics: usize) -> (Renderer<MemoryTree>, NodeId, Rows) {
    let renderer = Renderer::with_config(
        Store::new(),
        MemoryTree::new(),
        BindingConfig::with_strategy(strategy),
    );
    let tree = renderer.host().clone();
    let body = tree.create_element("tbody");
    for _ in 0..statics {
        let header = tree.create_element_with_text("tr", "header");
        tree.append_child(&body, &header);
    }
    let rows = renderer.store().create_state(Vec::new());
    renderer
        .bind_keyed_children(&body, rows, |r: &Row| r.id, move |r: &Row| {
            tree.create_element_with_text("tr", r.label.as_str())
        })
        .unwrap();
    (renderer, body, rows)
}

// ── Sequences of random lists ────────────────────────────────────────────

fn rows_strategy() -> impl Strategy<Value = Vec<(u8, u8)>> {
    let keys: Vec<u8> = (0..10).collect();
    (
        proptest::sample::subsequence(keys, 0..=10),
        proptest::collection::vec(0u8..3, 10),
    )
        .prop_flat_map(|(keys, versions)| {
            let rows: Vec<(u8, u8)> = keys.into_iter().map(|k| (k, versions[k as usize])).collect();
            Just(rows).prop_shuffle()
        })
}

fn to_rows(shape: &[(u8, u8)]) -> Vec<Rc<Row>> {
    shape.iter()
        .map(|(id, version)| row(*id, &format!("{id}.{version}")))
        .collect()
}

proptest! {
    #[test]
    fn binding_tracks_every_list(
        lists in proptest::collection::vec(rows_strategy(), 1..6),
        statics in 0usize..3,
        diff_strategy in proptest::bool::ANY,
    ) {
        let strategy = if diff_strategy {
            ReconcileStrategy::Diff
        } else {
            ReconcileStrategy::Inline
        };
        let (renderer, body, rows) = table(strategy, statics);

        for shape in &lists {
            let next = to_rows(shape);
            renderer.store().set_state(&rows, next.clone()).unwrap();

            let mut expected = vec!["header".to_string(); statics];
            expected.extend(next.iter().map(|r| r.label.clone()));
            prop_assert_eq!(renderer.host().child_texts(body), expected);
        }
    }
}

// ── Scenarios ────────────────────────────────────────────────────────────

#[test]
fn test_shared_items_reuse_nodes_across_lists() {
    for strategy in strategies() {
        let (renderer, body, rows) = table(strategy, 0);
        let (a, b, c) = (row(1, "a"), row(2, "b"), row(3, "c"));

        renderer
            .store()
            .set_state(&rows, vec![a.clone(), b.clone(), c.clone()])
            .unwrap();
        let nodes = renderer.host().children(&body);

        renderer
            .store()
            .set_state(&rows, vec![c.clone(), b.clone(), a.clone()])
            .unwrap();
        let reversed: Vec<NodeId> = nodes.iter().rev().copied().collect();
        assert_eq!(renderer.host().children(&body), reversed);
    }
}

#[test]
fn test_row_bindings_are_torn_down_with_their_row() {
    for strategy in strategies() {
        let renderer = Renderer::with_config(
            Store::new(),
            MemoryTree::new(),
            BindingConfig::with_strategy(strategy),
        );
        let tree = renderer.host().clone();
        let body = tree.create_element("tbody");
        let selected = renderer.store().create_state(None::<u8>);
        let rows = renderer.store().create_state(vec![row(1, "a"), row(2, "b")]);

        let inner = renderer.clone();
        renderer
            .bind_keyed_children(&body, rows, |r: &Row| r.id, move |r: &Row| {
                let tr = tree.create_element_with_text("tr", r.label.as_str());
                let id = r.id;
                let host = tree.clone();
                inner
                    .bind_effect(&tr, selected, move |current: Option<u8>| {
                        let class = if current == Some(id) { "selected" } else { "" };
                        host.set_attribute(tr, "class", class);
                    })
                    .unwrap();
                tr
            })
            .unwrap();
        assert_eq!(renderer.store().dependent_count(selected.id()), Ok(2));

        renderer.store().set_state(&selected, Some(2)).unwrap();
        let second = renderer.host().child_at(&body, 1).unwrap();
        assert_eq!(renderer.host().attribute(second, "class").as_deref(), Some("selected"));

        renderer.store().set_state(&rows, vec![row(1, "a")]).unwrap();
        assert_eq!(renderer.store().dependent_count(selected.id()), Ok(1));

        renderer.unmount(&body);
        assert_eq!(renderer.store().dependent_count(selected.id()), Ok(0));
        assert_eq!(renderer.store().dependent_count(rows.id()), Ok(0));
        assert_eq!(renderer.lifecycle().pending(), 0);
    }
}

#[test]
fn test_two_bindings_in_separate_containers() {
    let renderer = Renderer::new(Store::new(), MemoryTree::new());
    let tree = renderer.host().clone();
    let left = tree.create_element("ul");
    let right = tree.create_element("ul");
    let rows = renderer.store().create_state(vec![row(1, "a"), row(2, "b")]);

    for container in [left, right] {
        let tree = tree.clone();
        renderer
            .bind_keyed_children(
                &container,
                rows,
                |r: &Row| Key::from(format!("row-{}", r.id)),
                move |r: &Row| tree.create_element_with_text("li", r.label.as_str()),
            )
            .unwrap();
    }
    renderer.store().set_state(&rows, vec![row(2, "b")]).unwrap();
    assert_eq!(tree.child_texts(left), vec!["b"]);
    assert_eq!(tree.child_texts(right), vec!["b"]);
    assert_eq!(renderer.store().dependent_count(rows.id()), Ok(2));
}
