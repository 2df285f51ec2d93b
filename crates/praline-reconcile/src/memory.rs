//! In-memory host tree
//!
//! `MemoryTree` is a small arena-backed element/text tree that implements
//! [`HostTree`]. It backs the test suites and is usable wherever a real
//! rendering target is not available.
//!
//! Nodes are never freed: a detached node stays in the arena and can be
//! re-attached later, the same way a detached DOM node stays usable.

use crate::HostTree;
use indexmap::IndexMap;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// Handle to a node inside a [`MemoryTree`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    /// Get the raw arena index
    pub fn raw(&self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node:{}", self.0)
    }
}

/// What a node holds
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    Element {
        tag: String,
        attributes: IndexMap<String, String>,
    },
    Text(String),
}

#[derive(Debug)]
struct NodeData {
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

#[derive(Debug, Default)]
struct Arena {
    nodes: Vec<NodeData>,
}

impl Arena {
    fn push(&mut self, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(NodeData {
            kind,
            parent: None,
            children: Vec::new(),
        });
        id
    }

    fn get(&self, id: NodeId) -> Option<&NodeData> {
        self.nodes.get(id.0)
    }

    fn position(&self, parent: NodeId, child: NodeId) -> Option<usize> {
        self.get(parent)?.children.iter().position(|c| *c == child)
    }

    /// `node` is `ancestor` or lies below it
    fn is_inclusive_ancestor(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut cursor = Some(node);
        while let Some(current) = cursor {
            if current == ancestor {
                return true;
            }
            cursor = self.get(current).and_then(|data| data.parent);
        }
        false
    }

    fn detach(&mut self, child: NodeId) {
        let Some(parent) = self.get(child).and_then(|data| data.parent) else {
            return;
        };
        if let Some(index) = self.position(parent, child) {
            self.nodes[parent.0].children.remove(index);
        }
        self.nodes[child.0].parent = None;
    }

    fn attach(&mut self, parent: NodeId, child: NodeId, index: usize) {
        let children = &mut self.nodes[parent.0].children;
        let index = index.min(children.len());
        children.insert(index, child);
        self.nodes[child.0].parent = Some(parent);
    }

    fn equal(&self, a: NodeId, b: NodeId) -> bool {
        match (self.get(a), self.get(b)) {
            (Some(left), Some(right)) => {
                left.kind == right.kind
                    && left.children.len() == right.children.len()
                    && left
                        .children
                        .iter()
                        .zip(&right.children)
                        .all(|(l, r)| self.equal(*l, *r))
            }
            _ => false,
        }
    }

    fn render(&self, id: NodeId, out: &mut String) {
        let Some(data) = self.get(id) else {
            return;
        };
        match &data.kind {
            NodeKind::Text(text) => out.push_str(text),
            NodeKind::Element { tag, attributes } => {
                out.push('<');
                out.push_str(tag);
                for (name, value) in attributes {
                    out.push_str(&format!(" {}=\"{}\"", name, value));
                }
                out.push('>');
                for child in &data.children {
                    self.render(*child, out);
                }
                out.push_str(&format!("</{}>", tag));
            }
        }
    }
}

/// Shared, arena-backed element/text tree
///
/// Cloning yields another handle to the same tree.
#[derive(Debug, Clone, Default)]
pub struct MemoryTree {
    arena: Rc<RefCell<Arena>>,
}

impl MemoryTree {
    /// Create an empty tree
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a detached element node
    pub fn create_element(&self, tag: impl Into<String>) -> NodeId {
        self.arena.borrow_mut().push(NodeKind::Element {
            tag: tag.into(),
            attributes: IndexMap::new(),
        })
    }

    /// Create a detached text node
    pub fn create_text(&self, text: impl Into<String>) -> NodeId {
        self.arena.borrow_mut().push(NodeKind::Text(text.into()))
    }

    /// Create a detached element with a single text child
    pub fn create_element_with_text(&self, tag: impl Into<String>, text: impl Into<String>) -> NodeId {
        let element = self.create_element(tag);
        let text = self.create_text(text);
        self.append_child(&element, &text);
        element
    }

    /// Set an attribute on an element; returns false for text nodes
    pub fn set_attribute(&self, node: NodeId, name: impl Into<String>, value: impl Into<String>) -> bool {
        let mut arena = self.arena.borrow_mut();
        match arena.nodes.get_mut(node.0).map(|data| &mut data.kind) {
            Some(NodeKind::Element { attributes, .. }) => {
                attributes.insert(name.into(), value.into());
                true
            }
            _ => false,
        }
    }

    /// Read an attribute of an element
    pub fn attribute(&self, node: NodeId, name: &str) -> Option<String> {
        match &self.arena.borrow().get(node)?.kind {
            NodeKind::Element { attributes, .. } => attributes.get(name).cloned(),
            NodeKind::Text(_) => None,
        }
    }

    /// Replace the content of a text node; returns false for elements
    pub fn set_text(&self, node: NodeId, text: impl Into<String>) -> bool {
        let mut arena = self.arena.borrow_mut();
        match arena.nodes.get_mut(node.0).map(|data| &mut data.kind) {
            Some(NodeKind::Text(content)) => {
                *content = text.into();
                true
            }
            _ => false,
        }
    }

    /// A copy of what the node holds
    pub fn kind(&self, node: NodeId) -> Option<NodeKind> {
        self.arena.borrow().get(node).map(|data| data.kind.clone())
    }

    /// The parent of a node, if attached
    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.arena.borrow().get(node)?.parent
    }

    /// Concatenated text of the node and its descendants
    pub fn text_content(&self, node: NodeId) -> String {
        fn collect(arena: &Arena, id: NodeId, out: &mut String) {
            if let Some(data) = arena.get(id) {
                match &data.kind {
                    NodeKind::Text(text) => out.push_str(text),
                    NodeKind::Element { .. } => {
                        for child in &data.children {
                            collect(arena, *child, out);
                        }
                    }
                }
            }
        }
        let mut out = String::new();
        collect(&self.arena.borrow(), node, &mut out);
        out
    }

    /// Markup-like rendering of a subtree, for assertions and debugging
    pub fn render(&self, node: NodeId) -> String {
        let mut out = String::new();
        self.arena.borrow().render(node, &mut out);
        out
    }

    /// Text content of each child of `parent`
    pub fn child_texts(&self, parent: NodeId) -> Vec<String> {
        self.children(&parent)
            .into_iter()
            .map(|child| self.text_content(child))
            .collect()
    }
}

impl HostTree for MemoryTree {
    type Node = NodeId;

    fn child_count(&self, parent: &NodeId) -> usize {
        self.arena.borrow().get(*parent).map_or(0, |data| data.children.len())
    }

    fn child_at(&self, parent: &NodeId, index: usize) -> Option<NodeId> {
        self.arena.borrow().get(*parent)?.children.get(index).copied()
    }

    fn can_have_children(&self, node: &NodeId) -> bool {
        matches!(self.kind(*node), Some(NodeKind::Element { .. }))
    }

    fn insert_before(&self, parent: &NodeId, child: &NodeId, reference: Option<&NodeId>) -> bool {
        let mut arena = self.arena.borrow_mut();
        let (parent, child) = (*parent, *child);
        let parent_is_element = matches!(
            arena.get(parent).map(|data| &data.kind),
            Some(NodeKind::Element { .. })
        );
        if arena.get(child).is_none() || !parent_is_element {
            return false;
        }
        if arena.is_inclusive_ancestor(child, parent) {
            return false;
        }
        match reference {
            Some(reference) if *reference == child => {
                arena.get(child).and_then(|data| data.parent) == Some(parent)
            }
            Some(reference) => {
                if arena.position(parent, *reference).is_none() {
                    return false;
                }
                arena.detach(child);
                match arena.position(parent, *reference) {
                    Some(index) => {
                        arena.attach(parent, child, index);
                        true
                    }
                    None => false,
                }
            }
            None => {
                arena.detach(child);
                let end = arena.nodes[parent.0].children.len();
                arena.attach(parent, child, end);
                true
            }
        }
    }

    fn remove_child(&self, parent: &NodeId, child: &NodeId) -> bool {
        let mut arena = self.arena.borrow_mut();
        if arena.position(*parent, *child).is_none() {
            return false;
        }
        arena.detach(*child);
        true
    }

    fn replace_child(&self, parent: &NodeId, new_child: &NodeId, old_child: &NodeId) -> bool {
        let mut arena = self.arena.borrow_mut();
        let (parent, new_child, old_child) = (*parent, *new_child, *old_child);
        if arena.position(parent, old_child).is_none() || arena.get(new_child).is_none() {
            return false;
        }
        if new_child == old_child {
            return true;
        }
        if arena.is_inclusive_ancestor(new_child, parent) {
            return false;
        }
        arena.detach(new_child);
        let Some(index) = arena.position(parent, old_child) else {
            return false;
        };
        arena.detach(old_child);
        arena.attach(parent, new_child, index);
        true
    }

    fn is_equal_node(&self, a: &NodeId, b: &NodeId) -> bool {
        self.arena.borrow().equal(*a, *b)
    }
}
