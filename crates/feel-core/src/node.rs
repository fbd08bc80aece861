#![forbid(unsafe_code)]

//! Shared handles to document nodes.
//!
//! A [`Node`] is a reference-counted handle, so cloning it yields the *same*
//! node (like holding a DOM element in two variables). The tree mirrors the
//! browser DOM closely enough for the framework's needs: elements with
//! attributes, an inline style map, children, text nodes and a click handler.
//!
//! # Invariants
//!
//! 1. A node has at most one parent. Appending a node that already has a
//!    parent moves it.
//! 2. Parent links are weak; a detached subtree is dropped with its last
//!    handle.
//! 3. The tree stays acyclic: a node is never appended under itself or a
//!    descendant.
//! 4. No `RefCell` borrow is held while a click handler runs, so handlers may
//!    mutate the tree they belong to.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::{Rc, Weak};

use crate::error::{FeelError, Result};

/// Callback run when a node is clicked.
pub type ClickHandler = Rc<dyn Fn(&mut Event) -> Result<()>>;

/// What a node represents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    /// An element with the given lowercase tag name.
    Element(String),
    /// A text node.
    Text(String),
}

#[derive(Default)]
struct NodeData {
    kind: Option<NodeKind>,
    attributes: BTreeMap<String, String>,
    style: BTreeMap<String, String>,
    children: Vec<Node>,
    parent: Weak<RefCell<NodeData>>,
    on_click: Option<ClickHandler>,
}

/// A handle to a node in a document tree.
#[derive(Clone)]
pub struct Node {
    inner: Rc<RefCell<NodeData>>,
}

impl Node {
    /// Create a detached element.
    #[must_use]
    pub fn element(tag: impl Into<String>) -> Self {
        Self::with_kind(NodeKind::Element(tag.into().to_ascii_lowercase()))
    }

    /// Create a detached text node.
    #[must_use]
    pub fn text(content: impl Into<String>) -> Self {
        Self::with_kind(NodeKind::Text(content.into()))
    }

    fn with_kind(kind: NodeKind) -> Self {
        Self {
            inner: Rc::new(RefCell::new(NodeData {
                kind: Some(kind),
                ..NodeData::default()
            })),
        }
    }

    /// What this node is.
    #[must_use]
    pub fn kind(&self) -> NodeKind {
        self.inner
            .borrow()
            .kind
            .clone()
            .unwrap_or(NodeKind::Text(String::new()))
    }

    /// Tag name for elements, `None` for text nodes.
    #[must_use]
    pub fn tag(&self) -> Option<String> {
        match &self.inner.borrow().kind {
            Some(NodeKind::Element(tag)) => Some(tag.clone()),
            _ => None,
        }
    }

    /// Whether both handles point at the same node.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    /// Read an attribute.
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<String> {
        self.inner.borrow().attributes.get(name).cloned()
    }

    /// Set an attribute, replacing any previous value.
    pub fn set_attribute(&self, name: impl Into<String>, value: impl Into<String>) {
        self.inner
            .borrow_mut()
            .attributes
            .insert(name.into(), value.into());
    }

    /// All attributes in name order.
    #[must_use]
    pub fn attributes(&self) -> Vec<(String, String)> {
        self.inner
            .borrow()
            .attributes
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    /// Read an inline style property.
    #[must_use]
    pub fn style(&self, property: &str) -> Option<String> {
        self.inner.borrow().style.get(property).cloned()
    }

    /// Set an inline style property.
    pub fn set_style(&self, property: impl Into<String>, value: impl Into<String>) {
        self.inner
            .borrow_mut()
            .style
            .insert(property.into(), value.into());
    }

    /// Install (or replace) the click handler.
    pub fn set_on_click(&self, handler: ClickHandler) {
        self.inner.borrow_mut().on_click = Some(handler);
    }

    /// Whether a click handler is installed.
    #[must_use]
    pub fn has_click_handler(&self) -> bool {
        self.inner.borrow().on_click.is_some()
    }

    /// Simulate a user click.
    ///
    /// Runs the click handler, if any, and returns the event so callers can
    /// inspect whether default navigation was prevented. Handler errors are
    /// returned unchanged.
    pub fn click(&self) -> Result<Event> {
        let handler = self.inner.borrow().on_click.clone();
        let mut event = Event::click(self.clone());
        if let Some(handler) = handler {
            handler(&mut event)?;
        }
        Ok(event)
    }

    /// Snapshot of the current children.
    #[must_use]
    pub fn children(&self) -> Vec<Node> {
        self.inner.borrow().children.clone()
    }

    /// Number of children.
    #[must_use]
    pub fn child_count(&self) -> usize {
        self.inner.borrow().children.len()
    }

    /// First child, if any.
    #[must_use]
    pub fn first_child(&self) -> Option<Node> {
        self.inner.borrow().children.first().cloned()
    }

    /// Last child, if any.
    #[must_use]
    pub fn last_child(&self) -> Option<Node> {
        self.inner.borrow().children.last().cloned()
    }

    /// Parent, if attached.
    #[must_use]
    pub fn parent(&self) -> Option<Node> {
        self.inner
            .borrow()
            .parent
            .upgrade()
            .map(|inner| Node { inner })
    }

    /// A detached element that already holds `children`, in order.
    ///
    /// Cannot fail: a fresh element is nobody's descendant.
    #[must_use]
    pub fn element_with_children(
        tag: impl Into<String>,
        children: impl IntoIterator<Item = Node>,
    ) -> Self {
        let node = Self::element(tag);
        for child in children {
            node.attach(child);
        }
        node
    }

    /// Whether `other` is this node or one of its descendants.
    #[must_use]
    pub fn contains(&self, other: &Node) -> bool {
        let mut current = Some(other.clone());
        while let Some(node) = current {
            if node.ptr_eq(self) {
                return true;
            }
            current = node.parent();
        }
        false
    }

    /// Append a child, detaching it from its previous parent first.
    ///
    /// Fails with [`FeelError::HierarchyRequest`] when `child` is this node
    /// or one of its ancestors; the tree is left unchanged.
    pub fn append(&self, child: Node) -> Result<()> {
        if child.contains(self) {
            return Err(FeelError::HierarchyRequest);
        }
        self.attach(child);
        Ok(())
    }

    /// Append every node in order, stopping at the first rejected one.
    pub fn append_all(&self, children: impl IntoIterator<Item = Node>) -> Result<()> {
        for child in children {
            self.append(child)?;
        }
        Ok(())
    }

    fn attach(&self, child: Node) {
        child.detach();
        child.inner.borrow_mut().parent = Rc::downgrade(&self.inner);
        self.inner.borrow_mut().children.push(child);
    }

    /// Remove `child` if it is a direct child. Returns whether it was found.
    pub fn remove_child(&self, child: &Node) -> bool {
        let removed = {
            let mut data = self.inner.borrow_mut();
            match data.children.iter().position(|c| c.ptr_eq(child)) {
                Some(index) => Some(data.children.remove(index)),
                None => None,
            }
        };
        match removed {
            Some(node) => {
                node.inner.borrow_mut().parent = Weak::new();
                true
            }
            None => false,
        }
    }

    /// Remove every child.
    pub fn clear_children(&self) {
        let children = std::mem::take(&mut self.inner.borrow_mut().children);
        for child in children {
            child.inner.borrow_mut().parent = Weak::new();
        }
    }

    /// Detach from the current parent, if any.
    pub fn detach(&self) {
        if let Some(parent) = self.parent() {
            parent.remove_child(self);
        }
    }

    /// Depth-first search for the element whose `id` attribute is `id`,
    /// starting with this node.
    #[must_use]
    pub fn find_by_id(&self, id: &str) -> Option<Node> {
        if self.attribute("id").as_deref() == Some(id) {
            return Some(self.clone());
        }
        self.children()
            .into_iter()
            .find_map(|child| child.find_by_id(id))
    }

    /// Concatenated text of this node and its descendants.
    #[must_use]
    pub fn text_content(&self) -> String {
        let data = self.inner.borrow();
        match &data.kind {
            Some(NodeKind::Text(text)) => text.clone(),
            _ => data.children.iter().map(Node::text_content).collect(),
        }
    }

    /// Serialize the subtree as HTML-like markup. Used by tests and debug
    /// output; attribute values are not escaped.
    #[must_use]
    pub fn outer_html(&self) -> String {
        let mut out = String::new();
        self.write_html(&mut out);
        out
    }

    fn write_html(&self, out: &mut String) {
        let data = self.inner.borrow();
        let tag = match &data.kind {
            Some(NodeKind::Element(tag)) => tag,
            Some(NodeKind::Text(text)) => {
                out.push_str(text);
                return;
            }
            None => return,
        };
        out.push('<');
        out.push_str(tag);
        for (name, value) in &data.attributes {
            out.push_str(&format!(" {name}=\"{value}\""));
        }
        if !data.style.is_empty() {
            let style: Vec<String> = data
                .style
                .iter()
                .map(|(prop, value)| format!("{prop}: {value}"))
                .collect();
            out.push_str(&format!(" style=\"{}\"", style.join("; ")));
        }
        out.push('>');
        for child in &data.children {
            child.write_html(out);
        }
        out.push_str("</");
        out.push_str(tag);
        out.push('>');
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("kind", &self.kind())
            .field("children", &self.child_count())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

/// Event delivered to a click handler.
#[derive(Debug, Clone)]
pub struct Event {
    target: Node,
    default_prevented: bool,
}

impl Event {
    fn click(target: Node) -> Self {
        Self {
            target,
            default_prevented: false,
        }
    }

    /// The node that was clicked.
    #[must_use]
    pub fn target(&self) -> &Node {
        &self.target
    }

    /// Suppress the host's default action (e.g. following a link).
    pub fn prevent_default(&mut self) {
        self.default_prevented = true;
    }

    /// Whether `prevent_default` was called.
    #[must_use]
    pub fn default_prevented(&self) -> bool {
        self.default_prevented
    }
}
