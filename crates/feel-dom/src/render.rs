#![forbid(unsafe_code)]

//! Root rendering.
//!
//! [`render_to_dom`] replaces every child of the root container with the
//! given nodes. There is no reconciliation: the previous subtree is detached
//! wholesale and the new one appended in order.

use feel_core::{FeelError, Node, Result, Value};
use tracing::debug;

use crate::document::Document;

/// An ordered set of nodes to append somewhere.
///
/// A bare node, a vector, a text string or nothing at all normalize to the
/// same shape.
#[derive(Debug, Clone, Default)]
pub struct Renderable(Vec<Node>);

impl Renderable {
    /// An empty set.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// The nodes in order.
    #[must_use]
    pub fn nodes(&self) -> &[Node] {
        &self.0
    }

    /// Consume into the node vector.
    #[must_use]
    pub fn into_nodes(self) -> Vec<Node> {
        self.0
    }

    /// Number of nodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether there are no nodes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Node> for Renderable {
    fn from(node: Node) -> Self {
        Self(vec![node])
    }
}

impl From<Vec<Node>> for Renderable {
    fn from(nodes: Vec<Node>) -> Self {
        Self(nodes)
    }
}

impl From<&[Node]> for Renderable {
    fn from(nodes: &[Node]) -> Self {
        Self(nodes.to_vec())
    }
}

impl<const N: usize> From<[Node; N]> for Renderable {
    fn from(nodes: [Node; N]) -> Self {
        Self(nodes.into())
    }
}

impl From<Option<Node>> for Renderable {
    fn from(node: Option<Node>) -> Self {
        Self(node.into_iter().collect())
    }
}

impl From<&str> for Renderable {
    fn from(text: &str) -> Self {
        Self(vec![Node::text(text)])
    }
}

impl From<String> for Renderable {
    fn from(text: String) -> Self {
        Self(vec![Node::text(text)])
    }
}

impl From<()> for Renderable {
    fn from((): ()) -> Self {
        Self::empty()
    }
}

impl From<Renderable> for Value {
    fn from(renderable: Renderable) -> Self {
        Value::nodes(renderable.0)
    }
}

/// Replace the children of the document's root container.
///
/// Fails with [`FeelError::RootMissing`] if the root was never created and
/// with [`FeelError::HierarchyRequest`] if an element contains the root; in
/// both cases the root is left untouched.
pub fn render_to_dom(document: &Document, elements: impl Into<Renderable>) -> Result<()> {
    let root = document.root().ok_or(FeelError::RootMissing)?;
    let elements = elements.into();
    if elements.0.iter().any(|node| node.contains(&root)) {
        return Err(FeelError::HierarchyRequest);
    }
    root.clear_children();
    debug!(children = elements.len(), "render root");
    root.append_all(elements.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_test::traced_test;

    #[test]
    fn render_without_root_fails() {
        let document = Document::new();
        let err = render_to_dom(&document, Node::element("div")).unwrap_err();
        assert_eq!(err, FeelError::RootMissing);
    }

    #[test]
    fn single_node_is_normalized() {
        let document = Document::new();
        let root = document.initialize().unwrap();
        render_to_dom(&document, Node::element("p")).unwrap();
        assert_eq!(root.child_count(), 1);
        assert_eq!(root.first_child().unwrap().tag().as_deref(), Some("p"));
    }

    #[test]
    fn render_replaces_previous_children() {
        let document = Document::new();
        let root = document.initialize().unwrap();
        render_to_dom(&document, [Node::element("h1"), Node::element("p")]).unwrap();
        assert_eq!(root.child_count(), 2);

        let span = Node::element("span");
        render_to_dom(&document, span.clone()).unwrap();
        assert_eq!(root.child_count(), 1);
        assert!(root.first_child().unwrap().ptr_eq(&span));
    }

    #[test]
    fn rendering_nothing_clears_the_root() {
        let document = Document::new();
        let root = document.initialize().unwrap();
        render_to_dom(&document, "text").unwrap();
        render_to_dom(&document, ()).unwrap();
        assert_eq!(root.child_count(), 0);
    }

    #[test]
    fn same_nodes_can_be_rendered_twice() {
        let document = Document::new();
        let root = document.initialize().unwrap();
        let nodes = vec![Node::element("a"), Node::element("b")];
        render_to_dom(&document, nodes.clone()).unwrap();
        render_to_dom(&document, nodes).unwrap();
        assert_eq!(root.child_count(), 2);
    }

    #[test]
    fn rendering_an_ancestor_of_the_root_is_rejected() {
        let document = Document::new();
        let root = document.initialize().unwrap();
        render_to_dom(&document, Node::element("p")).unwrap();

        let err = render_to_dom(&document, document.body().clone()).unwrap_err();
        assert_eq!(err, FeelError::HierarchyRequest);
        assert_eq!(root.child_count(), 1);
        assert!(document.body().parent().unwrap().ptr_eq(document.html()));
        assert_eq!(
            document.html().outer_html(),
            r#"<html><head></head><body><div id="root"><p></p></div></body></html>"#
        );
    }

    #[test]
    #[traced_test]
    fn render_logs_child_count() {
        let document = Document::new();
        document.initialize().unwrap();
        render_to_dom(&document, [Node::element("a"), Node::element("b")]).unwrap();
        assert!(logs_contain("children=2"));
    }
}
