#![forbid(unsafe_code)]

//! The document a Feel application renders into.
//!
//! A [`Document`] owns the `<html>`, `<head>` and `<body>` nodes. The
//! application's root container is a `<div id="root">` created by
//! [`Document::initialize`]; everything the router renders goes there.
//!
//! # Failure Modes
//!
//! | Failure | Cause | Behavior |
//! |---------|-------|----------|
//! | Render before `initialize` | no root container | `RootMissing` |
//! | Blank favicon path or type | empty string | `BlankArgument` |
//! | Blank stylesheet path | empty string | `BlankArgument` |

use feel_core::{FeelError, Node, Result};
use tracing::debug;

use crate::element::{ElementProps, create_element};
use crate::render::{Renderable, render_to_dom};

/// `id` of the root container.
pub const ROOT_ID: &str = "root";

/// Default favicon image type.
pub const DEFAULT_FAVICON_TYPE: &str = "ico";

/// Handle to a document tree. Clones share the same tree.
#[derive(Debug, Clone)]
pub struct Document {
    html: Node,
    head: Node,
    body: Node,
}

impl Document {
    /// An empty document with `<head>` and `<body>`.
    #[must_use]
    pub fn new() -> Self {
        let head = Node::element("head");
        let body = Node::element("body");
        let html = Node::element_with_children("html", [head.clone(), body.clone()]);
        Self { html, head, body }
    }

    /// The `<html>` node.
    #[must_use]
    pub fn html(&self) -> &Node {
        &self.html
    }

    /// The `<head>` node.
    #[must_use]
    pub fn head(&self) -> &Node {
        &self.head
    }

    /// The `<body>` node.
    #[must_use]
    pub fn body(&self) -> &Node {
        &self.body
    }

    /// Find an element anywhere in the document by `id`.
    #[must_use]
    pub fn get_element_by_id(&self, id: &str) -> Option<Node> {
        self.html.find_by_id(id)
    }

    /// The root container, if [`initialize`](Self::initialize) has run.
    #[must_use]
    pub fn root(&self) -> Option<Node> {
        self.get_element_by_id(ROOT_ID)
    }

    /// Append the root container to `<body>`.
    ///
    /// Calling this again returns the existing root instead of adding a
    /// second one.
    pub fn initialize(&self) -> Result<Node> {
        if let Some(root) = self.root() {
            return Ok(root);
        }
        let root = Node::element("div");
        root.set_attribute("id", ROOT_ID);
        self.body.append(root.clone())?;
        debug!("root container created");
        Ok(root)
    }

    /// Replace the root container's children. See [`render_to_dom`].
    pub fn render_to_dom(&self, elements: impl Into<Renderable>) -> Result<()> {
        render_to_dom(self, elements)
    }

    /// Append `<link rel="icon" type="image/{kind}" href="{path}">` to the
    /// head.
    pub fn set_favicon(&self, path: &str, kind: &str) -> Result<Node> {
        if path.trim().is_empty() {
            return Err(FeelError::BlankArgument("favicon path"));
        }
        if kind.trim().is_empty() {
            return Err(FeelError::BlankArgument("favicon type"));
        }
        let link = create_element(
            "link",
            ElementProps::new()
                .rel("icon")
                .kind(format!("image/{kind}"))
                .href(path),
            (),
        )?;
        self.head.append(link.clone())?;
        debug!(path, kind, "favicon set");
        Ok(link)
    }

    /// Append `<link rel="stylesheet" href="{path}">` to the head.
    pub fn add_stylesheet(&self, path: &str) -> Result<Node> {
        if path.trim().is_empty() {
            return Err(FeelError::BlankArgument("stylesheet path"));
        }
        let link = create_element(
            "link",
            ElementProps::new().rel("stylesheet").href(path),
            (),
        )?;
        self.head.append(link.clone())?;
        debug!(path, "stylesheet added");
        Ok(link)
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}
