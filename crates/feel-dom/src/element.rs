#![forbid(unsafe_code)]

//! Declarative element construction.
//!
//! [`create_element`] builds a detached [`Node`] from a tag, an
//! [`ElementProps`] and children. Recognized attributes are explicit fields;
//! anything else goes through the [`ElementProps::attr`] escape hatch, which
//! copies the attribute verbatim (`data-*`, `aria-*`, ...).
//!
//! Inline styles are a typed map of CSS property to [`StyleValue`]. Numeric
//! values render with a `px` unit.
//!
//! [`ElementSpec`] is the serializable counterpart used by configuration
//! files: a tree of elements described as data.

use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use feel_core::guard::{self, Kind};
use feel_core::{ClickHandler, Event, FeelError, Node, Result};
use serde::{Deserialize, Serialize};

use crate::render::Renderable;

// ---------------------------------------------------------------------------
// Style values
// ---------------------------------------------------------------------------

/// A single inline style value.
#[derive(Debug, Clone, PartialEq)]
pub enum StyleValue {
    /// A length in pixels, rendered as `"{n}px"`.
    Px(f64),
    /// A value written verbatim (`"50%"`, `"red"`, `"1em"`).
    Raw(String),
}

impl StyleValue {
    /// Interpret a JSON style value.
    ///
    /// Numbers and numeric-looking strings become [`StyleValue::Px`]; other
    /// strings are kept verbatim. Any other kind is rejected.
    pub fn from_json(value: &serde_json::Value) -> Result<Self> {
        if let Some(n) = value.as_f64() {
            return Ok(Self::Px(n));
        }
        let raw = guard::expect_json_str("style value", value)?;
        Ok(Self::from(raw))
    }

    /// CSS text for this value.
    #[must_use]
    pub fn css(&self) -> String {
        match self {
            Self::Px(n) => format!("{n}px"),
            Self::Raw(raw) => raw.clone(),
        }
    }
}

impl fmt::Display for StyleValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.css())
    }
}

impl From<f64> for StyleValue {
    fn from(n: f64) -> Self {
        Self::Px(n)
    }
}

impl From<i32> for StyleValue {
    fn from(n: i32) -> Self {
        Self::Px(f64::from(n))
    }
}

impl From<u32> for StyleValue {
    fn from(n: u32) -> Self {
        Self::Px(f64::from(n))
    }
}

impl From<&str> for StyleValue {
    fn from(raw: &str) -> Self {
        match raw.trim().parse::<f64>() {
            Ok(n) if n.is_finite() => Self::Px(n),
            _ => Self::Raw(raw.to_owned()),
        }
    }
}

impl From<String> for StyleValue {
    fn from(raw: String) -> Self {
        Self::from(raw.as_str())
    }
}

// ---------------------------------------------------------------------------
// ElementProps
// ---------------------------------------------------------------------------

/// Properties applied to a newly created element.
#[derive(Clone, Default)]
pub struct ElementProps {
    /// `id` attribute.
    pub id: Option<String>,
    /// `class` attribute.
    pub class_name: Option<String>,
    /// `href` attribute.
    pub href: Option<String>,
    /// `rel` attribute.
    pub rel: Option<String>,
    /// `type` attribute.
    pub kind: Option<String>,
    /// `src` attribute.
    pub src: Option<String>,
    /// `alt` attribute.
    pub alt: Option<String>,
    /// `title` attribute.
    pub title: Option<String>,
    /// Text content, inserted before any children.
    pub text: Option<String>,
    /// Inline style map.
    pub style: BTreeMap<String, StyleValue>,
    /// Escape hatch for attributes without a dedicated field.
    pub attrs: BTreeMap<String, String>,
    /// Click handler.
    pub on_click: Option<ClickHandler>,
}

impl ElementProps {
    /// Empty props.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `id`.
    #[must_use]
    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Set `class`.
    #[must_use]
    pub fn class(mut self, class_name: impl Into<String>) -> Self {
        self.class_name = Some(class_name.into());
        self
    }

    /// Set `href`.
    #[must_use]
    pub fn href(mut self, href: impl Into<String>) -> Self {
        self.href = Some(href.into());
        self
    }

    /// Set `rel`.
    #[must_use]
    pub fn rel(mut self, rel: impl Into<String>) -> Self {
        self.rel = Some(rel.into());
        self
    }

    /// Set `type`.
    #[must_use]
    pub fn kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = Some(kind.into());
        self
    }

    /// Set `src`.
    #[must_use]
    pub fn src(mut self, src: impl Into<String>) -> Self {
        self.src = Some(src.into());
        self
    }

    /// Set `alt`.
    #[must_use]
    pub fn alt(mut self, alt: impl Into<String>) -> Self {
        self.alt = Some(alt.into());
        self
    }

    /// Set `title`.
    #[must_use]
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Set the text content.
    #[must_use]
    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    /// Add one inline style property.
    #[must_use]
    pub fn style(mut self, property: impl Into<String>, value: impl Into<StyleValue>) -> Self {
        self.style.insert(property.into(), value.into());
        self
    }

    /// Add an arbitrary attribute.
    #[must_use]
    pub fn attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attrs.insert(name.into(), value.into());
        self
    }

    /// Install a click handler.
    #[must_use]
    pub fn on_click(mut self, handler: impl Fn(&mut Event) -> Result<()> + 'static) -> Self {
        self.on_click = Some(Rc::new(handler));
        self
    }

    fn named_attributes(&self) -> [(&'static str, Option<&String>); 8] {
        [
            ("id", self.id.as_ref()),
            ("class", self.class_name.as_ref()),
            ("href", self.href.as_ref()),
            ("rel", self.rel.as_ref()),
            ("type", self.kind.as_ref()),
            ("src", self.src.as_ref()),
            ("alt", self.alt.as_ref()),
            ("title", self.title.as_ref()),
        ]
    }
}

impl fmt::Debug for ElementProps {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ElementProps")
            .field("id", &self.id)
            .field("class_name", &self.class_name)
            .field("href", &self.href)
            .field("style", &self.style)
            .field("attrs", &self.attrs)
            .field("on_click", &self.on_click.is_some())
            .finish_non_exhaustive()
    }
}

/// Create a detached element.
///
/// Fails with [`FeelError::BlankArgument`] when `tag` is empty.
pub fn create_element(
    tag: &str,
    props: ElementProps,
    children: impl Into<Renderable>,
) -> Result<Node> {
    let tag = tag.trim();
    if tag.is_empty() {
        return Err(FeelError::BlankArgument("element tag"));
    }
    let node = Node::element(tag);
    for (name, value) in props.named_attributes() {
        if let Some(value) = value {
            node.set_attribute(name, value.clone());
        }
    }
    for (name, value) in &props.attrs {
        node.set_attribute(name.clone(), value.clone());
    }
    for (property, value) in &props.style {
        node.set_style(property.clone(), value.css());
    }
    if let Some(handler) = props.on_click {
        node.set_on_click(handler);
    }
    if let Some(text) = props.text {
        node.append(Node::text(text))?;
    }
    node.append_all(children.into().into_nodes())?;
    Ok(node)
}

// ---------------------------------------------------------------------------
// ElementSpec
// ---------------------------------------------------------------------------

/// An element tree described as data.
///
/// Unknown keys are rejected at parse time; use `attrs` for attributes
/// without a dedicated field.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ElementSpec {
    /// Tag name.
    pub tag: String,
    /// `id` attribute.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// `class` attribute.
    #[serde(default, rename = "class", skip_serializing_if = "Option::is_none")]
    pub class_name: Option<String>,
    /// `href` attribute.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub href: Option<String>,
    /// `rel` attribute.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rel: Option<String>,
    /// `type` attribute.
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    /// `src` attribute.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub src: Option<String>,
    /// `alt` attribute.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alt: Option<String>,
    /// `title` attribute.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Text content.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Inline styles; numbers and numeric strings get a `px` unit.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub style: BTreeMap<String, serde_json::Value>,
    /// Extra attributes.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attrs: BTreeMap<String, String>,
    /// Child elements.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<ElementSpec>,
}

impl ElementSpec {
    /// An element with only a tag.
    #[must_use]
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            ..Self::default()
        }
    }

    /// Parse an element description from a JSON value.
    pub fn from_json(value: &serde_json::Value) -> Result<Self> {
        guard::expect("element", value, Kind::Map)?;
        serde_json::from_value(value.clone()).map_err(|err| FeelError::Config(err.to_string()))
    }

    /// Build the described tree.
    pub fn build(&self) -> Result<Node> {
        let mut props = ElementProps {
            id: self.id.clone(),
            class_name: self.class_name.clone(),
            href: self.href.clone(),
            rel: self.rel.clone(),
            kind: self.kind.clone(),
            src: self.src.clone(),
            alt: self.alt.clone(),
            title: self.title.clone(),
            text: self.text.clone(),
            attrs: self.attrs.clone(),
            ..ElementProps::default()
        };
        for (property, value) in &self.style {
            props.style.insert(property.clone(), StyleValue::from_json(value)?);
        }
        let children = self
            .children
            .iter()
            .map(ElementSpec::build)
            .collect::<Result<Vec<_>>>()?;
        create_element(&self.tag, props, children)
    }
}
