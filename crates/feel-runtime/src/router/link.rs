#![forbid(unsafe_code)]

//! Anchors that navigate through the router instead of the host.

use feel_core::{Event, FeelError, Node, Result};
use feel_dom::{ElementProps, Renderable, create_element};
use serde_json::{Map, Value as Json};

use super::engine::Router;
use super::history::extra_fields;

/// Properties of a router link.
#[derive(Debug, Clone, Default)]
pub struct LinkProps {
    /// Applied to the `<a>` element. Its `on_click`, if any, runs before
    /// navigation; its `href` is overridden by the link target.
    pub props: ElementProps,
    /// Stored in the history entry next to `FeelPath`.
    pub state: Map<String, Json>,
}

impl LinkProps {
    /// Empty link props.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Use `props` for the anchor element.
    #[must_use]
    pub fn props(mut self, props: ElementProps) -> Self {
        self.props = props;
        self
    }

    /// Add one history state field.
    #[must_use]
    pub fn state_field(mut self, key: impl Into<String>, value: impl Into<Json>) -> Self {
        self.state.insert(key.into(), value.into());
        self
    }

    /// Replace the history state with a JSON object.
    ///
    /// Fails with [`FeelError::InvalidArgumentType`] for anything but an
    /// object.
    pub fn state_value(mut self, state: &Json) -> Result<Self> {
        self.state = extra_fields(state)?;
        Ok(self)
    }
}

/// Create an `<a href>` that navigates with `router` when clicked.
///
/// The click handler suppresses the host's default navigation, fails with
/// [`FeelError::RouterNotInitialized`] while the router is not set up, runs
/// the caller's `on_click` and then calls [`Router::navigate`].
pub fn create_link(
    router: &Router,
    href: &str,
    link: LinkProps,
    children: impl Into<Renderable>,
) -> Result<Node> {
    let LinkProps { mut props, state } = link;
    let hook = props.on_click.take();
    props.href = Some(href.to_owned());

    let router = router.downgrade();
    let target = href.to_owned();
    let props = props.on_click(move |event: &mut Event| -> Result<()> {
        event.prevent_default();
        let router = router
            .upgrade()
            .filter(Router::is_initialized)
            .ok_or(FeelError::RouterNotInitialized)?;
        if let Some(hook) = &hook {
            hook(event)?;
        }
        router.navigate(&target, state.clone())
    });
    create_element("a", props, children)
}
