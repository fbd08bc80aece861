#![forbid(unsafe_code)]

//! Feel: a small reactive UI framework with a history-backed router.
//!
//! [`Feel`] bundles one [`StateStore`], one [`Document`], one [`History`] and
//! the [`Router`] that ties them together. Everything is single-threaded and
//! synchronous; handles are cheap `Rc` clones.
//!
//! ```
//! use std::rc::Rc;
//! use feel::prelude::*;
//!
//! let history = Rc::new(MemoryHistory::new("https://example.com"));
//! let app = Feel::new(Document::new(), history.clone());
//! app.initialize().unwrap();
//!
//! let home = create_element("h1", ElementProps::new().text("Home"), ()).unwrap();
//! let about = create_element("h1", ElementProps::new().text("About"), ()).unwrap();
//! app.initialize_router("/", vec![Route::new("/", home), Route::new("/about", about)])
//!     .unwrap();
//!
//! let link = app.create_link("/about", LinkProps::new(), "About").unwrap();
//! link.click().unwrap();
//! assert_eq!(app.current_path().as_deref(), Some("/about"));
//! assert_eq!(history.length(), 2);
//! ```
//!
//! # Feature Flags
//!
//! - `config`: load [`FeelConfig`] from TOML.

use std::fmt;
use std::rc::Rc;

pub use feel_core::{
    ClickHandler, Event, FeelError, Kind, Node, NodeKind, Result, Typed, Value, ValueMap, guard,
};
pub use feel_dom::{
    DEFAULT_FAVICON_TYPE, Document, ElementProps, ElementSpec, ROOT_ID, Renderable, StyleValue,
    create_element, render_to_dom,
};
pub use feel_runtime::{
    Callback, DEFAULT_HOME_PATH, FEEL_PATH_KEY, FeelConfig, History, HistoryEntry, HistoryState,
    LinkProps, MemoryHistory, NavigationEvent, NavigationListener, ROUTING_CURRENT_PATH_NAME,
    ROUTING_STATE_NAME, Route, RouteSpec, Router, RouterConfig, Snapshot, StateStore, StoreConfig,
    SubscriptionHandle, SubscriptionId, SubscriptionScope, UnsubscribePolicy, create_link,
};

use serde_json::{Map, Value as Json};
use tracing::info;

/// An application: store, document, history and router.
#[derive(Clone)]
pub struct Feel {
    store: StateStore,
    document: Document,
    history: Rc<dyn History>,
    router: Router,
}

impl Feel {
    /// An application with a default store.
    #[must_use]
    pub fn new(document: Document, history: Rc<dyn History>) -> Self {
        Self::with_store(StateStore::new(), document, history)
    }

    /// An application over an existing store.
    #[must_use]
    pub fn with_store(store: StateStore, document: Document, history: Rc<dyn History>) -> Self {
        let router = Router::new(store.clone(), document.clone(), Rc::clone(&history));
        Self {
            store,
            document,
            history,
            router,
        }
    }

    /// An application set up from `config`.
    ///
    /// Creates the root container, builds the configured routes and
    /// initializes the router, so the home (or history-marked) route is
    /// rendered on return.
    pub fn with_config(
        document: Document,
        history: Rc<dyn History>,
        config: &FeelConfig,
    ) -> Result<Self> {
        let app = Self::with_store(StateStore::with_config(config.store), document, history);
        app.initialize()?;
        let routes = config.router.build_routes()?;
        info!(routes = routes.len(), "configured application");
        app.initialize_router(&config.router.home_path, routes)?;
        Ok(app)
    }

    /// The state store.
    #[must_use]
    pub fn store(&self) -> &StateStore {
        &self.store
    }

    /// The document.
    #[must_use]
    pub fn document(&self) -> &Document {
        &self.document
    }

    /// The session history.
    #[must_use]
    pub fn history(&self) -> &Rc<dyn History> {
        &self.history
    }

    /// The router.
    #[must_use]
    pub fn router(&self) -> &Router {
        &self.router
    }

    // -- state --------------------------------------------------------------

    /// See [`StateStore::add_state`].
    pub fn add_state(&self, name: &str, initial: impl Into<Value>) {
        self.store.add_state(name, initial);
    }

    /// See [`StateStore::get_state`].
    pub fn get_state(&self, name: &str) -> Result<Value> {
        self.store.get_state(name)
    }

    /// See [`StateStore::dispatch`].
    pub fn dispatch(&self, name: &str, value: impl Into<Value>) -> Result<()> {
        self.store.dispatch(name, value)
    }

    /// See [`StateStore::subscribe`].
    pub fn subscribe<I, S>(&self, callback: &Callback, watched: I) -> Result<SubscriptionHandle>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.store.subscribe(callback, watched)
    }

    /// See [`StateStore::unsubscribe`].
    pub fn unsubscribe(&self, callback: &Callback) -> bool {
        self.store.unsubscribe(callback)
    }

    // -- routing ------------------------------------------------------------

    /// See [`Router::initialize_router`].
    pub fn initialize_router(&self, home_path: &str, routes: Vec<Route>) -> Result<()> {
        self.router.initialize_router(home_path, routes)
    }

    /// See [`Router::initialize_router_value`].
    pub fn initialize_router_value(&self, home_path: &str, routes: &Json) -> Result<()> {
        self.router.initialize_router_value(home_path, routes)
    }

    /// See [`Router::create_route`].
    pub fn create_route(&self, path: &str, elements: impl Into<Renderable>) -> Result<()> {
        self.router.create_route(path, elements)
    }

    /// See [`create_link`].
    pub fn create_link(
        &self,
        href: &str,
        link: LinkProps,
        children: impl Into<Renderable>,
    ) -> Result<Node> {
        create_link(&self.router, href, link, children)
    }

    /// See [`Router::navigate`].
    pub fn navigate(&self, path: &str, extra: Map<String, Json>) -> Result<()> {
        self.router.navigate(path, extra)
    }

    /// See [`Router::current_path`].
    #[must_use]
    pub fn current_path(&self) -> Option<String> {
        self.router.current_path()
    }

    // -- document -----------------------------------------------------------

    /// See [`Document::initialize`].
    pub fn initialize(&self) -> Result<Node> {
        self.document.initialize()
    }

    /// See [`render_to_dom`].
    pub fn render_to_dom(&self, elements: impl Into<Renderable>) -> Result<()> {
        self.document.render_to_dom(elements)
    }

    /// See [`Document::set_favicon`].
    pub fn set_favicon(&self, path: &str, kind: &str) -> Result<Node> {
        self.document.set_favicon(path, kind)
    }

    /// See [`Document::add_stylesheet`].
    pub fn add_stylesheet(&self, path: &str) -> Result<Node> {
        self.document.add_stylesheet(path)
    }
}

impl fmt::Debug for Feel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Feel")
            .field("store", &self.store)
            .field("router", &self.router)
            .finish_non_exhaustive()
    }
}

/// Everything an application usually needs.
pub mod prelude {
    pub use crate::{
        Callback, Document, ElementProps, ElementSpec, Event, Feel, FeelConfig, FeelError, History,
        LinkProps, MemoryHistory, Node, Result, Route, Snapshot, StateStore, StyleValue,
        SubscriptionScope, Value, create_element,
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    fn app() -> (Feel, Rc<MemoryHistory>) {
        let history = Rc::new(MemoryHistory::new("https://feel.test"));
        let app = Feel::new(Document::new(), Rc::clone(&history) as Rc<dyn History>);
        (app, history)
    }

    #[test]
    fn router_shares_the_app_store() {
        let (app, _) = app();
        app.initialize().unwrap();
        app.initialize_router("/", Vec::new()).unwrap();
        assert!(app.store().has_state(ROUTING_STATE_NAME));
        assert_eq!(
            app.get_state(ROUTING_CURRENT_PATH_NAME).unwrap(),
            Value::from("/")
        );
    }

    #[test]
    fn render_needs_initialize() {
        let (app, _) = app();
        assert_eq!(
            app.render_to_dom(Node::element("p")).unwrap_err(),
            FeelError::RootMissing
        );
        app.initialize().unwrap();
        app.render_to_dom(Node::element("p")).unwrap();
        assert_eq!(app.document().root().unwrap().child_count(), 1);
    }

    #[test]
    fn head_helpers_delegate() {
        let (app, _) = app();
        app.set_favicon("/icon.ico", DEFAULT_FAVICON_TYPE).unwrap();
        app.add_stylesheet("/site.css").unwrap();
        assert_eq!(app.document().head().child_count(), 2);
    }

    #[test]
    fn config_builds_and_renders() {
        let (_, history) = app();
        let config = FeelConfig::from_json_str(
            r#"{"router": {"routes": [{"pathname": "/", "components": [{"tag": "main"}]}]}}"#,
        )
        .unwrap();
        let app =
            Feel::with_config(Document::new(), history as Rc<dyn History>, &config).unwrap();
        assert_eq!(
            app.document().root().unwrap().outer_html(),
            r#"<div id="root"><main></main></div>"#
        );
    }
}
