#![forbid(unsafe_code)]

//! The router: a route table and the current path, both kept in the state
//! store, rendered into the document root on every path change.
//!
//! # Invariants
//!
//! 1. The route table lives in [`ROUTING_STATE_NAME`] as a map from path to
//!    node list; each change dispatches a *new* map, never a mutated one.
//! 2. Only a change of [`ROUTING_CURRENT_PATH_NAME`] renders. Editing the
//!    table does not re-render the visible route.
//! 3. Every history entry the router writes carries the base URL computed at
//!    initialization and a `FeelPath` marker.
//! 4. Navigating to the current path replaces the history entry and does not
//!    render.
//!
//! # Failure Modes
//!
//! | Failure | Cause | Behavior |
//! |---------|-------|----------|
//! | Second `initialize_router` | router already set up | `RouterAlreadyInitialized` |
//! | `initialize_router` without a root | `Document::initialize` not called | `RootMissing`, nothing changed |
//! | Route or first render fails during setup | bad route, failing subscriber | error returned, subscription and base URL rolled back |
//! | `navigate` before setup | no base URL, no slots | `RouterNotInitialized` |
//! | `create_route` before setup | table slot absent | `UnknownState` |
//! | Route list not an array | dynamic entry point | `InvalidRouteList` |
//! | Table slot overwritten with a non-map | foreign `add_state` | `InvalidArgumentType` on render |

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use feel_core::guard::{self, Kind, Typed};
use feel_core::{FeelError, Node, Result, Value, ValueMap};
use feel_dom::{Document, ElementSpec, Renderable};
use serde_json::{Map, Value as Json};
use tracing::{debug, debug_span, info, warn};

use super::history::{History, HistoryState, NavigationEvent};
use crate::state::{Callback, StateStore, WeakStateStore};

/// Slot holding the route table.
pub const ROUTING_STATE_NAME: &str = "__feel_routes__";

/// Slot holding the active path.
pub const ROUTING_CURRENT_PATH_NAME: &str = "__feel_current_path__";

/// Path used when none is given.
pub const DEFAULT_HOME_PATH: &str = "/";

// ---------------------------------------------------------------------------
// Route
// ---------------------------------------------------------------------------

/// A path and the nodes shown for it.
#[derive(Debug, Clone)]
pub struct Route {
    /// Path the route answers to, e.g. `"/about"`.
    pub pathname: String,
    /// Nodes rendered into the root for this path.
    pub components: Renderable,
}

impl Route {
    /// A route for `pathname` rendering `components`.
    #[must_use]
    pub fn new(pathname: impl Into<String>, components: impl Into<Renderable>) -> Self {
        Self {
            pathname: pathname.into(),
            components: components.into(),
        }
    }

    /// Parse one entry of a JSON route list.
    ///
    /// The entry must be an object with a string `pathname`. `components` is
    /// optional and may be one element description or an array of them.
    pub fn from_json(entry: &Json) -> Result<Self> {
        let object = guard::expect_json_object("route", entry)?;
        let pathname = match object.get("pathname") {
            Some(path) => guard::expect_json_str("route pathname", path)?,
            None => {
                return Err(FeelError::InvalidArgumentType {
                    argument: "route pathname",
                    expected: Kind::String,
                    found: Kind::Null,
                });
            }
        };
        let components = match object.get("components") {
            None | Some(Json::Null) => Vec::new(),
            Some(Json::Array(items)) => items
                .iter()
                .map(|item| ElementSpec::from_json(item)?.build())
                .collect::<Result<Vec<_>>>()?,
            Some(item) => vec![ElementSpec::from_json(item)?.build()?],
        };
        Ok(Self::new(pathname, components))
    }
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

struct RouterInner {
    store: StateStore,
    document: Document,
    history: Rc<dyn History>,
    base_url: RefCell<Option<String>>,
    home_path: RefCell<String>,
    initialized: Cell<bool>,
}

/// Shared handle to a router. Clones refer to the same router.
#[derive(Clone)]
pub struct Router {
    inner: Rc<RouterInner>,
}

impl Router {
    /// A router over `store`, rendering into `document`, recording into
    /// `history`. Nothing happens until [`initialize_router`](Self::initialize_router).
    #[must_use]
    pub fn new(store: StateStore, document: Document, history: Rc<dyn History>) -> Self {
        Self {
            inner: Rc::new(RouterInner {
                store,
                document,
                history,
                base_url: RefCell::new(None),
                home_path: RefCell::new(DEFAULT_HOME_PATH.to_owned()),
                initialized: Cell::new(false),
            }),
        }
    }

    /// The store holding the routing slots.
    #[must_use]
    pub fn store(&self) -> &StateStore {
        &self.inner.store
    }

    /// The document routes render into.
    #[must_use]
    pub fn document(&self) -> &Document {
        &self.inner.document
    }

    /// The session history.
    #[must_use]
    pub fn history(&self) -> &Rc<dyn History> {
        &self.inner.history
    }

    /// Whether [`initialize_router`](Self::initialize_router) has completed.
    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.inner.initialized.get()
    }

    /// `origin + home_path`, once initialized.
    #[must_use]
    pub fn base_url(&self) -> Option<String> {
        self.inner.base_url.borrow().clone()
    }

    /// The home path given at initialization.
    #[must_use]
    pub fn home_path(&self) -> String {
        self.inner.home_path.borrow().clone()
    }

    /// The active path, once the routing slots exist.
    #[must_use]
    pub fn current_path(&self) -> Option<String> {
        self.inner
            .store
            .get_state(ROUTING_CURRENT_PATH_NAME)
            .ok()
            .and_then(|path| path.as_str().map(str::to_owned))
    }

    /// Set up routing and render the initial route.
    ///
    /// The initial path comes from the history's current `FeelPath` marker
    /// when present, otherwise `home_path`. Back/forward traversal re-runs
    /// that choice.
    ///
    /// Fails with [`FeelError::RootMissing`] before touching the store when
    /// the document has no root container. If building the table or the
    /// first render fails, the render subscription is removed and the base
    /// URL cleared, so the call can be retried.
    pub fn initialize_router(&self, home_path: &str, routes: Vec<Route>) -> Result<()> {
        if self.is_initialized() {
            return Err(FeelError::RouterAlreadyInitialized);
        }
        if self.inner.document.root().is_none() {
            return Err(FeelError::RootMissing);
        }
        let _span = debug_span!("initialize_router", home_path).entered();
        let store = &self.inner.store;

        let base_url = format!("{}{home_path}", self.inner.history.origin());
        *self.inner.base_url.borrow_mut() = Some(base_url.clone());
        *self.inner.home_path.borrow_mut() = home_path.to_owned();

        store.add_state(ROUTING_STATE_NAME, ValueMap::new());
        store.add_state(ROUTING_CURRENT_PATH_NAME, "");

        let render = store.subscribe(
            &render_callback(store.downgrade(), self.inner.document.clone()),
            [ROUTING_CURRENT_PATH_NAME],
        )?;

        let route_count = routes.len();
        let built = routes
            .into_iter()
            .try_for_each(|route| self.create_route(&route.pathname, route.components))
            .and_then(|()| self.redirect());
        if let Err(err) = built {
            store.remove_subscription(render.id());
            *self.inner.base_url.borrow_mut() = None;
            warn!(error = %err, "router setup failed, rolled back");
            return Err(err);
        }

        let weak = Rc::downgrade(&self.inner);
        self.inner
            .history
            .add_navigation_listener(Rc::new(move |event: &NavigationEvent| -> Result<()> {
                match weak.upgrade() {
                    Some(inner) => {
                        debug!(state = ?event.state, "navigation event");
                        Router { inner }.redirect()
                    }
                    None => Ok(()),
                }
            }));

        self.inner.initialized.set(true);
        info!(home_path, base_url = %base_url, routes = route_count, "router initialized");
        Ok(())
    }

    /// [`initialize_router`](Self::initialize_router) with a JSON route list.
    ///
    /// Fails with [`FeelError::InvalidRouteList`] unless `routes` is an array.
    pub fn initialize_router_value(&self, home_path: &str, routes: &Json) -> Result<()> {
        let entries =
            guard::expect_json_array("routes", routes).map_err(|_| FeelError::InvalidRouteList {
                found: routes.kind(),
            })?;
        let routes = entries
            .iter()
            .map(Route::from_json)
            .collect::<Result<Vec<_>>>()?;
        self.initialize_router(home_path, routes)
    }

    /// Register or overwrite the route for `path`.
    ///
    /// Dispatches a fresh table; the visible route is not re-rendered.
    pub fn create_route(&self, path: &str, elements: impl Into<Renderable>) -> Result<()> {
        let store = &self.inner.store;
        let current = store.get_state(ROUTING_STATE_NAME)?;
        let mut table = guard::expect_map("route table", &current)?.clone();
        let nodes = elements.into().into_nodes();
        debug!(path, nodes = nodes.len(), "route registered");
        table.insert(path.to_owned(), Value::nodes(nodes));
        store.dispatch(ROUTING_STATE_NAME, table)
    }

    /// [`create_route`](Self::create_route) with a dynamic path.
    pub fn create_route_value(&self, path: &Value, elements: impl Into<Renderable>) -> Result<()> {
        self.create_route(guard::expect_str("route path", path)?, elements)
    }

    /// Paths in the route table, sorted.
    #[must_use]
    pub fn route_paths(&self) -> Vec<String> {
        self.inner
            .store
            .get_state(ROUTING_STATE_NAME)
            .ok()
            .and_then(|table| table.as_map().map(|map| map.keys().cloned().collect()))
            .unwrap_or_default()
    }

    /// Move to `path`, storing `extra` next to the `FeelPath` marker.
    ///
    /// Navigating to the current path rewrites the current history entry
    /// and renders nothing; any other path pushes an entry and renders.
    pub fn navigate(&self, path: &str, extra: Map<String, Json>) -> Result<()> {
        if !self.is_initialized() {
            return Err(FeelError::RouterNotInitialized);
        }
        let url = self.base_url().ok_or(FeelError::RouterNotInitialized)?;
        let payload = HistoryState::new(path, extra).to_json();
        if self.current_path().as_deref() == Some(path) {
            debug!(path, "navigate: same path, replacing entry");
            self.inner.history.replace_state(payload, &url);
            return Ok(());
        }
        debug!(path, "navigate");
        self.inner.history.push_state(payload, &url);
        self.inner.store.dispatch(ROUTING_CURRENT_PATH_NAME, path)
    }

    /// Make the history's marked path (or home) current.
    fn redirect(&self) -> Result<()> {
        let path = self
            .inner
            .history
            .state()
            .as_ref()
            .and_then(HistoryState::from_json)
            .map_or_else(|| self.home_path(), |state| state.feel_path);
        self.inner.store.dispatch(ROUTING_CURRENT_PATH_NAME, path)
    }

    /// A non-owning handle, for click handlers stored inside the document.
    #[must_use]
    pub fn downgrade(&self) -> WeakRouter {
        WeakRouter {
            inner: Rc::downgrade(&self.inner),
        }
    }
}

impl fmt::Debug for Router {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Router")
            .field("initialized", &self.is_initialized())
            .field("base_url", &self.base_url())
            .field("current_path", &self.current_path())
            .finish_non_exhaustive()
    }
}

/// Non-owning router handle.
#[derive(Clone, Default)]
pub struct WeakRouter {
    inner: Weak<RouterInner>,
}

impl WeakRouter {
    /// The router, if it is still alive.
    #[must_use]
    pub fn upgrade(&self) -> Option<Router> {
        self.inner.upgrade().map(|inner| Router { inner })
    }
}

impl fmt::Debug for WeakRouter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("WeakRouter")
    }
}

// The store owns this callback, so it only holds the store weakly.
fn render_callback(store: WeakStateStore, document: Document) -> Callback {
    Callback::new(move |snapshot| {
        let Some(store) = store.upgrade() else {
            return Ok(());
        };
        let path = snapshot.get_str(ROUTING_CURRENT_PATH_NAME).unwrap_or_default();
        let table = store.get_state(ROUTING_STATE_NAME)?;
        let table = guard::expect_map("route table", &table)?;
        let nodes: Vec<Node> = match table.get(path) {
            Some(entry) => entry.as_nodes().map(<[Node]>::to_vec).unwrap_or_default(),
            None => {
                warn!(path, "no route registered, rendering nothing");
                Vec::new()
            }
        };
        document.render_to_dom(nodes)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::router::history::MemoryHistory;
    use feel_dom::{ElementProps, create_element};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    const ORIGIN: &str = "https://feel.test";

    struct Fixture {
        document: Document,
        history: Rc<MemoryHistory>,
        router: Router,
    }

    fn fixture_with(history: MemoryHistory) -> Fixture {
        let document = Document::new();
        document.initialize().unwrap();
        let history = Rc::new(history);
        let router = Router::new(
            StateStore::new(),
            document.clone(),
            Rc::clone(&history) as Rc<dyn History>,
        );
        Fixture {
            document,
            history,
            router,
        }
    }

    fn fixture() -> Fixture {
        fixture_with(MemoryHistory::new(ORIGIN))
    }

    fn el(tag: &str) -> Node {
        create_element(tag, ElementProps::new(), ()).unwrap()
    }

    fn root_tags(document: &Document) -> Vec<String> {
        document
            .root()
            .unwrap()
            .children()
            .iter()
            .filter_map(Node::tag)
            .collect()
    }

    #[test]
    fn initialize_renders_home() {
        let f = fixture();
        f.router
            .initialize_router("/", vec![Route::new("/", el("div"))])
            .unwrap();
        assert!(f.router.is_initialized());
        assert_eq!(f.router.current_path().as_deref(), Some("/"));
        assert_eq!(root_tags(&f.document), ["div"]);
        assert_eq!(f.router.base_url().as_deref(), Some("https://feel.test/"));
    }

    #[test]
    fn initialize_twice_fails() {
        let f = fixture();
        f.router.initialize_router("/", Vec::new()).unwrap();
        assert_eq!(
            f.router.initialize_router("/", Vec::new()).unwrap_err(),
            FeelError::RouterAlreadyInitialized
        );
        assert_eq!(f.history.listener_count(), 1);
    }

    #[test]
    fn initialize_without_root_changes_nothing() {
        let document = Document::new();
        let history = Rc::new(MemoryHistory::new(ORIGIN));
        let store = StateStore::new();
        let router = Router::new(
            store.clone(),
            document.clone(),
            Rc::clone(&history) as Rc<dyn History>,
        );
        let routes = || vec![Route::new("/", el("div"))];

        assert_eq!(
            router.initialize_router("/", routes()).unwrap_err(),
            FeelError::RootMissing
        );
        assert!(!router.is_initialized());
        assert_eq!(router.base_url(), None);
        assert_eq!(store.subscriber_count(), 0);
        assert!(!store.has_state(ROUTING_STATE_NAME));
        assert_eq!(history.listener_count(), 0);

        document.initialize().unwrap();
        router.initialize_router("/", routes()).unwrap();
        assert_eq!(store.subscriber_count(), 1);
        assert_eq!(history.listener_count(), 1);
        assert_eq!(root_tags(&document), ["div"]);
    }

    #[test]
    fn failed_first_render_is_rolled_back() {
        let f = fixture();
        let store = f.router.store().clone();
        store.add_state(ROUTING_CURRENT_PATH_NAME, "");
        let blocker = Callback::new(|_| Err(FeelError::Config("blocked".into())));
        store
            .subscribe(&blocker, [ROUTING_CURRENT_PATH_NAME])
            .unwrap();

        assert_eq!(
            f.router
                .initialize_router("/", vec![Route::new("/", el("div"))])
                .unwrap_err(),
            FeelError::Config("blocked".into())
        );
        assert!(!f.router.is_initialized());
        assert_eq!(f.router.base_url(), None);
        assert_eq!(store.subscriber_count(), 1);
        assert_eq!(f.history.listener_count(), 0);

        assert!(store.unsubscribe(&blocker));
        f.router
            .initialize_router("/", vec![Route::new("/", el("div"))])
            .unwrap();
        assert_eq!(store.subscriber_count(), 1);
        assert_eq!(f.history.listener_count(), 1);
        assert_eq!(root_tags(&f.document), ["div"]);
    }

    #[test]
    fn initialize_prefers_history_marker() {
        let f = fixture_with(MemoryHistory::with_state(
            ORIGIN,
            Some(json!({"FeelPath": "/about"})),
        ));
        f.router
            .initialize_router(
                "/",
                vec![Route::new("/", el("div")), Route::new("/about", el("span"))],
            )
            .unwrap();
        assert_eq!(f.router.current_path().as_deref(), Some("/about"));
        assert_eq!(root_tags(&f.document), ["span"]);
    }

    #[test]
    fn malformed_marker_falls_back_to_home() {
        for state in [json!({"FeelPath": 3}), json!("x"), json!({"FeelPath": ""})] {
            let f = fixture_with(MemoryHistory::with_state(ORIGIN, Some(state)));
            f.router
                .initialize_router("/home", vec![Route::new("/home", el("main"))])
                .unwrap();
            assert_eq!(f.router.current_path().as_deref(), Some("/home"));
            assert_eq!(root_tags(&f.document), ["main"]);
        }
    }

    #[test]
    fn unknown_path_renders_nothing() {
        let f = fixture();
        f.router
            .initialize_router("/", vec![Route::new("/", el("div"))])
            .unwrap();
        f.router.navigate("/missing", Map::new()).unwrap();
        assert!(root_tags(&f.document).is_empty());
    }

    #[test]
    fn create_route_does_not_rerender() {
        let f = fixture();
        f.router
            .initialize_router("/", vec![Route::new("/", el("div"))])
            .unwrap();
        f.router.create_route("/", el("p")).unwrap();
        assert_eq!(root_tags(&f.document), ["div"]);
        f.router.navigate("/other", Map::new()).unwrap();
        f.router.navigate("/", Map::new()).unwrap();
        assert_eq!(root_tags(&f.document), ["p"]);
    }

    #[test]
    fn create_route_before_initialize_fails() {
        let f = fixture();
        assert_eq!(
            f.router.create_route("/", el("div")).unwrap_err(),
            FeelError::UnknownState(ROUTING_STATE_NAME.into())
        );
    }

    #[test]
    fn create_route_value_checks_path_kind() {
        let f = fixture();
        f.router.initialize_router("/", Vec::new()).unwrap();
        assert!(matches!(
            f.router.create_route_value(&Value::from(1), ()),
            Err(FeelError::InvalidArgumentType {
                expected: Kind::String,
                found: Kind::Number,
                ..
            })
        ));
        f.router
            .create_route_value(&Value::from("/x"), el("i"))
            .unwrap();
        assert_eq!(f.router.route_paths(), ["/x"]);
    }

    #[test]
    fn navigate_pushes_then_replaces() {
        let f = fixture();
        f.router
            .initialize_router(
                "/",
                vec![Route::new("/", el("div")), Route::new("/about", el("span"))],
            )
            .unwrap();

        let mut extra = Map::new();
        extra.insert("tab".into(), json!("team"));
        f.router.navigate("/about", extra).unwrap();
        assert_eq!(f.history.length(), 2);
        assert_eq!(
            f.history.state(),
            Some(json!({"FeelPath": "/about", "tab": "team"}))
        );
        assert_eq!(f.history.current_url(), "https://feel.test/");
        assert_eq!(root_tags(&f.document), ["span"]);

        f.router.navigate("/about", Map::new()).unwrap();
        assert_eq!(f.history.length(), 2);
        assert_eq!(f.history.state(), Some(json!({"FeelPath": "/about"})));
    }

    #[test]
    fn navigate_before_initialize_fails() {
        let f = fixture();
        assert_eq!(
            f.router.navigate("/", Map::new()).unwrap_err(),
            FeelError::RouterNotInitialized
        );
        assert_eq!(f.history.length(), 1);
    }

    #[test]
    fn back_and_forward_rerender() {
        let f = fixture();
        f.router
            .initialize_router(
                "/",
                vec![Route::new("/", el("div")), Route::new("/about", el("span"))],
            )
            .unwrap();
        f.router.navigate("/about", Map::new()).unwrap();

        assert!(f.history.back().unwrap());
        assert_eq!(f.router.current_path().as_deref(), Some("/"));
        assert_eq!(root_tags(&f.document), ["div"]);

        assert!(f.history.forward().unwrap());
        assert_eq!(root_tags(&f.document), ["span"]);
    }

    #[test]
    fn value_route_list_builds_specs() {
        let f = fixture();
        f.router
            .initialize_router_value(
                "/",
                &json!([
                    {"pathname": "/", "components": {"tag": "h1", "text": "Home"}},
                    {"pathname": "/list", "components": [{"tag": "ul"}, {"tag": "p"}]},
                    {"pathname": "/empty"}
                ]),
            )
            .unwrap();
        assert_eq!(f.router.route_paths(), ["/", "/empty", "/list"]);
        assert_eq!(
            f.document.root().unwrap().outer_html(),
            r#"<div id="root"><h1>Home</h1></div>"#
        );
        f.router.navigate("/list", Map::new()).unwrap();
        assert_eq!(root_tags(&f.document), ["ul", "p"]);
    }

    #[test]
    fn value_route_list_must_be_array() {
        let f = fixture();
        assert_eq!(
            f.router
                .initialize_router_value("/", &json!({"pathname": "/"}))
                .unwrap_err(),
            FeelError::InvalidRouteList { found: Kind::Map }
        );
        assert!(!f.router.is_initialized());
    }

    #[test]
    fn value_route_needs_string_pathname() {
        assert!(matches!(
            Route::from_json(&json!({"pathname": 4})),
            Err(FeelError::InvalidArgumentType {
                argument: "route pathname",
                ..
            })
        ));
        assert!(Route::from_json(&json!({"components": []})).is_err());
        assert!(Route::from_json(&json!("/")).is_err());
    }

    #[test]
    fn dropped_router_leaves_listener_inert() {
        let f = fixture();
        f.router.initialize_router("/", Vec::new()).unwrap();
        let weak = f.router.downgrade();
        let Fixture {
            history, router, ..
        } = f;
        drop(router);
        assert!(weak.upgrade().is_none());
        history.push_state(json!({"FeelPath": "/a"}), "https://feel.test/");
        assert!(history.back().unwrap());
    }
}
