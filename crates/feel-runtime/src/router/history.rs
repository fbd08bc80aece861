#![forbid(unsafe_code)]

//! Session history seam and the persisted route marker.
//!
//! The router talks to the host's session history through the [`History`]
//! trait. [`MemoryHistory`] is a deterministic implementation driven
//! directly by the caller (tests, headless hosts).
//!
//! Every entry the router writes carries a [`HistoryState`]: a JSON object
//! with the reserved `FeelPath` key plus any caller-supplied fields.
//!
//! # Invariants
//!
//! 1. `push_state` drops every forward entry, then appends and selects the
//!    new one.
//! 2. `replace_state` never changes `length()`.
//! 3. Navigation listeners run only for traversal (`back`, `forward`, `go`),
//!    never for push or replace, in registration order.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use feel_core::Result;
use feel_core::guard;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as Json};
use tracing::debug;

/// Reserved payload key mirroring the active path.
pub const FEEL_PATH_KEY: &str = "FeelPath";

// ---------------------------------------------------------------------------
// HistoryState
// ---------------------------------------------------------------------------

/// Payload stored with each history entry the router creates.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HistoryState {
    /// The active path for this entry.
    #[serde(rename = "FeelPath")]
    pub feel_path: String,
    /// Caller-supplied fields, stored next to `FeelPath`.
    #[serde(flatten)]
    pub extra: Map<String, Json>,
}

impl HistoryState {
    /// A payload for `path` carrying `extra` fields.
    ///
    /// A `FeelPath` key inside `extra` is overridden by `path`.
    #[must_use]
    pub fn new(path: impl Into<String>, mut extra: Map<String, Json>) -> Self {
        extra.remove(FEEL_PATH_KEY);
        Self {
            feel_path: path.into(),
            extra,
        }
    }

    /// Read the route marker from a host payload.
    ///
    /// Returns `None` when the payload is not an object or its `FeelPath` is
    /// missing, not a string, or empty.
    #[must_use]
    pub fn from_json(payload: &Json) -> Option<Self> {
        let object = payload.as_object()?;
        let path = object
            .get(FEEL_PATH_KEY)?
            .as_str()
            .filter(|p| !p.is_empty())?;
        let extra = object
            .iter()
            .filter(|(key, _)| key.as_str() != FEEL_PATH_KEY)
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();
        Some(Self {
            feel_path: path.to_owned(),
            extra,
        })
    }

    /// The JSON payload: caller fields plus `FeelPath`.
    #[must_use]
    pub fn to_json(&self) -> Json {
        let mut object = self.extra.clone();
        object.insert(FEEL_PATH_KEY.to_owned(), Json::String(self.feel_path.clone()));
        Json::Object(object)
    }
}

/// Validate caller-supplied link state: it must be a JSON object.
pub fn extra_fields(state: &Json) -> Result<Map<String, Json>> {
    guard::expect_json_object("link state", state).cloned()
}

// ---------------------------------------------------------------------------
// History seam
// ---------------------------------------------------------------------------

/// A back/forward traversal as seen by a listener.
#[derive(Debug, Clone, PartialEq)]
pub struct NavigationEvent {
    /// Payload of the entry that became current.
    pub state: Option<Json>,
}

/// Callback run after a back/forward traversal.
pub type NavigationListener = Rc<dyn Fn(&NavigationEvent) -> Result<()>>;

/// The host's session history.
pub trait History {
    /// Scheme, host and port of the page, e.g. `"https://example.com"`.
    fn origin(&self) -> String;

    /// Payload of the current entry.
    fn state(&self) -> Option<Json>;

    /// Number of entries.
    fn length(&self) -> usize;

    /// Append an entry after the current one and select it.
    fn push_state(&self, state: Json, url: &str);

    /// Overwrite the current entry.
    fn replace_state(&self, state: Json, url: &str);

    /// Register a listener for back/forward traversal.
    fn add_navigation_listener(&self, listener: NavigationListener);
}

// ---------------------------------------------------------------------------
// MemoryHistory
// ---------------------------------------------------------------------------

/// One session history entry.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryEntry {
    /// Stored payload.
    pub state: Option<Json>,
    /// Entry URL.
    pub url: String,
}

/// In-memory session history.
pub struct MemoryHistory {
    origin: String,
    entries: RefCell<Vec<HistoryEntry>>,
    index: Cell<usize>,
    listeners: RefCell<Vec<NavigationListener>>,
}

impl MemoryHistory {
    /// A history with a single stateless entry at `{origin}/`.
    #[must_use]
    pub fn new(origin: impl Into<String>) -> Self {
        Self::with_state(origin, None)
    }

    /// A history whose only entry already carries `state`, as after a page
    /// reload.
    #[must_use]
    pub fn with_state(origin: impl Into<String>, state: Option<Json>) -> Self {
        let origin = origin.into();
        let url = format!("{origin}/");
        Self {
            origin,
            entries: RefCell::new(vec![HistoryEntry { state, url }]),
            index: Cell::new(0),
            listeners: RefCell::new(Vec::new()),
        }
    }

    /// Index of the current entry.
    #[must_use]
    pub fn index(&self) -> usize {
        self.index.get()
    }

    /// All entries, oldest first.
    #[must_use]
    pub fn entries(&self) -> Vec<HistoryEntry> {
        self.entries.borrow().clone()
    }

    /// URL of the current entry.
    #[must_use]
    pub fn current_url(&self) -> String {
        self.entries.borrow()[self.index.get()].url.clone()
    }

    /// Number of registered listeners.
    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.listeners.borrow().len()
    }

    /// Go back one entry. See [`go`](Self::go).
    pub fn back(&self) -> Result<bool> {
        self.go(-1)
    }

    /// Go forward one entry. See [`go`](Self::go).
    pub fn forward(&self) -> Result<bool> {
        self.go(1)
    }

    /// Move `delta` entries and notify listeners.
    ///
    /// Returns `Ok(false)` without notifying when the target is out of range
    /// or `delta` is zero. The first listener error is returned; later
    /// listeners do not run.
    pub fn go(&self, delta: isize) -> Result<bool> {
        let len = self.entries.borrow().len();
        let target = match self.index.get().checked_add_signed(delta) {
            Some(target) if delta != 0 && target < len => target,
            _ => return Ok(false),
        };
        self.index.set(target);
        let event = NavigationEvent {
            state: self.state(),
        };
        debug!(index = target, delta, "history traversal");
        let listeners = self.listeners.borrow().clone();
        for listener in listeners {
            listener(&event)?;
        }
        Ok(true)
    }
}

impl History for MemoryHistory {
    fn origin(&self) -> String {
        self.origin.clone()
    }

    fn state(&self) -> Option<Json> {
        self.entries.borrow()[self.index.get()].state.clone()
    }

    fn length(&self) -> usize {
        self.entries.borrow().len()
    }

    fn push_state(&self, state: Json, url: &str) {
        let mut entries = self.entries.borrow_mut();
        let next = self.index.get() + 1;
        entries.truncate(next);
        entries.push(HistoryEntry {
            state: Some(state),
            url: url.to_owned(),
        });
        self.index.set(next);
    }

    fn replace_state(&self, state: Json, url: &str) {
        let mut entries = self.entries.borrow_mut();
        entries[self.index.get()] = HistoryEntry {
            state: Some(state),
            url: url.to_owned(),
        };
    }

    fn add_navigation_listener(&self, listener: NavigationListener) {
        self.listeners.borrow_mut().push(listener);
    }
}

impl fmt::Debug for MemoryHistory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryHistory")
            .field("origin", &self.origin)
            .field("entries", &self.entries.borrow())
            .field("index", &self.index.get())
            .field("listeners", &self.listeners.borrow().len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use feel_core::{FeelError, Kind};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn state_round_trips_through_json() {
        let extra = json!({"scroll": 3, "FeelPath": "/ignored"});
        let state = HistoryState::new("/about", extra.as_object().unwrap().clone());
        let payload = state.to_json();
        assert_eq!(payload, json!({"scroll": 3, "FeelPath": "/about"}));
        assert_eq!(HistoryState::from_json(&payload), Some(state));
    }

    #[test]
    fn serde_form_matches_wire_contract() {
        let state = HistoryState::new("/x", Map::new());
        assert_eq!(serde_json::to_value(&state).unwrap(), json!({"FeelPath": "/x"}));
        let parsed: HistoryState =
            serde_json::from_value(json!({"FeelPath": "/y", "tab": "info"})).unwrap();
        assert_eq!(parsed.feel_path, "/y");
        assert_eq!(parsed.extra["tab"], json!("info"));
    }

    #[test]
    fn foreign_payloads_carry_no_marker() {
        assert_eq!(HistoryState::from_json(&json!(null)), None);
        assert_eq!(HistoryState::from_json(&json!("/about")), None);
        assert_eq!(HistoryState::from_json(&json!({"other": 1})), None);
        assert_eq!(HistoryState::from_json(&json!({"FeelPath": 5})), None);
        assert_eq!(HistoryState::from_json(&json!({"FeelPath": ""})), None);
    }

    #[test]
    fn extra_fields_require_an_object() {
        assert!(extra_fields(&json!({"a": 1})).is_ok());
        assert!(matches!(
            extra_fields(&json!([1])),
            Err(FeelError::InvalidArgumentType {
                found: Kind::List,
                ..
            })
        ));
    }

    #[test]
    fn push_truncates_forward_entries() {
        let history = MemoryHistory::new("https://app.test");
        history.push_state(json!({"n": 1}), "https://app.test/");
        history.push_state(json!({"n": 2}), "https://app.test/");
        assert_eq!(history.length(), 3);

        assert!(history.back().unwrap());
        assert!(history.back().unwrap());
        history.push_state(json!({"n": 3}), "https://app.test/");
        assert_eq!(history.length(), 2);
        assert_eq!(history.state(), Some(json!({"n": 3})));
    }

    #[test]
    fn replace_keeps_length() {
        let history = MemoryHistory::new("https://app.test");
        history.replace_state(json!({"n": 1}), "https://app.test/x");
        assert_eq!(history.length(), 1);
        assert_eq!(history.current_url(), "https://app.test/x");
        assert_eq!(history.state(), Some(json!({"n": 1})));
    }

    #[test]
    fn traversal_out_of_range_is_ignored() {
        let history = MemoryHistory::new("https://app.test");
        assert!(!history.back().unwrap());
        assert!(!history.forward().unwrap());
        assert!(!history.go(0).unwrap());
        assert_eq!(history.index(), 0);
    }

    #[test]
    fn listeners_see_the_new_current_state() {
        let history = MemoryHistory::new("https://app.test");
        let seen = Rc::new(RefCell::new(Vec::new()));
        let s = Rc::clone(&seen);
        history.add_navigation_listener(Rc::new(move |event: &NavigationEvent| -> Result<()> {
            s.borrow_mut().push(event.state.clone());
            Ok(())
        }));

        history.push_state(json!({"page": 2}), "https://app.test/");
        assert!(seen.borrow().is_empty());

        history.back().unwrap();
        history.forward().unwrap();
        assert_eq!(*seen.borrow(), [None, Some(json!({"page": 2}))]);
    }

    #[test]
    fn listener_error_is_returned() {
        let history = MemoryHistory::new("https://app.test");
        history.push_state(json!({}), "https://app.test/");
        history.add_navigation_listener(Rc::new(|_: &NavigationEvent| -> Result<()> {
            Err(FeelError::RootMissing)
        }));
        assert_eq!(history.back().unwrap_err(), FeelError::RootMissing);
        assert_eq!(history.index(), 0);
    }

    #[test]
    fn reloaded_history_exposes_initial_state() {
        let history = MemoryHistory::with_state("https://app.test", Some(json!({"FeelPath": "/a"})));
        assert_eq!(
            HistoryState::from_json(&history.state().unwrap()).map(|s| s.feel_path),
            Some("/a".to_owned())
        );
    }
}
