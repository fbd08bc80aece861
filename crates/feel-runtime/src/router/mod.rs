#![forbid(unsafe_code)]

//! History-backed routing for Feel.
//!
//! - [`Router`]: route table and current path kept in the state store,
//!   rendered into the document root.
//! - [`create_link`]: anchors that navigate through the router.
//! - [`History`]: the host session history seam, with [`MemoryHistory`]
//!   for headless use.
//!
//! # Architecture
//!
//! The router owns no rendering state of its own. It writes two reserved
//! slots and subscribes a render callback to the current-path slot, so a
//! navigation is a dispatch like any other. Callbacks stored inside the
//! store or the history hold the router weakly.

pub mod engine;
pub mod history;
pub mod link;

pub use engine::{
    DEFAULT_HOME_PATH, ROUTING_CURRENT_PATH_NAME, ROUTING_STATE_NAME, Route, Router, WeakRouter,
};
pub use history::{
    FEEL_PATH_KEY, History, HistoryEntry, HistoryState, MemoryHistory, NavigationEvent,
    NavigationListener, extra_fields,
};
pub use link::{LinkProps, create_link};
