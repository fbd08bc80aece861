#![forbid(unsafe_code)]

//! Reactive runtime for Feel.
//!
//! # Key Components
//!
//! - [`StateStore`] - named state slots with ordered, re-entrant subscriptions
//! - [`Router`] - route table and current path on top of the store
//! - [`create_link`] - anchors that navigate through the router
//! - [`History`] / [`MemoryHistory`] - the session history seam
//! - [`FeelConfig`] - declarative store and router setup
//!
//! # Feature Flags
//!
//! - `config`: TOML loading for [`FeelConfig`] and [`RouterConfig`].

pub mod config;
pub mod router;
pub mod state;

pub use config::{FeelConfig, RouteSpec, RouterConfig};
pub use router::{
    DEFAULT_HOME_PATH, FEEL_PATH_KEY, History, HistoryEntry, HistoryState, LinkProps,
    MemoryHistory, NavigationEvent, NavigationListener, ROUTING_CURRENT_PATH_NAME,
    ROUTING_STATE_NAME, Route, Router, WeakRouter, create_link,
};
pub use state::{
    Callback, Snapshot, StateStore, StoreConfig, SubscriptionHandle, SubscriptionId,
    SubscriptionScope, UnsubscribePolicy, WeakStateStore,
};
