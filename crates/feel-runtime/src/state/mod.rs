#![forbid(unsafe_code)]

//! Reactive state for Feel.
//!
//! - [`StateStore`]: named slots plus ordered subscriptions.
//! - [`Callback`] / [`SubscriptionHandle`]: what a subscription is made of
//!   and how to undo it.
//! - [`Snapshot`]: the watched values a callback receives.
//! - [`SubscriptionScope`]: releases a group of subscriptions together.
//!
//! # Architecture
//!
//! The store is an `Rc` handle over `RefCell`ed slots and subscription
//! records. No borrow is held while a callback runs, so callbacks may read,
//! dispatch, subscribe and unsubscribe freely. Nested dispatches run
//! depth-first.

pub mod scope;
pub mod snapshot;
pub mod store;

pub use scope::SubscriptionScope;
pub use snapshot::Snapshot;
pub use store::{
    Callback, StateStore, StoreConfig, SubscriptionHandle, SubscriptionId, UnsubscribePolicy,
    WeakStateStore,
};
