#![forbid(unsafe_code)]

//! Grouped subscriptions with a shared lifetime.
//!
//! A [`SubscriptionScope`] collects [`SubscriptionHandle`]s for one logical
//! owner (a page, a widget) and unsubscribes all of them when cleared or
//! dropped.
//!
//! # Invariants
//!
//! 1. Handles are released in reverse registration order.
//! 2. After `clear()` or drop, no callback registered through this scope
//!    fires again.
//! 3. A cleared scope is reusable.

use feel_core::Result;

use super::store::{Callback, StateStore, SubscriptionHandle};

/// Owns a set of subscriptions and releases them together.
#[derive(Debug, Default)]
pub struct SubscriptionScope {
    handles: Vec<SubscriptionHandle>,
}

impl SubscriptionScope {
    /// An empty scope.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Take ownership of an existing handle.
    pub fn hold(&mut self, handle: SubscriptionHandle) {
        self.handles.push(handle);
    }

    /// Subscribe through `store` and hold the resulting handle.
    pub fn subscribe<I, S>(
        &mut self,
        store: &StateStore,
        callback: &Callback,
        watched: I,
    ) -> Result<&mut Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let handle = store.subscribe(callback, watched)?;
        self.handles.push(handle);
        Ok(self)
    }

    /// Number of held handles.
    #[must_use]
    pub fn len(&self) -> usize {
        self.handles.len()
    }

    /// Whether the scope holds nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Unsubscribe everything now.
    pub fn clear(&mut self) {
        while let Some(handle) = self.handles.pop() {
            handle.unsubscribe();
        }
    }
}

impl Drop for SubscriptionScope {
    fn drop(&mut self) {
        self.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    fn counter() -> (Rc<Cell<u32>>, Callback) {
        let hits = Rc::new(Cell::new(0));
        let h = Rc::clone(&hits);
        let cb = Callback::new(move |_| {
            h.set(h.get() + 1);
            Ok(())
        });
        (hits, cb)
    }

    #[test]
    fn drop_releases_subscriptions() {
        let store = StateStore::new();
        store.add_state("s", 0);
        let (hits, cb) = counter();
        {
            let mut scope = SubscriptionScope::new();
            scope.subscribe(&store, &cb, ["s"]).unwrap();
            store.dispatch("s", 1).unwrap();
            assert_eq!(hits.get(), 1);
        }
        store.dispatch("s", 2).unwrap();
        assert_eq!(hits.get(), 1);
        assert_eq!(store.subscriber_count(), 0);
    }

    #[test]
    fn clear_releases_and_scope_is_reusable() {
        let store = StateStore::new();
        store.add_state("s", 0);
        let (first_hits, first) = counter();
        let (second_hits, second) = counter();

        let mut scope = SubscriptionScope::new();
        scope.subscribe(&store, &first, ["s"]).unwrap();
        scope.clear();
        assert!(scope.is_empty());

        scope.subscribe(&store, &second, ["s"]).unwrap();
        store.dispatch("s", 1).unwrap();
        assert_eq!(first_hits.get(), 0);
        assert_eq!(second_hits.get(), 1);
    }

    #[test]
    fn hold_adopts_external_handles() {
        let store = StateStore::new();
        store.add_state("s", 0);
        let (hits, cb) = counter();
        let mut scope = SubscriptionScope::new();
        scope.hold(store.subscribe(&cb, ["s"]).unwrap());
        assert_eq!(scope.len(), 1);

        drop(scope);
        store.dispatch("s", 1).unwrap();
        assert_eq!(hits.get(), 0);
    }

    #[test]
    fn failed_subscribe_adds_nothing() {
        let store = StateStore::new();
        let (_, cb) = counter();
        let mut scope = SubscriptionScope::new();
        assert!(scope.subscribe(&store, &cb, ["missing"]).is_err());
        assert!(scope.is_empty());
    }
}
