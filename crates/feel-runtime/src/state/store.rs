#![forbid(unsafe_code)]

//! Named state slots with subscription-based change notification.
//!
//! # Invariants
//!
//! 1. A name must be added with [`StateStore::add_state`] before it can be
//!    read, dispatched or subscribed to.
//! 2. Dispatching a value strictly equal to the stored one is a no-op: the
//!    slot is untouched and no callback runs.
//! 3. Callbacks run in registration order. Each one receives the *current*
//!    value of every name it watches, read just before it runs.
//! 4. A dispatch issued from inside a callback completes (including its own
//!    notifications) before the outer notification cycle continues.
//! 5. A subscription added during a cycle is not notified by that cycle; a
//!    subscription removed during a cycle is not notified afterwards.
//!
//! # Failure Modes
//!
//! | Failure | Cause | Behavior |
//! |---------|-------|----------|
//! | Unknown name | read/dispatch/subscribe before `add_state` | `UnknownState` |
//! | Non-string name | dynamic entry point given another kind | `InvalidArgumentType` |
//! | Callback error | a subscriber returns `Err` | remaining subscribers skipped, error returned, new value kept |

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use ahash::AHashMap;
use feel_core::guard::{self, Kind};
use feel_core::{FeelError, Result, Value};
use serde::{Deserialize, Serialize};
use tracing::{debug, debug_span, trace};

use super::snapshot::Snapshot;

// ---------------------------------------------------------------------------
// Callbacks
// ---------------------------------------------------------------------------

/// A subscription callback.
///
/// Identity matters: [`StateStore::unsubscribe`] removes the record whose
/// callback is the *same* `Callback` (a clone counts as the same).
#[derive(Clone)]
pub struct Callback(Rc<dyn Fn(&Snapshot) -> Result<()>>);

impl Callback {
    /// Wrap a closure.
    pub fn new(f: impl Fn(&Snapshot) -> Result<()> + 'static) -> Self {
        Self(Rc::new(f))
    }

    /// Whether both handles wrap the same closure.
    #[must_use]
    pub fn same(&self, other: &Self) -> bool {
        std::ptr::eq(
            Rc::as_ptr(&self.0).cast::<()>(),
            Rc::as_ptr(&other.0).cast::<()>(),
        )
    }

    fn call(&self, snapshot: &Snapshot) -> Result<()> {
        (self.0)(snapshot)
    }
}

impl fmt::Debug for Callback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Callback({:p})", Rc::as_ptr(&self.0).cast::<()>())
    }
}

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Which matches [`StateStore::unsubscribe`] may remove.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum UnsubscribePolicy {
    /// Remove the first matching record wherever it is.
    #[default]
    AnyPosition,
    /// Legacy behavior: if the first matching record is the very first
    /// subscription, nothing is removed.
    SkipFirst,
}

/// Store settings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StoreConfig {
    /// Removal rule for `unsubscribe`.
    pub unsubscribe_policy: UnsubscribePolicy,
}

// ---------------------------------------------------------------------------
// StateStore
// ---------------------------------------------------------------------------

/// Stable identifier of one subscription record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

impl SubscriptionId {
    /// Raw id value.
    #[inline]
    pub const fn id(self) -> u64 {
        self.0
    }
}

struct Record {
    id: SubscriptionId,
    callback: Callback,
    watched: Vec<String>,
    active: Cell<bool>,
}

impl Record {
    fn watches(&self, name: &str) -> bool {
        self.watched.iter().any(|w| w == name)
    }

    fn deactivate(&self) -> bool {
        self.active.set(false);
        debug!(subscription = self.id.0, "unsubscribed");
        true
    }
}

struct StoreInner {
    slots: RefCell<AHashMap<String, Value>>,
    subscriptions: RefCell<Vec<Rc<Record>>>,
    next_id: Cell<u64>,
    config: StoreConfig,
}

/// Shared handle to a state store. Clones refer to the same store.
#[derive(Clone)]
pub struct StateStore {
    inner: Rc<StoreInner>,
}

impl StateStore {
    /// An empty store with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(StoreConfig::default())
    }

    /// An empty store with the given settings.
    #[must_use]
    pub fn with_config(config: StoreConfig) -> Self {
        Self {
            inner: Rc::new(StoreInner {
                slots: RefCell::new(AHashMap::new()),
                subscriptions: RefCell::new(Vec::new()),
                next_id: Cell::new(1),
                config,
            }),
        }
    }

    /// Settings this store was built with.
    #[must_use]
    pub fn config(&self) -> StoreConfig {
        self.inner.config
    }

    /// A non-owning handle, for callbacks that must not keep the store alive.
    #[must_use]
    pub fn downgrade(&self) -> WeakStateStore {
        WeakStateStore {
            inner: Rc::downgrade(&self.inner),
        }
    }

    /// Create or overwrite a slot. No subscriber is notified.
    pub fn add_state(&self, name: &str, initial: impl Into<Value>) {
        self.inner
            .slots
            .borrow_mut()
            .insert(name.to_owned(), initial.into());
        debug!(state = name, "state added");
    }

    /// Current value of a slot.
    pub fn get_state(&self, name: &str) -> Result<Value> {
        self.inner
            .slots
            .borrow()
            .get(name)
            .cloned()
            .ok_or_else(|| FeelError::UnknownState(name.to_owned()))
    }

    /// Whether a slot exists.
    #[must_use]
    pub fn has_state(&self, name: &str) -> bool {
        self.inner.slots.borrow().contains_key(name)
    }

    /// All slot names, sorted.
    #[must_use]
    pub fn state_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.inner.slots.borrow().keys().cloned().collect();
        names.sort_unstable();
        names
    }

    /// Number of live subscription records.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.inner.subscriptions.borrow().len()
    }

    /// Replace a slot's value and notify the subscribers watching it.
    ///
    /// Returns immediately when `value` is strictly equal to the stored
    /// value. Otherwise the value is stored first, then every subscription
    /// watching `name` runs in registration order.
    pub fn dispatch(&self, name: &str, value: impl Into<Value>) -> Result<()> {
        let value = value.into();
        let previous = {
            let mut slots = self.inner.slots.borrow_mut();
            let slot = slots
                .get_mut(name)
                .ok_or_else(|| FeelError::UnknownState(name.to_owned()))?;
            if slot.strict_eq(&value) {
                trace!(state = name, "dispatch skipped: value unchanged");
                return Ok(());
            }
            std::mem::replace(slot, value)
        };
        // Released after the borrow ends; destructors may touch the store.
        drop(previous);

        // Fixed before any callback runs; later registrations wait for the
        // next dispatch.
        let targets: Vec<Rc<Record>> = self
            .inner
            .subscriptions
            .borrow()
            .iter()
            .filter(|record| record.watches(name))
            .cloned()
            .collect();

        let _span = debug_span!("dispatch", state = name).entered();
        debug!(subscribers = targets.len(), "notifying");

        for record in targets {
            if !record.active.get() {
                continue;
            }
            let snapshot = self.snapshot(&record.watched)?;
            trace!(subscription = record.id.0, "invoke");
            record.callback.call(&snapshot)?;
        }
        Ok(())
    }

    /// Register `callback` to run whenever any of `watched` is dispatched.
    ///
    /// Every watched name must already exist.
    pub fn subscribe<I, S>(&self, callback: &Callback, watched: I) -> Result<SubscriptionHandle>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let watched: Vec<String> = watched
            .into_iter()
            .map(|name| name.as_ref().to_owned())
            .collect();
        {
            let slots = self.inner.slots.borrow();
            if let Some(missing) = watched.iter().find(|name| !slots.contains_key(name.as_str())) {
                return Err(FeelError::UnknownState(missing.clone()));
            }
        }

        let id = SubscriptionId(self.inner.next_id.get());
        self.inner.next_id.set(id.0 + 1);
        debug!(subscription = id.0, watched = ?watched, "subscribed");
        self.inner.subscriptions.borrow_mut().push(Rc::new(Record {
            id,
            callback: callback.clone(),
            watched,
            active: Cell::new(true),
        }));

        Ok(SubscriptionHandle {
            store: self.downgrade(),
            callback: callback.clone(),
            id,
        })
    }

    /// Remove the first subscription registered with `callback`.
    ///
    /// Under [`UnsubscribePolicy::SkipFirst`] a match at position 0 is kept.
    /// Returns whether a record was removed.
    pub fn unsubscribe(&self, callback: &Callback) -> bool {
        let removed = {
            let mut subscriptions = self.inner.subscriptions.borrow_mut();
            let position = subscriptions
                .iter()
                .position(|record| record.callback.same(callback));
            match (position, self.inner.config.unsubscribe_policy) {
                (Some(0), UnsubscribePolicy::SkipFirst) | (None, _) => None,
                (Some(index), _) => Some(subscriptions.remove(index)),
            }
        };
        removed.is_some_and(|record| record.deactivate())
    }

    /// Remove the subscription registered as `id`, whatever its position.
    ///
    /// Used to undo a registration made by a setup step that later failed;
    /// the unsubscribe policy does not apply.
    pub(crate) fn remove_subscription(&self, id: SubscriptionId) -> bool {
        let removed = {
            let mut subscriptions = self.inner.subscriptions.borrow_mut();
            subscriptions
                .iter()
                .position(|record| record.id == id)
                .map(|index| subscriptions.remove(index))
        };
        removed.is_some_and(|record| record.deactivate())
    }

    fn snapshot(&self, watched: &[String]) -> Result<Snapshot> {
        let slots = self.inner.slots.borrow();
        let mut snapshot = Snapshot::default();
        for name in watched {
            let value = slots
                .get(name)
                .cloned()
                .ok_or_else(|| FeelError::UnknownState(name.clone()))?;
            snapshot.insert(name, value);
        }
        Ok(snapshot)
    }
}

// Entry points for names and name lists that arrive as dynamic values.
impl StateStore {
    /// [`add_state`](Self::add_state) with a dynamic name.
    pub fn add_state_value(&self, name: &Value, initial: impl Into<Value>) -> Result<()> {
        let name = guard::expect_str("state name", name)?;
        self.add_state(name, initial);
        Ok(())
    }

    /// [`get_state`](Self::get_state) with a dynamic name.
    pub fn get_state_value(&self, name: &Value) -> Result<Value> {
        self.get_state(guard::expect_str("state name", name)?)
    }

    /// [`dispatch`](Self::dispatch) with a dynamic name.
    pub fn dispatch_value(&self, name: &Value, value: impl Into<Value>) -> Result<()> {
        self.dispatch(guard::expect_str("state name", name)?, value)
    }

    /// [`subscribe`](Self::subscribe) with a dynamic list of names.
    pub fn subscribe_value(
        &self,
        callback: &Callback,
        watched: &Value,
    ) -> Result<SubscriptionHandle> {
        let list = watched.as_list().ok_or(FeelError::InvalidArgumentType {
            argument: "watched states",
            expected: Kind::List,
            found: guard::Typed::kind(watched),
        })?;
        let names = list
            .iter()
            .map(|name| guard::expect_str("watched state", name))
            .collect::<Result<Vec<_>>>()?;
        self.subscribe(callback, names)
    }
}

impl Default for StateStore {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for StateStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateStore")
            .field("states", &self.inner.slots.borrow().len())
            .field("subscriptions", &self.subscriber_count())
            .field("config", &self.inner.config)
            .finish()
    }
}

/// Non-owning store handle.
#[derive(Clone, Debug, Default)]
pub struct WeakStateStore {
    inner: Weak<StoreInner>,
}

impl WeakStateStore {
    /// The store, if it is still alive.
    #[must_use]
    pub fn upgrade(&self) -> Option<StateStore> {
        self.inner.upgrade().map(|inner| StateStore { inner })
    }
}

// ---------------------------------------------------------------------------
// SubscriptionHandle
// ---------------------------------------------------------------------------

/// Returned by [`StateStore::subscribe`].
///
/// Dropping the handle does **not** unsubscribe; call
/// [`unsubscribe`](Self::unsubscribe) or hold it in a
/// [`SubscriptionScope`](super::SubscriptionScope).
#[derive(Debug, Clone)]
pub struct SubscriptionHandle {
    store: WeakStateStore,
    callback: Callback,
    id: SubscriptionId,
}

impl SubscriptionHandle {
    /// Id of the record this handle was created for.
    #[must_use]
    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    /// The subscribed callback.
    #[must_use]
    pub fn callback(&self) -> &Callback {
        &self.callback
    }

    /// Same as `store.unsubscribe(self.callback())`. Returns `false` if the
    /// store is gone or nothing was removed.
    pub fn unsubscribe(&self) -> bool {
        self.store
            .upgrade()
            .is_some_and(|store| store.unsubscribe(&self.callback))
    }
}
