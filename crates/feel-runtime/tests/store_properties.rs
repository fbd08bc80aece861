//! Property tests for notification order and dispatch counting.
//!
//! A reference model runs next to the store: for a sequence of dispatched
//! numbers it predicts how many notifications each subscriber sees and in
//! what order subscribers fire.

use std::cell::RefCell;
use std::rc::Rc;

use feel_core::Value;
use feel_runtime::{Callback, StateStore, StoreConfig, UnsubscribePolicy};
use proptest::prelude::*;

const NAMES: [&str; 3] = ["a", "b", "c"];

fn store_with_names() -> StateStore {
    let store = StateStore::new();
    for name in NAMES {
        store.add_state(name, Value::Null);
    }
    store
}

/// Number of values in `seq` that differ from the one before, starting from
/// an initial `Null` slot.
fn distinct_consecutive(seq: &[i32]) -> usize {
    let mut previous: Option<i32> = None;
    seq.iter()
        .filter(|&&v| {
            let changed = previous != Some(v);
            previous = Some(v);
            changed
        })
        .count()
}

proptest! {
    #[test]
    fn notification_order_is_registration_order(
        watches in prop::collection::vec(prop::collection::vec(0usize..3, 1..3), 1..12),
        target in 0usize..3,
    ) {
        let store = store_with_names();
        let log = Rc::new(RefCell::new(Vec::new()));
        for (index, watched) in watches.iter().enumerate() {
            let log = Rc::clone(&log);
            let cb = Callback::new(move |_| {
                log.borrow_mut().push(index);
                Ok(())
            });
            let names: Vec<&str> = watched.iter().map(|&i| NAMES[i]).collect();
            store.subscribe(&cb, names).unwrap();
        }

        store.dispatch(NAMES[target], 1).unwrap();

        let expected: Vec<usize> = watches
            .iter()
            .enumerate()
            .filter(|(_, watched)| watched.contains(&target))
            .map(|(index, _)| index)
            .collect();
        prop_assert_eq!(log.borrow().clone(), expected);
    }

    #[test]
    fn dispatch_count_matches_distinct_consecutive_values(
        seq in prop::collection::vec(0i32..4, 0..40),
    ) {
        let store = store_with_names();
        let calls = Rc::new(RefCell::new(0usize));
        let c = Rc::clone(&calls);
        let cb = Callback::new(move |_| {
            *c.borrow_mut() += 1;
            Ok(())
        });
        store.subscribe(&cb, ["a"]).unwrap();

        for value in &seq {
            store.dispatch("a", *value).unwrap();
        }

        prop_assert_eq!(*calls.borrow(), distinct_consecutive(&seq));
    }

    #[test]
    fn unsubscribe_removes_exactly_one_record(
        count in 1usize..8,
        remove_at in 0usize..8,
    ) {
        let remove_at = remove_at % count;
        for policy in [UnsubscribePolicy::AnyPosition, UnsubscribePolicy::SkipFirst] {
            let store = StateStore::with_config(StoreConfig { unsubscribe_policy: policy });
            store.add_state("a", 0);
            let callbacks: Vec<Callback> = (0..count).map(|_| Callback::new(|_| Ok(()))).collect();
            for cb in &callbacks {
                store.subscribe(cb, ["a"]).unwrap();
            }

            let removed = store.unsubscribe(&callbacks[remove_at]);
            let kept_first = policy == UnsubscribePolicy::SkipFirst && remove_at == 0;
            prop_assert_eq!(removed, !kept_first);
            prop_assert_eq!(
                store.subscriber_count(),
                if kept_first { count } else { count - 1 }
            );
        }
    }
}
