//! Unit tests for OrderedMap.
//!
//! Covers construction, lookups, the modify transaction and the
//! order-sensitive equality and hashing of frozen maps.

#![cfg(feature = "collections")]

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::panic::{AssertUnwindSafe, catch_unwind};

use rstest::rstest;
use safekit::collections::{Mutability, OrderedMap};

fn hash_value<T: Hash>(value: &T) -> u64 {
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    hasher.finish()
}

// =============================================================================
// Construction
// =============================================================================

#[rstest]
fn test_new_creates_empty_frozen_map() {
    let map: OrderedMap<String, i32> = OrderedMap::new();
    assert!(map.is_empty());
    assert_eq!(map.len(), 0);
    assert_eq!(map.mutability(), Mutability::Frozen);
    assert!(map.all_keys().is_empty());
    assert!(map.all_values().is_empty());
}

#[rstest]
fn test_from_iterator_upserts_duplicates() {
    let map: OrderedMap<&str, i32> = [("a", 1), ("b", 2), ("a", 3)].into_iter().collect();
    assert_eq!(map.all_keys(), vec!["a", "b"]);
    assert_eq!(map.all_values(), vec![3, 2]);
}

// =============================================================================
// modify
// =============================================================================

#[rstest]
fn test_modify_keeps_insertion_order() {
    let map: OrderedMap<&str, i32> = OrderedMap::new();
    let map = map.modify(|working| {
        working.set("z", 1);
        working.set("a", 2);
    });

    assert_eq!(map.all_keys(), vec!["z", "a"]);
    assert_eq!(map.all_values(), vec![1, 2]);
}

#[rstest]
fn test_modify_leaves_original_unchanged() {
    let original: OrderedMap<&str, i32> = [("a", 1), ("b", 2)].into();
    let updated = original.modify(|working| {
        working.set("a", 100);
        working.remove("b");
        working.set("c", 3);
    });

    assert_eq!(original.all_keys(), vec!["a", "b"]);
    assert_eq!(original.get("a"), Some(&1));
    assert_eq!(updated.all_keys(), vec!["a", "c"]);
    assert_eq!(updated.get("a"), Some(&100));
}

#[rstest]
fn test_remove_by_str_from_string_keyed_map() {
    let original: OrderedMap<String, i32> = [
        ("a".to_string(), 1),
        ("b".to_string(), 2),
        ("c".to_string(), 3),
    ]
    .into();
    let updated = original.modify(|working| {
        assert_eq!(working.remove("a"), Some(1));
        assert_eq!(working.position_of("c"), Some(1));
    });

    assert_eq!(updated.all_keys(), vec!["b".to_string(), "c".to_string()]);
    assert_eq!(updated.position_of("b"), Some(0));
    assert_eq!(updated.get("c"), Some(&3));
}

#[rstest]
fn test_modify_replacing_value_keeps_position() {
    let original: OrderedMap<&str, i32> = [("a", 1), ("b", 2), ("c", 3)].into();
    let updated = original.modify(|working| {
        assert_eq!(working.set("b", 20), Some(2));
    });

    assert_eq!(updated.all_keys(), vec!["a", "b", "c"]);
    assert_eq!(updated.position_of("b"), Some(1));
}

#[rstest]
fn test_working_copy_reports_temporary_mutability() {
    let original: OrderedMap<&str, i32> = OrderedMap::new();
    let mut observed = None;
    let frozen = original.modify(|working| {
        observed = Some(working.mutability());
    });

    assert_eq!(observed, Some(Mutability::Temporary));
    assert_eq!(frozen.mutability(), Mutability::Frozen);
}

#[rstest]
fn test_working_copy_sees_its_own_writes() {
    let original: OrderedMap<&str, i32> = [("counter", 0)].into();
    let updated = original.modify(|working| {
        for _ in 0..5 {
            if let Some(counter) = working.get_mut("counter") {
                *counter += 1;
            }
        }
        assert_eq!(working.get("counter"), Some(&5));
    });

    assert_eq!(updated.get("counter"), Some(&5));
}

#[rstest]
fn test_panic_inside_modify_leaves_original_intact() {
    let original: OrderedMap<&str, i32> = [("a", 1)].into();

    let outcome = catch_unwind(AssertUnwindSafe(|| {
        original.modify(|working| {
            working.set("a", 2);
            working.set("b", 3);
            panic!("mutation failed halfway");
        })
    }));

    assert!(outcome.is_err());
    assert_eq!(original.all_keys(), vec!["a"]);
    assert_eq!(original.get("a"), Some(&1));
}

#[rstest]
fn test_try_modify_error_discards_working_copy() {
    let original: OrderedMap<&str, i32> = [("a", 1)].into();
    let result: Result<OrderedMap<&str, i32>, &str> = original.try_modify(|working| {
        working.clear();
        Err("abort")
    });

    assert_eq!(result, Err("abort"));
    assert_eq!(original.len(), 1);
}

#[rstest]
fn test_nested_modify_on_different_maps() {
    let inner: OrderedMap<&str, i32> = [("x", 1)].into();
    let outer: OrderedMap<&str, OrderedMap<&str, i32>> = OrderedMap::new();

    let outer = outer.modify(|working| {
        let extended = inner.modify(|nested| {
            nested.set("y", 2);
        });
        working.set("inner", extended);
    });

    assert_eq!(inner.all_keys(), vec!["x"]);
    assert_eq!(
        outer.get("inner").map(OrderedMap::all_keys),
        Some(vec!["x", "y"])
    );
}

// =============================================================================
// Lookup
// =============================================================================

#[rstest]
#[case("a", Some(0))]
#[case("b", Some(1))]
#[case("missing", None)]
fn test_position_of(#[case] key: &str, #[case] expected: Option<usize>) {
    let map: OrderedMap<&str, i32> = [("a", 1), ("b", 2)].into();
    assert_eq!(map.position_of(key), expected);
}

#[rstest]
fn test_string_keys_looked_up_by_str() {
    let map: OrderedMap<String, i32> = [("alpha".to_string(), 1)].into();
    assert_eq!(map.get("alpha"), Some(&1));
    assert!(map.contains_key("alpha"));
    assert_eq!(
        map.get_key_value("alpha"),
        Some((&"alpha".to_string(), &1))
    );
}

#[rstest]
fn test_first_last_and_index() {
    let map: OrderedMap<&str, i32> = [("a", 1), ("b", 2), ("c", 3)].into();
    assert_eq!(map.first(), Some((&"a", &1)));
    assert_eq!(map.last(), Some((&"c", &3)));
    assert_eq!(map.get_index(1), Some((&"b", &2)));
    assert_eq!(map.get_index(3), None);
}

#[rstest]
fn test_snapshots_are_independent_of_later_transactions() {
    let map: OrderedMap<&str, i32> = [("a", 1)].into();
    let keys = map.all_keys();
    let _updated = map.modify(|working| {
        working.set("b", 2);
    });
    assert_eq!(keys, vec!["a"]);
}

// =============================================================================
// Equality and hashing
// =============================================================================

#[rstest]
fn test_equality_is_order_sensitive() {
    let forward: OrderedMap<&str, i32> = [("a", 1), ("b", 2)].into();
    let backward: OrderedMap<&str, i32> = [("b", 2), ("a", 1)].into();
    let same: OrderedMap<&str, i32> = [("a", 1), ("b", 2)].into();

    assert_ne!(forward, backward);
    assert_eq!(forward, same);
    assert_eq!(hash_value(&forward), hash_value(&same));
    assert_eq!(forward.structural_hash(), same.structural_hash());
}

#[rstest]
fn test_swapped_entries_change_structural_hash() {
    let forward: OrderedMap<&str, i32> = [("a", 1), ("b", 2)].into();
    let backward: OrderedMap<&str, i32> = [("b", 2), ("a", 1)].into();
    assert_ne!(forward.structural_hash(), backward.structural_hash());
}

#[rstest]
fn test_clone_shares_storage_and_compares_equal() {
    let map: OrderedMap<&str, i32> = [("a", 1)].into();
    let clone = map.clone();
    assert_eq!(map, clone);
    assert_eq!(hash_value(&map), hash_value(&clone));
}

// =============================================================================
// Iteration and formatting
// =============================================================================

#[rstest]
fn test_iteration_in_position_order() {
    let map: OrderedMap<&str, i32> = [("z", 26), ("a", 1), ("m", 13)].into();
    let entries: Vec<(&str, i32)> = map.iter().map(|(key, value)| (*key, *value)).collect();
    assert_eq!(entries, vec![("z", 26), ("a", 1), ("m", 13)]);

    let reversed: Vec<&str> = map.keys().rev().copied().collect();
    assert_eq!(reversed, vec!["m", "a", "z"]);
    assert_eq!(map.values().len(), 3);

    let owned: Vec<(&str, i32)> = map.into_iter().collect();
    assert_eq!(owned, vec![("z", 26), ("a", 1), ("m", 13)]);
}

#[rstest]
fn test_display_and_debug() {
    let map: OrderedMap<&str, i32> = [("b", 2), ("a", 1)].into();
    assert_eq!(format!("{map}"), "{b: 2, a: 1}");
    assert_eq!(format!("{map:?}"), r#"{"b": 2, "a": 1}"#);
}

#[rstest]
fn test_frozen_map_is_send_and_sync() {
    fn assert_send_sync<T: Send + Sync>(_: &T) {}

    let map: OrderedMap<String, i32> = [("a".to_string(), 1)].into();
    assert_send_sync(&map);

    let handle = std::thread::spawn({
        let map = map.clone();
        move || map.get("a").copied()
    });
    assert_eq!(handle.join().unwrap(), Some(1));
}
