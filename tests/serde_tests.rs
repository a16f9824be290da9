//! Integration tests for serde support.
//!
//! Round-trips the frozen containers and the normalizer configuration
//! through `serde_json`.

#![cfg(all(feature = "serde", feature = "normalize"))]

use rstest::rstest;
use safekit::collections::{OrderedMap, OrderedSequence};
use safekit::normalize::{NonCopyablePolicy, Normalizer};

// =============================================================================
// OrderedSequence
// =============================================================================

#[rstest]
fn test_sequence_json_roundtrip() {
    let sequence: OrderedSequence<i32> = (1..=100).collect();
    let json = serde_json::to_string(&sequence).unwrap();
    let restored: OrderedSequence<i32> = serde_json::from_str(&json).unwrap();
    assert_eq!(sequence, restored);
}

#[rstest]
fn test_sequence_serializes_as_array() {
    let sequence: OrderedSequence<&str> = ["x", "y"].into();
    assert_eq!(serde_json::to_string(&sequence).unwrap(), r#"["x","y"]"#);
}

#[rstest]
fn test_sequence_nested_structures() {
    let inner1: OrderedSequence<i32> = [1, 2].into();
    let inner2: OrderedSequence<i32> = [3].into();
    let outer: OrderedSequence<OrderedSequence<i32>> = [inner1, inner2].into();

    let json = serde_json::to_string(&outer).unwrap();
    let restored: OrderedSequence<OrderedSequence<i32>> = serde_json::from_str(&json).unwrap();
    assert_eq!(outer, restored);
}

// =============================================================================
// OrderedMap
// =============================================================================

#[rstest]
fn test_map_json_roundtrip_preserves_order() {
    let map: OrderedMap<String, i32> = OrderedMap::new().modify(|working| {
        for index in (0..50).rev() {
            working.set(format!("key{index}"), index);
        }
    });

    let json = serde_json::to_string(&map).unwrap();
    let restored: OrderedMap<String, i32> = serde_json::from_str(&json).unwrap();
    assert_eq!(map, restored);
    assert_eq!(restored.first(), Some((&"key49".to_string(), &49)));
}

#[rstest]
fn test_map_serializes_in_insertion_order() {
    let map: OrderedMap<&str, i32> = [("z", 1), ("a", 2)].into();
    assert_eq!(serde_json::to_string(&map).unwrap(), r#"{"z":1,"a":2}"#);
}

#[rstest]
fn test_map_duplicate_json_keys_upsert() {
    let restored: OrderedMap<String, i32> =
        serde_json::from_str(r#"{"a":1,"b":2,"a":3}"#).unwrap();
    assert_eq!(restored.all_keys(), vec!["a".to_string(), "b".to_string()]);
    assert_eq!(restored.get("a"), Some(&3));
}

#[rstest]
fn test_map_with_sequence_values() {
    let map: OrderedMap<String, OrderedSequence<i32>> = [
        ("list".to_string(), [1, 2, 3].into()),
        ("empty".to_string(), OrderedSequence::new()),
    ]
    .into();

    let json = serde_json::to_string(&map).unwrap();
    let restored: OrderedMap<String, OrderedSequence<i32>> = serde_json::from_str(&json).unwrap();
    assert_eq!(map, restored);
}

// =============================================================================
// Normalizer configuration
// =============================================================================

#[rstest]
#[case(NonCopyablePolicy::Fail, r#""fail""#)]
#[case(NonCopyablePolicy::Omit, r#""omit""#)]
fn test_policy_names(#[case] policy: NonCopyablePolicy, #[case] expected: &str) {
    assert_eq!(serde_json::to_string(&policy).unwrap(), expected);
    let restored: NonCopyablePolicy = serde_json::from_str(expected).unwrap();
    assert_eq!(restored, policy);
}

#[rstest]
fn test_normalizer_from_partial_config() {
    let normalizer: Normalizer = serde_json::from_str(r#"{"policy":"omit"}"#).unwrap();
    assert_eq!(normalizer.policy(), NonCopyablePolicy::Omit);
    assert_eq!(normalizer.max_depth(), Normalizer::DEFAULT_MAX_DEPTH);
}

#[rstest]
fn test_normalizer_roundtrip() {
    let normalizer = Normalizer::new()
        .with_policy(NonCopyablePolicy::Omit)
        .with_max_depth(8);
    let json = serde_json::to_string(&normalizer).unwrap();
    assert_eq!(json, r#"{"policy":"omit","max_depth":8}"#);
    let restored: Normalizer = serde_json::from_str(&json).unwrap();
    assert_eq!(restored, normalizer);
}
