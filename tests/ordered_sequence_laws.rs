#![cfg(feature = "collections")]
//! Property-based tests for OrderedSequence laws.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use proptest::prelude::*;
use safekit::collections::OrderedSequence;

fn hash_value<T: Hash>(value: &T) -> u64 {
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    hasher.finish()
}

proptest! {
    /// Round Law: all_objects returns the elements in index order
    #[test]
    fn prop_all_objects_matches_source(elements in prop::collection::vec(any::<i32>(), 0..50)) {
        let sequence: OrderedSequence<i32> = elements.clone().into();
        prop_assert_eq!(sequence.len(), elements.len());
        prop_assert_eq!(sequence.all_objects(), elements);
    }

    /// Set Law: set stores at the index in range, at the end otherwise
    #[test]
    fn prop_set_returns_actual_position(
        elements in prop::collection::vec(any::<i32>(), 0..30),
        index in 0_usize..60,
        value in any::<i32>()
    ) {
        let sequence: OrderedSequence<i32> = elements.clone().into();
        let mut stored_at = None;
        let updated = sequence.modify(|working| {
            stored_at = Some(working.set(index, value));
        });

        let expected_position = index.min(elements.len());
        prop_assert_eq!(stored_at, Some(expected_position));
        prop_assert_eq!(updated.get(expected_position), Some(&value));

        let expected_len = if index < elements.len() { elements.len() } else { elements.len() + 1 };
        prop_assert_eq!(updated.len(), expected_len);
    }

    /// Isolation Law: modify never alters the sequence it was called on
    #[test]
    fn prop_modify_leaves_original_unchanged(
        elements in prop::collection::vec(any::<i32>(), 0..30),
        pushes in prop::collection::vec(any::<i32>(), 0..10)
    ) {
        let original: OrderedSequence<i32> = elements.clone().into();
        let updated = original.modify(|working| {
            working.clear();
            working.extend(pushes.iter().copied());
        });

        prop_assert_eq!(original.all_objects(), elements);
        prop_assert_eq!(updated.all_objects(), pushes);
    }

    /// Hash Consistency Law: equal sequences hash equally
    #[test]
    fn prop_equal_sequences_hash_equally(elements in prop::collection::vec(any::<i32>(), 0..50)) {
        let first: OrderedSequence<i32> = elements.iter().copied().collect();
        let second: OrderedSequence<i32> = elements.into();

        prop_assert_eq!(&first, &second);
        prop_assert_eq!(first.structural_hash(), second.structural_hash());
        prop_assert_eq!(hash_value(&first), hash_value(&second));
    }

    /// Order Sensitivity Law: a sequence equals its reverse only if it is a palindrome
    #[test]
    fn prop_reverse_equality_iff_palindrome(elements in prop::collection::vec(0_i32..4, 0..12)) {
        let forward: OrderedSequence<i32> = elements.iter().copied().collect();
        let backward: OrderedSequence<i32> = elements.iter().rev().copied().collect();
        let palindrome = elements.iter().eq(elements.iter().rev());

        prop_assert_eq!(forward == backward, palindrome);
    }
}
