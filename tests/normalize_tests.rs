//! Integration tests for deep immutability normalization.

#![cfg(feature = "normalize")]

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

use rstest::{fixture, rstest};
use safekit::collections::OrderedMap;
use safekit::normalize::{
    FrozenValue, Leaf, LeafCopy, NonCopyablePolicy, NormalizeError, Normalizer, Value, normalize,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Routes the crate's log output to the test harness so that `--nocapture`
/// runs show the normalizer's decisions.
#[fixture]
fn tracing_output() {
    let _ = tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new("safekit=trace"))
        .with(tracing_subscriber::fmt::layer().with_test_writer())
        .try_init();
}

/// A configuration leaf. `Handle` stands for a resource that cannot be
/// duplicated.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum Setting {
    Number(i64),
    Text(String),
    Handle(u32),
}

impl Leaf for Setting {
    type Frozen = Self;

    fn copy_leaf(&self) -> LeafCopy<Self> {
        match self {
            Self::Number(_) | Self::Text(_) => LeafCopy::Immutable(self.clone()),
            Self::Handle(_) => LeafCopy::NotCopyable,
        }
    }
}

fn number(value: i64) -> Value<String, Setting> {
    Value::Leaf(Setting::Number(value))
}

fn key(name: &str) -> String {
    name.to_string()
}

fn abc_tree() -> Value<String, Setting> {
    Value::map([
        (key("a"), number(1)),
        (key("b"), Value::Leaf(Setting::Handle(7))),
        (key("c"), number(3)),
    ])
}

#[rstest]
fn test_omit_drops_entry_and_key(#[from(tracing_output)] _subscriber: ()) {
    let frozen = normalize(&abc_tree(), NonCopyablePolicy::Omit).unwrap();
    let map = frozen.as_map().unwrap();

    assert_eq!(map.all_keys(), vec![key("a"), key("c")]);
    assert_eq!(map.get("a"), Some(&FrozenValue::Leaf(Setting::Number(1))));
    assert_eq!(map.get("c"), Some(&FrozenValue::Leaf(Setting::Number(3))));
    assert!(!map.contains_key("b"));
}

#[rstest]
fn test_fail_reports_offending_value(#[from(tracing_output)] _subscriber: ()) {
    let error = normalize(&abc_tree(), NonCopyablePolicy::Fail).unwrap_err();

    let NormalizeError::NonCopyable(error) = error else {
        panic!("expected a non-copyable error, got {error:?}");
    };
    assert_eq!(error.path.to_string(), r#"$["b"]"#);
    assert_eq!(error.value, "Handle(7)");
    assert!(error.type_name.contains("Setting"));
}

#[rstest]
fn test_absent_root_stays_absent() {
    let tree: Value<String, Setting> = Value::Absent;
    let frozen = normalize(&tree, NonCopyablePolicy::Fail).unwrap();
    assert!(frozen.is_absent());
}

#[rstest]
fn test_nested_composites_are_frozen_in_order() {
    let tree = Value::map([
        (key("z"), Value::sequence([number(1), number(2)])),
        (
            key("a"),
            Value::map([(key("inner"), Value::Leaf(Setting::Text(key("t"))))]),
        ),
    ]);

    let frozen = normalize(&tree, NonCopyablePolicy::Fail).unwrap();
    let root = frozen.as_map().unwrap();
    assert_eq!(root.all_keys(), vec![key("z"), key("a")]);

    let sequence = root.get("z").and_then(FrozenValue::as_sequence).unwrap();
    assert_eq!(
        sequence.all_objects(),
        vec![
            FrozenValue::Leaf(Setting::Number(1)),
            FrozenValue::Leaf(Setting::Number(2)),
        ]
    );

    let inner = root.get("a").and_then(FrozenValue::as_map).unwrap();
    assert_eq!(
        inner.get("inner").and_then(FrozenValue::as_leaf),
        Some(&Setting::Text(key("t")))
    );
}

#[rstest]
fn test_source_mutation_after_normalize_is_not_observed() {
    let mut tree = Value::sequence([number(1)]);
    let frozen = normalize(&tree, NonCopyablePolicy::Fail).unwrap();

    if let Value::Sequence(elements) = &mut tree {
        elements.push(number(2));
        elements[0] = number(100);
    }

    let sequence = frozen.as_sequence().unwrap();
    assert_eq!(sequence.len(), 1);
    assert_eq!(sequence.get(0), Some(&FrozenValue::Leaf(Setting::Number(1))));
}

#[rstest]
fn test_omit_inside_nested_sequence_keeps_siblings() {
    let tree = Value::map([(
        key("handles"),
        Value::sequence([
            Value::Leaf(Setting::Handle(1)),
            number(2),
            Value::Leaf(Setting::Handle(3)),
        ]),
    )]);

    let frozen = normalize(&tree, NonCopyablePolicy::Omit).unwrap();
    let handles = frozen
        .as_map()
        .and_then(|map| map.get("handles"))
        .and_then(FrozenValue::as_sequence)
        .unwrap();
    assert_eq!(handles.all_objects(), vec![FrozenValue::Leaf(Setting::Number(2))]);
}

#[rstest]
fn test_depth_limit_reports_path() {
    let tree = Value::map([(key("a"), Value::sequence([Value::sequence([number(1)])]))]);
    let error = Normalizer::new().with_max_depth(2).normalize(&tree).unwrap_err();

    assert!(matches!(
        error,
        NormalizeError::DepthLimitExceeded { limit: 2, .. }
    ));
    assert_eq!(error.path().to_string(), r#"$["a"][0][0]"#);
}

#[rstest]
fn test_deeply_nested_value_within_default_limit() {
    let mut tree = number(0);
    for _ in 0..Normalizer::DEFAULT_MAX_DEPTH {
        tree = Value::sequence([tree]);
    }
    assert!(normalize(&tree, NonCopyablePolicy::Fail).is_ok());

    let tree = Value::sequence([tree]);
    assert!(matches!(
        normalize(&tree, NonCopyablePolicy::Fail),
        Err(NormalizeError::DepthLimitExceeded { .. })
    ));
}

// =============================================================================
// Standard leaves
// =============================================================================

#[rstest]
fn test_ref_cell_leaves_are_copied(#[from(tracing_output)] _subscriber: ()) {
    let shared = Rc::new(RefCell::new(vec![1, 2]));
    let tree: Value<&str, Rc<RefCell<Vec<i32>>>> = Value::map([("list", Value::Leaf(Rc::clone(&shared)))]);

    let frozen = normalize(&tree, NonCopyablePolicy::Fail).unwrap();
    shared.borrow_mut().push(3);

    let copy = frozen
        .as_map()
        .and_then(|map| map.get("list"))
        .and_then(FrozenValue::as_leaf)
        .unwrap();
    assert!(!Rc::ptr_eq(copy, &shared));
    assert_eq!(*copy.borrow(), vec![1, 2]);
}

#[rstest]
fn test_borrowed_ref_cell_is_not_copyable() {
    let shared = Rc::new(RefCell::new(0));
    let tree: Value<&str, Rc<RefCell<i32>>> = Value::sequence([Value::Leaf(Rc::clone(&shared))]);

    let _guard = shared.borrow_mut();
    let error = normalize(&tree, NonCopyablePolicy::Fail).unwrap_err();
    assert_eq!(error.path().to_string(), "$[0]");
    assert!(error.to_string().contains("RefCell"));
}

#[rstest]
fn test_arc_leaves_are_shared() {
    let shared: Arc<str> = Arc::from("read-only");
    let tree: Value<&str, Arc<str>> = Value::sequence([Value::Leaf(Arc::clone(&shared))]);

    let frozen = normalize(&tree, NonCopyablePolicy::Fail).unwrap();
    let copy = frozen
        .as_sequence()
        .and_then(|sequence| sequence.get(0))
        .and_then(FrozenValue::as_leaf)
        .unwrap();
    assert!(Arc::ptr_eq(copy, &shared));
}

// =============================================================================
// Frozen output
// =============================================================================

#[rstest]
fn test_frozen_tree_crosses_threads() {
    let tree: Value<String, String> = Value::map([(key("name"), Value::Leaf(key("edge")))]);
    let frozen = normalize(&tree, NonCopyablePolicy::Fail).unwrap();

    let handle = std::thread::spawn(move || {
        frozen
            .as_map()
            .and_then(|map| map.get("name"))
            .and_then(FrozenValue::as_leaf)
            .cloned()
    });
    assert_eq!(handle.join().unwrap(), Some(key("edge")));
}

#[rstest]
fn test_frozen_map_can_seed_a_transaction() {
    let tree: Value<String, i64> = Value::map([(key("a"), Value::Leaf(1))]);
    let frozen = normalize(&tree, NonCopyablePolicy::Fail).unwrap();
    let map: &OrderedMap<String, FrozenValue<String, i64>> = frozen.as_map().unwrap();

    let extended = map.modify(|working| {
        working.set(key("b"), FrozenValue::Leaf(2));
    });

    assert_eq!(map.len(), 1);
    assert_eq!(extended.all_keys(), vec![key("a"), key("b")]);
}
