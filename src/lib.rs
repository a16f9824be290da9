//! # safekit
//!
//! Value-semantics ordered collections that are frozen by default, change
//! only through scoped `modify` transactions, and a normalizer that turns
//! nested composite values into deeply immutable trees.
//!
//! ## Overview
//!
//! - **Collections**: [`OrderedSequence`](collections::OrderedSequence) and
//!   [`OrderedMap`](collections::OrderedMap), frozen containers whose mutable
//!   interface only exists inside a `modify` closure
//! - **Normalization**: [`normalize`](normalize::normalize) walks a value tree
//!   and rebuilds it out of frozen containers and frozen leaf copies
//! - **Structural hashing**: [`combine_hash`](hash::combine_hash), the
//!   order-sensitive combiner behind the containers' hashes
//!
//! ## Feature Flags
//!
//! - `collections`: Frozen ordered containers (default)
//! - `normalize`: Deep immutability normalization (default)
//! - `serde`: `Serialize`/`Deserialize` for containers and normalizer settings
//! - `fxhash`: Use `rustc-hash` for the map's key lookup table
//! - `ahash`: Use `ahash` for the map's key lookup table
//! - `full`: Enable `collections`, `normalize` and `serde`
//!
//! ## Example
//!
//! Working with a frozen map (`collections` feature):
//!
#![cfg_attr(
    feature = "collections",
    doc = r#"
```rust
use safekit::prelude::*;

let settings: OrderedMap<&str, i32> = OrderedMap::new();
let settings = settings.modify(|working| {
    working.set("width", 80);
    working.set("height", 24);
});
assert_eq!(settings.all_keys(), vec!["width", "height"]);
```
"#
)]
//!
//! Freezing a nested value tree (`normalize` feature):
//!
#![cfg_attr(
    feature = "normalize",
    doc = r#"
```rust
use safekit::prelude::*;

let tree: Value<&str, i64> = Value::map([
    ("a", Value::Leaf(1)),
    ("b", Value::sequence([Value::Leaf(2), Value::Leaf(3)])),
]);
let frozen = normalize(&tree, NonCopyablePolicy::Fail).unwrap();
assert_eq!(frozen.as_map().map(OrderedMap::len), Some(2));
```
"#
)]

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

/// Prelude module for convenient imports.
///
/// Re-exports commonly used types and functions.
///
/// # Usage
///
/// ```rust
/// use safekit::prelude::*;
/// ```
pub mod prelude {
    pub use crate::hash::{combine_hash, hash_of};

    #[cfg(feature = "collections")]
    pub use crate::collections::*;

    #[cfg(feature = "normalize")]
    pub use crate::normalize::*;
}

pub mod hash;

#[cfg(feature = "collections")]
pub mod collections;

#[cfg(feature = "normalize")]
pub mod normalize;
