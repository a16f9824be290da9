//! Deep immutability normalization.
//!
//! A value assembled out of plain `Vec`s, entry lists and shared cells is
//! easy to build but unsafe to hand to another owner: anything reachable
//! from it may still change. The normalizer rebuilds such a value as a
//! [`FrozenValue`], a tree of frozen [`OrderedSequence`](crate::collections::OrderedSequence)s
//! and [`OrderedMap`](crate::collections::OrderedMap)s whose leaves are
//! independent copies.
//!
//! # Shapes
//!
//! The walk is driven by [`Normalize::shape`], which every input type
//! implements to declare itself absent, a leaf, a sequence or a map.
//! [`Value`] is the ready-made input tree and [`FrozenValue`] is itself
//! normalizable.
//!
//! # Leaves
//!
//! Each leaf type states through [`Leaf::copy_leaf`] whether it has an
//! immutable copy, a mutable copy (kept as-is and treated as frozen) or no
//! copy at all. What happens to a leaf with no copy is decided by the
//! [`NonCopyablePolicy`]:
//!
//! - [`Fail`](NonCopyablePolicy::Fail) aborts with a
//!   [`NonCopyableValueError`] naming the path, type and value
//! - [`Omit`](NonCopyablePolicy::Omit) drops the value (and its map key)
//!
//! # Example
//!
//! ```rust
//! use safekit::normalize::{NonCopyablePolicy, Value, normalize};
//!
//! let tree: Value<String, String> = Value::map([
//!     ("name".to_string(), Value::Leaf("edge".to_string())),
//!     ("tags".to_string(), Value::sequence([Value::Leaf("a".to_string())])),
//! ]);
//!
//! let frozen = normalize(&tree, NonCopyablePolicy::Fail).unwrap();
//! let again = normalize(&frozen, NonCopyablePolicy::Fail).unwrap();
//! assert_eq!(frozen, again);
//! ```

mod error;
mod leaf;
mod normalizer;
mod value;

pub use error::{NonCopyableValueError, NormalizeError, PathSegment, ValuePath};
pub use leaf::{Leaf, LeafCopy};
pub use normalizer::{NonCopyablePolicy, Normalized, Normalizer, normalize};
pub use value::{FrozenValue, Normalize, Shape, Value};
