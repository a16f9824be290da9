//! Value trees and their declared shapes.
//!
//! The normalizer never inspects values at runtime to guess what they are.
//! Every normalizable type declares its shape through [`Normalize::shape`],
//! a closed set of variants: absent, leaf, sequence or map.

use super::leaf::Leaf;
use crate::collections::{OrderedMap, OrderedSequence};

/// The declared shape of a normalizable value.
pub enum Shape<'a, K, N: ?Sized, L> {
    /// No value.
    Absent,
    /// A leaf to be copied.
    Leaf(&'a L),
    /// An ordered sequence of child values.
    Sequence(Box<dyn Iterator<Item = &'a N> + 'a>),
    /// An associative container of `(key, child value)` pairs, in the order
    /// the container iterates them.
    Map(Box<dyn Iterator<Item = (&'a K, &'a N)> + 'a>),
}

/// A value the normalizer can walk.
///
/// # Examples
///
/// A document type that maps onto the closed shape set:
///
/// ```rust
/// use safekit::normalize::{Normalize, NonCopyablePolicy, Shape, normalize};
///
/// enum Document {
///     Text(String),
///     Section(Vec<(String, Document)>),
/// }
///
/// impl Normalize for Document {
///     type Key = String;
///     type Leaf = String;
///
///     fn shape(&self) -> Shape<'_, String, Self, String> {
///         match self {
///             Self::Text(text) => Shape::Leaf(text),
///             Self::Section(children) => {
///                 Shape::Map(Box::new(children.iter().map(|(key, child)| (key, child))))
///             }
///         }
///     }
/// }
///
/// let document = Document::Section(vec![("title".to_string(), Document::Text("Intro".to_string()))]);
/// let frozen = normalize(&document, NonCopyablePolicy::Fail).unwrap();
/// assert_eq!(
///     frozen.as_map().and_then(|map| map.get("title")).and_then(|title| title.as_leaf()),
///     Some(&"Intro".to_string())
/// );
/// ```
pub trait Normalize {
    /// The key type of map-shaped values.
    type Key;
    /// The leaf type.
    type Leaf: Leaf;

    /// Declares the shape of this value.
    fn shape(&self) -> Shape<'_, Self::Key, Self, Self::Leaf>;
}

// =============================================================================
// Value
// =============================================================================

/// A mutable value tree, as it is assembled before being handed across an
/// ownership boundary.
///
/// Maps are plain entry lists; when normalized, a key that appears twice
/// keeps its first position and its last value.
///
/// # Examples
///
/// ```rust
/// use safekit::normalize::Value;
///
/// let mut tree: Value<&str, i32> = Value::map([("a", Value::Leaf(1))]);
/// if let Value::Map(entries) = &mut tree {
///     entries.push(("b", Value::sequence([Value::Leaf(2), Value::Absent])));
/// }
/// assert!(!tree.is_absent());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub enum Value<K, L> {
    /// No value.
    #[default]
    Absent,
    /// A leaf value.
    Leaf(L),
    /// An ordered list of values.
    Sequence(Vec<Self>),
    /// An ordered list of `(key, value)` entries.
    Map(Vec<(K, Self)>),
}

impl<K, L> Value<K, L> {
    /// Creates a sequence value.
    pub fn sequence<I>(elements: I) -> Self
    where
        I: IntoIterator<Item = Self>,
    {
        Self::Sequence(elements.into_iter().collect())
    }

    /// Creates a map value.
    pub fn map<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, Self)>,
    {
        Self::Map(entries.into_iter().collect())
    }

    /// Returns `true` for [`Value::Absent`].
    #[must_use]
    pub const fn is_absent(&self) -> bool {
        matches!(self, Self::Absent)
    }
}

impl<K, L: Leaf> Normalize for Value<K, L> {
    type Key = K;
    type Leaf = L;

    fn shape(&self) -> Shape<'_, K, Self, L> {
        match self {
            Value::Absent => Shape::Absent,
            Value::Leaf(leaf) => Shape::Leaf(leaf),
            Value::Sequence(elements) => Shape::Sequence(Box::new(elements.iter())),
            Value::Map(entries) => {
                Shape::Map(Box::new(entries.iter().map(|(key, value)| (key, value))))
            }
        }
    }
}

// =============================================================================
// FrozenValue
// =============================================================================

/// A deeply immutable value tree, as produced by the normalizer.
///
/// Every composite is a frozen [`OrderedSequence`] or [`OrderedMap`] and
/// every leaf is a frozen copy. A `FrozenValue` is itself normalizable, so
/// normalizing it again yields an equal tree.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FrozenValue<K, F> {
    /// No value.
    Absent,
    /// A frozen leaf.
    Leaf(F),
    /// A frozen sequence.
    Sequence(OrderedSequence<Self>),
    /// A frozen map.
    Map(OrderedMap<K, Self>),
}

static_assertions::assert_impl_all!(FrozenValue<String, String>: Send, Sync);

impl<K, F> FrozenValue<K, F> {
    /// Returns `true` for [`FrozenValue::Absent`].
    #[must_use]
    pub const fn is_absent(&self) -> bool {
        matches!(self, Self::Absent)
    }

    /// Returns the leaf, if this is one.
    #[must_use]
    pub const fn as_leaf(&self) -> Option<&F> {
        match self {
            Self::Leaf(leaf) => Some(leaf),
            _ => None,
        }
    }

    /// Returns the sequence, if this is one.
    #[must_use]
    pub const fn as_sequence(&self) -> Option<&OrderedSequence<Self>> {
        match self {
            Self::Sequence(sequence) => Some(sequence),
            _ => None,
        }
    }

    /// Returns the map, if this is one.
    #[must_use]
    pub const fn as_map(&self) -> Option<&OrderedMap<K, Self>> {
        match self {
            Self::Map(map) => Some(map),
            _ => None,
        }
    }
}

impl<K, F> Default for FrozenValue<K, F> {
    fn default() -> Self {
        Self::Absent
    }
}

impl<K, F: Leaf> Normalize for FrozenValue<K, F> {
    type Key = K;
    type Leaf = F;

    fn shape(&self) -> Shape<'_, K, Self, F> {
        match self {
            FrozenValue::Absent => Shape::Absent,
            FrozenValue::Leaf(leaf) => Shape::Leaf(leaf),
            FrozenValue::Sequence(sequence) => Shape::Sequence(Box::new(sequence.iter())),
            FrozenValue::Map(map) => Shape::Map(Box::new(map.iter())),
        }
    }
}
