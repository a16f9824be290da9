//! The deep immutability normalizer.

use std::any::type_name;
use std::fmt;
use std::hash::Hash;

use smallvec::SmallVec;

use super::error::{NonCopyableValueError, NormalizeError, PathSegment, ValuePath};
use super::leaf::{Leaf, LeafCopy};
use super::value::{FrozenValue, Normalize, Shape};
use crate::collections::{OrderedMap, OrderedSequence};

/// The frozen tree produced by normalizing an `N`.
pub type Normalized<N> =
    FrozenValue<<N as Normalize>::Key, <<N as Normalize>::Leaf as Leaf>::Frozen>;

/// What the normalizer does with a leaf that cannot be copied.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "snake_case")
)]
pub enum NonCopyablePolicy {
    /// Abort the whole normalization with a [`NonCopyableValueError`].
    #[default]
    Fail,
    /// Drop the value. A map entry is dropped together with its key and a
    /// sequence closes the gap.
    Omit,
}

/// A configured normalizer.
///
/// # Examples
///
/// ```rust
/// use safekit::normalize::{NonCopyablePolicy, Normalizer, NormalizeError, Value};
///
/// let normalizer = Normalizer::new()
///     .with_policy(NonCopyablePolicy::Omit)
///     .with_max_depth(1);
///
/// let shallow: Value<&str, i32> = Value::sequence([Value::Leaf(1)]);
/// assert!(normalizer.normalize(&shallow).is_ok());
///
/// let deep: Value<&str, i32> = Value::sequence([Value::sequence([Value::Leaf(1)])]);
/// assert!(matches!(
///     normalizer.normalize(&deep),
///     Err(NormalizeError::DepthLimitExceeded { limit: 1, .. })
/// ));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(default)
)]
pub struct Normalizer {
    policy: NonCopyablePolicy,
    max_depth: usize,
}

/// One step of the path from the root to the value being visited.
enum Step<'a, K> {
    Index(usize),
    Key(&'a K),
}

type Trail<'a, K> = SmallVec<[Step<'a, K>; 16]>;

fn render_trail<K: fmt::Debug>(trail: &Trail<'_, K>) -> ValuePath {
    trail
        .iter()
        .map(|step| match step {
            Step::Index(index) => PathSegment::Index(*index),
            Step::Key(key) => PathSegment::Key(format!("{key:?}")),
        })
        .collect::<Vec<_>>()
        .into()
}

impl Normalizer {
    /// The nesting depth allowed by default.
    pub const DEFAULT_MAX_DEPTH: usize = 256;

    /// Creates a normalizer with the [`Fail`](NonCopyablePolicy::Fail) policy
    /// and [`DEFAULT_MAX_DEPTH`](Self::DEFAULT_MAX_DEPTH).
    #[must_use]
    pub const fn new() -> Self {
        Self {
            policy: NonCopyablePolicy::Fail,
            max_depth: Self::DEFAULT_MAX_DEPTH,
        }
    }

    /// Sets the policy for leaves that cannot be copied.
    #[must_use]
    pub const fn with_policy(mut self, policy: NonCopyablePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Sets the maximum nesting depth. The root is at depth 0 and each
    /// sequence element or map value is one deeper than its container.
    #[must_use]
    pub const fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Returns the policy for leaves that cannot be copied.
    #[must_use]
    pub const fn policy(&self) -> NonCopyablePolicy {
        self.policy
    }

    /// Returns the maximum nesting depth.
    #[must_use]
    pub const fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Rebuilds `value` as a deeply immutable tree.
    ///
    /// Sequences become [`OrderedSequence`]s and maps become [`OrderedMap`]s
    /// in the order they iterate, with every child normalized the same way.
    /// Leaves are replaced by their [`Leaf::copy_leaf`] copies. Absent values
    /// stay absent, and a root omitted under
    /// [`Omit`](NonCopyablePolicy::Omit) normalizes to
    /// [`FrozenValue::Absent`].
    ///
    /// # Errors
    ///
    /// - [`NormalizeError::NonCopyable`] for the first leaf without a copy,
    ///   under the [`Fail`](NonCopyablePolicy::Fail) policy
    /// - [`NormalizeError::DepthLimitExceeded`] when the value nests deeper
    ///   than [`max_depth`](Self::max_depth)
    pub fn normalize<N>(&self, value: &N) -> Result<Normalized<N>, NormalizeError>
    where
        N: Normalize + ?Sized,
        N::Key: Clone + Eq + Hash + fmt::Debug,
        N::Leaf: fmt::Debug,
    {
        let span = tracing::debug_span!(
            "normalize",
            policy = ?self.policy,
            max_depth = self.max_depth
        );
        let _entered = span.enter();

        let mut trail = Trail::new();
        let normalized = self.visit(value, &mut trail)?;
        Ok(normalized.unwrap_or(FrozenValue::Absent))
    }

    fn visit<'a, N>(
        &self,
        value: &'a N,
        trail: &mut Trail<'a, N::Key>,
    ) -> Result<Option<Normalized<N>>, NormalizeError>
    where
        N: Normalize + ?Sized,
        N::Key: Clone + Eq + Hash + fmt::Debug,
        N::Leaf: fmt::Debug,
    {
        if trail.len() > self.max_depth {
            return Err(NormalizeError::DepthLimitExceeded {
                limit: self.max_depth,
                path: render_trail(trail),
            });
        }

        match value.shape() {
            Shape::Absent => Ok(Some(FrozenValue::Absent)),
            Shape::Leaf(leaf) => self.copy_leaf(leaf, trail),
            Shape::Sequence(elements) => {
                let mut survivors = Vec::new();
                for (index, element) in elements.enumerate() {
                    trail.push(Step::Index(index));
                    let normalized = self.visit(element, trail);
                    trail.pop();
                    if let Some(normalized) = normalized? {
                        survivors.push(normalized);
                    }
                }
                Ok(Some(FrozenValue::Sequence(OrderedSequence::from(
                    survivors,
                ))))
            }
            Shape::Map(entries) => {
                let mut survivors = Vec::new();
                for (key, element) in entries {
                    trail.push(Step::Key(key));
                    let normalized = self.visit(element, trail);
                    trail.pop();
                    if let Some(normalized) = normalized? {
                        survivors.push((key.clone(), normalized));
                    }
                }
                Ok(Some(FrozenValue::Map(
                    survivors.into_iter().collect::<OrderedMap<_, _>>(),
                )))
            }
        }
    }

    fn copy_leaf<K, L>(
        &self,
        leaf: &L,
        trail: &Trail<'_, K>,
    ) -> Result<Option<FrozenValue<K, L::Frozen>>, NormalizeError>
    where
        K: fmt::Debug,
        L: Leaf + fmt::Debug,
    {
        match leaf.copy_leaf() {
            LeafCopy::Immutable(copy) => Ok(Some(FrozenValue::Leaf(copy))),
            LeafCopy::Mutable(copy) => {
                tracing::trace!(
                    path = %render_trail(trail),
                    type_name = type_name::<L>(),
                    "leaf copied through its mutable copy"
                );
                Ok(Some(FrozenValue::Leaf(copy)))
            }
            LeafCopy::NotCopyable => match self.policy {
                NonCopyablePolicy::Fail => {
                    let error = NonCopyableValueError::new(
                        render_trail(trail),
                        type_name::<L>(),
                        format!("{leaf:?}"),
                    );
                    tracing::debug!(%error, "normalization aborted");
                    Err(error.into())
                }
                NonCopyablePolicy::Omit => {
                    tracing::debug!(
                        path = %render_trail(trail),
                        type_name = type_name::<L>(),
                        "omitting leaf that cannot be copied"
                    );
                    Ok(None)
                }
            },
        }
    }
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::new()
    }
}

/// Rebuilds `value` as a deeply immutable tree with the given policy and the
/// default depth limit.
///
/// # Errors
///
/// See [`Normalizer::normalize`].
///
/// # Examples
///
/// ```rust
/// use safekit::normalize::{NonCopyablePolicy, Value, normalize};
/// use std::cell::RefCell;
/// use std::rc::Rc;
///
/// let locked = Rc::new(RefCell::new(2));
/// let tree = Value::map([
///     ("a", Value::Leaf(Rc::new(RefCell::new(1)))),
///     ("b", Value::Leaf(Rc::clone(&locked))),
///     ("c", Value::Leaf(Rc::new(RefCell::new(3)))),
/// ]);
///
/// let _guard = locked.borrow_mut();
/// assert!(normalize(&tree, NonCopyablePolicy::Fail).is_err());
///
/// let frozen = normalize(&tree, NonCopyablePolicy::Omit).unwrap();
/// assert_eq!(frozen.as_map().unwrap().all_keys(), vec!["a", "c"]);
/// ```
pub fn normalize<N>(value: &N, policy: NonCopyablePolicy) -> Result<Normalized<N>, NormalizeError>
where
    N: Normalize + ?Sized,
    N::Key: Clone + Eq + Hash + fmt::Debug,
    N::Leaf: fmt::Debug,
{
    Normalizer::new().with_policy(policy).normalize(value)
}
