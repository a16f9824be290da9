//! Frozen index-ordered sequence.
//!
//! This module provides [`OrderedSequence`], an immutable list addressed by
//! zero-based contiguous indices, and [`TransientOrderedSequence`], the
//! working copy handed out by [`OrderedSequence::modify`].
//!
//! # Overview
//!
//! - O(1) `get`, `len`, `is_empty` and `clone`
//! - O(N) `modify` (the contents are copied into the working copy)
//! - Setting past the end appends; no holes are ever created
//!
//! # Examples
//!
//! ```rust
//! use safekit::collections::OrderedSequence;
//!
//! let sequence: OrderedSequence<char> = ['x', 'y'].into();
//! let updated = sequence.modify(|working| {
//!     working.set(0, 'w');
//!     working.set(5, 'z'); // Past the end: appended at index 2
//! });
//!
//! assert_eq!(sequence.all_objects(), vec!['x', 'y']);
//! assert_eq!(updated.all_objects(), vec!['w', 'y', 'z']);
//! assert_eq!(updated.get(5), None);
//! ```

use std::fmt;
use std::hash::{Hash, Hasher};
use std::iter::{FromIterator, FusedIterator};
use std::marker::PhantomData;
use std::rc::Rc;
use std::sync::Arc;

use super::Mutability;
use crate::hash::{fold_field_hashes, hash_of};

// =============================================================================
// OrderedSequence Definition
// =============================================================================

/// A frozen, index-ordered sequence.
///
/// The elements live behind a shared pointer, so clones are cheap and may be
/// sent to other threads (when `T: Send + Sync`). The contents never change;
/// use [`modify`](Self::modify) to derive a changed copy.
///
/// # Time Complexity
///
/// | Operation     | Complexity |
/// |---------------|------------|
/// | `new`         | O(1)       |
/// | `get`         | O(1)       |
/// | `len`         | O(1)       |
/// | `clone`       | O(1)       |
/// | `all_objects` | O(N)       |
/// | `modify`      | O(N)       |
///
/// # Examples
///
/// ```rust
/// use safekit::collections::OrderedSequence;
///
/// let sequence: OrderedSequence<i32> = (1..=3).collect();
/// assert_eq!(sequence.len(), 3);
/// assert_eq!(sequence.get(1), Some(&2));
/// assert_eq!(sequence.get(3), None);
/// ```
pub struct OrderedSequence<T> {
    elements: Arc<Vec<T>>,
}

static_assertions::assert_impl_all!(OrderedSequence<i32>: Send, Sync);

impl<T> OrderedSequence<T> {
    /// Creates a new empty sequence.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use safekit::collections::OrderedSequence;
    ///
    /// let sequence: OrderedSequence<i32> = OrderedSequence::new();
    /// assert!(sequence.is_empty());
    /// ```
    #[must_use]
    pub fn new() -> Self {
        Self {
            elements: Arc::new(Vec::new()),
        }
    }

    /// Returns the number of elements.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    /// Returns `true` if the sequence contains no elements.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Returns the element at `index`, or `None` if the index is out of range.
    ///
    /// A missing index is a normal result, never an error.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use safekit::collections::OrderedSequence;
    ///
    /// let sequence: OrderedSequence<&str> = ["a", "b"].into();
    /// assert_eq!(sequence.get(0), Some(&"a"));
    /// assert_eq!(sequence.get(2), None);
    /// ```
    #[inline]
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&T> {
        self.elements.get(index)
    }

    /// Returns the first element, or `None` if the sequence is empty.
    #[inline]
    #[must_use]
    pub fn first(&self) -> Option<&T> {
        self.elements.first()
    }

    /// Returns the last element, or `None` if the sequence is empty.
    #[inline]
    #[must_use]
    pub fn last(&self) -> Option<&T> {
        self.elements.last()
    }

    /// Returns the elements as a slice.
    #[inline]
    #[must_use]
    pub fn as_slice(&self) -> &[T] {
        &self.elements
    }

    /// Returns an iterator over the elements in index order.
    ///
    /// Iteration is restartable: every call starts again from index 0 and
    /// yields the same elements, since the contents never change.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use safekit::collections::OrderedSequence;
    ///
    /// let sequence: OrderedSequence<i32> = [3, 1, 2].into();
    /// let collected: Vec<&i32> = sequence.iter().collect();
    /// assert_eq!(collected, vec![&3, &1, &2]);
    /// ```
    #[inline]
    pub fn iter(&self) -> OrderedSequenceIterator<'_, T> {
        OrderedSequenceIterator {
            inner: self.elements.iter(),
        }
    }

    /// Returns [`Mutability::Frozen`].
    #[inline]
    #[must_use]
    pub const fn mutability(&self) -> Mutability {
        Mutability::Frozen
    }
}

impl<T: PartialEq> OrderedSequence<T> {
    /// Returns `true` if the sequence contains an element equal to `element`.
    #[must_use]
    pub fn contains(&self, element: &T) -> bool {
        self.elements.contains(element)
    }
}

impl<T: Clone> OrderedSequence<T> {
    /// Returns a snapshot of all elements in index order.
    ///
    /// The returned `Vec` is owned by the caller and is unaffected by any
    /// later transaction.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use safekit::collections::OrderedSequence;
    ///
    /// let sequence: OrderedSequence<i32> = [1, 2].into();
    /// let snapshot = sequence.all_objects();
    /// let updated = sequence.modify(|working| {
    ///     working.push(3);
    /// });
    ///
    /// assert_eq!(snapshot, vec![1, 2]);
    /// assert_eq!(updated.all_objects(), vec![1, 2, 3]);
    /// ```
    #[must_use]
    pub fn all_objects(&self) -> Vec<T> {
        self.elements.as_ref().clone()
    }

    /// Derives a new sequence by mutating a working copy of this one.
    ///
    /// The elements are copied into a [`TransientOrderedSequence`], `mutation`
    /// receives exclusive access to it, and the working copy is then frozen
    /// and returned. `self` is never altered, and the working copy cannot
    /// outlive the call.
    ///
    /// If `mutation` panics, the working copy is dropped during unwinding and
    /// `self` remains valid and unchanged.
    ///
    /// # Complexity
    ///
    /// O(N) for the copy, plus the cost of `mutation`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use safekit::collections::OrderedSequence;
    ///
    /// let original: OrderedSequence<i32> = [1, 2, 3].into();
    /// let doubled = original.modify(|working| {
    ///     for index in 0..working.len() {
    ///         if let Some(element) = working.get_mut(index) {
    ///             *element *= 2;
    ///         }
    ///     }
    /// });
    ///
    /// assert_eq!(original.all_objects(), vec![1, 2, 3]);
    /// assert_eq!(doubled.all_objects(), vec![2, 4, 6]);
    /// ```
    #[must_use]
    pub fn modify<F>(&self, mutation: F) -> Self
    where
        F: FnOnce(&mut TransientOrderedSequence<T>),
    {
        let mut transient = TransientOrderedSequence::from_elements(self.all_objects());
        mutation(&mut transient);
        let frozen = transient.freeze();
        tracing::trace!(
            before = self.len(),
            after = frozen.len(),
            "sequence transaction committed"
        );
        frozen
    }

    /// Fallible variant of [`modify`](Self::modify).
    ///
    /// When `mutation` returns an error the transaction is aborted: the
    /// partially mutated working copy is discarded and the error is returned.
    ///
    /// # Errors
    ///
    /// Returns whatever error `mutation` returns.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use safekit::collections::OrderedSequence;
    ///
    /// let original: OrderedSequence<i32> = [1, 2].into();
    /// let result: Result<_, &str> = original.try_modify(|working| {
    ///     working.push(3);
    ///     Err("rejected")
    /// });
    ///
    /// assert_eq!(result, Err("rejected"));
    /// assert_eq!(original.len(), 2);
    /// ```
    pub fn try_modify<F, E>(&self, mutation: F) -> Result<Self, E>
    where
        F: FnOnce(&mut TransientOrderedSequence<T>) -> Result<(), E>,
    {
        let mut transient = TransientOrderedSequence::from_elements(self.all_objects());
        if let Err(error) = mutation(&mut transient) {
            tracing::debug!(
                len = self.len(),
                "sequence transaction aborted, working copy discarded"
            );
            return Err(error);
        }
        Ok(transient.freeze())
    }
}

impl<T: Hash> OrderedSequence<T> {
    /// Returns the structural hash of the sequence.
    ///
    /// Each element's hash is folded through
    /// [`combine_hash`](crate::hash::combine_hash) together with its index,
    /// seeded with the length. Equal sequences have equal structural hashes,
    /// and moving an element to another index changes the hash with high
    /// probability.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use safekit::collections::OrderedSequence;
    ///
    /// let forward: OrderedSequence<i32> = [1, 2].into();
    /// let backward: OrderedSequence<i32> = [2, 1].into();
    /// assert_ne!(forward.structural_hash(), backward.structural_hash());
    /// ```
    #[must_use]
    pub fn structural_hash(&self) -> u64 {
        fold_field_hashes(self.len(), self.iter().map(hash_of))
    }
}

// =============================================================================
// TransientOrderedSequence Definition
// =============================================================================

/// The working copy of an [`OrderedSequence`] inside a `modify` transaction.
///
/// It exposes the read interface of the frozen sequence plus the mutators.
/// There is no public constructor and no `Clone`: the only way to reach one
/// is the `&mut` borrow passed to [`OrderedSequence::modify`] or
/// [`OrderedSequence::try_modify`].
///
/// # Design
///
/// - `PhantomData<Rc<()>>` makes it `!Send` and `!Sync`
/// - `Clone` is intentionally not implemented
pub struct TransientOrderedSequence<T> {
    elements: Vec<T>,
    /// Marker to ensure `!Send` and `!Sync`.
    _marker: PhantomData<Rc<()>>,
}

static_assertions::assert_not_impl_any!(TransientOrderedSequence<i32>: Send, Sync, Clone);
static_assertions::assert_not_impl_any!(TransientOrderedSequence<String>: Send, Sync, Clone);

impl<T> TransientOrderedSequence<T> {
    const fn from_elements(elements: Vec<T>) -> Self {
        Self {
            elements,
            _marker: PhantomData,
        }
    }

    fn freeze(self) -> OrderedSequence<T> {
        OrderedSequence {
            elements: Arc::new(self.elements),
        }
    }

    /// Returns the number of elements.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    /// Returns `true` if the working copy contains no elements.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Returns the element at `index`, or `None` if the index is out of range.
    #[inline]
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&T> {
        self.elements.get(index)
    }

    /// Returns a mutable reference to the element at `index`.
    #[inline]
    pub fn get_mut(&mut self, index: usize) -> Option<&mut T> {
        self.elements.get_mut(index)
    }

    /// Returns the first element.
    #[inline]
    #[must_use]
    pub fn first(&self) -> Option<&T> {
        self.elements.first()
    }

    /// Returns the last element.
    #[inline]
    #[must_use]
    pub fn last(&self) -> Option<&T> {
        self.elements.last()
    }

    /// Returns the elements as a slice.
    #[inline]
    #[must_use]
    pub fn as_slice(&self) -> &[T] {
        &self.elements
    }

    /// Returns an iterator over the elements in index order.
    #[inline]
    pub fn iter(&self) -> OrderedSequenceIterator<'_, T> {
        OrderedSequenceIterator {
            inner: self.elements.iter(),
        }
    }

    /// Returns [`Mutability::Temporary`].
    #[inline]
    #[must_use]
    pub const fn mutability(&self) -> Mutability {
        Mutability::Temporary
    }

    /// Sets the element at `index`.
    ///
    /// Within `0..len` the element is replaced in place. At or past `len`
    /// the element is appended at the end: the requested index is ignored
    /// and no gap is materialized.
    ///
    /// Returns the index the element was actually stored at.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use safekit::collections::OrderedSequence;
    ///
    /// let sequence: OrderedSequence<&str> = ["x", "y"].into();
    /// let updated = sequence.modify(|working| {
    ///     assert_eq!(working.set(1, "Y"), 1);
    ///     assert_eq!(working.set(5, "z"), 2);
    /// });
    ///
    /// assert_eq!(updated.all_objects(), vec!["x", "Y", "z"]);
    /// ```
    pub fn set(&mut self, index: usize, element: T) -> usize {
        if let Some(slot) = self.elements.get_mut(index) {
            *slot = element;
            index
        } else {
            self.push(element)
        }
    }

    /// Appends an element and returns its index.
    pub fn push(&mut self, element: T) -> usize {
        self.elements.push(element);
        self.elements.len() - 1
    }

    /// Removes and returns the last element.
    pub fn pop(&mut self) -> Option<T> {
        self.elements.pop()
    }

    /// Shortens the working copy to `length` elements.
    ///
    /// Has no effect if `length` is greater than or equal to the current
    /// length.
    pub fn truncate(&mut self, length: usize) {
        self.elements.truncate(length);
    }

    /// Removes all elements.
    pub fn clear(&mut self) {
        self.elements.clear();
    }
}

impl<T> Extend<T> for TransientOrderedSequence<T> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        self.elements.extend(iter);
    }
}

impl<T: fmt::Debug> fmt::Debug for TransientOrderedSequence<T> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.debug_list().entries(self.iter()).finish()
    }
}

// =============================================================================
// Iterators
// =============================================================================

/// An iterator over references to the elements of an [`OrderedSequence`].
pub struct OrderedSequenceIterator<'a, T> {
    inner: std::slice::Iter<'a, T>,
}

impl<'a, T> Iterator for OrderedSequenceIterator<'a, T> {
    type Item = &'a T;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<T> DoubleEndedIterator for OrderedSequenceIterator<'_, T> {
    #[inline]
    fn next_back(&mut self) -> Option<Self::Item> {
        self.inner.next_back()
    }
}

impl<T> ExactSizeIterator for OrderedSequenceIterator<'_, T> {
    #[inline]
    fn len(&self) -> usize {
        self.inner.len()
    }
}

impl<T> FusedIterator for OrderedSequenceIterator<'_, T> {}

/// An owning iterator over the elements of an [`OrderedSequence`].
///
/// Elements are moved out when this was the only handle to the contents and
/// cloned otherwise.
pub struct OrderedSequenceIntoIterator<T> {
    inner: std::vec::IntoIter<T>,
}

impl<T> Iterator for OrderedSequenceIntoIterator<T> {
    type Item = T;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<T> DoubleEndedIterator for OrderedSequenceIntoIterator<T> {
    #[inline]
    fn next_back(&mut self) -> Option<Self::Item> {
        self.inner.next_back()
    }
}

impl<T> ExactSizeIterator for OrderedSequenceIntoIterator<T> {
    #[inline]
    fn len(&self) -> usize {
        self.inner.len()
    }
}

impl<T> FusedIterator for OrderedSequenceIntoIterator<T> {}

impl<T: Clone> IntoIterator for OrderedSequence<T> {
    type Item = T;
    type IntoIter = OrderedSequenceIntoIterator<T>;

    fn into_iter(self) -> Self::IntoIter {
        OrderedSequenceIntoIterator {
            inner: Arc::unwrap_or_clone(self.elements).into_iter(),
        }
    }
}

impl<'a, T> IntoIterator for &'a OrderedSequence<T> {
    type Item = &'a T;
    type IntoIter = OrderedSequenceIterator<'a, T>;

    #[inline]
    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'a, T> IntoIterator for &'a TransientOrderedSequence<T> {
    type Item = &'a T;
    type IntoIter = OrderedSequenceIterator<'a, T>;

    #[inline]
    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

// =============================================================================
// Standard Trait Implementations
// =============================================================================

impl<T> Clone for OrderedSequence<T> {
    #[inline]
    fn clone(&self) -> Self {
        Self {
            elements: Arc::clone(&self.elements),
        }
    }
}

impl<T> Default for OrderedSequence<T> {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl<T> FromIterator<T> for OrderedSequence<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self {
            elements: Arc::new(iter.into_iter().collect()),
        }
    }
}

impl<T> From<Vec<T>> for OrderedSequence<T> {
    fn from(elements: Vec<T>) -> Self {
        Self {
            elements: Arc::new(elements),
        }
    }
}

impl<T, const N: usize> From<[T; N]> for OrderedSequence<T> {
    fn from(elements: [T; N]) -> Self {
        Self::from(Vec::from(elements))
    }
}

/// Order-sensitive equality: same length and equal elements at every index.
impl<T: PartialEq> PartialEq for OrderedSequence<T> {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.elements, &other.elements) || self.elements == other.elements
    }
}

impl<T: Eq> Eq for OrderedSequence<T> {}

/// Feeds the [structural hash](OrderedSequence::structural_hash) into the
/// hasher, so `a == b` implies `hash(a) == hash(b)`.
///
/// # Examples
///
/// ```rust
/// use safekit::collections::OrderedSequence;
/// use std::collections::HashMap;
///
/// let mut lookup: HashMap<OrderedSequence<i32>, &str> = HashMap::new();
/// let key: OrderedSequence<i32> = [1, 2, 3].into();
/// lookup.insert(key.clone(), "value");
/// assert_eq!(lookup.get(&key), Some(&"value"));
/// ```
impl<T: Hash> Hash for OrderedSequence<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.structural_hash());
    }
}

impl<T: fmt::Debug> fmt::Debug for OrderedSequence<T> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.debug_list().entries(self.iter()).finish()
    }
}

impl<T: fmt::Display> fmt::Display for OrderedSequence<T> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "[")?;
        let mut first = true;
        for element in self {
            if first {
                first = false;
            } else {
                write!(formatter, ", ")?;
            }
            write!(formatter, "{element}")?;
        }
        write!(formatter, "]")
    }
}

// =============================================================================
// Serde Support
// =============================================================================

#[cfg(feature = "serde")]
impl<T: serde::Serialize> serde::Serialize for OrderedSequence<T> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::SerializeSeq;
        let mut sequence = serializer.serialize_seq(Some(self.len()))?;
        for element in self {
            sequence.serialize_element(element)?;
        }
        sequence.end()
    }
}

#[cfg(feature = "serde")]
struct OrderedSequenceVisitor<T> {
    marker: PhantomData<T>,
}

#[cfg(feature = "serde")]
impl<'de, T> serde::de::Visitor<'de> for OrderedSequenceVisitor<T>
where
    T: serde::Deserialize<'de>,
{
    type Value = OrderedSequence<T>;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a sequence")
    }

    fn visit_seq<A>(self, mut access: A) -> Result<Self::Value, A::Error>
    where
        A: serde::de::SeqAccess<'de>,
    {
        let mut elements = Vec::with_capacity(access.size_hint().unwrap_or(0));
        while let Some(element) = access.next_element()? {
            elements.push(element);
        }
        Ok(OrderedSequence::from(elements))
    }
}

#[cfg(feature = "serde")]
impl<'de, T> serde::Deserialize<'de> for OrderedSequence<T>
where
    T: serde::Deserialize<'de>,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        deserializer.deserialize_seq(OrderedSequenceVisitor {
            marker: PhantomData,
        })
    }
}
