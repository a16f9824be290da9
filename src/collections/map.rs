//! Frozen insertion-ordered map.
//!
//! This module provides [`OrderedMap`], an immutable associative container
//! whose iteration order is the order in which keys were first inserted, and
//! [`TransientOrderedMap`], the working copy handed out by
//! [`OrderedMap::modify`].
//!
//! # Overview
//!
//! Internally the map couples two structures:
//!
//! - an entry list holding `(key, value)` pairs in insertion order
//! - a lookup table mapping each key to its position in the entry list
//!
//! Both always hold exactly the same key set, and every key appears once.
//! Setting an existing key replaces its value without moving it; setting a
//! new key appends it at the end.
//!
//! - O(1) average `get`, `contains_key`, `len` and `clone`
//! - O(N) `modify` (the contents are copied into the working copy)
//! - O(N) `remove` on the working copy (later entries shift down)
//!
//! # Examples
//!
//! ```rust
//! use safekit::collections::OrderedMap;
//!
//! let map: OrderedMap<&str, i32> = OrderedMap::new().modify(|working| {
//!     working.set("z", 26);
//!     working.set("a", 1);
//!     working.set("z", 0); // Update in place: "z" stays first
//! });
//!
//! assert_eq!(map.all_keys(), vec!["z", "a"]);
//! assert_eq!(map.get("z"), Some(&0));
//! assert_eq!(map.get("missing"), None);
//! ```

use std::borrow::Borrow;
use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::iter::{FromIterator, FusedIterator};
use std::marker::PhantomData;
use std::rc::Rc;
use std::sync::Arc;

use super::{LookupState, Mutability};
use crate::hash::{fold_field_hashes, hash_of};

// =============================================================================
// Storage
// =============================================================================

/// Entry list plus key lookup table.
///
/// Invariant: `positions[&entries[i].0] == i` for every `i`, and
/// `positions.len() == entries.len()`.
#[derive(Clone)]
struct MapStorage<K, V> {
    entries: Vec<(K, V)>,
    positions: HashMap<K, usize, LookupState>,
}

impl<K, V> MapStorage<K, V> {
    fn new() -> Self {
        Self {
            entries: Vec::new(),
            positions: HashMap::with_hasher(LookupState::default()),
        }
    }

    fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
            positions: HashMap::with_capacity_and_hasher(capacity, LookupState::default()),
        }
    }

    fn clear(&mut self) {
        self.entries.clear();
        self.positions.clear();
    }
}

impl<K: Eq + Hash, V> MapStorage<K, V> {
    fn position_of<Q>(&self, key: &Q) -> Option<usize>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.positions.get(key).copied()
    }

    fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.position_of(key)
            .map(|position| &self.entries[position].1)
    }

    fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.position_of(key)
            .map(|position| &mut self.entries[position].1)
    }

    fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let position = self.positions.remove(key)?;
        let (_, value) = self.entries.remove(position);
        self.shift_positions_from(position);
        Some(value)
    }

    /// Moves the recorded position of every entry at or after `position`
    /// one slot down, after the entry that stood there was taken out.
    fn shift_positions_from(&mut self, position: usize) {
        for (shifted_key, _) in &self.entries[position..] {
            if let Some(shifted_position) = self.positions.get_mut::<K>(shifted_key) {
                *shifted_position -= 1;
            }
        }
    }

    #[cfg(any(debug_assertions, test))]
    fn is_consistent(&self) -> bool {
        self.positions.len() == self.entries.len()
            && self
                .entries
                .iter()
                .enumerate()
                .all(|(position, (key, _))| self.positions.get(key) == Some(&position))
    }
}

impl<K: Clone + Eq + Hash, V> MapStorage<K, V> {
    fn set(&mut self, key: K, value: V) -> Option<V> {
        if let Some(position) = self.position_of(&key) {
            Some(std::mem::replace(&mut self.entries[position].1, value))
        } else {
            self.positions.insert(key.clone(), self.entries.len());
            self.entries.push((key, value));
            None
        }
    }
}

#[cfg(debug_assertions)]
const CONSISTENCY_PANIC_MESSAGE: &str =
    "ordered map entry list and lookup table must hold the same keys at matching positions";

// =============================================================================
// OrderedMap Definition
// =============================================================================

/// A frozen associative container that preserves insertion order.
///
/// The contents live behind a shared pointer, so clones are cheap and may be
/// shared across threads (when `K` and `V` are `Send + Sync`). They never
/// change; use [`modify`](Self::modify) to derive a changed copy.
///
/// # Time Complexity
///
/// | Operation      | Complexity   |
/// |----------------|--------------|
/// | `new`          | O(1)         |
/// | `get`          | O(1) average |
/// | `contains_key` | O(1) average |
/// | `get_index`    | O(1)         |
/// | `len`          | O(1)         |
/// | `clone`        | O(1)         |
/// | `all_keys`     | O(N)         |
/// | `all_values`   | O(N)         |
/// | `modify`       | O(N)         |
///
/// # Equality and Hashing
///
/// Two maps are equal when they hold the same entries in the same order;
/// `{a: 1, b: 2}` and `{b: 2, a: 1}` are different values. Hashing agrees
/// with equality (see [`structural_hash`](Self::structural_hash)).
///
/// # Examples
///
/// ```rust
/// use safekit::collections::OrderedMap;
///
/// let map: OrderedMap<String, u32> = [
///     ("one".to_string(), 1),
///     ("two".to_string(), 2),
/// ]
/// .into();
///
/// assert_eq!(map.get("two"), Some(&2));
/// assert_eq!(map.get_index(0), Some((&"one".to_string(), &1)));
/// ```
pub struct OrderedMap<K, V> {
    storage: Arc<MapStorage<K, V>>,
}

static_assertions::assert_impl_all!(OrderedMap<String, i32>: Send, Sync);

impl<K, V> OrderedMap<K, V> {
    /// Creates a new empty map.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use safekit::collections::OrderedMap;
    ///
    /// let map: OrderedMap<String, i32> = OrderedMap::new();
    /// assert!(map.is_empty());
    /// ```
    #[must_use]
    pub fn new() -> Self {
        Self {
            storage: Arc::new(MapStorage::new()),
        }
    }

    /// Returns the number of entries.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use safekit::collections::OrderedMap;
    ///
    /// let map: OrderedMap<&str, i32> = [("a", 1), ("b", 2), ("a", 3)].into();
    /// assert_eq!(map.len(), 2);
    /// ```
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.storage.entries.len()
    }

    /// Returns `true` if the map contains no entries.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.storage.entries.is_empty()
    }

    /// Returns the entry at `position` in insertion order.
    ///
    /// Returns `None` if `position` is out of range.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use safekit::collections::OrderedMap;
    ///
    /// let map: OrderedMap<&str, i32> = [("z", 26), ("a", 1)].into();
    /// assert_eq!(map.get_index(0), Some((&"z", &26)));
    /// assert_eq!(map.get_index(2), None);
    /// ```
    #[inline]
    #[must_use]
    pub fn get_index(&self, position: usize) -> Option<(&K, &V)> {
        self.storage
            .entries
            .get(position)
            .map(|(key, value)| (key, value))
    }

    /// Returns the first inserted entry.
    #[inline]
    #[must_use]
    pub fn first(&self) -> Option<(&K, &V)> {
        self.get_index(0)
    }

    /// Returns the last inserted entry.
    #[inline]
    #[must_use]
    pub fn last(&self) -> Option<(&K, &V)> {
        self.storage
            .entries
            .last()
            .map(|(key, value)| (key, value))
    }

    /// Returns an iterator over `(key, value)` pairs in insertion order.
    ///
    /// Iteration is restartable and yields the same entries every time.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use safekit::collections::OrderedMap;
    ///
    /// let map: OrderedMap<&str, i32> = [("b", 2), ("a", 1)].into();
    /// let entries: Vec<(&&str, &i32)> = map.iter().collect();
    /// assert_eq!(entries, vec![(&"b", &2), (&"a", &1)]);
    /// ```
    #[inline]
    pub fn iter(&self) -> OrderedMapIterator<'_, K, V> {
        OrderedMapIterator {
            inner: self.storage.entries.iter(),
        }
    }

    /// Returns an iterator over the keys in insertion order.
    #[inline]
    pub fn keys(&self) -> OrderedMapKeys<'_, K, V> {
        OrderedMapKeys {
            inner: self.storage.entries.iter(),
        }
    }

    /// Returns an iterator over the values in key insertion order.
    #[inline]
    pub fn values(&self) -> OrderedMapValues<'_, K, V> {
        OrderedMapValues {
            inner: self.storage.entries.iter(),
        }
    }

    /// Returns [`Mutability::Frozen`].
    #[inline]
    #[must_use]
    pub const fn mutability(&self) -> Mutability {
        Mutability::Frozen
    }
}

impl<K: Eq + Hash, V> OrderedMap<K, V> {
    /// Returns the value for `key`, or `None` if the key is absent.
    ///
    /// The key may be any borrowed form of the map's key type. A missing
    /// key is a normal result, never an error.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use safekit::collections::OrderedMap;
    ///
    /// let map: OrderedMap<String, i32> = [("one".to_string(), 1)].into();
    /// assert_eq!(map.get("one"), Some(&1));
    /// assert_eq!(map.get("two"), None);
    /// ```
    #[inline]
    #[must_use]
    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.storage.get(key)
    }

    /// Returns the stored key and its value.
    #[must_use]
    pub fn get_key_value<Q>(&self, key: &Q) -> Option<(&K, &V)>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.position_of(key)
            .and_then(|position| self.get_index(position))
    }

    /// Returns `true` if the map contains `key`.
    #[inline]
    #[must_use]
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.storage.positions.contains_key(key)
    }

    /// Returns the insertion-order position of `key`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use safekit::collections::OrderedMap;
    ///
    /// let map: OrderedMap<&str, i32> = [("z", 26), ("a", 1)].into();
    /// assert_eq!(map.position_of("a"), Some(1));
    /// assert_eq!(map.position_of("b"), None);
    /// ```
    #[inline]
    #[must_use]
    pub fn position_of<Q>(&self, key: &Q) -> Option<usize>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.storage.position_of(key)
    }
}

impl<K: Clone, V: Clone> OrderedMap<K, V> {
    /// Returns a snapshot of all keys in insertion order.
    ///
    /// The returned `Vec` belongs to the caller; later transactions on the
    /// map do not affect it.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use safekit::collections::OrderedMap;
    ///
    /// let map: OrderedMap<&str, i32> = OrderedMap::new().modify(|working| {
    ///     working.set("z", 1);
    ///     working.set("a", 2);
    /// });
    /// assert_eq!(map.all_keys(), vec!["z", "a"]);
    /// ```
    #[must_use]
    pub fn all_keys(&self) -> Vec<K> {
        self.keys().cloned().collect()
    }

    /// Returns a snapshot of all values in key insertion order.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use safekit::collections::OrderedMap;
    ///
    /// let map: OrderedMap<&str, i32> = [("z", 1), ("a", 2)].into();
    /// assert_eq!(map.all_values(), vec![1, 2]);
    /// ```
    #[must_use]
    pub fn all_values(&self) -> Vec<V> {
        self.values().cloned().collect()
    }
}

impl<K: Clone + Eq + Hash, V: Clone> OrderedMap<K, V> {
    /// Derives a new map by mutating a working copy of this one.
    ///
    /// The entries are copied into a [`TransientOrderedMap`], `mutation`
    /// receives exclusive access to it through the mutable interface, and
    /// the working copy is then frozen and returned. `self` is never
    /// altered, and the working copy cannot outlive the call.
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
    /// use safekit::collections::OrderedMap;
    ///
    /// let original: OrderedMap<&str, i32> = [("a", 1)].into();
    /// let updated = original.modify(|working| {
    ///     working.set("a", 10);
    ///     working.set("b", 2);
    /// });
    ///
    /// assert_eq!(original.get("a"), Some(&1));
    /// assert_eq!(original.len(), 1);
    /// assert_eq!(updated.get("a"), Some(&10));
    /// assert_eq!(updated.all_keys(), vec!["a", "b"]);
    /// ```
    ///
    /// Transactions on different maps nest freely:
    ///
    /// ```rust
    /// use safekit::collections::OrderedMap;
    ///
    /// let inner: OrderedMap<&str, i32> = [("x", 1)].into();
    /// let outer: OrderedMap<&str, OrderedMap<&str, i32>> = OrderedMap::new();
    ///
    /// let outer = outer.modify(|working| {
    ///     working.set("nested", inner.modify(|nested| {
    ///         nested.set("y", 2);
    ///     }));
    /// });
    ///
    /// assert_eq!(outer.get("nested").map(OrderedMap::len), Some(2));
    /// assert_eq!(inner.len(), 1);
    /// ```
    #[must_use]
    pub fn modify<F>(&self, mutation: F) -> Self
    where
        F: FnOnce(&mut TransientOrderedMap<K, V>),
    {
        let mut transient = TransientOrderedMap::from_storage(self.storage.as_ref().clone());
        mutation(&mut transient);
        let frozen = transient.freeze();
        tracing::trace!(
            before = self.len(),
            after = frozen.len(),
            "map transaction committed"
        );
        frozen
    }

    /// Fallible variant of [`modify`](Self::modify).
    ///
    /// When `mutation` returns an error the transaction is aborted: the
    /// partially mutated working copy is discarded, nothing of it is
    /// observable, and the error is returned.
    ///
    /// # Errors
    ///
    /// Returns whatever error `mutation` returns.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use safekit::collections::OrderedMap;
    ///
    /// let original: OrderedMap<&str, i32> = [("limit", 10)].into();
    ///
    /// let accepted: Result<_, String> = original.try_modify(|working| {
    ///     working.set("limit", 20);
    ///     Ok(())
    /// });
    /// assert_eq!(accepted.map(|map| map.get("limit").copied()), Ok(Some(20)));
    ///
    /// let rejected: Result<_, String> = original.try_modify(|working| {
    ///     working.set("limit", -1);
    ///     Err("limit must be positive".to_string())
    /// });
    /// assert!(rejected.is_err());
    /// assert_eq!(original.get("limit"), Some(&10));
    /// ```
    pub fn try_modify<F, E>(&self, mutation: F) -> Result<Self, E>
    where
        F: FnOnce(&mut TransientOrderedMap<K, V>) -> Result<(), E>,
    {
        let mut transient = TransientOrderedMap::from_storage(self.storage.as_ref().clone());
        if let Err(error) = mutation(&mut transient) {
            tracing::debug!(
                len = self.len(),
                "map transaction aborted, working copy discarded"
            );
            return Err(error);
        }
        Ok(transient.freeze())
    }
}

impl<K: Hash, V: Hash> OrderedMap<K, V> {
    /// Returns the structural hash of the map.
    ///
    /// For the entry at position `i`, the key hash is folded through
    /// [`combine_hash`](crate::hash::combine_hash) at field index `2i` and the
    /// value hash at `2i + 1`, seeded with the length. Equal maps have equal
    /// structural hashes; swapping two entries changes it with high
    /// probability.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use safekit::collections::OrderedMap;
    ///
    /// let forward: OrderedMap<&str, i32> = [("a", 1), ("b", 2)].into();
    /// let backward: OrderedMap<&str, i32> = [("b", 2), ("a", 1)].into();
    /// assert_ne!(forward.structural_hash(), backward.structural_hash());
    /// ```
    #[must_use]
    pub fn structural_hash(&self) -> u64 {
        fold_field_hashes(
            self.len(),
            self.iter()
                .flat_map(|(key, value)| [hash_of(key), hash_of(value)]),
        )
    }
}

// =============================================================================
// TransientOrderedMap Definition
// =============================================================================

/// The working copy of an [`OrderedMap`] inside a `modify` transaction.
///
/// It offers the read interface of the frozen map plus the mutators
/// ([`set`](Self::set), [`remove`](Self::remove), ...). It has no public
/// constructor and does not implement `Clone`, so it is only reachable
/// through the `&mut` borrow that [`OrderedMap::modify`] and
/// [`OrderedMap::try_modify`] pass to their closure.
///
/// # Design
///
/// - `PhantomData<Rc<()>>` ensures `!Send` and `!Sync`
/// - The working copy is frozen back into an [`OrderedMap`] when the
///   transaction commits, and dropped when it aborts
pub struct TransientOrderedMap<K, V> {
    storage: MapStorage<K, V>,
    /// Marker to ensure `!Send` and `!Sync`.
    _marker: PhantomData<Rc<()>>,
}

static_assertions::assert_not_impl_any!(TransientOrderedMap<String, i32>: Send, Sync, Clone);
static_assertions::assert_not_impl_any!(TransientOrderedMap<i32, i32>: Send, Sync, Clone);

impl<K, V> TransientOrderedMap<K, V> {
    const fn from_storage(storage: MapStorage<K, V>) -> Self {
        Self {
            storage,
            _marker: PhantomData,
        }
    }

    /// Returns the number of entries.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.storage.entries.len()
    }

    /// Returns `true` if the working copy contains no entries.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.storage.entries.is_empty()
    }

    /// Returns the entry at `position` in insertion order.
    #[inline]
    #[must_use]
    pub fn get_index(&self, position: usize) -> Option<(&K, &V)> {
        self.storage
            .entries
            .get(position)
            .map(|(key, value)| (key, value))
    }

    /// Returns an iterator over `(key, value)` pairs in insertion order.
    #[inline]
    pub fn iter(&self) -> OrderedMapIterator<'_, K, V> {
        OrderedMapIterator {
            inner: self.storage.entries.iter(),
        }
    }

    /// Returns an iterator over the keys in insertion order.
    #[inline]
    pub fn keys(&self) -> OrderedMapKeys<'_, K, V> {
        OrderedMapKeys {
            inner: self.storage.entries.iter(),
        }
    }

    /// Returns an iterator over the values in key insertion order.
    #[inline]
    pub fn values(&self) -> OrderedMapValues<'_, K, V> {
        OrderedMapValues {
            inner: self.storage.entries.iter(),
        }
    }

    /// Returns [`Mutability::Temporary`].
    #[inline]
    #[must_use]
    pub const fn mutability(&self) -> Mutability {
        Mutability::Temporary
    }

    /// Removes every entry.
    pub fn clear(&mut self) {
        self.storage.clear();
    }
}

impl<K: Eq + Hash, V> TransientOrderedMap<K, V> {
    fn freeze(self) -> OrderedMap<K, V> {
        #[cfg(debug_assertions)]
        debug_assert!(self.storage.is_consistent(), "{}", CONSISTENCY_PANIC_MESSAGE);
        OrderedMap {
            storage: Arc::new(self.storage),
        }
    }

    /// Returns the value for `key`, or `None` if the key is absent.
    #[inline]
    #[must_use]
    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.storage.get(key)
    }

    /// Returns a mutable reference to the value for `key`.
    ///
    /// The entry keeps its position.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use safekit::collections::OrderedMap;
    ///
    /// let counters: OrderedMap<&str, u32> = [("hits", 1)].into();
    /// let counters = counters.modify(|working| {
    ///     if let Some(hits) = working.get_mut("hits") {
    ///         *hits += 1;
    ///     }
    /// });
    /// assert_eq!(counters.get("hits"), Some(&2));
    /// ```
    #[inline]
    pub fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.storage.get_mut(key)
    }

    /// Returns `true` if the working copy contains `key`.
    #[inline]
    #[must_use]
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.storage.positions.contains_key(key)
    }

    /// Returns the insertion-order position of `key`.
    #[inline]
    #[must_use]
    pub fn position_of<Q>(&self, key: &Q) -> Option<usize>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.storage.position_of(key)
    }

    /// Removes `key` and returns its value.
    ///
    /// Entries after the removed one move up by one position; their
    /// relative order is preserved.
    ///
    /// # Complexity
    ///
    /// O(N)
    ///
    /// # Examples
    ///
    /// ```rust
    /// use safekit::collections::OrderedMap;
    ///
    /// let map: OrderedMap<&str, i32> = [("a", 1), ("b", 2), ("c", 3)].into();
    /// let map = map.modify(|working| {
    ///     assert_eq!(working.remove("b"), Some(2));
    ///     assert_eq!(working.remove("b"), None);
    /// });
    ///
    /// assert_eq!(map.all_keys(), vec!["a", "c"]);
    /// assert_eq!(map.position_of("c"), Some(1));
    /// ```
    pub fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.storage.remove(key)
    }
}

impl<K: Clone + Eq + Hash, V> TransientOrderedMap<K, V> {
    /// Sets the value for `key`.
    ///
    /// If the key exists its value is replaced in place and the old value is
    /// returned; the key keeps its position. Otherwise the entry is appended
    /// at the end and `None` is returned.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use safekit::collections::OrderedMap;
    ///
    /// let map: OrderedMap<&str, i32> = OrderedMap::new().modify(|working| {
    ///     assert_eq!(working.set("z", 1), None);
    ///     assert_eq!(working.set("a", 2), None);
    ///     assert_eq!(working.set("z", 3), Some(1));
    /// });
    ///
    /// assert_eq!(map.all_keys(), vec!["z", "a"]);
    /// assert_eq!(map.all_values(), vec![3, 2]);
    /// ```
    pub fn set(&mut self, key: K, value: V) -> Option<V> {
        self.storage.set(key, value)
    }
}

impl<K: Clone + Eq + Hash, V> Extend<(K, V)> for TransientOrderedMap<K, V> {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (key, value) in iter {
            self.set(key, value);
        }
    }
}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for TransientOrderedMap<K, V> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.debug_map().entries(self.iter()).finish()
    }
}

// =============================================================================
// Iterators
// =============================================================================

/// An iterator over `(key, value)` references of an [`OrderedMap`], in
/// insertion order.
pub struct OrderedMapIterator<'a, K, V> {
    inner: std::slice::Iter<'a, (K, V)>,
}

impl<'a, K, V> Iterator for OrderedMapIterator<'a, K, V> {
    type Item = (&'a K, &'a V);

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(key, value)| (key, value))
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> DoubleEndedIterator for OrderedMapIterator<'_, K, V> {
    #[inline]
    fn next_back(&mut self) -> Option<Self::Item> {
        self.inner.next_back().map(|(key, value)| (key, value))
    }
}

impl<K, V> ExactSizeIterator for OrderedMapIterator<'_, K, V> {
    #[inline]
    fn len(&self) -> usize {
        self.inner.len()
    }
}

impl<K, V> FusedIterator for OrderedMapIterator<'_, K, V> {}

/// An iterator over the keys of an [`OrderedMap`], in insertion order.
pub struct OrderedMapKeys<'a, K, V> {
    inner: std::slice::Iter<'a, (K, V)>,
}

impl<'a, K, V> Iterator for OrderedMapKeys<'a, K, V> {
    type Item = &'a K;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(key, _)| key)
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> DoubleEndedIterator for OrderedMapKeys<'_, K, V> {
    #[inline]
    fn next_back(&mut self) -> Option<Self::Item> {
        self.inner.next_back().map(|(key, _)| key)
    }
}

impl<K, V> ExactSizeIterator for OrderedMapKeys<'_, K, V> {}

impl<K, V> FusedIterator for OrderedMapKeys<'_, K, V> {}

/// An iterator over the values of an [`OrderedMap`], in key insertion order.
pub struct OrderedMapValues<'a, K, V> {
    inner: std::slice::Iter<'a, (K, V)>,
}

impl<'a, K, V> Iterator for OrderedMapValues<'a, K, V> {
    type Item = &'a V;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(_, value)| value)
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> DoubleEndedIterator for OrderedMapValues<'_, K, V> {
    #[inline]
    fn next_back(&mut self) -> Option<Self::Item> {
        self.inner.next_back().map(|(_, value)| value)
    }
}

impl<K, V> ExactSizeIterator for OrderedMapValues<'_, K, V> {}

impl<K, V> FusedIterator for OrderedMapValues<'_, K, V> {}

/// An owning iterator over the entries of an [`OrderedMap`].
///
/// Entries are moved out when this was the only handle to the contents and
/// cloned otherwise.
pub struct OrderedMapIntoIterator<K, V> {
    inner: std::vec::IntoIter<(K, V)>,
}

impl<K, V> Iterator for OrderedMapIntoIterator<K, V> {
    type Item = (K, V);

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> DoubleEndedIterator for OrderedMapIntoIterator<K, V> {
    #[inline]
    fn next_back(&mut self) -> Option<Self::Item> {
        self.inner.next_back()
    }
}

impl<K, V> ExactSizeIterator for OrderedMapIntoIterator<K, V> {}

impl<K, V> FusedIterator for OrderedMapIntoIterator<K, V> {}

impl<K: Clone, V: Clone> IntoIterator for OrderedMap<K, V> {
    type Item = (K, V);
    type IntoIter = OrderedMapIntoIterator<K, V>;

    fn into_iter(self) -> Self::IntoIter {
        OrderedMapIntoIterator {
            inner: Arc::unwrap_or_clone(self.storage).entries.into_iter(),
        }
    }
}

impl<'a, K, V> IntoIterator for &'a OrderedMap<K, V> {
    type Item = (&'a K, &'a V);
    type IntoIter = OrderedMapIterator<'a, K, V>;

    #[inline]
    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'a, K, V> IntoIterator for &'a TransientOrderedMap<K, V> {
    type Item = (&'a K, &'a V);
    type IntoIter = OrderedMapIterator<'a, K, V>;

    #[inline]
    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

// =============================================================================
// Standard Trait Implementations
// =============================================================================

impl<K, V> Clone for OrderedMap<K, V> {
    #[inline]
    fn clone(&self) -> Self {
        Self {
            storage: Arc::clone(&self.storage),
        }
    }
}

impl<K, V> Default for OrderedMap<K, V> {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

/// Builds a map with upsert semantics: a repeated key keeps the position of
/// its first occurrence and the value of its last.
impl<K: Clone + Eq + Hash, V> FromIterator<(K, V)> for OrderedMap<K, V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let iter = iter.into_iter();
        let mut transient =
            TransientOrderedMap::from_storage(MapStorage::with_capacity(iter.size_hint().0));
        transient.extend(iter);
        transient.freeze()
    }
}

impl<K: Clone + Eq + Hash, V, const N: usize> From<[(K, V); N]> for OrderedMap<K, V> {
    fn from(entries: [(K, V); N]) -> Self {
        entries.into_iter().collect()
    }
}

/// Order-sensitive equality: same length and equal entries at every
/// position.
impl<K: PartialEq, V: PartialEq> PartialEq for OrderedMap<K, V> {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.storage, &other.storage)
            || self.storage.entries == other.storage.entries
    }
}

impl<K: Eq, V: Eq> Eq for OrderedMap<K, V> {}

/// Feeds the [structural hash](OrderedMap::structural_hash) into the hasher,
/// so `a == b` implies `hash(a) == hash(b)`.
impl<K: Hash, V: Hash> Hash for OrderedMap<K, V> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.structural_hash());
    }
}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for OrderedMap<K, V> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.debug_map().entries(self.iter()).finish()
    }
}

impl<K: fmt::Display, V: fmt::Display> fmt::Display for OrderedMap<K, V> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{{")?;
        let mut first = true;
        for (key, value) in self {
            if first {
                first = false;
            } else {
                write!(formatter, ", ")?;
            }
            write!(formatter, "{key}: {value}")?;
        }
        write!(formatter, "}}")
    }
}

// =============================================================================
// Serde Support
// =============================================================================

#[cfg(feature = "serde")]
impl<K: serde::Serialize, V: serde::Serialize> serde::Serialize for OrderedMap<K, V> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::SerializeMap;
        let mut map = serializer.serialize_map(Some(self.len()))?;
        for (key, value) in self {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

#[cfg(feature = "serde")]
struct OrderedMapVisitor<K, V> {
    marker: PhantomData<(K, V)>,
}

#[cfg(feature = "serde")]
impl<'de, K, V> serde::de::Visitor<'de> for OrderedMapVisitor<K, V>
where
    K: serde::Deserialize<'de> + Clone + Eq + Hash,
    V: serde::Deserialize<'de>,
{
    type Value = OrderedMap<K, V>;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a map")
    }

    fn visit_map<A>(self, mut access: A) -> Result<Self::Value, A::Error>
    where
        A: serde::de::MapAccess<'de>,
    {
        let mut transient = TransientOrderedMap::from_storage(MapStorage::with_capacity(
            access.size_hint().unwrap_or(0),
        ));
        while let Some((key, value)) = access.next_entry()? {
            transient.set(key, value);
        }
        Ok(transient.freeze())
    }
}

#[cfg(feature = "serde")]
impl<'de, K, V> serde::Deserialize<'de> for OrderedMap<K, V>
where
    K: serde::Deserialize<'de> + Clone + Eq + Hash,
    V: serde::Deserialize<'de>,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        deserializer.deserialize_map(OrderedMapVisitor {
            marker: PhantomData,
        })
    }
}
