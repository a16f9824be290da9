//! Frozen ordered collections with scoped mutation.
//!
//! This module provides two value-semantics containers:
//!
//! - [`OrderedSequence`]: an index-ordered list
//! - [`OrderedMap`]: an associative container that keeps keys in insertion order
//!
//! Both are frozen: nothing can change their contents once they are built.
//! Changes are made through [`OrderedSequence::modify`] and
//! [`OrderedMap::modify`], which clone the contents into a transient working
//! copy ([`TransientOrderedSequence`], [`TransientOrderedMap`]), let a closure
//! mutate it, and freeze the result into a new value.
//!
//! # Cost Model
//!
//! These are not persistent data structures. Cloning a frozen value is O(1)
//! (the contents sit behind a shared pointer), but every `modify` copies the
//! whole container, so a transaction is O(N). Batch all the changes for one
//! step into a single `modify`.
//!
//! # Examples
//!
//! ```rust
//! use safekit::collections::OrderedMap;
//!
//! let settings: OrderedMap<&str, u32> = OrderedMap::new();
//! let updated = settings.modify(|map| {
//!     map.set("timeout", 30);
//!     map.set("retries", 3);
//! });
//!
//! assert!(settings.is_empty()); // Original unchanged
//! assert_eq!(updated.all_keys(), vec!["timeout", "retries"]);
//! ```
//!
//! ## Mutation Outside a Transaction
//!
//! The mutable interface only exists on the transient types, so a frozen
//! value cannot be mutated:
//!
//! ```compile_fail
//! use safekit::collections::OrderedMap;
//!
//! let map: OrderedMap<&str, i32> = OrderedMap::new();
//! map.set("key", 1);
//! ```
//!
//! and the working copy cannot escape its transaction:
//!
//! ```compile_fail
//! use safekit::collections::{OrderedSequence, TransientOrderedSequence};
//!
//! let mut escaped: Option<&mut TransientOrderedSequence<i32>> = None;
//! let sequence: OrderedSequence<i32> = OrderedSequence::new();
//! let _ = sequence.modify(|working| escaped = Some(working));
//! ```

mod map;
mod sequence;

pub use map::OrderedMap;
pub use map::OrderedMapIntoIterator;
pub use map::OrderedMapIterator;
pub use map::OrderedMapKeys;
pub use map::OrderedMapValues;
pub use map::TransientOrderedMap;
pub use sequence::OrderedSequence;
pub use sequence::OrderedSequenceIntoIterator;
pub use sequence::OrderedSequenceIterator;
pub use sequence::TransientOrderedSequence;

// =============================================================================
// Mutability State
// =============================================================================

/// The mutability state of a container instance.
///
/// Frozen values and transient working copies are distinct types, so the
/// state is fixed per type and exposed through `mutability()` for
/// diagnostics.
///
/// # Examples
///
/// ```rust
/// use safekit::collections::{Mutability, OrderedSequence};
///
/// let sequence: OrderedSequence<i32> = OrderedSequence::new();
/// assert_eq!(sequence.mutability(), Mutability::Frozen);
///
/// let _ = sequence.modify(|working| {
///     assert_eq!(working.mutability(), Mutability::Temporary);
/// });
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mutability {
    /// Never mutable; the contents are fixed for the value's whole lifetime.
    Frozen,
    /// A working copy that is mutable only inside a `modify` transaction.
    Temporary,
}

// =============================================================================
// Lookup Table Hasher
// =============================================================================

/// Build hasher of the key lookup table inside [`OrderedMap`].
///
/// Selected by Cargo feature: `fxhash` uses `rustc-hash`, `ahash` uses
/// `ahash`, otherwise the standard library's DoS-resistant `RandomState`.
#[cfg(feature = "fxhash")]
pub(crate) type LookupState = rustc_hash::FxBuildHasher;

#[cfg(all(feature = "ahash", not(feature = "fxhash")))]
pub(crate) type LookupState = ahash::RandomState;

#[cfg(not(any(feature = "fxhash", feature = "ahash")))]
pub(crate) type LookupState = std::hash::RandomState;
