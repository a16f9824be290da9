//! Structural hash combination.
//!
//! This module provides [`combine_hash`], the pure function the ordered
//! containers use to fold per-entry hashes into one structural hash, and
//! [`hash_of`], which hashes a single value with a fixed-key hasher.
//!
//! # Overview
//!
//! A structural hash is computed by starting from the hash of the length and
//! then, for every field in iteration order, mixing the field's hash into the
//! running value and combining the result with the field's index:
//!
//! ```text
//! running = hash_of(len)
//! for (index, field) in fields:
//!     running = combine_hash(running ^ hash_of(field), index)
//! ```
//!
//! Because the index participates in every step, moving a field to another
//! position changes the result with high probability.
//!
//! # Examples
//!
//! ```rust
//! use safekit::hash::{combine_hash, hash_of};
//!
//! let forward = combine_hash(combine_hash(hash_of(&1), 0) ^ hash_of(&2), 1);
//! let backward = combine_hash(combine_hash(hash_of(&2), 0) ^ hash_of(&1), 1);
//! assert_ne!(forward, backward);
//! ```

use std::hash::{DefaultHasher, Hash, Hasher};

/// Increment of the Weyl sequence used to spread field indices.
const GOLDEN_GAMMA: u64 = 0x9E37_79B9_7F4A_7C15;

/// First multiplier of the splitmix64 finalizer.
const MIX_MULTIPLIER_1: u64 = 0xBF58_476D_1CE4_E5B9;

/// Second multiplier of the splitmix64 finalizer.
const MIX_MULTIPLIER_2: u64 = 0x94D0_49BB_1331_11EB;

/// Combines a running hash with the index of the next hashed field.
///
/// The running hash is rotated by an amount that depends on the index
/// (`64 / (index + 1)` bits, as in the classic rotate-by-field-position
/// scheme), the spread index is mixed in, and the result goes through a
/// splitmix64 finalizer so that indices past 64 still diverge.
///
/// The function is `const`, pure and deterministic: the same sequence of
/// `(running_hash, field_index)` pairs always yields the same result on every
/// platform.
///
/// # Arguments
///
/// * `running_hash` - The hash accumulated so far, typically already xored
///   with the next field's own hash
/// * `field_index` - The position of the field; must be unique per field
///
/// # Examples
///
/// ```rust
/// use safekit::hash::combine_hash;
///
/// let running = 0xDEAD_BEEF;
/// assert_eq!(combine_hash(running, 3), combine_hash(running, 3));
/// assert_ne!(combine_hash(running, 3), combine_hash(running, 4));
/// ```
#[inline]
#[must_use]
pub const fn combine_hash(running_hash: u64, field_index: u64) -> u64 {
    #[allow(clippy::cast_possible_truncation)]
    let rotation = u64::BITS / ((field_index % u64::BITS as u64) as u32 + 1);
    let rotated = running_hash.rotate_left(rotation);
    let mut mixed = rotated ^ field_index.wrapping_add(1).wrapping_mul(GOLDEN_GAMMA);
    mixed = (mixed ^ (mixed >> 30)).wrapping_mul(MIX_MULTIPLIER_1);
    mixed = (mixed ^ (mixed >> 27)).wrapping_mul(MIX_MULTIPLIER_2);
    mixed ^ (mixed >> 31)
}

/// Hashes a single value with a fixed-key hasher.
///
/// Unlike a `RandomState`-built hasher, the result does not change between
/// runs of the same build, which keeps structural hashes reproducible.
///
/// # Examples
///
/// ```rust
/// use safekit::hash::hash_of;
///
/// assert_eq!(hash_of("key"), hash_of(&"key".to_string()));
/// ```
#[inline]
#[must_use]
pub fn hash_of<T: Hash + ?Sized>(value: &T) -> u64 {
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    hasher.finish()
}

/// Folds a stream of field hashes into one structural hash.
///
/// The fold is seeded with the hash of `length`; each field hash is xored
/// into the running value and combined with its position.
pub(crate) fn fold_field_hashes<I>(length: usize, field_hashes: I) -> u64
where
    I: IntoIterator<Item = u64>,
{
    field_hashes
        .into_iter()
        .zip(0_u64..)
        .fold(hash_of(&length), |running, (field_hash, index)| {
            combine_hash(running ^ field_hash, index)
        })
}
