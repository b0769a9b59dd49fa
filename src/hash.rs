//! Hash folding and Fibonacci slot placement.

use core::hash::{BuildHasher, Hash};

/// `2^32 / φ`, rounded to odd. Multiplying by it spreads low-entropy hashes
/// into the high bits, which `fibonacci_hash` then keeps.
pub const GOLDEN_RATIO: u32 = 0x9E37_79B9;

/// Shift of a freshly created table: `2^(32 - 29) = 8` slots.
pub const INITIAL_SHIFT: u32 = 29;

/// Smallest shift a table may reach, i.e. `2^31` slots.
pub(crate) const MIN_SHIFT: u32 = 1;

/// Slot index for `hash` in a table of `2^(32 - shift)` slots.
///
/// `shift` must lie in `1..=31`.
#[inline]
pub fn fibonacci_hash(hash: u32, shift: u32) -> u32 {
    debug_assert!((MIN_SHIFT..32).contains(&shift));
    hash.wrapping_mul(GOLDEN_RATIO) >> shift
}

/// Folds a 64-bit hasher output into the 32 bits the table stores.
#[inline]
pub fn fold(hash: u64) -> u32 {
    (hash ^ (hash >> 32)) as u32
}

/// Number of slots for a given shift.
#[inline]
pub(crate) fn capacity_for(shift: u32) -> usize {
    1usize << (32 - shift)
}

#[inline]
pub(crate) fn make_hash<S, Q>(hasher: &S, q: &Q) -> u32
where
    S: BuildHasher,
    Q: ?Sized + Hash,
{
    fold(hasher.hash_one(q))
}
