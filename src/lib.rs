//! fibtable: open-addressing `Map` and `Set` with Fibonacci hashing and
//! tombstone-free deletion, plus a small positional `List`.
//!
//! Internal Design:
//!
//! Summary
//! - One engine, two containers: `RawTable<E>` owns the slot array and the
//!   placement, probe, growth and removal algorithms. `Map<K, V, S>` stores
//!   `(K, V)` entries in it; `Set<T, S>` stores `T`. They differ only in
//!   what the equality closure compares and whether an overwrite exists.
//! - `List<T>` is an unrelated growable array with shift-based insert and
//!   remove.
//!
//! Placement
//! - Keys hash through `S: BuildHasher`; the 64-bit result is folded to 32
//!   bits and placed with `fibonacci_hash(hash, shift)`, i.e. the top
//!   `32 - shift` bits of `hash * 0x9E3779B9`.
//! - Collisions probe linearly forward and wrap. The stored 32-bit hash is
//!   compared before `Eq` runs.
//!
//! Growth
//! - A new table has 8 slots (shift 29) and grows before the insert that
//!   would exceed half occupancy. Growth doubles the array and re-places
//!   entries from their stored hash. Tables never shrink.
//!
//! Removal
//! - Backward shift, no tombstones: later entries of the same probe run
//!   whose home is at or before the hole move into it, repeatedly, until a
//!   vacant slot ends the run.
//!
//! Constraints
//! - Single owner, no internal synchronization. `Map`/`Set` are `!Sync`.
//! - Reentrancy: calling back into a container from its own key's `Hash`
//!   or `Eq` panics in debug builds (see `reentrancy`).
//! - Allocation failure: `try_*` operations return `TableError` and leave
//!   the container unchanged; the other operations abort like `std`.
//! - Iteration visits slot order; no order is promised.

pub mod error;
pub mod hash;
pub mod list;
pub mod map;
mod raw_table;
mod reentrancy;
pub mod set;
mod table_proptest;

// Public surface
pub use error::TableError;
pub use hash::{fibonacci_hash, GOLDEN_RATIO, INITIAL_SHIFT};
pub use list::List;
pub use map::Map;
pub use set::Set;
