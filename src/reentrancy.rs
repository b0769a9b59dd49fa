//! Debug-only reentrancy guard for the table containers.
//!
//! `Map` and `Set` call user `Hash` and `Eq` code while a probe or a
//! relocation is in progress. Calling back into the same container from
//! there would observe (or mutate) a half-updated slot array, so every
//! public operation holds a guard for its duration. Debug builds panic on a
//! nested entry; release builds compile the guard away.

use core::cell::Cell;
use core::marker::PhantomData;

/// Per-container depth tracker. Guard an operation with
/// `let _g = self.reentrancy.enter();` before hashing anything.
#[derive(Debug)]
pub(crate) struct DebugReentrancy {
    #[cfg(debug_assertions)]
    active: Cell<bool>,
    // Containers are single-owner; keep them !Sync.
    _unsync: PhantomData<Cell<()>>,
}

impl DebugReentrancy {
    pub(crate) const fn new() -> Self {
        Self {
            #[cfg(debug_assertions)]
            active: Cell::new(false),
            _unsync: PhantomData,
        }
    }

    /// Marks the container busy until the returned guard drops.
    #[inline]
    pub(crate) fn enter(&self) -> ReentrancyGuard<'_> {
        #[cfg(debug_assertions)]
        {
            assert!(
                !self.active.replace(true),
                "reentrancy detected: table accessed from its own Hash or Eq"
            );
            ReentrancyGuard { owner: self }
        }

        #[cfg(not(debug_assertions))]
        {
            ReentrancyGuard { _z: PhantomData }
        }
    }
}

impl Default for DebugReentrancy {
    fn default() -> Self {
        Self::new()
    }
}

pub(crate) struct ReentrancyGuard<'a> {
    #[cfg(debug_assertions)]
    owner: &'a DebugReentrancy,
    #[cfg(not(debug_assertions))]
    _z: PhantomData<&'a ()>,
}

impl Drop for ReentrancyGuard<'_> {
    fn drop(&mut self) {
        #[cfg(debug_assertions)]
        self.owner.active.set(false);
    }
}
