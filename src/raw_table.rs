//! RawTable: the open-addressing engine shared by `Map` and `Set`.
//!
//! Layout
//! - One power-of-two slot array; `capacity == 2^(32 - shift)`.
//! - Each slot keeps the entry's 32-bit hash and its home slot (the
//!   Fibonacci hash under the shift in effect when it was placed).
//! - Collisions probe linearly forward, wrapping at the end of the array.
//!
//! Growth
//! - Before an insert probes, the table doubles if `len == load_factor`.
//!   `load_factor` is always half the capacity, so at least half the slots
//!   are vacant after every growth and every probe terminates.
//! - Entries are re-placed from their stored hash; `Hash` is never called
//!   again after insertion.
//! - The new array is allocated before any entry moves, so a failed growth
//!   leaves the table untouched.
//!
//! Removal
//! - No tombstones. Removing slot `i` opens a hole; the following run is
//!   scanned and every entry whose home lies circularly at or before the
//!   hole is swapped into it, the hole moving to where that entry was. The
//!   scan ends at the first vacant slot. Every survivor therefore stays
//!   reachable from its home without crossing a vacant slot.
//!
//! The engine never sees keys: callers pass the hash and an equality
//! closure, the way `hashbrown::HashTable` is driven.

use crate::error::{Result, TableError};
use crate::hash::{capacity_for, fibonacci_hash, INITIAL_SHIFT, MIN_SHIFT};
use core::alloc::Layout;

#[derive(Debug)]
pub(crate) struct Slot<E> {
    hash: u32,
    home: u32,
    entry: Option<E>,
}

impl<E> Slot<E> {
    const fn vacant() -> Self {
        Slot {
            hash: 0,
            home: 0,
            entry: None,
        }
    }
}

/// Outcome of an insert probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Probe {
    /// An equal entry lives at this index.
    Occupied(usize),
    /// First vacant slot on the probe path.
    Vacant(usize),
}

pub(crate) struct RawTable<E> {
    slots: Vec<Slot<E>>,
    len: usize,
    load_factor: usize,
    shift: u32,
}

fn alloc_slots<E>(cells: usize) -> Result<Vec<Slot<E>>> {
    let layout = Layout::array::<Slot<E>>(cells).map_err(|_| TableError::CapacityOverflow)?;
    let mut slots = Vec::new();
    slots
        .try_reserve_exact(cells)
        .map_err(|_| TableError::AllocFailed { layout })?;
    slots.extend((0..cells).map(|_| Slot::vacant()));
    Ok(slots)
}

impl<E> RawTable<E> {
    pub(crate) fn try_new() -> Result<Self> {
        Self::try_with_shift(INITIAL_SHIFT)
    }

    /// Smallest table that holds `entries` without growing.
    pub(crate) fn try_with_capacity(entries: usize) -> Result<Self> {
        let mut shift = INITIAL_SHIFT;
        while capacity_for(shift) / 2 < entries {
            if shift == MIN_SHIFT {
                return Err(TableError::CapacityOverflow);
            }
            shift -= 1;
        }
        Self::try_with_shift(shift)
    }

    fn try_with_shift(shift: u32) -> Result<Self> {
        let slots = alloc_slots(capacity_for(shift))?;
        let load_factor = slots.len() / 2;
        Ok(Self {
            slots,
            len: 0,
            load_factor,
            shift,
        })
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub(crate) fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Entry count at which the next insert grows the table.
    #[inline]
    pub(crate) fn load_factor(&self) -> usize {
        self.load_factor
    }

    #[inline]
    fn mask(&self) -> usize {
        self.slots.len() - 1
    }

    #[inline]
    fn home(&self, hash: u32) -> usize {
        fibonacci_hash(hash, self.shift) as usize
    }

    /// Index of the entry with `hash` for which `eq` holds.
    pub(crate) fn find(&self, hash: u32, mut eq: impl FnMut(&E) -> bool) -> Option<usize> {
        let mask = self.mask();
        let mut idx = self.home(hash);
        loop {
            let slot = &self.slots[idx];
            match &slot.entry {
                None => return None,
                Some(e) if slot.hash == hash && eq(e) => return Some(idx),
                Some(_) => {}
            }
            idx = (idx + 1) & mask;
        }
    }

    /// Grows if the threshold is reached, then walks the probe path for
    /// `hash` to either an equal entry or the slot a new one belongs in.
    pub(crate) fn probe(&mut self, hash: u32, mut eq: impl FnMut(&E) -> bool) -> Result<Probe> {
        if self.len == self.load_factor {
            self.grow()?;
        }
        let mask = self.mask();
        let mut idx = self.home(hash);
        loop {
            let slot = &self.slots[idx];
            match &slot.entry {
                None => return Ok(Probe::Vacant(idx)),
                Some(e) if slot.hash == hash && eq(e) => return Ok(Probe::Occupied(idx)),
                Some(_) => {}
            }
            idx = (idx + 1) & mask;
        }
    }

    /// Fills a slot returned as `Probe::Vacant`.
    pub(crate) fn occupy(&mut self, idx: usize, hash: u32, entry: E) -> &mut E {
        debug_assert!(self.slots[idx].entry.is_none(), "occupy on a live slot");
        let home = fibonacci_hash(hash, self.shift);
        self.len += 1;
        let slot = &mut self.slots[idx];
        slot.hash = hash;
        slot.home = home;
        slot.entry.insert(entry)
    }

    #[inline]
    pub(crate) fn entry(&self, idx: usize) -> Option<&E> {
        self.slots.get(idx).and_then(|s| s.entry.as_ref())
    }

    #[inline]
    pub(crate) fn entry_mut(&mut self, idx: usize) -> Option<&mut E> {
        self.slots.get_mut(idx).and_then(|s| s.entry.as_mut())
    }

    /// Removes the entry at `idx` and closes the gap by backward shifting.
    pub(crate) fn take(&mut self, idx: usize) -> Option<E> {
        let removed = self.slots.get_mut(idx)?.entry.take()?;
        let mask = self.mask();
        let mut hole = idx;
        let mut cur = idx;
        loop {
            cur = (cur + 1) & mask;
            let slot = &self.slots[cur];
            if slot.entry.is_none() {
                break;
            }
            // Distances are measured backward from `cur`. An entry whose home
            // is no closer than the hole never had to probe through it.
            let from_home = cur.wrapping_sub(slot.home as usize) & mask;
            let from_hole = cur.wrapping_sub(hole) & mask;
            if from_home >= from_hole {
                self.slots.swap(hole, cur);
                hole = cur;
            }
        }
        self.len -= 1;
        Some(removed)
    }

    /// Doubles the slot array and re-places every entry from its stored hash.
    fn grow(&mut self) -> Result<()> {
        let old_capacity = self.slots.len();
        if self.shift <= MIN_SHIFT {
            tracing::warn!(capacity = old_capacity, "table at maximum capacity");
            return Err(TableError::CapacityOverflow);
        }
        let shift = self.shift - 1;
        let mut slots = alloc_slots::<E>(capacity_for(shift)).map_err(|e| {
            tracing::warn!(capacity = old_capacity, error = %e, "table growth failed");
            e
        })?;
        let mask = slots.len() - 1;

        for old in self.slots.drain(..) {
            let Some(entry) = old.entry else { continue };
            let home = fibonacci_hash(old.hash, shift);
            let mut idx = home as usize;
            while slots[idx].entry.is_some() {
                idx = (idx + 1) & mask;
            }
            slots[idx] = Slot {
                hash: old.hash,
                home,
                entry: Some(entry),
            };
        }

        self.slots = slots;
        self.shift = shift;
        self.load_factor = old_capacity;
        tracing::debug!(
            old_capacity,
            new_capacity = self.slots.len(),
            entries = self.len,
            "grew open-address table"
        );
        Ok(())
    }

    /// Drops every entry; capacity is kept.
    pub(crate) fn clear(&mut self) {
        for slot in &mut self.slots {
            // Count first: a panicking `Drop` must not leave `len` stale.
            if let Some(entry) = slot.entry.take() {
                self.len -= 1;
                drop(entry);
            }
        }
    }

    pub(crate) fn iter(&self) -> RawIter<'_, E> {
        RawIter {
            slots: self.slots.iter(),
            remaining: self.len,
        }
    }

    pub(crate) fn iter_mut(&mut self) -> RawIterMut<'_, E> {
        RawIterMut {
            remaining: self.len,
            slots: self.slots.iter_mut(),
        }
    }

    pub(crate) fn into_entries(self) -> RawIntoIter<E> {
        RawIntoIter {
            remaining: self.len,
            slots: self.slots.into_iter(),
        }
    }

    #[cfg(test)]
    pub(crate) fn home_of(&self, idx: usize) -> Option<usize> {
        let slot = &self.slots[idx];
        slot.entry.as_ref().map(|_| slot.home as usize)
    }

    /// Asserts the structural invariants; test-only.
    #[cfg(test)]
    pub(crate) fn check_invariants(&self) {
        let cap = self.slots.len();
        assert!(cap.is_power_of_two());
        assert_eq!(cap, capacity_for(self.shift));
        assert_eq!(self.load_factor, cap / 2);
        let live = self.slots.iter().filter(|s| s.entry.is_some()).count();
        assert_eq!(live, self.len);
        let mask = self.mask();
        for (i, slot) in self.slots.iter().enumerate() {
            if slot.entry.is_none() {
                continue;
            }
            assert_eq!(slot.home, fibonacci_hash(slot.hash, self.shift));
            // Every slot between home and i must be occupied.
            let mut j = slot.home as usize;
            while j != i {
                assert!(
                    self.slots[j].entry.is_some(),
                    "slot {i} unreachable from home {}: {j} is vacant",
                    slot.home
                );
                j = (j + 1) & mask;
            }
        }
    }
}

pub(crate) struct RawIter<'a, E> {
    slots: core::slice::Iter<'a, Slot<E>>,
    remaining: usize,
}

impl<'a, E> Iterator for RawIter<'a, E> {
    type Item = &'a E;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        let e = self.slots.by_ref().find_map(|s| s.entry.as_ref())?;
        self.remaining -= 1;
        Some(e)
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<E> ExactSizeIterator for RawIter<'_, E> {}

impl<E> Clone for RawIter<'_, E> {
    fn clone(&self) -> Self {
        RawIter {
            slots: self.slots.clone(),
            remaining: self.remaining,
        }
    }
}

pub(crate) struct RawIterMut<'a, E> {
    slots: core::slice::IterMut<'a, Slot<E>>,
    remaining: usize,
}

impl<'a, E> Iterator for RawIterMut<'a, E> {
    type Item = &'a mut E;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        let e = self.slots.by_ref().find_map(|s| s.entry.as_mut())?;
        self.remaining -= 1;
        Some(e)
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<E> ExactSizeIterator for RawIterMut<'_, E> {}

pub(crate) struct RawIntoIter<E> {
    slots: std::vec::IntoIter<Slot<E>>,
    remaining: usize,
}

impl<E> Iterator for RawIntoIter<E> {
    type Item = E;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        let e = self.slots.by_ref().find_map(|s| s.entry)?;
        self.remaining -= 1;
        Some(e)
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<E> ExactSizeIterator for RawIntoIter<E> {}

#[cfg(test)]
mod tests {
    use super::*;

    // Entries are bare u32 hashes so tests control placement exactly.
    fn insert(t: &mut RawTable<u32>, h: u32) -> bool {
        match t.probe(h, |&e| e == h).unwrap() {
            Probe::Occupied(_) => false,
            Probe::Vacant(i) => {
                t.occupy(i, h, h);
                true
            }
        }
    }

    fn remove(t: &mut RawTable<u32>, h: u32) -> Option<u32> {
        let idx = t.find(h, |&e| e == h)?;
        t.take(idx)
    }

    fn contains(t: &RawTable<u32>, h: u32) -> bool {
        t.find(h, |&e| e == h).is_some()
    }

    /// First `n` hashes whose home is `slot` under `shift`.
    fn colliding(slot: u32, shift: u32, n: usize) -> Vec<u32> {
        (0u32..)
            .filter(|&h| fibonacci_hash(h, shift) == slot)
            .take(n)
            .collect()
    }

    #[test]
    fn fresh_table_shape() {
        let t: RawTable<u32> = RawTable::try_new().unwrap();
        assert_eq!(t.capacity(), 8);
        assert_eq!(t.load_factor(), 4);
        assert_eq!(t.len(), 0);
        assert_eq!(t.shift, INITIAL_SHIFT);
        t.check_invariants();
    }

    #[test]
    fn with_capacity_rounds_to_threshold() {
        let t: RawTable<u32> = RawTable::try_with_capacity(0).unwrap();
        assert_eq!(t.capacity(), 8);
        let t: RawTable<u32> = RawTable::try_with_capacity(4).unwrap();
        assert_eq!(t.capacity(), 8);
        let t: RawTable<u32> = RawTable::try_with_capacity(5).unwrap();
        assert_eq!(t.capacity(), 16);
        let t: RawTable<u32> = RawTable::try_with_capacity(100).unwrap();
        assert_eq!(t.capacity(), 256);
        assert_eq!(t.load_factor(), 128);
        t.check_invariants();
    }

    #[test]
    fn with_capacity_past_maximum_overflows() {
        let r: Result<RawTable<u32>> = RawTable::try_with_capacity(usize::MAX);
        assert_eq!(r.err(), Some(TableError::CapacityOverflow));
    }

    #[test]
    fn fifth_insert_grows_before_placing() {
        let mut t = RawTable::try_new().unwrap();
        for h in 1..=4 {
            assert!(insert(&mut t, h));
        }
        assert_eq!((t.capacity(), t.load_factor()), (8, 4));
        assert!(insert(&mut t, 5));
        assert_eq!((t.capacity(), t.load_factor()), (16, 8));
        assert_eq!(t.len(), 5);
        for h in 1..=5 {
            assert!(contains(&t, h));
        }
        t.check_invariants();
    }

    #[test]
    fn duplicate_probe_at_threshold_still_grows() {
        let mut t = RawTable::try_new().unwrap();
        for h in 1..=4 {
            insert(&mut t, h);
        }
        assert!(!insert(&mut t, 1));
        assert_eq!(t.capacity(), 16);
        assert_eq!(t.len(), 4);
        t.check_invariants();
    }

    #[test]
    fn collided_chain_shifts_back_on_middle_removal() {
        let mut t = RawTable::try_new().unwrap();
        let keys = colliding(3, INITIAL_SHIFT, 3);
        let (a, b, c) = (keys[0], keys[1], keys[2]);
        for &k in &keys {
            insert(&mut t, k);
        }
        assert_eq!(t.find(a, |&e| e == a), Some(3));
        assert_eq!(t.find(b, |&e| e == b), Some(4));
        assert_eq!(t.find(c, |&e| e == c), Some(5));

        assert_eq!(remove(&mut t, b), Some(b));
        assert_eq!(t.find(c, |&e| e == c), Some(4), "c moves into the hole");
        assert!(t.entry(5).is_none());
        assert!(contains(&t, a));
        assert!(!contains(&t, b));
        t.check_invariants();
    }

    #[test]
    fn removal_keeps_entries_that_need_more_than_one_shift() {
        // Run at slots 3,4,5 with homes 3,3,4. Removing slot 3 must pull the
        // home-3 entry back and then the home-4 entry after it.
        let mut t = RawTable::try_new().unwrap();
        let at3 = colliding(3, INITIAL_SHIFT, 2);
        let at4 = colliding(4, INITIAL_SHIFT, 1);
        insert(&mut t, at3[0]);
        insert(&mut t, at3[1]);
        insert(&mut t, at4[0]);
        assert_eq!(t.home_of(5), Some(4));

        remove(&mut t, at3[0]);
        assert!(contains(&t, at3[1]));
        assert!(contains(&t, at4[0]));
        assert_eq!(t.find(at3[1], |&e| e == at3[1]), Some(3));
        assert_eq!(t.find(at4[0], |&e| e == at4[0]), Some(4));
        t.check_invariants();
    }

    #[test]
    fn removal_skips_entries_already_at_home() {
        // Homes 3,3,5 at slots 3,4,5: removing slot 4 leaves slot 5 alone.
        let mut t = RawTable::try_new().unwrap();
        let at3 = colliding(3, INITIAL_SHIFT, 2);
        let at5 = colliding(5, INITIAL_SHIFT, 1);
        insert(&mut t, at3[0]);
        insert(&mut t, at3[1]);
        insert(&mut t, at5[0]);

        remove(&mut t, at3[1]);
        assert!(t.entry(4).is_none());
        assert_eq!(t.find(at5[0], |&e| e == at5[0]), Some(5));
        t.check_invariants();
    }

    #[test]
    fn probe_run_wraps_past_last_slot() {
        let mut t = RawTable::try_new().unwrap();
        let keys = colliding(7, INITIAL_SHIFT, 3);
        for &k in &keys {
            insert(&mut t, k);
        }
        assert_eq!(t.find(keys[1], |&e| e == keys[1]), Some(0));
        assert_eq!(t.find(keys[2], |&e| e == keys[2]), Some(1));

        remove(&mut t, keys[0]);
        assert_eq!(t.find(keys[1], |&e| e == keys[1]), Some(7));
        assert_eq!(t.find(keys[2], |&e| e == keys[2]), Some(0));
        t.check_invariants();
    }

    #[test]
    fn wrapped_entry_at_home_zero_is_not_pulled_back() {
        // Slot 7 (home 7), slot 0 (home 0). Home 0 is circularly after the
        // hole at 7, so it must stay put.
        let mut t = RawTable::try_new().unwrap();
        let at7 = colliding(7, INITIAL_SHIFT, 1);
        let at0 = colliding(0, INITIAL_SHIFT, 1);
        insert(&mut t, at7[0]);
        insert(&mut t, at0[0]);

        remove(&mut t, at7[0]);
        assert!(t.entry(7).is_none());
        assert_eq!(t.find(at0[0], |&e| e == at0[0]), Some(0));
        t.check_invariants();
    }

    #[test]
    fn wrapped_chain_shifts_home_zero_entry_to_its_home() {
        // Slot 7 (home 7), slot 0 (home 7), slot 1 (home 0).
        let mut t = RawTable::try_new().unwrap();
        let at7 = colliding(7, INITIAL_SHIFT, 2);
        let at0 = colliding(0, INITIAL_SHIFT, 1);
        insert(&mut t, at7[0]);
        insert(&mut t, at7[1]);
        insert(&mut t, at0[0]);
        assert_eq!(t.find(at0[0], |&e| e == at0[0]), Some(1));

        remove(&mut t, at7[0]);
        assert_eq!(t.find(at7[1], |&e| e == at7[1]), Some(7));
        assert_eq!(t.find(at0[0], |&e| e == at0[0]), Some(0));
        t.check_invariants();
    }

    #[test]
    fn growth_recomputes_homes() {
        let mut t = RawTable::try_new().unwrap();
        for h in 0..100u32 {
            insert(&mut t, h.wrapping_mul(0x0101_0101));
        }
        assert_eq!(t.len(), 100);
        assert_eq!(t.capacity(), 256);
        t.check_invariants();
    }

    #[test]
    fn clear_keeps_capacity() {
        let mut t = RawTable::try_new().unwrap();
        for h in 0..20 {
            insert(&mut t, h);
        }
        let cap = t.capacity();
        t.clear();
        assert_eq!(t.len(), 0);
        assert_eq!(t.capacity(), cap);
        assert!(!contains(&t, 3));
        assert_eq!(t.iter().count(), 0);
        t.check_invariants();
    }

    /// Captures `fmt` output from events emitted inside `f`.
    fn captured_logs(f: impl FnOnce()) -> String {
        use std::sync::{Arc, Mutex};

        #[derive(Clone, Default)]
        struct Buf(Arc<Mutex<Vec<u8>>>);
        impl std::io::Write for Buf {
            fn write(&mut self, bytes: &[u8]) -> std::io::Result<usize> {
                self.0.lock().unwrap().extend_from_slice(bytes);
                Ok(bytes.len())
            }
            fn flush(&mut self) -> std::io::Result<()> {
                Ok(())
            }
        }

        let buf = Buf::default();
        let writer = buf.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_writer(move || writer.clone())
            .finish();
        tracing::subscriber::with_default(subscriber, f);
        let bytes = buf.0.lock().unwrap().clone();
        String::from_utf8(bytes).unwrap()
    }

    #[test]
    fn growth_at_maximum_shift_fails_without_touching_entries() {
        let mut t = RawTable::try_new().unwrap();
        for h in 1..=4 {
            insert(&mut t, h);
        }
        let before: Vec<(usize, Option<u32>)> =
            (0..t.capacity()).map(|i| (i, t.entry(i).copied())).collect();
        // Pretend the array is already as large as it may get.
        t.shift = MIN_SHIFT;

        let logs = captured_logs(|| {
            assert_eq!(t.probe(99, |&e| e == 99), Err(TableError::CapacityOverflow));
        });
        assert!(logs.contains("WARN"), "{logs}");
        assert!(logs.contains("table at maximum capacity"), "{logs}");

        assert_eq!(t.len(), 4);
        assert_eq!(t.capacity(), 8);
        assert_eq!(t.load_factor(), 4);
        let after: Vec<(usize, Option<u32>)> =
            (0..t.capacity()).map(|i| (i, t.entry(i).copied())).collect();
        assert_eq!(before, after);

        t.shift = INITIAL_SHIFT;
        assert!((1..=4).all(|h| contains(&t, h)));
        t.check_invariants();
    }

    #[test]
    fn each_growth_emits_a_debug_event() {
        let mut t = RawTable::try_new().unwrap();
        let logs = captured_logs(|| {
            for h in 0..5 {
                insert(&mut t, h);
            }
        });
        let grew: Vec<&str> = logs
            .lines()
            .filter(|l| l.contains("grew open-address table"))
            .collect();
        assert_eq!(grew.len(), 1, "{logs}");
        assert!(grew[0].contains("DEBUG"));
        assert!(grew[0].contains("old_capacity=8"));
        assert!(grew[0].contains("new_capacity=16"));
        assert!(grew[0].contains("entries=4"));
    }

    #[test]
    fn clear_keeps_count_when_a_drop_panics() {
        struct Bomb(bool);
        impl Drop for Bomb {
            fn drop(&mut self) {
                if self.0 {
                    panic!("entry drop failed");
                }
            }
        }

        let mut t: RawTable<Bomb> = RawTable::try_new().unwrap();
        for h in 0..4u32 {
            match t.probe(h, |_| false).unwrap() {
                Probe::Vacant(i) => {
                    t.occupy(i, h, Bomb(h == 2));
                }
                Probe::Occupied(_) => unreachable!(),
            }
        }
        let r = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| t.clear()));
        assert!(r.is_err());
        let live = t.slots.iter().filter(|s| s.entry.is_some()).count();
        assert_eq!(live, t.len());
        assert!(t.len() < 4);

        t.clear();
        assert_eq!(t.len(), 0);
        assert_eq!(t.iter().count(), 0);
    }

    #[test]
    fn iterators_are_exact_sized() {
        let mut t = RawTable::try_new().unwrap();
        for h in 0..10 {
            insert(&mut t, h);
        }
        remove(&mut t, 4);
        assert_eq!(t.iter().len(), 9);
        assert_eq!(t.iter_mut().len(), 9);
        let mut all: Vec<u32> = t.into_entries().collect();
        all.sort_unstable();
        assert_eq!(all, vec![0, 1, 2, 3, 5, 6, 7, 8, 9]);
    }

    #[test]
    fn take_on_vacant_index_is_none() {
        let mut t: RawTable<u32> = RawTable::try_new().unwrap();
        assert_eq!(t.take(2), None);
        assert_eq!(t.take(99), None);
        assert_eq!(t.len(), 0);
    }
}
