//! Set: unique values in a `RawTable<T>`.
//!
//! Same engine as `Map`; the value is its own key, so there is no overwrite
//! path and `add` simply reports whether the value was new.

use crate::error::{infallible, Result};
use crate::hash::make_hash;
use crate::raw_table::{Probe, RawIntoIter, RawIter, RawTable};
use crate::reentrancy::DebugReentrancy;
use core::borrow::Borrow;
use core::fmt;
use core::hash::{BuildHasher, Hash};
use std::collections::hash_map::RandomState;

/// Open-addressing hash set with Fibonacci slot placement.
pub struct Set<T, S = RandomState> {
    hasher: S,
    pub(crate) table: RawTable<T>,
    reentrancy: DebugReentrancy,
}

impl<T> Set<T>
where
    T: Eq + Hash,
{
    pub fn new() -> Self {
        Self::with_hasher(Default::default())
    }

    pub fn try_new() -> Result<Self> {
        Self::try_with_hasher(Default::default())
    }
}

impl<T> Default for Set<T>
where
    T: Eq + Hash,
{
    fn default() -> Self {
        Self::new()
    }
}

pub struct Iter<'a, T> {
    it: RawIter<'a, T>,
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;
    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.it.next()
    }
    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        self.it.size_hint()
    }
}

impl<T> ExactSizeIterator for Iter<'_, T> {}

pub struct IntoIter<T> {
    it: RawIntoIter<T>,
}

impl<T> Iterator for IntoIter<T> {
    type Item = T;
    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.it.next()
    }
    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        self.it.size_hint()
    }
}

impl<T> ExactSizeIterator for IntoIter<T> {}

impl<T, S> Set<T, S>
where
    T: Eq + Hash,
    S: BuildHasher,
{
    pub fn with_hasher(hasher: S) -> Self {
        infallible(Self::try_with_hasher(hasher))
    }

    pub fn try_with_hasher(hasher: S) -> Result<Self> {
        Ok(Self {
            hasher,
            table: RawTable::try_new()?,
            reentrancy: DebugReentrancy::new(),
        })
    }

    pub fn with_capacity_and_hasher(capacity: usize, hasher: S) -> Self {
        infallible(Self::try_with_capacity_and_hasher(capacity, hasher))
    }

    pub fn try_with_capacity_and_hasher(capacity: usize, hasher: S) -> Result<Self> {
        Ok(Self {
            hasher,
            table: RawTable::try_with_capacity(capacity)?,
            reentrancy: DebugReentrancy::new(),
        })
    }

    pub fn hasher(&self) -> &S {
        &self.hasher
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.table.capacity()
    }

    pub fn load_factor(&self) -> usize {
        self.table.load_factor()
    }

    /// Returns `true` if `value` was inserted, `false` if an equal value was
    /// already present (the stored one is kept).
    pub fn add(&mut self, value: T) -> bool {
        infallible(self.try_add(value))
    }

    pub fn try_add(&mut self, value: T) -> Result<bool> {
        let _g = self.reentrancy.enter();
        let hash = make_hash(&self.hasher, &value);
        match self.table.probe(hash, |v| *v == value)? {
            Probe::Occupied(_) => Ok(false),
            Probe::Vacant(idx) => {
                self.table.occupy(idx, hash, value);
                Ok(true)
            }
        }
    }

    fn find<Q>(&self, q: &Q) -> Option<usize>
    where
        T: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let hash = make_hash(&self.hasher, q);
        self.table.find(hash, |v| v.borrow() == q)
    }

    pub fn contains<Q>(&self, q: &Q) -> bool
    where
        T: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let _g = self.reentrancy.enter();
        self.find(q).is_some()
    }

    /// The stored value equal to `q`.
    pub fn get<Q>(&self, q: &Q) -> Option<&T>
    where
        T: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let _g = self.reentrancy.enter();
        let idx = self.find(q)?;
        self.table.entry(idx)
    }

    pub fn remove<Q>(&mut self, q: &Q) -> bool
    where
        T: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.take(q).is_some()
    }

    /// Removes and returns the stored value equal to `q`.
    pub fn take<Q>(&mut self, q: &Q) -> Option<T>
    where
        T: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let _g = self.reentrancy.enter();
        let idx = self.find(q)?;
        self.table.take(idx)
    }

    pub fn clear(&mut self) {
        let _g = self.reentrancy.enter();
        self.table.clear();
    }

    pub fn iter(&self) -> Iter<'_, T> {
        Iter {
            it: self.table.iter(),
        }
    }
}

impl<T, S> IntoIterator for Set<T, S> {
    type Item = T;
    type IntoIter = IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        IntoIter {
            it: self.table.into_entries(),
        }
    }
}

impl<'a, T, S> IntoIterator for &'a Set<T, S>
where
    T: Eq + Hash,
    S: BuildHasher,
{
    type Item = &'a T;
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<T, S> Extend<T> for Set<T, S>
where
    T: Eq + Hash,
    S: BuildHasher,
{
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for v in iter {
            self.add(v);
        }
    }
}

impl<T, S> FromIterator<T> for Set<T, S>
where
    T: Eq + Hash,
    S: BuildHasher + Default,
{
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut s = Self::with_hasher(S::default());
        s.extend(iter);
        s
    }
}

impl<T, S> fmt::Debug for Set<T, S>
where
    T: Eq + Hash + fmt::Debug,
    S: BuildHasher,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}
