//! Map: unique keys with one value each, stored in a `RawTable<(K, V)>`.

use crate::error::{infallible, Result};
use crate::hash::make_hash;
use crate::raw_table::{Probe, RawIntoIter, RawIter, RawIterMut, RawTable};
use crate::reentrancy::DebugReentrancy;
use core::borrow::Borrow;
use core::fmt;
use core::hash::{BuildHasher, Hash};
use std::collections::hash_map::RandomState;

/// Open-addressing hash map with Fibonacci slot placement.
///
/// Starts at 8 slots and doubles whenever half the slots are in use. It
/// never shrinks. Removal shifts later entries back instead of leaving
/// tombstones, so lookups stay short no matter how many keys were deleted.
pub struct Map<K, V, S = RandomState> {
    hasher: S,
    pub(crate) table: RawTable<(K, V)>,
    reentrancy: DebugReentrancy,
}

impl<K, V> Map<K, V>
where
    K: Eq + Hash,
{
    /// Creates an empty map with 8 slots.
    ///
    /// Aborts if the slot array cannot be allocated; see [`Map::try_new`].
    pub fn new() -> Self {
        Self::with_hasher(Default::default())
    }

    pub fn try_new() -> Result<Self> {
        Self::try_with_hasher(Default::default())
    }
}

impl<K, V> Default for Map<K, V>
where
    K: Eq + Hash,
{
    fn default() -> Self {
        Self::new()
    }
}

/// Iterator over `(&K, &V)` in slot order.
pub struct Iter<'a, K, V> {
    it: RawIter<'a, (K, V)>,
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);
    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.it.next().map(|(k, v)| (k, v))
    }
    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        self.it.size_hint()
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {}

/// Iterator over `(&K, &mut V)` in slot order.
pub struct IterMut<'a, K, V> {
    it: RawIterMut<'a, (K, V)>,
}

impl<'a, K, V> Iterator for IterMut<'a, K, V> {
    type Item = (&'a K, &'a mut V);
    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.it.next().map(|(k, v)| (&*k, v))
    }
    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        self.it.size_hint()
    }
}

impl<K, V> ExactSizeIterator for IterMut<'_, K, V> {}

/// Owning iterator over `(K, V)`.
pub struct IntoIter<K, V> {
    it: RawIntoIter<(K, V)>,
}

impl<K, V> Iterator for IntoIter<K, V> {
    type Item = (K, V);
    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.it.next()
    }
    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        self.it.size_hint()
    }
}

impl<K, V> ExactSizeIterator for IntoIter<K, V> {}

impl<K, V, S> Map<K, V, S>
where
    K: Eq + Hash,
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

    /// Creates a map that holds `capacity` entries before its first growth.
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

    /// Number of slots; always a power of two.
    pub fn capacity(&self) -> usize {
        self.table.capacity()
    }

    /// Entry count at which the next insert doubles the slot array.
    pub fn load_factor(&self) -> usize {
        self.table.load_factor()
    }

    /// Inserts `key -> value` only if `key` is absent.
    ///
    /// Returns `false` and drops `key`/`value` when the key is already
    /// present; the stored value is left unchanged.
    pub fn add(&mut self, key: K, value: V) -> bool {
        infallible(self.try_add(key, value))
    }

    /// Like [`Map::add`], but reports a failed growth instead of aborting.
    /// On error the map is unchanged.
    pub fn try_add(&mut self, key: K, value: V) -> Result<bool> {
        let _g = self.reentrancy.enter();
        let hash = make_hash(&self.hasher, &key);
        match self.table.probe(hash, |(k, _)| *k == key)? {
            Probe::Occupied(_) => Ok(false),
            Probe::Vacant(idx) => {
                self.table.occupy(idx, hash, (key, value));
                Ok(true)
            }
        }
    }

    /// Inserts or overwrites. Returns the previous value, if any; the
    /// originally stored key is kept on overwrite.
    pub fn set(&mut self, key: K, value: V) -> Option<V> {
        infallible(self.try_set(key, value))
    }

    pub fn try_set(&mut self, key: K, value: V) -> Result<Option<V>> {
        let _g = self.reentrancy.enter();
        let hash = make_hash(&self.hasher, &key);
        match self.table.probe(hash, |(k, _)| *k == key)? {
            Probe::Occupied(idx) => Ok(self
                .table
                .entry_mut(idx)
                .map(|(_, v)| core::mem::replace(v, value))),
            Probe::Vacant(idx) => {
                self.table.occupy(idx, hash, (key, value));
                Ok(None)
            }
        }
    }

    fn find<Q>(&self, q: &Q) -> Option<usize>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let hash = make_hash(&self.hasher, q);
        self.table.find(hash, |(k, _)| k.borrow() == q)
    }

    pub fn get<Q>(&self, q: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let _g = self.reentrancy.enter();
        let idx = self.find(q)?;
        self.table.entry(idx).map(|(_, v)| v)
    }

    /// Value for `q`, or `default` when absent.
    pub fn get_or<'a, Q>(&'a self, q: &Q, default: &'a V) -> &'a V
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.get(q).unwrap_or(default)
    }

    pub fn get_key_value<Q>(&self, q: &Q) -> Option<(&K, &V)>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let _g = self.reentrancy.enter();
        let idx = self.find(q)?;
        self.table.entry(idx).map(|(k, v)| (k, v))
    }

    pub fn get_mut<Q>(&mut self, q: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let _g = self.reentrancy.enter();
        let idx = self.find(q)?;
        self.table.entry_mut(idx).map(|(_, v)| v)
    }

    pub fn contains_key<Q>(&self, q: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let _g = self.reentrancy.enter();
        self.find(q).is_some()
    }

    pub fn remove<Q>(&mut self, q: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.remove_entry(q).map(|(_, v)| v)
    }

    /// Removes `q` and returns the stored key and value as they were just
    /// before removal.
    pub fn remove_entry<Q>(&mut self, q: &Q) -> Option<(K, V)>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let _g = self.reentrancy.enter();
        let idx = self.find(q)?;
        self.table.take(idx)
    }

    /// Removes every entry; the slot array keeps its size.
    pub fn clear(&mut self) {
        let _g = self.reentrancy.enter();
        self.table.clear();
    }

    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            it: self.table.iter(),
        }
    }

    pub fn iter_mut(&mut self) -> IterMut<'_, K, V> {
        IterMut {
            it: self.table.iter_mut(),
        }
    }

    pub fn keys(&self) -> impl ExactSizeIterator<Item = &K> + '_ {
        self.iter().map(|(k, _)| k)
    }

    pub fn values(&self) -> impl ExactSizeIterator<Item = &V> + '_ {
        self.iter().map(|(_, v)| v)
    }
}

impl<K, V, S> IntoIterator for Map<K, V, S> {
    type Item = (K, V);
    type IntoIter = IntoIter<K, V>;

    fn into_iter(self) -> Self::IntoIter {
        IntoIter {
            it: self.table.into_entries(),
        }
    }
}

impl<'a, K, V, S> IntoIterator for &'a Map<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher,
{
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<K, V, S> Extend<(K, V)> for Map<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher,
{
    /// Later pairs overwrite earlier ones with an equal key.
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (k, v) in iter {
            self.set(k, v);
        }
    }
}

impl<K, V, S> FromIterator<(K, V)> for Map<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher + Default,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut m = Self::with_hasher(S::default());
        m.extend(iter);
        m
    }
}

impl<K, V, S> fmt::Debug for Map<K, V, S>
where
    K: Eq + Hash + fmt::Debug,
    V: fmt::Debug,
    S: BuildHasher,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}
