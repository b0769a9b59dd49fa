//! List: growable array with positional insert and remove.
//!
//! Independent of `Map`/`Set`. Starts with room for 4 values and doubles
//! when full. Out-of-range indices and reads from an empty list are caller
//! bugs and panic.

use core::fmt;
use core::ops::Deref;

const INITIAL_CAPACITY: usize = 4;

pub struct List<T> {
    items: Vec<T>,
}

impl<T> List<T> {
    pub fn new() -> Self {
        Self {
            items: Vec::with_capacity(INITIAL_CAPACITY),
        }
    }

    /// Panics if `capacity` is zero.
    pub fn with_capacity(capacity: usize) -> Self {
        assert!(capacity > 0, "list capacity must be positive");
        Self {
            items: Vec::with_capacity(capacity),
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.items.capacity()
    }

    #[inline]
    fn reserve_one(&mut self) {
        if self.items.len() == self.items.capacity() {
            // Double rather than let Vec pick its own growth.
            let extra = self.items.capacity().max(1);
            self.items.reserve_exact(extra);
        }
    }

    /// Appends `value`.
    pub fn push(&mut self, value: T) {
        self.reserve_one();
        self.items.push(value);
    }

    /// Inserts at `index`, shifting the tail right. `index == len` appends.
    pub fn insert(&mut self, index: usize, value: T) {
        assert!(
            index <= self.items.len(),
            "insert index {index} out of bounds for length {}",
            self.items.len()
        );
        self.reserve_one();
        self.items.insert(index, value);
    }

    /// Removes the value at `index`, shifting the tail left.
    pub fn remove(&mut self, index: usize) -> T {
        assert!(
            index < self.items.len(),
            "remove index {index} out of bounds for length {}",
            self.items.len()
        );
        self.items.remove(index)
    }

    pub fn get(&self, index: usize) -> &T {
        assert!(
            index < self.items.len(),
            "index {index} out of bounds for length {}",
            self.items.len()
        );
        &self.items[index]
    }

    pub fn get_mut(&mut self, index: usize) -> &mut T {
        assert!(
            index < self.items.len(),
            "index {index} out of bounds for length {}",
            self.items.len()
        );
        &mut self.items[index]
    }

    /// Overwrites the value at `index`; `index == len` appends.
    pub fn set(&mut self, index: usize, value: T) {
        assert!(
            index <= self.items.len(),
            "set index {index} out of bounds for length {}",
            self.items.len()
        );
        if index == self.items.len() {
            self.push(value);
        } else {
            self.items[index] = value;
        }
    }

    /// Last value. Panics if empty.
    pub fn peek(&self) -> &T {
        self.items.last().expect("peek on empty list")
    }

    /// Removes the last value. Panics if empty.
    pub fn pop(&mut self) -> T {
        self.items.pop().expect("pop on empty list")
    }

    /// Forgets every value; capacity is kept.
    pub fn clear(&mut self) {
        self.items.clear();
    }

}

impl<T> Default for List<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Deref for List<T> {
    type Target = [T];
    fn deref(&self) -> &[T] {
        &self.items
    }
}

impl<T> From<Vec<T>> for List<T> {
    fn from(items: Vec<T>) -> Self {
        Self { items }
    }
}

impl<T> FromIterator<T> for List<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut l = Self::new();
        l.extend(iter);
        l
    }
}

impl<T> Extend<T> for List<T> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for v in iter {
            self.push(v);
        }
    }
}

impl<T> IntoIterator for List<T> {
    type Item = T;
    type IntoIter = std::vec::IntoIter<T>;
    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl<T: fmt::Debug> fmt::Debug for List<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.items.iter()).finish()
    }
}
