//! Striped read/write locking over an indexed collection.
//!
//! Items are spread over a fixed number of stripes, item `i` living in stripe
//! `i % stripes`. Writers lock only the stripe that owns their index, so
//! writes to items in different stripes proceed in parallel while writes to the
//! same item are serialized.
//!
//! Readers that need to look at *every* item (such as a nearest-center query
//! over all cluster centers) must take [`LockBank::read_all`], which acquires
//! every stripe for reading, always in ascending stripe order. The snapshot it
//! returns can therefore never observe a partially applied write. Writers hold
//! at most one stripe and never wait on anything while holding it, so the
//! ascending order is enough to rule out deadlock.

use std::sync::{PoisonError, RwLock, RwLockReadGuard};

/// Default number of stripes.
pub const STRIPES: usize = 256;

#[derive(Debug)]
pub struct LockBank<T> {
    stripes: Vec<RwLock<Vec<T>>>,
    len: usize,
}

impl<T> LockBank<T> {
    /// Spreads `items` over `stripes` locks. The stripe count is capped at the
    /// number of items; there is always at least one stripe.
    pub fn new(items: Vec<T>, stripes: usize) -> Self {
        let len = items.len();
        let count = stripes.min(len).max(1);
        let mut buckets: Vec<Vec<T>> = (0..count)
            .map(|_| Vec::with_capacity(len / count + 1))
            .collect();
        for (i, item) in items.into_iter().enumerate() {
            buckets[i % count].push(item);
        }
        Self {
            stripes: buckets.into_iter().map(RwLock::new).collect(),
            len,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    fn locate(&self, index: usize) -> (usize, usize) {
        let count = self.stripes.len();
        (index % count, index / count)
    }

    /// Runs `f` on item `index` with its stripe locked for writing.
    ///
    /// # Panics
    ///
    /// If `index >= self.len()`.
    pub fn write<R>(&self, index: usize, f: impl FnOnce(&mut T) -> R) -> R {
        let (stripe, slot) = self.locate(index);
        let mut guard = self.stripes[stripe]
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        f(&mut guard[slot])
    }

    /// Runs `f` on item `index` with its stripe locked for reading.
    ///
    /// # Panics
    ///
    /// If `index >= self.len()`.
    pub fn read<R>(&self, index: usize, f: impl FnOnce(&T) -> R) -> R {
        let (stripe, slot) = self.locate(index);
        let guard = self.stripes[stripe]
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        f(&guard[slot])
    }

    /// Locks every stripe for reading and returns a consistent view of all items.
    ///
    /// The view must be dropped before the same thread calls [`LockBank::write`].
    pub fn read_all(&self) -> Snapshot<'_, T> {
        let guards = self
            .stripes
            .iter()
            .map(|stripe| stripe.read().unwrap_or_else(PoisonError::into_inner))
            .collect();
        Snapshot {
            guards,
            len: self.len,
        }
    }

    /// Dissolves the bank, returning the items in index order.
    pub fn into_inner(self) -> Vec<T> {
        let len = self.len;
        let mut stripes: Vec<std::vec::IntoIter<T>> = self
            .stripes
            .into_iter()
            .map(|stripe| {
                stripe
                    .into_inner()
                    .unwrap_or_else(PoisonError::into_inner)
                    .into_iter()
            })
            .collect();
        let count = stripes.len();
        (0..len).filter_map(|i| stripes[i % count].next()).collect()
    }
}

/// All stripes of a [`LockBank`] held for reading.
pub struct Snapshot<'a, T> {
    guards: Vec<RwLockReadGuard<'a, Vec<T>>>,
    len: usize,
}

impl<T> Snapshot<'_, T> {
    pub fn get(&self, index: usize) -> Option<&T> {
        if index >= self.len {
            return None;
        }
        let count = self.guards.len();
        self.guards[index % count].get(index / count)
    }

    /// Items in index order.
    pub fn iter(&self) -> impl Iterator<Item = &T> + '_ {
        (0..self.len).filter_map(move |i| self.get(i))
    }
}
