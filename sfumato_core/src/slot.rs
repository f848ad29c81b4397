// Copyright 2026 the Sfumato Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Fixed-capacity slot index pool.
//!
//! [`SlotPool`] hands out indices in `0..capacity` and takes them back in
//! any order. The capacity is fixed at construction; the pool never grows.
//! [`ParamTable`](crate::params::ParamTable) uses one pool to assign table
//! rows to effect instances.

use alloc::vec::Vec;

/// A fixed pool of reusable slot indices.
///
/// Free indices are kept as a stack, so the most recently released index
/// is reacquired first. A fresh pool drains from `capacity - 1` down to
/// `0`.
#[derive(Clone, Debug)]
pub struct SlotPool {
    capacity: u32,
    free: Vec<u32>,
}

impl SlotPool {
    /// Creates a pool with all `capacity` indices free.
    #[must_use]
    pub fn new(capacity: u32) -> Self {
        Self {
            capacity,
            free: (0..capacity).collect(),
        }
    }

    /// Total number of indices managed by this pool.
    #[inline]
    #[must_use]
    pub const fn capacity(&self) -> u32 {
        self.capacity
    }

    /// Number of indices currently free.
    #[inline]
    #[must_use]
    pub fn free_len(&self) -> usize {
        self.free.len()
    }

    /// Returns `true` if no index is free.
    #[inline]
    #[must_use]
    pub fn is_exhausted(&self) -> bool {
        self.free.is_empty()
    }

    /// Takes a free index out of the pool, or `None` if all are in use.
    #[inline]
    pub fn acquire(&mut self) -> Option<u32> {
        self.free.pop()
    }

    /// Returns an index to the pool.
    ///
    /// # Panics
    ///
    /// Panics if `index` is outside `0..capacity`. Releasing an index that
    /// is already free is a caller bug and trips a debug assertion.
    pub fn release(&mut self, index: u32) {
        assert!(
            index < self.capacity,
            "released index {index} out of range (capacity {})",
            self.capacity
        );
        debug_assert!(
            !self.free.contains(&index),
            "index {index} released twice"
        );
        self.free.push(index);
    }
}
