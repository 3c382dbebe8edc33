//! Double-hash probe sequences.
//!
//! A `ProbeSeq` turns a hash into the path of slot indices an operation
//! visits: start `hash % capacity`, stride `1 + hash % (capacity - 1)`.
//! The stride is never zero, and for a prime capacity it is coprime with
//! the table length, so the path visits every slot exactly once. The
//! iterator ends after one full cycle rather than wrapping around; callers
//! rely on the load-factor bound to stop at an empty slot long before that.

use core::iter::FusedIterator;

pub(crate) struct ProbeSeq {
    capacity: usize,
    pos: usize,
    step: usize,
    remaining: usize,
}

impl ProbeSeq {
    pub(crate) fn new(hash: u64, capacity: usize) -> Self {
        debug_assert!(capacity >= 2, "probe needs at least two slots");
        let cap = capacity as u64;
        Self {
            capacity,
            pos: (hash % cap) as usize,
            step: (1 + hash % (cap - 1)) as usize,
            remaining: capacity,
        }
    }
}

impl Iterator for ProbeSeq {
    type Item = usize;

    #[inline]
    fn next(&mut self) -> Option<usize> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;
        let current = self.pos;
        self.pos = (self.pos + self.step) % self.capacity;
        Some(current)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl ExactSizeIterator for ProbeSeq {}
impl FusedIterator for ProbeSeq {}
