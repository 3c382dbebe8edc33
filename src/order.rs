//! Arena-backed insertion-order index.
//!
//! `OrderList` owns the map's entries in a `SlotMap` arena and threads a
//! doubly-linked list through them, newest entry at the front. The arena
//! key of an entry is the stable locator the slot table stores: unlinking
//! by key is O(1), keys are generation-checked, and entries never move,
//! so keys stay valid across a table rebuild.

use core::marker::PhantomData;
use core::ops;
use core::ptr::NonNull;
use slotmap::{new_key_type, SlotMap};

new_key_type! {
    /// Stable locator for one live entry.
    pub(crate) struct EntryRef;
}

#[derive(Clone, Debug)]
pub(crate) struct Entry<K, V> {
    pub(crate) key: K,
    pub(crate) value: V,
    /// Hash of `key`, computed once at insertion. Probing and rebuilding
    /// use this copy and never re-enter the key's `Hash` impl.
    pub(crate) hash: u64,
    /// Index of the Occupied slot currently holding this entry.
    pub(crate) slot: usize,
    prev: Option<EntryRef>,
    next: Option<EntryRef>,
}

#[derive(Clone, Debug)]
pub(crate) struct OrderList<K, V> {
    entries: SlotMap<EntryRef, Entry<K, V>>,
    head: Option<EntryRef>,
    tail: Option<EntryRef>,
}

impl<K, V> OrderList<K, V> {
    pub(crate) fn new() -> Self {
        Self {
            entries: SlotMap::with_key(),
            head: None,
            tail: None,
        }
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub(crate) fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Most recently inserted live entry, if any.
    #[inline]
    pub(crate) fn head(&self) -> Option<EntryRef> {
        self.head
    }

    /// Next entry toward the least recent end.
    #[inline]
    pub(crate) fn next(&self, eref: EntryRef) -> Option<EntryRef> {
        self.entries[eref].next
    }

    pub(crate) fn get(&self, eref: EntryRef) -> Option<&Entry<K, V>> {
        self.entries.get(eref)
    }

    /// Store a new entry and link it at the front.
    pub(crate) fn push_front(&mut self, key: K, value: V, hash: u64, slot: usize) -> EntryRef {
        let eref = self.entries.insert(Entry {
            key,
            value,
            hash,
            slot,
            prev: None,
            next: self.head,
        });
        match self.head {
            Some(old) => self.entries[old].prev = Some(eref),
            None => self.tail = Some(eref),
        }
        self.head = Some(eref);
        eref
    }

    /// Remove an entry from the arena and splice it out of the list.
    pub(crate) fn unlink(&mut self, eref: EntryRef) -> Option<Entry<K, V>> {
        let entry = self.entries.remove(eref)?;
        match entry.prev {
            Some(p) => self.entries[p].next = entry.next,
            None => self.head = entry.next,
        }
        match entry.next {
            Some(n) => self.entries[n].prev = entry.prev,
            None => self.tail = entry.prev,
        }
        Some(entry)
    }

    pub(crate) fn pop_front(&mut self) -> Option<(K, V)> {
        let eref = self.head?;
        let entry = self.unlink(eref)?;
        Some((entry.key, entry.value))
    }

    pub(crate) fn pop_back(&mut self) -> Option<(K, V)> {
        let eref = self.tail?;
        let entry = self.unlink(eref)?;
        Some((entry.key, entry.value))
    }

    pub(crate) fn clear(&mut self) {
        self.entries.clear();
        self.head = None;
        self.tail = None;
    }

    pub(crate) fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            entries: &self.entries,
            front: self.head,
            back: self.tail,
            remaining: self.entries.len(),
        }
    }

    pub(crate) fn iter_mut(&mut self) -> IterMut<'_, K, V> {
        IterMut {
            front: self.head,
            back: self.tail,
            remaining: self.entries.len(),
            entries: NonNull::from(&mut self.entries),
            _marker: PhantomData,
        }
    }

    /// Walk the links both ways and check they agree with the arena.
    #[cfg(test)]
    pub(crate) fn assert_links(&self) {
        let mut forward = Vec::new();
        let mut cursor = self.head;
        while let Some(eref) = cursor {
            forward.push(eref);
            cursor = self.entries[eref].next;
        }
        let mut backward = Vec::new();
        let mut cursor = self.tail;
        while let Some(eref) = cursor {
            backward.push(eref);
            cursor = self.entries[eref].prev;
        }
        backward.reverse();
        assert_eq!(forward, backward, "forward and backward walks disagree");
        assert_eq!(forward.len(), self.entries.len(), "list length matches arena");
        if let Some(first) = forward.first() {
            assert_eq!(self.entries[*first].prev, None);
        }
        if let Some(last) = forward.last() {
            assert_eq!(self.entries[*last].next, None);
        }
    }
}

impl<K, V> ops::Index<EntryRef> for OrderList<K, V> {
    type Output = Entry<K, V>;

    #[inline]
    fn index(&self, eref: EntryRef) -> &Entry<K, V> {
        &self.entries[eref]
    }
}

impl<K, V> ops::IndexMut<EntryRef> for OrderList<K, V> {
    #[inline]
    fn index_mut(&mut self, eref: EntryRef) -> &mut Entry<K, V> {
        &mut self.entries[eref]
    }
}

/// Shared iterator over entries, newest first.
pub(crate) struct Iter<'a, K, V> {
    entries: &'a SlotMap<EntryRef, Entry<K, V>>,
    front: Option<EntryRef>,
    back: Option<EntryRef>,
    remaining: usize,
}

impl<K, V> Clone for Iter<'_, K, V> {
    fn clone(&self) -> Self {
        Iter {
            entries: self.entries,
            front: self.front,
            back: self.back,
            remaining: self.remaining,
        }
    }
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let eref = self.front?;
        let entry = self.entries.get(eref)?;
        self.remaining -= 1;
        self.front = entry.next;
        Some((&entry.key, &entry.value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<'a, K, V> DoubleEndedIterator for Iter<'a, K, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let eref = self.back?;
        let entry = self.entries.get(eref)?;
        self.remaining -= 1;
        self.back = entry.prev;
        Some((&entry.key, &entry.value))
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {}
impl<K, V> core::iter::FusedIterator for Iter<'_, K, V> {}

/// Mutable iterator over entries, newest first. Keys stay shared; values
/// are handed out mutably.
pub(crate) struct IterMut<'a, K, V> {
    front: Option<EntryRef>,
    back: Option<EntryRef>,
    remaining: usize,
    entries: NonNull<SlotMap<EntryRef, Entry<K, V>>>,
    _marker: PhantomData<&'a mut OrderList<K, V>>,
}

impl<'a, K, V> IterMut<'a, K, V> {
    /// The chain from `front` to `back` never revisits an arena key, so
    /// each call below resolves a distinct entry and the returned borrows
    /// are disjoint for the iterator's lifetime.
    #[inline]
    fn resolve(&mut self, eref: EntryRef) -> Option<&'a mut Entry<K, V>> {
        // SAFETY: `self.entries` was created from an exclusive borrow held
        // for 'a, and per the above no entry is resolved twice.
        let entries = unsafe { &mut *self.entries.as_ptr() };
        entries.get_mut(eref)
    }
}

impl<'a, K, V> Iterator for IterMut<'a, K, V> {
    type Item = (&'a K, &'a mut V);

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let eref = self.front?;
        let entry = self.resolve(eref)?;
        self.remaining -= 1;
        self.front = entry.next;
        Some((&entry.key, &mut entry.value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<'a, K, V> DoubleEndedIterator for IterMut<'a, K, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let eref = self.back?;
        let entry = self.resolve(eref)?;
        self.remaining -= 1;
        self.back = entry.prev;
        Some((&entry.key, &mut entry.value))
    }
}

impl<K, V> ExactSizeIterator for IterMut<'_, K, V> {}
impl<K, V> core::iter::FusedIterator for IterMut<'_, K, V> {}

/// Draining iterator used by the map's consuming `into_iter`.
pub(crate) struct IntoIter<K, V> {
    list: OrderList<K, V>,
}

impl<K, V> Iterator for IntoIter<K, V> {
    type Item = (K, V);

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.list.pop_front()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let len = self.list.len();
        (len, Some(len))
    }
}

impl<K, V> DoubleEndedIterator for IntoIter<K, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.list.pop_back()
    }
}

impl<K, V> ExactSizeIterator for IntoIter<K, V> {}
impl<K, V> core::iter::FusedIterator for IntoIter<K, V> {}

impl<K, V> IntoIterator for OrderList<K, V> {
    type Item = (K, V);
    type IntoIter = IntoIter<K, V>;

    fn into_iter(self) -> IntoIter<K, V> {
        IntoIter { list: self }
    }
}
