//! The map core: a tri-state slot table probed by double hashing, kept in
//! sync with the arena-backed recency list.
//!
//! Invariants every operation preserves:
//! - a key occupies at most one `Occupied` slot, and that slot stores the
//!   arena key of the entry holding it, while the entry stores the slot
//!   index back;
//! - `used` counts `Occupied` plus `Deleted` slots; removal tombstones a
//!   slot without decrementing it, and only a rebuild resets it;
//! - `2 * used <= capacity` whenever a public call returns, restored by a
//!   synchronous rebuild into the next prime capacity;
//! - the order list holds exactly the live entries, most recent at the
//!   front; a rebuild re-probes slots but never touches the list, so
//!   iteration order survives growth.

use core::borrow::Borrow;
use core::fmt;
use core::hash::{BuildHasher, Hash};
use core::iter::FusedIterator;
use core::ops;
use std::collections::hash_map::RandomState;

use crate::capacity::{next_capacity, INITIAL_CAPACITY};
use crate::order::{self, EntryRef, OrderList};
use crate::probe::ProbeSeq;

/// One slot of the probe table.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum Slot {
    Empty,
    Occupied(EntryRef),
    Deleted,
}

/// Where an insert probe ended up.
enum Probed {
    /// The key is already present.
    Hit { entry: EntryRef },
    /// The slot to claim: the first tombstone passed on the probe path,
    /// or the terminating empty slot when the path had none.
    Vacant { claim: usize, was_empty: bool },
}

/// A hash map that iterates most-recently-inserted first.
///
/// Lookup walks a double-hashed probe sequence over a prime-sized slot
/// table; the entries themselves live in a stable arena threaded with
/// recency links. `insert` never overwrites: offering a present key is a
/// no-op that reports `false`. Removal tombstones the slot so longer
/// probe chains stay intact, and growth rebuilds the table without
/// disturbing iteration order.
///
/// # Examples
///
/// ```
/// use recency_hashmap::RecencyHashMap;
///
/// let mut recent = RecencyHashMap::new();
/// recent.insert("alpha", 1);
/// recent.insert("beta", 2);
/// recent.insert("gamma", 3);
///
/// let names: Vec<&str> = recent.keys().copied().collect();
/// assert_eq!(names, ["gamma", "beta", "alpha"]);
/// ```
#[derive(Clone)]
pub struct RecencyHashMap<K, V, S = RandomState> {
    hasher: S,
    slots: Vec<Slot>,
    order: OrderList<K, V>,
    /// Occupied plus Deleted slots. Only a rebuild brings it back down
    /// to the live count.
    used: usize,
}

impl<K, V> RecencyHashMap<K, V, RandomState> {
    /// Creates an empty map with the default hasher.
    pub fn new() -> Self {
        Self::with_hasher(RandomState::new())
    }
}

impl<K, V, S> RecencyHashMap<K, V, S> {
    /// Creates an empty map using `hasher` for key hashing.
    ///
    /// The slot table is allocated up front at the first capacity of the
    /// growth schedule.
    pub fn with_hasher(hasher: S) -> Self {
        Self {
            hasher,
            slots: vec![Slot::Empty; INITIAL_CAPACITY],
            order: OrderList::new(),
            used: 0,
        }
    }

    /// Number of live entries.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Current slot-table length. Always prime, starting at 3; tombstones
    /// count against it until a rebuild.
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Returns a reference to the map's `BuildHasher`.
    pub fn hasher(&self) -> &S {
        &self.hasher
    }

    /// Iterates `(&K, &V)`, most recently inserted first.
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            inner: self.order.iter(),
        }
    }

    /// Iterates `(&K, &mut V)`, most recently inserted first.
    pub fn iter_mut(&mut self) -> IterMut<'_, K, V> {
        IterMut {
            inner: self.order.iter_mut(),
        }
    }

    /// Iterates keys, most recently inserted first.
    pub fn keys(&self) -> Keys<'_, K, V> {
        Keys {
            inner: self.order.iter(),
        }
    }

    /// Iterates values, most recently inserted first.
    pub fn values(&self) -> Values<'_, K, V> {
        Values {
            inner: self.order.iter(),
        }
    }

    /// Iterates values mutably, most recently inserted first.
    pub fn values_mut(&mut self) -> ValuesMut<'_, K, V> {
        ValuesMut {
            inner: self.order.iter_mut(),
        }
    }

    /// Keeps only the entries `keep` approves, visiting them most recent
    /// first. Rejected entries leave tombstones behind, exactly as
    /// `remove` would.
    pub fn retain<F>(&mut self, mut keep: F)
    where
        F: FnMut(&K, &mut V) -> bool,
    {
        let mut cursor = self.order.head();
        while let Some(eref) = cursor {
            cursor = self.order.next(eref);
            let entry = &mut self.order[eref];
            if !keep(&entry.key, &mut entry.value) {
                self.slots[entry.slot] = Slot::Deleted;
                self.order.unlink(eref);
            }
        }
    }

    /// Drops every entry and resets all slots to empty, tombstones
    /// included. Capacity is retained.
    pub fn clear(&mut self) {
        self.order.clear();
        self.slots.fill(Slot::Empty);
        self.used = 0;
    }
}

impl<K, V, S> RecencyHashMap<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher,
{
    /// Returns a reference to the value stored for `key`.
    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let hash = self.make_hash(key);
        let (_, eref) = self.locate(hash, key)?;
        Some(&self.order[eref].value)
    }

    /// Returns the stored key and value for `key`.
    pub fn get_key_value<Q>(&self, key: &Q) -> Option<(&K, &V)>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let hash = self.make_hash(key);
        let (_, eref) = self.locate(hash, key)?;
        let entry = &self.order[eref];
        Some((&entry.key, &entry.value))
    }

    pub fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let hash = self.make_hash(key);
        let (_, eref) = self.locate(hash, key)?;
        Some(&mut self.order[eref].value)
    }

    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let hash = self.make_hash(key);
        self.locate(hash, key).is_some()
    }

    /// Inserts `key → value` if the key is absent and reports whether it
    /// inserted. A present key is left untouched and the offered pair is
    /// dropped.
    ///
    /// A successful insert may grow the table to the next prime capacity;
    /// growth keeps iteration order.
    ///
    /// ```
    /// use recency_hashmap::RecencyHashMap;
    ///
    /// let mut map = RecencyHashMap::new();
    /// assert!(map.insert("k", 1));
    /// assert!(!map.insert("k", 2));
    /// assert_eq!(map["k"], 1);
    /// ```
    pub fn insert(&mut self, key: K, value: V) -> bool {
        let hash = self.make_hash(&key);
        match self.locate_for_insert(hash, &key) {
            Probed::Hit { .. } => false,
            Probed::Vacant { claim, was_empty } => {
                self.commit(key, value, hash, claim, was_empty);
                true
            }
        }
    }

    /// Returns the value stored for `key`, inserting `make()` first when
    /// the key is absent.
    ///
    /// `make` runs only on a miss. The returned reference stays valid
    /// even when the insert grows the table, since entries never move in
    /// the arena.
    ///
    /// ```
    /// use recency_hashmap::RecencyHashMap;
    ///
    /// let mut map = RecencyHashMap::new();
    /// let v = map.get_or_insert_with("k", || 1);
    /// *v += 1;
    /// assert_eq!(map["k"], 2);
    /// ```
    pub fn get_or_insert_with<F>(&mut self, key: K, make: F) -> &mut V
    where
        F: FnOnce() -> V,
    {
        let hash = self.make_hash(&key);
        let eref = match self.locate_for_insert(hash, &key) {
            Probed::Hit { entry } => entry,
            Probed::Vacant { claim, was_empty } => {
                self.commit(key, make(), hash, claim, was_empty)
            }
        };
        &mut self.order[eref].value
    }

    /// `get_or_insert_with` with `V::default` as the missing value.
    ///
    /// ```
    /// use recency_hashmap::RecencyHashMap;
    ///
    /// let mut counts: RecencyHashMap<&str, u32> = RecencyHashMap::new();
    /// *counts.get_or_insert_default("hits") += 1;
    /// *counts.get_or_insert_default("hits") += 1;
    /// assert_eq!(counts["hits"], 2);
    /// ```
    pub fn get_or_insert_default(&mut self, key: K) -> &mut V
    where
        V: Default,
    {
        self.get_or_insert_with(key, V::default)
    }

    /// Removes `key` and returns its value. Removing an absent key is a
    /// no-op.
    pub fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.remove_entry(key).map(|(_, value)| value)
    }

    /// Removes `key` and returns the owned pair.
    ///
    /// The slot becomes a tombstone rather than empty, keeping probe
    /// chains that pass through it intact. Removal never shrinks the
    /// table or frees tombstones; only a later insert-triggered rebuild
    /// does.
    pub fn remove_entry<Q>(&mut self, key: &Q) -> Option<(K, V)>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let hash = self.make_hash(key);
        let (slot, eref) = self.locate(hash, key)?;
        self.slots[slot] = Slot::Deleted;
        let entry = self.order.unlink(eref)?;
        Some((entry.key, entry.value))
    }

    fn make_hash<Q>(&self, q: &Q) -> u64
    where
        Q: ?Sized + Hash,
    {
        self.hasher.hash_one(q)
    }

    /// Probes for a present key. Tombstones are passed through; the first
    /// empty slot ends the search.
    fn locate<Q>(&self, hash: u64, key: &Q) -> Option<(usize, EntryRef)>
    where
        K: Borrow<Q>,
        Q: ?Sized + Eq,
    {
        for idx in ProbeSeq::new(hash, self.slots.len()) {
            match self.slots[idx] {
                Slot::Empty => return None,
                Slot::Deleted => {}
                Slot::Occupied(eref) => {
                    let entry = &self.order[eref];
                    if entry.hash == hash && entry.key.borrow() == key {
                        return Some((idx, eref));
                    }
                }
            }
        }
        None
    }

    /// Probes for an insert: a hit on the key, or the slot to claim.
    fn locate_for_insert(&self, hash: u64, key: &K) -> Probed {
        let mut claim = None;
        for idx in ProbeSeq::new(hash, self.slots.len()) {
            match self.slots[idx] {
                Slot::Empty => {
                    return Probed::Vacant {
                        claim: claim.unwrap_or(idx),
                        was_empty: claim.is_none(),
                    };
                }
                Slot::Deleted => {
                    if claim.is_none() {
                        claim = Some(idx);
                    }
                }
                Slot::Occupied(eref) => {
                    let entry = &self.order[eref];
                    if entry.hash == hash && entry.key == *key {
                        return Probed::Hit { entry: eref };
                    }
                }
            }
        }
        // The load bound keeps at least one slot empty, and the probe
        // cycle visits every slot.
        unreachable!("probe cycle over a half-empty table found no vacancy")
    }

    /// Stores a new entry in `claim` and links it at the order front,
    /// then grows if the commit pushed the table past half full.
    fn commit(&mut self, key: K, value: V, hash: u64, claim: usize, was_empty: bool) -> EntryRef {
        let eref = self.order.push_front(key, value, hash, claim);
        self.slots[claim] = Slot::Occupied(eref);
        if was_empty {
            self.used += 1;
        }
        self.maybe_grow();
        eref
    }

    fn maybe_grow(&mut self) {
        if 2 * self.used > self.slots.len() {
            self.grow();
        }
    }

    /// Rebuilds the table at the next prime capacity, re-probing every
    /// live entry front to back with its stored hash. Tombstones vanish;
    /// the order list is not touched, so iteration order is unchanged.
    fn grow(&mut self) {
        let capacity = next_capacity(self.slots.len());
        let mut slots = vec![Slot::Empty; capacity];
        let mut cursor = self.order.head();
        while let Some(eref) = cursor {
            cursor = self.order.next(eref);
            let entry = &mut self.order[eref];
            let idx = probe_empty(&slots, entry.hash);
            entry.slot = idx;
            slots[idx] = Slot::Occupied(eref);
        }
        self.slots = slots;
        self.used = self.order.len();
    }
}

/// First empty slot on the probe path of a table known to be under half
/// full.
fn probe_empty(slots: &[Slot], hash: u64) -> usize {
    for idx in ProbeSeq::new(hash, slots.len()) {
        if slots[idx] == Slot::Empty {
            return idx;
        }
    }
    unreachable!("probe cycle over a half-empty table found no empty slot")
}

#[cfg(test)]
impl<K, V, S> RecencyHashMap<K, V, S> {
    /// Full structural check, used by the property suites after every
    /// operation.
    pub(crate) fn assert_invariants(&self) {
        use crate::capacity::CAPACITIES;

        let mut occupied = 0;
        let mut deleted = 0;
        for (idx, slot) in self.slots.iter().enumerate() {
            match slot {
                Slot::Empty => {}
                Slot::Deleted => deleted += 1,
                Slot::Occupied(eref) => {
                    occupied += 1;
                    let entry = self
                        .order
                        .get(*eref)
                        .expect("occupied slot points at a live entry");
                    assert_eq!(entry.slot, idx, "entry back-pointer matches its slot");
                }
            }
        }
        assert_eq!(occupied, self.order.len(), "one occupied slot per entry");
        assert_eq!(occupied + deleted, self.used, "used counter matches slots");
        assert!(2 * self.used <= self.slots.len(), "table stays half empty");
        let cap = self.slots.len();
        assert!(
            CAPACITIES.contains(&cap) || cap > CAPACITIES[CAPACITIES.len() - 1],
            "capacity drawn from the growth schedule"
        );
        self.order.assert_links();
    }
}

impl<K, V, S> Default for RecencyHashMap<K, V, S>
where
    S: Default,
{
    fn default() -> Self {
        Self::with_hasher(S::default())
    }
}

impl<K, V, S> fmt::Debug for RecencyHashMap<K, V, S>
where
    K: fmt::Debug,
    V: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K, V, S> PartialEq for RecencyHashMap<K, V, S>
where
    K: Eq + Hash,
    V: PartialEq,
    S: BuildHasher,
{
    /// Content equality; insertion order does not participate.
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len()
            && self
                .iter()
                .all(|(key, value)| other.get(key).map_or(false, |v| *value == *v))
    }
}

impl<K, V, S> Eq for RecencyHashMap<K, V, S>
where
    K: Eq + Hash,
    V: Eq,
    S: BuildHasher,
{
}

impl<K, Q, V, S> ops::Index<&Q> for RecencyHashMap<K, V, S>
where
    K: Eq + Hash + Borrow<Q>,
    Q: ?Sized + Eq + Hash,
    S: BuildHasher,
{
    type Output = V;

    /// # Panics
    ///
    /// Panics if the key is not present.
    fn index(&self, key: &Q) -> &V {
        self.get(key).expect("no entry found for key")
    }
}

impl<K, V, S> Extend<(K, V)> for RecencyHashMap<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher,
{
    /// Inserts each pair in turn; pairs whose key is already present are
    /// dropped (first wins).
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (key, value) in iter {
            self.insert(key, value);
        }
    }
}

impl<K, V, S> FromIterator<(K, V)> for RecencyHashMap<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher + Default,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Self::with_hasher(S::default());
        map.extend(iter);
        map
    }
}

impl<K, V, const N: usize> From<[(K, V); N]> for RecencyHashMap<K, V, RandomState>
where
    K: Eq + Hash,
{
    fn from(pairs: [(K, V); N]) -> Self {
        Self::from_iter(pairs)
    }
}

/// Iterator over the map's entries, most recent first.
pub struct Iter<'a, K, V> {
    inner: order::Iter<'a, K, V>,
}

impl<K, V> Clone for Iter<'_, K, V> {
    fn clone(&self) -> Self {
        Iter {
            inner: self.inner.clone(),
        }
    }
}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for Iter<'_, K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.clone()).finish()
    }
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> DoubleEndedIterator for Iter<'_, K, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.inner.next_back()
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {}
impl<K, V> FusedIterator for Iter<'_, K, V> {}

/// Mutable iterator over the map's entries, most recent first.
pub struct IterMut<'a, K, V> {
    inner: order::IterMut<'a, K, V>,
}

impl<'a, K, V> Iterator for IterMut<'a, K, V> {
    type Item = (&'a K, &'a mut V);

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> DoubleEndedIterator for IterMut<'_, K, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.inner.next_back()
    }
}

impl<K, V> ExactSizeIterator for IterMut<'_, K, V> {}
impl<K, V> FusedIterator for IterMut<'_, K, V> {}

/// Consuming iterator over the map's entries, most recent first.
pub struct IntoIter<K, V> {
    inner: order::IntoIter<K, V>,
}

impl<K, V> Iterator for IntoIter<K, V> {
    type Item = (K, V);

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> DoubleEndedIterator for IntoIter<K, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.inner.next_back()
    }
}

impl<K, V> ExactSizeIterator for IntoIter<K, V> {}
impl<K, V> FusedIterator for IntoIter<K, V> {}

/// Iterator over the map's keys, most recent first.
pub struct Keys<'a, K, V> {
    inner: order::Iter<'a, K, V>,
}

impl<K, V> Clone for Keys<'_, K, V> {
    fn clone(&self) -> Self {
        Keys {
            inner: self.inner.clone(),
        }
    }
}

impl<K: fmt::Debug, V> fmt::Debug for Keys<'_, K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.clone()).finish()
    }
}

impl<'a, K, V> Iterator for Keys<'a, K, V> {
    type Item = &'a K;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(key, _)| key)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> DoubleEndedIterator for Keys<'_, K, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.inner.next_back().map(|(key, _)| key)
    }
}

impl<K, V> ExactSizeIterator for Keys<'_, K, V> {}
impl<K, V> FusedIterator for Keys<'_, K, V> {}

/// Iterator over the map's values, most recent first.
pub struct Values<'a, K, V> {
    inner: order::Iter<'a, K, V>,
}

impl<K, V> Clone for Values<'_, K, V> {
    fn clone(&self) -> Self {
        Values {
            inner: self.inner.clone(),
        }
    }
}

impl<K, V: fmt::Debug> fmt::Debug for Values<'_, K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.clone()).finish()
    }
}

impl<'a, K, V> Iterator for Values<'a, K, V> {
    type Item = &'a V;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(_, value)| value)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> DoubleEndedIterator for Values<'_, K, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.inner.next_back().map(|(_, value)| value)
    }
}

impl<K, V> ExactSizeIterator for Values<'_, K, V> {}
impl<K, V> FusedIterator for Values<'_, K, V> {}

/// Iterator over the map's values mutably, most recent first.
pub struct ValuesMut<'a, K, V> {
    inner: order::IterMut<'a, K, V>,
}

impl<'a, K, V> Iterator for ValuesMut<'a, K, V> {
    type Item = &'a mut V;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(_, value)| value)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> DoubleEndedIterator for ValuesMut<'_, K, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.inner.next_back().map(|(_, value)| value)
    }
}

impl<K, V> ExactSizeIterator for ValuesMut<'_, K, V> {}
impl<K, V> FusedIterator for ValuesMut<'_, K, V> {}

impl<'a, K, V, S> IntoIterator for &'a RecencyHashMap<K, V, S> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Iter<'a, K, V> {
        self.iter()
    }
}

impl<'a, K, V, S> IntoIterator for &'a mut RecencyHashMap<K, V, S> {
    type Item = (&'a K, &'a mut V);
    type IntoIter = IterMut<'a, K, V>;

    fn into_iter(self) -> IterMut<'a, K, V> {
        self.iter_mut()
    }
}

impl<K, V, S> IntoIterator for RecencyHashMap<K, V, S> {
    type Item = (K, V);
    type IntoIter = IntoIter<K, V>;

    fn into_iter(self) -> IntoIter<K, V> {
        IntoIter {
            inner: self.order.into_iter(),
        }
    }
}
