//! recency-hashmap: A single-threaded map over a double-hashed probe
//! table that iterates entries most-recently-inserted first.
//!
//! Internal Design:
//!
//! Summary
//! - Goal: build RecencyHashMap in safe, verifiable layers so each piece
//!   can be reasoned about independently.
//! - Layers:
//!   - capacity: the prime capacity schedule (3, 7, 17, ...) and its
//!     geometric extension once the table outgrows the schedule.
//!   - probe::ProbeSeq: the double-hash probe path as a finite iterator
//!     over raw slot indices; visits every slot of a prime-sized table
//!     exactly once.
//!   - order::OrderList: arena-backed doubly-linked recency list. The
//!     arena key is the stable locator the slot table stores; unlinking
//!     by key is O(1) and keys survive table rebuilds.
//!   - map::RecencyHashMap<K, V, S>: the public map composing the three:
//!     a tri-state slot table (empty / occupied / tombstone) kept in
//!     sync with the order list.
//!
//! Constraints
//! - Single-threaded, synchronous; no interior mutability anywhere, so
//!   exclusive access is exactly `&mut` and auto traits apply as for the
//!   std maps.
//! - Insert never overwrites: a duplicate key is a no-op reporting
//!   `false`; the stored value and its recency position win.
//! - Removal tombstones slots instead of emptying them, so probe chains
//!   through the removed slot stay intact; tombstones count toward the
//!   load factor until an insert-triggered rebuild purges them.
//! - The table stays at most half full (`2 * used <= capacity`) after
//!   every insert, rebuilding synchronously into the next prime capacity
//!   when the bound is crossed.
//!
//! Why this split?
//! - Localize invariants: the full-cycle probe property, the recency
//!   list's link symmetry, and the load accounting are each unit-tested
//!   where they live, so the map layer only composes proven pieces.
//! - Minimize unsafe: the one unsafe block is the cursor of the order
//!   list's mutable iterator; everything else is safe Rust.
//! - Stable entries: the arena never moves an entry, so a rebuild only
//!   rewrites slots, and references handed out across a growing insert
//!   stay valid.
//!
//! Hasher and rehashing invariants
//! - Each entry stores a precomputed `u64` hash and probing always uses
//!   the stored hash; `K: Hash` is never invoked after insertion. This
//!   avoids rebuild-time calls into user code.
//!
//! Ordering semantics
//! - Iteration yields the live entries, most recently inserted first; a
//!   rebuild re-probes slots but never touches the list, so growth is
//!   invisible to iteration order. Removal forgets a key's position and
//!   re-inserting it starts over at the front. A rejected duplicate does
//!   not refresh recency.
//!
//! Notes and non-goals
//! - No thread-safety and no persistence; the map is an ordinary owned
//!   value.
//! - No shrinking: removal and clear keep the capacity; growth is the
//!   only resize.
//! - No caller-tunable load factor or rehash policy.
//! - Public API surface is `RecencyHashMap` and its iterators; the
//!   capacity, probe and order layers are implementation details.

mod capacity;
mod map;
mod map_proptest;
mod order;
mod probe;

// Public surface
pub use map::{IntoIter, Iter, IterMut, Keys, RecencyHashMap, Values, ValuesMut};
