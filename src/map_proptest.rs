#![cfg(test)]

// Property tests for RecencyHashMap kept inside the crate so they can
// call the internal invariant checker after every operation.

use crate::RecencyHashMap;
use proptest::prelude::*;
use std::cell::Cell;
use std::collections::HashMap;
use std::fmt;
use std::hash::Hasher;

// Key newtype with Borrow<str> to exercise borrowed lookup.
#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
struct Key(String);
impl fmt::Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}
impl std::borrow::Borrow<str> for Key {
    fn borrow(&self) -> &str {
        &self.0
    }
}

// Pool-indexed operations to improve shrinking: indices shrink to earlier keys,
// pool length shrinks, and op lists shrink in length.
#[derive(Clone, Debug)]
enum OpI {
    Insert(usize, u32),
    GetOrInsert(usize, u32),
    Remove(usize),
    Get(usize),
    Contains(String),
    Mutate(usize, u32),
    Retain(u32),
    Clear,
    Iterate,
}

fn key_from(pool: &[String], i: usize) -> Key {
    Key(pool[i].clone())
}

fn arb_scenario() -> impl Strategy<Value = (Vec<String>, Vec<OpI>)> {
    proptest::collection::vec("[a-z]{0,5}", 1..=8).prop_flat_map(|pool| {
        let idxs: Vec<usize> = (0..pool.len()).collect();
        let idx = proptest::sample::select(idxs);
        let contains_pool = proptest::sample::select(pool.clone());
        let op = prop_oneof![
            (idx.clone(), any::<u32>()).prop_map(|(i, v)| OpI::Insert(i, v)),
            (idx.clone(), any::<u32>()).prop_map(|(i, v)| OpI::GetOrInsert(i, v)),
            idx.clone().prop_map(OpI::Remove),
            idx.clone().prop_map(OpI::Get),
            prop_oneof![
                contains_pool.prop_map(|s: String| s),
                "[a-z]{0,5}".prop_map(|s| s)
            ]
            .prop_map(OpI::Contains),
            (idx.clone(), any::<u32>()).prop_map(|(i, d)| OpI::Mutate(i, d)),
            any::<u32>().prop_map(OpI::Retain),
            Just(OpI::Clear),
            Just(OpI::Iterate),
        ];
        proptest::collection::vec(op, 1..60).prop_map(move |ops| (pool.clone(), ops))
    })
}

// Property: State-machine equivalence against std::collections::HashMap
// plus a recency vector (most recent key first).
// Invariants exercised across random operation sequences:
// - Duplicate inserts are no-ops that report `false`; the stored value wins.
// - The missing-value closure of `get_or_insert_with` runs exactly on a miss.
// - `remove` returns the model's value and forgets the key's recency.
// - Iteration yields exactly the live entries, most recent insertion first.
// - Structural invariants (slot/entry agreement, load bound, link symmetry)
//   hold after every operation.
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine((pool, ops) in arb_scenario()) {
        let mut sut: RecencyHashMap<Key, u32> = RecencyHashMap::new();
        let mut model: HashMap<Key, u32> = HashMap::new();
        let mut recency: Vec<Key> = Vec::new();

        for op in ops {
            match op {
                OpI::Insert(i, v) => {
                    let k = key_from(&pool, i);
                    let fresh = !model.contains_key(&k);
                    let inserted = sut.insert(k.clone(), v);
                    prop_assert_eq!(inserted, fresh, "insert only on an absent key");
                    if inserted {
                        model.insert(k.clone(), v);
                        recency.insert(0, k);
                    }
                }
                OpI::GetOrInsert(i, v) => {
                    let k = key_from(&pool, i);
                    let fresh = !model.contains_key(&k);
                    let ran = Cell::new(false);
                    let value = *sut.get_or_insert_with(k.clone(), || {
                        ran.set(true);
                        v
                    });
                    prop_assert_eq!(ran.get(), fresh, "closure runs exactly on a miss");
                    if fresh {
                        model.insert(k.clone(), v);
                        recency.insert(0, k.clone());
                    }
                    prop_assert_eq!(value, model[&k]);
                }
                OpI::Remove(i) => {
                    let k = key_from(&pool, i);
                    let got = sut.remove(&k);
                    let want = model.remove(&k);
                    prop_assert_eq!(got, want);
                    if want.is_some() {
                        recency.retain(|x| x != &k);
                    }
                }
                OpI::Get(i) => {
                    let k = key_from(&pool, i);
                    prop_assert_eq!(sut.get(&k).copied(), model.get(&k).copied());
                }
                OpI::Contains(s) => {
                    let has = sut.contains_key(s.as_str());
                    let has_model = model.keys().any(|k| k.0 == s);
                    prop_assert_eq!(has, has_model);
                }
                OpI::Mutate(i, d) => {
                    let k = key_from(&pool, i);
                    match sut.get_mut(&k) {
                        Some(value) => {
                            *value = value.wrapping_add(d);
                            let mv = model.get_mut(&k).expect("model has the key");
                            *mv = mv.wrapping_add(d);
                            // In-place mutation is a find, not an insert:
                            // recency must not move.
                        }
                        None => prop_assert!(!model.contains_key(&k)),
                    }
                }
                OpI::Retain(r) => {
                    let bit = r & 1;
                    sut.retain(|_, v| *v & 1 == bit);
                    model.retain(|_, v| *v & 1 == bit);
                    recency.retain(|k| model.contains_key(k));
                }
                OpI::Clear => {
                    sut.clear();
                    model.clear();
                    recency.clear();
                    prop_assert!(sut.is_empty());
                }
                OpI::Iterate => {
                    let got: Vec<(Key, u32)> =
                        sut.iter().map(|(k, v)| (k.clone(), *v)).collect();
                    let want: Vec<(Key, u32)> =
                        recency.iter().map(|k| (k.clone(), model[k])).collect();
                    prop_assert_eq!(got, want);
                }
            }

            // Post-conditions after each op
            // 1) Size parity with the model
            prop_assert_eq!(sut.len(), model.len());
            prop_assert_eq!(sut.is_empty(), model.is_empty());
            // 2) Iteration order parity: most recent insertion first
            let order: Vec<Key> = sut.keys().cloned().collect();
            prop_assert_eq!(&order, &recency);
            // 3) Structural invariants
            sut.assert_invariants();
        }
    }
}

// Collision variant using a constant hasher to stress equality resolution.
#[derive(Clone, Default)]
struct ConstBuildHasher;
struct ConstHasher;
impl std::hash::BuildHasher for ConstBuildHasher {
    type Hasher = ConstHasher;
    fn build_hasher(&self) -> Self::Hasher {
        ConstHasher
    }
}
impl Hasher for ConstHasher {
    fn write(&mut self, _bytes: &[u8]) {}
    fn finish(&self) -> u64 {
        0
    }
}

// Property: Same state-machine invariants as above, under worst-case
// collision behavior (constant hasher). Every key shares one probe
// chain, so this stresses tombstone traversal, tombstone reuse on
// insert, and full-chain rebuilds.
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine_with_collisions((pool, ops) in arb_scenario()) {
        let mut sut: RecencyHashMap<Key, u32, ConstBuildHasher> =
            RecencyHashMap::with_hasher(ConstBuildHasher);
        let mut model: HashMap<Key, u32> = HashMap::new();
        let mut recency: Vec<Key> = Vec::new();

        for op in ops {
            match op {
                OpI::Insert(i, v) => {
                    let k = key_from(&pool, i);
                    let fresh = !model.contains_key(&k);
                    let inserted = sut.insert(k.clone(), v);
                    prop_assert_eq!(inserted, fresh);
                    if inserted {
                        model.insert(k.clone(), v);
                        recency.insert(0, k);
                    }
                }
                OpI::GetOrInsert(i, v) => {
                    let k = key_from(&pool, i);
                    let fresh = !model.contains_key(&k);
                    let ran = Cell::new(false);
                    let value = *sut.get_or_insert_with(k.clone(), || { ran.set(true); v });
                    prop_assert_eq!(ran.get(), fresh);
                    if fresh {
                        model.insert(k.clone(), v);
                        recency.insert(0, k.clone());
                    }
                    prop_assert_eq!(value, model[&k]);
                }
                OpI::Remove(i) => {
                    let k = key_from(&pool, i);
                    let got = sut.remove(&k);
                    let want = model.remove(&k);
                    prop_assert_eq!(got, want);
                    if want.is_some() {
                        recency.retain(|x| x != &k);
                    }
                }
                OpI::Get(i) => {
                    let k = key_from(&pool, i);
                    prop_assert_eq!(sut.get(&k).copied(), model.get(&k).copied());
                }
                OpI::Contains(s) => {
                    let has = sut.contains_key(s.as_str());
                    let has_model = model.keys().any(|k| k.0 == s);
                    prop_assert_eq!(has, has_model);
                }
                OpI::Mutate(i, d) => {
                    let k = key_from(&pool, i);
                    match sut.get_mut(&k) {
                        Some(value) => {
                            *value = value.wrapping_add(d);
                            let mv = model.get_mut(&k).expect("model has the key");
                            *mv = mv.wrapping_add(d);
                        }
                        None => prop_assert!(!model.contains_key(&k)),
                    }
                }
                OpI::Retain(r) => {
                    let bit = r & 1;
                    sut.retain(|_, v| *v & 1 == bit);
                    model.retain(|_, v| *v & 1 == bit);
                    recency.retain(|k| model.contains_key(k));
                }
                OpI::Clear => {
                    sut.clear();
                    model.clear();
                    recency.clear();
                }
                OpI::Iterate => {
                    let got: Vec<(Key, u32)> = sut.iter().map(|(k, v)| (k.clone(), *v)).collect();
                    let want: Vec<(Key, u32)> = recency.iter().map(|k| (k.clone(), model[k])).collect();
                    prop_assert_eq!(got, want);
                }
            }

            prop_assert_eq!(sut.len(), model.len());
            let order: Vec<Key> = sut.keys().cloned().collect();
            prop_assert_eq!(&order, &recency);
            sut.assert_invariants();
        }
    }
}

// Property: collecting from an iterator keeps the first occurrence of
// each key, and the recency order is the order of first occurrences.
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_collect_keeps_first_occurrence(
        pairs in proptest::collection::vec(("[a-z]{0,3}", any::<u32>()), 0..64)
    ) {
        let sut: RecencyHashMap<String, u32> = pairs.iter().cloned().collect();

        let mut model: HashMap<String, u32> = HashMap::new();
        let mut recency: Vec<String> = Vec::new();
        for (k, v) in &pairs {
            if !model.contains_key(k) {
                model.insert(k.clone(), *v);
                recency.insert(0, k.clone());
            }
        }

        prop_assert_eq!(sut.len(), model.len());
        let order: Vec<String> = sut.keys().cloned().collect();
        prop_assert_eq!(order, recency);
        for (k, v) in &model {
            prop_assert_eq!(sut.get(k), Some(v));
        }
        sut.assert_invariants();
    }
}
