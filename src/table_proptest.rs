#![cfg(test)]

// Property tests for Map and Set kept inside the crate so they can check
// the engine's structural invariants after every operation.

use crate::map::Map;
use crate::set::Set;
use proptest::prelude::*;
use std::collections::{BTreeMap, BTreeSet};
use std::hash::{BuildHasher, Hasher};

#[derive(Clone, Debug)]
enum Op {
    Add(u16, i32),
    Set(u16, i32),
    Get(u16),
    Remove(u16),
    RemoveEntry(u16),
    Clear,
}

fn arb_op(keys: u16) -> impl Strategy<Value = Op> {
    let k = 0..keys;
    prop_oneof![
        4 => (k.clone(), any::<i32>()).prop_map(|(k, v)| Op::Add(k, v)),
        3 => (k.clone(), any::<i32>()).prop_map(|(k, v)| Op::Set(k, v)),
        3 => k.clone().prop_map(Op::Get),
        3 => k.clone().prop_map(Op::Remove),
        2 => k.prop_map(Op::RemoveEntry),
        1 => Just(Op::Clear),
    ]
}

/// Keeps only a few hash bits so many keys share a home slot, runs are long
/// and wrap past the end of the array.
#[derive(Clone, Copy, Default)]
struct CoarseState {
    bits: u32,
}
struct CoarseHasher {
    bits: u32,
    acc: u64,
}
impl BuildHasher for CoarseState {
    type Hasher = CoarseHasher;
    fn build_hasher(&self) -> CoarseHasher {
        CoarseHasher {
            bits: self.bits,
            acc: 0,
        }
    }
}
impl Hasher for CoarseHasher {
    fn write(&mut self, bytes: &[u8]) {
        for &b in bytes {
            self.acc = self.acc.wrapping_mul(31).wrapping_add(u64::from(b));
        }
    }
    fn finish(&self) -> u64 {
        // Spread the few surviving bits across the word before folding.
        (self.acc & ((1 << self.bits) - 1)).wrapping_mul(0x0123_4567_89AB_CDEF)
    }
}

fn run_map<S: BuildHasher>(mut sut: Map<u16, i32, S>, ops: Vec<Op>) -> Result<(), TestCaseError> {
    let mut model: BTreeMap<u16, i32> = BTreeMap::new();
    for op in ops {
        match op {
            Op::Add(k, v) => {
                let added = sut.add(k, v);
                prop_assert_eq!(added, !model.contains_key(&k));
                model.entry(k).or_insert(v);
            }
            Op::Set(k, v) => {
                prop_assert_eq!(sut.set(k, v), model.insert(k, v));
            }
            Op::Get(k) => {
                prop_assert_eq!(sut.get(&k), model.get(&k));
                prop_assert_eq!(sut.contains_key(&k), model.contains_key(&k));
            }
            Op::Remove(k) => {
                prop_assert_eq!(sut.remove(&k), model.remove(&k));
            }
            Op::RemoveEntry(k) => {
                prop_assert_eq!(sut.remove_entry(&k), model.remove_entry(&k));
            }
            Op::Clear => {
                sut.clear();
                model.clear();
            }
        }

        sut.table.check_invariants();
        prop_assert_eq!(sut.len(), model.len());
        for (k, v) in &model {
            prop_assert_eq!(sut.get(k), Some(v), "key {} lost", k);
        }
        let seen: BTreeMap<u16, i32> = sut.iter().map(|(k, v)| (*k, *v)).collect();
        prop_assert_eq!(&seen, &model);
    }
    Ok(())
}

// Property: Map agrees with a BTreeMap model across random sequences.
// - `add` inserts only when absent and never overwrites.
// - `set` returns the previous value.
// - `remove`/`remove_entry` return what the model held.
// - Every model key stays reachable after each op (growth and
//   backward-shift removal lose nothing); slot invariants hold throughout.
proptest! {
    #![proptest_config(ProptestConfig { cases: 128, .. ProptestConfig::default() })]

    #[test]
    fn prop_map_state_machine(ops in proptest::collection::vec(arb_op(64), 1..200)) {
        run_map(Map::new(), ops)?;
    }

    #[test]
    fn prop_map_state_machine_with_collisions(
        bits in 1u32..4,
        ops in proptest::collection::vec(arb_op(48), 1..200),
    ) {
        run_map(Map::with_hasher(CoarseState { bits }), ops)?;
    }
}

// Property: Set agrees with a BTreeSet model, including under heavy
// collisions; structural invariants hold after every op.
proptest! {
    #![proptest_config(ProptestConfig { cases: 128, .. ProptestConfig::default() })]

    #[test]
    fn prop_set_state_machine_with_collisions(
        bits in 1u32..4,
        ops in proptest::collection::vec(arb_op(48), 1..200),
    ) {
        let mut sut: Set<u16, CoarseState> = Set::with_hasher(CoarseState { bits });
        let mut model: BTreeSet<u16> = BTreeSet::new();
        for op in ops {
            match op {
                Op::Add(k, _) | Op::Set(k, _) => {
                    prop_assert_eq!(sut.add(k), model.insert(k));
                }
                Op::Get(k) => {
                    prop_assert_eq!(sut.get(&k), model.get(&k));
                }
                Op::Remove(k) => {
                    prop_assert_eq!(sut.remove(&k), model.remove(&k));
                }
                Op::RemoveEntry(k) => {
                    prop_assert_eq!(sut.take(&k), model.take(&k));
                }
                Op::Clear => {
                    sut.clear();
                    model.clear();
                }
            }
            sut.table.check_invariants();
            prop_assert_eq!(sut.len(), model.len());
            for v in &model {
                prop_assert!(sut.contains(v), "value {} lost", v);
            }
        }
    }
}

// Exhaustive check of removal: for every arrangement of homes produced by
// inserting keys from a small pool in order, removing any one key leaves
// all the others reachable.
#[test]
fn every_single_removal_preserves_reachability() {
    let state = CoarseState { bits: 3 };
    for n in 1..=4u16 {
        for start in 0..40u16 {
            let keys: Vec<u16> = (start..start + n).collect();
            for victim in &keys {
                let mut m: Map<u16, u16, CoarseState> = Map::with_hasher(state);
                for &k in &keys {
                    m.add(k, k);
                }
                assert_eq!(m.remove(victim), Some(*victim));
                m.table.check_invariants();
                for k in keys.iter().filter(|k| *k != victim) {
                    assert_eq!(m.get(k), Some(k));
                }
            }
        }
    }
}
