// Copyright 2026 the Liveflow Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Fixed-universe bitset used as the liveness lattice element.
//!
//! All sets participating in one analysis share the same universe (the symbol
//! count fixed at graph construction). Operations that combine two sets assume
//! equal universes; this is enforced with debug assertions rather than runtime
//! errors because mismatches cannot arise once a [`Cfg`](crate::Cfg) has been
//! built.

/// A set of symbol indices over a fixed universe.
///
/// The lattice operations needed by liveness are in-place union
/// ([`union_with`](Self::union_with)), in-place difference
/// ([`subtract_with`](Self::subtract_with)), and structural equality.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BitSet {
    bits: Vec<u64>,
    universe: usize,
}

impl BitSet {
    /// Creates an empty set over `universe` symbols.
    #[must_use]
    pub fn new_empty(universe: usize) -> Self {
        let words = universe.div_ceil(64);
        Self {
            bits: vec![0; words],
            universe,
        }
    }

    /// Returns the universe size this set was created with.
    #[must_use]
    #[inline]
    pub fn universe(&self) -> usize {
        self.universe
    }

    /// Returns `true` if `idx` is in the set.
    ///
    /// Out-of-universe indices are reported as absent.
    #[must_use]
    pub fn get(&self, idx: usize) -> bool {
        if idx >= self.universe {
            return false;
        }
        let w = idx / 64;
        let b = idx % 64;
        (self.bits[w] >> b) & 1 == 1
    }

    /// Inserts `idx` into the set.
    ///
    /// Out-of-universe indices are ignored.
    pub fn set(&mut self, idx: usize) {
        if idx >= self.universe {
            return;
        }
        let w = idx / 64;
        let b = idx % 64;
        self.bits[w] |= 1_u64 << b;
    }

    /// Returns `true` if no bit is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bits.iter().all(|&w| w == 0)
    }

    /// In-place union: `self = self ∪ other`.
    pub fn union_with(&mut self, other: &Self) {
        debug_assert_eq!(self.universe, other.universe, "universe mismatch");
        for (a, b) in self.bits.iter_mut().zip(other.bits.iter()) {
            *a |= *b;
        }
    }

    /// In-place difference: `self = self − other`.
    pub fn subtract_with(&mut self, other: &Self) {
        debug_assert_eq!(self.universe, other.universe, "universe mismatch");
        for (a, b) in self.bits.iter_mut().zip(other.bits.iter()) {
            *a &= !*b;
        }
    }

    /// Returns `true` if `self ⊇ other`.
    ///
    /// This is the monotone change test: unioning `other` into `self` changes
    /// `self` exactly when this returns `false`.
    #[must_use]
    pub fn contains_all(&self, other: &Self) -> bool {
        debug_assert_eq!(self.universe, other.universe, "universe mismatch");
        self.bits
            .iter()
            .zip(other.bits.iter())
            .all(|(a, b)| b & !a == 0)
    }

    /// Iterates over the set bits in ascending index order.
    pub fn ones(&self) -> impl Iterator<Item = usize> + '_ {
        self.bits.iter().enumerate().flat_map(|(w, &word)| {
            (0..64)
                .filter(move |b| (word >> b) & 1 == 1)
                .map(move |b| w * 64 + b)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_and_get_roundtrip() {
        let mut s = BitSet::new_empty(130);
        s.set(0);
        s.set(63);
        s.set(64);
        s.set(129);
        assert!(s.get(0));
        assert!(s.get(63));
        assert!(s.get(64));
        assert!(s.get(129));
        assert!(!s.get(1));
        assert!(!s.get(500));
    }

    #[test]
    fn out_of_universe_set_is_ignored() {
        let mut s = BitSet::new_empty(10);
        s.set(10);
        assert!(s.is_empty());
    }

    #[test]
    fn union_and_subtract() {
        let mut a = BitSet::new_empty(8);
        a.set(1);
        a.set(2);
        let mut b = BitSet::new_empty(8);
        b.set(2);
        b.set(3);

        let mut u = a.clone();
        u.union_with(&b);
        assert_eq!(u.ones().collect::<Vec<_>>(), vec![1, 2, 3]);

        u.subtract_with(&a);
        assert_eq!(u.ones().collect::<Vec<_>>(), vec![3]);
    }

    #[test]
    fn contains_all_is_superset_test() {
        let mut a = BitSet::new_empty(70);
        a.set(5);
        a.set(65);
        let mut b = BitSet::new_empty(70);
        b.set(5);

        assert!(a.contains_all(&b));
        assert!(!b.contains_all(&a));
        b.set(65);
        assert!(b.contains_all(&a));
    }

    #[test]
    fn ones_crosses_word_boundaries() {
        let mut s = BitSet::new_empty(200);
        for idx in [0, 63, 64, 127, 128, 199] {
            s.set(idx);
        }
        assert_eq!(
            s.ones().collect::<Vec<_>>(),
            vec![0, 63, 64, 127, 128, 199]
        );
    }
}
