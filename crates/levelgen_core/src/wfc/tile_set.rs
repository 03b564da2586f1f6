//! Fixed-capacity set of tile ids.
//!
//! Possibility sets and admissible-neighbor sets are both `TileSet`s: one
//! bit per dense `TileId`, so iteration is always in ascending id order.

use super::catalog::TileId;
use bitvec::vec::BitVec;

/// Set of `TileId`s below a fixed capacity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileSet {
    bits: BitVec,
}

impl TileSet {
    /// An empty set able to hold ids `0..capacity`.
    pub fn empty(capacity: usize) -> Self {
        Self {
            bits: BitVec::repeat(false, capacity),
        }
    }

    /// A set holding every id `0..capacity`.
    pub fn full(capacity: usize) -> Self {
        Self {
            bits: BitVec::repeat(true, capacity),
        }
    }

    pub fn from_ids(capacity: usize, ids: impl IntoIterator<Item = TileId>) -> Self {
        let mut set = Self::empty(capacity);
        for id in ids {
            set.insert(id);
        }
        set
    }

    pub fn capacity(&self) -> usize {
        self.bits.len()
    }

    /// Insert `id`. Ids at or beyond capacity are ignored.
    pub fn insert(&mut self, id: TileId) -> bool {
        if id.0 >= self.capacity() || self.bits[id.0] {
            return false;
        }
        self.bits.set(id.0, true);
        true
    }

    pub fn remove(&mut self, id: TileId) -> bool {
        if !self.contains(id) {
            return false;
        }
        self.bits.set(id.0, false);
        true
    }

    #[inline]
    pub fn contains(&self, id: TileId) -> bool {
        id.0 < self.capacity() && self.bits[id.0]
    }

    pub fn len(&self) -> usize {
        self.bits.count_ones()
    }

    pub fn is_empty(&self) -> bool {
        self.bits.not_any()
    }

    /// Keep only ids also in `other`. Returns true if anything was removed.
    pub fn intersect_with(&mut self, other: &TileSet) -> bool {
        let before = self.len();
        self.bits &= other.bits.as_bitslice();
        self.len() != before
    }

    /// Add every id in `other`.
    pub fn union_with(&mut self, other: &TileSet) {
        self.bits |= other.bits.as_bitslice();
    }

    pub fn is_subset(&self, other: &TileSet) -> bool {
        self.iter().all(|id| other.contains(id))
    }

    /// The single id, if the set holds exactly one.
    pub fn single(&self) -> Option<TileId> {
        if self.len() == 1 {
            self.bits.first_one().map(TileId)
        } else {
            None
        }
    }

    /// Ids in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = TileId> + '_ {
        self.bits.iter_ones().map(TileId)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_set_respects_capacity() {
        for cap in [0, 1, 63, 64, 65, 130] {
            let set = TileSet::full(cap);
            assert_eq!(set.len(), cap, "capacity {}", cap);
            assert!(!set.contains(TileId(cap)));
        }
    }

    #[test]
    fn test_insert_remove_contains() {
        let mut set = TileSet::empty(70);
        assert!(set.insert(TileId(3)));
        assert!(!set.insert(TileId(3)));
        assert!(set.insert(TileId(66)));
        assert!(!set.insert(TileId(70)));
        assert_eq!(set.len(), 2);
        assert!(set.remove(TileId(3)));
        assert!(!set.contains(TileId(3)));
        assert_eq!(set.single(), Some(TileId(66)));
    }

    #[test]
    fn test_intersect_reports_change() {
        let mut a = TileSet::from_ids(8, [TileId(0), TileId(2), TileId(5)]);
        let b = TileSet::from_ids(8, [TileId(0), TileId(2), TileId(5), TileId(7)]);
        assert!(!a.intersect_with(&b));
        assert_eq!(a.len(), 3);

        let c = TileSet::from_ids(8, [TileId(2)]);
        assert!(a.intersect_with(&c));
        assert_eq!(a.iter().collect::<Vec<_>>(), vec![TileId(2)]);
        assert!(a.is_subset(&b));
    }

    #[test]
    fn test_union_and_iteration_order() {
        let mut a = TileSet::from_ids(100, [TileId(90), TileId(1)]);
        a.union_with(&TileSet::from_ids(100, [TileId(64), TileId(1)]));
        assert_eq!(
            a.iter().collect::<Vec<_>>(),
            vec![TileId(1), TileId(64), TileId(90)]
        );
        assert_eq!(a.single(), None);
        assert!(TileSet::empty(4).is_empty());
    }

    #[test]
    fn test_combining_leaves_operand_untouched() {
        let admitted = TileSet::from_ids(70, [TileId(3), TileId(66)]);
        let mut union = TileSet::empty(70);
        for _ in 0..3 {
            union.union_with(&admitted);
        }
        assert_eq!(union, admitted);

        let mut cell = TileSet::full(70);
        assert!(cell.intersect_with(&union));
        assert!(!cell.intersect_with(&union), "second pass changes nothing");
        assert_eq!(cell.iter().collect::<Vec<_>>(), vec![TileId(3), TileId(66)]);
        assert_eq!(admitted.len(), 2);
        assert_eq!(admitted.capacity(), 70);
    }
}
