use crate::digest::HexDigest;
use crate::par_search::Shard;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lookup {
    Empty,
    Equal,
    Different,
}

/// Per-worker map from slot to the last hex digest stored there.
///
/// Slots are `index mod total_keys`. Only the worker's own shard is ever addressed, so the table
/// holds one inline slot per shard index rather than one per global index.
pub struct CollisionTable {
    base: usize,
    total_keys: usize,
    slots: Vec<Option<HexDigest>>,
}

impl CollisionTable {
    pub fn new(shard: &Shard, total_keys: usize) -> Self {
        CollisionTable {
            base: shard.start,
            total_keys,
            slots: vec![None; shard.len()],
        }
    }

    fn slot(&self, index: usize) -> usize {
        let slot = index % self.total_keys;
        debug_assert!(slot >= self.base && slot - self.base < self.slots.len());
        slot - self.base
    }

    pub fn lookup(&self, index: usize, candidate: &HexDigest) -> Lookup {
        match &self.slots[self.slot(index)] {
            None => Lookup::Empty,
            Some(stored) if stored == candidate => Lookup::Equal,
            Some(_) => Lookup::Different,
        }
    }

    pub fn store(&mut self, index: usize, hex: HexDigest) {
        let slot = self.slot(index);
        self.slots[slot] = Some(hex);
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::digest::{Digester, Md5};

    fn hex(input: &[u8]) -> HexDigest {
        HexDigest::encode(&Md5.digest(input).unwrap())
    }

    #[test]
    fn store_then_lookup_is_equal() {
        let shard = Shard::for_rank(2, 4, 1_000_000);
        let mut table = CollisionTable::new(&shard, 1_000_000);
        assert_eq!(table.len(), 250_000);

        assert_eq!(table.lookup(500_000, &hex(b"a")), Lookup::Empty);
        table.store(500_000, hex(b"a"));
        assert_eq!(table.lookup(500_000, &hex(b"a")), Lookup::Equal);
        assert_eq!(table.lookup(500_000, &hex(b"b")), Lookup::Different);
        assert_eq!(table.lookup(749_999, &hex(b"a")), Lookup::Empty);
    }

    #[test]
    fn store_replaces_previous_occupant() {
        let shard = Shard::for_rank(0, 2, 10);
        let mut table = CollisionTable::new(&shard, 10);
        table.store(3, hex(b"first"));
        table.store(3, hex(b"second"));
        assert_eq!(table.lookup(3, &hex(b"first")), Lookup::Different);
        assert_eq!(table.lookup(3, &hex(b"second")), Lookup::Equal);
    }

    #[test]
    fn indices_wrap_modulo_total_keys() {
        let shard = Shard::for_rank(1, 2, 10);
        let mut table = CollisionTable::new(&shard, 10);
        table.store(7, hex(b"x"));
        assert_eq!(table.lookup(17, &hex(b"x")), Lookup::Equal);
    }
}
