use crate::movegen::Move;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Bound {
    Exact,
    Lower,
    Upper,
}

#[derive(Clone, Copy, Debug)]
pub struct TtEntry {
    pub key: u64,
    pub depth: i32,
    pub score: i32,
    pub bound: Bound,
    pub best_move: Option<Move>,
}

/// Fixed-size transposition table indexed by `hash % capacity`.
/// Replacement keeps the deeper of the old and new entries, except that
/// an entry for a different key always overwrites.
pub struct TranspositionTable {
    entries: Vec<Option<TtEntry>>,
}

const DEFAULT_CAPACITY: usize = 1 << 20;

impl TranspositionTable {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        TranspositionTable {
            entries: vec![None; capacity.max(1)],
        }
    }

    fn index(&self, key: u64) -> usize {
        (key % self.entries.len() as u64) as usize
    }

    pub fn probe(&self, key: u64) -> Option<&TtEntry> {
        match &self.entries[self.index(key)] {
            Some(entry) if entry.key == key => Some(entry),
            _ => None,
        }
    }

    pub fn store(&mut self, key: u64, depth: i32, score: i32, bound: Bound, best_move: Option<Move>) {
        let idx = self.index(key);
        if let Some(existing) = &self.entries[idx] {
            if existing.key == key && existing.depth > depth {
                return;
            }
        }
        self.entries[idx] = Some(TtEntry {
            key,
            depth,
            score,
            bound,
            best_move,
        });
    }

    pub fn clear(&mut self) {
        for entry in self.entries.iter_mut() {
            *entry = None;
        }
    }
}

impl Default for TranspositionTable {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::movegen::{Move, QUIET_MOVE};

    #[test]
    fn test_store_and_probe() {
        let mut tt = TranspositionTable::with_capacity(1024);
        let mv = Move::new(12, 28, QUIET_MOVE);
        tt.store(0xDEAD, 5, 42, Bound::Exact, Some(mv));

        let entry = tt.probe(0xDEAD).unwrap();
        assert_eq!(entry.depth, 5);
        assert_eq!(entry.score, 42);
        assert_eq!(entry.bound, Bound::Exact);
        assert_eq!(entry.best_move, Some(mv));

        assert!(tt.probe(0xBEEF).is_none());
    }

    #[test]
    fn test_deeper_entry_survives() {
        let mut tt = TranspositionTable::with_capacity(1024);
        tt.store(1, 8, 100, Bound::Exact, None);
        tt.store(1, 3, -50, Bound::Upper, None);
        let entry = tt.probe(1).unwrap();
        assert_eq!(entry.depth, 8);
        assert_eq!(entry.score, 100);
    }

    #[test]
    fn test_different_key_overwrites() {
        let mut tt = TranspositionTable::with_capacity(16);
        // 1 and 17 collide in a 16-slot table.
        tt.store(1, 8, 100, Bound::Exact, None);
        tt.store(17, 2, 7, Bound::Lower, None);
        assert!(tt.probe(1).is_none());
        assert_eq!(tt.probe(17).unwrap().score, 7);
    }

    #[test]
    fn test_clear() {
        let mut tt = TranspositionTable::with_capacity(64);
        tt.store(5, 1, 1, Bound::Exact, None);
        tt.clear();
        assert!(tt.probe(5).is_none());
    }
}
