use log::info;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::chess_move::ChessMove;

/// Slots probed per lookup, starting from the hash's home slot.
pub const ROTATION: usize = 4;

const MIN_SLOTS: usize = 1024;

/// What the stored score says about the true value.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum Bound {
    /// Exact score from a PV node.
    Exact,
    /// Fail high: the true score is at least this (a CUT node).
    Lower,
    /// Fail low: the true score is at most this (an ALL node).
    Upper,
}

impl Bound {
    #[inline]
    fn to_bits(self) -> u64 {
        match self {
            Bound::Exact => 1,
            Bound::Lower => 2,
            Bound::Upper => 3,
        }
    }

    #[inline]
    fn from_bits(bits: u64) -> Option<Bound> {
        match bits {
            1 => Some(Bound::Exact),
            2 => Some(Bound::Lower),
            3 => Some(Bound::Upper),
            _ => None,
        }
    }
}

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct TtEntry {
    pub eval: i32,
    pub best_move: ChessMove,
    pub depth: u8,
    pub bound: Bound,
}

impl TtEntry {
    /// eval in bits 0-31, move in 32-47, depth in 48-55, bound in 56-63.
    #[inline]
    pub fn pack(&self) -> u64 {
        (self.eval as u32 as u64)
            | ((self.best_move.to_bits() as u64) << 32)
            | ((self.depth as u64) << 48)
            | (self.bound.to_bits() << 56)
    }

    /// `None` for an empty slot.
    #[inline]
    pub fn unpack(data: u64) -> Option<TtEntry> {
        Bound::from_bits(data >> 56).map(|bound| TtEntry {
            eval: data as u32 as i32,
            best_move: ChessMove::from_bits((data >> 32) as u16),
            depth: (data >> 48) as u8,
            bound,
        })
    }
}

/// One slot.  `check` holds `hash ^ data`, so a torn pair from two racing writers fails
/// verification instead of returning mixed fields.
#[derive(Default)]
struct Slot {
    check: AtomicU64,
    data: AtomicU64,
}

/// A fixed-size hash table shared by every search thread without locks.
pub struct TranspositionTable {
    slots: Vec<Slot>,
    mask: usize,
}

impl TranspositionTable {
    /// The largest power-of-two table that fits in `hash_mb` mebibytes.
    pub fn new(hash_mb: usize) -> TranspositionTable {
        let bytes = hash_mb.saturating_mul(1024 * 1024);
        let fit = (bytes / std::mem::size_of::<Slot>()).max(MIN_SLOTS);
        // round down to a power of two
        let slots = if fit.is_power_of_two() {
            fit
        } else {
            fit.next_power_of_two() / 2
        };
        info!(
            "transposition table: {} slots, {} KiB",
            slots,
            slots * std::mem::size_of::<Slot>() / 1024
        );
        TranspositionTable::with_slots(slots)
    }

    /// A table with exactly `slots` entries, which must be a power of two.
    pub fn with_slots(slots: usize) -> TranspositionTable {
        debug_assert!(slots.is_power_of_two());
        let mut v = Vec::with_capacity(slots);
        v.resize_with(slots, Slot::default);
        TranspositionTable {
            slots: v,
            mask: slots - 1,
        }
    }

    #[inline]
    fn slot(&self, hash: u64, i: usize) -> &Slot {
        &self.slots[(hash as usize).wrapping_add(i) & self.mask]
    }

    #[inline]
    fn read(slot: &Slot) -> (u64, u64) {
        let data = slot.data.load(Ordering::Relaxed);
        let check = slot.check.load(Ordering::Relaxed);
        (data, check)
    }

    pub fn probe(&self, hash: u64) -> Option<TtEntry> {
        for i in 0..ROTATION {
            let (data, check) = TranspositionTable::read(self.slot(hash, i));
            if data != 0 && data ^ check == hash {
                return TtEntry::unpack(data);
            }
        }
        None
    }

    pub fn store(&self, hash: u64, depth: i32, eval: i32, bound: Bound, best_move: ChessMove) {
        let entry = TtEntry {
            eval,
            best_move,
            depth: depth.max(0).min(u8::MAX as i32) as u8,
            bound,
        };

        // An exact entry is only given up to another exact one, or to a deeper bound.
        let may_replace = |old: &TtEntry| {
            !(old.bound == Bound::Exact && bound != Bound::Exact && entry.depth <= old.depth)
        };

        let mut empty = None;
        let mut shallowest: Option<(usize, u8)> = None;
        for i in 0..ROTATION {
            let (data, check) = TranspositionTable::read(self.slot(hash, i));
            match TtEntry::unpack(data) {
                None => {
                    if empty.is_none() {
                        empty = Some(i);
                    }
                }
                Some(old) if data ^ check == hash => {
                    if may_replace(&old) {
                        self.write(hash, i, &entry);
                    }
                    return;
                }
                Some(old) => {
                    let eligible = old.depth <= entry.depth
                        && !(old.bound == Bound::Exact && bound != Bound::Exact);
                    if eligible && shallowest.map_or(true, |(_, d)| old.depth < d) {
                        shallowest = Some((i, old.depth));
                    }
                }
            }
        }

        if let Some(i) = empty {
            self.write(hash, i, &entry);
        } else if let Some((i, _)) = shallowest {
            self.write(hash, i, &entry);
        }
    }

    #[inline]
    fn write(&self, hash: u64, i: usize, entry: &TtEntry) {
        let slot = self.slot(hash, i);
        let data = entry.pack();
        slot.data.store(data, Ordering::Relaxed);
        slot.check.store(data ^ hash, Ordering::Relaxed);
    }

    /// Empty every slot.  Only call between searches.
    pub fn clear(&self) {
        for slot in self.slots.iter() {
            slot.data.store(0, Ordering::Relaxed);
            slot.check.store(0, Ordering::Relaxed);
        }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Occupied slots per thousand, from a sample at the front of the table.
    pub fn hashfull(&self) -> usize {
        let sample = self.slots.len().min(1000);
        let used = self.slots[..sample]
            .iter()
            .filter(|s| s.data.load(Ordering::Relaxed) != 0)
            .count();
        used * 1000 / sample
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::square::Square;

    fn some_move() -> ChessMove {
        ChessMove::new(Square::E2, Square::E4, crate::chess_move::flags::DOUBLE_PAWN_PUSH)
    }

    #[test]
    fn pack_keeps_negative_scores() {
        let entry = TtEntry {
            eval: -123_456,
            best_move: some_move(),
            depth: 17,
            bound: Bound::Upper,
        };
        assert_eq!(TtEntry::unpack(entry.pack()), Some(entry));
        assert_eq!(TtEntry::unpack(0), None);
    }

    #[test]
    fn store_then_probe_is_idempotent() {
        let tt = TranspositionTable::with_slots(1024);
        let hash = 0x1234_5678_9ABC_DEF0;
        tt.store(hash, 5, 42, Bound::Exact, some_move());
        let entry = tt.probe(hash).unwrap();
        assert_eq!(entry.eval, 42);
        assert_eq!(entry.depth, 5);
        assert_eq!(entry.bound, Bound::Exact);
        assert_eq!(entry.best_move, some_move());

        tt.store(hash, 5, 42, Bound::Exact, some_move());
        assert_eq!(tt.probe(hash), Some(entry));
    }

    #[test]
    fn same_slot_different_hash_misses() {
        let tt = TranspositionTable::with_slots(1024);
        let hash = 0x0000_0001_0000_0007;
        let other = hash + (1 << 40);
        tt.store(hash, 3, 10, Bound::Lower, some_move());
        assert_eq!(tt.probe(other), None);
    }

    #[test]
    fn exact_entries_survive_shallower_bounds() {
        let tt = TranspositionTable::with_slots(1024);
        let hash = 99;
        tt.store(hash, 6, 100, Bound::Exact, some_move());
        tt.store(hash, 4, -50, Bound::Upper, ChessMove::NONE);
        assert_eq!(tt.probe(hash).map(|e| e.eval), Some(100));
        tt.store(hash, 8, -50, Bound::Upper, ChessMove::NONE);
        assert_eq!(tt.probe(hash).map(|e| e.eval), Some(-50));
    }

    #[test]
    fn full_rotation_replaces_the_shallowest() {
        let tt = TranspositionTable::with_slots(1024);
        let base = 16u64;
        // four different keys that all start their rotation at the same slot
        for (i, depth) in [5, 2, 7, 3].iter().enumerate() {
            tt.store(base + ((i as u64) << 32), *depth, i as i32, Bound::Lower, some_move());
        }
        let newcomer = base + (9 << 32);
        tt.store(newcomer, 4, 77, Bound::Lower, some_move());
        assert_eq!(tt.probe(newcomer).map(|e| e.eval), Some(77));
        assert_eq!(tt.probe(base + (1 << 32)), None);
        assert!(tt.probe(base).is_some());

        // too shallow to evict anyone
        let shallow = base + (10 << 32);
        tt.store(shallow, 1, 0, Bound::Lower, some_move());
        assert_eq!(tt.probe(shallow), None);
    }

    #[test]
    fn sizes_round_down_to_powers_of_two() {
        let tt = TranspositionTable::new(1);
        assert!(tt.capacity().is_power_of_two());
        assert!(tt.capacity() * 16 <= 1024 * 1024);
        assert_eq!(TranspositionTable::new(0).capacity(), MIN_SLOTS);
        tt.clear();
        assert_eq!(tt.hashfull(), 0);
    }
}
