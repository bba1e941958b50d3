use crate::errors::BookLoadError;
use crate::movegen::Move;
use crate::position::{Piece, Position};
use byteorder::{BigEndian, ByteOrder};
use memmap2::Mmap;
use rand::rngs::StdRng;
use rand::Rng;
use std::fs::File;
use std::path::Path;

/// One 16-byte book record: position hash, packed move, selection weight
/// and a reserved learn field we keep only for the record layout.
const ENTRY_SIZE: usize = 16;

/// Read-only opening book backed by a memory-mapped file of fixed-size
/// big-endian records sorted by position hash.
pub struct OpeningBook {
    map: Mmap,
}

#[derive(Clone, Copy, Debug)]
struct BookEntry {
    hash: u64,
    packed_move: u16,
    weight: u16,
}

impl OpeningBook {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, BookLoadError> {
        let file = File::open(path)?;
        let len = file.metadata()?.len();
        if len == 0 {
            return Err(BookLoadError::Empty);
        }
        if len % ENTRY_SIZE as u64 != 0 {
            return Err(BookLoadError::InvalidLength(len));
        }
        let map = unsafe { Mmap::map(&file)? };
        Ok(OpeningBook { map })
    }

    pub fn len(&self) -> usize {
        self.map.len() / ENTRY_SIZE
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn entry(&self, idx: usize) -> BookEntry {
        let bytes = &self.map[idx * ENTRY_SIZE..(idx + 1) * ENTRY_SIZE];
        BookEntry {
            hash: BigEndian::read_u64(&bytes[0..8]),
            packed_move: BigEndian::read_u16(&bytes[8..10]),
            weight: BigEndian::read_u16(&bytes[10..12]),
        }
    }

    /// Picks a book move for the position, or `None` when the position is
    /// unknown or no stored move is legal. With `random_variety` the move
    /// is drawn with probability proportional to its weight; otherwise the
    /// heaviest entry wins.
    pub fn lookup(&self, pos: &Position, rng: &mut StdRng, random_variety: bool) -> Option<Move> {
        let first = self.first_index(pos.hash)?;

        let legal = crate::movegen::MoveGenerator::legal_moves(pos);
        let mut candidates: Vec<(Move, u32)> = Vec::new();
        for idx in first..self.len() {
            let entry = self.entry(idx);
            if entry.hash != pos.hash {
                break;
            }
            if let Some(mv) = decode_move(entry.packed_move, pos, &legal) {
                candidates.push((mv, entry.weight as u32));
            }
        }

        if candidates.is_empty() {
            return None;
        }

        if !random_variety {
            return candidates.iter().max_by_key(|(_, w)| *w).map(|(m, _)| *m);
        }

        let total: u32 = candidates.iter().map(|(_, w)| w).sum();
        if total == 0 {
            // All-zero weights fall back to a uniform draw.
            return Some(candidates[rng.gen_range(0..candidates.len())].0);
        }

        let mut ticket = rng.gen_range(0..total);
        for (mv, weight) in &candidates {
            if ticket < *weight {
                return Some(*mv);
            }
            ticket -= weight;
        }
        candidates.last().map(|(m, _)| *m)
    }

    /// Binary search for the first record carrying `hash`.
    fn first_index(&self, hash: u64) -> Option<usize> {
        let mut lo = 0usize;
        let mut hi = self.len();
        while lo < hi {
            let mid = lo + (hi - lo) / 2;
            if self.entry(mid).hash < hash {
                lo = mid + 1;
            } else {
                hi = mid;
            }
        }
        if lo < self.len() && self.entry(lo).hash == hash {
            Some(lo)
        } else {
            None
        }
    }
}

/// Unpacks a book move (to-square in bits 0-5, from-square in bits 6-11,
/// promotion kind in bits 12-14) and matches it against the legal moves.
/// Rook-square castling encodings are normalized to king destinations.
fn decode_move(packed: u16, pos: &Position, legal: &[Move]) -> Option<Move> {
    let to = (packed & 0x3F) as u8;
    let from = ((packed >> 6) & 0x3F) as u8;
    let promo = match (packed >> 12) & 0x7 {
        0 => None,
        1 => Some(Piece::Knight),
        2 => Some(Piece::Bishop),
        3 => Some(Piece::Rook),
        4 => Some(Piece::Queen),
        _ => return None,
    };

    let to = normalize_castle_target(pos, from, to);

    legal
        .iter()
        .find(|m| m.from == from && m.to == to && m.promotion_piece() == promo)
        .copied()
}

fn normalize_castle_target(pos: &Position, from: u8, to: u8) -> u8 {
    if pos.piece_at(from).map(|(p, _)| p) != Some(Piece::King) {
        return to;
    }
    match (from, to) {
        (4, 7) => 6,
        (4, 0) => 2,
        (60, 63) => 62,
        (60, 56) => 58,
        _ => to,
    }
}
