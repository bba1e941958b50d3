pub type Bitboard = u64;

pub const FILE_A: Bitboard = 0x0101010101010101;

#[inline(always)]
pub fn set_bit(bb: Bitboard, sq: u8) -> Bitboard {
    bb | (1u64 << sq)
}

#[inline(always)]
pub fn clear_bit(bb: Bitboard, sq: u8) -> Bitboard {
    bb & !(1u64 << sq)
}

#[inline(always)]
pub fn get_bit(bb: Bitboard, sq: u8) -> bool {
    (bb & (1u64 << sq)) != 0
}

#[inline(always)]
pub fn count_bits(bb: Bitboard) -> u32 {
    bb.count_ones()
}

#[inline(always)]
pub fn lsb(bb: Bitboard) -> Option<u8> {
    if bb == 0 {
        None
    } else {
        Some(bb.trailing_zeros() as u8)
    }
}

/// Clears the lowest set bit, returning the remaining board and its square.
#[inline(always)]
pub fn pop_lsb(bb: Bitboard) -> (Bitboard, Option<u8>) {
    if bb == 0 {
        return (0, None);
    }
    let sq = bb.trailing_zeros() as u8;
    (bb & (bb - 1), Some(sq))
}

/// Mask of the given file plus both adjacent files.
pub fn adjacent_file_mask(file: u8) -> Bitboard {
    let mut mask = FILE_A << file;
    if file > 0 {
        mask |= FILE_A << (file - 1);
    }
    if file < 7 {
        mask |= FILE_A << (file + 1);
    }
    mask
}

pub struct AttackTables {
    pub pawn_attacks: [[Bitboard; 64]; 2],
    pub knight_attacks: [Bitboard; 64],
    pub king_attacks: [Bitboard; 64],
}

impl AttackTables {
    fn new() -> Self {
        let mut tables = AttackTables {
            pawn_attacks: [[0; 64]; 2],
            knight_attacks: [0; 64],
            king_attacks: [0; 64],
        };

        for sq in 0u8..64 {
            let rank = (sq / 8) as i8;
            let file = (sq % 8) as i8;

            // White pawn attacks go up the board, black down.
            for (color, dr) in [(0usize, 1i8), (1, -1)] {
                for df in [-1i8, 1] {
                    let (r, f) = (rank + dr, file + df);
                    if (0..8).contains(&r) && (0..8).contains(&f) {
                        tables.pawn_attacks[color][sq as usize] =
                            set_bit(tables.pawn_attacks[color][sq as usize], (r * 8 + f) as u8);
                    }
                }
            }

            const KNIGHT_DELTAS: [(i8, i8); 8] = [
                (-2, -1), (-2, 1), (-1, -2), (-1, 2),
                (1, -2), (1, 2), (2, -1), (2, 1),
            ];
            for (dr, df) in KNIGHT_DELTAS {
                let (r, f) = (rank + dr, file + df);
                if (0..8).contains(&r) && (0..8).contains(&f) {
                    tables.knight_attacks[sq as usize] =
                        set_bit(tables.knight_attacks[sq as usize], (r * 8 + f) as u8);
                }
            }

            const KING_DELTAS: [(i8, i8); 8] = [
                (-1, -1), (-1, 0), (-1, 1), (0, -1),
                (0, 1), (1, -1), (1, 0), (1, 1),
            ];
            for (dr, df) in KING_DELTAS {
                let (r, f) = (rank + dr, file + df);
                if (0..8).contains(&r) && (0..8).contains(&f) {
                    tables.king_attacks[sq as usize] =
                        set_bit(tables.king_attacks[sq as usize], (r * 8 + f) as u8);
                }
            }
        }

        tables
    }

    fn ray_attacks(sq: u8, occ: Bitboard, directions: &[(i8, i8); 4]) -> Bitboard {
        let mut attacks = 0;
        let rank = (sq / 8) as i8;
        let file = (sq % 8) as i8;

        for (dr, df) in directions.iter() {
            let mut r = rank + dr;
            let mut f = file + df;
            while (0..8).contains(&r) && (0..8).contains(&f) {
                let target = (r * 8 + f) as u8;
                attacks = set_bit(attacks, target);
                if get_bit(occ, target) {
                    break;
                }
                r += dr;
                f += df;
            }
        }

        attacks
    }

    #[inline]
    pub fn get_bishop_attacks(&self, sq: u8, occ: Bitboard) -> Bitboard {
        Self::ray_attacks(sq, occ, &[(-1, -1), (-1, 1), (1, -1), (1, 1)])
    }

    #[inline]
    pub fn get_rook_attacks(&self, sq: u8, occ: Bitboard) -> Bitboard {
        Self::ray_attacks(sq, occ, &[(-1, 0), (1, 0), (0, -1), (0, 1)])
    }

    #[inline]
    pub fn get_queen_attacks(&self, sq: u8, occ: Bitboard) -> Bitboard {
        self.get_rook_attacks(sq, occ) | self.get_bishop_attacks(sq, occ)
    }
}

lazy_static::lazy_static! {
    pub static ref ATTACK_TABLES: AttackTables = AttackTables::new();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pop_lsb() {
        let bb: Bitboard = 0b1010;
        let (rest, sq) = pop_lsb(bb);
        assert_eq!(sq, Some(1));
        assert_eq!(rest, 0b1000);
        assert_eq!(pop_lsb(0), (0, None));
    }

    #[test]
    fn test_knight_attacks_corner() {
        // Knight on a1 reaches only b3 and c2.
        let attacks = ATTACK_TABLES.knight_attacks[0];
        assert_eq!(count_bits(attacks), 2);
        assert!(get_bit(attacks, 17));
        assert!(get_bit(attacks, 10));
    }

    #[test]
    fn test_rook_attacks_blocked() {
        // Rook on a1 with a blocker on a3 sees a2, a3 and the first rank.
        let occ = set_bit(0, 16);
        let attacks = ATTACK_TABLES.get_rook_attacks(0, occ);
        assert!(get_bit(attacks, 8));
        assert!(get_bit(attacks, 16));
        assert!(!get_bit(attacks, 24));
        assert!(get_bit(attacks, 7));
    }

    #[test]
    fn test_pawn_attacks_direction() {
        // White pawn on e4 attacks d5 and f5; black attacks d3 and f3.
        let white = ATTACK_TABLES.pawn_attacks[0][28];
        assert!(get_bit(white, 35) && get_bit(white, 37));
        let black = ATTACK_TABLES.pawn_attacks[1][28];
        assert!(get_bit(black, 19) && get_bit(black, 21));
    }
}
