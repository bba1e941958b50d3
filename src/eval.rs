use crate::bitboard::*;
use crate::position::{Color, Piece, Position, PIECE_VALUES};

const BISHOP_PAIR_BONUS: i32 = 30;
const DOUBLED_PAWN_PENALTY: i32 = 15;
const ISOLATED_PAWN_PENALTY: i32 = 20;
const BACKWARD_PAWN_PENALTY: i32 = 10;
const MOBILITY_WEIGHT: i32 = 3;
const CASTLED_KING_BONUS: i32 = 50;
const SHIELD_PAWN_BONUS: i32 = 10;
const EXPOSED_KING_PENALTY: i32 = 40;

/// Below this many knights/bishops/rooks/queens on the board the game
/// counts as an endgame.
const ENDGAME_PIECE_LIMIT: u32 = 6;
/// Positions up to this fullmove number count as the opening.
const OPENING_MOVE_LIMIT: u16 = 5;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GamePhase {
    Opening,
    Middlegame,
    Endgame,
}

// Piece-square tables, written with rank 8 on the first line. White
// lookups flip the rank (sq ^ 56); black reads them directly.

const PAWN_PST: [i32; 64] = [
     0,  0,  0,  0,  0,  0,  0,  0,
    50, 50, 50, 50, 50, 50, 50, 50,
    10, 10, 20, 30, 30, 20, 10, 10,
     5,  5, 10, 27, 27, 10,  5,  5,
     0,  0,  0, 25, 25,  0,  0,  0,
     5, -5,-10,  0,  0,-10, -5,  5,
     5, 10, 10,-25,-25, 10, 10,  5,
     0,  0,  0,  0,  0,  0,  0,  0,
];

const KNIGHT_PST: [i32; 64] = [
   -50,-40,-30,-30,-30,-30,-40,-50,
   -40,-20,  0,  0,  0,  0,-20,-40,
   -30,  0, 10, 15, 15, 10,  0,-30,
   -30,  5, 15, 20, 20, 15,  5,-30,
   -30,  0, 15, 20, 20, 15,  0,-30,
   -30,  5, 10, 15, 15, 10,  5,-30,
   -40,-20,  0,  5,  5,  0,-20,-40,
   -50,-40,-30,-30,-30,-30,-40,-50,
];

const BISHOP_PST: [i32; 64] = [
   -20,-10,-10,-10,-10,-10,-10,-20,
   -10,  0,  0,  0,  0,  0,  0,-10,
   -10,  0,  5, 10, 10,  5,  0,-10,
   -10,  5,  5, 10, 10,  5,  5,-10,
   -10,  0, 10, 10, 10, 10,  0,-10,
   -10, 10, 10, 10, 10, 10, 10,-10,
   -10,  5,  0,  0,  0,  0,  5,-10,
   -20,-10,-10,-10,-10,-10,-10,-20,
];

const ROOK_PST: [i32; 64] = [
     0,  0,  0,  0,  0,  0,  0,  0,
     5, 10, 10, 10, 10, 10, 10,  5,
    -5,  0,  0,  0,  0,  0,  0, -5,
    -5,  0,  0,  0,  0,  0,  0, -5,
    -5,  0,  0,  0,  0,  0,  0, -5,
    -5,  0,  0,  0,  0,  0,  0, -5,
    -5,  0,  0,  0,  0,  0,  0, -5,
     0,  0,  0,  5,  5,  0,  0,  0,
];

const QUEEN_PST: [i32; 64] = [
   -20,-10,-10, -5, -5,-10,-10,-20,
   -10,  0,  0,  0,  0,  0,  0,-10,
   -10,  0,  5,  5,  5,  5,  0,-10,
    -5,  0,  5,  5,  5,  5,  0, -5,
     0,  0,  5,  5,  5,  5,  0, -5,
   -10,  5,  5,  5,  5,  5,  0,-10,
   -10,  0,  5,  0,  0,  0,  0,-10,
   -20,-10,-10, -5, -5,-10,-10,-20,
];

const KING_PST_MG: [i32; 64] = [
   -30,-40,-40,-50,-50,-40,-40,-30,
   -30,-40,-40,-50,-50,-40,-40,-30,
   -30,-40,-40,-50,-50,-40,-40,-30,
   -30,-40,-40,-50,-50,-40,-40,-30,
   -20,-30,-30,-40,-40,-30,-30,-20,
   -10,-20,-20,-20,-20,-20,-20,-10,
    20, 20,  0,  0,  0,  0, 20, 20,
    20, 30, 10,  0,  0, 10, 30, 20,
];

const KING_PST_EG: [i32; 64] = [
   -50,-40,-30,-20,-20,-30,-40,-50,
   -30,-20,-10,  0,  0,-10,-20,-30,
   -30,-10, 20, 30, 30, 20,-10,-30,
   -30,-10, 30, 40, 40, 30,-10,-30,
   -30,-10, 30, 40, 40, 30,-10,-30,
   -30,-10, 20, 30, 30, 20,-10,-30,
   -30,-30,  0,  0,  0,  0,-30,-30,
   -50,-30,-30,-30,-30,-30,-30,-50,
];

pub struct Evaluator;

impl Evaluator {
    /// Static score in centipawns from the side-to-move perspective.
    /// Pure function of the position.
    pub fn evaluate(pos: &Position) -> i32 {
        let phase = Self::game_phase(pos);

        let mut score = Self::material_and_pst(pos, phase);
        score += Self::mobility(pos);
        score += Self::king_safety(pos, Color::White, phase) - Self::king_safety(pos, Color::Black, phase);
        score += Self::pawn_structure(pos, Color::White) - Self::pawn_structure(pos, Color::Black);
        score += Self::bishop_pair(pos);

        if pos.side_to_move == Color::Black {
            -score
        } else {
            score
        }
    }

    pub fn game_phase(pos: &Position) -> GamePhase {
        let mut pieces = 0;
        for color in 0..2 {
            for kind in [Piece::Knight, Piece::Bishop, Piece::Rook, Piece::Queen] {
                pieces += count_bits(pos.pieces[color][kind as usize]);
            }
        }

        if pieces <= ENDGAME_PIECE_LIMIT {
            GamePhase::Endgame
        } else if pos.fullmove_number <= OPENING_MOVE_LIMIT {
            GamePhase::Opening
        } else {
            GamePhase::Middlegame
        }
    }

    fn pst_value(piece: Piece, sq: u8, color: Color, phase: GamePhase) -> i32 {
        let idx = if color == Color::White { (sq ^ 56) as usize } else { sq as usize };
        match piece {
            Piece::Pawn => PAWN_PST[idx],
            Piece::Knight => KNIGHT_PST[idx],
            Piece::Bishop => BISHOP_PST[idx],
            Piece::Rook => ROOK_PST[idx],
            Piece::Queen => QUEEN_PST[idx],
            Piece::King => {
                if phase == GamePhase::Endgame {
                    KING_PST_EG[idx]
                } else {
                    KING_PST_MG[idx]
                }
            }
            Piece::Empty => 0,
        }
    }

    fn material_and_pst(pos: &Position, phase: GamePhase) -> i32 {
        let mut score = 0;

        for color in [Color::White, Color::Black] {
            let sign = if color == Color::White { 1 } else { -1 };
            for piece in [
                Piece::Pawn,
                Piece::Knight,
                Piece::Bishop,
                Piece::Rook,
                Piece::Queen,
                Piece::King,
            ] {
                let mut bb = pos.pieces[color as usize][piece as usize];
                while bb != 0 {
                    let (rest, sq) = pop_lsb(bb);
                    bb = rest;
                    let sq = match sq {
                        Some(s) => s,
                        None => break,
                    };
                    score += sign * (PIECE_VALUES[piece as usize] + Self::pst_value(piece, sq, color, phase));
                }
            }
        }

        score
    }

    /// Attack-set counts for knights, bishops, rooks and queens stand in
    /// for legal-move counts; the evaluator stays O(1)-ish per call.
    fn mobility(pos: &Position) -> i32 {
        let tables = &ATTACK_TABLES;
        let mut totals = [0i32; 2];

        for color in 0..2 {
            let own = pos.color_bb[color];

            for kind in [Piece::Knight, Piece::Bishop, Piece::Rook, Piece::Queen] {
                let mut bb = pos.pieces[color][kind as usize];
                while bb != 0 {
                    let (rest, sq) = pop_lsb(bb);
                    bb = rest;
                    let sq = match sq {
                        Some(s) => s,
                        None => break,
                    };
                    let attacks = match kind {
                        Piece::Knight => tables.knight_attacks[sq as usize],
                        Piece::Bishop => tables.get_bishop_attacks(sq, pos.all_pieces),
                        Piece::Rook => tables.get_rook_attacks(sq, pos.all_pieces),
                        _ => tables.get_queen_attacks(sq, pos.all_pieces),
                    } & !own;
                    totals[color] += count_bits(attacks) as i32;
                }
            }
        }

        (totals[0] - totals[1]) * MOBILITY_WEIGHT
    }

    fn king_safety(pos: &Position, color: Color, phase: GamePhase) -> i32 {
        // In the endgame the king belongs in the center; the endgame king
        // table rewards that instead.
        if phase == GamePhase::Endgame {
            return 0;
        }

        let king_sq = match pos.king_square(color) {
            Some(sq) => sq,
            None => return 0,
        };
        let king_file = king_sq % 8;
        let king_rank = king_sq / 8;
        let back_rank = if color == Color::White { 0 } else { 7 };

        let mut score = 0;

        if phase == GamePhase::Middlegame && (2..=5).contains(&king_file) {
            score -= EXPOSED_KING_PENALTY;
        }

        // Castled king: on the back rank, off the central files.
        if king_rank == back_rank && (king_file >= 6 || king_file <= 2) {
            score += CASTLED_KING_BONUS;

            let shield_rank = if color == Color::White { 1i8 } else { 6 };
            let pawns = pos.pieces[color as usize][Piece::Pawn as usize];
            for df in -1i8..=1 {
                let f = king_file as i8 + df;
                if (0..8).contains(&f) {
                    let sq = (shield_rank * 8 + f) as u8;
                    if get_bit(pawns, sq) {
                        score += SHIELD_PAWN_BONUS;
                    }
                }
            }
        }

        score
    }

    fn pawn_structure(pos: &Position, color: Color) -> i32 {
        let own_pawns = pos.pieces[color as usize][Piece::Pawn as usize];
        let enemy_pawns = pos.pieces[color.flip() as usize][Piece::Pawn as usize];
        let mut score = 0;

        for file in 0u8..8 {
            let file_mask = FILE_A << file;
            let on_file = count_bits(own_pawns & file_mask);
            if on_file > 1 {
                score -= DOUBLED_PAWN_PENALTY * (on_file - 1) as i32;
            }
        }

        let mut bb = own_pawns;
        while bb != 0 {
            let (rest, sq) = pop_lsb(bb);
            bb = rest;
            let sq = match sq {
                Some(s) => s,
                None => break,
            };
            let file = sq % 8;
            let rank = sq / 8;
            let progress = if color == Color::White { rank } else { 7 - rank } as i32;

            // Ranks strictly ahead of this pawn, from its own point of view.
            let ahead_mask = if color == Color::White {
                u64::MAX.checked_shl(8 * (rank as u32 + 1)).unwrap_or(0)
            } else {
                u64::MAX.checked_shr(8 * (8 - rank as u32)).unwrap_or(0)
            };

            // Passed: no enemy pawn ahead on this or an adjacent file.
            let span = adjacent_file_mask(file);
            if enemy_pawns & span & ahead_mask == 0 {
                score += 20 + 10 * progress;
            }

            let neighbors = span & !(FILE_A << file) & own_pawns;
            if neighbors == 0 {
                score -= ISOLATED_PAWN_PENALTY;
            } else if neighbors & !ahead_mask == 0 {
                // Backward: every friendly neighbor is strictly ahead.
                score -= BACKWARD_PAWN_PENALTY;
            }
        }

        score
    }

    fn bishop_pair(pos: &Position) -> i32 {
        let mut score = 0;
        if count_bits(pos.pieces[0][Piece::Bishop as usize]) >= 2 {
            score += BISHOP_PAIR_BONUS;
        }
        if count_bits(pos.pieces[1][Piece::Bishop as usize]) >= 2 {
            score -= BISHOP_PAIR_BONUS;
        }
        score
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_start_position_symmetric() {
        let pos = Position::default();
        assert_eq!(Evaluator::evaluate(&pos), 0);
    }

    #[test]
    fn test_negamax_sign_convention() {
        // The same board scored for the other side negates.
        let white = Position::from_fen(
            "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR w KQkq - 0 1",
        )
        .unwrap();
        let black = Position::from_fen(
            "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq - 0 1",
        )
        .unwrap();
        assert_eq!(Evaluator::evaluate(&white), -Evaluator::evaluate(&black));
    }

    #[test]
    fn test_material_advantage_dominates() {
        // White is up a queen.
        let pos = Position::from_fen("4k3/8/8/8/8/8/8/3QK3 w - - 20 40").unwrap();
        assert!(Evaluator::evaluate(&pos) > 800);
    }

    #[test]
    fn test_phase_classification() {
        assert_eq!(Evaluator::game_phase(&Position::default()), GamePhase::Opening);

        let endgame = Position::from_fen("4k3/8/8/8/8/8/4P3/4K3 w - - 0 50").unwrap();
        assert_eq!(Evaluator::game_phase(&endgame), GamePhase::Endgame);

        let middlegame = Position::from_fen(
            "r1bqk2r/pppp1ppp/2n2n2/2b1p3/2B1P3/2N2N2/PPPP1PPP/R1BQK2R w KQkq - 6 12",
        )
        .unwrap();
        assert_eq!(Evaluator::game_phase(&middlegame), GamePhase::Middlegame);
    }

    #[test]
    fn test_passed_pawn_rewarded() {
        // White pawn on e6 is passed; mirrored position without it scores lower.
        let with_passer = Position::from_fen("4k3/8/4P3/8/8/8/8/4K3 w - - 0 50").unwrap();
        let without = Position::from_fen("4k3/8/8/8/8/8/8/4K3 w - - 0 50").unwrap();
        assert!(Evaluator::evaluate(&with_passer) > Evaluator::evaluate(&without));
    }

    #[test]
    fn test_doubled_pawns_penalized() {
        let doubled = Position::from_fen("4k3/8/8/8/4P3/4P3/8/4K3 w - - 0 50").unwrap();
        let healthy = Position::from_fen("4k3/8/8/8/8/3PP3/8/4K3 w - - 0 50").unwrap();
        assert!(Evaluator::evaluate(&healthy) > Evaluator::evaluate(&doubled));
    }

    #[test]
    fn test_castled_king_safer_in_middlegame() {
        let castled = Position::from_fen(
            "r1bqk2r/pppp1ppp/2n2n2/2b1p3/2B1P3/2N2N2/PPPP1PPP/R1BQ1RK1 w kq - 6 12",
        )
        .unwrap();
        let central = Position::from_fen(
            "r1bqk2r/pppp1ppp/2n2n2/2b1p3/2B1P3/2N2N2/PPPP1PPP/R1BQK2R w KQkq - 6 12",
        )
        .unwrap();
        assert!(Evaluator::evaluate(&castled) > Evaluator::evaluate(&central));
    }
}
