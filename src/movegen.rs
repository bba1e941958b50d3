use crate::bitboard::*;
use crate::position::{square_name, Color, Piece, Position};

/// A move as the search stack sees it: packed squares plus a flag nibble.
/// Never persisted except through `to_uci`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Move {
    pub from: u8,
    pub to: u8,
    pub flags: u8,
}

pub const QUIET_MOVE: u8 = 0;
pub const DOUBLE_PAWN_PUSH: u8 = 1;
pub const KING_CASTLE: u8 = 2;
pub const QUEEN_CASTLE: u8 = 3;
pub const CAPTURE: u8 = 4;
pub const EP_CAPTURE: u8 = 5;
pub const KNIGHT_PROMOTION: u8 = 8;
pub const BISHOP_PROMOTION: u8 = 9;
pub const ROOK_PROMOTION: u8 = 10;
pub const QUEEN_PROMOTION: u8 = 11;
pub const KNIGHT_PROMO_CAPTURE: u8 = 12;
pub const BISHOP_PROMO_CAPTURE: u8 = 13;
pub const ROOK_PROMO_CAPTURE: u8 = 14;
pub const QUEEN_PROMO_CAPTURE: u8 = 15;

impl Move {
    pub fn new(from: u8, to: u8, flags: u8) -> Self {
        Move { from, to, flags }
    }

    pub fn to_uci(&self) -> String {
        let mut uci = format!("{}{}", square_name(self.from), square_name(self.to));
        if let Some(piece) = self.promotion_piece() {
            uci.push(match piece {
                Piece::Knight => 'n',
                Piece::Bishop => 'b',
                Piece::Rook => 'r',
                _ => 'q',
            });
        }
        uci
    }

    pub fn is_capture(&self) -> bool {
        self.flags == CAPTURE || self.flags == EP_CAPTURE || self.flags >= KNIGHT_PROMO_CAPTURE
    }

    pub fn is_promotion(&self) -> bool {
        self.flags >= KNIGHT_PROMOTION
    }

    pub fn is_castle(&self) -> bool {
        self.flags == KING_CASTLE || self.flags == QUEEN_CASTLE
    }

    pub fn promotion_piece(&self) -> Option<Piece> {
        match self.flags {
            KNIGHT_PROMOTION | KNIGHT_PROMO_CAPTURE => Some(Piece::Knight),
            BISHOP_PROMOTION | BISHOP_PROMO_CAPTURE => Some(Piece::Bishop),
            ROOK_PROMOTION | ROOK_PROMO_CAPTURE => Some(Piece::Rook),
            QUEEN_PROMOTION | QUEEN_PROMO_CAPTURE => Some(Piece::Queen),
            _ => None,
        }
    }
}

pub struct MoveGenerator;

impl MoveGenerator {
    /// All strictly legal moves for the side to move.
    pub fn legal_moves(pos: &Position) -> Vec<Move> {
        let pseudo = Self::pseudo_legal(pos);
        let mut legal = Vec::with_capacity(pseudo.len());

        for mv in pseudo {
            let mut next = pos.clone();
            next.make_move(&mv);
            if !next.is_check(pos.side_to_move) {
                legal.push(mv);
            }
        }

        legal
    }

    /// Legal captures only, for quiescence search.
    pub fn captures(pos: &Position) -> Vec<Move> {
        Self::legal_moves(pos)
            .into_iter()
            .filter(|m| m.is_capture())
            .collect()
    }

    fn pseudo_legal(pos: &Position) -> Vec<Move> {
        let mut moves = Vec::with_capacity(64);
        let color = pos.side_to_move;

        Self::pawn_moves(pos, color, &mut moves);
        Self::piece_moves(pos, color, Piece::Knight, &mut moves);
        Self::piece_moves(pos, color, Piece::Bishop, &mut moves);
        Self::piece_moves(pos, color, Piece::Rook, &mut moves);
        Self::piece_moves(pos, color, Piece::Queen, &mut moves);
        Self::piece_moves(pos, color, Piece::King, &mut moves);
        Self::castling_moves(pos, color, &mut moves);

        moves
    }

    /// Knight, slider and king moves share one attack-set walk; only the
    /// attack lookup differs per piece kind.
    fn piece_moves(pos: &Position, color: Color, piece: Piece, moves: &mut Vec<Move>) {
        let own = pos.color_bb[color as usize];
        let tables = &ATTACK_TABLES;

        let mut from_bb = pos.pieces[color as usize][piece as usize];
        while from_bb != 0 {
            let (rest, sq) = pop_lsb(from_bb);
            from_bb = rest;
            let from = match sq {
                Some(s) => s,
                None => break,
            };

            let mut attacks = match piece {
                Piece::Knight => tables.knight_attacks[from as usize],
                Piece::Bishop => tables.get_bishop_attacks(from, pos.all_pieces),
                Piece::Rook => tables.get_rook_attacks(from, pos.all_pieces),
                Piece::Queen => tables.get_queen_attacks(from, pos.all_pieces),
                Piece::King => tables.king_attacks[from as usize],
                Piece::Pawn | Piece::Empty => 0,
            } & !own;

            while attacks != 0 {
                let (rest, to) = pop_lsb(attacks);
                attacks = rest;
                let to = match to {
                    Some(t) => t,
                    None => break,
                };
                let flag = if get_bit(pos.all_pieces, to) { CAPTURE } else { QUIET_MOVE };
                moves.push(Move::new(from, to, flag));
            }
        }
    }

    fn pawn_moves(pos: &Position, color: Color, moves: &mut Vec<Move>) {
        let direction: i8 = if color == Color::White { 8 } else { -8 };
        let start_rank = if color == Color::White { 1 } else { 6 };
        let promo_rank = if color == Color::White { 7 } else { 0 };
        let enemy = pos.color_bb[color.flip() as usize];
        let empty = !pos.all_pieces;

        let mut pawns = pos.pieces[color as usize][Piece::Pawn as usize];
        while pawns != 0 {
            let (rest, sq) = pop_lsb(pawns);
            pawns = rest;
            let from = match sq {
                Some(s) => s,
                None => break,
            };
            let rank = from / 8;
            let file = from % 8;

            // Pushes.
            let to = from.wrapping_add(direction as u8);
            if to < 64 && get_bit(empty, to) {
                if to / 8 == promo_rank {
                    for flag in [QUEEN_PROMOTION, ROOK_PROMOTION, BISHOP_PROMOTION, KNIGHT_PROMOTION] {
                        moves.push(Move::new(from, to, flag));
                    }
                } else {
                    moves.push(Move::new(from, to, QUIET_MOVE));
                    if rank == start_rank {
                        let to2 = from.wrapping_add((2 * direction) as u8);
                        if get_bit(empty, to2) {
                            moves.push(Move::new(from, to2, DOUBLE_PAWN_PUSH));
                        }
                    }
                }
            }

            // Diagonal captures, including en passant.
            for df in [direction - 1, direction + 1] {
                let to = from.wrapping_add(df as u8);
                if to >= 64 {
                    continue;
                }
                if ((to % 8) as i8 - file as i8).abs() != 1 {
                    continue;
                }
                if get_bit(enemy, to) {
                    if to / 8 == promo_rank {
                        for flag in [
                            QUEEN_PROMO_CAPTURE,
                            ROOK_PROMO_CAPTURE,
                            BISHOP_PROMO_CAPTURE,
                            KNIGHT_PROMO_CAPTURE,
                        ] {
                            moves.push(Move::new(from, to, flag));
                        }
                    } else {
                        moves.push(Move::new(from, to, CAPTURE));
                    }
                } else if pos.ep_square == Some(to) {
                    moves.push(Move::new(from, to, EP_CAPTURE));
                }
            }
        }
    }

    fn castling_moves(pos: &Position, color: Color, moves: &mut Vec<Move>) {
        // (rights bit, king from, king to, squares that must be empty,
        //  squares that must not be attacked)
        let lines: [(u8, u8, u8, &[u8], [u8; 3]); 2] = if color == Color::White {
            [
                (1, 4, 6, &[5, 6][..], [4, 5, 6]),
                (2, 4, 2, &[1, 2, 3][..], [4, 3, 2]),
            ]
        } else {
            [
                (4, 60, 62, &[61, 62][..], [60, 61, 62]),
                (8, 60, 58, &[57, 58, 59][..], [60, 59, 58]),
            ]
        };

        let them = color.flip();
        for (right, from, to, empty, safe) in lines {
            if pos.castling_rights & right == 0 {
                continue;
            }
            if empty.iter().any(|&sq| get_bit(pos.all_pieces, sq)) {
                continue;
            }
            if safe.iter().any(|&sq| pos.is_square_attacked(sq, them)) {
                continue;
            }
            let flag = if right & (1 | 4) != 0 { KING_CASTLE } else { QUEEN_CASTLE };
            moves.push(Move::new(from, to, flag));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn perft(pos: &Position, depth: u32) -> u64 {
        if depth == 0 {
            return 1;
        }
        let mut nodes = 0;
        for mv in MoveGenerator::legal_moves(pos) {
            let mut next = pos.clone();
            next.make_move(&mv);
            nodes += perft(&next, depth - 1);
        }
        nodes
    }

    #[test]
    fn test_perft_start_position() {
        let pos = Position::default();
        assert_eq!(perft(&pos, 1), 20);
        assert_eq!(perft(&pos, 2), 400);
        assert_eq!(perft(&pos, 3), 8902);
    }

    #[test]
    fn test_perft_kiwipete() {
        // Standard move-generation torture position.
        let pos = Position::from_fen(
            "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1",
        )
        .unwrap();
        assert_eq!(perft(&pos, 1), 48);
        assert_eq!(perft(&pos, 2), 2039);
    }

    #[test]
    fn test_captures_subset_of_legal() {
        let pos = Position::from_fen(
            "r1bqkbnr/pppp1ppp/2n5/4p3/2B1P3/5N2/PPPP1PPP/RNBQK2R w KQkq - 4 4",
        )
        .unwrap();
        let legal = MoveGenerator::legal_moves(&pos);
        for cap in MoveGenerator::captures(&pos) {
            assert!(cap.is_capture());
            assert!(legal.contains(&cap));
        }
    }

    #[test]
    fn test_promotion_generation() {
        let pos = Position::from_fen("8/P6k/8/8/8/8/6K1/8 w - - 0 1").unwrap();
        let moves = MoveGenerator::legal_moves(&pos);
        let promos: Vec<_> = moves.iter().filter(|m| m.is_promotion()).collect();
        assert_eq!(promos.len(), 4);
        assert!(promos.iter().any(|m| m.to_uci() == "a7a8q"));
    }

    #[test]
    fn test_castling_blocked_by_attack() {
        // Black rook on e8... rather, a rook covering f1 forbids O-O.
        let pos = Position::from_fen("4k3/8/8/8/8/5r2/8/4K2R w K - 0 1").unwrap();
        let moves = MoveGenerator::legal_moves(&pos);
        assert!(!moves.iter().any(|m| m.is_castle()));
    }

    #[test]
    fn test_uci_round_trip() {
        let mv = Move::new(12, 28, QUIET_MOVE);
        assert_eq!(mv.to_uci(), "e2e4");
        let promo = Move::new(48, 56, QUEEN_PROMOTION);
        assert_eq!(promo.to_uci(), "a7a8q");
    }
}
