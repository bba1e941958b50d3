use crate::bitboard::*;
use crate::movegen::{Move, MoveGenerator, CAPTURE, DOUBLE_PAWN_PUSH, EP_CAPTURE, KING_CASTLE, QUEEN_CASTLE};
use crate::zobrist::ZOBRIST;
use std::collections::VecDeque;
use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(usize)]
pub enum Piece {
    Empty = 0,
    Pawn = 1,
    Knight = 2,
    Bishop = 3,
    Rook = 4,
    Queen = 5,
    King = 6,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Color {
    White = 0,
    Black = 1,
}

impl Color {
    pub fn flip(self) -> Self {
        match self {
            Color::White => Color::Black,
            Color::Black => Color::White,
        }
    }
}

/// Material values in centipawns, indexed by `Piece`.
pub const PIECE_VALUES: [i32; 7] = [0, 100, 320, 330, 500, 900, 20000];

/// Full game state: piece placement, castling rights, en-passant square,
/// move clocks and the incrementally maintained Zobrist hash.
#[derive(Clone)]
pub struct Position {
    pub pieces: [[Bitboard; 7]; 2],
    pub color_bb: [Bitboard; 2],
    pub all_pieces: Bitboard,
    pub side_to_move: Color,
    pub castling_rights: u8,
    pub ep_square: Option<u8>,
    pub halfmove_clock: u16,
    pub fullmove_number: u16,
    pub hash: u64,
    history: VecDeque<u64>,
}

impl Default for Position {
    fn default() -> Self {
        Self::from_fen("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1").unwrap()
    }
}

impl fmt::Debug for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Position({})", self.to_fen())
    }
}

impl Position {
    pub fn from_fen(fen: &str) -> Result<Self, String> {
        let parts: Vec<&str> = fen.split_whitespace().collect();
        if parts.len() < 4 {
            return Err(format!("FEN has too few fields: {fen}"));
        }

        let mut pos = Position {
            pieces: [[0; 7]; 2],
            color_bb: [0; 2],
            all_pieces: 0,
            side_to_move: Color::White,
            castling_rights: 0,
            ep_square: None,
            halfmove_clock: 0,
            fullmove_number: 1,
            hash: 0,
            history: VecDeque::with_capacity(100),
        };

        let mut rank = 7i8;
        let mut file = 0i8;
        for ch in parts[0].chars() {
            if ch == '/' {
                rank -= 1;
                file = 0;
            } else if let Some(skip) = ch.to_digit(10) {
                file += skip as i8;
            } else {
                if !(0..8).contains(&rank) || !(0..8).contains(&file) {
                    return Err(format!("FEN placement overflows the board: {fen}"));
                }
                let sq = (rank * 8 + file) as u8;
                let color = if ch.is_uppercase() { Color::White } else { Color::Black };
                let piece = match ch.to_ascii_lowercase() {
                    'p' => Piece::Pawn,
                    'n' => Piece::Knight,
                    'b' => Piece::Bishop,
                    'r' => Piece::Rook,
                    'q' => Piece::Queen,
                    'k' => Piece::King,
                    other => return Err(format!("invalid piece char: {other}")),
                };
                pos.put_piece(color, piece, sq);
                file += 1;
            }
        }

        pos.side_to_move = match parts[1] {
            "w" => Color::White,
            "b" => Color::Black,
            other => return Err(format!("invalid side to move: {other}")),
        };

        if parts[2] != "-" {
            for ch in parts[2].chars() {
                pos.castling_rights |= match ch {
                    'K' => 1,
                    'Q' => 2,
                    'k' => 4,
                    'q' => 8,
                    _ => 0,
                };
            }
        }

        if parts[3] != "-" {
            pos.ep_square = Some(parse_square(parts[3])?);
        }

        if parts.len() > 4 {
            pos.halfmove_clock = parts[4].parse().unwrap_or(0);
        }
        if parts.len() > 5 {
            pos.fullmove_number = parts[5].parse().unwrap_or(1);
        }

        pos.hash = pos.compute_hash();
        pos.history.push_back(pos.hash);
        Ok(pos)
    }

    pub fn to_fen(&self) -> String {
        let mut fen = String::new();

        for rank in (0..8).rev() {
            let mut empty = 0;
            for file in 0..8 {
                let sq = rank * 8 + file;
                if let Some((piece, color)) = self.piece_at(sq) {
                    if empty > 0 {
                        fen.push_str(&empty.to_string());
                        empty = 0;
                    }
                    let ch = match piece {
                        Piece::Pawn => 'p',
                        Piece::Knight => 'n',
                        Piece::Bishop => 'b',
                        Piece::Rook => 'r',
                        Piece::Queen => 'q',
                        Piece::King => 'k',
                        Piece::Empty => continue,
                    };
                    fen.push(if color == Color::White { ch.to_ascii_uppercase() } else { ch });
                } else {
                    empty += 1;
                }
            }
            if empty > 0 {
                fen.push_str(&empty.to_string());
            }
            if rank > 0 {
                fen.push('/');
            }
        }

        fen.push(' ');
        fen.push(if self.side_to_move == Color::White { 'w' } else { 'b' });

        fen.push(' ');
        if self.castling_rights == 0 {
            fen.push('-');
        } else {
            if self.castling_rights & 1 != 0 { fen.push('K'); }
            if self.castling_rights & 2 != 0 { fen.push('Q'); }
            if self.castling_rights & 4 != 0 { fen.push('k'); }
            if self.castling_rights & 8 != 0 { fen.push('q'); }
        }

        fen.push(' ');
        match self.ep_square {
            Some(sq) => fen.push_str(&square_name(sq)),
            None => fen.push('-'),
        }

        fen.push_str(&format!(" {} {}", self.halfmove_clock, self.fullmove_number));
        fen
    }

    /// Position identifier for the learning store: the FEN with the
    /// halfmove/fullmove counters stripped, so positions that differ only
    /// in move-count metadata share their statistics.
    pub fn learning_key(&self) -> String {
        let fen = self.to_fen();
        fen.rsplitn(3, ' ').nth(2).unwrap_or(&fen).to_string()
    }

    fn put_piece(&mut self, color: Color, piece: Piece, sq: u8) {
        self.pieces[color as usize][piece as usize] =
            set_bit(self.pieces[color as usize][piece as usize], sq);
        self.color_bb[color as usize] = set_bit(self.color_bb[color as usize], sq);
        self.all_pieces = set_bit(self.all_pieces, sq);
    }

    fn remove_piece(&mut self, color: Color, piece: Piece, sq: u8) {
        self.pieces[color as usize][piece as usize] =
            clear_bit(self.pieces[color as usize][piece as usize], sq);
        self.color_bb[color as usize] = clear_bit(self.color_bb[color as usize], sq);
        self.all_pieces = clear_bit(self.all_pieces, sq);
    }

    pub fn piece_at(&self, sq: u8) -> Option<(Piece, Color)> {
        if !get_bit(self.all_pieces, sq) {
            return None;
        }

        let color = if get_bit(self.color_bb[0], sq) { Color::White } else { Color::Black };

        for (kind, piece) in [
            Piece::Pawn,
            Piece::Knight,
            Piece::Bishop,
            Piece::Rook,
            Piece::Queen,
            Piece::King,
        ]
        .into_iter()
        .enumerate()
        {
            if get_bit(self.pieces[color as usize][kind + 1], sq) {
                return Some((piece, color));
            }
        }
        None
    }

    pub fn king_square(&self, color: Color) -> Option<u8> {
        lsb(self.pieces[color as usize][Piece::King as usize])
    }

    pub fn is_check(&self, color: Color) -> bool {
        match self.king_square(color) {
            Some(king_sq) => self.is_square_attacked(king_sq, color.flip()),
            None => false,
        }
    }

    pub fn is_checkmate(&self) -> bool {
        self.is_check(self.side_to_move) && MoveGenerator::legal_moves(self).is_empty()
    }

    pub fn is_stalemate(&self) -> bool {
        !self.is_check(self.side_to_move) && MoveGenerator::legal_moves(self).is_empty()
    }

    pub fn is_square_attacked(&self, sq: u8, by_color: Color) -> bool {
        let tables = &ATTACK_TABLES;
        let them = by_color as usize;

        if tables.pawn_attacks[1 - them][sq as usize] & self.pieces[them][Piece::Pawn as usize] != 0 {
            return true;
        }
        if tables.knight_attacks[sq as usize] & self.pieces[them][Piece::Knight as usize] != 0 {
            return true;
        }
        if tables.king_attacks[sq as usize] & self.pieces[them][Piece::King as usize] != 0 {
            return true;
        }

        let diag = tables.get_bishop_attacks(sq, self.all_pieces);
        if diag & (self.pieces[them][Piece::Bishop as usize] | self.pieces[them][Piece::Queen as usize]) != 0 {
            return true;
        }

        let ortho = tables.get_rook_attacks(sq, self.all_pieces);
        if ortho & (self.pieces[them][Piece::Rook as usize] | self.pieces[them][Piece::Queen as usize]) != 0 {
            return true;
        }

        false
    }

    pub fn is_repetition(&self) -> bool {
        self.history.iter().filter(|&&h| h == self.hash).count() >= 2
    }

    pub fn is_draw(&self) -> bool {
        self.is_repetition() || self.halfmove_clock >= 100 || self.is_insufficient_material()
    }

    fn is_insufficient_material(&self) -> bool {
        let total = count_bits(self.all_pieces);
        if total == 2 {
            return true;
        }

        if total == 3 {
            let minors = |c: usize| {
                count_bits(self.pieces[c][Piece::Knight as usize])
                    + count_bits(self.pieces[c][Piece::Bishop as usize])
            };
            if minors(0) == 1 || minors(1) == 1 {
                return true;
            }
        }

        false
    }

    /// True when the side to move still has pieces besides king and pawns.
    /// Used as the zugzwang guard for null-move pruning.
    pub fn has_nonpawn_material(&self, color: Color) -> bool {
        let c = color as usize;
        (self.pieces[c][Piece::Knight as usize]
            | self.pieces[c][Piece::Bishop as usize]
            | self.pieces[c][Piece::Rook as usize]
            | self.pieces[c][Piece::Queen as usize])
            != 0
    }

    fn compute_hash(&self) -> u64 {
        let mut hash = 0u64;

        for sq in 0..64 {
            if let Some((piece, color)) = self.piece_at(sq) {
                hash ^= ZOBRIST.piece_keys[color as usize][piece as usize][sq as usize];
            }
        }

        hash ^= ZOBRIST.castle_keys[self.castling_rights as usize];

        if let Some(ep_sq) = self.ep_square {
            hash ^= ZOBRIST.ep_keys[(ep_sq % 8) as usize];
        }

        if self.side_to_move == Color::Black {
            hash ^= ZOBRIST.side_key;
        }

        hash
    }

    pub fn make_move(&mut self, mv: &Move) {
        let from = mv.from;
        let to = mv.to;
        let flags = mv.flags;
        let color = self.side_to_move;

        if let Some((piece, _)) = self.piece_at(from) {
            if piece == Piece::Pawn || mv.is_capture() {
                self.halfmove_clock = 0;
                self.history.clear();
            } else {
                self.halfmove_clock += 1;
            }

            if let Some(ep_sq) = self.ep_square.take() {
                self.hash ^= ZOBRIST.ep_keys[(ep_sq % 8) as usize];
            }

            // Remove the captured piece first.
            if flags == EP_CAPTURE {
                let captured_sq = if color == Color::White { to - 8 } else { to + 8 };
                let them = color.flip();
                self.remove_piece(them, Piece::Pawn, captured_sq);
                self.hash ^= ZOBRIST.piece_keys[them as usize][Piece::Pawn as usize][captured_sq as usize];
            } else if mv.is_capture() {
                if let Some((captured, them)) = self.piece_at(to) {
                    self.remove_piece(them, captured, to);
                    self.hash ^= ZOBRIST.piece_keys[them as usize][captured as usize][to as usize];
                }
            }

            self.remove_piece(color, piece, from);
            self.hash ^= ZOBRIST.piece_keys[color as usize][piece as usize][from as usize];

            let landed = mv.promotion_piece().unwrap_or(piece);
            self.put_piece(color, landed, to);
            self.hash ^= ZOBRIST.piece_keys[color as usize][landed as usize][to as usize];

            if flags == KING_CASTLE || flags == QUEEN_CASTLE {
                let (rook_from, rook_to) = match (flags, color) {
                    (KING_CASTLE, Color::White) => (7, 5),
                    (KING_CASTLE, Color::Black) => (63, 61),
                    (_, Color::White) => (0, 3),
                    (_, Color::Black) => (56, 59),
                };
                self.remove_piece(color, Piece::Rook, rook_from);
                self.put_piece(color, Piece::Rook, rook_to);
                self.hash ^= ZOBRIST.piece_keys[color as usize][Piece::Rook as usize][rook_from as usize];
                self.hash ^= ZOBRIST.piece_keys[color as usize][Piece::Rook as usize][rook_to as usize];
            }

            if flags == DOUBLE_PAWN_PUSH {
                let ep_sq = if color == Color::White { to - 8 } else { to + 8 };
                self.ep_square = Some(ep_sq);
                self.hash ^= ZOBRIST.ep_keys[(ep_sq % 8) as usize];
            }

            let old_castling = self.castling_rights;
            if piece == Piece::King {
                self.castling_rights &= if color == Color::White { !(1 | 2) } else { !(4 | 8) };
            }
            if piece == Piece::Rook || mv.is_capture() {
                if from == 0 || to == 0 { self.castling_rights &= !2; }
                if from == 7 || to == 7 { self.castling_rights &= !1; }
                if from == 56 || to == 56 { self.castling_rights &= !8; }
                if from == 63 || to == 63 { self.castling_rights &= !4; }
            }
            if old_castling != self.castling_rights {
                self.hash ^= ZOBRIST.castle_keys[old_castling as usize];
                self.hash ^= ZOBRIST.castle_keys[self.castling_rights as usize];
            }
        }

        self.side_to_move = self.side_to_move.flip();
        self.hash ^= ZOBRIST.side_key;

        if self.side_to_move == Color::White {
            self.fullmove_number += 1;
        }

        self.history.push_back(self.hash);
    }

    /// Passes the turn without moving: used by null-move pruning. The
    /// en-passant square is dropped since it only binds for one reply.
    pub fn make_null_move(&mut self) {
        if let Some(ep_sq) = self.ep_square.take() {
            self.hash ^= ZOBRIST.ep_keys[(ep_sq % 8) as usize];
        }
        self.side_to_move = self.side_to_move.flip();
        self.hash ^= ZOBRIST.side_key;
    }

    /// Applies a move given in UCI notation, if legal.
    pub fn make_move_uci(&mut self, uci: &str) -> Result<(), String> {
        if uci.len() < 4 {
            return Err(format!("malformed UCI move: {uci}"));
        }

        let from = parse_square(&uci[0..2])?;
        let to = parse_square(&uci[2..4])?;
        let promo = uci.chars().nth(4);

        for mv in MoveGenerator::legal_moves(self) {
            if mv.from != from || mv.to != to {
                continue;
            }
            let promo_matches = match (promo, mv.promotion_piece()) {
                (None, None) => true,
                (Some('n'), Some(Piece::Knight)) => true,
                (Some('b'), Some(Piece::Bishop)) => true,
                (Some('r'), Some(Piece::Rook)) => true,
                (Some('q'), Some(Piece::Queen)) => true,
                _ => false,
            };
            if promo_matches {
                self.make_move(&mv);
                return Ok(());
            }
        }

        Err(format!("illegal move: {uci}"))
    }
}

pub fn parse_square(s: &str) -> Result<u8, String> {
    let bytes = s.as_bytes();
    if bytes.len() != 2 {
        return Err(format!("invalid square: {s}"));
    }
    let file = bytes[0].wrapping_sub(b'a');
    let rank = bytes[1].wrapping_sub(b'1');
    if file > 7 || rank > 7 {
        return Err(format!("invalid square: {s}"));
    }
    Ok(rank * 8 + file)
}

pub fn square_name(sq: u8) -> String {
    let file = (b'a' + (sq % 8)) as char;
    let rank = (b'1' + (sq / 8)) as char;
    format!("{}{}", file, rank)
}
