use crate::movegen::Move;
use crate::position::{Piece, Position, PIECE_VALUES};

pub const MAX_PLY: usize = 64;

const TT_MOVE_SCORE: i32 = 20000;
const KILLER_SCORE: i32 = 10000;
const QUEEN_PROMO_SCORE: i32 = 1200;
const MINOR_PROMO_SCORE: i32 = 900;
const CAPTURE_BASE: i32 = 200;
const CASTLE_SCORE: i32 = 80;
const CHECK_SCORE: i32 = 40;
const HISTORY_CAP: i32 = 10000;

/// Heuristic move-ordering state: two killer slots per ply and a
/// piece-kind/destination history table. Scores are additive, so a move
/// can collect several bonuses at once.
pub struct MoveOrdering {
    killers: [[Option<Move>; 2]; MAX_PLY],
    history: [[i32; 64]; 7],
}

impl MoveOrdering {
    pub fn new() -> Self {
        MoveOrdering {
            killers: [[None; 2]; MAX_PLY],
            history: [[0; 64]; 7],
        }
    }

    /// Sorts `moves` best-first in place. `learn_bonus` lets the caller mix
    /// in a per-move bias from the learning store.
    pub fn order_moves<F>(
        &self,
        pos: &Position,
        moves: &mut [Move],
        tt_move: Option<Move>,
        ply: usize,
        learn_bonus: F,
    ) where
        F: Fn(&Move) -> i32,
    {
        moves.sort_by_cached_key(|mv| -(self.score_move(pos, mv, tt_move, ply) + learn_bonus(mv)));
    }

    pub fn score_move(&self, pos: &Position, mv: &Move, tt_move: Option<Move>, ply: usize) -> i32 {
        let mut score = 0;

        if tt_move == Some(*mv) {
            score += TT_MOVE_SCORE;
        }

        if ply < MAX_PLY && self.killers[ply].contains(&Some(*mv)) {
            score += KILLER_SCORE;
        }

        match mv.promotion_piece() {
            Some(Piece::Queen) => score += QUEEN_PROMO_SCORE,
            Some(_) => score += MINOR_PROMO_SCORE,
            None => {}
        }

        if mv.is_capture() {
            let victim = pos
                .piece_at(mv.to)
                .map(|(p, _)| PIECE_VALUES[p as usize])
                .unwrap_or(PIECE_VALUES[Piece::Pawn as usize]);
            let attacker = pos
                .piece_at(mv.from)
                .map(|(p, _)| PIECE_VALUES[p as usize])
                .unwrap_or(0);
            score += CAPTURE_BASE + victim - attacker / 10;
        }

        if mv.is_castle() {
            score += CASTLE_SCORE;
        }

        if Self::gives_check(pos, mv) {
            score += CHECK_SCORE;
        }

        if let Some((piece, _)) = pos.piece_at(mv.from) {
            score += self.history[piece as usize][mv.to as usize];
        }

        score
    }

    fn gives_check(pos: &Position, mv: &Move) -> bool {
        let mut next = pos.clone();
        next.make_move(mv);
        next.is_check(next.side_to_move)
    }

    pub fn store_killer(&mut self, mv: Move, ply: usize) {
        if ply >= MAX_PLY || self.killers[ply][0] == Some(mv) {
            return;
        }
        self.killers[ply][1] = self.killers[ply][0];
        self.killers[ply][0] = Some(mv);
    }

    /// Rewards a quiet move that caused a beta cutoff. When any counter
    /// grows past the cap the whole table is halved, so old searches decay.
    pub fn bump_history(&mut self, pos: &Position, mv: &Move, depth: i32) {
        if let Some((piece, _)) = pos.piece_at(mv.from) {
            let counter = &mut self.history[piece as usize][mv.to as usize];
            *counter += depth * depth;
            if *counter > HISTORY_CAP {
                for row in self.history.iter_mut() {
                    for cell in row.iter_mut() {
                        *cell /= 2;
                    }
                }
            }
        }
    }

    /// Called at the start of every search: killers are stale across
    /// searches and go away, history keeps half its weight.
    pub fn new_search(&mut self) {
        self.killers = [[None; 2]; MAX_PLY];
        for row in self.history.iter_mut() {
            for cell in row.iter_mut() {
                *cell /= 2;
            }
        }
    }

    pub fn clear(&mut self) {
        self.killers = [[None; 2]; MAX_PLY];
        self.history = [[0; 64]; 7];
    }
}

impl Default for MoveOrdering {
    fn default() -> Self {
        Self::new()
    }
}
