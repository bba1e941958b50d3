use crate::book::OpeningBook;
use crate::errors::{BookLoadError, SearchError};
use crate::eval::Evaluator;
use crate::learning::{GameOutcome, LearningStore};
use crate::movegen::{Move, MoveGenerator};
use crate::ordering::{MoveOrdering, MAX_PLY};
use crate::position::{Position, PIECE_VALUES};
use crate::tt::{Bound, TranspositionTable};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::HashSet;
use std::path::Path;
use std::time::{Duration, Instant};

pub const INFINITY: i32 = 999_999;
pub const MATE_SCORE: i32 = 900_000;
/// Scores beyond this are mate scores and carry a ply distance.
pub const MATE_BOUND: i32 = MATE_SCORE - MAX_PLY as i32;

const ASPIRATION_WINDOW: i32 = 50;
const NULL_MOVE_REDUCTION: i32 = 2;
const LMR_MIN_DEPTH: i32 = 3;
const LMR_MIN_INDEX: usize = 4;
const MAX_QUIESCENCE_PLY: u32 = 8;
const DELTA_MARGIN: i32 = 200;
// Indexed by remaining depth.
const FUTILITY_MARGINS: [i32; 3] = [0, 300, 500];
const TIME_CHECK_MASK: u64 = 1023;

/// Engine behavior switches. Per-call limits live in `SearchBudget`.
#[derive(Clone, Copy, Debug)]
pub struct EngineConfig {
    pub use_learning_bias: bool,
    pub use_opening_book: bool,
    pub random_variety: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            use_learning_bias: true,
            use_opening_book: true,
            random_variety: true,
        }
    }
}

/// Limits for one `choose_move` call.
#[derive(Clone, Copy, Debug)]
pub struct SearchBudget {
    pub max_depth: i32,
    pub time_limit: Duration,
}

impl SearchBudget {
    pub fn new(max_depth: i32, time_limit: Duration) -> Self {
        SearchBudget { max_depth, time_limit }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MoveSource {
    Book,
    Search,
}

/// The outcome of a `choose_move` call. `cancelled` means the clock ran
/// out mid-iteration and the result comes from the last finished depth.
#[derive(Clone, Debug)]
pub struct SearchReport {
    pub best_move: Move,
    pub score: i32,
    pub depth: i32,
    pub nodes: u64,
    pub pv: Vec<Move>,
    pub source: MoveSource,
    pub cancelled: bool,
}

impl SearchReport {
    pub fn explanation(&self) -> String {
        if self.source == MoveSource::Book {
            return format!("book move {}", self.best_move.to_uci());
        }

        let score = if self.score.abs() > MATE_BOUND {
            let plies = MATE_SCORE - self.score.abs();
            let moves = (plies + 1) / 2;
            if self.score > 0 {
                format!("mate in {moves}")
            } else {
                format!("mated in {moves}")
            }
        } else {
            format!("cp {}", self.score)
        };

        let pv: Vec<String> = self.pv.iter().map(|m| m.to_uci()).collect();
        format!(
            "depth {} score {} nodes {} pv {}",
            self.depth,
            score,
            self.nodes,
            pv.join(" ")
        )
    }
}

/// Iterative-deepening alpha-beta searcher with its own transposition
/// table, ordering heuristics, opening book and learning store. All state
/// lives here; two engines never share anything.
pub struct SearchEngine {
    pub config: EngineConfig,
    tt: TranspositionTable,
    ordering: MoveOrdering,
    book: Option<OpeningBook>,
    learning: LearningStore,
    rng: StdRng,
    nodes: u64,
    deadline: Instant,
}

impl SearchEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self::with_seed(config, rand::random())
    }

    /// Deterministic construction for tests and reproducible matches.
    pub fn with_seed(config: EngineConfig, seed: u64) -> Self {
        SearchEngine {
            config,
            tt: TranspositionTable::new(),
            ordering: MoveOrdering::new(),
            book: None,
            learning: LearningStore::new(),
            rng: StdRng::seed_from_u64(seed),
            nodes: 0,
            deadline: Instant::now(),
        }
    }

    pub fn load_book<P: AsRef<Path>>(&mut self, path: P) -> Result<(), BookLoadError> {
        self.book = Some(OpeningBook::load(path)?);
        Ok(())
    }

    pub fn attach_learning(&mut self, store: LearningStore) {
        self.learning = store;
    }

    pub fn learning(&self) -> &LearningStore {
        &self.learning
    }

    /// Grades the moves chosen so far against the game result.
    pub fn finalize_game(&self, outcome: GameOutcome) -> std::io::Result<()> {
        self.learning.finalize_game(outcome)
    }

    /// Picks a move for the side to move, from the book when possible and
    /// otherwise by iterative-deepening search within the budget.
    pub fn choose_move(
        &mut self,
        pos: &Position,
        budget: SearchBudget,
    ) -> Result<SearchReport, SearchError> {
        let legal = MoveGenerator::legal_moves(pos);
        if legal.is_empty() {
            return Err(SearchError::NoLegalMove(pos.to_fen()));
        }
        if budget.max_depth < 1 {
            return Err(SearchError::BudgetTooSmall);
        }

        if self.config.use_opening_book {
            if let Some(book) = &self.book {
                if let Some(mv) = book.lookup(pos, &mut self.rng, self.config.random_variety) {
                    log::info!("book move {}", mv.to_uci());
                    let report = SearchReport {
                        best_move: mv,
                        score: 0,
                        depth: 0,
                        nodes: 0,
                        pv: vec![mv],
                        source: MoveSource::Book,
                        cancelled: false,
                    };
                    self.remember_choice(pos, &report.best_move);
                    return Ok(report);
                }
            }
        }

        self.nodes = 0;
        self.deadline = Instant::now() + budget.time_limit;
        self.ordering.new_search();

        let mut best: Option<(Move, i32)> = None;
        let mut completed_depth = 0;
        let mut cancelled = false;

        for depth in 1..=budget.max_depth {
            let result = match best {
                // Aspiration window around the previous iteration's score.
                Some((_, prev)) => {
                    let alpha = prev - ASPIRATION_WINDOW;
                    let beta = prev + ASPIRATION_WINDOW;
                    match self.search_root(pos, depth, alpha, beta) {
                        Some((_, score)) if score <= alpha || score >= beta => {
                            log::debug!("aspiration miss at depth {depth} (score {score})");
                            self.search_root(pos, depth, -INFINITY, INFINITY)
                        }
                        other => other,
                    }
                }
                None => self.search_root(pos, depth, -INFINITY, INFINITY),
            };

            match result {
                Some((mv, score)) => {
                    best = Some((mv, score));
                    completed_depth = depth;
                    log::info!(
                        "depth {depth} score {score} best {} nodes {}",
                        mv.to_uci(),
                        self.nodes
                    );
                    if score.abs() > MATE_BOUND {
                        break;
                    }
                }
                None => {
                    cancelled = true;
                    break;
                }
            }
        }

        let (best_move, score) = match best {
            Some(found) => found,
            // Not even depth 1 finished inside the clock.
            None => return Err(SearchError::BudgetTooSmall),
        };

        let report = SearchReport {
            best_move,
            score,
            depth: completed_depth,
            nodes: self.nodes,
            pv: self.extract_pv(pos, completed_depth),
            source: MoveSource::Search,
            cancelled,
        };
        self.remember_choice(pos, &best_move);
        Ok(report)
    }

    fn remember_choice(&self, pos: &Position, mv: &Move) {
        if self.config.use_learning_bias {
            self.learning.record_choice(pos, &mv.to_uci());
        }
    }

    fn search_root(
        &mut self,
        pos: &Position,
        depth: i32,
        mut alpha: i32,
        beta: i32,
    ) -> Option<(Move, i32)> {
        let tt_move = self.tt.probe(pos.hash).and_then(|e| e.best_move);
        let mut moves = MoveGenerator::legal_moves(pos);
        if self.config.use_learning_bias {
            let learning = &self.learning;
            self.ordering
                .order_moves(pos, &mut moves, tt_move, 0, |mv| {
                    learning.ordering_bonus(pos, &mv.to_uci())
                });
        } else {
            self.ordering.order_moves(pos, &mut moves, tt_move, 0, |_| 0);
        }

        let mut best: Option<(Move, i32)> = None;
        for (idx, mv) in moves.iter().enumerate() {
            let mut next = pos.clone();
            next.make_move(mv);

            let score = if idx == 0 {
                -self.negamax(&next, depth - 1, -beta, -alpha, 1, true)?
            } else {
                // Null-window probe first; widen only on improvement.
                let probe = -self.negamax(&next, depth - 1, -alpha - 1, -alpha, 1, true)?;
                if probe > alpha && probe < beta {
                    -self.negamax(&next, depth - 1, -beta, -alpha, 1, true)?
                } else {
                    probe
                }
            };

            if best.map_or(true, |(_, s)| score > s) {
                best = Some((*mv, score));
            }
            if score > alpha {
                alpha = score;
            }
            if alpha >= beta {
                break;
            }
        }

        if let Some((mv, score)) = best {
            self.tt
                .store(pos.hash, depth, score, Bound::Exact, Some(mv));
        }
        best
    }

    /// Principal-variation negamax. Returns `None` when the clock expires;
    /// the caller discards the whole iteration in that case.
    fn negamax(
        &mut self,
        pos: &Position,
        depth: i32,
        mut alpha: i32,
        mut beta: i32,
        ply: usize,
        allow_null: bool,
    ) -> Option<i32> {
        if self.nodes & TIME_CHECK_MASK == 0 && Instant::now() >= self.deadline {
            return None;
        }
        self.nodes += 1;

        if pos.is_draw() {
            return Some(0);
        }
        if ply >= MAX_PLY {
            return Some(Evaluator::evaluate(pos));
        }

        let mut tt_move = None;
        if let Some(entry) = self.tt.probe(pos.hash) {
            tt_move = entry.best_move;
            if entry.depth >= depth {
                let score = score_from_tt(entry.score, ply);
                match entry.bound {
                    Bound::Exact => return Some(score),
                    Bound::Lower => alpha = alpha.max(score),
                    Bound::Upper => beta = beta.min(score),
                }
                if alpha >= beta {
                    return Some(score);
                }
            }
        }

        if depth <= 0 {
            return Some(self.quiescence(pos, alpha, beta, 0));
        }

        let side = pos.side_to_move;
        let in_check = pos.is_check(side);

        if allow_null
            && depth >= 3
            && !in_check
            && pos.has_nonpawn_material(side)
        {
            let mut null_pos = pos.clone();
            null_pos.make_null_move();
            let score = -self.negamax(
                &null_pos,
                depth - 1 - NULL_MOVE_REDUCTION,
                -beta,
                -beta + 1,
                ply + 1,
                false,
            )?;
            if score >= beta {
                // Never let a null-move verification claim a mate.
                return Some(beta.min(MATE_BOUND));
            }
        }

        let mut moves = MoveGenerator::legal_moves(pos);
        if moves.is_empty() {
            return Some(if in_check { -(MATE_SCORE - ply as i32) } else { 0 });
        }

        self.ordering.order_moves(pos, &mut moves, tt_move, ply, |_| 0);

        let futility_eval = if depth <= 2 && !in_check {
            Some(Evaluator::evaluate(pos))
        } else {
            None
        };

        let alpha_start = alpha;
        let mut best_score = -INFINITY;
        let mut best_move = None;
        let mut searched = 0usize;

        for (idx, mv) in moves.iter().enumerate() {
            let quiet = !mv.is_capture() && !mv.is_promotion();

            let mut next = pos.clone();
            next.make_move(mv);
            let gives_check = next.is_check(next.side_to_move);

            if let Some(static_eval) = futility_eval {
                if quiet
                    && !gives_check
                    && searched > 0
                    && static_eval + FUTILITY_MARGINS[depth as usize] <= alpha
                {
                    continue;
                }
            }

            let score = if searched == 0 {
                -self.negamax(&next, depth - 1, -beta, -alpha, ply + 1, true)?
            } else {
                // Late quiet moves get a reduced null-window look first.
                let reduced = if idx >= LMR_MIN_INDEX
                    && depth >= LMR_MIN_DEPTH
                    && quiet
                    && !in_check
                    && !gives_check
                {
                    1
                } else {
                    0
                };

                let mut score =
                    -self.negamax(&next, depth - 1 - reduced, -alpha - 1, -alpha, ply + 1, true)?;
                if reduced > 0 && score > alpha {
                    score = -self.negamax(&next, depth - 1, -alpha - 1, -alpha, ply + 1, true)?;
                }
                if score > alpha && score < beta {
                    score = -self.negamax(&next, depth - 1, -beta, -alpha, ply + 1, true)?;
                }
                score
            };
            searched += 1;

            if score > best_score {
                best_score = score;
                best_move = Some(*mv);
            }
            if score > alpha {
                alpha = score;
            }
            if alpha >= beta {
                if quiet {
                    self.ordering.store_killer(*mv, ply);
                    self.ordering.bump_history(pos, mv, depth);
                }
                self.tt.store(
                    pos.hash,
                    depth,
                    score_to_tt(best_score, ply),
                    Bound::Lower,
                    best_move,
                );
                return Some(best_score);
            }
        }

        if searched == 0 {
            // Everything was futility-pruned; report the bound we proved.
            return Some(alpha);
        }

        let bound = if best_score > alpha_start { Bound::Exact } else { Bound::Upper };
        self.tt
            .store(pos.hash, depth, score_to_tt(best_score, ply), bound, best_move);
        Some(best_score)
    }

    /// Captures-only search to settle tactically noisy leaves. Runs to a
    /// fixed extra depth and is never interrupted by the clock.
    fn quiescence(&mut self, pos: &Position, mut alpha: i32, beta: i32, qply: u32) -> i32 {
        self.nodes += 1;

        let stand_pat = Evaluator::evaluate(pos);
        if stand_pat >= beta {
            return beta;
        }
        if qply >= MAX_QUIESCENCE_PLY {
            return stand_pat;
        }
        // Even winning a queen cannot raise alpha: give up on this branch.
        if stand_pat + PIECE_VALUES[5] + DELTA_MARGIN < alpha {
            return stand_pat;
        }
        if stand_pat > alpha {
            alpha = stand_pat;
        }

        let mut captures = MoveGenerator::captures(pos);
        self.ordering
            .order_moves(pos, &mut captures, None, MAX_PLY - 1, |_| 0);

        for mv in captures {
            let victim = pos
                .piece_at(mv.to)
                .map(|(p, _)| PIECE_VALUES[p as usize])
                .unwrap_or(PIECE_VALUES[1]);
            if stand_pat + victim + DELTA_MARGIN <= alpha {
                continue;
            }

            let mut next = pos.clone();
            next.make_move(&mv);
            let score = -self.quiescence(&next, -beta, -alpha, qply + 1);

            if score >= beta {
                return beta;
            }
            if score > alpha {
                alpha = score;
            }
        }

        alpha
    }

    /// Walks transposition-table best moves to recover the line behind the
    /// root score. A seen-hash set guards against TT cycles.
    fn extract_pv(&self, pos: &Position, depth: i32) -> Vec<Move> {
        let mut pv = Vec::new();
        let mut current = pos.clone();
        let mut seen = HashSet::new();

        for _ in 0..depth {
            if !seen.insert(current.hash) {
                break;
            }
            let mv = match self.tt.probe(current.hash).and_then(|e| e.best_move) {
                Some(mv) => mv,
                None => break,
            };
            if !MoveGenerator::legal_moves(&current).contains(&mv) {
                break;
            }
            pv.push(mv);
            current.make_move(&mv);
        }

        pv
    }
}

fn score_to_tt(score: i32, ply: usize) -> i32 {
    if score > MATE_BOUND {
        score + ply as i32
    } else if score < -MATE_BOUND {
        score - ply as i32
    } else {
        score
    }
}

fn score_from_tt(score: i32, ply: usize) -> i32 {
    if score > MATE_BOUND {
        score - ply as i32
    } else if score < -MATE_BOUND {
        score + ply as i32
    } else {
        score
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::position::Color;

    /// Plain full-width negamax over the same evaluator, used to confirm
    /// that pruning never changes forced results.
    fn reference_negamax(pos: &Position, depth: i32, mut alpha: i32, beta: i32, ply: i32) -> i32 {
        if pos.is_draw() {
            return 0;
        }
        let moves = MoveGenerator::legal_moves(pos);
        if moves.is_empty() {
            return if pos.is_check(pos.side_to_move) {
                -(MATE_SCORE - ply)
            } else {
                0
            };
        }
        if depth == 0 {
            return Evaluator::evaluate(pos);
        }

        let mut best = -INFINITY;
        for mv in moves {
            let mut next = pos.clone();
            next.make_move(&mv);
            let score = -reference_negamax(&next, depth - 1, -beta, -alpha, ply + 1);
            best = best.max(score);
            alpha = alpha.max(score);
            if alpha >= beta {
                break;
            }
        }
        best
    }

    fn quiet_engine() -> SearchEngine {
        let config = EngineConfig {
            use_learning_bias: false,
            use_opening_book: false,
            random_variety: false,
        };
        SearchEngine::with_seed(config, 1)
    }

    fn budget(depth: i32) -> SearchBudget {
        SearchBudget::new(depth, Duration::from_secs(60))
    }

    #[test]
    fn test_depth_one_start_position() {
        let mut engine = quiet_engine();
        let pos = Position::default();
        let report = engine.choose_move(&pos, budget(1)).unwrap();
        assert_eq!(report.depth, 1);
        assert_eq!(report.source, MoveSource::Search);
        assert!(!report.cancelled);
        assert!(report.score.abs() < 200, "start position is near equal");
    }

    #[test]
    fn test_finds_mate_in_one() {
        // Back-rank mate with Ra8.
        let pos = Position::from_fen("6k1/5ppp/8/8/8/8/8/R3K3 w - - 0 1").unwrap();
        let mut engine = quiet_engine();
        let report = engine.choose_move(&pos, budget(3)).unwrap();
        assert_eq!(report.best_move.to_uci(), "a1a8");
        assert!(report.score > MATE_BOUND);
        assert!(report.explanation().contains("mate in 1"));
    }

    #[test]
    fn test_avoids_mate_when_possible() {
        // Black must block or run from the back-rank threat.
        let pos = Position::from_fen("6k1/5ppp/8/8/8/8/8/R3K3 b - - 0 1").unwrap();
        let mut engine = quiet_engine();
        let report = engine.choose_move(&pos, budget(3)).unwrap();
        let mut next = pos.clone();
        next.make_move(&report.best_move);
        let mut reply_engine = quiet_engine();
        let reply = reply_engine.choose_move(&next, budget(3)).unwrap();
        assert!(reply.score < MATE_BOUND, "black should have escaped mate in one");
    }

    #[test]
    fn test_takes_hanging_queen() {
        // The queen on d5 is undefended and attacked by the c3 knight.
        let pos =
            Position::from_fen("rnb1kbnr/pppp1ppp/8/3q4/8/2N5/PPPPPPPP/R1BQKBNR w KQkq - 0 3")
                .unwrap();
        let mut engine = quiet_engine();
        let report = engine.choose_move(&pos, budget(4)).unwrap();
        assert_eq!(report.best_move.to_uci(), "c3d5");
        assert!(report.score > 300);
    }

    #[test]
    fn test_pruned_search_matches_reference_on_forced_mates() {
        // Mate in one and a two-rook ladder mate in two. Mate distances
        // are immune to reductions, so the scores must agree exactly.
        for fen in [
            "6k1/5ppp/8/8/8/8/8/R3K3 w - - 0 1",
            "7k/8/8/8/8/8/R7/1R2K3 w - - 0 1",
        ] {
            let pos = Position::from_fen(fen).unwrap();
            let reference = reference_negamax(&pos, 3, -INFINITY, INFINITY, 0);
            let mut engine = quiet_engine();
            let report = engine.choose_move(&pos, budget(3)).unwrap();
            assert_eq!(report.score, reference, "diverged on {fen}");
        }
    }

    #[test]
    fn test_no_legal_move_is_an_error() {
        let mate = Position::from_fen(
            "r1bqkb1r/pppp1Qpp/2n2n2/4p3/2B1P3/8/PPPP1PPP/RNB1K1NR b KQkq - 0 4",
        )
        .unwrap();
        let mut engine = quiet_engine();
        assert!(matches!(
            engine.choose_move(&mate, budget(3)),
            Err(SearchError::NoLegalMove(_))
        ));
    }

    #[test]
    fn test_zero_budget_is_an_error() {
        let mut engine = quiet_engine();
        let pos = Position::default();
        assert!(matches!(
            engine.choose_move(&pos, SearchBudget::new(0, Duration::from_secs(1))),
            Err(SearchError::BudgetTooSmall)
        ));
        assert!(matches!(
            engine.choose_move(&pos, SearchBudget::new(5, Duration::ZERO)),
            Err(SearchError::BudgetTooSmall)
        ));
    }

    #[test]
    fn test_time_limit_cancels_cleanly() {
        let pos = Position::from_fen(
            "r1bqk2r/pppp1ppp/2n2n2/2b1p3/2B1P3/2N2N2/PPPP1PPP/R1BQK2R w KQkq - 6 12",
        )
        .unwrap();
        let mut engine = quiet_engine();
        let report = engine
            .choose_move(&pos, SearchBudget::new(64, Duration::from_millis(200)))
            .unwrap();
        assert!(report.cancelled);
        assert!(report.depth >= 1);
        assert!(report.depth < 64);
    }

    #[test]
    fn test_same_seed_same_result() {
        let pos = Position::from_fen(
            "r1bqk2r/pppp1ppp/2n2n2/2b1p3/2B1P3/2N2N2/PPPP1PPP/R1BQK2R w KQkq - 6 12",
        )
        .unwrap();
        let a = quiet_engine().choose_move(&pos, budget(3)).unwrap();
        let b = quiet_engine().choose_move(&pos, budget(3)).unwrap();
        assert_eq!(a.best_move, b.best_move);
        assert_eq!(a.score, b.score);
    }

    #[test]
    fn test_tt_holds_root_best_move() {
        let pos = Position::default();
        let mut engine = quiet_engine();
        let report = engine.choose_move(&pos, budget(3)).unwrap();
        let entry = engine.tt.probe(pos.hash).unwrap();
        assert_eq!(entry.best_move, Some(report.best_move));
        assert!(!report.pv.is_empty());
        assert_eq!(report.pv[0], report.best_move);
    }

    #[test]
    fn test_quiescence_delta_gives_up_hopeless_branches() {
        // Black is a rook and queen down; with alpha far above anything a
        // capture could recover, quiescence returns the stand-pat score.
        let pos = Position::from_fen("4k3/8/8/3p4/2N5/8/8/QR2K3 b - - 0 1").unwrap();
        let mut engine = quiet_engine();
        let stand_pat = Evaluator::evaluate(&pos);
        let result = engine.quiescence(&pos, stand_pat + 2000, stand_pat + 2001, 0);
        assert_eq!(result, stand_pat);
    }

    #[test]
    fn test_mate_score_ply_adjustment() {
        assert_eq!(score_from_tt(score_to_tt(MATE_SCORE - 3, 5), 5), MATE_SCORE - 3);
        assert_eq!(score_from_tt(score_to_tt(-(MATE_SCORE - 3), 5), 5), -(MATE_SCORE - 3));
        assert_eq!(score_to_tt(123, 9), 123);
    }

    #[test]
    fn test_learning_bias_round_trip() {
        let config = EngineConfig {
            use_learning_bias: true,
            use_opening_book: false,
            random_variety: false,
        };
        let mut engine = SearchEngine::with_seed(config, 1);
        let pos = Position::default();
        let report = engine.choose_move(&pos, budget(2)).unwrap();
        engine.finalize_game(GameOutcome::WhiteWin).unwrap();
        assert_eq!(
            engine
                .learning()
                .ordering_bonus(&pos, &report.best_move.to_uci()),
            100
        );
    }

    #[test]
    fn test_book_move_short_circuits_search() {
        use byteorder::{BigEndian, WriteBytesExt};
        use std::io::Write;

        let pos = Position::default();
        let mut file = tempfile::NamedTempFile::new().unwrap();
        // e2e4 as the only entry for the start position.
        file.write_u64::<BigEndian>(pos.hash).unwrap();
        file.write_u16::<BigEndian>((12u16 << 6) | 28).unwrap();
        file.write_u16::<BigEndian>(50).unwrap();
        file.write_u32::<BigEndian>(0).unwrap();
        file.flush().unwrap();

        let config = EngineConfig {
            use_learning_bias: false,
            use_opening_book: true,
            random_variety: false,
        };
        let mut engine = SearchEngine::with_seed(config, 1);
        engine.load_book(file.path()).unwrap();

        let report = engine.choose_move(&pos, budget(3)).unwrap();
        assert_eq!(report.source, MoveSource::Book);
        assert_eq!(report.best_move.to_uci(), "e2e4");
        assert_eq!(report.nodes, 0);
        assert_eq!(report.explanation(), "book move e2e4");
    }

    #[test]
    fn test_stalemate_scores_zero_not_mate() {
        // White to move can stalemate black; the search must see the draw.
        let pos = Position::from_fen("7k/8/6Q1/8/8/8/8/6K1 w - - 0 1").unwrap();
        let mut engine = quiet_engine();
        let report = engine.choose_move(&pos, budget(4)).unwrap();
        let mut next = pos.clone();
        next.make_move(&report.best_move);
        assert!(!next.is_stalemate(), "engine should avoid stalemating");
        assert_eq!(next.side_to_move, Color::Black);
    }
}
