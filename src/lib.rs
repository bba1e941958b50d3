//! A chess move-selection engine: iterative-deepening alpha-beta search
//! with a transposition table, heuristic move ordering, a phase-aware
//! evaluator, a binary opening book and a persistent store that learns
//! from finished games.

pub mod bitboard;
pub mod book;
pub mod errors;
pub mod eval;
pub mod learning;
pub mod movegen;
pub mod ordering;
pub mod position;
pub mod search;
pub mod tt;
pub mod zobrist;

pub use book::OpeningBook;
pub use errors::{BookLoadError, LearningLoadError, SearchError};
pub use eval::{Evaluator, GamePhase};
pub use learning::{GameOutcome, LearningStore};
pub use movegen::{Move, MoveGenerator};
pub use position::{Color, Piece, Position};
pub use search::{
    EngineConfig, MoveSource, SearchBudget, SearchEngine, SearchReport,
};
