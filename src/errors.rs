use thiserror::Error;

/// Failures of a single `choose_move` call.
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("no legal move in position {0}")]
    NoLegalMove(String),
    #[error("budget too small: not even a depth-1 search finished")]
    BudgetTooSmall,
}

#[derive(Debug, Error)]
pub enum BookLoadError {
    #[error("failed to open book file: {0}")]
    Io(#[from] std::io::Error),
    #[error("book file length {0} is not a multiple of the 16-byte record size")]
    InvalidLength(u64),
    #[error("book file is empty")]
    Empty,
}

#[derive(Debug, Error)]
pub enum LearningLoadError {
    #[error("failed to read learning file: {0}")]
    Io(#[from] std::io::Error),
    #[error("learning file is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),
}
