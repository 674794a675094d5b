//! Engine error types

use chess_core::pgn::PgnError;
use chess_core::{NotationError, RulesError};
use thiserror::Error;

use crate::session::Status;

/// Failures that end the session in the `error` state.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PuzzleError {
    #[error("Puzzle has no id")]
    MissingId,

    #[error("Missing solution")]
    MissingSolution,

    #[error("Cannot derive position: no FEN and no move history with an initial ply")]
    MissingPosition,

    #[error("Cannot derive position: {0}")]
    Derivation(#[from] PgnError),

    #[error("Invalid final position: {0}")]
    InvalidPosition(#[from] RulesError),

    #[error("Invalid solution: {0}")]
    InvalidSolution(NotationError),

    #[error("Malformed solution entry {index}: {source}")]
    MalformedSolutionEntry { index: usize, source: NotationError },

    #[error("Puzzle source error: {0}")]
    Source(String),
}

/// Events the state machine refused. The previous state stays in effect.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("Session is {0}, not playing")]
    NotPlaying(Status),

    #[error("Session is {0}, not loading")]
    NotLoading(Status),

    #[error("Current attempt is empty")]
    EmptyAttempt,

    #[error("Illegal move '{0}'")]
    IllegalMove(String),
}

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
