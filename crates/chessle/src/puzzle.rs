//! Puzzle data model: the untrusted payload from the daily puzzle source and
//! the normalized definition a session plays against.

use chess_core::{Board, Color};
use serde::Deserialize;

/// Raw puzzle-of-the-day document. Every field is optional here; the
/// normalizer decides what is missing beyond recovery.
///
/// Matches the Lichess daily puzzle shape, where `id` and `rating` live under
/// `puzzle`; top-level values are accepted too.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PuzzlePayload {
    pub id: Option<String>,
    pub rating: Option<u32>,
    #[serde(default)]
    pub game: GamePayload,
    #[serde(default)]
    pub puzzle: PuzzleInfo,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GamePayload {
    #[serde(alias = "position")]
    pub fen: Option<String>,
    #[serde(alias = "moveHistoryPgn")]
    pub pgn: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PuzzleInfo {
    pub id: Option<String>,
    pub rating: Option<u32>,
    pub initial_ply: Option<usize>,
    pub solution: Option<Vec<String>>,
    #[serde(default)]
    pub themes: Vec<String>,
}

impl PuzzlePayload {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn puzzle_id(&self) -> Option<&str> {
        self.puzzle
            .id
            .as_deref()
            .or(self.id.as_deref())
            .filter(|id| !id.trim().is_empty())
    }

    pub fn rating(&self) -> Option<u32> {
        self.puzzle.rating.or(self.rating)
    }
}

/// How the normalizer settled the side to move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnCorrection {
    /// The first solution move was legal as given.
    AsGiven,
    /// The side-to-move flag was flipped to make the first move legal.
    Flipped,
    /// The first move is illegal either way; the position was kept as given.
    Inconsistent,
}

/// A validated puzzle. Immutable for the lifetime of a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PuzzleDefinition {
    pub id: String,
    pub rating: Option<u32>,
    pub starting_position: Board,
    /// Fixed-notation moves; entries past the first are decoded while scoring.
    pub solution: Vec<String>,
    pub side_to_move: Color,
    pub themes: Vec<String>,
    pub turn_correction: TurnCorrection,
}

impl PuzzleDefinition {
    pub fn starting_fen(&self) -> String {
        self.starting_position.fen()
    }

    pub fn is_consistent(&self) -> bool {
        self.turn_correction != TurnCorrection::Inconsistent
    }
}
