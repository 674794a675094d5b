//! Rules engine adapter. `Board` is an immutable position value: every move
//! application returns a new board, so positions never leak between
//! computations.

use shakmaty::fen::Fen;
use shakmaty::san::{San, SanPlus};
use shakmaty::uci::UciMove;
use shakmaty::{CastlingMode, Chess, Color, EnPassantMode, Position};

use crate::notation::Move;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RulesError {
    #[error("Invalid FEN '{fen}': {reason}")]
    InvalidFen { fen: String, reason: String },

    #[error("Illegal position '{fen}': {reason}")]
    IllegalPosition { fen: String, reason: String },
}

/// A move as the engine accepted it: fixed notation plus canonical SAN.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayedMove {
    pub mv: Move,
    /// SAN including the `+`/`#` suffix, e.g. "Ra8#".
    pub san: String,
}

#[derive(Debug, Clone, Default)]
pub struct Board {
    pos: Chess,
}

impl Board {
    /// The standard starting position.
    pub fn start() -> Self {
        Self::default()
    }

    /// Parse and validate a FEN string.
    pub fn from_fen(fen: &str) -> Result<Self, RulesError> {
        let fen = fen.trim();
        let parsed = fen.parse::<Fen>().map_err(|e| RulesError::InvalidFen {
            fen: fen.to_string(),
            reason: e.to_string(),
        })?;
        let pos = parsed
            .into_position::<Chess>(CastlingMode::Standard)
            .map_err(|e| RulesError::IllegalPosition {
                fen: fen.to_string(),
                reason: e.to_string(),
            })?;
        Ok(Self { pos })
    }

    /// Canonical FEN of this position.
    pub fn fen(&self) -> String {
        Fen::from_position(&self.pos, EnPassantMode::Legal).to_string()
    }

    pub fn turn(&self) -> Color {
        self.pos.turn()
    }

    pub fn is_checkmate(&self) -> bool {
        self.pos.is_checkmate()
    }

    /// Play a move given by coordinates. Returns `None` if it is not legal
    /// for the side to move.
    pub fn play(&self, mv: &Move) -> Option<(Board, PlayedMove)> {
        let uci = UciMove::Normal {
            from: mv.from,
            to: mv.to,
            promotion: mv.promotion.map(|kind| kind.role()),
        };
        let legal = uci.to_move(&self.pos).ok()?;
        self.advance(legal)
    }

    /// Play a move given in SAN (an optional `+`/`#` suffix is accepted).
    /// Only legal moves of the side to move resolve.
    pub fn play_san(&self, text: &str) -> Option<(Board, PlayedMove)> {
        let san_plus = text.trim().parse::<SanPlus>().ok()?;
        let legal = san_plus.san.to_move(&self.pos).ok()?;
        self.advance(legal)
    }

    fn advance(&self, legal: shakmaty::Move) -> Option<(Board, PlayedMove)> {
        let mv = Move::from_engine(legal)?;
        let san = San::from_move(&self.pos, legal).to_string();

        let mut next = self.pos.clone();
        next.play_unchecked(legal);

        let suffix = if next.is_checkmate() {
            "#"
        } else if next.is_check() {
            "+"
        } else {
            ""
        };

        Some((
            Board { pos: next },
            PlayedMove {
                mv,
                san: format!("{san}{suffix}"),
            },
        ))
    }
}

impl PartialEq for Board {
    fn eq(&self, other: &Self) -> bool {
        self.fen() == other.fen()
    }
}

impl Eq for Board {}

/// Flip the side-to-move field of a FEN string. An en passant square is
/// cleared since it cannot be valid for the other side.
pub fn flip_side_to_move(fen: &str) -> Option<String> {
    let mut fields: Vec<&str> = fen.split_whitespace().collect();
    if fields.len() < 2 {
        return None;
    }

    fields[1] = match fields[1] {
        "w" => "b",
        "b" => "w",
        _ => return None,
    };
    if fields.len() > 3 {
        fields[3] = "-";
    }

    Some(fields.join(" "))
}
