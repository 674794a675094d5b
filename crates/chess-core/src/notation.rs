//! Move codec: fixed coordinate notation ("e2e4", "e7e8q") and contextual
//! SAN resolved against a position.

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use shakmaty::uci::UciMove;
use shakmaty::{CastlingMode, Role, Square};

use crate::board::{Board, PlayedMove};

/// Trailing square of a SAN-ish token, ignoring promotion, check/mate and
/// annotation decorations.
static DESTINATION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"([a-h][1-8])(?:=?[QRBNqrbn])?[+#]?[!?]*$").expect("destination regex")
});

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NotationError {
    #[error("Malformed move notation '{0}'")]
    Malformed(String),

    #[error("Illegal or malformed move '{0}' for this position")]
    IllegalOrMalformed(String),
}

/// Pieces a pawn may promote to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PieceKind {
    Queen,
    Rook,
    Bishop,
    Knight,
}

impl PieceKind {
    pub fn from_char(c: char) -> Option<Self> {
        match c {
            'q' => Some(PieceKind::Queen),
            'r' => Some(PieceKind::Rook),
            'b' => Some(PieceKind::Bishop),
            'n' => Some(PieceKind::Knight),
            _ => None,
        }
    }

    pub fn char(self) -> char {
        match self {
            PieceKind::Queen => 'q',
            PieceKind::Rook => 'r',
            PieceKind::Bishop => 'b',
            PieceKind::Knight => 'n',
        }
    }

    pub fn role(self) -> Role {
        match self {
            PieceKind::Queen => Role::Queen,
            PieceKind::Rook => Role::Rook,
            PieceKind::Bishop => Role::Bishop,
            PieceKind::Knight => Role::Knight,
        }
    }

    pub fn from_role(role: Role) -> Option<Self> {
        match role {
            Role::Queen => Some(PieceKind::Queen),
            Role::Rook => Some(PieceKind::Rook),
            Role::Bishop => Some(PieceKind::Bishop),
            Role::Knight => Some(PieceKind::Knight),
            _ => None,
        }
    }
}

/// Position-independent move record. Equality is structural, and an absent
/// promotion never equals a present one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Move {
    pub from: Square,
    pub to: Square,
    pub promotion: Option<PieceKind>,
}

impl Move {
    pub fn new(from: Square, to: Square) -> Self {
        Self {
            from,
            to,
            promotion: None,
        }
    }

    /// Convert an engine move. Castling becomes the king's two-square move.
    pub(crate) fn from_engine(m: shakmaty::Move) -> Option<Self> {
        match m.to_uci(CastlingMode::Standard) {
            UciMove::Normal {
                from,
                to,
                promotion,
            } => Some(Self {
                from,
                to,
                promotion: promotion.and_then(PieceKind::from_role),
            }),
            _ => None,
        }
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.from, self.to)?;
        if let Some(kind) = self.promotion {
            write!(f, "{}", kind.char())?;
        }
        Ok(())
    }
}

impl FromStr for Move {
    type Err = NotationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_fixed(s)
    }
}

/// Decode fixed notation: two square labels and an optional lowercase
/// promotion letter, 4 or 5 characters in total.
pub fn parse_fixed(text: &str) -> Result<Move, NotationError> {
    let malformed = || NotationError::Malformed(text.to_string());

    if !text.is_ascii() || !(4..=5).contains(&text.len()) {
        return Err(malformed());
    }

    let from = text[0..2].parse::<Square>().map_err(|_| malformed())?;
    let to = text[2..4].parse::<Square>().map_err(|_| malformed())?;
    let promotion = match text[4..].chars().next() {
        Some(c) => Some(PieceKind::from_char(c).ok_or_else(malformed)?),
        None => None,
    };

    Ok(Move {
        from,
        to,
        promotion,
    })
}

/// Resolve SAN against `board`. Fails for anything the side to move cannot
/// legally play there.
pub fn parse_contextual(board: &Board, text: &str) -> Result<PlayedMove, NotationError> {
    board
        .play_san(text)
        .map(|(_, played)| played)
        .ok_or_else(|| NotationError::IllegalOrMalformed(text.to_string()))
}

/// Best-effort guess of the square a notation was aiming at. Heuristic only:
/// it says nothing about legality.
pub fn extract_intended_destination(text: &str) -> Option<Square> {
    let caps = DESTINATION_RE.captures(text.trim())?;
    caps.get(1)?.as_str().parse().ok()
}
