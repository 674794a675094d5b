//! Chess primitives shared by the puzzle engine: an immutable board backed by
//! shakmaty, the move codec, and PGN movetext replay.

pub mod board;
pub mod notation;
pub mod pgn;

pub use board::{Board, PlayedMove, RulesError};
pub use notation::{Move, NotationError, PieceKind};
pub use shakmaty::{Color, Square};
