//! Daily chess-line puzzle engine: puzzle normalization, move-by-move
//! attempt scoring, and the session state machine around them.

pub mod error;
pub mod normalizer;
pub mod persistence;
pub mod puzzle;
pub mod scorer;
pub mod session;

pub use error::{PuzzleError, SessionError, StoreError};
pub use puzzle::{PuzzleDefinition, PuzzlePayload, TurnCorrection};
pub use scorer::{Scorecard, Verdict};
pub use session::{AttemptRecord, Event, MoveInput, Session, SessionState, Status, MAX_ATTEMPTS};
