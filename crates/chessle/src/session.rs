//! Session state machine.
//!
//! `SessionState::apply` is a pure `(state, event) -> state` transition. A
//! refused event returns an error and the caller keeps the old state.
//! `Session` owns the current state and persists a snapshot after every
//! accepted transition.

use std::fmt;
use std::mem;

use chess_core::{Board, Move};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::error::{PuzzleError, SessionError};
use crate::normalizer::normalize;
use crate::persistence::{self, Snapshot, SnapshotStore};
use crate::puzzle::{PuzzleDefinition, PuzzlePayload};
use crate::scorer::{score_attempt, Verdict};

/// Submissions allowed per puzzle.
pub const MAX_ATTEMPTS: u32 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Loading,
    Playing,
    Won,
    Lost,
    Error,
}

impl Status {
    pub fn as_str(self) -> &'static str {
        match self {
            Status::Loading => "loading",
            Status::Playing => "playing",
            Status::Won => "won",
            Status::Lost => "lost",
            Status::Error => "error",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Status::Won | Status::Lost | Status::Error)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One submitted attempt and its feedback.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttemptRecord {
    pub sequence: Vec<String>,
    pub feedback: Vec<Verdict>,
}

impl AttemptRecord {
    pub fn is_solved(&self) -> bool {
        !self.feedback.is_empty() && self.feedback.iter().all(|v| *v == Verdict::Correct)
    }
}

/// A move made on the board during play.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MoveInput {
    /// SAN typed by the player.
    Notation(String),
    /// From/to squares from a drag and drop.
    Coords(Move),
}

#[derive(Debug, Clone)]
pub enum Event {
    PuzzleLoaded {
        puzzle: PuzzleDefinition,
        snapshot: Option<Snapshot>,
    },
    LoadFailed(String),
    RecordMove(MoveInput),
    ResetInput,
    Submit,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionState {
    puzzle: Option<PuzzleDefinition>,
    displayed: Board,
    current_input: Vec<String>,
    history: Vec<AttemptRecord>,
    attempt_number: u32,
    status: Status,
    error: Option<String>,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            puzzle: None,
            displayed: Board::start(),
            current_input: Vec::new(),
            history: Vec::new(),
            attempt_number: 1,
            status: Status::Loading,
            error: None,
        }
    }
}

impl SessionState {
    pub fn puzzle(&self) -> Option<&PuzzleDefinition> {
        self.puzzle.as_ref()
    }

    pub fn displayed(&self) -> &Board {
        &self.displayed
    }

    pub fn current_input(&self) -> &[String] {
        &self.current_input
    }

    pub fn history(&self) -> &[AttemptRecord] {
        &self.history
    }

    pub fn attempt_number(&self) -> u32 {
        self.attempt_number
    }

    pub fn status(&self) -> Status {
        self.status
    }

    /// Human-readable reason for the `error` status.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn attempts_remaining(&self) -> u32 {
        match self.status {
            Status::Playing => MAX_ATTEMPTS + 1 - self.attempt_number,
            _ => 0,
        }
    }

    /// Apply one event, producing the next state.
    pub fn apply(&self, event: Event) -> Result<SessionState, SessionError> {
        match event {
            Event::PuzzleLoaded { puzzle, snapshot } => self.load(puzzle, snapshot),
            Event::LoadFailed(message) => self.fail(message),
            Event::RecordMove(input) => self.record_move(input),
            Event::ResetInput => self.reset_input(),
            Event::Submit => self.submit(),
        }
    }

    fn require_playing(&self) -> Result<&PuzzleDefinition, SessionError> {
        match (&self.puzzle, self.status) {
            (Some(puzzle), Status::Playing) => Ok(puzzle),
            _ => Err(SessionError::NotPlaying(self.status)),
        }
    }

    fn load(&self, puzzle: PuzzleDefinition, snapshot: Option<Snapshot>) -> Result<Self, SessionError> {
        if self.status != Status::Loading {
            return Err(SessionError::NotLoading(self.status));
        }

        let mut next = SessionState {
            displayed: puzzle.starting_position.clone(),
            status: Status::Playing,
            ..SessionState::default()
        };

        // Restored sessions always show the puzzle start, never a half-played attempt.
        if let Some(snapshot) = snapshot {
            info!(
                puzzle_id = %puzzle.id,
                attempts = snapshot.history.len(),
                status = %snapshot.status,
                "Restored session"
            );
            next.history = snapshot.history;
            next.attempt_number = snapshot.attempt_number;
            next.status = snapshot.status;
        }

        next.puzzle = Some(puzzle);
        Ok(next)
    }

    fn fail(&self, message: String) -> Result<Self, SessionError> {
        if self.status != Status::Loading {
            return Err(SessionError::NotLoading(self.status));
        }
        error!(%message, "Puzzle could not be loaded");
        Ok(self.clone().into_error(message))
    }

    fn record_move(&self, input: MoveInput) -> Result<Self, SessionError> {
        self.require_playing()?;

        let resolved = match &input {
            MoveInput::Notation(text) => self.displayed.play_san(text),
            MoveInput::Coords(mv) => self.displayed.play(mv),
        };
        let Some((board, played)) = resolved else {
            let label = match input {
                MoveInput::Notation(text) => text,
                MoveInput::Coords(mv) => mv.to_string(),
            };
            debug!(%label, "Rejected illegal move");
            return Err(SessionError::IllegalMove(label));
        };

        let mut next = self.clone();
        next.current_input.push(played.san);
        next.displayed = board;
        Ok(next)
    }

    fn reset_input(&self) -> Result<Self, SessionError> {
        let puzzle = self.require_playing()?;

        let mut next = self.clone();
        next.current_input.clear();
        next.displayed = puzzle.starting_position.clone();
        Ok(next)
    }

    fn submit(&self) -> Result<Self, SessionError> {
        let puzzle = self.require_playing()?;
        if self.current_input.is_empty() {
            return Err(SessionError::EmptyAttempt);
        }

        let card = match score_attempt(&puzzle.starting_position, &puzzle.solution, &self.current_input) {
            Ok(card) => card,
            Err(err) => {
                error!(puzzle_id = %puzzle.id, error = %err, "Scoring failed");
                return Ok(self.clone().into_error(err.to_string()));
            }
        };

        let mut next = self.clone();
        next.history.push(AttemptRecord {
            sequence: mem::take(&mut next.current_input),
            feedback: card.verdicts,
        });
        next.displayed = puzzle.starting_position.clone();

        if card.solved {
            next.status = Status::Won;
        } else if next.attempt_number >= MAX_ATTEMPTS {
            next.status = Status::Lost;
        } else {
            next.attempt_number += 1;
        }

        info!(
            puzzle_id = %puzzle.id,
            attempt = self.attempt_number,
            solved = card.solved,
            status = %next.status,
            "Attempt submitted"
        );
        Ok(next)
    }

    fn into_error(mut self, message: String) -> Self {
        self.status = Status::Error;
        self.error = Some(message);
        self
    }
}

/// Owns one session and its snapshot store.
pub struct Session<S: SnapshotStore> {
    state: SessionState,
    store: S,
    key_prefix: String,
}

impl<S: SnapshotStore> Session<S> {
    pub fn new(store: S, key_prefix: impl Into<String>) -> Self {
        Self {
            state: SessionState::default(),
            store,
            key_prefix: key_prefix.into(),
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Start over with a freshly fetched payload, restoring any saved
    /// progress for the same puzzle.
    pub fn begin(&mut self, payload: &PuzzlePayload) -> &SessionState {
        self.state = SessionState::default();

        let event = match normalize(payload) {
            Ok(puzzle) => {
                let snapshot = persistence::load(&self.store, &self.key_prefix, &puzzle.id);
                Event::PuzzleLoaded { puzzle, snapshot }
            }
            Err(err) => Event::LoadFailed(err.to_string()),
        };

        self.transition(event);
        &self.state
    }

    /// Start over after the puzzle source itself failed.
    pub fn begin_failed(&mut self, err: &PuzzleError) -> &SessionState {
        self.state = SessionState::default();
        self.transition(Event::LoadFailed(err.to_string()));
        &self.state
    }

    pub fn record_move(&mut self, input: MoveInput) -> Result<&SessionState, SessionError> {
        self.dispatch(Event::RecordMove(input))
    }

    pub fn reset_input(&mut self) -> Result<&SessionState, SessionError> {
        self.dispatch(Event::ResetInput)
    }

    pub fn submit(&mut self) -> Result<&SessionState, SessionError> {
        self.dispatch(Event::Submit)
    }

    /// Apply an event, then persist the resulting state.
    pub fn dispatch(&mut self, event: Event) -> Result<&SessionState, SessionError> {
        self.state = self.state.apply(event)?;
        if let Err(e) = persistence::save(&mut self.store, &self.key_prefix, &self.state) {
            warn!("Failed to save session snapshot: {e}");
        }
        Ok(&self.state)
    }

    // Loading transitions from a fresh state cannot be refused.
    fn transition(&mut self, event: Event) {
        if let Err(e) = self.dispatch(event) {
            warn!("Load transition refused: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::puzzle::{GamePayload, PuzzleInfo};

    fn puzzle(fen: &str, solution: &[&str]) -> PuzzleDefinition {
        normalize(&PuzzlePayload {
            id: Some("p1".into()),
            game: GamePayload {
                fen: Some(fen.into()),
                pgn: None,
            },
            puzzle: PuzzleInfo {
                solution: Some(solution.iter().map(|s| s.to_string()).collect()),
                ..Default::default()
            },
            ..Default::default()
        })
        .unwrap()
    }

    fn opening() -> PuzzleDefinition {
        puzzle(
            "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1",
            &["e2e4", "e7e5", "g1f3"],
        )
    }

    fn playing(puzzle: PuzzleDefinition) -> SessionState {
        SessionState::default()
            .apply(Event::PuzzleLoaded {
                puzzle,
                snapshot: None,
            })
            .unwrap()
    }

    fn play(state: SessionState, moves: &[&str]) -> SessionState {
        moves.iter().fold(state, |state, san| {
            state
                .apply(Event::RecordMove(MoveInput::Notation(san.to_string())))
                .unwrap()
        })
    }

    #[test]
    fn test_load_enters_playing() {
        let state = playing(opening());
        assert_eq!(state.status(), Status::Playing);
        assert_eq!(state.attempt_number(), 1);
        assert_eq!(state.attempts_remaining(), 5);
        assert_eq!(state.displayed(), &opening().starting_position);
    }

    #[test]
    fn test_load_failure_is_terminal() {
        let state = SessionState::default()
            .apply(Event::LoadFailed("Missing solution".into()))
            .unwrap();
        assert_eq!(state.status(), Status::Error);
        assert_eq!(state.error(), Some("Missing solution"));
        assert_eq!(
            state.apply(Event::Submit).unwrap_err(),
            SessionError::NotPlaying(Status::Error)
        );
    }

    #[test]
    fn test_record_move_updates_display() {
        let state = play(playing(opening()), &["e4"]);
        assert_eq!(state.current_input(), ["e4"]);
        assert_eq!(state.displayed().turn(), chess_core::Color::Black);

        let state = state
            .apply(Event::RecordMove(MoveInput::Coords("e7e5".parse().unwrap())))
            .unwrap();
        assert_eq!(state.current_input(), ["e4", "e5"]);
    }

    #[test]
    fn test_illegal_move_is_rejected() {
        let state = play(playing(opening()), &["e4"]);
        let err = state
            .apply(Event::RecordMove(MoveInput::Notation("e4".into())))
            .unwrap_err();
        assert_eq!(err, SessionError::IllegalMove("e4".into()));
        assert_eq!(state.current_input(), ["e4"]);
    }

    #[test]
    fn test_reset_keeps_history() {
        let state = play(playing(opening()), &["d4"]);
        let state = state.apply(Event::Submit).unwrap();
        let state = play(state, &["e4", "e5"]);

        let state = state.apply(Event::ResetInput).unwrap();
        assert!(state.current_input().is_empty());
        assert_eq!(state.displayed(), &opening().starting_position);
        assert_eq!(state.history().len(), 1);
        assert_eq!(state.attempt_number(), 2);
    }

    #[test]
    fn test_submit_requires_moves() {
        assert_eq!(
            playing(opening()).apply(Event::Submit).unwrap_err(),
            SessionError::EmptyAttempt
        );
    }

    #[test]
    fn test_wrong_attempt_advances() {
        let state = play(playing(opening()), &["e4", "e5", "Nc3"]);
        let state = state.apply(Event::Submit).unwrap();

        assert_eq!(state.status(), Status::Playing);
        assert_eq!(state.attempt_number(), 2);
        assert_eq!(state.history().len(), 1);
        assert_eq!(
            state.history()[0].feedback,
            vec![Verdict::Correct, Verdict::Correct, Verdict::Incorrect]
        );
        assert!(state.current_input().is_empty());
        assert_eq!(state.displayed(), &opening().starting_position);
    }

    #[test]
    fn test_exact_attempt_wins() {
        let state = play(playing(opening()), &["e4", "e5", "Nf3"]);
        let state = state.apply(Event::Submit).unwrap();

        assert_eq!(state.status(), Status::Won);
        assert_eq!(state.attempt_number(), 1);
        assert!(state.history()[0].is_solved());
        assert_eq!(
            state
                .apply(Event::RecordMove(MoveInput::Notation("e4".into())))
                .unwrap_err(),
            SessionError::NotPlaying(Status::Won)
        );
    }

    #[test]
    fn test_attempts_exhaust_to_lost() {
        let mut state = playing(opening());
        for attempt in 1..=MAX_ATTEMPTS {
            assert_eq!(state.status(), Status::Playing);
            assert_eq!(state.history().len() as u32, attempt - 1);
            state = play(state, &["d4"]).apply(Event::Submit).unwrap();
        }

        assert_eq!(state.status(), Status::Lost);
        assert_eq!(state.attempt_number(), MAX_ATTEMPTS);
        assert_eq!(state.history().len() as u32, MAX_ATTEMPTS);
        assert_eq!(state.attempts_remaining(), 0);
    }

    #[test]
    fn test_malformed_solution_entry_ends_session() {
        let state = play(
            playing(puzzle(
                "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1",
                &["e2e4", "e7e5x"],
            )),
            &["e4", "e5"],
        );
        let state = state.apply(Event::Submit).unwrap();
        assert_eq!(state.status(), Status::Error);
        assert!(state.error().unwrap().contains("Malformed solution entry 1"));
    }

    #[test]
    fn test_load_restores_snapshot() {
        let history = vec![AttemptRecord {
            sequence: vec!["d4".into()],
            feedback: vec![Verdict::Incorrect; 3],
        }];
        let state = SessionState::default()
            .apply(Event::PuzzleLoaded {
                puzzle: opening(),
                snapshot: Some(Snapshot {
                    history: history.clone(),
                    attempt_number: 2,
                    status: Status::Playing,
                }),
            })
            .unwrap();

        assert_eq!(state.history(), history.as_slice());
        assert_eq!(state.attempt_number(), 2);
        assert_eq!(state.status(), Status::Playing);
        assert!(state.current_input().is_empty());
        assert_eq!(state.displayed(), &opening().starting_position);
    }

    #[test]
    fn test_load_only_once() {
        let state = playing(opening());
        assert_eq!(
            state
                .apply(Event::PuzzleLoaded {
                    puzzle: opening(),
                    snapshot: None,
                })
                .unwrap_err(),
            SessionError::NotLoading(Status::Playing)
        );
    }
}
