//! Turns a raw puzzle payload into a validated starting position whose side
//! to move agrees with the first solution move.

use chess_core::board::flip_side_to_move;
use chess_core::notation::parse_fixed;
use chess_core::pgn::History;
use chess_core::{Board, Move};
use tracing::{debug, info, warn};

use crate::error::PuzzleError;
use crate::puzzle::{PuzzleDefinition, PuzzlePayload, TurnCorrection};

/// Normalize a payload into a playable puzzle.
pub fn normalize(payload: &PuzzlePayload) -> Result<PuzzleDefinition, PuzzleError> {
    let id = payload.puzzle_id().ok_or(PuzzleError::MissingId)?.to_string();

    let solution = match payload.puzzle.solution.as_deref() {
        Some(moves) if !moves.is_empty() => moves.to_vec(),
        _ => return Err(PuzzleError::MissingSolution),
    };

    let candidate_fen = derive_fen(payload)?;
    let candidate = Board::from_fen(&candidate_fen)?;
    let first = parse_fixed(&solution[0]).map_err(PuzzleError::InvalidSolution)?;

    let (starting_position, turn_correction) = correct_turn(candidate, &first);
    let side_to_move = starting_position.turn();

    info!(
        puzzle_id = %id,
        fen = %starting_position.fen(),
        solution_len = solution.len(),
        ?turn_correction,
        "Puzzle normalized"
    );

    Ok(PuzzleDefinition {
        id,
        rating: payload.rating(),
        starting_position,
        solution,
        side_to_move,
        themes: payload.puzzle.themes.clone(),
        turn_correction,
    })
}

/// The explicit FEN if present, otherwise the position reached by replaying
/// the move history through `initialPly` plus the one setup move after it.
fn derive_fen(payload: &PuzzlePayload) -> Result<String, PuzzleError> {
    if let Some(fen) = payload.game.fen.as_deref().filter(|f| !f.trim().is_empty()) {
        return Ok(fen.to_string());
    }

    let (Some(pgn), Some(initial_ply)) = (payload.game.pgn.as_deref(), payload.puzzle.initial_ply)
    else {
        return Err(PuzzleError::MissingPosition);
    };

    let history = History::parse(pgn)?;
    let plies = if initial_ply < history.len() {
        initial_ply + 1
    } else {
        initial_ply
    };

    debug!(initial_ply, plies, available = history.len(), "Deriving position from move history");
    Ok(history.replay(plies)?.fen())
}

/// Probe the position with the known first move. Flip the side to move if
/// that is what makes the move legal; otherwise keep the position as given.
pub fn correct_turn(candidate: Board, first: &Move) -> (Board, TurnCorrection) {
    if candidate.play(first).is_some() {
        return (candidate, TurnCorrection::AsGiven);
    }

    let flipped = flip_side_to_move(&candidate.fen()).and_then(|fen| Board::from_fen(&fen).ok());
    match flipped {
        Some(board) if board.play(first).is_some() => {
            debug!(fen = %board.fen(), first_move = %first, "Flipped side to move");
            (board, TurnCorrection::Flipped)
        }
        _ => {
            warn!(
                fen = %candidate.fen(),
                first_move = %first,
                "First solution move is illegal for either side; keeping position as given"
            );
            (candidate, TurnCorrection::Inconsistent)
        }
    }
}
