//! Move-by-move attempt scoring.
//!
//! Every index is judged in the validation position: the board reached by
//! the solution's own moves up to that index, never the player's. A player
//! who went wrong at move 2 still gets a fair reading of move 3.

use chess_core::notation::{extract_intended_destination, parse_contextual, parse_fixed};
use chess_core::{Board, Move};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::PuzzleError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    Correct,
    Partial,
    Incorrect,
}

/// Result of scoring one attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scorecard {
    /// One verdict per index of the longer of attempt and solution.
    pub verdicts: Vec<Verdict>,
    pub solved: bool,
    /// Index at which the solution's own line could not be replayed. Scoring
    /// stops there and every later index is incorrect.
    pub halted_at: Option<usize>,
}

/// Score `input` (SAN as played) against `solution` (fixed notation) from
/// `start`. A malformed solution entry is fatal; a solution move that is
/// illegal on its own line only halts this attempt.
pub fn score_attempt(
    start: &Board,
    solution: &[String],
    input: &[String],
) -> Result<Scorecard, PuzzleError> {
    let len = input.len().max(solution.len());
    let mut verdicts = Vec::with_capacity(len);
    let mut validation = start.clone();
    let mut halted_at = None;

    for i in 0..len {
        let expected = solution
            .get(i)
            .map(|text| {
                parse_fixed(text)
                    .map_err(|source| PuzzleError::MalformedSolutionEntry { index: i, source })
            })
            .transpose()?;
        let played = input.get(i).map(String::as_str);

        let mut verdict = judge(&validation, expected.as_ref(), played);

        if let Some(expected) = expected {
            match validation.play(&expected) {
                Some((next, _)) => validation = next,
                None => {
                    warn!(
                        index = i,
                        solution_move = %expected,
                        fen = %validation.fen(),
                        "Solution move is illegal on its own line; halting this attempt"
                    );
                    verdict = Verdict::Incorrect;
                    halted_at = Some(i);
                }
            }
        }

        debug!(index = i, played, ?verdict, "Scored move");
        verdicts.push(verdict);

        if halted_at.is_some() {
            break;
        }
    }

    verdicts.resize(len, Verdict::Incorrect);

    let solved = !verdicts.is_empty()
        && input.len() == solution.len()
        && verdicts.iter().all(|v| *v == Verdict::Correct);

    Ok(Scorecard {
        verdicts,
        solved,
        halted_at,
    })
}

/// Verdict for a single index in the given validation position.
fn judge(validation: &Board, expected: Option<&Move>, played: Option<&str>) -> Verdict {
    let (Some(expected), Some(text)) = (expected, played) else {
        return Verdict::Incorrect;
    };

    match parse_contextual(validation, text) {
        Ok(actual) => compare(expected, &actual.mv),
        Err(_) => salvage(expected, text),
    }
}

/// Compare two legal moves: exact match is correct, matching exactly one of
/// origin and destination is partial.
pub fn compare(expected: &Move, actual: &Move) -> Verdict {
    if actual == expected {
        return Verdict::Correct;
    }

    let from_match = actual.from == expected.from;
    let to_match = actual.to == expected.to;
    if from_match ^ to_match {
        Verdict::Partial
    } else {
        Verdict::Incorrect
    }
}

/// Fallback for notation that does not resolve in the validation position:
/// partial credit if it was aimed at the right square. Feeds the verdict
/// only, never the board.
fn salvage(expected: &Move, text: &str) -> Verdict {
    match extract_intended_destination(text) {
        Some(square) if square == expected.to => Verdict::Partial,
        _ => Verdict::Incorrect,
    }
}
