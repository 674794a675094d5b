#![allow(dead_code)]

use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use chessle::PuzzlePayload;
use serde_json::json;

pub const BACK_RANK_WHITE: &str = "6k1/5ppp/8/8/8/8/8/R5K1 w - - 0 1";

/// The same back-rank mate, but published with the wrong side to move.
pub const BACK_RANK_MISLABELED: &str = "6k1/5ppp/8/8/8/8/8/R5K1 b - - 0 1";

/// Generate a unique suffix based on timestamp to avoid collisions.
pub fn unique_suffix() -> String {
    let ts = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    format!("{}-{}", std::process::id(), ts % 1_000_000_000)
}

/// A fresh directory under the system temp dir.
pub fn temp_dir(label: &str) -> PathBuf {
    std::env::temp_dir().join(format!("chessle-{label}-{}", unique_suffix()))
}

/// Payload with an explicit position.
pub fn fen_payload(id: &str, fen: &str, solution: &[&str]) -> PuzzlePayload {
    let body = json!({
        "game": { "fen": fen },
        "puzzle": { "id": id, "rating": 1500, "solution": solution },
    });
    serde_json::from_value(body).unwrap()
}

/// Payload in the Lichess daily shape: a move history and an initial ply.
pub fn pgn_payload(id: &str, pgn: &str, initial_ply: usize, solution: &[&str]) -> PuzzlePayload {
    let body = json!({
        "game": { "id": "game1", "pgn": pgn },
        "puzzle": {
            "id": id,
            "rating": 1800,
            "initialPly": initial_ply,
            "solution": solution,
            "themes": ["short"],
        },
    });
    serde_json::from_value(body).unwrap()
}

pub fn strings(moves: &[&str]) -> Vec<String> {
    moves.iter().map(|s| s.to_string()).collect()
}
