//! Terminal front end: fetches the daily puzzle and plays it line by line.

mod config;
mod lichess;

use std::path::PathBuf;

use chess_core::notation::parse_fixed;
use chessle::persistence::FileStore;
use chessle::{MoveInput, PuzzleError, PuzzlePayload, Session, SessionState, Status, Verdict, MAX_ATTEMPTS};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

use crate::config::Config;
use crate::lichess::LichessClient;

/// Parse --file <path> from CLI args
fn parse_file_arg() -> Option<PathBuf> {
    let args: Vec<String> = std::env::args().collect();
    args.iter()
        .position(|arg| arg == "--file")
        .and_then(|i| args.get(i + 1))
        .map(PathBuf::from)
}

async fn fetch_payload(config: &Config) -> Result<PuzzlePayload, String> {
    match parse_file_arg() {
        Some(path) => {
            tracing::info!(path = %path.display(), "Loading puzzle from file");
            let text = tokio::fs::read_to_string(&path)
                .await
                .map_err(|e| format!("Cannot read {}: {e}", path.display()))?;
            PuzzlePayload::from_json(&text).map_err(|e| format!("Malformed puzzle JSON: {e}"))
        }
        None => LichessClient::new(config)?.fetch_daily_puzzle().await,
    }
}

fn tile(verdict: Verdict) -> char {
    match verdict {
        Verdict::Correct => '🟩',
        Verdict::Partial => '🟨',
        Verdict::Incorrect => '🟥',
    }
}

fn print_state(state: &SessionState) {
    for (i, record) in state.history().iter().enumerate() {
        let tiles: String = record.feedback.iter().map(|v| tile(*v)).collect();
        println!("  {}. {}  {}", i + 1, tiles, record.sequence.join(" "));
    }

    match state.status() {
        Status::Playing => {
            println!(
                "Attempt {}/{} | {}",
                state.attempt_number(),
                MAX_ATTEMPTS,
                state.displayed().fen()
            );
            if !state.current_input().is_empty() {
                println!("  moves: {}", state.current_input().join(" "));
            }
        }
        Status::Won => println!("Solved in {} attempt(s)!", state.history().len()),
        Status::Lost => {
            let solution = state
                .puzzle()
                .map(|p| p.solution.join(" "))
                .unwrap_or_default();
            println!("Out of attempts. Solution: {solution}");
        }
        Status::Error => println!("Error: {}", state.error().unwrap_or("unknown")),
        Status::Loading => println!("Loading..."),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = Config::from_env();
    let store = FileStore::new(&config.store_dir)?;
    let mut session = Session::new(store, config.key_prefix.clone());

    match fetch_payload(&config).await {
        Ok(payload) => session.begin(&payload),
        Err(e) => session.begin_failed(&PuzzleError::Source(e)),
    };

    if let Some(puzzle) = session.state().puzzle() {
        println!(
            "Puzzle {} (rating {}), {} to move, {} moves to find",
            puzzle.id,
            puzzle.rating.map(|r| r.to_string()).unwrap_or_else(|| "?".into()),
            if puzzle.side_to_move.is_white() { "white" } else { "black" },
            puzzle.solution.len()
        );
        println!("Type moves (SAN or e2e4), 'submit', 'reset' or 'quit'.");
    }
    print_state(session.state());

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while session.state().status() == Status::Playing {
        let Some(line) = lines.next_line().await? else {
            break;
        };

        let result = match line.trim() {
            "" => continue,
            "quit" | "exit" => break,
            "submit" => session.submit(),
            "reset" => session.reset_input(),
            text => {
                let input = match parse_fixed(text) {
                    Ok(mv) => MoveInput::Coords(mv),
                    Err(_) => MoveInput::Notation(text.to_string()),
                };
                session.record_move(input)
            }
        };

        match result {
            Ok(state) => print_state(state),
            Err(e) => println!("  ({e})"),
        }
    }

    Ok(())
}
