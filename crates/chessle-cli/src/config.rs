use std::env;
use std::path::PathBuf;

use chessle::persistence::DEFAULT_KEY_PREFIX;

pub const LICHESS_DAILY_URL: &str = "https://lichess.org/api/puzzle/daily";

#[derive(Clone, Debug)]
pub struct Config {
    pub puzzle_url: String,
    pub store_dir: PathBuf,
    pub key_prefix: String,
    pub http_timeout_secs: u64,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            puzzle_url: env::var("CHESSLE_PUZZLE_URL")
                .unwrap_or_else(|_| LICHESS_DAILY_URL.to_string()),
            store_dir: env::var("CHESSLE_STORE_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(".chessle")),
            key_prefix: env::var("CHESSLE_KEY_PREFIX")
                .unwrap_or_else(|_| DEFAULT_KEY_PREFIX.to_string()),
            http_timeout_secs: env::var("CHESSLE_HTTP_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(30),
        }
    }
}
