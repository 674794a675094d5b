use std::time::Duration;

use chessle::PuzzlePayload;
use reqwest::Client;

use crate::config::Config;

pub struct LichessClient {
    client: Client,
    url: String,
}

impl LichessClient {
    pub fn new(config: &Config) -> Result<Self, String> {
        let client = Client::builder()
            .user_agent("Chessle/0.1")
            .timeout(Duration::from_secs(config.http_timeout_secs))
            .build()
            .map_err(|e| format!("HTTP client error: {e}"))?;
        Ok(Self {
            client,
            url: config.puzzle_url.clone(),
        })
    }

    /// Fetch today's puzzle. The response body is handed to the engine as
    /// an untrusted payload.
    pub async fn fetch_daily_puzzle(&self) -> Result<PuzzlePayload, String> {
        tracing::info!(url = %self.url, "Fetching daily puzzle");

        let resp = self
            .client
            .get(&self.url)
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| format!("Request error: {e}"))?;

        if !resp.status().is_success() {
            return Err(format!("HTTP {}", resp.status()));
        }

        let text = resp
            .text()
            .await
            .map_err(|e| format!("Body read error: {e}"))?;

        PuzzlePayload::from_json(&text).map_err(|e| format!("Malformed puzzle JSON: {e}"))
    }
}
