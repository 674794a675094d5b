//! PGN move history replay: a lightweight regex-based movetext parser.

use std::sync::LazyLock;

use regex::Regex;

use crate::board::{Board, RulesError};

static TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\[[^\]]*\]").unwrap());
static COMMENT_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\{[^}]*\}").unwrap());
static VARIATION_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\([^)]*\)").unwrap());
static MOVE_NUMBER_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\d+\.+").unwrap());
static SAN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:[KQRBN]?[a-h]?[1-8]?x?[a-h][1-8](?:=[QRBN])?|O-O-O|O-O)[+#]?$").unwrap()
});

const RESULTS: [&str; 4] = ["1-0", "0-1", "1/2-1/2", "*"];

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PgnError {
    #[error("Move history has {available} plies, {requested} requested")]
    MissingMove { requested: usize, available: usize },

    #[error("Illegal move '{san}' at ply {ply}")]
    IllegalMove { ply: usize, san: String },

    #[error("Unrecognized movetext token '{0}'")]
    BadToken(String),

    #[error("Invalid starting position: {0}")]
    InvalidStart(#[from] RulesError),
}

/// A recorded game: where it starts and the SAN tokens played from there.
#[derive(Debug, Clone)]
pub struct History {
    start: Board,
    sans: Vec<String>,
}

impl History {
    /// Parse a PGN document. A `[FEN]` tag overrides the standard start
    /// unless `[SetUp "0"]` turns it off.
    pub fn parse(pgn: &str) -> Result<Self, PgnError> {
        let setup = extract_header(pgn, "SetUp");
        let start = match extract_header(pgn, "FEN") {
            Some(fen) if setup.as_deref() != Some("0") => Board::from_fen(&fen)?,
            _ => Board::start(),
        };

        Ok(Self {
            start,
            sans: movetext_sans(pgn)?,
        })
    }

    pub fn len(&self) -> usize {
        self.sans.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sans.is_empty()
    }

    pub fn sans(&self) -> &[String] {
        &self.sans
    }

    /// Position after the first `plies` moves.
    pub fn replay(&self, plies: usize) -> Result<Board, PgnError> {
        if plies > self.sans.len() {
            return Err(PgnError::MissingMove {
                requested: plies,
                available: self.sans.len(),
            });
        }

        let mut board = self.start.clone();
        for (ply, san) in self.sans[..plies].iter().enumerate() {
            board = match board.play_san(san) {
                Some((next, _)) => next,
                None => {
                    return Err(PgnError::IllegalMove {
                        ply,
                        san: san.clone(),
                    })
                }
            };
        }

        tracing::debug!(plies, fen = %board.fen(), "Replayed move history");
        Ok(board)
    }
}

/// Extract SAN moves from PGN text (after removing headers, comments, variations).
///
/// Move numbers, NAGs, annotation glyphs and result markers are skipped and
/// zero-style castling is read as `O-O`. Any other token is an error, so a
/// garbled history never replays to a shifted position.
pub fn movetext_sans(pgn: &str) -> Result<Vec<String>, PgnError> {
    let no_headers = TAG_RE.replace_all(pgn, "");
    let no_comments = COMMENT_RE.replace_all(&no_headers, "");
    let no_variations = VARIATION_RE.replace_all(&no_comments, "");

    let mut sans = Vec::new();
    for raw in no_variations.split_whitespace() {
        let token = MOVE_NUMBER_RE.replace(raw, "");
        let token = token.trim_end_matches(['!', '?']);
        if token.is_empty() || token.starts_with('$') || RESULTS.contains(&token) {
            continue;
        }

        let san = token.replace('0', "O");
        if !SAN_RE.is_match(&san) {
            return Err(PgnError::BadToken(raw.to_string()));
        }
        sans.push(san);
    }
    Ok(sans)
}

/// Extract a string value from a PGN header (e.g. FEN, Site).
pub fn extract_header(pgn: &str, header_name: &str) -> Option<String> {
    let pattern = format!(r#"\[{}\s+"([^"]*)"\]"#, regex::escape(header_name));
    let re = Regex::new(&pattern).ok()?;
    let value = re.captures(pgn)?.get(1)?.as_str().to_string();
    if value.is_empty() { None } else { Some(value) }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ITALIAN: &str = "1. e4 e5 2. Nf3 Nc6 3. Bc4 Nd4";

    #[test]
    fn test_movetext_sans() {
        let pgn = r#"[Event "Casual"]
[Result "*"]

1. e4 {best by test} e5 2. Nf3 (2. f4 exf4) Nc6 3. O-O-O+ exd8=Q# *"#;

        assert_eq!(
            movetext_sans(pgn).unwrap(),
            vec!["e4", "e5", "Nf3", "Nc6", "O-O-O+", "exd8=Q#"]
        );
    }

    #[test]
    fn test_movetext_skips_numbers_nags_and_glyphs() {
        let pgn = "1.e4 e5!? 2. Nf3 $1 2... Nc6?! 3.Bb5 a6 1/2-1/2";
        assert_eq!(
            movetext_sans(pgn).unwrap(),
            vec!["e4", "e5", "Nf3", "Nc6", "Bb5", "a6"]
        );
    }

    #[test]
    fn test_zero_castling_matches_letter_castling() {
        let zeros = History::parse("1. Nf3 Nf6 2. g3 g6 3. Bg2 Bg7 4. 0-0 0-0").unwrap();
        let letters = History::parse("1. Nf3 Nf6 2. g3 g6 3. Bg2 Bg7 4. O-O O-O").unwrap();

        assert_eq!(zeros.sans()[6], "O-O");
        assert_eq!(zeros.replay(7).unwrap(), letters.replay(7).unwrap());
        assert_eq!(
            zeros.replay(7).unwrap().fen(),
            "rnbqk2r/ppppppbp/5np1/8/8/5NP1/PPPPPPBP/RNBQ1RK1 b kq - 3 4"
        );
    }

    #[test]
    fn test_unknown_token_is_rejected() {
        assert_eq!(
            History::parse("1. e4 e5 2. Nf3 castles").unwrap_err(),
            PgnError::BadToken("castles".into())
        );
        assert!(matches!(
            History::parse("1. e4 e5 2. Zz9").unwrap_err(),
            PgnError::BadToken(_)
        ));
    }

    #[test]
    fn test_replay_prefix() {
        let history = History::parse(ITALIAN).unwrap();
        assert_eq!(history.len(), 6);

        let board = history.replay(6).unwrap();
        assert_eq!(
            board.fen(),
            "r1bqkbnr/pppp1ppp/8/4p3/2BnP3/5N2/PPPP1PPP/RNBQK2R w KQkq - 4 4"
        );
        assert_eq!(history.replay(0).unwrap(), Board::start());
    }

    #[test]
    fn test_replay_past_end() {
        let history = History::parse(ITALIAN).unwrap();
        assert_eq!(
            history.replay(7).unwrap_err(),
            PgnError::MissingMove {
                requested: 7,
                available: 6
            }
        );
    }

    #[test]
    fn test_replay_illegal_move() {
        let history = History::parse("1. e4 e5 2. Ke3").unwrap();
        assert!(history.replay(2).is_ok());
        assert_eq!(
            history.replay(3).unwrap_err(),
            PgnError::IllegalMove {
                ply: 2,
                san: "Ke3".into()
            }
        );
    }

    #[test]
    fn test_fen_header_sets_start() {
        let pgn = r#"[SetUp "1"]
[FEN "6k1/5ppp/8/8/8/8/8/R5K1 w - - 0 1"]

1. Ra8#"#;
        let history = History::parse(pgn).unwrap();
        assert!(history.replay(1).unwrap().is_checkmate());
    }

    #[test]
    fn test_setup_zero_ignores_fen_header() {
        let pgn = r#"[SetUp "0"]
[FEN "6k1/5ppp/8/8/8/8/8/R5K1 w - - 0 1"]

1. e4"#;
        let history = History::parse(pgn).unwrap();
        assert_eq!(history.replay(0).unwrap(), Board::start());
        assert!(history.replay(1).is_ok());
    }

    #[test]
    fn test_extract_header() {
        let pgn = r#"[Site "https://lichess.org/abcd1234"]
[FEN ""]"#;
        assert_eq!(
            extract_header(pgn, "Site").as_deref(),
            Some("https://lichess.org/abcd1234")
        );
        assert_eq!(extract_header(pgn, "FEN"), None);
        assert_eq!(extract_header(pgn, "Missing"), None);
    }
}
