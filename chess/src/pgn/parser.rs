use cozy_chess::{Board, Move};

use super::san::{parse_san, SanError};
use crate::fen::parse_fen;
use crate::game::{Game, GameError, StartPosition};

/// A parsed PGN game
#[derive(Debug, Clone)]
pub struct PgnGame {
    /// Tag pairs in file order.
    pub tags: Vec<(String, String)>,
    pub start_position: StartPosition,
    pub moves: Vec<PgnMove>,
    pub result: GameResult,
}

/// A single main-line move
#[derive(Debug, Clone)]
pub struct PgnMove {
    pub mv: Move,
    pub san: String,
    /// Numeric Annotation Glyphs attached in the source ($n, !, ?, ...).
    pub nags: Vec<u8>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameResult {
    WhiteWins,
    BlackWins,
    Draw,
    Ongoing,
}

impl PgnGame {
    pub fn tag(&self, name: &str) -> Option<&str> {
        self.tags
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Turn the parsed record into an analyzable [`Game`].
    pub fn into_game(self) -> Result<Game, GameError> {
        Game::new(
            self.start_position,
            self.moves.into_iter().map(|m| m.mv).collect(),
        )
    }
}

/// Parse the first game of a PGN string.
///
/// Comments, variations and the result token are skipped; every SAN token of
/// the main line is resolved against the position it is played in.
pub fn parse_pgn(input: &str) -> Result<PgnGame, PgnError> {
    let mut tags = Vec::new();
    let mut movetext = String::new();

    for line in input.lines() {
        let trimmed = line.trim();
        if trimmed.starts_with('%') {
            continue;
        }
        if trimmed.starts_with('[') && movetext.trim().is_empty() {
            tags.push(parse_tag(trimmed)?);
            continue;
        }
        if trimmed.starts_with('[') {
            // Tag section of the next game.
            break;
        }
        movetext.push_str(line);
        movetext.push('\n');
    }

    let start_position = match tags.iter().find(|(k, _)| k == "FEN") {
        Some((_, fen)) => {
            parse_fen(fen).map_err(|_| PgnError::InvalidFen(fen.clone()))?;
            StartPosition::Fen(fen.clone())
        }
        None => StartPosition::Standard,
    };
    let mut board: Board = match &start_position {
        StartPosition::Standard => Board::default(),
        StartPosition::Fen(fen) => parse_fen(fen).map_err(|_| PgnError::InvalidFen(fen.clone()))?,
    };

    let mut moves: Vec<PgnMove> = Vec::new();
    let mut result = GameResult::Ongoing;

    for token in tokenize(&movetext) {
        match token {
            Token::Result(r) => {
                result = r;
                break;
            }
            Token::Nag(n) => {
                if let Some(last) = moves.last_mut() {
                    last.nags.push(n);
                }
            }
            Token::San(text) => {
                let (san, suffix_nag) = split_annotation(&text);
                let ply = moves.len() as u32 + 1;
                let mv = parse_san(&board, san).map_err(|source| PgnError::Unresolved {
                    ply,
                    san: san.to_string(),
                    source,
                })?;
                board.play_unchecked(mv);
                moves.push(PgnMove {
                    mv,
                    san: san.to_string(),
                    nags: suffix_nag.into_iter().collect(),
                });
            }
        }
    }

    if moves.is_empty() {
        return Err(PgnError::Empty);
    }

    Ok(PgnGame {
        tags,
        start_position,
        moves,
        result,
    })
}

fn parse_tag(line: &str) -> Result<(String, String), PgnError> {
    let inner = line
        .strip_prefix('[')
        .and_then(|s| s.strip_suffix(']'))
        .ok_or_else(|| PgnError::InvalidTag(line.to_string()))?;
    let (name, value) = inner
        .trim()
        .split_once(char::is_whitespace)
        .ok_or_else(|| PgnError::InvalidTag(line.to_string()))?;
    let value = value
        .trim()
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .ok_or_else(|| PgnError::InvalidTag(line.to_string()))?;
    Ok((name.to_string(), value.replace("\\\"", "\"")))
}

#[derive(Debug, PartialEq)]
enum Token {
    San(String),
    Nag(u8),
    Result(GameResult),
}

fn tokenize(movetext: &str) -> Vec<Token> {
    // Strip comments and variations first; they may span lines.
    let mut clean = String::with_capacity(movetext.len());
    let mut chars = movetext.chars();
    let mut depth = 0usize;
    while let Some(c) = chars.next() {
        match c {
            '{' => {
                for c in chars.by_ref() {
                    if c == '}' {
                        break;
                    }
                }
                clean.push(' ');
            }
            ';' => {
                for c in chars.by_ref() {
                    if c == '\n' {
                        break;
                    }
                }
                clean.push(' ');
            }
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            _ if depth > 0 => {}
            _ => clean.push(c),
        }
    }

    let mut tokens = Vec::new();
    for raw in clean.split_whitespace() {
        match raw {
            "1-0" => tokens.push(Token::Result(GameResult::WhiteWins)),
            "0-1" => tokens.push(Token::Result(GameResult::BlackWins)),
            "1/2-1/2" => tokens.push(Token::Result(GameResult::Draw)),
            "*" => tokens.push(Token::Result(GameResult::Ongoing)),
            _ => {
                if let Some(nag) = raw.strip_prefix('$') {
                    if let Ok(n) = nag.parse() {
                        tokens.push(Token::Nag(n));
                    }
                    continue;
                }
                // "12." / "12..." / "12.e4"
                let san = raw.trim_start_matches(|c: char| c.is_ascii_digit());
                let san = if san.len() < raw.len() {
                    san.trim_start_matches('.')
                } else {
                    san
                };
                if !san.is_empty() {
                    tokens.push(Token::San(san.to_string()));
                }
            }
        }
    }
    tokens
}

/// Split a trailing `!`/`?` annotation from a SAN token, returning its NAG.
fn split_annotation(token: &str) -> (&str, Option<u8>) {
    let san = token.trim_end_matches(&['!', '?'][..]);
    let nag = match &token[san.len()..] {
        "!" => Some(1),
        "?" => Some(2),
        "!!" => Some(3),
        "??" => Some(4),
        "!?" => Some(5),
        "?!" => Some(6),
        _ => None,
    };
    (san, nag)
}

#[derive(Debug, thiserror::Error)]
pub enum PgnError {
    #[error("PGN contains no moves")]
    Empty,
    #[error("Invalid tag: {0}")]
    InvalidTag(String),
    #[error("Invalid FEN tag: {0}")]
    InvalidFen(String),
    #[error("Cannot play {san} at ply {ply}: {source}")]
    Unresolved {
        ply: u32,
        san: String,
        #[source]
        source: SanError,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::uci::format_uci_move;

    const LICHESS_PGN: &str = r#"[Event "Rated Blitz game"]
[Site "https://lichess.org/abcdefgh"]
[White "alice"]
[Black "bob"]
[Result "1-0"]

1. e4 { [%clk 0:03:00] } 1... e5 2. Qh5?? (2. Nf3 Nc6) 2... Nc6 3. Bc4 Nf6?? $4 4. Qxf7# 1-0
"#;

    #[test]
    fn test_parse_lichess_export() {
        let game = parse_pgn(LICHESS_PGN).unwrap();
        assert_eq!(game.tag("White"), Some("alice"));
        assert_eq!(game.result, GameResult::WhiteWins);
        let sans: Vec<&str> = game.moves.iter().map(|m| m.san.as_str()).collect();
        assert_eq!(sans, ["e4", "e5", "Qh5", "Nc6", "Bc4", "Nf6", "Qxf7#"]);
        assert_eq!(game.moves[2].nags, vec![4]);
        assert_eq!(game.moves[5].nags, vec![4, 4]);
        assert_eq!(format_uci_move(game.moves[6].mv), "h5f7");
    }

    #[test]
    fn test_movetext_without_tags() {
        let game = parse_pgn("1.d4 d5 2.c4 e6 *").unwrap();
        assert_eq!(game.moves.len(), 4);
        assert_eq!(game.start_position, StartPosition::Standard);
        assert_eq!(game.into_game().unwrap().len(), 4);
    }

    #[test]
    fn test_fen_tag_sets_start() {
        let pgn = "[SetUp \"1\"]\n[FEN \"4k3/8/8/8/8/8/4P3/4K3 w - - 0 1\"]\n\n1. e4 Kd7 *";
        let game = parse_pgn(pgn).unwrap();
        assert!(matches!(game.start_position, StartPosition::Fen(_)));
        assert_eq!(game.moves.len(), 2);
    }

    #[test]
    fn test_only_first_game_is_read() {
        let pgn = "[Event \"a\"]\n\n1. e4 e5 1-0\n\n[Event \"b\"]\n\n1. d4 d5 0-1\n";
        let game = parse_pgn(pgn).unwrap();
        assert_eq!(game.moves[0].san, "e4");
        assert_eq!(game.result, GameResult::WhiteWins);
    }

    #[test]
    fn test_errors() {
        assert!(matches!(parse_pgn("hello there"), Err(PgnError::Unresolved { ply: 1, .. })));
        assert!(matches!(parse_pgn("[Event \"x\"]\n\n*"), Err(PgnError::Empty)));
        assert!(matches!(parse_pgn("[Broken]\n1. e4"), Err(PgnError::InvalidTag(_))));
        assert!(matches!(
            parse_pgn("[FEN \"nope\"]\n1. e4"),
            Err(PgnError::InvalidFen(_))
        ));
    }

    #[test]
    fn test_tokenize_strips_comments_and_variations() {
        let tokens = tokenize("1. e4 ; line comment\n e5 {a {brace} 2. Nf3 (2. f4 (2. d4)) $1 *");
        assert_eq!(
            tokens,
            vec![
                Token::San("e4".into()),
                Token::San("e5".into()),
                Token::San("Nf3".into()),
                Token::Nag(1),
                Token::Result(GameResult::Ongoing),
            ]
        );
    }
}
