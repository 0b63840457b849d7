use cozy_chess::{Board, Move, Piece};

use crate::types::PieceKind;
use crate::uci::{file_to_char, format_square, rank_to_char};
use crate::walker::legal_moves;

/// Resolve a Standard Algebraic Notation (SAN) token against the legal moves
/// of `board`.
///
/// Check, mate and annotation suffixes are ignored, `0-0` is accepted for
/// castling and the `=` before a promotion piece is optional.
pub fn parse_san(board: &Board, san: &str) -> Result<Move, SanError> {
    let wanted = normalize(san);
    if wanted.is_empty() {
        return Err(SanError::InvalidFormat(san.to_string()));
    }

    let mut found: Option<Move> = None;
    for mv in legal_moves(board) {
        if normalize(&format_san(board, mv)) == wanted {
            if found.is_some() {
                return Err(SanError::AmbiguousMove(san.to_string()));
            }
            found = Some(mv);
        }
    }

    found.ok_or_else(|| SanError::NoLegalMove(san.to_string()))
}

/// Format a legal move as SAN, including disambiguation and `+`/`#`.
pub fn format_san(board: &Board, mv: Move) -> String {
    let Some(piece) = board.piece_on(mv.from) else {
        return format_square(mv.from) + &format_square(mv.to);
    };

    let mut san = String::new();
    let is_castle = piece == Piece::King && board.color_on(mv.to) == board.color_on(mv.from);

    if is_castle {
        if (mv.to.file() as u8) > (mv.from.file() as u8) {
            san.push_str("O-O");
        } else {
            san.push_str("O-O-O");
        }
    } else {
        let is_capture = board.piece_on(mv.to).is_some()
            || (piece == Piece::Pawn && mv.from.file() != mv.to.file());

        match PieceKind::from(piece).san_letter() {
            Some(letter) => {
                san.push(letter);
                san.push_str(&disambiguation(board, mv, piece));
            }
            None if is_capture => san.push(file_to_char(mv.from.file())),
            None => {}
        }

        if is_capture {
            san.push('x');
        }
        san.push_str(&format_square(mv.to));

        if let Some(promo) = mv.promotion.and_then(|p| PieceKind::from(p).san_letter()) {
            san.push('=');
            san.push(promo);
        }
    }

    let mut after = board.clone();
    after.play_unchecked(mv);
    if !after.checkers().is_empty() {
        if legal_moves(&after).is_empty() {
            san.push('#');
        } else {
            san.push('+');
        }
    }

    san
}

fn disambiguation(board: &Board, mv: Move, piece: Piece) -> String {
    let rivals: Vec<Move> = legal_moves(board)
        .into_iter()
        .filter(|other| {
            other.to == mv.to && other.from != mv.from && board.piece_on(other.from) == Some(piece)
        })
        .collect();

    if rivals.is_empty() {
        return String::new();
    }

    let file = file_to_char(mv.from.file());
    let rank = rank_to_char(mv.from.rank());
    if rivals.iter().all(|o| o.from.file() != mv.from.file()) {
        file.to_string()
    } else if rivals.iter().all(|o| o.from.rank() != mv.from.rank()) {
        rank.to_string()
    } else {
        format!("{}{}", file, rank)
    }
}

fn normalize(san: &str) -> String {
    san.trim()
        .trim_end_matches(&['+', '#', '!', '?'][..])
        .replace('0', "O")
        .replace('=', "")
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SanError {
    #[error("No legal move found for: {0}")]
    NoLegalMove(String),
    #[error("Ambiguous move: {0}")]
    AmbiguousMove(String),
    #[error("Invalid format: {0}")]
    InvalidFormat(String),
}
