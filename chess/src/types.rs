//! Canonical side, piece and turn types for the project.
//! cozy-chess types are internal implementation details.

use serde::{Deserialize, Serialize};

/// Project-owned piece type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PieceKind {
    Pawn,
    Knight,
    Bishop,
    Rook,
    Queen,
    King,
}

/// The side that makes a move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    White,
    Black,
}

impl PieceKind {
    /// SAN letter for the piece. Pawns have none.
    pub fn san_letter(self) -> Option<char> {
        match self {
            Self::Pawn => None,
            Self::Knight => Some('N'),
            Self::Bishop => Some('B'),
            Self::Rook => Some('R'),
            Self::Queen => Some('Q'),
            Self::King => Some('K'),
        }
    }

    pub fn from_char(c: char) -> Option<Self> {
        match c.to_ascii_lowercase() {
            'p' => Some(Self::Pawn),
            'n' => Some(Self::Knight),
            'b' => Some(Self::Bishop),
            'r' => Some(Self::Rook),
            'q' => Some(Self::Queen),
            'k' => Some(Self::King),
            _ => None,
        }
    }
}

impl Side {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::White => "white",
            Self::Black => "black",
        }
    }

    pub fn opponent(self) -> Self {
        match self {
            Self::White => Self::Black,
            Self::Black => Self::White,
        }
    }
}

impl From<cozy_chess::Piece> for PieceKind {
    fn from(p: cozy_chess::Piece) -> Self {
        match p {
            cozy_chess::Piece::Pawn => Self::Pawn,
            cozy_chess::Piece::Knight => Self::Knight,
            cozy_chess::Piece::Bishop => Self::Bishop,
            cozy_chess::Piece::Rook => Self::Rook,
            cozy_chess::Piece::Queen => Self::Queen,
            cozy_chess::Piece::King => Self::King,
        }
    }
}

impl From<cozy_chess::Color> for Side {
    fn from(c: cozy_chess::Color) -> Self {
        match c {
            cozy_chess::Color::White => Self::White,
            cozy_chess::Color::Black => Self::Black,
        }
    }
}

impl From<Side> for cozy_chess::Color {
    fn from(s: Side) -> Self {
        match s {
            Side::White => Self::White,
            Side::Black => Self::Black,
        }
    }
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Move label as printed in a score sheet: move number plus the side that moved.
///
/// `12.` is White's twelfth move, `12...` is Black's reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Turn {
    pub move_number: u32,
    pub side: Side,
}

impl Turn {
    pub fn new(move_number: u32, side: Side) -> Self {
        Self { move_number, side }
    }

    /// Turn for a 1-indexed ply of a game that started with `start_side` to
    /// move at fullmove number `start_fullmove`.
    pub fn from_ply(ply: u32, start_side: Side, start_fullmove: u32) -> Self {
        debug_assert!(ply >= 1, "plies are 1-indexed");
        let offset = ply.saturating_sub(1) + u32::from(start_side == Side::Black);
        let side = if offset % 2 == 0 { Side::White } else { Side::Black };
        Self {
            move_number: start_fullmove.max(1) + offset / 2,
            side,
        }
    }
}

impl std::fmt::Display for Turn {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.side {
            Side::White => write!(f, "{}.", self.move_number),
            Side::Black => write!(f, "{}...", self.move_number),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_turn_from_standard_start() {
        assert_eq!(Turn::from_ply(1, Side::White, 1), Turn::new(1, Side::White));
        assert_eq!(Turn::from_ply(2, Side::White, 1), Turn::new(1, Side::Black));
        assert_eq!(Turn::from_ply(3, Side::White, 1), Turn::new(2, Side::White));
    }

    #[test]
    fn test_turn_from_black_to_move_start() {
        assert_eq!(Turn::from_ply(1, Side::Black, 7), Turn::new(7, Side::Black));
        assert_eq!(Turn::from_ply(2, Side::Black, 7), Turn::new(8, Side::White));
    }

    #[test]
    fn test_turn_display() {
        assert_eq!(Turn::new(12, Side::White).to_string(), "12.");
        assert_eq!(Turn::new(12, Side::Black).to_string(), "12...");
    }

    #[test]
    fn test_turn_ordering_follows_move_order() {
        assert!(Turn::new(1, Side::White) < Turn::new(1, Side::Black));
        assert!(Turn::new(1, Side::Black) < Turn::new(2, Side::White));
    }

    #[test]
    fn test_side_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Side::Black).unwrap(), "\"black\"");
    }

    proptest! {
        #[test]
        fn prop_turn_sides_alternate(ply in 1u32..500, black_first: bool, fullmove in 1u32..80) {
            let start = if black_first { Side::Black } else { Side::White };
            let a = Turn::from_ply(ply, start, fullmove);
            let b = Turn::from_ply(ply + 1, start, fullmove);
            prop_assert_eq!(b.side, a.side.opponent());
            prop_assert!(a < b);
        }
    }
}
