use cozy_chess::{Board, Move};

use crate::fen::{format_fen, parse_fen, STANDARD_FEN};
use crate::types::Side;
use crate::uci::parse_uci_move;
use crate::walker::PositionWalker;

/// A game to analyze: a starting position plus the moves actually played.
///
/// Immutable once built. Legality is only checked while walking, so an
/// inconsistent move list surfaces as [`GameError::IllegalMove`] at the ply
/// where it goes wrong.
#[derive(Debug, Clone)]
pub struct Game {
    start_position: StartPosition,
    start_board: Board,
    moves: Vec<Move>,
}

/// Starting position of the game
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum StartPosition {
    #[default]
    Standard,
    Fen(String),
}

impl StartPosition {
    pub fn fen(&self) -> &str {
        match self {
            Self::Standard => STANDARD_FEN,
            Self::Fen(fen) => fen,
        }
    }

    fn board(&self) -> Result<Board, GameError> {
        match self {
            Self::Standard => Ok(Board::default()),
            Self::Fen(fen) => parse_fen(fen)
                .map_err(|_| GameError::InvalidGame(format!("unparsable start FEN: {}", fen))),
        }
    }
}

impl Game {
    /// Build a game from an already parsed move list.
    pub fn new(start_position: StartPosition, moves: Vec<Move>) -> Result<Self, GameError> {
        if moves.is_empty() {
            return Err(GameError::InvalidGame("game has no moves".to_string()));
        }
        let start_board = start_position.board()?;
        Ok(Self {
            start_position,
            start_board,
            moves,
        })
    }

    /// Build a game from UCI move strings ("e2e4", "e7e8q", "e1g1").
    pub fn from_uci<S: AsRef<str>>(
        start_position: StartPosition,
        moves: &[S],
    ) -> Result<Self, GameError> {
        let moves = moves
            .iter()
            .map(|s| {
                parse_uci_move(s.as_ref()).map_err(|e| GameError::InvalidGame(e.to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(start_position, moves)
    }

    pub fn start_position(&self) -> &StartPosition {
        &self.start_position
    }

    pub fn start_board(&self) -> &Board {
        &self.start_board
    }

    pub fn start_fen(&self) -> String {
        format_fen(&self.start_board)
    }

    pub fn start_side(&self) -> Side {
        self.start_board.side_to_move().into()
    }

    pub fn moves(&self) -> &[Move] {
        &self.moves
    }

    /// Number of plies in the game.
    pub fn len(&self) -> usize {
        self.moves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.moves.is_empty()
    }

    /// Replay the game from its start. Every call starts over.
    pub fn walk(&self) -> PositionWalker<'_> {
        PositionWalker::new(self)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GameError {
    #[error("Invalid game: {0}")]
    InvalidGame(String),
    #[error("Illegal move {uci} at ply {ply}")]
    IllegalMove { ply: u32, uci: String },
}
