//! Replays a [`Game`] one ply at a time.

use cozy_chess::{Board, Move};

use crate::fen::format_fen;
use crate::game::{Game, GameError};
use crate::pgn::san::format_san;
use crate::types::{Side, Turn};
use crate::uci::{convert_cozy_castling_to_uci, convert_uci_castling_to_cozy, format_uci_move};

/// One played move together with the positions around it.
#[derive(Debug, Clone)]
pub struct Step {
    /// 1-indexed ply within the game.
    pub ply: u32,
    pub turn: Turn,
    /// Side that played `mv` (side to move in `before`).
    pub side: Side,
    /// The move in board-model form (castling as king-takes-rook).
    pub mv: Move,
    pub san: String,
    pub before: Board,
    pub after: Board,
}

impl Step {
    pub fn fen_before(&self) -> String {
        format_fen(&self.before)
    }

    pub fn fen_after(&self) -> String {
        format_fen(&self.after)
    }

    /// The move in engine notation ("e1g1" for castling).
    pub fn uci(&self) -> String {
        format_uci_move(convert_cozy_castling_to_uci(&self.before, self.mv))
    }

    /// The side to move after this step has no legal moves.
    pub fn is_terminal(&self) -> bool {
        !has_legal_moves(&self.after)
    }

    pub fn is_checkmate(&self) -> bool {
        self.is_terminal() && !self.after.checkers().is_empty()
    }
}

/// Lazy, finite sequence of [`Step`]s over a game.
///
/// Yields `Err(GameError::IllegalMove)` once for the first move that cannot be
/// played and then ends.
pub struct PositionWalker<'a> {
    game: &'a Game,
    board: Board,
    next: usize,
    start_side: Side,
    start_fullmove: u32,
    failed: bool,
}

impl<'a> PositionWalker<'a> {
    pub(crate) fn new(game: &'a Game) -> Self {
        let board = game.start_board().clone();
        Self {
            game,
            start_side: board.side_to_move().into(),
            start_fullmove: u32::from(board.fullmove_number()),
            board,
            next: 0,
            failed: false,
        }
    }

    fn step(&mut self, mv: Move) -> Result<Step, GameError> {
        let ply = (self.next as u32) + 1;
        let legal = legal_moves(&self.board);
        let mv = convert_uci_castling_to_cozy(mv, &legal);
        if !legal.contains(&mv) {
            return Err(GameError::IllegalMove {
                ply,
                uci: format_uci_move(mv),
            });
        }

        let before = self.board.clone();
        let san = format_san(&before, mv);
        self.board.play_unchecked(mv);

        Ok(Step {
            ply,
            turn: Turn::from_ply(ply, self.start_side, self.start_fullmove),
            side: before.side_to_move().into(),
            mv,
            san,
            before,
            after: self.board.clone(),
        })
    }
}

impl Iterator for PositionWalker<'_> {
    type Item = Result<Step, GameError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        let mv = *self.game.moves().get(self.next)?;
        let result = self.step(mv);
        match result {
            Ok(_) => self.next += 1,
            Err(_) => self.failed = true,
        }
        Some(result)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        if self.failed {
            return (0, Some(0));
        }
        let remaining = self.game.len() - self.next;
        (0, Some(remaining))
    }
}

/// All legal moves in `board`.
pub(crate) fn legal_moves(board: &Board) -> Vec<Move> {
    let mut moves = Vec::new();
    board.generate_moves(|mvs| {
        moves.extend(mvs);
        false
    });
    moves
}

fn has_legal_moves(board: &Board) -> bool {
    // Returning true stops generation at the first piece with moves.
    board.generate_moves(|mvs| !mvs.is_empty())
}
