//! Chess game model for Blunderwatch.
//!
//! Wraps cozy-chess with the pieces the analysis pipeline needs: an immutable
//! [`Game`], a restartable [`PositionWalker`], engine [`AnalysisScore`]s, the
//! [`Turn`] labels used in reports, and a small PGN movetext reader.

pub mod fen;
pub mod game;
pub mod pgn;
pub mod score;
pub mod types;
pub mod uci;
pub mod walker;

pub use fen::STANDARD_FEN;
pub use game::{Game, GameError, StartPosition};
pub use pgn::san::{format_san, parse_san, SanError};
pub use pgn::{parse_pgn, PgnError, PgnGame};
pub use score::{format_cp, AnalysisScore, MATE_SCORE, MATE_THRESHOLD, MAX_MATE_DISTANCE};
pub use types::{PieceKind, Side, Turn};
pub use uci::{
    convert_cozy_castling_to_uci, convert_uci_castling_to_cozy, format_uci_move, parse_uci_move,
    UciMoveError,
};
pub use walker::{PositionWalker, Step};
