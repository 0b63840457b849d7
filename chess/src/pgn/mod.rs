//! Minimal PGN reader: tag pairs plus main-line movetext.

mod parser;
pub mod san;

pub use parser::{parse_pgn, GameResult, PgnError, PgnGame, PgnMove};
