use std::fmt;

use chess::{format_cp, Side, Turn};
use serde::{Deserialize, Serialize};

use crate::classify::{Severity, Thresholds};

/// Engine verdict on one played move.
///
/// Scores are centipawns from the mover's point of view, with forced mates
/// encoded as described in [`chess::AnalysisScore::to_cp`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveEvaluation {
    /// 1-indexed ply within the game.
    pub ply: u32,
    pub turn: Turn,
    pub played_san: String,
    pub played_uci: String,
    /// Engine's preferred move in the position before, if it named one.
    pub best_san: Option<String>,
    pub best_uci: Option<String>,
    /// Engine's principal variation from the position before, UCI notation.
    pub best_line: Vec<String>,
    /// Score of the position before the move, assuming best play.
    pub score_best: i32,
    /// Score of the position after the played move.
    pub score_played: i32,
    /// `score_best - score_played`, never negative.
    pub loss: u32,
    pub depth: Option<u8>,
}

impl MoveEvaluation {
    pub fn side(&self) -> Side {
        self.turn.side
    }

    /// The played move is the one the engine recommended.
    pub fn is_best(&self) -> bool {
        self.best_uci.as_deref() == Some(self.played_uci.as_str())
    }

    pub fn severity(&self, thresholds: &Thresholds) -> Severity {
        Severity::of(self.loss, thresholds)
    }

    /// Score after the move from White's point of view.
    pub fn score_after_white(&self) -> i32 {
        match self.side() {
            Side::White => self.score_played,
            Side::Black => -self.score_played,
        }
    }

    /// `12... Nf6?? (-3.10, best: Nc6)`: the move annotated for `thresholds`,
    /// the score it left the mover with and the engine's preference.
    pub fn render(&self, thresholds: &Thresholds) -> String {
        let mut line = format!(
            "{} {}{} ({}",
            self.turn,
            self.played_san,
            self.severity(thresholds).glyph(),
            format_cp(self.score_played)
        );
        match &self.best_san {
            Some(best) if !self.is_best() => {
                line.push_str(", best: ");
                line.push_str(best);
                line.push(')');
            }
            _ => line.push(')'),
        }
        line
    }
}

/// Rendered with the default thresholds.
impl fmt::Display for MoveEvaluation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render(&Thresholds::default()))
    }
}
