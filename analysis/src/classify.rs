//! Severity buckets over completed move evaluations.

use chess::Side;
use serde::{Deserialize, Serialize};

use crate::error::AnalysisError;
use crate::evaluation::MoveEvaluation;

/// Loss (centipawns) at which a move becomes an inaccuracy, mistake or blunder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Thresholds {
    pub blunder: u32,
    pub mistake: u32,
    pub inaccuracy: u32,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            blunder: 300,
            mistake: 100,
            inaccuracy: 50,
        }
    }
}

impl Thresholds {
    /// Tiers must be positive and ordered `blunder >= mistake >= inaccuracy`.
    pub fn validate(&self) -> Result<(), AnalysisError> {
        if self.inaccuracy == 0 {
            return Err(AnalysisError::InvalidConfig(
                "inaccuracy threshold must be positive".to_string(),
            ));
        }
        if self.blunder < self.mistake || self.mistake < self.inaccuracy {
            return Err(AnalysisError::InvalidConfig(format!(
                "thresholds out of order: blunder {} / mistake {} / inaccuracy {}",
                self.blunder, self.mistake, self.inaccuracy
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Fine,
    Inaccuracy,
    Mistake,
    Blunder,
}

impl Severity {
    /// The three tiers worth reporting, worst first.
    pub const FLAGGED: [Severity; 3] = [Severity::Blunder, Severity::Mistake, Severity::Inaccuracy];

    pub fn of(loss: u32, thresholds: &Thresholds) -> Self {
        if loss >= thresholds.blunder {
            Self::Blunder
        } else if loss >= thresholds.mistake {
            Self::Mistake
        } else if loss >= thresholds.inaccuracy {
            Self::Inaccuracy
        } else {
            Self::Fine
        }
    }

    /// Annotation suffix as used in PGN movetext.
    pub fn glyph(self) -> &'static str {
        match self {
            Self::Fine => "",
            Self::Inaccuracy => "?!",
            Self::Mistake => "?",
            Self::Blunder => "??",
        }
    }

    /// NAG (Numeric Annotation Glyph) for PGN export.
    pub fn nag(self) -> Option<u8> {
        match self {
            Self::Fine => None,
            Self::Inaccuracy => Some(6),
            Self::Mistake => Some(2),
            Self::Blunder => Some(4),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Fine => "fine",
            Self::Inaccuracy => "inaccuracy",
            Self::Mistake => "mistake",
            Self::Blunder => "blunder",
        }
    }
}

/// Per-side totals.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SideSummary {
    pub moves: u32,
    pub average_loss: f64,
    /// 0-100, higher is better.
    pub accuracy: f64,
    pub inaccuracies: u32,
    pub mistakes: u32,
    pub blunders: u32,
}

impl Default for SideSummary {
    fn default() -> Self {
        Self {
            moves: 0,
            average_loss: 0.0,
            accuracy: 100.0,
            inaccuracies: 0,
            mistakes: 0,
            blunders: 0,
        }
    }
}

/// One side's flagged moves, each bucket in move order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SideBuckets {
    pub blunders: Vec<MoveEvaluation>,
    pub mistakes: Vec<MoveEvaluation>,
    pub inaccuracies: Vec<MoveEvaluation>,
    pub summary: SideSummary,
}

impl SideBuckets {
    /// Moves of exactly `severity`. Fine moves are not bucketed.
    pub fn bucket(&self, severity: Severity) -> &[MoveEvaluation] {
        match severity {
            Severity::Fine => &[],
            Severity::Inaccuracy => &self.inaccuracies,
            Severity::Mistake => &self.mistakes,
            Severity::Blunder => &self.blunders,
        }
    }

    /// Every flagged move at or above `min`, in move order.
    pub fn at_least(&self, min: Severity) -> Vec<&MoveEvaluation> {
        let mut moves: Vec<&MoveEvaluation> = Severity::FLAGGED
            .iter()
            .filter(|s| **s >= min)
            .flat_map(|s| self.bucket(*s))
            .collect();
        moves.sort_by_key(|m| m.ply);
        moves
    }

    fn push(&mut self, severity: Severity, eval: &MoveEvaluation) {
        match severity {
            Severity::Fine => {}
            Severity::Inaccuracy => self.inaccuracies.push(eval.clone()),
            Severity::Mistake => self.mistakes.push(eval.clone()),
            Severity::Blunder => self.blunders.push(eval.clone()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Classification {
    pub thresholds: Thresholds,
    pub white: SideBuckets,
    pub black: SideBuckets,
}

impl Classification {
    pub fn side(&self, side: Side) -> &SideBuckets {
        match side {
            Side::White => &self.white,
            Side::Black => &self.black,
        }
    }

    pub fn bucket(&self, side: Side, severity: Severity) -> &[MoveEvaluation] {
        self.side(side).bucket(severity)
    }
}

/// Sort evaluations into per-side severity buckets.
///
/// Pure: the same input always yields the same classification.
pub fn classify(evals: &[MoveEvaluation], thresholds: &Thresholds) -> Classification {
    let mut white = SideBuckets::default();
    let mut black = SideBuckets::default();

    for eval in evals {
        let buckets = match eval.side() {
            Side::White => &mut white,
            Side::Black => &mut black,
        };
        buckets.push(eval.severity(thresholds), eval);
    }

    white.summary = summarize(evals, thresholds, Side::White);
    black.summary = summarize(evals, thresholds, Side::Black);

    Classification {
        thresholds: *thresholds,
        white,
        black,
    }
}

/// Lazily select one side's moves of exactly `severity`, in move order.
pub fn filter<'a>(
    evals: &'a [MoveEvaluation],
    thresholds: &'a Thresholds,
    side: Side,
    severity: Severity,
) -> impl Iterator<Item = &'a MoveEvaluation> + 'a {
    evals
        .iter()
        .filter(move |e| e.side() == side && e.severity(thresholds) == severity)
}

fn summarize(evals: &[MoveEvaluation], thresholds: &Thresholds, side: Side) -> SideSummary {
    let mut summary = SideSummary::default();
    let mut total_loss = 0.0;

    for eval in evals.iter().filter(|e| e.side() == side) {
        summary.moves += 1;
        total_loss += f64::from(eval.loss.min(1000));
        match eval.severity(thresholds) {
            Severity::Fine => {}
            Severity::Inaccuracy => summary.inaccuracies += 1,
            Severity::Mistake => summary.mistakes += 1,
            Severity::Blunder => summary.blunders += 1,
        }
    }

    if summary.moves > 0 {
        summary.average_loss = total_loss / f64::from(summary.moves);
        summary.accuracy = accuracy(summary.average_loss);
    }
    summary
}

/// Accuracy percentage for an average centipawn loss (losses capped at 1000).
pub fn accuracy(average_loss: f64) -> f64 {
    let accuracy = 103.1668 * (-0.006 * average_loss).exp() - 3.1668;
    accuracy.clamp(0.0, 100.0)
}
