//! Engine evaluation scores.

use serde::{Deserialize, Serialize};

/// Centipawn value of "side to move has been checkmated".
pub const MATE_SCORE: i32 = 30000;

/// Any centipawn value at or beyond this magnitude encodes a forced mate.
pub const MATE_THRESHOLD: i32 = 20000;

/// Mate distances beyond this encode as this distance, keeping every mate
/// score at or above [`MATE_THRESHOLD`].
pub const MAX_MATE_DISTANCE: u32 = 99;

/// Engine evaluation score.
///
/// Centipawns: positive = side-to-move is better.
/// Mate: positive N = side-to-move mates in N moves,
/// negative N = side-to-move gets mated in N moves,
/// zero = side-to-move is checkmated on the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AnalysisScore {
    Centipawns(i32),
    Mate(i32),
}

impl AnalysisScore {
    pub fn display(&self) -> String {
        match self {
            Self::Centipawns(cp) => format!("{:+.2}", *cp as f64 / 100.0),
            Self::Mate(m) => {
                if *m > 0 {
                    format!("+M{}", m)
                } else {
                    format!("-M{}", m.unsigned_abs())
                }
            }
        }
    }

    /// Convert to centipawns for comparison. Mate scores use large values,
    /// shorter mates further from zero; distances past
    /// [`MAX_MATE_DISTANCE`] all share the smallest mate value.
    pub fn to_cp(&self) -> i32 {
        match self {
            Self::Centipawns(cp) => (*cp).clamp(-(MATE_THRESHOLD - 1), MATE_THRESHOLD - 1),
            Self::Mate(m) => {
                let distance = m.unsigned_abs().min(MAX_MATE_DISTANCE) as i32;
                if *m > 0 {
                    MATE_SCORE - distance * 100
                } else {
                    -MATE_SCORE + distance * 100
                }
            }
        }
    }

    /// Flip to the other side's perspective.
    ///
    /// `Mate(0)` has no mirror in this encoding; use `-score.to_cp()` when the
    /// perspective of the side that delivered mate is needed.
    pub fn negate(&self) -> Self {
        match self {
            Self::Centipawns(cp) => Self::Centipawns(cp.saturating_neg()),
            Self::Mate(m) => Self::Mate(m.saturating_neg()),
        }
    }

    pub fn is_mate(&self) -> bool {
        matches!(self, Self::Mate(_))
    }
}

impl std::fmt::Display for AnalysisScore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display())
    }
}

/// Render a centipawn value produced by [`AnalysisScore::to_cp`].
///
/// Mate-encoded values print as `#N` (mover mates in N) or `#-N` (mover is
/// mated in N); `#` alone is an already delivered mate.
pub fn format_cp(cp: i32) -> String {
    if cp >= MATE_THRESHOLD {
        match (MATE_SCORE - cp) / 100 {
            0 => "#".to_string(),
            n => format!("#{}", n),
        }
    } else if cp <= -MATE_THRESHOLD {
        match (MATE_SCORE + cp) / 100 {
            0 => "#-0".to_string(),
            n => format!("#-{}", n),
        }
    } else {
        format!("{:+.2}", cp as f64 / 100.0)
    }
}
