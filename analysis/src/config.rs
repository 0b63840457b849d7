use std::time::Duration;

use engine::{EngineConfig, SearchBudget};

use crate::classify::Thresholds;
use crate::error::AnalysisError;

/// Everything an [`crate::Analysis`] needs besides the game.
///
/// Built by the caller and passed in; nothing here reads the environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisConfig {
    pub engine: EngineConfig,
    pub budget: SearchBudget,
    pub thresholds: Thresholds,
    /// Restart the engine once and retry the move when it fails mid-analysis.
    pub retry_engine: bool,
    /// Losses below this many centipawns count as zero. `0` keeps every loss.
    pub noise_floor_cp: u32,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            engine: EngineConfig::default(),
            budget: SearchBudget::default(),
            thresholds: Thresholds::default(),
            retry_engine: true,
            noise_floor_cp: 0,
        }
    }
}

impl AnalysisConfig {
    pub fn validate(&self) -> Result<(), AnalysisError> {
        self.thresholds.validate()?;

        match self.budget {
            SearchBudget::Depth(0) => {
                return Err(AnalysisError::InvalidConfig(
                    "search depth must be at least 1".to_string(),
                ))
            }
            SearchBudget::MoveTime(t) if t.is_zero() => {
                return Err(AnalysisError::InvalidConfig(
                    "move time must be positive".to_string(),
                ))
            }
            SearchBudget::MoveTime(t) if t >= self.engine.position_timeout => {
                return Err(AnalysisError::InvalidConfig(format!(
                    "move time {:?} does not fit in the position timeout {:?}",
                    t, self.engine.position_timeout
                )))
            }
            _ => {}
        }

        if self.engine.position_timeout < Duration::from_millis(10) {
            return Err(AnalysisError::InvalidConfig(
                "position timeout is too short".to_string(),
            ));
        }

        Ok(())
    }
}
