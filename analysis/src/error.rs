use std::time::Duration;

use chess::GameError;
use engine::EngineError;

/// Why an analysis could not be created, run or read.
///
/// Stored in [`crate::AnalysisState::Failed`], so it is cheap to clone.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AnalysisError {
    #[error("Invalid game: {0}")]
    InvalidGame(String),
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("Illegal move {uci} at ply {ply}")]
    IllegalMove { ply: u32, uci: String },
    #[error("Engine unavailable: {0}")]
    EngineUnavailable(String),
    #[error("Engine did not answer within {0:?}")]
    EngineTimeout(Duration),
    #[error("Analysis was cancelled")]
    Cancelled,
    #[error("Analysis has not completed")]
    NotReady,
    #[error("Analysis was already started")]
    AlreadyStarted,
}

impl From<GameError> for AnalysisError {
    fn from(e: GameError) -> Self {
        match e {
            GameError::InvalidGame(msg) => Self::InvalidGame(msg),
            GameError::IllegalMove { ply, uci } => Self::IllegalMove { ply, uci },
        }
    }
}

impl From<EngineError> for AnalysisError {
    fn from(e: EngineError) -> Self {
        match e {
            EngineError::Unavailable(msg) => Self::EngineUnavailable(msg),
            EngineError::Timeout(after) => Self::EngineTimeout(after),
            // An engine that breaks protocol is as good as gone.
            EngineError::Protocol(msg) => Self::EngineUnavailable(msg),
        }
    }
}
