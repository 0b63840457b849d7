//! UCI engine adapter.
//!
//! [`PositionEvaluator`] is the seam the analysis pipeline talks to;
//! [`StockfishEngine`] implements it over a child process speaking UCI.

pub mod stockfish;
pub mod uci;

pub use stockfish::{find_stockfish_path, EngineConfig, StockfishEngine};
pub use uci::{parse_uci_message, UciError, UciMessage};

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use chess::AnalysisScore;
use cozy_chess::Move;

/// Commands sent to the engine
#[derive(Debug, Clone)]
pub enum EngineCommand {
    Uci,
    IsReady,
    SetOption { name: String, value: Option<String> },
    Position { fen: String },
    Go(SearchBudget),
    Stop,
    Quit,
}

impl fmt::Display for EngineCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Uci => write!(f, "uci"),
            Self::IsReady => write!(f, "isready"),
            Self::SetOption { name, value: Some(value) } => {
                write!(f, "setoption name {} value {}", name, value)
            }
            Self::SetOption { name, value: None } => write!(f, "setoption name {}", name),
            Self::Position { fen } => write!(f, "position fen {}", fen),
            Self::Go(SearchBudget::Depth(depth)) => write!(f, "go depth {}", depth),
            Self::Go(SearchBudget::MoveTime(t)) => write!(f, "go movetime {}", t.as_millis()),
            Self::Stop => write!(f, "stop"),
            Self::Quit => write!(f, "quit"),
        }
    }
}

/// Events received from the engine
#[derive(Debug, Clone)]
pub enum EngineEvent {
    /// `uciok` or `readyok`
    Ready,
    Name(String),
    /// `None` when the engine answered `bestmove (none)`.
    BestMove(Option<Move>),
    Info(EngineInfo),
}

/// Engine analysis information
#[derive(Debug, Clone, Default)]
pub struct EngineInfo {
    pub depth: Option<u8>,
    pub seldepth: Option<u8>,
    pub time_ms: Option<u64>,
    pub nodes: Option<u64>,
    pub nps: Option<u64>,
    pub score: Option<AnalysisScore>,
    pub pv: Vec<Move>, // Principal variation
    pub multipv: Option<u8>,
}

/// How long the engine may search a single position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchBudget {
    Depth(u8),
    MoveTime(Duration),
}

impl Default for SearchBudget {
    fn default() -> Self {
        Self::MoveTime(Duration::from_millis(1000))
    }
}

/// Result of searching one position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Evaluation {
    /// From the perspective of the side to move in the searched position.
    pub score: AnalysisScore,
    pub best_move: Option<Move>,
    /// Best line, starting with `best_move`, castling in board-model form.
    pub pv: Vec<Move>,
    pub depth: Option<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EngineError {
    #[error("Engine unavailable: {0}")]
    Unavailable(String),
    #[error("Engine did not answer within {0:?}")]
    Timeout(Duration),
    #[error("Engine protocol error: {0}")]
    Protocol(String),
}

/// Something that can score chess positions.
///
/// One instance serves one analysis at a time; calls are sequential.
#[async_trait]
pub trait PositionEvaluator: Send {
    /// Search the position given as FEN within `budget`.
    async fn evaluate(&mut self, fen: &str, budget: &SearchBudget)
        -> Result<Evaluation, EngineError>;

    /// Replace the underlying engine with a fresh one.
    async fn restart(&mut self) -> Result<(), EngineError>;

    /// Stop the engine for good. Safe to call more than once.
    async fn shutdown(&mut self);
}

#[async_trait]
impl<T: PositionEvaluator + ?Sized> PositionEvaluator for Box<T> {
    async fn evaluate(
        &mut self,
        fen: &str,
        budget: &SearchBudget,
    ) -> Result<Evaluation, EngineError> {
        (**self).evaluate(fen, budget).await
    }

    async fn restart(&mut self) -> Result<(), EngineError> {
        (**self).restart().await
    }

    async fn shutdown(&mut self) {
        (**self).shutdown().await
    }
}
