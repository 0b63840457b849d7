//! Game analysis pipeline.
//!
//! An [`Analysis`] walks a [`chess::Game`], asks a
//! [`engine::PositionEvaluator`] about the position before and after every
//! move, records a [`MoveEvaluation`] per move and reports progress while it
//! runs. Once completed, [`Analysis::categorize`] sorts the moves into
//! blunders, mistakes and inaccuracies per side.

pub mod classify;
pub mod config;
pub mod error;
pub mod evaluation;
pub mod evaluator;
pub mod orchestrator;
pub mod progress;

pub use classify::{classify, filter, Classification, Severity, SideBuckets, SideSummary, Thresholds};
pub use config::AnalysisConfig;
pub use error::AnalysisError;
pub use evaluation::MoveEvaluation;
pub use evaluator::evaluate_move;
pub use orchestrator::{Analysis, AnalysisState};
pub use progress::{Progress, ProgressTracker};
