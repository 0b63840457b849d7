//! Lifecycle of a single game analysis.

use std::sync::Arc;

use chess::Game;
use engine::{PositionEvaluator, StockfishEngine};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::Instrument;
use uuid::Uuid;

use crate::classify::{classify, Classification, Thresholds};
use crate::config::AnalysisConfig;
use crate::error::AnalysisError;
use crate::evaluation::MoveEvaluation;
use crate::evaluator::evaluate_move;
use crate::progress::{Progress, ProgressTracker};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnalysisState {
    Created,
    Running,
    Completed,
    Failed(AnalysisError),
}

impl AnalysisState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed(_))
    }
}

#[derive(Debug)]
struct Status {
    state: AnalysisState,
    evaluations: Vec<MoveEvaluation>,
}

struct Inner {
    id: Uuid,
    game: Game,
    config: AnalysisConfig,
    status: watch::Sender<Status>,
    tracker: ProgressTracker,
    cancel: watch::Sender<bool>,
}

/// One game being analyzed.
///
/// Cheap to clone; every clone observes the same analysis. A single worker
/// (the task calling [`Analysis::run`]) writes results, any number of
/// readers may poll or await it.
#[derive(Clone)]
pub struct Analysis {
    inner: Arc<Inner>,
}

impl Analysis {
    pub fn new(game: Game, config: AnalysisConfig) -> Result<Self, AnalysisError> {
        if game.is_empty() {
            return Err(AnalysisError::InvalidGame("game has no moves".to_string()));
        }
        config.validate()?;

        let total = u32::try_from(game.len())
            .map_err(|_| AnalysisError::InvalidGame("game is too long".to_string()))?;
        let (status, _) = watch::channel(Status {
            state: AnalysisState::Created,
            evaluations: Vec::with_capacity(game.len()),
        });
        let (cancel, _) = watch::channel(false);

        Ok(Self {
            inner: Arc::new(Inner {
                id: Uuid::new_v4(),
                game,
                config,
                status,
                tracker: ProgressTracker::new(total),
                cancel,
            }),
        })
    }

    pub fn id(&self) -> Uuid {
        self.inner.id
    }

    pub fn game(&self) -> &Game {
        &self.inner.game
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.inner.config
    }

    pub fn state(&self) -> AnalysisState {
        self.inner.status.borrow().state.clone()
    }

    /// The failure, once the analysis has failed.
    pub fn error(&self) -> Option<AnalysisError> {
        match &self.inner.status.borrow().state {
            AnalysisState::Failed(e) => Some(e.clone()),
            _ => None,
        }
    }

    /// Evaluations recorded so far, in move order.
    pub fn evaluations(&self) -> Vec<MoveEvaluation> {
        self.inner.status.borrow().evaluations.clone()
    }

    pub fn percentage(&self) -> u8 {
        self.inner.tracker.percentage()
    }

    /// Every move has been evaluated and the analysis has completed.
    pub fn is_done(&self) -> bool {
        self.inner.tracker.is_done()
    }

    /// Progress updates, one per evaluated move.
    pub fn progress(&self) -> watch::Receiver<Progress> {
        self.inner.tracker.subscribe()
    }

    /// Wait until the analysis has completed or failed.
    pub async fn wait(&self) -> AnalysisState {
        let mut rx = self.inner.status.subscribe();
        let result = rx.wait_for(|s| s.state.is_terminal()).await;
        match result {
            Ok(status) => status.state.clone(),
            Err(_) => self.state(),
        }
    }

    /// Classify with the thresholds this analysis was configured with.
    pub fn categorize(&self) -> Result<Classification, AnalysisError> {
        self.categorize_with(&self.inner.config.thresholds)
    }

    pub fn categorize_with(&self, thresholds: &Thresholds) -> Result<Classification, AnalysisError> {
        thresholds.validate()?;
        let status = self.inner.status.borrow();
        if status.state != AnalysisState::Completed {
            return Err(AnalysisError::NotReady);
        }
        Ok(classify(&status.evaluations, thresholds))
    }

    /// Stop the analysis.
    ///
    /// Before it starts, the analysis fails immediately. While running, the
    /// worker abandons the current engine search, shuts the engine down and
    /// then fails. Finished analyses are left alone.
    pub fn cancel(&self) {
        let failed_early = self.inner.status.send_if_modified(|s| {
            if s.state == AnalysisState::Created {
                s.state = AnalysisState::Failed(AnalysisError::Cancelled);
                true
            } else {
                false
            }
        });
        if failed_early {
            tracing::info!(id = %self.inner.id, "Analysis cancelled before start");
        }
        self.inner.cancel.send_replace(true);
    }

    /// Run the analysis to the end on the current task using `engine`.
    ///
    /// The engine is shut down before this returns, whatever the outcome.
    pub async fn run<E: PositionEvaluator>(
        &self,
        mut engine: E,
    ) -> Result<Vec<MoveEvaluation>, AnalysisError> {
        let started = self.inner.status.send_if_modified(|s| {
            if s.state == AnalysisState::Created {
                s.state = AnalysisState::Running;
                true
            } else {
                false
            }
        });
        if !started {
            engine.shutdown().await;
            return Err(AnalysisError::AlreadyStarted);
        }

        let span = tracing::info_span!("analysis", id = %self.inner.id, plies = self.inner.game.len());
        async move {
            tracing::info!("Analysis started");
            let outcome = self.drive(&mut engine).await;
            engine.shutdown().await;

            match outcome {
                Ok(()) => {
                    self.inner
                        .status
                        .send_modify(|s| s.state = AnalysisState::Completed);
                    // Completed is visible before progress reaches 100 %.
                    self.inner.tracker.advance();
                    tracing::info!("Analysis complete");
                    Ok(self.evaluations())
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Analysis failed");
                    self.inner
                        .status
                        .send_modify(|s| s.state = AnalysisState::Failed(e.clone()));
                    Err(e)
                }
            }
        }
        .instrument(span)
        .await
    }

    /// Run the analysis on its own tokio task.
    ///
    /// A worker that panics fails the analysis instead of leaving it running.
    pub fn spawn<E: PositionEvaluator + 'static>(
        &self,
        engine: E,
    ) -> JoinHandle<Result<Vec<MoveEvaluation>, AnalysisError>> {
        let this = self.clone();
        self.supervise(tokio::spawn(async move { this.run(engine).await }))
    }

    /// Start the configured UCI engine and run the analysis with it.
    ///
    /// An engine that cannot be started fails the analysis.
    pub async fn run_with_stockfish(&self) -> Result<Vec<MoveEvaluation>, AnalysisError> {
        if self.state() != AnalysisState::Created {
            return Err(AnalysisError::AlreadyStarted);
        }
        match StockfishEngine::spawn(self.inner.config.engine.clone()).await {
            Ok(engine) => self.run(engine).await,
            Err(e) => {
                let err = AnalysisError::from(e);
                let failed = self.inner.status.send_if_modified(|s| {
                    if s.state == AnalysisState::Created {
                        s.state = AnalysisState::Failed(err.clone());
                        true
                    } else {
                        false
                    }
                });
                tracing::error!(id = %self.inner.id, error = %err, "Could not start engine");
                if failed {
                    Err(err)
                } else {
                    Err(AnalysisError::AlreadyStarted)
                }
            }
        }
    }

    /// [`Analysis::run_with_stockfish`] on its own tokio task, supervised
    /// like [`Analysis::spawn`].
    pub fn spawn_with_stockfish(&self) -> JoinHandle<Result<Vec<MoveEvaluation>, AnalysisError>> {
        let this = self.clone();
        self.supervise(tokio::spawn(async move { this.run_with_stockfish().await }))
    }

    /// Await `worker` on a second task and record its death as a failure.
    ///
    /// The engine owned by a panicked worker is dropped during unwinding,
    /// which kills its process.
    fn supervise(
        &self,
        worker: JoinHandle<Result<Vec<MoveEvaluation>, AnalysisError>>,
    ) -> JoinHandle<Result<Vec<MoveEvaluation>, AnalysisError>> {
        let this = self.clone();
        tokio::spawn(async move {
            match worker.await {
                Ok(result) => result,
                Err(e) => {
                    let err =
                        AnalysisError::EngineUnavailable(format!("analysis worker died: {}", e));
                    tracing::error!(id = %this.inner.id, error = %e, "Analysis worker died");
                    this.inner.status.send_if_modified(|s| {
                        if s.state.is_terminal() {
                            false
                        } else {
                            s.state = AnalysisState::Failed(err.clone());
                            true
                        }
                    });
                    Err(err)
                }
            }
        })
    }

    /// Evaluate every move. The tracker is advanced for all but the last
    /// move; `run` does that after publishing completion.
    async fn drive<E: PositionEvaluator>(&self, engine: &mut E) -> Result<(), AnalysisError> {
        let config = &self.inner.config;
        let total = self.inner.game.len();
        let mut cancel_rx = self.inner.cancel.subscribe();
        let mut restarted = false;

        for step in self.inner.game.walk() {
            let step = step?;

            let evaluation = loop {
                let attempt = tokio::select! {
                    biased;
                    _ = cancelled(&mut cancel_rx) => return Err(AnalysisError::Cancelled),
                    result = evaluate_move(engine, &step, &config.budget, config.noise_floor_cp) => result,
                };

                match attempt {
                    Ok(evaluation) => break evaluation,
                    Err(e) if config.retry_engine && !restarted => {
                        restarted = true;
                        tracing::warn!(ply = step.ply, error = %e, "Engine failed, restarting once");
                        tokio::select! {
                            biased;
                            _ = cancelled(&mut cancel_rx) => return Err(AnalysisError::Cancelled),
                            result = engine.restart() => result?,
                        }
                    }
                    Err(e) => return Err(e.into()),
                }
            };

            tracing::info!(
                ply = step.ply,
                total,
                san = %evaluation.played_san,
                loss = evaluation.loss,
                "Analyzed ply {}/{}",
                step.ply,
                total
            );

            self.inner
                .status
                .send_modify(|s| s.evaluations.push(evaluation));
            if (step.ply as usize) < total {
                self.inner.tracker.advance();
            }
        }

        Ok(())
    }
}

impl std::fmt::Debug for Analysis {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Analysis")
            .field("id", &self.inner.id)
            .field("state", &self.state())
            .field("progress", &self.inner.tracker.snapshot())
            .finish()
    }
}

/// Resolves once the cancel flag is raised.
async fn cancelled(rx: &mut watch::Receiver<bool>) {
    if rx.wait_for(|c| *c).await.is_err() {
        std::future::pending::<()>().await;
    }
}
