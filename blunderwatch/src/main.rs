//! blunderwatch: find the blunders in a chess game.
//!
//! Reads a game as PGN, has a UCI engine (Stockfish) score every move and
//! prints the moves that gave away the most, grouped by side.
//!
//! # Subcommands
//!
//! - **`analyze`**: analyze one game from a file or stdin. Progress is shown
//!   on stderr while the engine works; Ctrl-C cancels the run and stops the
//!   engine.
//! - **`check-engine`**: start the configured engine and score the initial
//!   position, to verify the setup.
//!
//! Settings come from a JSON config file (see [`config`] for the lookup order)
//! with the command line flags taking priority.

use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use analysis::{classify, Analysis, AnalysisError, Severity};
use anyhow::Context;
use chess::{format_san, parse_pgn, STANDARD_FEN};
use clap::{Args, Parser, Subcommand};
use engine::{PositionEvaluator, SearchBudget, StockfishEngine};

mod config;
mod logging;
mod report;

use config::Config;

/// Top-level CLI arguments.
#[derive(Parser)]
#[command(name = "blunderwatch", version, about = "Find the blunders in a chess game")]
struct Cli {
    /// Config file to use instead of the default lookup.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// UCI engine executable. Overrides the config file and environment.
    #[arg(long, global = true)]
    engine: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze a game and report its blunders.
    Analyze(AnalyzeArgs),

    /// Start the engine and score the initial position.
    CheckEngine,
}

#[derive(Args)]
struct AnalyzeArgs {
    /// PGN file to read. Reads stdin when omitted or `-`.
    pgn: Option<PathBuf>,

    /// Search every position to this depth.
    #[arg(long, conflicts_with = "movetime")]
    depth: Option<u8>,

    /// Search every position for this many milliseconds.
    #[arg(long)]
    movetime: Option<u64>,

    /// Report mistakes and inaccuracies as well as blunders.
    #[arg(long)]
    all: bool,

    /// Print every evaluation and the classification as JSON.
    #[arg(long)]
    json: bool,
}

/// Failures reported to the user by message only.
#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("That doesn't look like a PGN to me: {0}")]
    NotPgn(String),

    #[error("Analysis cancelled.")]
    Cancelled,

    /// Details are logged, the user gets the short version.
    #[error("An error occurred while analyzing your game.")]
    AnalysisFailed,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(engine) = &cli.engine {
        config.stockfish_binary_path = Some(engine.clone());
    }
    let _log_guard = logging::init(&config.log_level, config.log_dir.as_deref());
    match &config.source {
        Some(path) => tracing::debug!(path = %path.display(), "Loaded config file"),
        None => tracing::debug!("No config file found, using defaults"),
    }

    match cli.command {
        Commands::Analyze(args) => analyze(config, args).await,
        Commands::CheckEngine => check_engine(config).await,
    }
}

async fn analyze(mut config: Config, args: AnalyzeArgs) -> anyhow::Result<()> {
    if let Some(depth) = args.depth {
        config.depth = Some(depth);
    }
    if let Some(ms) = args.movetime {
        config.depth = None;
        config.time = Duration::from_millis(ms).as_secs_f64();
    }
    let analysis_config = config.to_analysis_config()?;

    let text = read_input(args.pgn.as_deref())?;
    let pgn = parse_pgn(&text).map_err(|e| {
        tracing::info!(error = %e, "Rejected input");
        CliError::NotPgn(e.to_string())
    })?;
    if let Some(white) = pgn.tag("White") {
        tracing::info!(white, black = pgn.tag("Black").unwrap_or("?"), "Game loaded");
    }
    let game = pgn
        .into_game()
        .map_err(|e| CliError::NotPgn(e.to_string()))?;

    let analysis = Analysis::new(game, analysis_config)?;
    let handle = analysis.spawn_with_stockfish();
    show_progress(&analysis).await;
    let result = handle.await.context("analysis task panicked")?;
    eprintln!("\rAnalyzing your game now! Progress: {}%", analysis.percentage());

    let evaluations = match result {
        Ok(evaluations) => evaluations,
        // Cancelling before the worker started surfaces as AlreadyStarted.
        Err(_) if analysis.error() == Some(AnalysisError::Cancelled) => {
            return Err(CliError::Cancelled.into())
        }
        Err(e) => {
            tracing::error!(id = %analysis.id(), error = %e, "Analysis failed");
            return Err(CliError::AnalysisFailed.into());
        }
    };

    let classification = classify(&evaluations, &analysis.config().thresholds);
    let mut stdout = std::io::stdout().lock();
    if args.json {
        writeln!(stdout, "{}", report::render_json(&evaluations, &classification)?)?;
    } else {
        let min = if args.all {
            Severity::Inaccuracy
        } else {
            Severity::Blunder
        };
        write!(stdout, "{}", report::render_text(&classification, min))?;
    }
    Ok(())
}

/// Redraw the progress line until the analysis ends. Ctrl-C cancels it.
async fn show_progress(analysis: &Analysis) {
    let mut progress = analysis.progress();
    let mut shown = None;

    loop {
        let percentage = progress.borrow_and_update().percentage();
        if shown != Some(percentage) {
            eprint!("\rAnalyzing your game now! Progress: {}%", percentage);
            shown = Some(percentage);
        }

        tokio::select! {
            _ = analysis.wait() => break,
            changed = progress.changed() => {
                if changed.is_err() {
                    break;
                }
            }
            signal = tokio::signal::ctrl_c() => {
                if let Err(e) = signal {
                    tracing::warn!(error = %e, "Cannot listen for Ctrl-C");
                    analysis.wait().await;
                    break;
                }
                eprintln!("\nCancelling...");
                analysis.cancel();
            }
        }
    }
}

fn read_input(path: Option<&Path>) -> anyhow::Result<String> {
    let mut text = String::new();
    match path {
        Some(path) if path != Path::new("-") => {
            text = std::fs::read_to_string(path)
                .with_context(|| format!("cannot read {}", path.display()))?;
        }
        _ => {
            std::io::stdin()
                .read_to_string(&mut text)
                .context("cannot read stdin")?;
        }
    }
    Ok(text)
}

async fn check_engine(config: Config) -> anyhow::Result<()> {
    let analysis_config = config.to_analysis_config()?;
    let budget: SearchBudget = analysis_config.budget;

    let mut engine = StockfishEngine::spawn(analysis_config.engine)
        .await
        .context("engine failed to start")?;
    let name = engine.name().unwrap_or("unnamed engine").to_string();
    let result = engine.evaluate(STANDARD_FEN, &budget).await;
    engine.shutdown().await;
    let evaluation = result.context("engine failed to score the initial position")?;

    let board = chess::fen::parse_fen(STANDARD_FEN)?;
    let best = evaluation
        .best_move
        .map(|mv| format_san(&board, mv))
        .unwrap_or_else(|| "-".to_string());
    println!(
        "{} is working: initial position {} (best: {}, depth {})",
        name,
        evaluation.score.display(),
        best,
        evaluation
            .depth
            .map_or_else(|| "?".to_string(), |d| d.to_string())
    );
    Ok(())
}
