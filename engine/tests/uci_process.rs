//! Drives `StockfishEngine` against scripted UCI engines.
//!
//! The fake engines are small shell scripts run through `/bin/sh`. The test
//! against a real Stockfish is ignored by default.
//! Run with: `cargo test -p engine --test uci_process -- --ignored`

use std::path::PathBuf;
use std::time::Duration;

use chess::{format_uci_move, AnalysisScore, STANDARD_FEN};
use engine::{EngineConfig, EngineError, PositionEvaluator, SearchBudget, StockfishEngine};
use tempfile::TempDir;

/// Write a UCI engine that answers every `go` with `go_reply`.
fn fake_engine(go_reply: &str) -> (TempDir, EngineConfig) {
    let dir = tempfile::tempdir().unwrap();
    let script = dir.path().join("fakefish.sh");
    let body = format!(
        r#"while read -r line; do
  case "$line" in
    uci) echo "id name FakeFish"; echo "uciok" ;;
    isready) echo "readyok" ;;
    go*) {go_reply} ;;
    quit) exit 0 ;;
  esac
done
"#
    );
    std::fs::write(&script, body).unwrap();

    let config = EngineConfig {
        path: Some(PathBuf::from("/bin/sh")),
        args: vec![script.to_string_lossy().into_owned()],
        label: "fakefish".to_string(),
        position_timeout: Duration::from_millis(300),
        ..Default::default()
    };
    (dir, config)
}

fn depth(d: u8) -> SearchBudget {
    SearchBudget::Depth(d)
}

#[tokio::test]
async fn test_evaluate_reads_score_and_best_line() {
    let (_dir, config) =
        fake_engine(r#"echo "info depth 1 score cp 42 pv e2e4 e7e5"; echo "bestmove e2e4""#);
    let mut engine = StockfishEngine::spawn(config).await.unwrap();
    assert_eq!(engine.name(), Some("FakeFish"));

    let eval = engine.evaluate(STANDARD_FEN, &depth(1)).await.unwrap();
    assert_eq!(eval.score, AnalysisScore::Centipawns(42));
    assert_eq!(eval.best_move.map(format_uci_move).as_deref(), Some("e2e4"));
    assert_eq!(eval.pv.len(), 2);
    assert_eq!(eval.depth, Some(1));

    // The same process serves several positions in a row.
    let again = engine.evaluate(STANDARD_FEN, &depth(1)).await.unwrap();
    assert_eq!(again, eval);

    engine.shutdown().await;
}

#[tokio::test]
async fn test_mate_and_no_best_move() {
    let (_dir, config) = fake_engine(r#"echo "info depth 0 score mate 0"; echo "bestmove (none)""#);
    let mut engine = StockfishEngine::spawn(config).await.unwrap();

    // Fool's mate, White to move and mated.
    let fen = "rnb1kbnr/pppp1ppp/8/4p3/6Pq/5P2/PPPPP2P/RNBQKBNR w KQkq - 1 3";
    let eval = engine.evaluate(fen, &depth(5)).await.unwrap();
    assert_eq!(eval.score, AnalysisScore::Mate(0));
    assert!(eval.best_move.is_none());
    assert!(eval.pv.is_empty());

    engine.shutdown().await;
}

#[tokio::test]
async fn test_engine_castling_is_normalized() {
    let (_dir, config) =
        fake_engine(r#"echo "info depth 3 score cp 20 pv e1g1"; echo "bestmove e1g1""#);
    let mut engine = StockfishEngine::spawn(config).await.unwrap();

    let fen = "r3k2r/pppppppp/8/8/8/8/PPPPPPPP/R3K2R w KQkq - 0 1";
    let eval = engine.evaluate(fen, &depth(3)).await.unwrap();
    assert_eq!(eval.best_move.map(format_uci_move).as_deref(), Some("e1h1"));

    engine.shutdown().await;
}

#[tokio::test]
async fn test_silent_engine_times_out() {
    let (_dir, config) = fake_engine(":");
    let mut engine = StockfishEngine::spawn(config).await.unwrap();

    let err = engine.evaluate(STANDARD_FEN, &depth(20)).await.unwrap_err();
    assert_eq!(err, EngineError::Timeout(Duration::from_millis(300)));

    engine.shutdown().await;
}

#[tokio::test]
async fn test_restart_gives_a_working_engine() {
    let (_dir, config) =
        fake_engine(r#"echo "info depth 1 score cp -15 pv e2e4"; echo "bestmove e2e4""#);
    let mut engine = StockfishEngine::spawn(config).await.unwrap();

    engine.restart().await.unwrap();
    let eval = engine.evaluate(STANDARD_FEN, &depth(1)).await.unwrap();
    assert_eq!(eval.score, AnalysisScore::Centipawns(-15));

    engine.shutdown().await;
}

#[tokio::test]
async fn test_evaluate_after_shutdown_fails() {
    let (_dir, config) = fake_engine(r#"echo "bestmove e2e4""#);
    let mut engine = StockfishEngine::spawn(config).await.unwrap();
    engine.shutdown().await;
    engine.shutdown().await;

    let err = engine.evaluate(STANDARD_FEN, &depth(1)).await.unwrap_err();
    assert!(matches!(err, EngineError::Unavailable(_)));
}

#[tokio::test]
async fn test_shutdown_kills_engine_that_ignores_quit() {
    let dir = tempfile::tempdir().unwrap();
    let script = dir.path().join("stubborn.sh");
    let pid_file = dir.path().join("pid");
    std::fs::write(
        &script,
        format!(
            r#"echo $$ > "{}"
while read -r line; do
  case "$line" in
    uci) echo "uciok" ;;
    isready) echo "readyok" ;;
  esac
done
"#,
            pid_file.display()
        ),
    )
    .unwrap();
    let config = EngineConfig {
        path: Some(PathBuf::from("/bin/sh")),
        args: vec![script.to_string_lossy().into_owned()],
        ..Default::default()
    };
    let mut engine = StockfishEngine::spawn(config).await.unwrap();
    let pid = std::fs::read_to_string(&pid_file).unwrap().trim().to_string();
    let alive = |pid: &str| {
        std::process::Command::new("kill")
            .args(["-0", pid])
            .stderr(std::process::Stdio::null())
            .status()
            .map(|s| s.success())
            .unwrap_or(false)
    };
    assert!(alive(&pid));

    let started = std::time::Instant::now();
    engine.shutdown().await;
    let took = started.elapsed();
    assert!(took >= Duration::from_millis(900), "quit grace period skipped: {:?}", took);
    assert!(took < Duration::from_secs(3), "shutdown took {:?}", took);
    assert!(!alive(&pid), "engine process {} survived shutdown", pid);
}

#[tokio::test]
async fn test_missing_binary_is_unavailable() {
    let config = EngineConfig {
        path: Some(PathBuf::from("/definitely/not/here/stockfish")),
        ..Default::default()
    };
    let err = StockfishEngine::spawn(config).await.err().unwrap();
    assert!(matches!(err, EngineError::Unavailable(_)));
}

#[tokio::test]
async fn test_engine_that_exits_is_unavailable() {
    let dir = tempfile::tempdir().unwrap();
    let script = dir.path().join("dead.sh");
    std::fs::write(&script, "exit 0\n").unwrap();
    let config = EngineConfig {
        path: Some(PathBuf::from("/bin/sh")),
        args: vec![script.to_string_lossy().into_owned()],
        ..Default::default()
    };
    let err = StockfishEngine::spawn(config).await.err().unwrap();
    assert!(matches!(err, EngineError::Unavailable(_)));
}

#[tokio::test]
#[ignore = "requires Stockfish"]
async fn test_real_stockfish_start_position() {
    let Some(path) = engine::find_stockfish_path() else {
        eprintln!("Skipping test: Stockfish not available");
        return;
    };
    let mut engine = StockfishEngine::spawn(EngineConfig {
        path: Some(path),
        threads: Some(1),
        hash_mb: Some(16),
        ..Default::default()
    })
    .await
    .unwrap();

    let name = engine.name().unwrap_or_default().to_lowercase();
    assert!(name.contains("stockfish"), "unexpected engine name: {}", name);

    let eval = engine.evaluate(STANDARD_FEN, &depth(10)).await.unwrap();
    assert!(eval.best_move.is_some());
    assert!(eval.depth.unwrap_or(0) >= 10);
    match eval.score {
        AnalysisScore::Centipawns(cp) => assert!(cp.abs() < 150, "start position scored {}", cp),
        other => panic!("unexpected mate score {:?}", other),
    }

    engine.shutdown().await;
}
