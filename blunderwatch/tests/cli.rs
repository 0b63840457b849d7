//! Runs the `blunderwatch` binary end to end against a scripted UCI engine.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};

use tempfile::TempDir;

const SCHOLARS_MATE: &str = r#"[Event "Casual"]
[White "Alice"]
[Black "Bob"]

1. e4 e5 2. Bc4 Nc6 3. Qh5 Nf6 4. Qxf7# 1-0
"#;

/// An engine that finds every position level and has no move to suggest.
fn level_engine(dir: &Path) -> PathBuf {
    let script = dir.join("levelfish");
    std::fs::write(
        &script,
        r#"#!/bin/sh
while read -r line; do
  case "$line" in
    uci) echo "id name LevelFish"; echo "uciok" ;;
    isready) echo "readyok" ;;
    go*) echo "info depth 1 score cp 0"; echo "bestmove (none)" ;;
    quit) exit 0 ;;
  esac
done
"#,
    )
    .unwrap();
    let status = Command::new("chmod").arg("+x").arg(&script).status().unwrap();
    assert!(status.success());
    script
}

fn config_file(dir: &Path, json: &str) -> PathBuf {
    let path = dir.join("config.json");
    std::fs::write(&path, json).unwrap();
    path
}

fn blunderwatch(config: &Path, args: &[&str], stdin: &str) -> Output {
    let mut child = Command::new(env!("CARGO_BIN_EXE_blunderwatch"))
        .arg("--config")
        .arg(config)
        .args(args)
        .env_remove("RUST_LOG")
        .env_remove("BLUNDERWATCH_ENGINE_PATH")
        .env_remove("BLUNDERWATCH_LOG_LEVEL")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .unwrap();
    // A run that fails early may close stdin before reading it.
    let _ = child.stdin.take().unwrap().write_all(stdin.as_bytes());
    child.wait_with_output().unwrap()
}

fn setup() -> (TempDir, PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let engine = level_engine(dir.path());
    let config = config_file(
        dir.path(),
        &format!(
            r#"{{"stockfish_binary_path": "{}", "time": 0.05, "position_timeout_secs": 5}}"#,
            engine.display()
        ),
    );
    (dir, config)
}

#[test]
fn test_analyze_and_check_engine_with_scripted_engine() {
    let (_dir, config) = setup();

    let out = blunderwatch(&config, &["check-engine"], "");
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.contains("LevelFish is working"), "{}", stdout);

    let out = blunderwatch(&config, &["analyze", "-"], SCHOLARS_MATE);
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.contains("Important moves by White:\n  none\n"), "{}", stdout);
    assert!(stdout.contains("Important moves by Black:\n  none\n"), "{}", stdout);
    assert!(String::from_utf8_lossy(&out.stderr).contains("Progress: 100%"));

    let out = blunderwatch(&config, &["analyze", "--json"], SCHOLARS_MATE);
    assert!(out.status.success());
    let json: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    let evaluations = json["evaluations"].as_array().unwrap();
    assert_eq!(evaluations.len(), 7);
    assert_eq!(evaluations[6]["played_san"], "Qxf7#");
}

#[test]
fn test_rejects_text_that_is_not_a_game() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_file(dir.path(), "{}");

    let out = blunderwatch(&config, &["analyze"], "1. e4 e5 2. Kxe8");
    assert!(!out.status.success());
    assert!(String::from_utf8_lossy(&out.stderr).contains("doesn't look like a PGN"));
}

#[test]
fn test_missing_engine_gives_generic_failure() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_file(
        dir.path(),
        r#"{"stockfish_binary_path": "/nonexistent/stockfish"}"#,
    );

    let out = blunderwatch(&config, &["analyze"], SCHOLARS_MATE);
    assert!(!out.status.success());
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("An error occurred while analyzing your game."), "{}", stderr);
}

#[test]
fn test_bad_config_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_file(dir.path(), r#"{"time": -2}"#);

    let out = blunderwatch(&config, &["analyze"], SCHOLARS_MATE);
    assert!(!out.status.success());
    assert!(String::from_utf8_lossy(&out.stderr).contains("invalid configuration"));
}

#[test]
fn test_config_file_is_logged_once_logging_is_up() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_file(dir.path(), r#"{"log_level": "debug"}"#);

    let out = blunderwatch(&config, &["analyze"], "not a game");
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("Loaded config file"), "{}", stderr);
    assert!(stderr.contains("config.json"), "{}", stderr);
}
