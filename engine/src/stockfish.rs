use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use chess::{convert_uci_castling_to_cozy, fen::parse_fen};
use cozy_chess::{Board, Move};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStdin, ChildStdout};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::uci::{parse_uci_message, UciMessage};
use crate::{
    EngineCommand, EngineError, EngineEvent, EngineInfo, Evaluation, PositionEvaluator,
    SearchBudget,
};

/// Time allowed for the `uci`/`isready` handshake.
const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(10);

/// Grace period for `quit` before the process is killed.
const QUIT_TIMEOUT: Duration = Duration::from_secs(1);

/// Configuration for one engine process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Executable to run. Searched for when `None`.
    pub path: Option<PathBuf>,
    pub args: Vec<String>,
    pub threads: Option<u32>,
    pub hash_mb: Option<u32>,
    /// Name used in logs.
    pub label: String,
    /// Deadline for a single position search.
    pub position_timeout: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            path: None,
            args: Vec::new(),
            threads: None,
            hash_mb: None,
            label: "stockfish".to_string(),
            position_timeout: Duration::from_secs(30),
        }
    }
}

/// A UCI engine running as a child process.
pub struct StockfishEngine {
    config: EngineConfig,
    process: Child,
    stdin: ChildStdin,
    event_rx: mpsc::Receiver<EngineEvent>,
    reader: JoinHandle<()>,
    name: Option<String>,
    closed: bool,
}

impl StockfishEngine {
    /// Start the engine and complete the UCI handshake.
    #[tracing::instrument(level = "info", skip(config), fields(label = %config.label))]
    pub async fn spawn(config: EngineConfig) -> Result<Self, EngineError> {
        let path = match &config.path {
            Some(path) => path.clone(),
            None => find_stockfish_path()
                .ok_or_else(|| EngineError::Unavailable("Stockfish not found".to_string()))?,
        };
        tracing::info!("Spawning engine at {:?}", path);

        let mut process = tokio::process::Command::new(&path)
            .args(&config.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                tracing::error!("Failed to spawn engine: {}", e);
                EngineError::Unavailable(format!("failed to spawn {}: {}", path.display(), e))
            })?;

        let stdin = process
            .stdin
            .take()
            .ok_or_else(|| EngineError::Unavailable("engine has no stdin".to_string()))?;
        let stdout = process
            .stdout
            .take()
            .ok_or_else(|| EngineError::Unavailable("engine has no stdout".to_string()))?;

        let (event_tx, event_rx) = mpsc::channel::<EngineEvent>(64);
        let reader = tokio::spawn(read_engine_output(stdout, event_tx));

        let mut engine = Self {
            config,
            process,
            stdin,
            event_rx,
            reader,
            name: None,
            closed: false,
        };

        // A half-initialized engine must not leak on the error path.
        if let Err(e) = engine.handshake().await {
            engine.shutdown_process().await;
            return Err(e);
        }

        tracing::info!(
            engine = engine.name.as_deref().unwrap_or("unknown"),
            "Engine initialized"
        );
        Ok(engine)
    }

    /// `id name` reported during the handshake.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    async fn handshake(&mut self) -> Result<(), EngineError> {
        self.send(EngineCommand::Uci).await?;
        self.wait_ready("uciok").await?;

        if let Some(threads) = self.config.threads {
            let threads = threads.clamp(1, 1024);
            self.send(EngineCommand::SetOption {
                name: "Threads".to_string(),
                value: Some(threads.to_string()),
            })
            .await?;
        }
        if let Some(hash_mb) = self.config.hash_mb {
            let hash_mb = hash_mb.clamp(1, 32768);
            self.send(EngineCommand::SetOption {
                name: "Hash".to_string(),
                value: Some(hash_mb.to_string()),
            })
            .await?;
        }

        self.send(EngineCommand::IsReady).await?;
        self.wait_ready("readyok").await
    }

    async fn wait_ready(&mut self, expected: &str) -> Result<(), EngineError> {
        let rx = &mut self.event_rx;
        let name = &mut self.name;
        let wait = async {
            while let Some(event) = rx.recv().await {
                match event {
                    EngineEvent::Ready => return Ok(()),
                    EngineEvent::Name(n) => *name = Some(n),
                    _ => {}
                }
            }
            Err(EngineError::Unavailable(format!(
                "engine exited before sending {}",
                expected
            )))
        };

        match tokio::time::timeout(HANDSHAKE_TIMEOUT, wait).await {
            Ok(result) => result,
            Err(_) => {
                tracing::error!("Timeout waiting for {}", expected);
                Err(EngineError::Protocol(format!(
                    "no {} within {:?}",
                    expected, HANDSHAKE_TIMEOUT
                )))
            }
        }
    }

    async fn send(&mut self, cmd: EngineCommand) -> Result<(), EngineError> {
        let line = cmd.to_string();
        tracing::trace!("UCI >> {}", line);
        self.stdin
            .write_all(format!("{}\n", line).as_bytes())
            .await
            .map_err(|e| EngineError::Unavailable(format!("write failed: {}", e)))?;
        self.stdin
            .flush()
            .await
            .map_err(|e| EngineError::Unavailable(format!("flush failed: {}", e)))
    }

    async fn search(&mut self, fen: &str, budget: &SearchBudget) -> Result<Evaluation, EngineError> {
        let board =
            parse_fen(fen).map_err(|_| EngineError::Protocol(format!("invalid FEN: {}", fen)))?;

        // Leftovers from an aborted search belong to a different position.
        while self.event_rx.try_recv().is_ok() {}

        self.send(EngineCommand::Position {
            fen: fen.to_string(),
        })
        .await?;
        self.send(EngineCommand::Go(*budget)).await?;

        let deadline = self.config.position_timeout;
        let outcome = tokio::time::timeout(deadline, collect_search(&mut self.event_rx)).await;
        let (best_move, info) = match outcome {
            Ok(result) => result?,
            Err(_) => {
                tracing::warn!(fen, "Engine search timed out, sending stop");
                if self.send(EngineCommand::Stop).await.is_ok() {
                    // Swallow the late bestmove so it cannot answer the next search.
                    let _ = tokio::time::timeout(QUIT_TIMEOUT, collect_search(&mut self.event_rx)).await;
                }
                return Err(EngineError::Timeout(deadline));
            }
        };

        let score = info
            .score
            .ok_or_else(|| EngineError::Protocol(format!("no score reported for {}", fen)))?;
        let best_move = best_move.and_then(|mv| normalize_line(&board, &[mv]).first().copied());
        let pv = if info.pv.is_empty() {
            best_move.into_iter().collect()
        } else {
            normalize_line(&board, &info.pv)
        };

        Ok(Evaluation {
            score,
            best_move,
            pv,
            depth: info.depth,
        })
    }

    async fn shutdown_process(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        let _ = self.send(EngineCommand::Quit).await;
        if tokio::time::timeout(QUIT_TIMEOUT, self.process.wait())
            .await
            .is_err()
        {
            tracing::warn!(label = %self.config.label, "Engine ignored quit, killing it");
            let _ = self.process.kill().await;
        }
        self.reader.abort();
        tracing::debug!(label = %self.config.label, "Engine stopped");
    }
}

#[async_trait]
impl PositionEvaluator for StockfishEngine {
    async fn evaluate(
        &mut self,
        fen: &str,
        budget: &SearchBudget,
    ) -> Result<Evaluation, EngineError> {
        if self.closed {
            return Err(EngineError::Unavailable("engine has been shut down".to_string()));
        }
        self.search(fen, budget).await
    }

    async fn restart(&mut self) -> Result<(), EngineError> {
        tracing::info!(label = %self.config.label, "Restarting engine");
        self.shutdown_process().await;
        let fresh = Self::spawn(self.config.clone()).await?;
        *self = fresh;
        Ok(())
    }

    async fn shutdown(&mut self) {
        self.shutdown_process().await;
    }
}

/// Wait for `bestmove`, keeping the last scored main-line `info`.
async fn collect_search(
    rx: &mut mpsc::Receiver<EngineEvent>,
) -> Result<(Option<Move>, EngineInfo), EngineError> {
    let mut last = EngineInfo::default();
    while let Some(event) = rx.recv().await {
        match event {
            EngineEvent::Info(info) if info.score.is_some() && info.multipv.unwrap_or(1) == 1 => {
                last = info;
            }
            EngineEvent::BestMove(mv) => return Ok((mv, last)),
            _ => {}
        }
    }
    Err(EngineError::Unavailable(
        "engine closed its output during search".to_string(),
    ))
}

/// Reader task: parse engine stdout lines into events until EOF.
async fn read_engine_output(stdout: ChildStdout, event_tx: mpsc::Sender<EngineEvent>) {
    let mut reader = BufReader::new(stdout);
    let mut line = String::new();

    loop {
        line.clear();
        match reader.read_line(&mut line).await {
            Ok(0) => {
                tracing::debug!("Engine stdout EOF");
                break;
            }
            Ok(_) => {
                let trimmed = line.trim();
                tracing::trace!("UCI << {}", trimmed);

                let event = match parse_uci_message(trimmed) {
                    Ok(UciMessage::UciOk | UciMessage::ReadyOk) => EngineEvent::Ready,
                    Ok(UciMessage::Id { name, value }) if name == "name" => EngineEvent::Name(value),
                    Ok(UciMessage::BestMove { mv, .. }) => EngineEvent::BestMove(mv),
                    Ok(UciMessage::Info(info)) => EngineEvent::Info(info),
                    Ok(_) => continue,
                    Err(e) => {
                        tracing::trace!("Skipping engine line: {}", e);
                        continue;
                    }
                };

                if event_tx.send(event).await.is_err() {
                    break;
                }
            }
            Err(e) => {
                tracing::error!("Error reading engine stdout: {}", e);
                break;
            }
        }
    }
}

/// Replay an engine line on `board`, rewriting UCI castling to the board
/// model's form. Stops at the first move that is not legal.
fn normalize_line(board: &Board, moves: &[Move]) -> Vec<Move> {
    let mut board = board.clone();
    let mut line = Vec::with_capacity(moves.len());
    for &mv in moves {
        let mut legal = Vec::new();
        board.generate_moves(|mvs| {
            legal.extend(mvs);
            false
        });
        let mv = convert_uci_castling_to_cozy(mv, &legal);
        if !legal.contains(&mv) {
            break;
        }
        board.play_unchecked(mv);
        line.push(mv);
    }
    line
}

/// Find a Stockfish executable in common locations or on `PATH`.
pub fn find_stockfish_path() -> Option<PathBuf> {
    const CANDIDATES: [&str; 4] = [
        "/usr/local/bin/stockfish",
        "/usr/bin/stockfish",
        "/opt/homebrew/bin/stockfish",
        "/usr/games/stockfish",
    ];

    if let Some(found) = CANDIDATES.iter().map(Path::new).find(|p| p.is_file()) {
        return Some(found.to_path_buf());
    }

    let path_var = std::env::var_os("PATH")?;
    std::env::split_paths(&path_var)
        .map(|dir| dir.join("stockfish"))
        .find(|p| p.is_file())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chess::{format_uci_move, parse_uci_move};

    #[test]
    fn test_normalize_line_converts_castling() {
        let board: Board = "r3k2r/pppppppp/8/8/8/8/PPPPPPPP/R3K2R w KQkq - 0 1"
            .parse()
            .unwrap();
        let line = [parse_uci_move("e1g1").unwrap(), parse_uci_move("e8c8").unwrap()];
        let normalized: Vec<String> = normalize_line(&board, &line)
            .into_iter()
            .map(format_uci_move)
            .collect();
        assert_eq!(normalized, ["e1h1", "e8a8"]);
    }

    #[test]
    fn test_normalize_line_truncates_at_illegal_move() {
        let board = Board::default();
        let line = [
            parse_uci_move("e2e4").unwrap(),
            parse_uci_move("e2e4").unwrap(),
        ];
        assert_eq!(normalize_line(&board, &line).len(), 1);
    }

    #[test]
    fn test_default_config() {
        let config = EngineConfig::default();
        assert!(config.path.is_none());
        assert_eq!(config.position_timeout, Duration::from_secs(30));
    }
}
