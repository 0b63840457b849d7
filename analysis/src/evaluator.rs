use chess::{convert_cozy_castling_to_uci, format_san, format_uci_move, AnalysisScore, Step};
use cozy_chess::{Board, Move};
use engine::{EngineError, PositionEvaluator, SearchBudget};

use crate::evaluation::MoveEvaluation;

/// Score one played move: search the position before it for the best
/// achievable score, then the position after it for what was actually kept.
///
/// Positions with no legal moves are scored without the engine: a delivered
/// mate is worth the full mate score to the mover, a stalemate is level.
pub async fn evaluate_move<E: PositionEvaluator + ?Sized>(
    engine: &mut E,
    step: &Step,
    budget: &SearchBudget,
    noise_floor_cp: u32,
) -> Result<MoveEvaluation, EngineError> {
    let best = engine.evaluate(&step.fen_before(), budget).await?;
    let score_best = best.score.to_cp();

    // The engine scores `after` for the opponent, so flip it back to the mover.
    let score_played = if step.is_checkmate() {
        -AnalysisScore::Mate(0).to_cp()
    } else if step.is_terminal() {
        0
    } else {
        -engine.evaluate(&step.fen_after(), budget).await?.score.to_cp()
    };

    let best_move = best.best_move;
    let played_best = best_move == Some(step.mv);
    let raw_loss = if played_best {
        0
    } else {
        score_best.saturating_sub(score_played).max(0) as u32
    };
    let loss = if raw_loss < noise_floor_cp { 0 } else { raw_loss };

    tracing::debug!(
        ply = step.ply,
        san = %step.san,
        score_best,
        score_played,
        loss,
        "Move evaluated"
    );

    Ok(MoveEvaluation {
        ply: step.ply,
        turn: step.turn,
        played_san: step.san.clone(),
        played_uci: step.uci(),
        best_san: best_move.map(|mv| format_san(&step.before, mv)),
        best_uci: best_move.map(|mv| uci_notation(&step.before, mv)),
        best_line: line_notation(&step.before, &best.pv),
        score_best,
        score_played,
        loss,
        depth: best.depth,
    })
}

fn uci_notation(board: &Board, mv: Move) -> String {
    format_uci_move(convert_cozy_castling_to_uci(board, mv))
}

/// Render a line in engine notation, stopping at the first unplayable move.
fn line_notation(board: &Board, line: &[Move]) -> Vec<String> {
    let mut board = board.clone();
    let mut out = Vec::with_capacity(line.len());
    for &mv in line {
        let notation = uci_notation(&board, mv);
        if board.try_play(mv).is_err() {
            break;
        }
        out.push(notation);
    }
    out
}
