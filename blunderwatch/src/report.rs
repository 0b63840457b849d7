//! Rendering finished analyses for the terminal.

use analysis::{Classification, MoveEvaluation, Severity, SideSummary};
use chess::Side;
use serde::Serialize;

/// Plain-text report: each side's moves at or above `min`, then a summary line per side.
pub fn render_text(classification: &Classification, min: Severity) -> String {
    let mut out = String::from("Here are the most interesting moves I could find:\n");

    for side in [Side::White, Side::Black] {
        out.push_str(&format!("\nImportant moves by {}:\n", side_name(side)));
        let moves = classification.side(side).at_least(min);
        if moves.is_empty() {
            out.push_str("  none\n");
        }
        for eval in moves {
            out.push_str("  ");
            out.push_str(&eval.render(&classification.thresholds));
            out.push('\n');
        }
    }

    out.push('\n');
    for side in [Side::White, Side::Black] {
        out.push_str(&summary_line(side, &classification.side(side).summary));
        out.push('\n');
    }
    out
}

#[derive(Serialize)]
struct JsonReport<'a> {
    evaluations: &'a [MoveEvaluation],
    classification: &'a Classification,
}

/// Every evaluation plus the classification, pretty-printed.
pub fn render_json(
    evaluations: &[MoveEvaluation],
    classification: &Classification,
) -> serde_json::Result<String> {
    serde_json::to_string_pretty(&JsonReport {
        evaluations,
        classification,
    })
}

fn summary_line(side: Side, summary: &SideSummary) -> String {
    format!(
        "{}: {} over {}, accuracy {:.1}%",
        side_name(side),
        [
            count(summary.blunders, "blunder", "blunders"),
            count(summary.mistakes, "mistake", "mistakes"),
            count(summary.inaccuracies, "inaccuracy", "inaccuracies"),
        ]
        .join(", "),
        count(summary.moves, "move", "moves"),
        summary.accuracy
    )
}

fn count(n: u32, one: &str, many: &str) -> String {
    format!("{} {}", n, if n == 1 { one } else { many })
}

fn side_name(side: Side) -> &'static str {
    match side {
        Side::White => "White",
        Side::Black => "Black",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use analysis::{classify, Thresholds};
    use chess::Turn;

    fn eval(ply: u32, san: &str, best: &str, score_played: i32, loss: u32) -> MoveEvaluation {
        MoveEvaluation {
            ply,
            turn: Turn::from_ply(ply, Side::White, 1),
            played_san: san.into(),
            played_uci: format!("played{}", ply),
            best_san: Some(best.into()),
            best_uci: Some(format!("best{}", ply)),
            best_line: Vec::new(),
            score_best: score_played + loss as i32,
            score_played,
            loss,
            depth: Some(10),
        }
    }

    fn game() -> Vec<MoveEvaluation> {
        vec![
            eval(1, "e4", "d4", 30, 0),
            eval(2, "f6", "e5", -90, 60),
            eval(3, "Qh5", "Nf3", -350, 380),
            eval(4, "Nc6", "g6", -120, 120),
        ]
    }

    #[test]
    fn test_blunders_only_by_default() {
        let classification = classify(&game(), &Thresholds::default());
        let text = render_text(&classification, Severity::Blunder);
        assert!(text.starts_with("Here are the most interesting moves I could find:\n"));
        assert!(text.contains("Important moves by White:\n  2. Qh5?? (-3.50, best: Nf3)\n"));
        assert!(text.contains("Important moves by Black:\n  none\n"));
        assert!(!text.contains("Nc6"));
    }

    #[test]
    fn test_all_severities_in_move_order() {
        let classification = classify(&game(), &Thresholds::default());
        let text = render_text(&classification, Severity::Inaccuracy);
        let f6 = text.find("1... f6?!").unwrap();
        let nc6 = text.find("2... Nc6?").unwrap();
        assert!(f6 < nc6);
    }

    #[test]
    fn test_summary_lines() {
        let classification = classify(&game(), &Thresholds::default());
        let text = render_text(&classification, Severity::Blunder);
        assert!(text.contains("White: 1 blunder, 0 mistakes, 0 inaccuracies over 2 moves"));
        assert!(text.contains("Black: 0 blunders, 1 mistake, 1 inaccuracy over 2 moves"));
    }

    #[test]
    fn test_json_has_both_parts() {
        let evals = game();
        let classification = classify(&evals, &Thresholds::default());
        let json: serde_json::Value =
            serde_json::from_str(&render_json(&evals, &classification).unwrap()).unwrap();
        assert_eq!(json["evaluations"].as_array().unwrap().len(), 4);
        assert_eq!(json["classification"]["white"]["blunders"][0]["played_san"], "Qh5");
        assert_eq!(json["classification"]["thresholds"]["blunder"], 300);
    }
}
