//! Plain-text presentation of the countdown, evaluations and history.

use chrono::Local;
use std::fmt::Write;

use crate::evaluator::{EvaluationOutcome, EvaluationResult};
use crate::history::HistoryEntry;

/// `MM:SS`, both zero-padded.
pub fn format_countdown(secs: u64) -> String {
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

/// True while the countdown is running but below `threshold_secs`.
pub fn in_warning_band(secs: u64, threshold_secs: u64) -> bool {
    secs > 0 && secs < threshold_secs
}

pub fn format_band(score: Option<f64>) -> String {
    match score {
        Some(score) => score.to_string(),
        None => "N/A".to_string(),
    }
}

pub fn render_evaluation(outcome: &EvaluationOutcome) -> String {
    match outcome {
        EvaluationOutcome::Parsed(result) => render_result(result),
        EvaluationOutcome::RawFallback { raw_text } => raw_text.clone(),
    }
}

fn section(out: &mut String, title: &str, body: &str) {
    if body.trim().is_empty() {
        return;
    }
    let _ = write!(out, "\n{title}\n{}\n{body}\n", "-".repeat(title.len()));
}

fn render_result(result: &EvaluationResult) -> String {
    let mut out = format!("Band Score: {}\n", format_band(result.band_score));
    section(&mut out, "Task Achievement", &result.task_achievement);
    section(&mut out, "Coherence and Cohesion", &result.coherence_cohesion);
    section(&mut out, "Lexical Resource", &result.lexical_resource);
    section(
        &mut out,
        "Grammatical Range and Accuracy",
        &result.grammatical_range,
    );

    if !result.errors.is_empty() {
        let mut body = String::new();
        for (i, note) in result.errors.iter().enumerate() {
            if i > 0 {
                body.push('\n');
            }
            let _ = writeln!(body, "Error: {}", note.mistake);
            let _ = writeln!(body, "Explanation: {}", note.explanation);
            let _ = write!(body, "Correction: {}", note.correction);
            body.push('\n');
        }
        section(&mut out, "Errors Found", body.trim_end());
    }

    if !result.improvements.is_empty() {
        let body = result
            .improvements
            .iter()
            .map(|s| format!("- {s}"))
            .collect::<Vec<_>>()
            .join("\n");
        section(&mut out, "Improvement Suggestions", &body);
    }

    section(&mut out, "Corrected Version", &result.corrected_version);
    out
}

/// Task text cut to `max_chars` characters followed by `...`.
pub fn excerpt(text: &str, max_chars: usize) -> String {
    let cut: String = text.chars().take(max_chars).collect();
    format!("{cut}...")
}

pub fn render_history(entries: &[HistoryEntry], excerpt_chars: usize) -> String {
    if entries.is_empty() {
        return "No practice history yet.\n".to_string();
    }

    let mut out = String::from("Practice History\n");
    for entry in entries {
        let date = entry.timestamp.with_timezone(&Local).format("%Y-%m-%d %H:%M");
        let _ = write!(
            out,
            "\n{date}  Band: {}\nTask Type: {}\nTask: {}\n",
            format_band(entry.band_score),
            entry.task_kind.label(),
            excerpt(&entry.task_content, excerpt_chars),
        );
    }
    out
}
