//! Response evaluation.
//!
//! The model is asked for JSON but nothing enforces it, so parsing is two
//! steps: find the first balanced `{...}` region in the reply, then try to
//! decode it. Anything that fails either step falls back to the raw text.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::CompletionError;
use crate::integrations::CompletionClient;
use crate::prompts;
use crate::task::Task;

/// One mistake called out by the examiner.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ErrorNote {
    #[serde(rename = "error", alias = "mistake")]
    pub mistake: String,
    pub explanation: String,
    pub correction: String,
}

/// Parsed scoring output. Every field is optional on input.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EvaluationResult {
    /// Passed through as received; granularity is not checked.
    pub band_score: Option<f64>,
    pub task_achievement: String,
    pub coherence_cohesion: String,
    pub lexical_resource: String,
    pub grammatical_range: String,
    pub errors: Vec<ErrorNote>,
    pub improvements: Vec<String>,
    pub corrected_version: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EvaluationOutcome {
    Parsed(EvaluationResult),
    /// The reply held no decodable JSON; show it as-is.
    RawFallback { raw_text: String },
}

impl EvaluationOutcome {
    pub fn band_score(&self) -> Option<f64> {
        match self {
            EvaluationOutcome::Parsed(result) => result.band_score,
            EvaluationOutcome::RawFallback { .. } => None,
        }
    }
}

/// First balanced `{...}` region of `text`.
///
/// Braces inside JSON string literals (including escaped quotes) do not count
/// toward the balance.
pub fn extract_json_region(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in text[start..].char_indices() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    let end = start + offset + ch.len_utf8();
                    return Some(&text[start..end]);
                }
            }
            _ => {}
        }
    }
    None
}

/// Best-effort decode of the model's reply.
pub fn parse_evaluation(text: &str) -> EvaluationOutcome {
    let parsed = extract_json_region(text)
        .and_then(|region| match serde_json::from_str::<EvaluationResult>(region) {
            Ok(result) => Some(result),
            Err(e) => {
                debug!("evaluation JSON did not decode: {e}");
                None
            }
        });
    match parsed {
        Some(result) => EvaluationOutcome::Parsed(result),
        None => EvaluationOutcome::RawFallback {
            raw_text: text.to_string(),
        },
    }
}

pub struct Evaluator {
    client: Arc<dyn CompletionClient>,
}

impl Evaluator {
    pub fn new(client: Arc<dyn CompletionClient>) -> Self {
        Self { client }
    }

    pub fn build_prompt(task: &Task, response: &str, word_count: usize) -> String {
        prompts::evaluation_prompt(task.kind(), task.content(), response, word_count)
    }

    /// Score `response` against `task`. Remote failures are errors; an
    /// unparseable reply is a `RawFallback` outcome.
    pub async fn evaluate(
        &self,
        secret: &str,
        task: &Task,
        response: &str,
        word_count: usize,
    ) -> Result<EvaluationOutcome, CompletionError> {
        let prompt = Self::build_prompt(task, response, word_count);
        let reply = self.client.complete(secret, &prompt).await?;
        let outcome = parse_evaluation(&reply);
        match &outcome {
            EvaluationOutcome::Parsed(result) => {
                info!(band_score = ?result.band_score, "evaluation parsed")
            }
            EvaluationOutcome::RawFallback { .. } => info!("evaluation returned unstructured text"),
        }
        Ok(outcome)
    }
}
