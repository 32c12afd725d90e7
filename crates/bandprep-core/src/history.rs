//! Practice history, newest first.
//!
//! The whole sequence is stored as one JSON array under the `history` key.
//! Entries are only ever prepended; nothing edits or removes them.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::evaluator::EvaluationOutcome;
use crate::storage::{KvStore, HISTORY_KEY};
use crate::task::{Task, TaskKind};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub timestamp: DateTime<Utc>,
    pub task_kind: TaskKind,
    /// `None` when the evaluation could not be parsed.
    pub band_score: Option<f64>,
    pub task_content: String,
}

impl HistoryEntry {
    pub fn from_outcome(task: &Task, outcome: &EvaluationOutcome, at: DateTime<Utc>) -> Self {
        Self {
            timestamp: at,
            task_kind: task.kind(),
            band_score: outcome.band_score(),
            task_content: task.content().to_string(),
        }
    }
}

pub struct HistoryLog {
    store: Arc<dyn KvStore>,
}

impl HistoryLog {
    pub fn new(store: Arc<dyn KvStore>) -> Self {
        Self { store }
    }

    /// All entries, newest first. Missing or unreadable history is empty.
    pub fn load(&self) -> Vec<HistoryEntry> {
        let raw = match self.store.get(HISTORY_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(e) => {
                warn!("failed to read history: {e}");
                return Vec::new();
            }
        };
        serde_json::from_str(&raw).unwrap_or_else(|e| {
            warn!("ignoring unreadable history: {e}");
            Vec::new()
        })
    }

    /// Prepend `entry` and persist the full sequence. Best-effort.
    pub fn append(&self, entry: HistoryEntry) {
        let mut entries = self.load();
        entries.insert(0, entry);
        match serde_json::to_string(&entries) {
            Ok(json) => {
                if let Err(e) = self.store.set(HISTORY_KEY, &json) {
                    warn!("failed to save history: {e}");
                }
            }
            Err(e) => warn!("failed to serialize history: {e}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    fn entry(score: Option<f64>, content: &str) -> HistoryEntry {
        HistoryEntry {
            timestamp: Utc::now(),
            task_kind: TaskKind::ShortTask,
            band_score: score,
            task_content: content.to_string(),
        }
    }

    #[test]
    fn empty_when_nothing_stored() {
        let log = HistoryLog::new(Arc::new(MemoryStore::new()));
        assert!(log.load().is_empty());
    }

    #[test]
    fn newest_first() {
        let log = HistoryLog::new(Arc::new(MemoryStore::new()));
        log.append(entry(Some(6.0), "first"));
        log.append(entry(Some(7.5), "second"));
        let entries = log.load();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].task_content, "second");
        assert_eq!(entries[1].task_content, "first");
    }

    #[test]
    fn corrupt_history_loads_empty_and_is_replaced_on_append() {
        let store = Arc::new(MemoryStore::new());
        store.set(HISTORY_KEY, "[{broken").unwrap();
        let log = HistoryLog::new(store);
        assert!(log.load().is_empty());
        log.append(entry(None, "after"));
        assert_eq!(log.load().len(), 1);
    }

    #[test]
    fn entry_from_raw_fallback_has_no_score() {
        let task = Task::new(TaskKind::LongTask, "Discuss", Utc::now());
        let outcome = EvaluationOutcome::RawFallback {
            raw_text: "Band 6".into(),
        };
        let entry = HistoryEntry::from_outcome(&task, &outcome, Utc::now());
        assert_eq!(entry.band_score, None);
        assert_eq!(entry.task_kind, TaskKind::LongTask);
        assert_eq!(entry.task_content, "Discuss");
    }

    #[test]
    fn stored_format_uses_camel_case_keys() {
        let store = Arc::new(MemoryStore::new());
        let log = HistoryLog::new(store.clone());
        log.append(entry(Some(8.0), "t"));
        let raw = store.get(HISTORY_KEY).unwrap().unwrap();
        assert!(raw.contains("\"taskKind\":\"task1\""), "{raw}");
        assert!(raw.contains("\"bandScore\":8.0"), "{raw}");
    }
}
