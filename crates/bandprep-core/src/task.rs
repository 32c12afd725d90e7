//! Writing tasks and their kinds.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Which exam task a prompt belongs to. Fixes the countdown length and the
/// minimum word count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TaskKind {
    /// Task 1: letter writing.
    #[serde(rename = "task1")]
    ShortTask,
    /// Task 2: essay writing.
    #[serde(rename = "task2")]
    LongTask,
}

impl TaskKind {
    /// Countdown length in seconds.
    pub fn duration_secs(self) -> u64 {
        match self {
            TaskKind::ShortTask => 20 * 60,
            TaskKind::LongTask => 40 * 60,
        }
    }

    pub fn min_words(self) -> usize {
        match self {
            TaskKind::ShortTask => 150,
            TaskKind::LongTask => 250,
        }
    }

    /// Stable identifier used on the command line and in storage.
    pub fn id(self) -> &'static str {
        match self {
            TaskKind::ShortTask => "task1",
            TaskKind::LongTask => "task2",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            TaskKind::ShortTask => "Task 1 (Letter)",
            TaskKind::LongTask => "Task 2 (Essay)",
        }
    }
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for TaskKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "task1" | "1" | "short" | "letter" => Ok(TaskKind::ShortTask),
            "task2" | "2" | "long" | "essay" => Ok(TaskKind::LongTask),
            other => Err(format!("unknown task kind '{other}' (expected task1 or task2)")),
        }
    }
}

/// One writing prompt in progress.
///
/// Fields are private so that `kind`, `content` and `started_at` stay fixed
/// for the lifetime of the task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    kind: TaskKind,
    content: String,
    started_at: DateTime<Utc>,
}

impl Task {
    pub fn new(kind: TaskKind, content: impl Into<String>, started_at: DateTime<Utc>) -> Self {
        Self {
            kind,
            content: content.into(),
            started_at,
        }
    }

    pub fn kind(&self) -> TaskKind {
        self.kind
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn deadline(&self) -> DateTime<Utc> {
        self.started_at + chrono::Duration::seconds(self.kind.duration_secs() as i64)
    }
}
