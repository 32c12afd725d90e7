//! Session timer implementation.
//!
//! The session timer is a wall-clock-based state machine. It does not use
//! internal threads - the caller is responsible for calling `tick()` periodically.
//!
//! ## State Transitions
//!
//! ```text
//! Idle -> Running -> Expired -> Idle
//!           |                    ^
//!           +---- cancel --------+
//! ```
//!
//! Remaining time is always recomputed from the task's absolute start
//! timestamp, never by decrementing a counter, so missed or late ticks
//! (sleep, suspended terminal) cannot skew the deadline. The active session
//! is written to the key-value store on start and on every running tick, and
//! `resume()` rebuilds the countdown from that record after a restart.
//!
//! ## Usage
//!
//! ```ignore
//! let mut timer = SessionTimer::new(store);
//! timer.resume();
//! timer.start(TaskKind::ShortTask, "Write a letter to ...");
//! // In a loop:
//! timer.tick(Utc::now()); // Returns Tick::Expired { fired: true } once
//! ```

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::storage::{KvStore, SESSION_KEY};
use crate::task::{Task, TaskKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimerState {
    /// No active task.
    Idle,
    Running,
    /// Countdown reached zero; waiting for the user to acknowledge.
    Expired,
}

/// The active task plus bookkeeping; this is the persisted record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub task: Task,
    /// Last persistence write. Diagnostic only, never used for elapsed time.
    pub persisted_at: DateTime<Utc>,
}

/// Result of a single `tick()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tick {
    Idle,
    Remaining(u64),
    /// `fired` is true only on the tick that crossed the deadline.
    Expired { fired: bool },
}

/// Result of reconciling persisted state at process start.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resumed {
    /// Nothing (or nothing readable) was persisted.
    Idle,
    /// Deadline passed while nobody was watching; the record was dropped.
    Stale { overdue_secs: u64 },
    Running { remaining_secs: u64 },
}

/// Read-only view of the timer for rendering.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    pub state: TimerState,
    pub kind: Option<TaskKind>,
    pub content: Option<String>,
    pub remaining_secs: u64,
    pub total_secs: u64,
    pub started_at: Option<DateTime<Utc>>,
    pub deadline: Option<DateTime<Utc>>,
    pub at: DateTime<Utc>,
}

/// Whole seconds left on `task` at `now`. Negative once past the deadline.
///
/// A `now` before the start counts as zero elapsed, so the deadline can never
/// move later than `started_at + duration`.
pub fn remaining_secs(task: &Task, now: DateTime<Utc>) -> i64 {
    let elapsed_ms = (now - task.started_at()).num_milliseconds().max(0);
    let elapsed_secs = elapsed_ms.div_euclid(1000);
    task.kind().duration_secs() as i64 - elapsed_secs
}

/// Countdown for the single active writing session.
pub struct SessionTimer {
    store: Arc<dyn KvStore>,
    session: Option<Session>,
    state: TimerState,
}

impl SessionTimer {
    /// Create an idle timer. Call `resume()` to pick up a persisted session.
    pub fn new(store: Arc<dyn KvStore>) -> Self {
        Self {
            store,
            session: None,
            state: TimerState::Idle,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn state(&self) -> TimerState {
        self.state
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn task(&self) -> Option<&Task> {
        self.session.as_ref().map(|s| &s.task)
    }

    /// Remaining seconds at `now`, clamped at zero. `None` when idle.
    pub fn remaining_at(&self, now: DateTime<Utc>) -> Option<u64> {
        self.task().map(|t| remaining_secs(t, now).max(0) as u64)
    }

    pub fn snapshot(&self, now: DateTime<Utc>) -> Snapshot {
        let task = self.task();
        Snapshot {
            state: self.state,
            kind: task.map(Task::kind),
            content: task.map(|t| t.content().to_string()),
            remaining_secs: self.remaining_at(now).unwrap_or(0),
            total_secs: task.map(|t| t.kind().duration_secs()).unwrap_or(0),
            started_at: task.map(Task::started_at),
            deadline: task.map(Task::deadline),
            at: now,
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    pub fn start(&mut self, kind: TaskKind, content: impl Into<String>) -> &Session {
        self.start_at(kind, content, Utc::now())
    }

    /// Begin a new task at `now`, replacing whatever session existed.
    pub fn start_at(
        &mut self,
        kind: TaskKind,
        content: impl Into<String>,
        now: DateTime<Utc>,
    ) -> &Session {
        if self.session.is_some() {
            debug!("discarding previous session for new task");
        }
        let task = Task::new(kind, content, now);
        info!(kind = %kind, deadline = %task.deadline(), "task started");
        self.state = TimerState::Running;
        let session = self.session.insert(Session {
            task,
            persisted_at: now,
        });
        write_session(self.store.as_ref(), session, now);
        session
    }

    /// Call periodically (nominally once a second) while running.
    pub fn tick(&mut self, now: DateTime<Utc>) -> Tick {
        match self.state {
            TimerState::Idle => Tick::Idle,
            TimerState::Expired => Tick::Expired { fired: false },
            TimerState::Running => {
                let Some(task) = self.task() else {
                    self.state = TimerState::Idle;
                    return Tick::Idle;
                };
                let kind = task.kind();
                let remaining = remaining_secs(task, now);
                self.persist(now);
                if remaining <= 0 {
                    info!(kind = %kind, "time is up");
                    self.state = TimerState::Expired;
                    return Tick::Expired { fired: true };
                }
                Tick::Remaining(remaining as u64)
            }
        }
    }

    pub fn resume(&mut self) -> Resumed {
        self.resume_at(Utc::now())
    }

    /// Rebuild state from the persisted session as of `now`.
    ///
    /// The deadline stays anchored to the original start; a session whose
    /// deadline already passed is discarded without an expiry signal.
    pub fn resume_at(&mut self, now: DateTime<Utc>) -> Resumed {
        self.session = None;
        self.state = TimerState::Idle;

        let raw = match self.store.get(SESSION_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Resumed::Idle,
            Err(e) => {
                warn!("failed to read persisted session: {e}");
                return Resumed::Idle;
            }
        };

        let session: Session = match serde_json::from_str(&raw) {
            Ok(session) => session,
            Err(e) => {
                warn!("ignoring unreadable persisted session: {e}");
                self.clear_persisted();
                return Resumed::Idle;
            }
        };

        let remaining = remaining_secs(&session.task, now);
        if remaining <= 0 {
            info!(
                kind = %session.task.kind(),
                overdue_secs = -remaining,
                "discarding stale session"
            );
            self.clear_persisted();
            return Resumed::Stale {
                overdue_secs: remaining.unsigned_abs(),
            };
        }

        info!(kind = %session.task.kind(), remaining_secs = remaining, "session resumed");
        self.session = Some(session);
        self.state = TimerState::Running;
        Resumed::Running {
            remaining_secs: remaining as u64,
        }
    }

    /// Drop the active session. Returns false if there was none.
    pub fn cancel(&mut self) -> bool {
        let had_session = self.session.take().is_some();
        self.state = TimerState::Idle;
        self.clear_persisted();
        if had_session {
            info!("session cleared");
        }
        had_session
    }

    /// Acknowledge the expiry alert. Only meaningful in `Expired`.
    pub fn acknowledge(&mut self) -> bool {
        if self.state != TimerState::Expired {
            return false;
        }
        self.cancel()
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn persist(&mut self, now: DateTime<Utc>) {
        if let Some(session) = self.session.as_mut() {
            write_session(self.store.as_ref(), session, now);
        }
    }

    fn clear_persisted(&self) {
        if let Err(e) = self.store.remove(SESSION_KEY) {
            warn!("failed to clear persisted session: {e}");
        }
    }
}

/// Best-effort write of the whole session record; failures are only logged.
fn write_session(store: &dyn KvStore, session: &mut Session, now: DateTime<Utc>) {
    session.persisted_at = now;
    let json = match serde_json::to_string(session) {
        Ok(json) => json,
        Err(e) => {
            warn!("failed to serialize session: {e}");
            return;
        }
    };
    match store.set(SESSION_KEY, &json) {
        Ok(()) => debug!("session persisted"),
        Err(e) => warn!("failed to persist session: {e}"),
    }
}
