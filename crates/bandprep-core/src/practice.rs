//! The practice flow: pick or generate a task, count down, submit, record.
//!
//! [`PracticeService`] owns the single [`SessionTimer`] and hands the current
//! task to the evaluator. Remote calls are guarded per action so a second
//! "generate" or "submit" cannot start while the first is still waiting.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use crate::error::PracticeError;
use crate::evaluator::{EvaluationOutcome, Evaluator};
use crate::generator::TaskGenerator;
use crate::history::{HistoryEntry, HistoryLog};
use crate::integrations::CompletionClient;
use crate::secret::SecretStore;
use crate::storage::KvStore;
use crate::task::{Task, TaskKind};
use crate::timer::{Resumed, Session, SessionTimer, Snapshot, Tick, TimerState};
use crate::wordcount;

/// Marks one action as in flight until dropped.
struct InFlight<'a>(&'a AtomicBool);

impl<'a> InFlight<'a> {
    fn acquire(flag: &'a AtomicBool, action: &'static str) -> Result<Self, PracticeError> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map(|_| InFlight(flag))
            .map_err(|_| PracticeError::Busy(action))
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

pub struct PracticeService {
    timer: Mutex<SessionTimer>,
    secrets: SecretStore,
    history: HistoryLog,
    evaluator: Evaluator,
    generator: TaskGenerator,
    generating: AtomicBool,
    submitting: AtomicBool,
}

impl PracticeService {
    /// Wire up the components and reconcile any persisted session.
    pub fn open(store: Arc<dyn KvStore>, client: Arc<dyn CompletionClient>) -> Self {
        Self::open_at(store, client, Utc::now())
    }

    pub fn open_at(
        store: Arc<dyn KvStore>,
        client: Arc<dyn CompletionClient>,
        now: DateTime<Utc>,
    ) -> Self {
        let mut timer = SessionTimer::new(store.clone());
        if let Resumed::Stale { overdue_secs } = timer.resume_at(now) {
            info!(overdue_secs, "previous task ran out while closed");
        }
        Self {
            timer: Mutex::new(timer),
            secrets: SecretStore::new(store.clone()),
            history: HistoryLog::new(store),
            evaluator: Evaluator::new(client.clone()),
            generator: TaskGenerator::new(client),
            generating: AtomicBool::new(false),
            submitting: AtomicBool::new(false),
        }
    }

    fn timer(&self) -> MutexGuard<'_, SessionTimer> {
        // Timer state stays consistent even if a holder panicked.
        self.timer.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn secrets(&self) -> &SecretStore {
        &self.secrets
    }

    pub fn history(&self) -> &HistoryLog {
        &self.history
    }

    fn require_secret(&self) -> Result<String, PracticeError> {
        self.secrets.get().ok_or(PracticeError::MissingSecret)
    }

    // ── Task selection ───────────────────────────────────────────────

    /// Generate a task of `kind` remotely and start counting down.
    ///
    /// On failure the current session, if any, is left as it was.
    pub async fn generate_task(&self, kind: TaskKind) -> Result<Session, PracticeError> {
        let secret = self.require_secret()?;
        let _guard = InFlight::acquire(&self.generating, "generate")?;
        let content = self.generator.generate(&secret, kind).await?;
        Ok(self.timer().start(kind, content).clone())
    }

    /// Start counting down on a task the user pasted in.
    pub fn start_manual_task(&self, kind: TaskKind, content: &str) -> Result<Session, PracticeError> {
        self.start_manual_task_at(kind, content, Utc::now())
    }

    pub fn start_manual_task_at(
        &self,
        kind: TaskKind,
        content: &str,
        now: DateTime<Utc>,
    ) -> Result<Session, PracticeError> {
        let content = content.trim();
        if content.is_empty() {
            return Err(PracticeError::EmptyTask);
        }
        Ok(self.timer().start_at(kind, content, now).clone())
    }

    // ── Countdown ────────────────────────────────────────────────────

    pub fn tick(&self, now: DateTime<Utc>) -> Tick {
        self.timer().tick(now)
    }

    pub fn snapshot(&self, now: DateTime<Utc>) -> Snapshot {
        self.timer().snapshot(now)
    }

    pub fn state(&self) -> TimerState {
        self.timer().state()
    }

    pub fn current_task(&self) -> Option<Task> {
        self.timer().task().cloned()
    }

    pub fn acknowledge(&self) -> bool {
        self.timer().acknowledge()
    }

    pub fn cancel(&self) -> bool {
        self.timer().cancel()
    }

    // ── Submission ───────────────────────────────────────────────────

    /// Evaluate `response` for the current task.
    ///
    /// A response under the task's minimum word count is refused unless
    /// `allow_short` is set. On success the result is added to history and
    /// the session is cleared; on a remote failure neither is touched.
    pub async fn submit(
        &self,
        response: &str,
        allow_short: bool,
    ) -> Result<EvaluationOutcome, PracticeError> {
        self.submit_at(response, allow_short, Utc::now()).await
    }

    pub async fn submit_at(
        &self,
        response: &str,
        allow_short: bool,
        now: DateTime<Utc>,
    ) -> Result<EvaluationOutcome, PracticeError> {
        let secret = self.require_secret()?;
        let task = self.current_task().ok_or(PracticeError::NoActiveSession)?;

        let response = response.trim();
        if response.is_empty() {
            return Err(PracticeError::EmptyResponse);
        }
        let word_count = wordcount::count_words(response);
        if let Some(warning) = wordcount::check_minimum(task.kind(), response) {
            if !allow_short {
                return Err(PracticeError::BelowMinimum(warning));
            }
            warn!(%warning, "submitting below minimum length");
        }

        let _guard = InFlight::acquire(&self.submitting, "submit")?;
        let outcome = self
            .evaluator
            .evaluate(&secret, &task, response, word_count)
            .await?;

        self.history
            .append(HistoryEntry::from_outcome(&task, &outcome, now));
        {
            let mut timer = self.timer();
            // A new task may have been started while the request was pending.
            if timer.task() == Some(&task) {
                timer.cancel();
            }
        }
        info!(band_score = ?outcome.band_score(), "submission recorded");
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CompletionError;
    use crate::storage::{MemoryStore, SESSION_KEY};
    use async_trait::async_trait;
    use tokio::sync::Notify;

    /// Replies with a fixed result, optionally waiting for a signal first.
    struct Scripted {
        reply: Result<String, String>,
        gate: Option<Arc<Notify>>,
    }

    #[async_trait]
    impl CompletionClient for Scripted {
        async fn complete(&self, _secret: &str, _prompt: &str) -> Result<String, CompletionError> {
            if let Some(gate) = &self.gate {
                gate.notified().await;
            }
            self.reply
                .clone()
                .map_err(|message| CompletionError::Remote { message })
        }
    }

    fn service(reply: Result<&str, &str>) -> (Arc<MemoryStore>, PracticeService) {
        let store = Arc::new(MemoryStore::new());
        let client = Arc::new(Scripted {
            reply: reply.map(String::from).map_err(String::from),
            gate: None,
        });
        let service = PracticeService::open(store.clone(), client);
        service.secrets().set("key").unwrap();
        (store, service)
    }

    fn long_enough(kind: TaskKind) -> String {
        "word ".repeat(kind.min_words())
    }

    #[tokio::test]
    async fn generate_requires_secret() {
        let (_, service) = service(Ok("task"));
        service.secrets().clear().unwrap();
        let err = service.generate_task(TaskKind::ShortTask).await.unwrap_err();
        assert!(matches!(err, PracticeError::MissingSecret));
        assert_eq!(service.state(), TimerState::Idle);
    }

    #[tokio::test]
    async fn generate_starts_session() {
        let (store, service) = service(Ok("  You moved to a new city.  "));
        let session = service.generate_task(TaskKind::ShortTask).await.unwrap();
        assert_eq!(session.task.content(), "You moved to a new city.");
        assert_eq!(service.state(), TimerState::Running);
        assert!(store.get(SESSION_KEY).unwrap().is_some());
    }

    #[tokio::test]
    async fn failed_generation_keeps_existing_session() {
        let (_, service) = service(Err("quota exceeded"));
        service
            .start_manual_task(TaskKind::LongTask, "Existing essay")
            .unwrap();
        let err = service.generate_task(TaskKind::ShortTask).await.unwrap_err();
        assert!(matches!(err, PracticeError::Remote { .. }));
        assert_eq!(service.current_task().unwrap().content(), "Existing essay");
    }

    #[test]
    fn manual_task_rejects_blank_text() {
        let (_, service) = service(Ok(""));
        assert!(matches!(
            service.start_manual_task(TaskKind::ShortTask, " \n "),
            Err(PracticeError::EmptyTask)
        ));
    }

    #[tokio::test]
    async fn submit_without_task_fails() {
        let (_, service) = service(Ok("{}"));
        let err = service.submit("hello", true).await.unwrap_err();
        assert!(matches!(err, PracticeError::NoActiveSession));
    }

    #[tokio::test]
    async fn submit_rejects_empty_response() {
        let (_, service) = service(Ok("{}"));
        service.start_manual_task(TaskKind::ShortTask, "t").unwrap();
        let err = service.submit("   ", true).await.unwrap_err();
        assert!(matches!(err, PracticeError::EmptyResponse));
    }

    #[tokio::test]
    async fn short_response_needs_override() {
        let (_, service) = service(Ok("{\"bandScore\":5}"));
        service.start_manual_task(TaskKind::ShortTask, "t").unwrap();

        let err = service.submit("too short", false).await.unwrap_err();
        match err {
            PracticeError::BelowMinimum(w) => {
                assert_eq!(w.words, 2);
                assert_eq!(w.minimum, 150);
            }
            other => panic!("expected BelowMinimum, got {other:?}"),
        }
        assert_eq!(service.state(), TimerState::Running);

        let outcome = service.submit("too short", true).await.unwrap();
        assert_eq!(outcome.band_score(), Some(5.0));
    }

    #[tokio::test]
    async fn successful_submit_records_history_and_clears_session() {
        let (store, service) = service(Ok("Here you go:\n{\"bandScore\":7}"));
        service
            .start_manual_task(TaskKind::ShortTask, "Write to a friend")
            .unwrap();

        let outcome = service
            .submit(&long_enough(TaskKind::ShortTask), false)
            .await
            .unwrap();
        assert_eq!(outcome.band_score(), Some(7.0));
        assert_eq!(service.state(), TimerState::Idle);
        assert!(store.get(SESSION_KEY).unwrap().is_none());

        let history = service.history().load();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].band_score, Some(7.0));
        assert_eq!(history[0].task_content, "Write to a friend");
    }

    #[tokio::test]
    async fn remote_failure_leaves_state_untouched() {
        let (store, service) = service(Err("quota exceeded"));
        service.start_manual_task(TaskKind::ShortTask, "t").unwrap();
        let before = store.get(SESSION_KEY).unwrap();

        let err = service
            .submit(&long_enough(TaskKind::ShortTask), false)
            .await
            .unwrap_err();
        match err {
            PracticeError::Remote { message } => assert_eq!(message, "quota exceeded"),
            other => panic!("expected Remote, got {other:?}"),
        }
        assert!(service.history().load().is_empty());
        assert_eq!(service.state(), TimerState::Running);
        assert_eq!(store.get(SESSION_KEY).unwrap(), before);
    }

    #[tokio::test]
    async fn unparseable_reply_is_recorded_without_score() {
        let (_, service) = service(Ok("Band 6. Nice letter."));
        service.start_manual_task(TaskKind::ShortTask, "t").unwrap();
        let outcome = service
            .submit(&long_enough(TaskKind::ShortTask), false)
            .await
            .unwrap();
        assert!(matches!(outcome, EvaluationOutcome::RawFallback { .. }));
        assert_eq!(service.history().load()[0].band_score, None);
    }

    #[tokio::test]
    async fn submit_allowed_after_expiry() {
        let (_, service) = service(Ok("{\"bandScore\":6}"));
        let start = Utc::now();
        service
            .start_manual_task_at(TaskKind::ShortTask, "t", start)
            .unwrap();
        let tick = service.tick(start + chrono::Duration::seconds(1300));
        assert_eq!(tick, Tick::Expired { fired: true });

        service
            .submit(&long_enough(TaskKind::ShortTask), false)
            .await
            .unwrap();
        assert_eq!(service.state(), TimerState::Idle);
    }

    #[tokio::test]
    async fn concurrent_submit_is_refused() {
        let store = Arc::new(MemoryStore::new());
        let gate = Arc::new(Notify::new());
        let client = Arc::new(Scripted {
            reply: Ok("{\"bandScore\":6}".into()),
            gate: Some(gate.clone()),
        });
        let service = Arc::new(PracticeService::open(store, client));
        service.secrets().set("key").unwrap();
        service.start_manual_task(TaskKind::ShortTask, "t").unwrap();

        let response = long_enough(TaskKind::ShortTask);
        let first = {
            let service = service.clone();
            let response = response.clone();
            tokio::spawn(async move { service.submit(&response, false).await })
        };
        // Let the first submission reach the gate.
        while !service.submitting.load(Ordering::Acquire) {
            tokio::task::yield_now().await;
        }

        let second = service.submit(&response, false).await;
        assert!(matches!(second, Err(PracticeError::Busy("submit"))));

        gate.notify_one();
        first.await.unwrap().unwrap();
        assert_eq!(service.history().load().len(), 1);
    }

    #[tokio::test]
    async fn concurrent_generate_is_refused() {
        let store = Arc::new(MemoryStore::new());
        let gate = Arc::new(Notify::new());
        let client = Arc::new(Scripted {
            reply: Ok("Describe a festival in your town.".into()),
            gate: Some(gate.clone()),
        });
        let service = Arc::new(PracticeService::open(store, client));
        service.secrets().set("key").unwrap();
        service
            .start_manual_task(TaskKind::LongTask, "Existing essay")
            .unwrap();

        let first = {
            let service = service.clone();
            tokio::spawn(async move { service.generate_task(TaskKind::ShortTask).await })
        };
        while !service.generating.load(Ordering::Acquire) {
            tokio::task::yield_now().await;
        }

        let second = service.generate_task(TaskKind::ShortTask).await;
        assert!(matches!(second, Err(PracticeError::Busy("generate"))));
        assert_eq!(service.current_task().unwrap().content(), "Existing essay");

        gate.notify_one();
        let session = first.await.unwrap().unwrap();
        assert_eq!(session.task.content(), "Describe a festival in your town.");
        assert_eq!(
            service.current_task().unwrap().content(),
            "Describe a festival in your town."
        );
        assert!(!service.generating.load(Ordering::Acquire));
    }

    #[test]
    fn open_discards_stale_session() {
        let store = Arc::new(MemoryStore::new());
        let client = Arc::new(Scripted {
            reply: Ok(String::new()),
            gate: None,
        });
        let start = Utc::now() - chrono::Duration::seconds(1250);
        {
            let service = PracticeService::open(store.clone(), client.clone());
            service
                .start_manual_task_at(TaskKind::ShortTask, "old", start)
                .unwrap();
        }
        let service = PracticeService::open(store.clone(), client);
        assert_eq!(service.state(), TimerState::Idle);
        assert!(store.get(SESSION_KEY).unwrap().is_none());
    }
}
