use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

use bandprep_core::render::{format_countdown, in_warning_band};
use bandprep_core::wordcount::check_minimum;
use bandprep_core::{EvaluationOutcome, PracticeError, PracticeService, Tick};
use chrono::Utc;
use clap::Subcommand;
use tokio::time::MissedTickBehavior;

use crate::commands::submit::print_outcome;
use crate::context::{read_input, CliResult, Context};

#[derive(Subcommand)]
pub enum TimerAction {
    /// Print the countdown
    Status {
        /// Print the timer snapshot as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show a live countdown, then submit the response when time is up
    Watch {
        /// Read the response from this file when time is up ("-" for stdin).
        /// Without it the response is read from stdin after the alert.
        #[arg(long)]
        response: Option<PathBuf>,
        /// Print the evaluation as JSON
        #[arg(long)]
        json: bool,
    },
    /// Abandon the current task
    Cancel,
}

pub async fn run(action: TimerAction) -> CliResult {
    let ctx = Context::load()?;
    let service = ctx.service()?;
    let threshold = ctx.config.display.warning_threshold_secs;

    match action {
        TimerAction::Status { json } => {
            let now = Utc::now();
            let tick = service.tick(now);
            let snapshot = service.snapshot(now);
            if json {
                println!("{}", serde_json::to_string_pretty(&snapshot)?);
                return Ok(());
            }
            match tick {
                Tick::Idle => println!("No active task."),
                Tick::Remaining(secs) => {
                    let marker = if in_warning_band(secs, threshold) { " !" } else { "" };
                    println!("{}{marker}", format_countdown(secs));
                }
                Tick::Expired { .. } => println!("Time is up!"),
            }
        }
        TimerAction::Watch { response, json } => {
            if !countdown(&service, threshold).await? {
                println!("No active task.");
                return Ok(());
            }
            let text = match response {
                Some(path) => read_input(None, Some(path))?,
                None => {
                    eprintln!(
                        "Paste your response, then press Ctrl-D to submit. \
                         Leave it empty to discard the task."
                    );
                    std::io::read_to_string(std::io::stdin())?
                }
            };
            match finish_expired(&service, &text).await? {
                Some(outcome) => print_outcome(&outcome, json)?,
                None => println!("task discarded"),
            }
        }
        TimerAction::Cancel => {
            if service.cancel() {
                println!("task cancelled");
            } else {
                println!("No active task.");
            }
        }
    }
    Ok(())
}

/// Redraw the countdown every second until the deadline. Returns false if
/// there was no task to count down.
async fn countdown(service: &PracticeService, threshold: u64) -> std::io::Result<bool> {
    let mut interval = tokio::time::interval(Duration::from_secs(1));
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut stdout = std::io::stdout();
    loop {
        interval.tick().await;
        match service.tick(Utc::now()) {
            Tick::Idle => return Ok(false),
            Tick::Remaining(secs) => {
                let marker = if in_warning_band(secs, threshold) { " !" } else { "  " };
                print!("\r{}{marker}", format_countdown(secs));
                stdout.flush()?;
            }
            Tick::Expired { fired } => {
                if fired {
                    println!("\r00:00  \nTime is up!\x07");
                } else {
                    println!("Time is up!");
                }
                return Ok(true);
            }
        }
    }
}

/// Evaluate `response` for the task whose time ran out. A blank response
/// acknowledges the expiry and drops the task instead.
///
/// The deadline has passed, so a short response is submitted with a warning
/// rather than refused.
async fn finish_expired(
    service: &PracticeService,
    response: &str,
) -> Result<Option<EvaluationOutcome>, PracticeError> {
    if response.trim().is_empty() {
        service.acknowledge();
        return Ok(None);
    }
    if let Some(task) = service.current_task() {
        if let Some(warning) = check_minimum(task.kind(), response) {
            eprintln!("{warning}");
        }
    }
    service.submit(response, true).await.map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use bandprep_core::{CompletionClient, CompletionError, MemoryStore, TaskKind, TimerState};
    use std::sync::Arc;

    struct Reply(&'static str);

    #[async_trait]
    impl CompletionClient for Reply {
        async fn complete(&self, _secret: &str, _prompt: &str) -> Result<String, CompletionError> {
            Ok(self.0.to_string())
        }
    }

    /// A service whose only task ran out 100 seconds ago, in this process.
    fn expired_service(reply: &'static str) -> PracticeService {
        let service = PracticeService::open(Arc::new(MemoryStore::new()), Arc::new(Reply(reply)));
        service.secrets().set("key").unwrap();
        let start = Utc::now() - chrono::Duration::seconds(1300);
        service
            .start_manual_task_at(TaskKind::ShortTask, "Write to your landlord", start)
            .unwrap();
        assert_eq!(service.tick(Utc::now()), Tick::Expired { fired: true });
        service
    }

    #[tokio::test]
    async fn response_is_evaluated_after_time_runs_out() {
        let service = expired_service("{\"bandScore\":6.5}");

        let outcome = finish_expired(&service, &"word ".repeat(160))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(outcome.band_score(), Some(6.5));
        assert_eq!(service.state(), TimerState::Idle);

        let history = service.history().load();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].task_content, "Write to your landlord");
    }

    #[tokio::test]
    async fn short_response_is_still_submitted_after_expiry() {
        let service = expired_service("{\"bandScore\":4}");
        let outcome = finish_expired(&service, "Dear Sir, the heating is broken.")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(outcome.band_score(), Some(4.0));
        assert_eq!(service.history().load().len(), 1);
    }

    #[tokio::test]
    async fn blank_response_discards_the_task() {
        let service = expired_service("{\"bandScore\":6}");
        assert!(finish_expired(&service, "  \n").await.unwrap().is_none());
        assert_eq!(service.state(), TimerState::Idle);
        assert!(service.current_task().is_none());
        assert!(service.history().load().is_empty());
    }
}
