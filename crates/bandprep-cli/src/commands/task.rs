use std::path::PathBuf;

use bandprep_core::render::format_countdown;
use bandprep_core::{Session, TaskKind};
use chrono::Utc;
use clap::Subcommand;

use crate::context::{read_input, CliResult, Context};

#[derive(Subcommand)]
pub enum TaskAction {
    /// Generate a new task and start the timer
    Generate {
        /// task1 (letter) or task2 (essay)
        #[arg(long, default_value = "task1")]
        kind: TaskKind,
    },
    /// Start the timer on a task you already have
    Start {
        /// task1 (letter) or task2 (essay)
        #[arg(long, default_value = "task1")]
        kind: TaskKind,
        /// Task text
        #[arg(long, conflicts_with = "file")]
        text: Option<String>,
        /// Read the task text from a file ("-" for stdin)
        #[arg(long)]
        file: Option<PathBuf>,
    },
    /// Print the current task
    Show,
}

fn print_started(session: &Session) {
    let task = &session.task;
    println!("{}\n", task.kind().label());
    println!("{}\n", task.content());
    println!(
        "Timer started: {} (minimum {} words)",
        format_countdown(task.kind().duration_secs()),
        task.kind().min_words()
    );
}

pub async fn run(action: TaskAction) -> CliResult {
    let ctx = Context::load()?;
    let service = ctx.service()?;

    match action {
        TaskAction::Generate { kind } => {
            eprintln!("Generating {}...", kind.label());
            let session = service.generate_task(kind).await?;
            print_started(&session);
        }
        TaskAction::Start { kind, text, file } => {
            let content = read_input(text, file)?;
            let session = service.start_manual_task(kind, &content)?;
            print_started(&session);
        }
        TaskAction::Show => match service.current_task() {
            Some(task) => {
                let snapshot = service.snapshot(Utc::now());
                println!("{}\n", task.kind().label());
                println!("{}\n", task.content());
                println!(
                    "Time left: {} (minimum {} words)",
                    format_countdown(snapshot.remaining_secs),
                    task.kind().min_words()
                );
            }
            None => println!("No active task."),
        },
    }
    Ok(())
}
