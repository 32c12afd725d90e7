use std::path::PathBuf;

use bandprep_core::render::render_evaluation;
use bandprep_core::wordcount::count_words;
use bandprep_core::{EvaluationOutcome, PracticeError};
use clap::Args;

use crate::context::{read_input, CliResult, Context};

#[derive(Args)]
pub struct SubmitArgs {
    /// Response text
    #[arg(long, conflicts_with = "file")]
    text: Option<String>,
    /// Read the response from a file ("-" for stdin)
    #[arg(long)]
    file: Option<PathBuf>,
    /// Submit even if the response is below the minimum word count
    #[arg(long)]
    force: bool,
    /// Print the evaluation as JSON
    #[arg(long)]
    json: bool,
}

pub async fn run(args: SubmitArgs) -> CliResult {
    let ctx = Context::load()?;
    let service = ctx.service()?;
    let response = read_input(args.text, args.file)?;

    eprintln!("Submitting {} words for evaluation...", count_words(&response));
    let outcome = match service.submit(&response, args.force).await {
        Ok(outcome) => outcome,
        Err(PracticeError::BelowMinimum(warning)) => {
            return Err(format!("{warning}. Re-run with --force to submit anyway.").into());
        }
        Err(e) => return Err(e.into()),
    };

    print_outcome(&outcome, args.json)
}

pub fn print_outcome(outcome: &EvaluationOutcome, json: bool) -> CliResult {
    if json {
        println!("{}", serde_json::to_string_pretty(outcome)?);
    } else {
        println!("{}", render_evaluation(outcome));
    }
    Ok(())
}
