use bandprep_core::render::render_history;
use bandprep_core::HistoryLog;
use clap::Args;

use crate::context::{CliResult, Context};

#[derive(Args)]
pub struct HistoryArgs {
    /// Print entries as JSON
    #[arg(long)]
    json: bool,
}

pub fn run(args: HistoryArgs) -> CliResult {
    let ctx = Context::load()?;
    let entries = HistoryLog::new(ctx.store.clone()).load();

    if args.json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
    } else {
        print!(
            "{}",
            render_history(&entries, ctx.config.display.history_excerpt_chars)
        );
    }
    Ok(())
}
