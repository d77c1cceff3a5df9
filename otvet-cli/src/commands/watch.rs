//! Watch command - poll for new questions as they arrive.
//!
//! This is the reading half of the live-answering loop: leave it running
//! in one terminal, answer promising questions from another.

use std::time::Duration;

use anyhow::Result;
use clap::Args;
use futures::StreamExt;
use tracing::info;

use otvet_client::{LiveOptions, QuestionFilter};

use crate::commands;
use crate::output::{JsonFormatter, TextFormatter};
use crate::{Cli, OutputFormat};

/// Arguments for the watch command.
#[derive(Args)]
pub struct WatchArgs {
    /// Category to watch, by urlname or display name.
    #[arg(long, short)]
    pub category: Option<String>,

    /// Seconds between polls.
    #[arg(long, short, default_value = "10")]
    pub interval: u64,

    /// Questions fetched per poll; bounds how much of a burst is seen.
    #[arg(long, default_value = "20")]
    pub step: u32,

    /// Print the current first page before waiting for new questions.
    #[arg(long)]
    pub backlog: bool,

    /// Stop after this many questions (0 = run until interrupted).
    #[arg(long, short = 'n', default_value = "0")]
    pub limit: usize,
}

/// Runs the watch command.
pub async fn run(args: &WatchArgs, cli: &Cli) -> Result<()> {
    let client = commands::client(cli).await?;

    let filter = QuestionFilter {
        category: args.category.clone(),
        ..QuestionFilter::default()
    };
    let options = LiveOptions {
        step: args.step,
        delay: Duration::from_secs(args.interval),
        include_first_batch: args.backlog,
    };

    info!(interval = args.interval, category = ?args.category, "watching for new questions");

    if cli.format == OutputFormat::Text && !cli.quiet {
        println!(
            "Watching for new questions every {}s. Ctrl-C to stop.",
            args.interval
        );
    }

    let text = TextFormatter::new(!cli.no_color);
    // One JSON object per line so the output can be piped into `jq`.
    let json = JsonFormatter::new(false);

    let mut batches = std::pin::pin!(client.new_questions(filter, &options).into_stream());
    let mut seen = 0usize;

    while let Some(batch) = batches.next().await {
        let batch = batch?;
        for preview in &batch {
            match cli.format {
                OutputFormat::Json => println!("{}", json.format(preview)?),
                OutputFormat::Text => println!("{}", text.question_row(preview)),
            }
            seen += 1;
            if args.limit != 0 && seen >= args.limit {
                return Ok(());
            }
        }
    }

    Ok(())
}
