//! Question command - show one question with its answers.

use anyhow::Result;
use clap::Args;

use crate::commands;
use crate::output::{JsonFormatter, TextFormatter};
use crate::{Cli, OutputFormat};

/// Arguments for the question command.
#[derive(Args)]
pub struct QuestionArgs {
    /// Question id.
    pub id: u64,

    /// Number of answers to fetch with the question.
    #[arg(long, short = 'n', default_value = "10")]
    pub answers: u32,
}

/// Runs the question command.
pub async fn run(args: &QuestionArgs, cli: &Cli) -> Result<()> {
    let client = commands::client(cli).await?;
    let question = client.question(args.id, args.answers).await?;

    match cli.format {
        OutputFormat::Json => {
            println!("{}", JsonFormatter::new(cli.pretty).format(&question)?);
        }
        OutputFormat::Text => {
            println!(
                "{}",
                TextFormatter::new(!cli.no_color).question_detail(&question)
            );
        }
    }

    Ok(())
}
