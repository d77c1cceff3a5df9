//! Answer command - post an answer to a question.

use std::io::Read;

use anyhow::Result;
use clap::Args;
use serde_json::json;
use tracing::info;

use otvet_core::answer_url;

use crate::commands;
use crate::output::JsonFormatter;
use crate::{Cli, OutputFormat};

/// Arguments for the answer command.
#[derive(Args)]
pub struct AnswerArgs {
    /// Question id to answer.
    pub question: u64,

    /// Answer text. Read from stdin when not given.
    pub text: Option<String>,
}

/// Runs the answer command.
pub async fn run(args: &AnswerArgs, cli: &Cli) -> Result<()> {
    let text = match &args.text {
        Some(text) => text.clone(),
        None => read_stdin()?,
    };
    if text.trim().is_empty() {
        anyhow::bail!("Empty answer text");
    }

    let client = commands::authenticated_client(cli).await?;
    let answer_id = client.add_answer(args.question, &text).await?;

    info!(answer_id, question = args.question, "answer posted");

    match cli.format {
        OutputFormat::Json => {
            let out = json!({ "answerId": answer_id, "url": answer_url(answer_id) });
            println!("{}", JsonFormatter::new(cli.pretty).format(&out)?);
        }
        OutputFormat::Text => {
            println!("Answer posted: {}", answer_url(answer_id));
        }
    }

    Ok(())
}

/// Reads the answer body from stdin, up to EOF.
fn read_stdin() -> Result<String> {
    let mut text = String::new();
    std::io::stdin().lock().read_to_string(&mut text)?;
    Ok(text)
}
