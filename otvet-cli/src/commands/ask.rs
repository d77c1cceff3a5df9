//! Ask command - post a question or start a poll.

use anyhow::Result;
use clap::Args;
use serde_json::json;
use tracing::info;

use otvet_client::AskOptions;
use otvet_core::question_url;

use crate::commands;
use crate::output::JsonFormatter;
use crate::{Cli, OutputFormat};

/// Arguments for the ask command.
#[derive(Args)]
pub struct AskArgs {
    /// Question title.
    pub title: String,

    /// Category to ask in, by urlname or display name. Must be a leaf
    /// category; see `otvet categories`.
    #[arg(long, short)]
    pub category: String,

    /// Body text under the title.
    #[arg(long, short, default_value = "")]
    pub text: String,

    /// Turn the question into a poll with this option (repeatable).
    #[arg(long = "poll-option", value_name = "TEXT")]
    pub poll_options: Vec<String>,

    /// Allow voting for several poll options at once.
    #[arg(long, requires = "poll_options")]
    pub multiple: bool,

    /// Disallow comments on answers.
    #[arg(long)]
    pub no_comments: bool,

    /// Do not watch the question for new answers.
    #[arg(long)]
    pub no_watch: bool,
}

/// Runs the ask command.
pub async fn run(args: &AskArgs, cli: &Cli) -> Result<()> {
    let client = commands::authenticated_client(cli).await?;

    let options = AskOptions {
        text: args.text.clone(),
        allow_comments: !args.no_comments,
        watch: !args.no_watch,
    };

    let question_id = if args.poll_options.is_empty() {
        client
            .add_question(&args.category, &args.title, &options)
            .await?
    } else {
        client
            .add_poll(
                &args.category,
                &args.title,
                &args.poll_options,
                args.multiple,
                &options,
            )
            .await?
    };

    info!(question_id, "question posted");

    match cli.format {
        OutputFormat::Json => {
            let out = json!({ "questionId": question_id, "url": question_url(question_id) });
            println!("{}", JsonFormatter::new(cli.pretty).format(&out)?);
        }
        OutputFormat::Text => {
            println!("Question posted: {}", question_url(question_id));
        }
    }

    Ok(())
}
