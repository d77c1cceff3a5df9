//! Questions command - list questions from the main feeds.

use anyhow::Result;
use clap::Args;
use tracing::info;

use otvet_client::QuestionFilter;
use otvet_core::{QuestionPreview, QuestionState};

use crate::commands::{self, StateFilter};
use crate::output::{JsonFormatter, TextFormatter};
use crate::{Cli, OutputFormat};

/// Arguments for the questions command.
#[derive(Args)]
pub struct QuestionsArgs {
    /// Category to list, by urlname or display name.
    #[arg(long, short)]
    pub category: Option<String>,

    /// Question state to list (open when not given).
    #[arg(long, short, value_enum)]
    pub state: Option<StateFilter>,

    /// Only questions promoted to the leaders block.
    #[arg(long)]
    pub leaders: bool,

    /// Maximum number of questions to print.
    #[arg(long, short = 'n', default_value = "20")]
    pub limit: usize,
}

impl Default for QuestionsArgs {
    fn default() -> Self {
        Self {
            category: None,
            state: None,
            leaders: false,
            limit: 20,
        }
    }
}

/// Runs the questions command.
pub async fn run(args: &QuestionsArgs, cli: &Cli) -> Result<()> {
    let client = commands::client(cli).await?;

    let state = match args.state {
        Some(filter) => filter.to_state(),
        None => Some(QuestionState::Open),
    };
    let filter = QuestionFilter {
        state,
        category: args.category.clone(),
        category_exclude: None,
        leaders_only: args.leaders,
    };

    info!(?state, category = ?args.category, limit = args.limit, "listing questions");

    let mut pages = client.questions(filter, 20);
    let mut items: Vec<QuestionPreview> = Vec::new();
    while items.len() < args.limit {
        match pages.try_next().await? {
            Some(page) => items.extend(page),
            None => break,
        }
    }
    items.truncate(args.limit);

    match cli.format {
        OutputFormat::Json => {
            println!("{}", JsonFormatter::new(cli.pretty).format(&items)?);
        }
        OutputFormat::Text => {
            if items.is_empty() {
                println!("No questions found.");
                return Ok(());
            }
            let formatter = TextFormatter::new(!cli.no_color);
            for item in &items {
                println!("{}", formatter.question_row(item));
            }
        }
    }

    Ok(())
}
