//! Search command - full-text question search.

use anyhow::Result;
use clap::Args;
use tracing::info;

use otvet_client::SearchOptions;
use otvet_core::QuestionSearchResult;

use crate::commands::{self, StateFilter};
use crate::output::{JsonFormatter, TextFormatter};
use crate::{Cli, OutputFormat};

/// Arguments for the search command.
#[derive(Args)]
pub struct SearchArgs {
    /// Text to search for.
    pub query: String,

    /// Only questions in this category.
    #[arg(long, short)]
    pub category: Option<String>,

    /// Only questions in this state.
    #[arg(long, short, value_enum)]
    pub state: Option<StateFilter>,

    /// Only questions younger than this many days.
    #[arg(long, value_name = "DAYS")]
    pub days: Option<f64>,

    /// Order by date instead of relevance.
    #[arg(long)]
    pub by_date: bool,

    /// Match question text only, not answer text.
    #[arg(long)]
    pub questions_only: bool,

    /// Maximum number of results to print.
    #[arg(long, short = 'n', default_value = "20")]
    pub limit: usize,
}

/// Runs the search command.
pub async fn run(args: &SearchArgs, cli: &Cli) -> Result<()> {
    let client = commands::client(cli).await?;

    let options = SearchOptions {
        sort_by_date: args.by_date,
        state: args.state.and_then(StateFilter::to_state),
        category: args.category.clone(),
        last_days: args.days,
        questions_only: args.questions_only,
    };

    info!(query = %args.query, limit = args.limit, "searching");

    let mut pages = client.search(args.query.clone(), options, 20);
    let mut items: Vec<QuestionSearchResult> = Vec::new();
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
                println!("Nothing found for {:?}.", args.query);
                return Ok(());
            }
            let formatter = TextFormatter::new(!cli.no_color);
            for item in &items {
                println!("{}", formatter.search_row(item));
            }
        }
    }

    Ok(())
}
