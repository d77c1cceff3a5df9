// Lint configuration for this crate
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! Otvet CLI - otvet.mail.ru from the command line.
//!
//! # Examples
//!
//! ```bash
//! # List open questions across all categories
//! otvet
//!
//! # List questions in one category
//! otvet questions --category computers
//!
//! # Show a question with its answers
//! otvet question 243000001
//!
//! # Full-text search
//! otvet search "не заводится" --days 7
//!
//! # Log in and keep the session
//! otvet login someone@mail.ru
//!
//! # Poll for new questions and answer one
//! otvet watch --category computers
//! otvet answer 243000001 "Проверьте аккумулятор."
//!
//! # JSON output
//! otvet questions --format json --pretty
//! ```

mod commands;
mod output;
mod store;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use otvet_client::OtvetError;

use commands::{answer, ask, login, question, questions, search, watch, whoami};
use output::{JsonFormatter, TextFormatter};

// ============================================================================
// CLI Definition
// ============================================================================

/// Otvet CLI - the otvet.mail.ru Q&A service from the command line.
#[derive(Parser)]
#[command(name = "otvet")]
#[command(about = "Command-line client for otvet.mail.ru")]
#[command(long_about = r#"
Browse, search, watch, and answer questions on otvet.mail.ru.

Reading works anonymously. Posting needs a Mail.ru account: run
`otvet login` once and the session is stored under your config
directory for later invocations.

Examples:
  otvet                              # Open questions, newest first
  otvet questions -c computers       # One category
  otvet question 243000001           # One question with answers
  otvet search "не заводится"        # Full-text search
  otvet watch -c computers           # Poll for new questions
  otvet answer 243000001 "text"      # Post an answer
  otvet --format json questions      # JSON output
"#)]
#[command(version)]
#[command(author = "otvet-rs contributors")]
pub struct Cli {
    /// Subcommand to run. If none, runs 'questions' by default.
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Output format (text or json).
    #[arg(long, short = 'f', default_value = "text", global = true)]
    pub format: OutputFormat,

    /// Pretty-print JSON output.
    #[arg(long, global = true)]
    pub pretty: bool,

    /// Service origin to talk to instead of https://otvet.mail.ru.
    #[arg(long, value_name = "URL", global = true)]
    pub base_url: Option<String>,

    /// Session file to use instead of the default location.
    #[arg(long, value_name = "PATH", global = true)]
    pub session: Option<std::path::PathBuf>,

    /// Verbose output (show debug info).
    #[arg(long, short, global = true)]
    pub verbose: bool,

    /// Disable colored output.
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Quiet mode (minimal output).
    #[arg(long, short, global = true)]
    pub quiet: bool,
}

/// CLI commands.
#[derive(Subcommand)]
pub enum Commands {
    /// List questions (default if no command specified).
    #[command(visible_alias = "q")]
    Questions(questions::QuestionsArgs),

    /// Show one question with its answers.
    Question(question::QuestionArgs),

    /// Search questions by text.
    #[command(visible_alias = "s")]
    Search(search::SearchArgs),

    /// Poll for new questions as they arrive.
    #[command(visible_alias = "w")]
    Watch(watch::WatchArgs),

    /// Post an answer to a question.
    #[command(visible_alias = "a")]
    Answer(answer::AnswerArgs),

    /// Ask a question or start a poll.
    Ask(ask::AskArgs),

    /// Log in to Mail.ru and store the session.
    Login(login::LoginArgs),

    /// Delete the stored session.
    Logout,

    /// Show the logged-in user's profile.
    Whoami,

    /// Print the category tree.
    Categories,

    /// Show what remains of today's posting quotas.
    Limits,
}

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Default)]
pub enum OutputFormat {
    /// Human-readable text with colors.
    #[default]
    Text,
    /// JSON output for scripting.
    Json,
}

/// CLI exit codes.
#[repr(i32)]
pub enum ExitCode {
    /// Success.
    Success = 0,
    /// General error.
    Error = 1,
    /// Not logged in, or the login failed.
    Auth = 2,
    /// The service rejected the request.
    Api = 3,
}

// ============================================================================
// Logging Setup
// ============================================================================

fn setup_logging(verbose: bool, quiet: bool) {
    if quiet {
        return; // No logging in quiet mode
    }

    let filter = if verbose {
        EnvFilter::new("otvet_client=debug,otvet_cli=debug,info")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(false)
                .without_time()
                .with_writer(std::io::stderr),
        )
        .with(filter)
        .init();
}

// ============================================================================
// Main Entry Point
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    let result = match &cli.command {
        Some(Commands::Questions(args)) => questions::run(args, &cli).await,
        Some(Commands::Question(args)) => question::run(args, &cli).await,
        Some(Commands::Search(args)) => search::run(args, &cli).await,
        Some(Commands::Watch(args)) => watch::run(args, &cli).await,
        Some(Commands::Answer(args)) => answer::run(args, &cli).await,
        Some(Commands::Ask(args)) => ask::run(args, &cli).await,
        Some(Commands::Login(args)) => login::run(args, &cli).await,
        Some(Commands::Logout) => login::logout(&cli).await,
        Some(Commands::Whoami) => whoami::run(&cli).await,
        Some(Commands::Categories) => run_categories(&cli).await,
        Some(Commands::Limits) => run_limits(&cli).await,
        None => {
            // Default to the questions listing
            questions::run(&questions::QuestionsArgs::default(), &cli).await
        }
    };

    if let Err(e) = result {
        if !cli.quiet {
            eprintln!("Error: {e:#}");
        }
        std::process::exit(exit_code_for(&e) as i32);
    }

    Ok(())
}

/// Picks the exit code for a failed command.
fn exit_code_for(error: &anyhow::Error) -> ExitCode {
    match error.downcast_ref::<OtvetError>() {
        Some(OtvetError::Auth { .. }) => ExitCode::Auth,
        Some(OtvetError::Api { .. }) => ExitCode::Api,
        _ => ExitCode::Error,
    }
}

/// Runs the categories command.
async fn run_categories(cli: &Cli) -> Result<()> {
    let client = commands::client(cli).await?;
    let categories = client.categories().await?;

    if cli.format == OutputFormat::Json {
        let all: Vec<_> = categories.iter().collect();
        println!("{}", JsonFormatter::new(cli.pretty).format(&all)?);
        return Ok(());
    }

    let formatter = TextFormatter::new(!cli.no_color);
    let mut roots: Vec<_> = categories.iter().filter(|c| c.parent.is_none()).collect();
    roots.sort_by_key(|c| c.position);

    for root in roots {
        println!("{}", formatter.category_row(root, 0));
        let mut children: Vec<_> = root
            .children
            .iter()
            .filter_map(|&id| categories.by_id(id))
            .collect();
        children.sort_by_key(|c| c.position);
        for child in children {
            println!("{}", formatter.category_row(child, 1));
        }
    }

    Ok(())
}

/// Runs the limits command.
async fn run_limits(cli: &Cli) -> Result<()> {
    let client = commands::authenticated_client(cli).await?;
    let limits = client.limits().await?;

    match cli.format {
        OutputFormat::Json => {
            println!("{}", JsonFormatter::new(cli.pretty).format(&limits)?);
        }
        OutputFormat::Text => {
            println!("{}", TextFormatter::new(!cli.no_color).limits(&limits));
        }
    }

    Ok(())
}
