//! Whoami command - show the stored session's profile.

use anyhow::Result;

use crate::commands;
use crate::output::{JsonFormatter, TextFormatter};
use crate::{Cli, OutputFormat};

/// Runs the whoami command.
pub async fn run(cli: &Cli) -> Result<()> {
    let client = commands::authenticated_client(cli).await?;
    let profile = client.user_profile(None).await?;

    match cli.format {
        OutputFormat::Json => {
            println!("{}", JsonFormatter::new(cli.pretty).format(&profile)?);
        }
        OutputFormat::Text => {
            println!("{}", TextFormatter::new(!cli.no_color).profile(&profile));
        }
    }

    Ok(())
}
