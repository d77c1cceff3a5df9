//! Login command - authenticate against the Mail.ru portal and store the
//! session for later invocations.

use std::io::{BufRead, Write};

use anyhow::Result;
use clap::Args;
use tracing::info;

use crate::commands;
use crate::output::{JsonFormatter, TextFormatter};
use crate::store;
use crate::{Cli, OutputFormat};

/// Arguments for the login command.
#[derive(Args)]
pub struct LoginArgs {
    /// Mail.ru login. A bare name gets "@mail.ru" appended.
    pub login: String,

    /// Password. Prompted for when not given.
    #[arg(long, short)]
    pub password: Option<String>,
}

/// Runs the login command.
pub async fn run(args: &LoginArgs, cli: &Cli) -> Result<()> {
    let password = match &args.password {
        Some(password) => password.clone(),
        None => read_password()?,
    };

    let client = commands::anonymous_client(cli)?;
    client.authenticate(&args.login, &password).await?;

    let snapshot = client.auth_snapshot().await;
    let path = commands::session_path(cli);
    store::save_snapshot(&path, &snapshot).await?;

    info!(user_id = ?snapshot.user_id, "logged in");

    let profile = client.user_profile(None).await?;
    match cli.format {
        OutputFormat::Json => {
            println!("{}", JsonFormatter::new(cli.pretty).format(&profile)?);
        }
        OutputFormat::Text => {
            let formatter = TextFormatter::new(!cli.no_color);
            println!(
                "Logged in as {} ({})",
                formatter.bold(&profile.name),
                profile.rate.name
            );
            println!("Session saved to {}", path.display());
        }
    }

    Ok(())
}

/// Runs the logout command.
pub async fn logout(cli: &Cli) -> Result<()> {
    let path = commands::session_path(cli);
    if store::delete_snapshot(&path).await? {
        println!("Session removed from {}", path.display());
    } else {
        println!("No saved session.");
    }
    Ok(())
}

/// Prompts for the password on stderr and reads it from stdin.
///
/// The input is echoed; pass `--password` to skip the prompt.
fn read_password() -> Result<String> {
    eprint!("Password: ");
    std::io::stderr().flush()?;

    let mut line = String::new();
    std::io::stdin().lock().read_line(&mut line)?;
    let password = line.trim_end_matches(['\r', '\n']).to_owned();
    if password.is_empty() {
        anyhow::bail!("Empty password");
    }
    Ok(password)
}
