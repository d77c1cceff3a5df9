//! CLI command implementations.

pub mod answer;
pub mod ask;
pub mod login;
pub mod question;
pub mod questions;
pub mod search;
pub mod watch;
pub mod whoami;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::ValueEnum;

use otvet_client::{OtvetClient, OtvetClientBuilder};
use otvet_core::QuestionState;

use crate::Cli;
use crate::store;

// ============================================================================
// Shared argument types
// ============================================================================

/// Question state filter exposed by the listing commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StateFilter {
    /// Accepting answers.
    Open,
    /// Best-answer vote running.
    Vote,
    /// Closed with a best answer.
    Resolved,
    /// Every state.
    All,
}

impl StateFilter {
    /// The state this filter selects; `None` selects all.
    pub fn to_state(self) -> Option<QuestionState> {
        match self {
            Self::Open => Some(QuestionState::Open),
            Self::Vote => Some(QuestionState::Vote),
            Self::Resolved => Some(QuestionState::Resolve),
            Self::All => None,
        }
    }
}

// ============================================================================
// Client construction
// ============================================================================

/// Path the session snapshot is stored at.
pub fn session_path(cli: &Cli) -> PathBuf {
    cli.session
        .clone()
        .unwrap_or_else(store::default_session_path)
}

fn base_builder(cli: &Cli) -> OtvetClientBuilder {
    let mut builder = OtvetClient::builder();
    if let Some(base_url) = &cli.base_url {
        builder = builder.base_url(base_url.clone());
    }
    builder
}

/// Client without any stored session, for logging in.
pub fn anonymous_client(cli: &Cli) -> Result<OtvetClient> {
    Ok(base_builder(cli).build()?)
}

/// Client restored from the stored session when one exists, anonymous
/// otherwise.
pub async fn client(cli: &Cli) -> Result<OtvetClient> {
    let mut builder = base_builder(cli);
    if let Some(snapshot) = store::load_snapshot(&session_path(cli)).await? {
        builder = builder.snapshot(snapshot);
    }
    Ok(builder.build()?)
}

/// Client restored from the stored session; errors when none exists.
pub async fn authenticated_client(cli: &Cli) -> Result<OtvetClient> {
    let path = session_path(cli);
    let snapshot = store::load_snapshot(&path).await?.with_context(|| {
        format!(
            "No saved session at {}. Run `otvet login` first.",
            path.display()
        )
    })?;
    Ok(base_builder(cli).snapshot(snapshot).build()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_filter_mapping() {
        assert_eq!(StateFilter::Open.to_state(), Some(QuestionState::Open));
        assert_eq!(StateFilter::Vote.to_state(), Some(QuestionState::Vote));
        assert_eq!(StateFilter::Resolved.to_state(), Some(QuestionState::Resolve));
        assert_eq!(StateFilter::All.to_state(), None);
    }
}
