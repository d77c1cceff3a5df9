//! Session state and bootstrap page parsing.
//!
//! The API carries no real login endpoint of its own. A browser session is
//! established by the portal: after SSO the main page embeds a per-session
//! `salt` and the user id in an inline script, while the `ot` cookie holds the
//! signing token. This module extracts those markers and models the resulting
//! session, including the snapshot form that can be persisted between runs.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

use otvet_core::CategoryNode;

use crate::error::OtvetError;

// ============================================================================
// Page Patterns
// ============================================================================

/// Pattern for the session salt embedded in the main page.
static SALT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""salt" : "([a-zA-Z0-9]+)""#).expect("Invalid regex"));

/// Pattern for the authenticated user id.
static USER_ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""id" : "([0-9]+)""#).expect("Invalid regex"));

/// Pattern for the adult-content flag.
static IS_ADULT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""is_adult" : (true|false),"#).expect("Invalid regex"));

/// Pattern for the inline category catalog. The JSON array starts on this
/// line but may run further, so only a parse of the prefix is meaningful.
static CATEGORIES_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"var CATEGORIES = (\[.*)").expect("Invalid regex"));

// ============================================================================
// Session State
// ============================================================================

/// Token pair required to sign API calls.
///
/// The token comes from the `ot` cookie, the salt from the main page. They
/// are only ever valid together.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct AuthTokens {
    pub(crate) token: String,
    pub(crate) salt: String,
}

/// Everything the client knows about the current session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct SessionState {
    /// Signing tokens, absent for anonymous sessions.
    pub(crate) auth: Option<AuthTokens>,
    /// Id of the authenticated user.
    pub(crate) user_id: Option<u64>,
    /// Adult-content flag from the main page. `None` until a logged-in
    /// bootstrap has run.
    pub(crate) is_adult: Option<bool>,
}

impl SessionState {
    /// Query parameters that sign an API call. Empty for anonymous sessions.
    pub(crate) fn auth_params(&self) -> Vec<(&'static str, String)> {
        match &self.auth {
            Some(tokens) => vec![
                ("token", tokens.token.clone()),
                ("salt", tokens.salt.clone()),
            ],
            None => Vec::new(),
        }
    }

    /// Restores a session from a previously exported snapshot.
    ///
    /// The token and salt must be present together or not at all; a snapshot
    /// carrying only one of them cannot sign calls and is rejected.
    pub(crate) fn from_snapshot(snapshot: &AuthSnapshot) -> Result<Self, OtvetError> {
        let auth = match (&snapshot.token, &snapshot.salt) {
            (Some(token), Some(salt)) => Some(AuthTokens {
                token: token.clone(),
                salt: salt.clone(),
            }),
            (None, None) => None,
            _ => {
                return Err(OtvetError::parse(
                    "auth snapshot must carry both token and salt, or neither",
                ));
            }
        };
        Ok(Self {
            auth,
            user_id: snapshot.user_id,
            is_adult: None,
        })
    }

    /// Exports the session together with the SSO cookie for later reuse.
    pub(crate) fn snapshot(&self, cookie: Option<String>) -> AuthSnapshot {
        AuthSnapshot {
            token: self.auth.as_ref().map(|tokens| tokens.token.clone()),
            salt: self.auth.as_ref().map(|tokens| tokens.salt.clone()),
            user_id: self.user_id,
            cookie,
        }
    }
}

/// Serializable form of an authenticated session.
///
/// Produced by [`OtvetClient::auth_snapshot`](crate::OtvetClient::auth_snapshot)
/// and accepted back by the client builder, so a login survives process
/// restarts without storing the password.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthSnapshot {
    /// Signing token from the `ot` cookie.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    /// Per-session salt from the main page.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub salt: Option<String>,
    /// Id of the authenticated user.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<u64>,
    /// Value of the portal SSO cookie (`Mpop`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cookie: Option<String>,
}

// ============================================================================
// Page Parsing
// ============================================================================

/// Login markers scraped from the main page of a logged-in session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct PageMarkers {
    pub(crate) salt: String,
    pub(crate) user_id: u64,
    pub(crate) is_adult: bool,
}

/// Extracts the login markers from the main page.
///
/// Only meaningful when the session cookie is present; a page served to an
/// anonymous visitor does not carry them and parsing fails.
pub(crate) fn extract_markers(page: &str) -> Result<PageMarkers, OtvetError> {
    let salt = capture(&SALT_RE, page)
        .ok_or_else(|| OtvetError::parse("session salt not found on the main page"))?
        .to_owned();
    let user_id = capture(&USER_ID_RE, page)
        .ok_or_else(|| OtvetError::parse("user id not found on the main page"))?
        .parse::<u64>()
        .map_err(|_| OtvetError::parse("user id on the main page is not a number"))?;
    let is_adult = capture(&IS_ADULT_RE, page)
        .ok_or_else(|| OtvetError::parse("adult flag not found on the main page"))?
        == "true";
    Ok(PageMarkers {
        salt,
        user_id,
        is_adult,
    })
}

/// Extracts the category catalog embedded in the main page.
///
/// The catalog is a JSON array assigned to a script variable; everything
/// after the closing bracket on that line is ignored.
pub(crate) fn extract_categories(page: &str) -> Result<Vec<CategoryNode>, OtvetError> {
    let tail = capture(&CATEGORIES_RE, page)
        .ok_or_else(|| OtvetError::parse("category catalog not found on the main page"))?;
    let mut deserializer = serde_json::Deserializer::from_str(tail);
    let roots = Vec::<CategoryNode>::deserialize(&mut deserializer)?;
    Ok(roots)
}

fn capture<'a>(pattern: &Regex, page: &'a str) -> Option<&'a str> {
    pattern
        .captures(page)
        .and_then(|captures| captures.get(1))
        .map(|group| group.as_str())
}

// ============================================================================
// Tests
// ============================================================================
