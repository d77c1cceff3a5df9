//! Client error types.

use serde_json::Value;
use thiserror::Error;

/// Error type for client operations.
#[derive(Debug, Error)]
pub enum OtvetError {
    /// A local precondition failed; no request was made.
    #[error("{0}")]
    Argument(String),

    /// Logging in did not produce an authenticated session.
    #[error("Authentication failed for {login:?}")]
    Auth {
        /// The login that was attempted, with the default domain applied.
        login: String,
    },

    /// The server rejected the call after all local recovery.
    #[error("API error {status}: {code}")]
    Api {
        /// HTTP-style status the service put in the response body.
        status: u16,
        /// The service's error code string.
        code: String,
        /// The response body as received.
        response: Value,
    },

    /// A page or response did not have the structure this client expects.
    #[error("Unexpected response structure: {0}")]
    Parse(String),

    /// JSON decoding failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP transport failure.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl OtvetError {
    /// Shorthand for an [`OtvetError::Argument`].
    pub(crate) fn argument(message: impl Into<String>) -> Self {
        Self::Argument(message.into())
    }

    /// Shorthand for an [`OtvetError::Parse`].
    pub(crate) fn parse(message: impl Into<String>) -> Self {
        Self::Parse(message.into())
    }
}
