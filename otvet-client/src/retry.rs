//! Retry policy for connection-level failures.

use std::time::Duration;

/// How checked calls respond to connection-level failures.
///
/// This is configuration, not state: the same policy applies to every call
/// made through the client it is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Guarded transport attempts per logical call.
    pub max_attempts: u32,
    /// Sleep between attempts.
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff: Duration::from_secs(1),
        }
    }
}

/// Whether a transport error is worth another attempt.
///
/// Only connection-level failures qualify. Anything else (TLS setup,
/// malformed responses, redirect loops) is deterministic and retrying
/// would just repeat it.
pub(crate) fn is_transient(error: &reqwest::Error) -> bool {
    error.is_connect() || error.is_timeout()
}
