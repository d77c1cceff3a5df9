//! Checked call execution.
//!
//! Every logical API operation goes through [`run_checked`], which layers
//! two recoveries over a raw transport attempt:
//!
//! 1. a bounded retry budget for connection-level failures, with a fixed
//!    backoff sleep between attempts, then one final attempt whose outcome
//!    stands either way;
//! 2. a single renew-and-reissue cycle when the server reports an expired
//!    session token.
//!
//! The transport itself hides behind [`CallRunner`] so the state machine is
//! testable without a network.

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::OtvetError;
use crate::retry::RetryPolicy;

// ============================================================================
// Request parameters
// ============================================================================

/// Ordered form/query parameters for one API call.
///
/// Order is preserved because the service's form endpoints accept repeated
/// keys (`vote[]`, `poll_options[]`) whose sequence matters.
#[derive(Debug, Clone, Default)]
pub(crate) struct Params(Vec<(&'static str, String)>);

impl Params {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Appends one parameter.
    pub(crate) fn arg(mut self, key: &'static str, value: impl ToString) -> Self {
        self.0.push((key, value.to_string()));
        self
    }

    /// Appends the parameter only when a value is present.
    pub(crate) fn arg_opt(mut self, key: &'static str, value: Option<impl ToString>) -> Self {
        if let Some(value) = value {
            self.0.push((key, value.to_string()));
        }
        self
    }

    /// Appends the key once per value, for the service's `key[]` lists.
    pub(crate) fn arg_each<T: ToString>(
        mut self,
        key: &'static str,
        values: impl IntoIterator<Item = T>,
    ) -> Self {
        for value in values {
            self.0.push((key, value.to_string()));
        }
        self
    }

    pub(crate) fn pairs(&self) -> &[(&'static str, String)] {
        &self.0
    }
}

/// Where a call goes on the wire.
#[derive(Debug, Clone, Copy)]
pub(crate) enum Target<'a> {
    /// POST through the `/api/` gateway; the value names the method and is
    /// sent as the `__urlp` form field.
    Api(&'a str),
    /// GET the URL directly with query parameters. Used for the search
    /// proxy, which lives outside the gateway.
    Direct(&'a str),
}

// ============================================================================
// Raw outcomes and the runner seam
// ============================================================================

/// What one raw transport attempt produced.
#[derive(Debug)]
pub(crate) enum RawOutcome {
    /// Connection-level failure; eligible for the retry budget.
    Transient(OtvetError),
    /// The server answered with a JSON body (of any status).
    Reply(Value),
}

/// One logical call, bound to its transport and session.
///
/// `attempt` performs a single raw request. Connection-level failures come
/// back as [`RawOutcome::Transient`]; failures that retrying cannot fix are
/// returned as errors directly.
#[async_trait]
pub(crate) trait CallRunner: Send + Sync {
    /// Performs one raw transport attempt.
    async fn attempt(&self) -> Result<RawOutcome, OtvetError>;

    /// Refreshes session credentials after the server reported an expired
    /// token.
    async fn renew(&self) -> Result<(), OtvetError>;
}

// ============================================================================
// Response inspection
// ============================================================================

/// Application-level judgement of a reply body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Verdict {
    /// Status below 400.
    Accepted,
    /// The session token expired; renewal may help.
    ExpiredToken(u16),
    /// Any other application failure.
    Rejected(u16),
}

/// Reads the body-level `status` field: absent means 200, and numbers
/// arrive both bare and as strings.
fn status_code(reply: &Value) -> Result<u16, OtvetError> {
    match reply.get("status") {
        None => Ok(200),
        Some(Value::Number(n)) => n
            .as_u64()
            .and_then(|n| u16::try_from(n).ok())
            .ok_or_else(|| OtvetError::parse(format!("status out of range: {n}"))),
        Some(Value::String(s)) => s
            .trim()
            .parse::<u16>()
            .map_err(|_| OtvetError::parse(format!("non-numeric status: {s:?}"))),
        Some(other) => Err(OtvetError::parse(format!("unexpected status value: {other}"))),
    }
}

fn error_code(reply: &Value) -> String {
    reply
        .get("error")
        .and_then(Value::as_str)
        .unwrap_or("unknown")
        .to_string()
}

fn inspect(reply: &Value) -> Result<Verdict, OtvetError> {
    let status = status_code(reply)?;
    if status < 400 {
        return Ok(Verdict::Accepted);
    }
    if reply.get("error").and_then(Value::as_str) == Some("invalid_token") {
        return Ok(Verdict::ExpiredToken(status));
    }
    Ok(Verdict::Rejected(status))
}

fn api_error(status: u16, response: Value) -> OtvetError {
    OtvetError::Api {
        status,
        code: error_code(&response),
        response,
    }
}

// ============================================================================
// The checked-call state machine
// ============================================================================

/// Runs one attempt and lets its outcome stand: a reply is a reply, a
/// connection failure is the caller's error.
async fn unguarded(runner: &dyn CallRunner) -> Result<Value, OtvetError> {
    match runner.attempt().await? {
        RawOutcome::Reply(value) => Ok(value),
        RawOutcome::Transient(error) => Err(error),
    }
}

/// Executes one logical call with connection retry and one-time token
/// renewal, returning the accepted reply body.
pub(crate) async fn run_checked(
    runner: &dyn CallRunner,
    policy: &RetryPolicy,
    auto_renew: bool,
) -> Result<Value, OtvetError> {
    let mut reply = None;
    for attempt in 1..=policy.max_attempts {
        match runner.attempt().await? {
            RawOutcome::Reply(value) => {
                reply = Some(value);
                break;
            }
            RawOutcome::Transient(error) => {
                warn!(attempt, error = %error, "connection attempt failed, backing off");
                tokio::time::sleep(policy.backoff).await;
            }
        }
    }
    let value = match reply {
        Some(value) => value,
        // Budget exhausted; the last try is on its own.
        None => unguarded(runner).await?,
    };

    match inspect(&value)? {
        Verdict::Accepted => Ok(value),
        Verdict::ExpiredToken(_) if auto_renew => {
            debug!("session token expired, renewing and reissuing once");
            runner.renew().await?;
            let retried = unguarded(runner).await?;
            match inspect(&retried)? {
                Verdict::Accepted => Ok(retried),
                Verdict::ExpiredToken(status) | Verdict::Rejected(status) => {
                    Err(api_error(status, retried))
                }
            }
        }
        Verdict::ExpiredToken(status) | Verdict::Rejected(status) => Err(api_error(status, value)),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    use serde_json::json;

    use super::*;

    /// Runner that replays a script of raw outcomes.
    struct ScriptedRunner {
        script: Mutex<VecDeque<Result<RawOutcome, OtvetError>>>,
        attempts: AtomicU32,
        renewals: AtomicU32,
    }

    impl ScriptedRunner {
        fn new(script: Vec<Result<RawOutcome, OtvetError>>) -> Self {
            Self {
                script: Mutex::new(script.into_iter().collect()),
                attempts: AtomicU32::new(0),
                renewals: AtomicU32::new(0),
            }
        }

        fn attempts(&self) -> u32 {
            self.attempts.load(Ordering::SeqCst)
        }

        fn renewals(&self) -> u32 {
            self.renewals.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl CallRunner for ScriptedRunner {
        async fn attempt(&self) -> Result<RawOutcome, OtvetError> {
            self.attempts.fetch_add(1, Ordering::SeqCst);
            self.script
                .lock()
                .unwrap()
                .pop_front()
                .expect("script ran out of outcomes")
        }

        async fn renew(&self) -> Result<(), OtvetError> {
            self.renewals.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    fn fast() -> RetryPolicy {
        RetryPolicy {
            max_attempts: 3,
            backoff: Duration::ZERO,
        }
    }

    fn dropped() -> Result<RawOutcome, OtvetError> {
        Ok(RawOutcome::Transient(OtvetError::parse(
            "connection dropped",
        )))
    }

    fn ok_reply() -> Result<RawOutcome, OtvetError> {
        Ok(RawOutcome::Reply(json!({"qst": []})))
    }

    fn expired_reply() -> Result<RawOutcome, OtvetError> {
        Ok(RawOutcome::Reply(
            json!({"status": 400, "error": "invalid_token"}),
        ))
    }

    #[tokio::test]
    async fn test_success_on_first_attempt() {
        let runner = ScriptedRunner::new(vec![ok_reply()]);
        let value = run_checked(&runner, &fast(), true).await.unwrap();
        assert_eq!(value, json!({"qst": []}));
        assert_eq!(runner.attempts(), 1);
        assert_eq!(runner.renewals(), 0);
    }

    #[tokio::test]
    async fn test_recovers_within_retry_budget() {
        let runner = ScriptedRunner::new(vec![dropped(), dropped(), ok_reply()]);
        let value = run_checked(&runner, &fast(), true).await.unwrap();
        assert_eq!(value, json!({"qst": []}));
        assert_eq!(runner.attempts(), 3);
    }

    #[tokio::test]
    async fn test_extra_attempt_after_exhausted_budget_succeeds() {
        let runner = ScriptedRunner::new(vec![dropped(), dropped(), dropped(), ok_reply()]);
        let value = run_checked(&runner, &fast(), true).await.unwrap();
        assert_eq!(value, json!({"qst": []}));
        // Three guarded attempts plus the final unguarded one.
        assert_eq!(runner.attempts(), 4);
    }

    #[tokio::test]
    async fn test_extra_attempt_failure_propagates() {
        let runner = ScriptedRunner::new(vec![dropped(), dropped(), dropped(), dropped()]);
        let error = run_checked(&runner, &fast(), true).await.unwrap_err();
        assert!(matches!(error, OtvetError::Parse(_)));
        assert_eq!(runner.attempts(), 4);
        assert_eq!(runner.renewals(), 0);
    }

    #[tokio::test]
    async fn test_hard_transport_error_skips_retry() {
        let runner = ScriptedRunner::new(vec![Err(OtvetError::parse("tls handshake"))]);
        let error = run_checked(&runner, &fast(), true).await.unwrap_err();
        assert!(matches!(error, OtvetError::Parse(_)));
        assert_eq!(runner.attempts(), 1);
    }

    #[tokio::test]
    async fn test_app_error_is_never_retried() {
        let runner = ScriptedRunner::new(vec![Ok(RawOutcome::Reply(
            json!({"status": 404, "error": "question_not_found"}),
        ))]);
        let error = run_checked(&runner, &fast(), true).await.unwrap_err();
        match error {
            OtvetError::Api { status, code, .. } => {
                assert_eq!(status, 404);
                assert_eq!(code, "question_not_found");
            }
            other => panic!("expected Api error, got {other:?}"),
        }
        assert_eq!(runner.attempts(), 1);
        assert_eq!(runner.renewals(), 0);
    }

    #[tokio::test]
    async fn test_expired_token_renews_and_reissues_once() {
        let runner = ScriptedRunner::new(vec![expired_reply(), ok_reply()]);
        let value = run_checked(&runner, &fast(), true).await.unwrap();
        assert_eq!(value, json!({"qst": []}));
        assert_eq!(runner.attempts(), 2);
        assert_eq!(runner.renewals(), 1);
    }

    #[tokio::test]
    async fn test_second_expired_token_is_final() {
        let runner = ScriptedRunner::new(vec![expired_reply(), expired_reply()]);
        let error = run_checked(&runner, &fast(), true).await.unwrap_err();
        match error {
            OtvetError::Api { status, code, .. } => {
                assert_eq!(status, 400);
                assert_eq!(code, "invalid_token");
            }
            other => panic!("expected Api error, got {other:?}"),
        }
        // Renewal must not run a second time.
        assert_eq!(runner.renewals(), 1);
        assert_eq!(runner.attempts(), 2);
    }

    #[tokio::test]
    async fn test_expired_token_without_auto_renew() {
        let runner = ScriptedRunner::new(vec![expired_reply()]);
        let error = run_checked(&runner, &fast(), false).await.unwrap_err();
        assert!(matches!(error, OtvetError::Api { code, .. } if code == "invalid_token"));
        assert_eq!(runner.renewals(), 0);
    }

    #[tokio::test]
    async fn test_renewal_reissue_connection_failure_propagates() {
        let runner = ScriptedRunner::new(vec![expired_reply(), dropped()]);
        let error = run_checked(&runner, &fast(), true).await.unwrap_err();
        assert!(matches!(error, OtvetError::Parse(_)));
        assert_eq!(runner.renewals(), 1);
        assert_eq!(runner.attempts(), 2);
    }

    #[tokio::test]
    async fn test_status_variants() {
        // Absent status counts as 200.
        assert_eq!(status_code(&json!({"qst": []})).unwrap(), 200);
        // Numbers arrive bare and as strings.
        assert_eq!(status_code(&json!({"status": 403})).unwrap(), 403);
        assert_eq!(status_code(&json!({"status": "403"})).unwrap(), 403);
        // Boundary: 399 passes, 400 rejects.
        assert_eq!(inspect(&json!({"status": 399})).unwrap(), Verdict::Accepted);
        assert_eq!(
            inspect(&json!({"status": 400})).unwrap(),
            Verdict::Rejected(400)
        );
        // Garbage is a parse failure, not a silent accept.
        assert!(status_code(&json!({"status": "soon"})).is_err());
        assert!(status_code(&json!({"status": true})).is_err());
    }

    #[test]
    fn test_params_builder() {
        let params = Params::new()
            .arg("n", 20)
            .arg_opt("cat", Some("hardware"))
            .arg_opt("p", None::<u64>)
            .arg_each("vote[]", [3, 5]);
        assert_eq!(
            params.pairs(),
            &[
                ("n", "20".to_string()),
                ("cat", "hardware".to_string()),
                ("vote[]", "3".to_string()),
                ("vote[]", "5".to_string()),
            ]
        );
    }
}
