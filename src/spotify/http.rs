//! Outbound HTTP with bounded retry.
//!
//! Transient upstream failures (HTTP 502, connection reset, timeouts) are
//! retried in a loop with exponential backoff: attempt `n` waits
//! `2^n * base_delay` before the next try. Anything else, including a
//! transient failure once the retry budget is spent, is returned unchanged.

use std::{error::Error as _, future::Future, io, time::Duration};

use reqwest::{Client, RequestBuilder, Response, StatusCode};
use thiserror::Error;
use tokio::time::sleep;
use tracing::{debug, warn};

pub const DEFAULT_MAX_RETRIES: u32 = 2;
pub const DEFAULT_BASE_DELAY: Duration = Duration::from_millis(1000);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Attempts made after the first one.
    pub max_retries: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            base_delay: DEFAULT_BASE_DELAY,
        }
    }
}

impl RetryPolicy {
    pub fn new(max_retries: u32, base_delay: Duration) -> Self {
        Self {
            max_retries,
            base_delay,
        }
    }

    /// Delay slept after the failed attempt `attempt` (0-based).
    pub fn backoff(&self, attempt: u32) -> Duration {
        self.base_delay
            .saturating_mul(2u32.saturating_pow(attempt))
    }
}

#[derive(Debug, Error)]
pub enum HttpError {
    #[error("upstream responded with {status}")]
    Status { status: StatusCode, body: String },

    #[error("upstream request failed: {0}")]
    Transport(#[from] reqwest::Error),
}

impl HttpError {
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            HttpError::Status { status, .. } => Some(*status),
            HttpError::Transport(err) => err.status(),
        }
    }

    /// 502, connection reset and timeouts are worth another attempt.
    pub fn is_transient(&self) -> bool {
        match self {
            HttpError::Status { status, .. } => *status == StatusCode::BAD_GATEWAY,
            HttpError::Transport(err) => err.is_timeout() || is_connection_reset(err),
        }
    }

    /// Upstream body for status errors, transport message otherwise.
    pub fn detail(&self) -> String {
        match self {
            HttpError::Status { body, .. } => body.clone(),
            HttpError::Transport(err) => err.to_string(),
        }
    }
}

fn is_connection_reset(err: &reqwest::Error) -> bool {
    let mut source = err.source();
    while let Some(inner) = source {
        if let Some(io_err) = inner.downcast_ref::<io::Error>() {
            if matches!(
                io_err.kind(),
                io::ErrorKind::ConnectionReset
                    | io::ErrorKind::ConnectionAborted
                    | io::ErrorKind::TimedOut
            ) {
                return true;
            }
        }
        source = inner.source();
    }
    false
}

/// Runs `op` until it succeeds, fails with a non-transient error, or the
/// policy's retry budget is exhausted. `op` receives the 0-based attempt.
pub async fn with_retry<T, F, Fut>(policy: &RetryPolicy, mut op: F) -> Result<T, HttpError>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, HttpError>>,
{
    let mut attempt = 0;
    loop {
        match op(attempt).await {
            Ok(value) => return Ok(value),
            Err(err) if err.is_transient() && attempt < policy.max_retries => {
                let delay = policy.backoff(attempt);
                warn!(
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    error = %err,
                    "transient upstream failure, retrying"
                );
                sleep(delay).await;
                attempt += 1;
            }
            Err(err) => return Err(err),
        }
    }
}

/// reqwest client wrapped with the retry policy.
#[derive(Debug, Clone)]
pub struct RetryingHttpClient {
    http: Client,
    policy: RetryPolicy,
}

impl RetryingHttpClient {
    pub fn new(http: Client, policy: RetryPolicy) -> Self {
        Self { http, policy }
    }

    /// Sends the request produced by `build`, rebuilding it for every attempt.
    /// Non-2xx answers come back as [`HttpError::Status`] with the body read.
    pub async fn execute<B>(&self, build: B) -> Result<Response, HttpError>
    where
        B: Fn(&Client) -> RequestBuilder,
    {
        with_retry(&self.policy, |attempt| {
            let request = build(&self.http);
            async move {
                let response = request.send().await?;
                let status = response.status();
                debug!(attempt, url = %response.url(), status = status.as_u16(), "upstream response");

                if status.is_success() {
                    return Ok(response);
                }

                let body = response.text().await.unwrap_or_default();
                Err(HttpError::Status { status, body })
            }
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{
        Arc,
        atomic::{AtomicU32, Ordering},
    };

    use super::*;

    fn bad_gateway() -> HttpError {
        HttpError::Status {
            status: StatusCode::BAD_GATEWAY,
            body: "upstream hiccup".to_string(),
        }
    }

    #[test]
    fn test_backoff_doubles_from_one_second() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.backoff(0), Duration::from_millis(1000));
        assert_eq!(policy.backoff(1), Duration::from_millis(2000));
        assert_eq!(policy.backoff(2), Duration::from_millis(4000));
    }

    #[test]
    fn test_only_bad_gateway_status_is_transient() {
        assert!(bad_gateway().is_transient());
        for status in [
            StatusCode::BAD_REQUEST,
            StatusCode::NOT_FOUND,
            StatusCode::TOO_MANY_REQUESTS,
            StatusCode::INTERNAL_SERVER_ERROR,
            StatusCode::SERVICE_UNAVAILABLE,
        ] {
            let err = HttpError::Status {
                status,
                body: String::new(),
            };
            assert!(!err.is_transient(), "{status} should not be retried");
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_always_failing_call_is_attempted_three_times() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&calls);

        let result: Result<(), HttpError> = with_retry(&RetryPolicy::default(), |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            async { Err(bad_gateway()) }
        })
        .await;

        assert_eq!(calls.load(Ordering::SeqCst), 3);
        match result {
            Err(HttpError::Status { status, body }) => {
                assert_eq!(status, StatusCode::BAD_GATEWAY);
                assert_eq!(body, "upstream hiccup");
            }
            other => panic!("expected the last 502 to propagate, got {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_backoff_delays_are_slept() {
        let started = tokio::time::Instant::now();
        let _: Result<(), HttpError> =
            with_retry(&RetryPolicy::default(), |_| async { Err(bad_gateway()) }).await;

        // 1s after attempt 0, 2s after attempt 1
        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_millis(3000), "{elapsed:?}");
        assert!(elapsed < Duration::from_millis(4000), "{elapsed:?}");
    }

    #[tokio::test(start_paused = true)]
    async fn test_recovers_after_transient_failure() {
        let result = with_retry(&RetryPolicy::default(), |attempt| async move {
            if attempt == 0 {
                Err(bad_gateway())
            } else {
                Ok(attempt)
            }
        })
        .await;

        assert_eq!(result.unwrap(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_non_transient_error_is_not_retried() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&calls);
        let started = tokio::time::Instant::now();

        let result: Result<(), HttpError> = with_retry(&RetryPolicy::default(), |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            async {
                Err(HttpError::Status {
                    status: StatusCode::NOT_FOUND,
                    body: String::new(),
                })
            }
        })
        .await;

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(started.elapsed() < Duration::from_millis(1000));
        assert_eq!(result.unwrap_err().status(), Some(StatusCode::NOT_FOUND));
    }
}
