//! Caller-side retries with exponential backoff.
//!
//! The call pipeline never retries on its own. Wrap a facade call in
//! [`with_retry`] to retry transport failures, 429 and 5xx responses.

use std::future::Future;
use std::time::Duration;

use tracing::{debug, warn};

use crate::error::{Error, Result};

// MARK: - Constants

/// Default maximum number of retries.
const DEFAULT_MAX_RETRIES: u32 = 3;

/// Default initial backoff duration (1 second).
const DEFAULT_INITIAL_BACKOFF_MS: u64 = 1000;

/// Default maximum backoff duration (30 seconds).
const DEFAULT_MAX_BACKOFF_MS: u64 = 30_000;

/// Default backoff multiplier.
const DEFAULT_BACKOFF_MULTIPLIER: f64 = 2.0;

// MARK: - Retry Policy

/// Policy for retrying failed calls with exponential backoff.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Maximum number of retries after the first attempt.
    pub max_retries: u32,
    pub initial_backoff_ms: u64,
    pub max_backoff_ms: u64,
    pub backoff_multiplier: f64,
    /// Whether timeouts are retried. A timed-out request may have reached
    /// the service, so non-idempotent callers can turn this off.
    pub retry_on_timeout: bool,
}

impl RetryPolicy {
    pub fn new() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            initial_backoff_ms: DEFAULT_INITIAL_BACKOFF_MS,
            max_backoff_ms: DEFAULT_MAX_BACKOFF_MS,
            backoff_multiplier: DEFAULT_BACKOFF_MULTIPLIER,
            retry_on_timeout: true,
        }
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_initial_backoff(mut self, duration: Duration) -> Self {
        self.initial_backoff_ms = duration.as_millis() as u64;
        self
    }

    pub fn with_max_backoff(mut self, duration: Duration) -> Self {
        self.max_backoff_ms = duration.as_millis() as u64;
        self
    }

    pub fn with_backoff_multiplier(mut self, multiplier: f64) -> Self {
        self.backoff_multiplier = multiplier;
        self
    }

    pub fn with_retry_on_timeout(mut self, retry: bool) -> Self {
        self.retry_on_timeout = retry;
        self
    }

    /// Calculate backoff duration for a given retry attempt.
    pub fn calculate_backoff(&self, attempt: u32) -> Duration {
        let backoff_ms = (self.initial_backoff_ms as f64
            * self.backoff_multiplier.powi(attempt as i32))
        .min(self.max_backoff_ms as f64) as u64;

        Duration::from_millis(backoff_ms)
    }

    /// Check if an error should be retried after `attempt` retries so far.
    pub fn should_retry(&self, error: &Error, attempt: u32) -> bool {
        if attempt >= self.max_retries || !error.is_retryable() {
            return false;
        }
        match error.root() {
            Error::Timeout { .. } => self.retry_on_timeout,
            _ => true,
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new()
    }
}

/// `Retry-After` (in seconds) from a 429/503 service error, capped by the policy.
fn retry_after(error: &Error, policy: &RetryPolicy) -> Option<Duration> {
    let secs: u64 = error
        .service_error()?
        .headers
        .get(reqwest::header::RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse()
        .ok()?;
    Some(Duration::from_secs(secs).min(Duration::from_millis(policy.max_backoff_ms)))
}

// MARK: - Retry Executor

/// Run `operation` until it succeeds, fails with a non-retryable error, or
/// the policy's retries are used up.
pub async fn with_retry<F, Fut, T>(policy: &RetryPolicy, mut operation: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut attempt = 0u32;

    loop {
        match operation().await {
            Ok(result) => {
                if attempt > 0 {
                    debug!(attempt, "Call succeeded after retry");
                }
                return Ok(result);
            }
            Err(error) => {
                if !policy.should_retry(&error, attempt) {
                    return Err(error);
                }

                let backoff =
                    retry_after(&error, policy).unwrap_or_else(|| policy.calculate_backoff(attempt));
                attempt += 1;

                warn!(
                    attempt,
                    backoff_ms = backoff.as_millis() as u64,
                    error = %error,
                    "Call failed, retrying"
                );

                tokio::time::sleep(backoff).await;
            }
        }
    }
}

// MARK: - Tests
