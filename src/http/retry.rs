//! Retry policy for transient SEC failures.

use std::time::{Duration, SystemTime};

use reqwest::{Response, StatusCode};
use reqwest_retry::{RetryDecision, Retryable, RetryableStrategy, default_on_request_failure};

/// Statuses SEC uses for transient conditions.
pub const RETRYABLE_STATUSES: [StatusCode; 5] = [
    StatusCode::TOO_MANY_REQUESTS,
    StatusCode::INTERNAL_SERVER_ERROR,
    StatusCode::BAD_GATEWAY,
    StatusCode::SERVICE_UNAVAILABLE,
    StatusCode::GATEWAY_TIMEOUT,
];

/// Bounded exponential backoff without jitter.
///
/// Retry `n` (zero-based) sleeps `initial_backoff * 2^n`, so the default
/// policy waits 1s, 2s, then 4s before giving up after four attempts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    max_retries: u32,
    initial_backoff: Duration,
    retryable_statuses: Vec<StatusCode>,
}

impl RetryPolicy {
    /// Create a policy with the standard retryable status set.
    pub fn new(max_retries: u32, initial_backoff: Duration) -> Self {
        Self {
            max_retries,
            initial_backoff,
            retryable_statuses: RETRYABLE_STATUSES.to_vec(),
        }
    }

    /// Policy that never retries.
    pub fn no_retries() -> Self {
        Self::new(0, Duration::ZERO)
    }

    /// Replace the set of statuses treated as transient.
    pub fn with_retryable_statuses(mut self, statuses: impl IntoIterator<Item = StatusCode>) -> Self {
        self.retryable_statuses = statuses.into_iter().collect();
        self
    }

    /// Maximum number of retries after the first attempt.
    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Total attempts, the first one included.
    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    /// Delay before the first retry.
    pub fn initial_backoff(&self) -> Duration {
        self.initial_backoff
    }

    /// Delay before retry number `n_past_retries` (zero-based).
    pub fn backoff(&self, n_past_retries: u32) -> Duration {
        let factor = 2u32.checked_pow(n_past_retries).unwrap_or(u32::MAX);
        self.initial_backoff.saturating_mul(factor)
    }

    /// Whether `status` is worth retrying.
    pub fn is_retryable_status(&self, status: StatusCode) -> bool {
        self.retryable_statuses.contains(&status)
    }

    pub(crate) fn strategy(&self) -> StatusRetryStrategy {
        StatusRetryStrategy {
            statuses: self.retryable_statuses.clone(),
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, Duration::from_secs(1))
    }
}

impl reqwest_retry::RetryPolicy for RetryPolicy {
    fn should_retry(&self, _request_start_time: SystemTime, n_past_retries: u32) -> RetryDecision {
        if n_past_retries < self.max_retries {
            RetryDecision::Retry {
                execute_after: SystemTime::now() + self.backoff(n_past_retries),
            }
        } else {
            RetryDecision::DoNotRetry
        }
    }
}

/// Classifies responses by the policy's status set.
///
/// Transport errors fall back to `reqwest-retry`'s defaults, which treat
/// connect failures and timeouts as transient.
#[derive(Debug, Clone)]
pub(crate) struct StatusRetryStrategy {
    statuses: Vec<StatusCode>,
}

impl RetryableStrategy for StatusRetryStrategy {
    fn handle(&self, res: &Result<Response, reqwest_middleware::Error>) -> Option<Retryable> {
        match res {
            Ok(response) if self.statuses.contains(&response.status()) => {
                Some(Retryable::Transient)
            }
            Ok(_) => None,
            Err(error) => default_on_request_failure(error),
        }
    }
}
