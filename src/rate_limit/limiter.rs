//! Process-wide minimum-interval rate limiter.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use sec_edgar_client::rate_limit::RateLimiter;
//!
//! # async fn run() -> Result<(), sec_edgar_client::error::ConfigError> {
//! let limiter = Arc::new(RateLimiter::new(8.0)?);
//!
//! // The first call never waits.
//! let waited = limiter.acquire().await;
//! assert!(waited.is_zero());
//! # Ok(())
//! # }
//! ```

use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;

use crate::error::ConfigError;
use crate::rate_limit::limits;

/// A rate limiter enforcing a minimum interval between permitted calls.
///
/// One instance is meant to be shared (behind an `Arc`) by every component
/// that talks to SEC, so the whole process draws from a single budget.
/// Every call to [`acquire`](Self::acquire) consumes a slot regardless of
/// what the caller does with it.
#[derive(Debug)]
pub struct RateLimiter {
    requests_per_second: f64,
    state: Mutex<IntervalState>,
}

impl RateLimiter {
    /// Create a limiter allowing `requests_per_second` permits per second.
    ///
    /// Rejects rates that are not finite and strictly positive. The SEC
    /// ceiling of 10 req/s is enforced by [`EdgarConfig`](crate::config::EdgarConfig),
    /// not here.
    pub fn new(requests_per_second: f64) -> Result<Self, ConfigError> {
        if !requests_per_second.is_finite() || requests_per_second <= 0.0 {
            return Err(ConfigError::InvalidRateLimit {
                value: requests_per_second.to_string(),
                max: f64::INFINITY,
            });
        }

        Ok(Self::with_valid_rate(requests_per_second))
    }

    fn with_valid_rate(requests_per_second: f64) -> Self {
        let min_interval = Duration::from_secs_f64(1.0 / requests_per_second);
        tracing::info!(
            requests_per_second,
            interval_ms = min_interval.as_secs_f64() * 1000.0,
            "rate limiter initialized"
        );

        Self {
            requests_per_second,
            state: Mutex::new(IntervalState::new(min_interval)),
        }
    }

    /// Configured permits per second.
    pub fn requests_per_second(&self) -> f64 {
        self.requests_per_second
    }

    /// Minimum spacing between two permitted calls.
    pub fn min_interval(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.requests_per_second)
    }

    /// Wait until a permit is available, then take it.
    ///
    /// Returns how long the caller slept; zero when no wait was needed.
    /// The lock only covers the check-and-record step, so waiting callers
    /// do not block each other while sleeping.
    pub async fn acquire(&self) -> Duration {
        let mut waited = Duration::ZERO;

        loop {
            let mut state = self.state.lock().await;
            match state.try_acquire(Instant::now()) {
                Ok(()) => {
                    if !waited.is_zero() {
                        tracing::debug!(waited_ms = waited.as_millis() as u64, "rate limit wait");
                    }
                    return waited;
                }
                Err(wait_time) => {
                    drop(state);
                    tokio::time::sleep(wait_time).await;
                    waited += wait_time;
                }
            }
        }
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::with_valid_rate(limits::DEFAULT_REQUESTS_PER_SECOND)
    }
}

/// Last-call bookkeeping guarded by the limiter's mutex.
#[derive(Debug)]
struct IntervalState {
    min_interval: Duration,
    last_call: Option<Instant>,
}

impl IntervalState {
    fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_call: None,
        }
    }

    /// Record a call at `now` if the interval has passed.
    ///
    /// Returns `Err(wait_time)` with the remaining time otherwise.
    fn try_acquire(&mut self, now: Instant) -> Result<(), Duration> {
        if let Some(last) = self.last_call {
            let elapsed = now.saturating_duration_since(last);
            if elapsed < self.min_interval {
                return Err(self.min_interval - elapsed);
            }
        }

        self.last_call = Some(now);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_non_positive_rates() {
        assert!(RateLimiter::new(0.0).is_err());
        assert!(RateLimiter::new(-1.0).is_err());
        assert!(RateLimiter::new(f64::NAN).is_err());
        assert!(RateLimiter::new(f64::INFINITY).is_err());
    }

    #[test]
    fn test_default_rate() {
        let limiter = RateLimiter::default();
        assert_eq!(limiter.requests_per_second(), limits::DEFAULT_REQUESTS_PER_SECOND);
    }

    #[test]
    fn test_min_interval_from_rate() {
        let limiter = RateLimiter::new(8.0).unwrap();
        assert_eq!(limiter.min_interval(), Duration::from_millis(125));
        assert_eq!(limiter.requests_per_second(), 8.0);
    }

    #[test]
    fn test_interval_state_first_call_allowed() {
        let mut state = IntervalState::new(Duration::from_millis(100));
        assert!(state.try_acquire(Instant::now()).is_ok());
    }

    #[test]
    fn test_interval_state_reports_remaining_wait() {
        let mut state = IntervalState::new(Duration::from_millis(100));
        let start = Instant::now();

        assert!(state.try_acquire(start).is_ok());
        assert_eq!(
            state.try_acquire(start + Duration::from_millis(30)),
            Err(Duration::from_millis(70))
        );
        // A rejected attempt does not move the last-call timestamp.
        assert!(state.try_acquire(start + Duration::from_millis(100)).is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn test_acquire_sleeps_for_remaining_interval() {
        let limiter = RateLimiter::new(4.0).unwrap();

        assert_eq!(limiter.acquire().await, Duration::ZERO);
        assert_eq!(limiter.acquire().await, Duration::from_millis(250));
    }
}
