//! Outbound HTTP access layer.
//!
//! The middleware stack, outermost first:
//!
//! 1. `TracingMiddleware` opens a span per logical request.
//! 2. `RetryTransientMiddleware` replays transient failures per [`RetryPolicy`].
//! 3. [`RateLimitMiddleware`](crate::rate_limit::RateLimitMiddleware) takes a
//!    permit for every attempt.

mod client;
mod retry;

pub use client::{HttpClient, HttpClientBuilder};
pub use retry::{RETRYABLE_STATUSES, RetryPolicy};
