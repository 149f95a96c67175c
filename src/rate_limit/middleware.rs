//! `reqwest-middleware` integration for [`RateLimiter`].

use std::sync::Arc;

use ::http::Extensions;
use reqwest::{Request, Response};
use reqwest_middleware::{Middleware, Next};

use crate::rate_limit::RateLimiter;

/// Middleware that takes a [`RateLimiter`] permit before every request.
///
/// Install it after the retry middleware so each retry attempt is also
/// charged against the shared budget.
#[derive(Debug, Clone)]
pub struct RateLimitMiddleware {
    limiter: Arc<RateLimiter>,
}

impl RateLimitMiddleware {
    /// Wrap a shared limiter.
    pub fn new(limiter: Arc<RateLimiter>) -> Self {
        Self { limiter }
    }

    /// The shared limiter.
    pub fn limiter(&self) -> &Arc<RateLimiter> {
        &self.limiter
    }
}

#[async_trait::async_trait]
impl Middleware for RateLimitMiddleware {
    async fn handle(
        &self,
        req: Request,
        extensions: &mut Extensions,
        next: Next<'_>,
    ) -> reqwest_middleware::Result<Response> {
        tracing::debug!(method = %req.method(), url = %req.url(), "preparing request");
        let waited = self.limiter.acquire().await;
        if !waited.is_zero() {
            tracing::debug!(
                url = %req.url(),
                waited_ms = waited.as_millis() as u64,
                "request delayed by rate limiter"
            );
        }
        next.run(req, extensions).await
    }
}
