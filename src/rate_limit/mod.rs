//! Rate limiting for SEC EDGAR.
//!
//! SEC's fair access policy caps automated traffic at 10 requests per second
//! per client. This module provides a single shared limiter that every
//! outbound request passes through.
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use sec_edgar_client::config::UserAgent;
//! use sec_edgar_client::http::HttpClient;
//! use sec_edgar_client::rate_limit::RateLimiter;
//!
//! # fn build() -> Result<(), Box<dyn std::error::Error>> {
//! let limiter = Arc::new(RateLimiter::new(8.0)?);
//! let agent = UserAgent::parse("Jane Doe (jane@example.com)")?;
//!
//! // Both clients draw from the same budget.
//! let filings = HttpClient::builder(agent.clone())
//!     .rate_limiter(limiter.clone())
//!     .build()?;
//! let facts = HttpClient::builder(agent)
//!     .rate_limiter(limiter)
//!     .build()?;
//! # Ok(())
//! # }
//! ```

mod limiter;
mod middleware;

pub use limiter::RateLimiter;
pub use middleware::RateLimitMiddleware;

/// Rate limit constants.
pub mod limits {
    /// Maximum requests per second SEC accepts from one client.
    pub const SEC_MAX_REQUESTS_PER_SECOND: f64 = 10.0;
    /// Default budget, leaving headroom below the SEC ceiling.
    pub const DEFAULT_REQUESTS_PER_SECOND: f64 = 8.0;
}
