//! Rate-limited, retrying HTTP client for SEC endpoints.

use std::sync::Arc;
use std::time::{Duration, Instant};

use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, HeaderMap, HeaderValue, USER_AGENT};
use reqwest::{Method, Response};
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::RetryTransientMiddleware;
use reqwest_tracing::TracingMiddleware;

use crate::config::{DEFAULT_TIMEOUT, UserAgent};
use crate::error::NetworkError;
use crate::http::RetryPolicy;
use crate::rate_limit::{RateLimitMiddleware, RateLimiter};

/// HTTP client for SEC EDGAR.
///
/// Every attempt, retries included, takes a permit from the shared
/// [`RateLimiter`] first. Transient failures (429/500/502/503/504,
/// connection errors, timeouts) are retried with exponential backoff.
/// Only `GET` and `HEAD` are exposed, so only idempotent requests are ever
/// replayed.
///
/// # Example
///
/// ```rust,no_run
/// use sec_edgar_client::config::UserAgent;
/// use sec_edgar_client::http::HttpClient;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let client = HttpClient::builder(UserAgent::parse("Jane Doe (jane@example.com)")?).build()?;
///     let body = client
///         .get_bytes("https://www.sec.gov/files/company_tickers.json")
///         .await?;
///     println!("{} bytes", body.len());
///     Ok(())
/// }
/// ```
#[derive(Clone)]
pub struct HttpClient {
    http_client: ClientWithMiddleware,
    rate_limiter: Arc<RateLimiter>,
    retry_policy: RetryPolicy,
    timeout: Duration,
}

impl HttpClient {
    /// Create a new client builder.
    pub fn builder(user_agent: UserAgent) -> HttpClientBuilder {
        HttpClientBuilder::new(user_agent)
    }

    /// Rate-limited `GET` with the default headers and timeout.
    pub async fn get(&self, url: &str) -> Result<Response, NetworkError> {
        self.execute(Method::GET, url, HeaderMap::new(), None).await
    }

    /// Rate-limited `GET` with extra headers and an optional timeout override.
    pub async fn get_with(
        &self,
        url: &str,
        headers: HeaderMap,
        timeout: Option<Duration>,
    ) -> Result<Response, NetworkError> {
        self.execute(Method::GET, url, headers, timeout).await
    }

    /// Rate-limited `HEAD`, used to probe for a resource without its body.
    pub async fn head(&self, url: &str) -> Result<Response, NetworkError> {
        self.execute(Method::HEAD, url, HeaderMap::new(), None).await
    }

    /// Rate-limited `GET` that reads the whole body.
    pub async fn get_bytes(&self, url: &str) -> Result<Vec<u8>, NetworkError> {
        let response = self.get(url).await?;
        let body = response.bytes().await.map_err(|source| NetworkError::Body {
            url: url.to_string(),
            source,
        })?;
        tracing::debug!(url, size = body.len(), "response body read");
        Ok(body.to_vec())
    }

    /// The shared limiter this client draws from.
    pub fn rate_limiter(&self) -> &Arc<RateLimiter> {
        &self.rate_limiter
    }

    /// The retry policy in effect.
    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry_policy
    }

    /// Default per-request timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    async fn execute(
        &self,
        method: Method,
        url: &str,
        headers: HeaderMap,
        timeout: Option<Duration>,
    ) -> Result<Response, NetworkError> {
        let started = Instant::now();
        let result = self
            .http_client
            .request(method.clone(), url)
            .headers(headers)
            .timeout(timeout.unwrap_or(self.timeout))
            .send()
            .await;

        let response = match result {
            Ok(response) => response,
            Err(source) => {
                tracing::error!(%method, url, error = %source, "request failed");
                return Err(NetworkError::Transport {
                    method,
                    url: url.to_string(),
                    source,
                });
            }
        };

        let status = response.status();
        let elapsed_ms = started.elapsed().as_millis() as u64;

        if self.retry_policy.is_retryable_status(status) {
            let attempts = self.retry_policy.max_attempts();
            tracing::error!(%method, url, status = status.as_u16(), attempts, "retries exhausted");
            return Err(NetworkError::RetriesExhausted {
                method,
                url: url.to_string(),
                attempts,
                status,
            });
        }

        if status.is_client_error() || status.is_server_error() {
            tracing::warn!(%method, url, status = status.as_u16(), "request rejected");
            return Err(NetworkError::Status {
                method,
                url: url.to_string(),
                status,
            });
        }

        tracing::info!(%method, url, status = status.as_u16(), elapsed_ms, "request completed");
        Ok(response)
    }
}

impl std::fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpClient")
            .field("rate_limiter", &self.rate_limiter)
            .field("retry_policy", &self.retry_policy)
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Builder for [`HttpClient`].
pub struct HttpClientBuilder {
    user_agent: UserAgent,
    timeout: Duration,
    retry_policy: RetryPolicy,
    rate_limiter: Option<Arc<RateLimiter>>,
}

impl HttpClientBuilder {
    /// Create a new builder with default settings.
    pub fn new(user_agent: UserAgent) -> Self {
        Self {
            user_agent,
            timeout: DEFAULT_TIMEOUT,
            retry_policy: RetryPolicy::default(),
            rate_limiter: None,
        }
    }

    /// Set the default per-request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the retry policy.
    pub fn retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry_policy = policy;
        self
    }

    /// Share an existing limiter instead of creating a private one.
    pub fn rate_limiter(mut self, limiter: Arc<RateLimiter>) -> Self {
        self.rate_limiter = Some(limiter);
        self
    }

    /// Build the client.
    pub fn build(self) -> Result<HttpClient, NetworkError> {
        let headers = default_headers(self.user_agent.as_str())?;

        let reqwest_client = reqwest::Client::builder()
            .default_headers(headers)
            .build()
            .map_err(NetworkError::Client)?;

        let rate_limiter = self.rate_limiter.unwrap_or_default();
        let strategy = self.retry_policy.strategy();

        let client = ClientBuilder::new(reqwest_client)
            .with(TracingMiddleware::default())
            .with(RetryTransientMiddleware::new_with_policy_and_strategy(
                self.retry_policy.clone(),
                strategy,
            ))
            .with(RateLimitMiddleware::new(rate_limiter.clone()))
            .build();

        tracing::debug!(
            user_agent = self.user_agent.abbreviated(),
            max_attempts = self.retry_policy.max_attempts(),
            "HTTP client created"
        );

        Ok(HttpClient {
            http_client: client,
            rate_limiter,
            retry_policy: self.retry_policy,
            timeout: self.timeout,
        })
    }
}

/// Identity and content negotiation headers sent with every request.
fn default_headers(user_agent: &str) -> Result<HeaderMap, NetworkError> {
    let user_agent =
        HeaderValue::from_str(user_agent).map_err(|source| NetworkError::InvalidHeader {
            name: USER_AGENT.to_string(),
            source,
        })?;

    let mut headers = HeaderMap::new();
    headers.insert(USER_AGENT, user_agent);
    headers.insert(
        ACCEPT,
        HeaderValue::from_static("application/json,text/html,application/xml;q=0.9,*/*;q=0.8"),
    );
    headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.5"));
    Ok(headers)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_headers_carry_user_agent() {
        let headers = default_headers("Jane Doe (jane@example.com)").unwrap();
        assert_eq!(headers[USER_AGENT], "Jane Doe (jane@example.com)");
        assert!(headers.contains_key(ACCEPT));
        assert!(headers.contains_key(ACCEPT_LANGUAGE));
    }

    #[test]
    fn test_illegal_user_agent_is_an_error() {
        let err = default_headers("Jane Doe\n(jane@example.com)").unwrap_err();
        assert!(matches!(
            err,
            NetworkError::InvalidHeader { ref name, .. } if name == "user-agent"
        ));
        assert_eq!(err.status(), None);
    }
}
