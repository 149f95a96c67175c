//! SEC EDGAR lookup client.

use std::sync::Arc;
use std::time::Instant;

use time::OffsetDateTime;
use tokio::sync::Mutex;
use url::Url;

use crate::cache::{self, DocumentCache, Freshness};
use crate::config::EdgarConfig;
use crate::edgar::endpoints::{self, DATA_BASE_URL, SEC_BASE_URL};
use crate::edgar::types::{
    Cik, Company, CompanyFacts, CompanyTicker, Filing, FilingContent, FilingQuery, INSIDER_FORMS,
    InsiderSummary, Submissions, normalize_ticker, parse_ticker_file,
};
use crate::error::{ConfigError, EdgarError};
use crate::http::{HttpClient, RetryPolicy};
use crate::rate_limit::RateLimiter;
use crate::rate_limit::limits::SEC_MAX_REQUESTS_PER_SECOND;

type TickerSnapshot = (Instant, Arc<Vec<CompanyTicker>>);

/// Composition root and lookup API for SEC EDGAR.
///
/// Building a client prepares the cache directory, then creates the
/// rate-limited HTTP client carrying the configured identity. Every document
/// fetch checks the on-disk cache first and writes through on a miss.
///
/// # Example
///
/// ```rust,no_run
/// use sec_edgar_client::edgar::{EdgarClient, FilingQuery};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let client = EdgarClient::from_env()?;
///
///     let company = client.company("AAPL").await?;
///     println!("{} ({})", company.name, company.cik);
///
///     let annual = client
///         .filings("AAPL", &FilingQuery::new().with_form("10-K").with_limit(3))
///         .await?;
///     for filing in annual {
///         println!("{} {}", filing.filing_date, filing.accession_number);
///     }
///     Ok(())
/// }
/// ```
#[derive(Clone)]
pub struct EdgarClient {
    http: HttpClient,
    cache: Option<DocumentCache>,
    config: EdgarConfig,
    sec_base_url: String,
    data_base_url: String,
    tickers: Arc<Mutex<Option<TickerSnapshot>>>,
}

impl EdgarClient {
    /// Create a new client builder.
    pub fn builder(config: EdgarConfig) -> EdgarClientBuilder {
        EdgarClientBuilder::new(config)
    }

    /// Load configuration from the environment and build a client.
    pub fn from_env() -> Result<Self, EdgarError> {
        let config = EdgarConfig::from_env()?;
        Self::builder(config).build()
    }

    /// Configuration this client was built from.
    pub fn config(&self) -> &EdgarConfig {
        &self.config
    }

    /// The underlying HTTP client.
    pub fn http(&self) -> &HttpClient {
        &self.http
    }

    /// The document cache, `None` when running network-only.
    pub fn cache(&self) -> Option<&DocumentCache> {
        self.cache.as_ref()
    }

    /// Look up the CIK for an exchange ticker.
    ///
    /// Matching ignores case and treats `.` and `-` share class separators
    /// alike. Returns `Ok(None)` for unknown tickers.
    pub async fn cik_by_ticker(&self, ticker: &str) -> Result<Option<Cik>, EdgarError> {
        let wanted = normalize_ticker(ticker);
        if wanted.is_empty() {
            return Ok(None);
        }

        let tickers = self.tickers().await?;
        Ok(tickers
            .iter()
            .find(|row| normalize_ticker(&row.ticker) == wanted)
            .map(|row| row.cik))
    }

    /// Filer metadata and recent filings, by ticker or CIK.
    pub async fn company(&self, identifier: &str) -> Result<Company, EdgarError> {
        let cik = self.resolve_cik(identifier).await?;
        let url = self.data_url(&endpoints::submissions(cik))?;

        let body = self
            .fetch_document(&url, self.expiring())
            .await
            .map_err(|e| not_found_as_company(e, identifier))?;
        let raw: Submissions = serde_json::from_slice(&body)?;
        Company::try_from(raw)
    }

    /// Companies whose ticker or name matches `query`.
    ///
    /// Exact ticker matches come first, then ticker prefixes, then names
    /// containing the query; each group keeps SEC's ranking order.
    pub async fn search_companies(
        &self,
        query: &str,
        limit: usize,
    ) -> Result<Vec<CompanyTicker>, EdgarError> {
        let tickers = self.tickers().await?;
        Ok(rank_matches(&tickers, query, limit))
    }

    /// Recent filings of a company, newest first, filtered by `query`.
    pub async fn filings(
        &self,
        identifier: &str,
        query: &FilingQuery,
    ) -> Result<Vec<Filing>, EdgarError> {
        let company = self.company(identifier).await?;
        Ok(query.apply(&company.filings))
    }

    /// All XBRL facts the company has reported.
    pub async fn company_facts(&self, identifier: &str) -> Result<CompanyFacts, EdgarError> {
        let cik = self.resolve_cik(identifier).await?;
        let url = self.data_url(&endpoints::company_facts(cik))?;

        let body = self
            .fetch_document(&url, self.expiring())
            .await
            .map_err(|e| not_found_as_company(e, identifier))?;
        Ok(serde_json::from_slice(&body)?)
    }

    /// Insider ownership filings (forms 3, 4, 5 and amendments) from the
    /// last `days` days, newest first.
    pub async fn insider_filings(
        &self,
        identifier: &str,
        days: u32,
        limit: usize,
    ) -> Result<Vec<Filing>, EdgarError> {
        let today = OffsetDateTime::now_utc().date();
        let since = today
            .checked_sub(time::Duration::days(i64::from(days)))
            .unwrap_or(time::Date::MIN);

        let query = FilingQuery::new()
            .with_forms(INSIDER_FORMS)
            .since(since)
            .with_limit(limit);
        self.filings(identifier, &query).await
    }

    /// Insider filing counts by form over the last `days` days.
    pub async fn insider_summary(
        &self,
        identifier: &str,
        days: u32,
    ) -> Result<InsiderSummary, EdgarError> {
        let filings = self.insider_filings(identifier, days, usize::MAX).await?;
        Ok(InsiderSummary::from_filings(days, &filings))
    }

    /// One page of a filing's full submission text.
    ///
    /// `offset` and `max_chars` count characters; a `max_chars` of zero
    /// selects the default page size.
    pub async fn filing_content(
        &self,
        identifier: &str,
        accession_number: &str,
        offset: usize,
        max_chars: usize,
    ) -> Result<FilingContent, EdgarError> {
        let company = self.company(identifier).await?;
        let filing = company
            .find_filing(accession_number)
            .ok_or_else(|| EdgarError::FilingNotFound {
                accession_number: accession_number.to_string(),
            })?;

        let url = self.sec_url(&endpoints::filing_text(
            company.cik,
            &filing.accession_number,
        ))?;
        let body = self
            .fetch_document(&url, Freshness::Immutable)
            .await
            .map_err(|e| match e {
                EdgarError::Network(ref err) if err.is_not_found() => EdgarError::FilingNotFound {
                    accession_number: accession_number.to_string(),
                },
                other => other,
            })?;

        let text = String::from_utf8_lossy(&body);
        Ok(FilingContent::page(
            filing,
            url.to_string(),
            &text,
            offset,
            max_chars,
        ))
    }

    /// Resolve a ticker or CIK string to a CIK.
    pub async fn resolve_cik(&self, identifier: &str) -> Result<Cik, EdgarError> {
        let trimmed = identifier.trim();
        if let Ok(cik) = trimmed.parse::<Cik>() {
            return Ok(cik);
        }
        if !looks_like_ticker(trimmed) {
            return Err(EdgarError::InvalidIdentifier(identifier.to_string()));
        }

        self.cik_by_ticker(trimmed)
            .await?
            .ok_or_else(|| EdgarError::CompanyNotFound(identifier.to_string()))
    }

    async fn tickers(&self) -> Result<Arc<Vec<CompanyTicker>>, EdgarError> {
        // Held across the fetch so concurrent callers share one download.
        let mut snapshot = self.tickers.lock().await;
        if let Some((loaded_at, tickers)) = &*snapshot {
            if loaded_at.elapsed() < self.config.cache_ttl {
                return Ok(tickers.clone());
            }
        }

        let url = self.sec_url(endpoints::COMPANY_TICKERS)?;
        let body = self.fetch_document(&url, self.expiring()).await?;
        let tickers = Arc::new(parse_ticker_file(&body)?);
        tracing::debug!(count = tickers.len(), "ticker index loaded");

        *snapshot = Some((Instant::now(), tickers.clone()));
        Ok(tickers)
    }

    async fn fetch_document(&self, url: &Url, freshness: Freshness) -> Result<Vec<u8>, EdgarError> {
        if let Some(cache) = &self.cache {
            match cache.get(url, freshness).await {
                Ok(Some(body)) => {
                    tracing::debug!(url = %url, size = body.len(), "served from cache");
                    return Ok(body);
                }
                Ok(None) => {}
                Err(e) => tracing::warn!(url = %url, error = %e, "cache read failed"),
            }
        }

        let body = self.http.get_bytes(url.as_str()).await?;

        if let Some(cache) = &self.cache {
            if let Err(e) = cache.put(url, &body).await {
                tracing::warn!(url = %url, error = %e, "cache write failed");
            }
        }
        Ok(body)
    }

    fn expiring(&self) -> Freshness {
        Freshness::Expiring(self.config.cache_ttl)
    }

    fn sec_url(&self, path: &str) -> Result<Url, EdgarError> {
        join_url(&self.sec_base_url, path)
    }

    fn data_url(&self, path: &str) -> Result<Url, EdgarError> {
        join_url(&self.data_base_url, path)
    }
}

impl std::fmt::Debug for EdgarClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EdgarClient")
            .field("http", &self.http)
            .field("cache", &self.cache)
            .field("sec_base_url", &self.sec_base_url)
            .field("data_base_url", &self.data_base_url)
            .finish()
    }
}

/// Builder for [`EdgarClient`].
pub struct EdgarClientBuilder {
    config: EdgarConfig,
    sec_base_url: String,
    data_base_url: String,
    rate_limiter: Option<Arc<RateLimiter>>,
    retry_policy: RetryPolicy,
}

impl EdgarClientBuilder {
    /// Create a new builder with the production endpoints.
    pub fn new(config: EdgarConfig) -> Self {
        Self {
            config,
            sec_base_url: SEC_BASE_URL.to_string(),
            data_base_url: DATA_BASE_URL.to_string(),
            rate_limiter: None,
            retry_policy: RetryPolicy::default(),
        }
    }

    /// Override the `www.sec.gov` base URL (for testing).
    pub fn sec_base_url(mut self, url: impl Into<String>) -> Self {
        self.sec_base_url = url.into();
        self
    }

    /// Override the `data.sec.gov` base URL (for testing).
    pub fn data_base_url(mut self, url: impl Into<String>) -> Self {
        self.data_base_url = url.into();
        self
    }

    /// Share an existing limiter instead of creating one from the config.
    pub fn rate_limiter(mut self, limiter: Arc<RateLimiter>) -> Self {
        self.rate_limiter = Some(limiter);
        self
    }

    /// Set the retry policy.
    pub fn retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry_policy = policy;
        self
    }

    /// Build the client.
    ///
    /// The cache directory is prepared before the HTTP client is created. A
    /// cache that cannot be prepared is logged and the client runs
    /// network-only.
    pub fn build(self) -> Result<EdgarClient, EdgarError> {
        let rate = self.config.requests_per_second;
        if !(rate.is_finite() && rate > 0.0 && rate <= SEC_MAX_REQUESTS_PER_SECOND) {
            return Err(ConfigError::InvalidRateLimit {
                value: rate.to_string(),
                max: SEC_MAX_REQUESTS_PER_SECOND,
            }
            .into());
        }
        join_url(&self.sec_base_url, endpoints::COMPANY_TICKERS)?;
        join_url(&self.data_base_url, "/")?;

        let cache = match cache::initialize(&self.config.cache_dir) {
            Ok(config) => Some(DocumentCache::new(&config)),
            Err(e) => {
                tracing::warn!(error = %e, "cache unavailable, continuing without it");
                None
            }
        };

        let rate_limiter = match self.rate_limiter {
            Some(limiter) => limiter,
            None => Arc::new(RateLimiter::new(rate)?),
        };

        let http = HttpClient::builder(self.config.user_agent.clone())
            .timeout(self.config.timeout)
            .retry_policy(self.retry_policy)
            .rate_limiter(rate_limiter)
            .build()?;

        tracing::info!(
            user_agent = self.config.user_agent.abbreviated(),
            cache = cache.is_some(),
            "SEC EDGAR client ready"
        );

        Ok(EdgarClient {
            http,
            cache,
            config: self.config,
            sec_base_url: self.sec_base_url,
            data_base_url: self.data_base_url,
            tickers: Arc::new(Mutex::new(None)),
        })
    }
}

fn join_url(base: &str, path: &str) -> Result<Url, EdgarError> {
    Ok(Url::parse(&format!("{}{}", base.trim_end_matches('/'), path))?)
}

fn looks_like_ticker(value: &str) -> bool {
    !value.is_empty()
        && value.len() <= 10
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-'))
}

fn not_found_as_company(err: EdgarError, identifier: &str) -> EdgarError {
    match err {
        EdgarError::Network(ref e) if e.is_not_found() => {
            EdgarError::CompanyNotFound(identifier.to_string())
        }
        other => other,
    }
}

fn rank_matches(tickers: &[CompanyTicker], query: &str, limit: usize) -> Vec<CompanyTicker> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() || limit == 0 {
        return Vec::new();
    }
    let ticker_needle = normalize_ticker(query);
    let cik = query.trim().parse::<Cik>().ok();

    let mut exact = Vec::new();
    let mut prefix = Vec::new();
    let mut name = Vec::new();
    for row in tickers {
        let ticker = normalize_ticker(&row.ticker);
        if ticker == ticker_needle || Some(row.cik) == cik {
            exact.push(row);
        } else if ticker.starts_with(&ticker_needle) {
            prefix.push(row);
        } else if row.title.to_lowercase().contains(&needle) {
            name.push(row);
        }
    }

    exact
        .into_iter()
        .chain(prefix)
        .chain(name)
        .take(limit)
        .cloned()
        .collect()
}
