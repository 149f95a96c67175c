//! Environment-driven configuration.
//!
//! | Variable | Default |
//! |---|---|
//! | `SEC_EDGAR_USER_AGENT` | required, `"Your Name (your@email.com)"` |
//! | `SEC_EDGAR_RATE_LIMIT` | `8` requests/second, at most `10` |
//! | `SEC_EDGAR_TIMEOUT` | `30` seconds |
//! | `SEC_EDGAR_CACHE_DIR` | `<user cache dir>/sec-edgar` |
//! | `SEC_EDGAR_CACHE_TTL` | `86400` seconds |
//! | `SEC_EDGAR_LOG_LEVEL` | `info` |

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use etcetera::BaseStrategy;
use reqwest::header::HeaderValue;

use crate::error::ConfigError;
use crate::rate_limit::limits::{DEFAULT_REQUESTS_PER_SECOND, SEC_MAX_REQUESTS_PER_SECOND};

/// Environment variable names.
pub mod env {
    pub const USER_AGENT: &str = "SEC_EDGAR_USER_AGENT";
    pub const RATE_LIMIT: &str = "SEC_EDGAR_RATE_LIMIT";
    pub const TIMEOUT: &str = "SEC_EDGAR_TIMEOUT";
    pub const CACHE_DIR: &str = "SEC_EDGAR_CACHE_DIR";
    pub const CACHE_TTL: &str = "SEC_EDGAR_CACHE_TTL";
    pub const LOG_LEVEL: &str = "SEC_EDGAR_LOG_LEVEL";
}

/// Default request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
/// Default reuse window for cached documents that change upstream.
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(24 * 60 * 60);
/// Default log filter.
pub const DEFAULT_LOG_LEVEL: &str = "info";
/// Subdirectory created under the user cache location.
pub const CACHE_SUBDIR: &str = "sec-edgar";

/// A validated SEC identity string.
///
/// SEC rejects automated traffic that does not identify a person and a
/// contact address, so the value must carry a name and an email, e.g.
/// `"Jane Doe (jane@example.com)"` or `"Acme Research admin@acme.com"`.
#[derive(Clone, PartialEq, Eq)]
pub struct UserAgent(String);

impl UserAgent {
    /// Validate a user agent string.
    pub fn parse(value: impl Into<String>) -> Result<Self, ConfigError> {
        let value = value.into();
        let trimmed = value.trim();
        let malformed = || ConfigError::MalformedUserAgent {
            value: value.clone(),
        };

        if trimmed.is_empty() {
            return Err(ConfigError::MissingUserAgent);
        }
        if HeaderValue::from_str(trimmed).is_err() {
            return Err(malformed());
        }

        let mut has_email = false;
        let mut has_name = false;
        for token in trimmed.split_whitespace() {
            let token = token.trim_matches(|c| matches!(c, '(' | ')' | '<' | '>' | ','));
            if is_email(token) {
                has_email = true;
            } else if token.chars().any(char::is_alphanumeric) {
                has_name = true;
            }
        }

        if has_email && has_name {
            Ok(Self(trimmed.to_string()))
        } else {
            Err(malformed())
        }
    }

    /// The validated string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Prefix suitable for logs.
    pub fn abbreviated(&self) -> &str {
        match self.0.char_indices().nth(50) {
            Some((idx, _)) => &self.0[..idx],
            None => &self.0,
        }
    }
}

impl fmt::Display for UserAgent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for UserAgent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("UserAgent").field(&self.0).finish()
    }
}

fn is_email(token: &str) -> bool {
    let Some((local, domain)) = token.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && domain
            .split_once('.')
            .is_some_and(|(host, tld)| !host.is_empty() && !tld.is_empty())
}

/// Runtime configuration for [`EdgarClient`](crate::edgar::EdgarClient).
#[derive(Debug, Clone)]
pub struct EdgarConfig {
    /// SEC identity sent with every request.
    pub user_agent: UserAgent,
    /// Shared request budget, in (0, 10].
    pub requests_per_second: f64,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Unresolved cache directory; `~` is expanded at cache initialization.
    pub cache_dir: String,
    /// How long cached documents that change upstream are reused.
    pub cache_ttl: Duration,
    /// `tracing_subscriber::EnvFilter` directive.
    pub log_level: String,
}

impl EdgarConfig {
    /// Configuration with defaults for everything but the identity.
    pub fn new(user_agent: UserAgent) -> Result<Self, ConfigError> {
        Ok(Self::with_defaults(user_agent, default_cache_dir()?))
    }

    fn with_defaults(user_agent: UserAgent, cache_dir: String) -> Self {
        Self {
            user_agent,
            requests_per_second: DEFAULT_REQUESTS_PER_SECOND,
            timeout: DEFAULT_TIMEOUT,
            cache_dir,
            cache_ttl: DEFAULT_CACHE_TTL,
            log_level: DEFAULT_LOG_LEVEL.to_string(),
        }
    }

    /// Load configuration from the process environment.
    ///
    /// A `.env` file in the working directory is loaded first when present.
    pub fn from_env() -> Result<Self, ConfigError> {
        match dotenv::dotenv() {
            Ok(path) => tracing::debug!(path = %path.display(), "loaded environment file"),
            Err(e) if e.not_found() => {}
            Err(e) => tracing::warn!(error = %e, "failed to load .env file"),
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let user_agent = lookup(env::USER_AGENT).ok_or(ConfigError::MissingUserAgent)?;
        let user_agent = UserAgent::parse(user_agent)?;
        let mut config = match lookup(env::CACHE_DIR).filter(|dir| !dir.trim().is_empty()) {
            Some(dir) => Self::with_defaults(user_agent, dir),
            None => Self::new(user_agent)?,
        };

        if let Some(raw) = lookup(env::RATE_LIMIT) {
            config.requests_per_second = parse_rate_limit(&raw)?;
        }
        if let Some(raw) = lookup(env::TIMEOUT) {
            config.timeout = parse_timeout(&raw)?;
        }
        if let Some(raw) = lookup(env::CACHE_TTL) {
            config.cache_ttl = parse_cache_ttl(&raw)?;
        }
        if let Some(level) = lookup(env::LOG_LEVEL).filter(|l| !l.trim().is_empty()) {
            config.log_level = level.trim().to_string();
        }

        tracing::info!(
            user_agent = config.user_agent.abbreviated(),
            requests_per_second = config.requests_per_second,
            timeout_secs = config.timeout.as_secs(),
            "SEC EDGAR configuration loaded"
        );
        Ok(config)
    }

    /// Set the request budget, validating the SEC ceiling.
    pub fn with_requests_per_second(mut self, rate: f64) -> Result<Self, ConfigError> {
        self.requests_per_second = validate_rate(rate, rate.to_string())?;
        Ok(self)
    }

    /// Set the per-request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the cache directory.
    pub fn with_cache_dir(mut self, dir: impl Into<String>) -> Self {
        self.cache_dir = dir.into();
        self
    }

    /// Set the cache TTL for documents that change upstream.
    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }
}

fn default_cache_dir() -> Result<String, ConfigError> {
    let strategy = etcetera::choose_base_strategy().map_err(|_| ConfigError::NoCacheDirectory)?;
    let dir: PathBuf = strategy.cache_dir().join(CACHE_SUBDIR);
    Ok(dir.to_string_lossy().into_owned())
}

fn parse_rate_limit(raw: &str) -> Result<f64, ConfigError> {
    let rate = raw
        .trim()
        .parse::<f64>()
        .map_err(|_| ConfigError::InvalidRateLimit {
            value: raw.to_string(),
            max: SEC_MAX_REQUESTS_PER_SECOND,
        })?;
    validate_rate(rate, raw.to_string())
}

fn validate_rate(rate: f64, raw: String) -> Result<f64, ConfigError> {
    if rate.is_finite() && rate > 0.0 && rate <= SEC_MAX_REQUESTS_PER_SECOND {
        Ok(rate)
    } else {
        Err(ConfigError::InvalidRateLimit {
            value: raw,
            max: SEC_MAX_REQUESTS_PER_SECOND,
        })
    }
}

fn parse_timeout(raw: &str) -> Result<Duration, ConfigError> {
    match raw.trim().parse::<u64>() {
        Ok(secs) if secs > 0 => Ok(Duration::from_secs(secs)),
        _ => Err(ConfigError::InvalidTimeout {
            value: raw.to_string(),
        }),
    }
}

fn parse_cache_ttl(raw: &str) -> Result<Duration, ConfigError> {
    raw.trim()
        .parse::<u64>()
        .map(Duration::from_secs)
        .map_err(|_| ConfigError::InvalidCacheTtl {
            value: raw.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_user_agent_formats() {
        assert!(UserAgent::parse("Jane Doe (jane@example.com)").is_ok());
        assert!(UserAgent::parse("Acme Research admin@acme.com").is_ok());
        assert!(UserAgent::parse("  Jane <jane@example.co.uk>  ").is_ok());
    }

    #[test]
    fn test_user_agent_requires_email() {
        assert_eq!(
            UserAgent::parse("Jane Doe"),
            Err(ConfigError::MalformedUserAgent {
                value: "Jane Doe".to_string()
            })
        );
        assert!(UserAgent::parse("Jane Doe (jane at example.com)").is_err());
        assert!(UserAgent::parse("Jane Doe (@example.com)").is_err());
        assert!(UserAgent::parse("Jane Doe (jane@localhost)").is_err());
    }

    #[test]
    fn test_user_agent_requires_name() {
        assert!(UserAgent::parse("jane@example.com").is_err());
        assert!(UserAgent::parse("(jane@example.com)").is_err());
    }

    #[test]
    fn test_user_agent_rejects_empty_and_control_chars() {
        assert_eq!(UserAgent::parse("   "), Err(ConfigError::MissingUserAgent));
        assert!(UserAgent::parse("Jane\n(jane@example.com)").is_err());
    }

    #[test]
    fn test_user_agent_abbreviated() {
        let long = format!("{} (jane@example.com)", "J".repeat(80));
        let agent = UserAgent::parse(long).unwrap();
        assert_eq!(agent.abbreviated().chars().count(), 50);
    }

    #[test]
    fn test_from_lookup_defaults() {
        let config = EdgarConfig::from_lookup(lookup_from(&[
            (env::USER_AGENT, "Jane Doe (jane@example.com)"),
            (env::CACHE_DIR, "/tmp/sec-edgar-test"),
        ]))
        .unwrap();

        assert_eq!(config.user_agent.as_str(), "Jane Doe (jane@example.com)");
        assert_eq!(config.requests_per_second, 8.0);
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.cache_dir, "/tmp/sec-edgar-test");
        assert_eq!(config.cache_ttl, DEFAULT_CACHE_TTL);
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn test_from_lookup_overrides() {
        let config = EdgarConfig::from_lookup(lookup_from(&[
            (env::USER_AGENT, "Jane Doe (jane@example.com)"),
            (env::CACHE_DIR, "~/edgar"),
            (env::RATE_LIMIT, "10"),
            (env::TIMEOUT, "120"),
            (env::CACHE_TTL, "0"),
            (env::LOG_LEVEL, "debug"),
        ]))
        .unwrap();

        assert_eq!(config.requests_per_second, 10.0);
        assert_eq!(config.timeout, Duration::from_secs(120));
        assert_eq!(config.cache_ttl, Duration::ZERO);
        assert_eq!(config.log_level, "debug");
    }

    #[test]
    fn test_missing_user_agent() {
        let result = EdgarConfig::from_lookup(lookup_from(&[]));
        assert_eq!(result.unwrap_err(), ConfigError::MissingUserAgent);
    }

    #[test]
    fn test_rate_limit_out_of_range() {
        for raw in ["0", "-2", "10.5", "fast", "NaN"] {
            let result = EdgarConfig::from_lookup(lookup_from(&[
                (env::USER_AGENT, "Jane Doe (jane@example.com)"),
                (env::CACHE_DIR, "/tmp/x"),
                (env::RATE_LIMIT, raw),
            ]));
            assert!(
                matches!(result, Err(ConfigError::InvalidRateLimit { .. })),
                "{raw} should be rejected"
            );
        }
    }

    #[test]
    fn test_invalid_timeout() {
        for raw in ["0", "-5", "soon"] {
            let result = EdgarConfig::from_lookup(lookup_from(&[
                (env::USER_AGENT, "Jane Doe (jane@example.com)"),
                (env::CACHE_DIR, "/tmp/x"),
                (env::TIMEOUT, raw),
            ]));
            assert!(matches!(result, Err(ConfigError::InvalidTimeout { .. })));
        }
    }

    #[test]
    fn test_with_requests_per_second_enforces_ceiling() {
        let config = EdgarConfig::from_lookup(lookup_from(&[
            (env::USER_AGENT, "Jane Doe (jane@example.com)"),
            (env::CACHE_DIR, "/tmp/x"),
        ]))
        .unwrap();
        assert!(config.clone().with_requests_per_second(11.0).is_err());
        assert_eq!(
            config.with_requests_per_second(2.5).unwrap().requests_per_second,
            2.5
        );
    }
}
