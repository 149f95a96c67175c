//! Error types for the SEC EDGAR client library.

use std::path::PathBuf;

use reqwest::{Method, StatusCode};
use thiserror::Error;

/// The main error type for all EDGAR client operations.
#[derive(Error, Debug)]
pub enum EdgarError {
    /// Configuration is missing or invalid
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Outbound request failed
    #[error("Network error: {0}")]
    Network(#[from] NetworkError),

    /// The cache directory could not be prepared
    #[error("Cache initialization failed: {0}")]
    CacheInit(#[from] CacheInitError),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A base URL or endpoint could not be joined
    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),

    /// No company matches the ticker or CIK
    #[error("Company not found: {0}")]
    CompanyNotFound(String),

    /// No filing with this accession number exists for the company
    #[error("Filing {accession_number} not found")]
    FilingNotFound {
        /// The accession number that was looked up
        accession_number: String,
    },

    /// Identifier is neither a ticker nor a CIK
    #[error("Invalid company identifier: {0:?}")]
    InvalidIdentifier(String),

    /// Upstream returned a document we could not interpret
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// Startup configuration errors.
///
/// These are fatal: SEC rejects unidentified traffic, so nothing is sent
/// until the configuration validates.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// `SEC_EDGAR_USER_AGENT` is not set
    #[error("SEC_EDGAR_USER_AGENT environment variable is not set")]
    MissingUserAgent,

    /// User agent lacks a name or a contact email
    #[error(
        "user agent must contain a name and an email address, e.g. 'Your Name (your@email.com)'; got {value:?}"
    )]
    MalformedUserAgent {
        /// The rejected value
        value: String,
    },

    /// Requests-per-second is outside (0, 10] or not a number
    #[error("rate limit must be a number in (0, {max}], got {value:?}")]
    InvalidRateLimit {
        /// The rejected value
        value: String,
        /// Upper bound accepted
        max: f64,
    },

    /// Timeout is not a positive integer number of seconds
    #[error("timeout must be a positive integer number of seconds, got {value:?}")]
    InvalidTimeout {
        /// The rejected value
        value: String,
    },

    /// Cache TTL is not a non-negative integer number of seconds
    #[error("cache TTL must be a non-negative integer number of seconds, got {value:?}")]
    InvalidCacheTtl {
        /// The rejected value
        value: String,
    },

    /// No default cache location could be determined
    #[error("no cache directory configured and no user cache location is available")]
    NoCacheDirectory,
}

/// Outbound HTTP failures, after any retries have been spent.
#[derive(Error, Debug)]
pub enum NetworkError {
    /// A retryable status persisted through every attempt
    #[error("{method} {url} failed after {attempts} attempts, last status {status}")]
    RetriesExhausted {
        /// Request method
        method: Method,
        /// Request URL
        url: String,
        /// Number of attempts made
        attempts: u32,
        /// Last observed status
        status: StatusCode,
    },

    /// A non-retryable error status
    #[error("{method} {url} returned {status}")]
    Status {
        /// Request method
        method: Method,
        /// Request URL
        url: String,
        /// Observed status
        status: StatusCode,
    },

    /// Connection, timeout or middleware failure
    #[error("{method} {url} failed: {source}")]
    Transport {
        /// Request method
        method: Method,
        /// Request URL
        url: String,
        /// Underlying error, including retry context when retries were spent
        #[source]
        source: reqwest_middleware::Error,
    },

    /// Reading the response body failed
    #[error("reading body of {url} failed: {source}")]
    Body {
        /// Request URL
        url: String,
        /// Underlying error
        #[source]
        source: reqwest::Error,
    },

    /// A default header value is not a legal HTTP header value
    #[error("invalid value for header {name}: {source}")]
    InvalidHeader {
        /// Header name
        name: String,
        /// Underlying error
        #[source]
        source: reqwest::header::InvalidHeaderValue,
    },

    /// The underlying HTTP client could not be constructed
    #[error("HTTP client construction failed: {0}")]
    Client(#[source] reqwest::Error),
}

impl NetworkError {
    /// The HTTP status carried by this error, if any.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::RetriesExhausted { status, .. } | Self::Status { status, .. } => Some(*status),
            Self::Transport { source, .. } => source.status(),
            Self::Body { source, .. } => source.status(),
            Self::InvalidHeader { .. } | Self::Client(_) => None,
        }
    }

    /// Check if the upstream reported the resource as missing.
    pub fn is_not_found(&self) -> bool {
        self.status() == Some(StatusCode::NOT_FOUND)
    }
}

/// Failure to prepare the on-disk cache directory.
#[derive(Error, Debug)]
pub enum CacheInitError {
    /// `~` could not be expanded because there is no home directory
    #[error("cannot expand {path:?}: no home directory")]
    NoHomeDirectory {
        /// The unexpanded path
        path: String,
    },

    /// The directory could not be created
    #[error("cannot create cache directory {}: {source}", path.display())]
    Create {
        /// Resolved directory path
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The directory exists but cannot be written
    #[error("cache directory {} is not writable: {source}", path.display())]
    NotWritable {
        /// Resolved directory path
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },
}
