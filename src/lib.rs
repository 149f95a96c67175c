//! # SEC EDGAR Client
//!
//! An async, rate-limited Rust client for SEC EDGAR company, filing and XBRL
//! data.
//!
//! ## Features
//!
//! - One process-wide request budget shared by every outbound call
//! - Automatic retries with exponential backoff for transient failures
//! - On-disk document cache in front of the network
//! - Strong typing for companies, filings and XBRL facts
//! - Financial precision with `rust_decimal`
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use sec_edgar_client::edgar::EdgarClient;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Reads SEC_EDGAR_USER_AGENT and friends, plus an optional .env file.
//!     let client = EdgarClient::from_env()?;
//!
//!     let facts = client.company_facts("MSFT").await?;
//!     for (concept, metric) in facts.key_metrics() {
//!         println!("{concept}: {} {} ({})", metric.value, metric.unit, metric.period_end);
//!     }
//!     Ok(())
//! }
//! ```

pub mod cache;
pub mod config;
pub mod edgar;
pub mod error;
pub mod http;
pub mod rate_limit;
pub mod telemetry;

// Re-export commonly used types at crate root
pub use config::{EdgarConfig, UserAgent};
pub use edgar::{EdgarApi, EdgarClient};
pub use error::EdgarError;

/// Result type alias using EdgarError
pub type Result<T> = std::result::Result<T, EdgarError>;
