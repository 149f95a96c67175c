//! Trait definition for EDGAR lookups.
//!
//! Tool handlers take an [`EdgarApi`] rather than a concrete client, so they
//! can be exercised against in-memory fakes.
//!
//! # Example
//!
//! ```rust,ignore
//! use sec_edgar_client::edgar::EdgarApi;
//!
//! async fn describe<C: EdgarApi>(client: &C, ticker: &str) -> sec_edgar_client::Result<String> {
//!     let company = client.company(ticker).await?;
//!     Ok(format!("{} files as CIK {}", company.name, company.cik))
//! }
//! ```

use std::future::Future;

use crate::edgar::client::EdgarClient;
use crate::edgar::types::{
    Cik, Company, CompanyFacts, CompanyTicker, Filing, FilingContent, FilingQuery, InsiderSummary,
};
use crate::error::EdgarError;

/// EDGAR lookup operations.
///
/// All methods are async and return `Result<T, EdgarError>`.
pub trait EdgarApi: Send + Sync {
    /// Look up the CIK for an exchange ticker.
    fn cik_by_ticker(
        &self,
        ticker: &str,
    ) -> impl Future<Output = Result<Option<Cik>, EdgarError>> + Send;

    /// Filer metadata and recent filings.
    fn company(&self, identifier: &str) -> impl Future<Output = Result<Company, EdgarError>> + Send;

    /// Companies matching a ticker or name fragment.
    fn search_companies(
        &self,
        query: &str,
        limit: usize,
    ) -> impl Future<Output = Result<Vec<CompanyTicker>, EdgarError>> + Send;

    /// Recent filings filtered by `query`.
    fn filings(
        &self,
        identifier: &str,
        query: &FilingQuery,
    ) -> impl Future<Output = Result<Vec<Filing>, EdgarError>> + Send;

    /// All reported XBRL facts.
    fn company_facts(
        &self,
        identifier: &str,
    ) -> impl Future<Output = Result<CompanyFacts, EdgarError>> + Send;

    /// Forms 3, 4 and 5 from the last `days` days.
    fn insider_filings(
        &self,
        identifier: &str,
        days: u32,
        limit: usize,
    ) -> impl Future<Output = Result<Vec<Filing>, EdgarError>> + Send;

    /// Insider filing counts by form over the last `days` days.
    fn insider_summary(
        &self,
        identifier: &str,
        days: u32,
    ) -> impl Future<Output = Result<InsiderSummary, EdgarError>> + Send;

    /// One character page of a filing's full text.
    fn filing_content(
        &self,
        identifier: &str,
        accession_number: &str,
        offset: usize,
        max_chars: usize,
    ) -> impl Future<Output = Result<FilingContent, EdgarError>> + Send;
}

impl EdgarApi for EdgarClient {
    async fn cik_by_ticker(&self, ticker: &str) -> Result<Option<Cik>, EdgarError> {
        EdgarClient::cik_by_ticker(self, ticker).await
    }

    async fn company(&self, identifier: &str) -> Result<Company, EdgarError> {
        EdgarClient::company(self, identifier).await
    }

    async fn search_companies(
        &self,
        query: &str,
        limit: usize,
    ) -> Result<Vec<CompanyTicker>, EdgarError> {
        EdgarClient::search_companies(self, query, limit).await
    }

    async fn filings(
        &self,
        identifier: &str,
        query: &FilingQuery,
    ) -> Result<Vec<Filing>, EdgarError> {
        EdgarClient::filings(self, identifier, query).await
    }

    async fn company_facts(&self, identifier: &str) -> Result<CompanyFacts, EdgarError> {
        EdgarClient::company_facts(self, identifier).await
    }

    async fn insider_filings(
        &self,
        identifier: &str,
        days: u32,
        limit: usize,
    ) -> Result<Vec<Filing>, EdgarError> {
        EdgarClient::insider_filings(self, identifier, days, limit).await
    }

    async fn insider_summary(&self, identifier: &str, days: u32) -> Result<InsiderSummary, EdgarError> {
        EdgarClient::insider_summary(self, identifier, days).await
    }

    async fn filing_content(
        &self,
        identifier: &str,
        accession_number: &str,
        offset: usize,
        max_chars: usize,
    ) -> Result<FilingContent, EdgarError> {
        EdgarClient::filing_content(self, identifier, accession_number, offset, max_chars).await
    }
}
