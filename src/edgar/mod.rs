//! Typed lookups over the public SEC EDGAR JSON endpoints.
//!
//! [`EdgarClient`] is the composition root: it prepares the document cache,
//! owns the shared rate limiter and exposes company, filing and XBRL
//! lookups. The [`EdgarApi`] trait abstracts those lookups for callers that
//! want to swap in a fake.
//!
//! ## Endpoints
//!
//! | Lookup | Document |
//! |---|---|
//! | tickers | `www.sec.gov/files/company_tickers.json` |
//! | company, filings | `data.sec.gov/submissions/CIK##########.json` |
//! | company facts | `data.sec.gov/api/xbrl/companyfacts/CIK##########.json` |
//! | filing content | `www.sec.gov/Archives/edgar/data/<cik>/<accession>/<accession>.txt` |

mod client;
pub mod endpoints;
mod traits;
mod types;

pub use client::{EdgarClient, EdgarClientBuilder};
pub use traits::EdgarApi;
pub use types::{
    Cik, Company, CompanyFacts, CompanyTicker, Concept, ConceptSummary, DEFAULT_PAGE_CHARS,
    FactValue, Filing, FilingContent, FilingQuery, INSIDER_FORMS, InsiderSummary, KEY_METRICS,
    KeyMetric, PeriodComparison, PeriodValue, US_GAAP,
};
