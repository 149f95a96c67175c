//! SEC EDGAR endpoint constants.

use crate::edgar::Cik;

/// Base URL for `www.sec.gov` (ticker file, archives).
pub const SEC_BASE_URL: &str = "https://www.sec.gov";

/// Base URL for `data.sec.gov` (submissions, XBRL APIs).
pub const DATA_BASE_URL: &str = "https://data.sec.gov";

/// Ticker to CIK mapping for all listed filers.
pub const COMPANY_TICKERS: &str = "/files/company_tickers.json";

/// Filer metadata plus its most recent filings.
pub fn submissions(cik: Cik) -> String {
    format!("/submissions/CIK{cik}.json")
}

/// Every XBRL fact a filer has reported.
pub fn company_facts(cik: Cik) -> String {
    format!("/api/xbrl/companyfacts/CIK{cik}.json")
}

/// Full-text submission file for one filing.
pub fn filing_text(cik: Cik, accession_number: &str) -> String {
    format!(
        "/Archives/edgar/data/{}/{}/{}.txt",
        cik.value(),
        accession_number.replace('-', ""),
        accession_number
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths() {
        let cik = Cik::new(320193);
        assert_eq!(submissions(cik), "/submissions/CIK0000320193.json");
        assert_eq!(company_facts(cik), "/api/xbrl/companyfacts/CIK0000320193.json");
        assert_eq!(
            filing_text(cik, "0000320193-23-000106"),
            "/Archives/edgar/data/320193/000032019323000106/0000320193-23-000106.txt"
        );
    }
}
