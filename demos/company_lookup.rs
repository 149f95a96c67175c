//! Example: Company lookups against SEC EDGAR.
//!
//! Run with: SEC_EDGAR_USER_AGENT="Your Name (you@example.com)" cargo run --example company_lookup -- AAPL

use sec_edgar_client::edgar::{EdgarClient, FilingQuery};
use sec_edgar_client::{EdgarConfig, telemetry};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let ticker = std::env::args().nth(1).unwrap_or_else(|| "AAPL".to_string());

    let config = EdgarConfig::from_env()?;
    telemetry::init_tracing(&config.log_level);
    let client = EdgarClient::builder(config).build()?;

    let company = client.company(&ticker).await?;
    println!("{} (CIK {})", company.name, company.cik);
    if let Some(sic) = &company.sic_description {
        println!("Industry: {}", sic);
    }

    // Latest annual and quarterly reports.
    let reports = client
        .filings(
            &ticker,
            &FilingQuery::new().with_forms(["10-K", "10-Q"]).with_limit(4),
        )
        .await?;
    for filing in &reports {
        println!("{:>6} {} {}", filing.form, filing.filing_date, filing.accession_number);
    }

    let facts = client.company_facts(&ticker).await?;
    for (concept, metric) in facts.key_metrics() {
        println!("{concept}: {} {} as of {}", metric.value, metric.unit, metric.period_end);
    }

    let insiders = client.insider_filings(&ticker, 30, 5).await?;
    println!("Insider filings in the last 30 days: {}", insiders.len());

    // Peek at the start of the most recent report.
    if let Some(latest) = reports.first() {
        let page = client
            .filing_content(&ticker, &latest.accession_number, 0, 500)
            .await?;
        println!(
            "{} of {} characters; next page at {:?}",
            page.returned_chars, page.total_chars, page.next_offset
        );
    }

    Ok(())
}
