//! Typed records for SEC EDGAR lookups.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};
use time::Date;
use time::macros::format_description;

use crate::error::EdgarError;

time::serde::format_description!(iso_date, Date, "[year]-[month]-[day]");

/// Default page size for [`FilingContent`].
pub const DEFAULT_PAGE_CHARS: usize = 50_000;

/// US-GAAP concepts reported by [`CompanyFacts::key_metrics`].
pub const KEY_METRICS: [&str; 8] = [
    "Assets",
    "Liabilities",
    "StockholdersEquity",
    "Revenues",
    "NetIncomeLoss",
    "EarningsPerShareBasic",
    "CashAndCashEquivalentsAtCarryingValue",
    "CommonStockSharesOutstanding",
];

/// Taxonomy of the headline metrics.
pub const US_GAAP: &str = "us-gaap";

/// Insider ownership forms (initial, changes, annual) and their amendments.
pub const INSIDER_FORMS: [&str; 6] = ["3", "4", "5", "3/A", "4/A", "5/A"];

fn parse_date(value: &str) -> Option<Date> {
    Date::parse(value.trim(), format_description!("[year]-[month]-[day]")).ok()
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Central Index Key, SEC's filer identifier.
///
/// Displays zero padded to ten digits, the form SEC URLs use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cik(u64);

impl Cik {
    /// Largest CIK that fits ten digits.
    pub const MAX: u64 = 9_999_999_999;

    /// Wrap a numeric CIK.
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// The numeric value, without padding.
    pub const fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for Cik {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:010}", self.0)
    }
}

impl FromStr for Cik {
    type Err = EdgarError;

    /// Accepts `320193`, `0000320193` and `CIK0000320193`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let digits = match trimmed.get(..3) {
            Some(prefix) if prefix.eq_ignore_ascii_case("cik") => &trimmed[3..],
            _ => trimmed,
        };

        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(EdgarError::InvalidIdentifier(s.to_string()));
        }
        match digits.parse::<u64>() {
            Ok(value) if value <= Self::MAX => Ok(Self(value)),
            _ => Err(EdgarError::InvalidIdentifier(s.to_string())),
        }
    }
}

/// One row of SEC's ticker file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompanyTicker {
    /// Filer CIK.
    #[serde(rename = "cik_str")]
    pub cik: Cik,
    /// Exchange ticker, upper case.
    pub ticker: String,
    /// Registrant name.
    pub title: String,
}

/// Parse SEC's `company_tickers.json`, preserving its ranking order.
pub(crate) fn parse_ticker_file(body: &[u8]) -> Result<Vec<CompanyTicker>, EdgarError> {
    let rows: HashMap<String, CompanyTicker> = serde_json::from_slice(body)?;
    let mut ranked: Vec<(u64, CompanyTicker)> = rows
        .into_iter()
        .map(|(rank, row)| (rank.parse().unwrap_or(u64::MAX), row))
        .collect();
    ranked.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.ticker.cmp(&b.1.ticker)));
    Ok(ranked.into_iter().map(|(_, row)| row).collect())
}

/// Normalize a ticker the way SEC spells share classes (`BRK.B` → `BRK-B`).
pub(crate) fn normalize_ticker(ticker: &str) -> String {
    ticker.trim().to_ascii_uppercase().replace('.', "-")
}

/// A single filing in a company's submission history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Filing {
    /// Accession number, e.g. `0000320193-23-000106`.
    pub accession_number: String,
    /// Form type, e.g. `10-K`.
    pub form: String,
    /// Date SEC accepted the filing.
    #[serde(with = "iso_date")]
    pub filing_date: Date,
    /// Period the filing reports on, when applicable.
    #[serde(with = "iso_date::option", default)]
    pub report_date: Option<Date>,
    /// Main document file name.
    pub primary_document: Option<String>,
    /// Main document description.
    pub description: Option<String>,
}

impl Filing {
    /// Accession number without dashes.
    pub fn accession_key(&self) -> String {
        self.accession_number.replace('-', "")
    }

    /// Whether the form type equals any of `forms`, ignoring case.
    pub fn is_form(&self, forms: &[String]) -> bool {
        forms.iter().any(|f| f.trim().eq_ignore_ascii_case(&self.form))
    }
}

/// Filter for [`EdgarClient::filings`](crate::edgar::EdgarClient::filings).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilingQuery {
    /// Form types to keep; empty keeps all.
    pub forms: Vec<String>,
    /// Keep filings on or after this date.
    pub since: Option<Date>,
    /// Maximum number of filings, newest first.
    pub limit: Option<usize>,
}

impl FilingQuery {
    /// Create an unfiltered query.
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep one more form type.
    pub fn with_form(mut self, form: impl Into<String>) -> Self {
        self.forms.push(form.into());
        self
    }

    /// Keep these form types.
    pub fn with_forms<I, S>(mut self, forms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.forms.extend(forms.into_iter().map(Into::into));
        self
    }

    /// Drop filings older than `date`.
    pub fn since(mut self, date: Date) -> Self {
        self.since = Some(date);
        self
    }

    /// Cap the number of filings returned.
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Apply the filter to filings ordered newest first.
    pub fn apply<'a, I>(&self, filings: I) -> Vec<Filing>
    where
        I: IntoIterator<Item = &'a Filing>,
    {
        filings
            .into_iter()
            .filter(|f| self.forms.is_empty() || f.is_form(&self.forms))
            .filter(|f| self.since.is_none_or(|since| f.filing_date >= since))
            .take(self.limit.unwrap_or(usize::MAX))
            .cloned()
            .collect()
    }
}

/// Filer metadata with its recent filings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Company {
    pub cik: Cik,
    pub name: String,
    pub entity_type: Option<String>,
    pub tickers: Vec<String>,
    pub exchanges: Vec<String>,
    pub sic: Option<String>,
    pub sic_description: Option<String>,
    pub state_of_incorporation: Option<String>,
    /// `MMDD`, e.g. `0928`.
    pub fiscal_year_end: Option<String>,
    /// Recent filings, newest first.
    pub filings: Vec<Filing>,
}

impl Company {
    /// Primary ticker, if the filer is listed.
    pub fn ticker(&self) -> Option<&str> {
        self.tickers.first().map(String::as_str)
    }

    /// Find a filing by accession number, with or without dashes.
    pub fn find_filing(&self, accession_number: &str) -> Option<&Filing> {
        let wanted = accession_number.trim().replace('-', "");
        self.filings.iter().find(|f| f.accession_key() == wanted)
    }
}

/// Raw `submissions/CIK##########.json` document.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Submissions {
    cik: String,
    name: String,
    #[serde(default)]
    entity_type: Option<String>,
    #[serde(default)]
    tickers: Vec<Option<String>>,
    #[serde(default)]
    exchanges: Vec<Option<String>>,
    #[serde(default)]
    sic: Option<String>,
    #[serde(default)]
    sic_description: Option<String>,
    #[serde(default)]
    state_of_incorporation: Option<String>,
    #[serde(default)]
    fiscal_year_end: Option<String>,
    #[serde(default)]
    filings: SubmissionFilings,
}

#[derive(Debug, Default, Deserialize)]
struct SubmissionFilings {
    #[serde(default)]
    recent: RecentFilings,
}

/// Column-oriented filing arrays as SEC ships them.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RecentFilings {
    #[serde(default)]
    accession_number: Vec<String>,
    #[serde(default)]
    filing_date: Vec<String>,
    #[serde(default)]
    report_date: Vec<String>,
    #[serde(default)]
    form: Vec<String>,
    #[serde(default)]
    primary_document: Vec<String>,
    #[serde(default)]
    primary_doc_description: Vec<String>,
}

impl RecentFilings {
    fn into_filings(self) -> Result<Vec<Filing>, EdgarError> {
        let column = |values: &[String], idx: usize| non_empty(values.get(idx).cloned());

        self.accession_number
            .iter()
            .enumerate()
            .map(|(idx, accession)| {
                let raw_date = self.filing_date.get(idx).map(String::as_str).unwrap_or("");
                let filing_date = parse_date(raw_date).ok_or_else(|| {
                    EdgarError::InvalidResponse(format!(
                        "filing {accession} has invalid filing date {raw_date:?}"
                    ))
                })?;

                Ok(Filing {
                    accession_number: accession.clone(),
                    form: self.form.get(idx).cloned().unwrap_or_default(),
                    filing_date,
                    report_date: self.report_date.get(idx).and_then(|d| parse_date(d)),
                    primary_document: column(&self.primary_document, idx),
                    description: column(&self.primary_doc_description, idx),
                })
            })
            .collect()
    }
}

impl TryFrom<Submissions> for Company {
    type Error = EdgarError;

    fn try_from(raw: Submissions) -> Result<Self, Self::Error> {
        let cik = raw.cik.parse::<Cik>()?;
        Ok(Self {
            cik,
            name: raw.name,
            entity_type: non_empty(raw.entity_type),
            tickers: raw.tickers.into_iter().flatten().collect(),
            exchanges: raw.exchanges.into_iter().flatten().collect(),
            sic: non_empty(raw.sic),
            sic_description: non_empty(raw.sic_description),
            state_of_incorporation: non_empty(raw.state_of_incorporation),
            fiscal_year_end: non_empty(raw.fiscal_year_end),
            filings: raw.filings.recent.into_filings()?,
        })
    }
}

/// All XBRL facts a filer has reported, grouped by taxonomy then concept.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanyFacts {
    pub cik: Cik,
    pub entity_name: String,
    #[serde(default)]
    pub facts: HashMap<String, HashMap<String, Concept>>,
}

/// One XBRL concept with its reported values per unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Concept {
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub units: HashMap<String, Vec<FactValue>>,
}

/// A single reported value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FactValue {
    /// Period start for duration facts.
    #[serde(with = "iso_date::option", default)]
    pub start: Option<Date>,
    /// Period end (or instant).
    #[serde(with = "iso_date")]
    pub end: Date,
    #[serde(with = "rust_decimal::serde::arbitrary_precision")]
    pub val: Decimal,
    /// Accession number of the reporting filing.
    #[serde(default)]
    pub accn: Option<String>,
    /// Fiscal year.
    #[serde(default)]
    pub fy: Option<i32>,
    /// Fiscal period (`FY`, `Q1`..`Q4`).
    #[serde(default)]
    pub fp: Option<String>,
    #[serde(default)]
    pub form: Option<String>,
    #[serde(with = "iso_date::option", default)]
    pub filed: Option<Date>,
    #[serde(default)]
    pub frame: Option<String>,
}

/// The most recent value of one concept.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KeyMetric {
    pub concept: String,
    pub value: Decimal,
    pub unit: String,
    #[serde(with = "iso_date")]
    pub period_end: Date,
    pub form: Option<String>,
    pub fiscal_year: Option<i32>,
    pub fiscal_period: Option<String>,
}

impl CompanyFacts {
    /// Look up a concept, e.g. `("us-gaap", "Assets")`.
    pub fn concept(&self, taxonomy: &str, concept: &str) -> Option<&Concept> {
        self.facts.get(taxonomy)?.get(concept)
    }

    /// Latest reported value of a concept across all of its units.
    ///
    /// Ties on period end go to the later filing, then to the unit name
    /// that sorts first.
    pub fn latest(&self, taxonomy: &str, concept: &str) -> Option<KeyMetric> {
        let units = &self.concept(taxonomy, concept)?.units;
        let mut unit_names: Vec<&String> = units.keys().collect();
        unit_names.sort();

        let mut best: Option<(&String, &FactValue)> = None;
        for unit in unit_names {
            for fact in &units[unit] {
                let newer = best.is_none_or(|(_, current)| {
                    (fact.end, fact.filed) > (current.end, current.filed)
                });
                if newer {
                    best = Some((unit, fact));
                }
            }
        }

        best.map(|(unit, fact)| KeyMetric {
            concept: concept.to_string(),
            value: fact.val,
            unit: unit.clone(),
            period_end: fact.end,
            form: fact.form.clone(),
            fiscal_year: fact.fy,
            fiscal_period: fact.fp.clone(),
        })
    }

    /// Latest values of the headline US-GAAP metrics that the filer reports.
    pub fn key_metrics(&self) -> BTreeMap<String, KeyMetric> {
        self.metrics(&KEY_METRICS)
    }

    /// Latest values of the given US-GAAP concepts; unreported ones are
    /// left out.
    pub fn metrics(&self, concepts: &[&str]) -> BTreeMap<String, KeyMetric> {
        concepts
            .iter()
            .filter_map(|concept| {
                self.latest(US_GAAP, concept)
                    .map(|metric| (concept.to_string(), metric))
            })
            .collect()
    }

    /// Concepts whose name or label contains `term`, ignoring case.
    ///
    /// `None` lists every concept that has at least one value. Results are
    /// ordered by taxonomy, then concept name.
    pub fn search_concepts(&self, term: Option<&str>) -> Vec<ConceptSummary> {
        let needle = term.map(|t| t.trim().to_lowercase()).unwrap_or_default();

        let mut found: Vec<ConceptSummary> = self
            .facts
            .iter()
            .flat_map(|(taxonomy, concepts)| {
                concepts.iter().map(move |(name, concept)| (taxonomy, name, concept))
            })
            .filter(|(_, name, concept)| {
                needle.is_empty()
                    || name.to_lowercase().contains(&needle)
                    || concept
                        .label
                        .as_deref()
                        .is_some_and(|label| label.to_lowercase().contains(&needle))
            })
            .filter_map(|(taxonomy, name, concept)| {
                let values = concept.units.values().flatten();
                let fact_count = values.clone().count();
                (fact_count > 0).then(|| ConceptSummary {
                    taxonomy: taxonomy.clone(),
                    concept: name.clone(),
                    label: concept.label.clone(),
                    fact_count,
                    latest_period: values.map(|fact| fact.end).max(),
                })
            })
            .collect();

        found.sort_by(|a, b| (&a.taxonomy, &a.concept).cmp(&(&b.taxonomy, &b.concept)));
        found
    }

    /// One value per fiscal year in `start_year..=end_year`, with growth
    /// between the first and last year found.
    ///
    /// Values come from the unit with the most facts in range. Within a
    /// year, full-year (`FY`) facts win over quarters, then the latest
    /// period end, then the latest filing. Returns `None` when the concept
    /// is not reported.
    pub fn period_values(
        &self,
        taxonomy: &str,
        concept: &str,
        start_year: i32,
        end_year: i32,
    ) -> Option<PeriodComparison> {
        let units = &self.concept(taxonomy, concept)?.units;
        let in_range = |fact: &&FactValue| {
            fact.fy
                .is_some_and(|year| (start_year..=end_year).contains(&year))
        };

        let mut unit_names: Vec<&String> = units.keys().collect();
        unit_names.sort();
        let unit = unit_names
            .into_iter()
            .map(|unit| (units[unit].iter().filter(in_range).count(), unit))
            .filter(|(count, _)| *count > 0)
            .fold(None, |best: Option<(usize, &String)>, candidate| match best {
                Some(current) if current.0 >= candidate.0 => Some(current),
                _ => Some(candidate),
            })
            .map(|(_, unit)| unit);

        let mut by_year: BTreeMap<i32, &FactValue> = BTreeMap::new();
        if let Some(unit) = unit {
            for fact in units[unit].iter().filter(in_range) {
                let Some(year) = fact.fy else { continue };
                let rank = |f: &FactValue| (f.fp.as_deref() == Some("FY"), f.end, f.filed);
                let replace = by_year
                    .get(&year)
                    .is_none_or(|current| rank(fact) > rank(*current));
                if replace {
                    by_year.insert(year, fact);
                }
            }
        }

        let unit = unit.cloned().unwrap_or_default();
        let values: Vec<PeriodValue> = by_year
            .into_iter()
            .map(|(fiscal_year, fact)| PeriodValue {
                fiscal_year,
                fiscal_period: fact.fp.clone(),
                value: fact.val,
                unit: unit.clone(),
                period_end: fact.end,
                form: fact.form.clone(),
            })
            .collect();

        Some(PeriodComparison::new(concept, values))
    }
}

/// A concept found by [`CompanyFacts::search_concepts`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConceptSummary {
    pub taxonomy: String,
    pub concept: String,
    pub label: Option<String>,
    /// Number of reported values across all units.
    pub fact_count: usize,
    /// Latest period end reported.
    #[serde(with = "iso_date::option")]
    pub latest_period: Option<Date>,
}

/// A concept's value for one fiscal year.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeriodValue {
    pub fiscal_year: i32,
    pub fiscal_period: Option<String>,
    pub value: Decimal,
    pub unit: String,
    #[serde(with = "iso_date")]
    pub period_end: Date,
    pub form: Option<String>,
}

/// Year-over-year values of one concept and the growth across them.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeriodComparison {
    pub concept: String,
    /// Ascending by fiscal year.
    pub values: Vec<PeriodValue>,
    /// `(end - start) / start * 100`, two decimal places.
    pub total_growth_percent: Option<Decimal>,
    /// Compound annual growth rate in percent, two decimal places.
    pub cagr_percent: Option<f64>,
}

impl PeriodComparison {
    fn new(concept: &str, values: Vec<PeriodValue>) -> Self {
        let (total_growth_percent, cagr_percent) = match (values.first(), values.last()) {
            (Some(first), Some(last)) if values.len() >= 2 => growth(first, last),
            _ => (None, None),
        };

        Self {
            concept: concept.to_string(),
            values,
            total_growth_percent,
            cagr_percent,
        }
    }

    /// First value in range.
    pub fn start_value(&self) -> Option<Decimal> {
        self.values.first().map(|v| v.value)
    }

    /// Last value in range.
    pub fn end_value(&self) -> Option<Decimal> {
        self.values.last().map(|v| v.value)
    }
}

/// Growth is undefined from a zero start; CAGR also needs a positive ratio.
fn growth(first: &PeriodValue, last: &PeriodValue) -> (Option<Decimal>, Option<f64>) {
    if first.value.is_zero() {
        return (None, None);
    }

    let total = (last.value - first.value)
        .checked_div(first.value)
        .and_then(|ratio| ratio.checked_mul(Decimal::ONE_HUNDRED))
        .map(|pct| pct.round_dp(2));

    let years = last.fiscal_year - first.fiscal_year;
    let cagr = last
        .value
        .checked_div(first.value)
        .and_then(|ratio| ratio.to_f64())
        .filter(|ratio| years > 0 && *ratio > 0.0)
        .map(|ratio| {
            let pct = (ratio.powf(1.0 / f64::from(years)) - 1.0) * 100.0;
            (pct * 100.0).round() / 100.0
        });

    (total, cagr)
}

/// One page of a filing's full text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FilingContent {
    pub accession_number: String,
    pub form: String,
    #[serde(with = "iso_date")]
    pub filing_date: Date,
    pub url: String,
    pub content: String,
    /// Character offset of `content` within the document.
    pub offset: usize,
    pub returned_chars: usize,
    pub total_chars: usize,
    /// Offset of the next page, `None` on the last page.
    pub next_offset: Option<usize>,
}

impl FilingContent {
    /// Cut a page of `max_chars` characters starting at `offset`.
    ///
    /// A `max_chars` of zero selects [`DEFAULT_PAGE_CHARS`]; an offset past
    /// the end yields an empty last page.
    pub fn page(filing: &Filing, url: String, text: &str, offset: usize, max_chars: usize) -> Self {
        let max_chars = if max_chars == 0 {
            DEFAULT_PAGE_CHARS
        } else {
            max_chars
        };
        let total_chars = text.chars().count();
        let content: String = text.chars().skip(offset).take(max_chars).collect();
        let returned_chars = content.chars().count();
        let page_end = offset.saturating_add(returned_chars).min(total_chars);

        Self {
            accession_number: filing.accession_number.clone(),
            form: filing.form.clone(),
            filing_date: filing.filing_date,
            url,
            content,
            offset,
            returned_chars,
            total_chars,
            next_offset: (offset < total_chars && page_end < total_chars).then_some(page_end),
        }
    }
}

/// Counts of a filer's insider ownership filings over a window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InsiderSummary {
    pub period_days: u32,
    pub total_filings: usize,
    /// Filings per form type.
    pub by_form: BTreeMap<String, usize>,
    /// Most recent filings first, at most [`InsiderSummary::RECENT`].
    pub recent: Vec<Filing>,
}

impl InsiderSummary {
    /// Number of filings kept in `recent`.
    pub const RECENT: usize = 10;

    /// Summarize filings already narrowed to the window.
    pub fn from_filings(period_days: u32, filings: &[Filing]) -> Self {
        let mut by_form = BTreeMap::new();
        for filing in filings {
            *by_form.entry(filing.form.clone()).or_insert(0) += 1;
        }

        let mut recent = filings.to_vec();
        recent.sort_by(|a, b| b.filing_date.cmp(&a.filing_date));
        recent.truncate(Self::RECENT);

        Self {
            period_days,
            total_filings: filings.len(),
            by_form,
            recent,
        }
    }
}
