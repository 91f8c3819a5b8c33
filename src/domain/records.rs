//! Value records produced by the parsers.
//!
//! All records are plain immutable values created fresh per scrape invocation
//! and handed wholesale to the persistence layer; the parsers keep no state
//! between invocations.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One news article extracted from RBC.
///
/// Only emitted when a non-empty title was found; `body` may be empty when
/// every body-extraction strategy came up short.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewsItem {
    pub title: String,
    /// Absolute article URL with the query string stripped. Unique within
    /// one scrape; the repository additionally enforces uniqueness across
    /// scrapes.
    pub url: String,
    pub body: String,
}

/// One row of the Smartlab quote table, as raw cell text.
///
/// Every field defaults to [`crate::parsing::normalize::NO_INFORMATION`]
/// when the corresponding cell is absent; numeric interpretation happens at
/// persist time, not here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuoteRow {
    pub name: String,
    pub ticker: String,
    pub last_price: String,
    pub price_change_pct: String,
    pub volume: String,
    pub change_1w: String,
    pub change_1m: String,
    pub change_ytd: String,
    pub change_1y: String,
    pub cap_rub: String,
    pub cap_usd: String,
}

/// One row of the Dohod dividend table, fully typed.
///
/// Numeric fields are `None` when the source cell was missing or unparsable;
/// unlike the quote pipeline this source distinguishes "zero" from "unknown".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DividendRow {
    /// Upper-cased last path segment of the company detail link.
    pub ticker: String,
    pub company_name: String,
    pub sector: String,
    pub period: String,
    pub payment_per_share: Option<f64>,
    /// ISO-ish currency code validated against a fixed set, else empty.
    pub currency: String,
    pub yield_percent: Option<f64>,
    pub record_date_estimate: Option<NaiveDate>,
    pub capitalization: Option<f64>,
    pub dsi: Option<f64>,
}

/// A row or link that was dropped during one scrape, with the position it
/// held in the source document and the reason it was dropped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedRow {
    pub index: usize,
    pub reason: String,
}

/// The result of one scrape: the records that survived, the units that were
/// skipped, and any scrape-level diagnostics (e.g. "target table not found").
///
/// Callers assert on skip counts directly instead of parsing log output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScrapeOutcome<T> {
    pub records: Vec<T>,
    pub skipped: Vec<SkippedRow>,
    pub diagnostics: Vec<String>,
}

impl<T> ScrapeOutcome<T> {
    pub fn new() -> Self {
        Self {
            records: Vec::new(),
            skipped: Vec::new(),
            diagnostics: Vec::new(),
        }
    }

    /// An empty outcome carrying a single scrape-level diagnostic. Used when
    /// the expected page structure was not found at all.
    pub fn failed(diagnostic: impl Into<String>) -> Self {
        Self {
            records: Vec::new(),
            skipped: Vec::new(),
            diagnostics: vec![diagnostic.into()],
        }
    }

    pub fn push(&mut self, record: T) {
        self.records.push(record);
    }

    pub fn skip(&mut self, index: usize, reason: impl Into<String>) {
        self.skipped.push(SkippedRow {
            index,
            reason: reason.into(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }
}

impl<T> Default for ScrapeOutcome<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: serde::Serialize> ScrapeOutcome<T> {
    /// JSON projection of the record list, for debugging and the query API.
    pub fn records_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&self.records)
    }
}
