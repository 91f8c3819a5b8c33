//! Finmonitor - Market data collection service for Russian financial sources
//!
//! This crate scrapes three public websites (RBC news, Smartlab stock quotes,
//! Dohod dividends), normalizes the extracted fields and persists the results
//! into a relational store. The parsing layer is resilient by design: one
//! malformed table row or one unreachable article never aborts a scrape.

// Module declarations
pub mod domain;
pub mod parsing;
pub mod application;
pub mod infrastructure;

// Re-export commonly used items
pub use domain::records::{DividendRow, NewsItem, QuoteRow, ScrapeOutcome, SkippedRow};
pub use domain::source::SourceKind;
pub use parsing::{DohodDividendsParser, RbcNewsParser, SmartlabQuotesParser};
pub use infrastructure::http_client::{HttpClient, HttpClientConfig, PageFetcher};
pub use application::scraper_service::{ScrapeSummary, ScraperService};
