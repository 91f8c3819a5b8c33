//! Domain layer: the value records produced by one scrape invocation
//! and the source registry they are keyed by.

pub mod records;
pub mod source;

pub use records::{DividendRow, NewsItem, QuoteRow, ScrapeOutcome, SkippedRow};
pub use source::SourceKind;
