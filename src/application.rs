//! Application layer: the scrape-and-persist routines invoked by the
//! scheduler (or the CLI).

pub mod scraper_service;

pub use scraper_service::{ScrapeStatus, ScrapeSummary, ScraperService};
