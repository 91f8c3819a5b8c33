//! Application configuration.
//!
//! Everything tunable lives here: source URLs, fetch behavior, the news
//! crawl bounds and the dividend table-shape thresholds. Values come from
//! an optional `finmonitor.toml` next to the binary, overridable through
//! `FINMONITOR_*` environment variables; absent keys fall back to the
//! defaults below.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Scraped site endpoints.
pub mod sources {
    pub const RBC_BASE_URL: &str = "https://www.rbc.ru/";
    pub const SMARTLAB_SHARES_URL: &str = "https://smart-lab.ru/q/shares/";
    pub const DOHOD_DIVIDEND_URL: &str = "https://www.dohod.ru/ik/analytics/dividend";
}

const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub database_url: String,
    pub fetch: FetchConfig,
    pub logging: LoggingConfig,
    pub news: NewsConfig,
    pub quotes: QuotesConfig,
    pub dividends: DividendsConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_url: "sqlite:./data/finmonitor.db".to_string(),
            fetch: FetchConfig::default(),
            logging: LoggingConfig::default(),
            news: NewsConfig::default(),
            quotes: QuotesConfig::default(),
            dividends: DividendsConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from `finmonitor.toml` (optional) with
    /// `FINMONITOR_*` environment overrides, e.g.
    /// `FINMONITOR_NEWS__MAX_ARTICLES=10`.
    pub fn load() -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name("finmonitor").required(false))
            .add_source(config::Environment::with_prefix("FINMONITOR").separator("__"))
            .build()
            .context("failed to assemble configuration")?;
        settings
            .try_deserialize()
            .context("invalid configuration values")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Per-request timeout; a stuck fetch fails just that one call.
    pub timeout_seconds: u64,
    pub user_agent: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: 10,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive when `RUST_LOG` is not set.
    pub level: String,
    /// Directory for daily-rotated log files; console-only when `None`.
    pub log_dir: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            log_dir: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NewsConfig {
    pub base_url: String,
    /// Cap on secondary article fetches per scrape.
    pub max_articles: usize,
    /// Politeness pause between article fetches.
    pub article_delay_ms: u64,
}

impl Default for NewsConfig {
    fn default() -> Self {
        Self {
            base_url: sources::RBC_BASE_URL.to_string(),
            max_articles: 30,
            article_delay_ms: 100,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QuotesConfig {
    pub url: String,
}

impl Default for QuotesConfig {
    fn default() -> Self {
        Self {
            url: sources::SMARTLAB_SHARES_URL.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DividendsConfig {
    pub url: String,
    /// Rows with fewer cells are dropped as separators/spacers.
    pub min_cells: usize,
    /// Minimum recognized header labels before the header row is trusted
    /// for column mapping; below this the fixed offsets apply.
    pub header_min_matches: usize,
    pub offsets: DividendColumnOffsets,
}

impl Default for DividendsConfig {
    fn default() -> Self {
        Self {
            url: sources::DOHOD_DIVIDEND_URL.to_string(),
            min_cells: 11,
            header_min_matches: 5,
            offsets: DividendColumnOffsets::default(),
        }
    }
}

/// Column positions of the dividend table as last observed; used whenever
/// the header row cannot be mapped confidently.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DividendColumnOffsets {
    pub name: usize,
    pub sector: usize,
    pub period: usize,
    pub payment: usize,
    pub currency: usize,
    pub yield_pct: usize,
    pub record_date: usize,
    pub capitalization: usize,
    pub dsi: usize,
}

impl Default for DividendColumnOffsets {
    fn default() -> Self {
        Self {
            name: 0,
            sector: 2,
            period: 3,
            payment: 4,
            currency: 5,
            yield_pct: 6,
            record_date: 8,
            capitalization: 9,
            dsi: 10,
        }
    }
}
