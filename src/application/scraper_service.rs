//! Scrape orchestration: fetch, parse, persist, audit.
//!
//! One routine per source, each following the same shape: fetch the page(s),
//! run the parser, hand the surviving records to the repository and write a
//! `scrape_logs` row with the counts. Partial success is the normal case —
//! a scrape that parsed some rows and skipped others still counts as
//! success; only "nothing at all" is reported as empty/failed.

use std::sync::Arc;

use anyhow::Result;
use chrono::{DateTime, Utc};
use scraper::Html;
use serde::Serialize;
use sqlx::SqlitePool;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::domain::records::ScrapeOutcome;
use crate::domain::source::SourceKind;
use crate::infrastructure::config::AppConfig;
use crate::infrastructure::http_client::PageFetcher;
use crate::infrastructure::repositories::{
    DividendRepository, NewsRepository, QuoteRepository, ScrapeLogEntry, ScrapeLogRepository,
    SourceRepository,
};
use crate::parsing::{DohodDividendsParser, RbcNewsParser, SmartlabQuotesParser};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScrapeStatus {
    /// At least one record was parsed.
    Success,
    /// The page was reachable but produced no records.
    Empty,
    /// The page was unreachable or its structure was not recognized.
    Failed,
}

/// What one scrape run did, for the caller and the audit table.
#[derive(Debug, Clone, Serialize)]
pub struct ScrapeSummary {
    pub run_id: Uuid,
    pub source: SourceKind,
    pub status: ScrapeStatus,
    pub parsed: usize,
    pub persisted: u64,
    pub skipped: usize,
}

/// Composes the per-source parsers with the fetcher and the repositories.
pub struct ScraperService {
    fetcher: Arc<dyn PageFetcher>,
    config: AppConfig,
    sources: SourceRepository,
    news: NewsRepository,
    quotes: QuoteRepository,
    dividends: DividendRepository,
    logs: ScrapeLogRepository,
}

impl ScraperService {
    pub fn new(pool: SqlitePool, fetcher: Arc<dyn PageFetcher>, config: AppConfig) -> Self {
        let pool = Arc::new(pool);
        Self {
            fetcher,
            config,
            sources: SourceRepository::new(pool.clone()),
            news: NewsRepository::new(pool.clone()),
            quotes: QuoteRepository::new(pool.clone()),
            dividends: DividendRepository::new(pool.clone()),
            logs: ScrapeLogRepository::new(pool),
        }
    }

    /// Run every source sequentially. A source that errors out at the
    /// persistence level is reported and does not stop the others.
    pub async fn run_all(&self) -> Vec<ScrapeSummary> {
        let mut summaries = Vec::new();
        for kind in SourceKind::all() {
            let result = match kind {
                SourceKind::Rbc => self.run_news().await,
                SourceKind::Smartlab => self.run_quotes().await,
                SourceKind::Dohod => self.run_dividends().await,
            };
            match result {
                Ok(summary) => summaries.push(summary),
                Err(e) => error!(source = %kind, "scrape run failed: {e:#}"),
            }
        }
        summaries
    }

    pub async fn run_news(&self) -> Result<ScrapeSummary> {
        info!("starting RBC news scrape");
        let started = Utc::now();
        let parser = RbcNewsParser::from_config(&self.config.news)?;
        let outcome = parser.collect(self.fetcher.as_ref()).await;

        let persisted = if outcome.is_empty() {
            warn!("news scrape produced no records");
            0
        } else {
            let source_id = self.sources.ensure(SourceKind::Rbc).await?;
            self.news.save(source_id, &outcome.records).await?
        };
        self.finish(SourceKind::Rbc, &outcome, persisted, started).await
    }

    pub async fn run_quotes(&self) -> Result<ScrapeSummary> {
        info!("starting Smartlab quotes scrape");
        let started = Utc::now();
        let outcome = match self.fetcher.fetch_text(&self.config.quotes.url).await {
            Ok(page) => {
                let doc = Html::parse_document(&page);
                SmartlabQuotesParser::new().parse_table(&doc)
            }
            Err(e) => {
                error!("quotes page fetch failed: {e:#}");
                ScrapeOutcome::failed(format!("page fetch failed: {e}"))
            }
        };

        let persisted = if outcome.is_empty() {
            warn!("quotes scrape produced no records");
            0
        } else {
            let source_id = self.sources.ensure(SourceKind::Smartlab).await?;
            self.quotes.save(source_id, &outcome.records).await?
        };
        self.finish(SourceKind::Smartlab, &outcome, persisted, started)
            .await
    }

    pub async fn run_dividends(&self) -> Result<ScrapeSummary> {
        info!("starting Dohod dividends scrape");
        let started = Utc::now();
        let outcome = match self.fetcher.fetch_text(&self.config.dividends.url).await {
            Ok(page) => {
                let doc = Html::parse_document(&page);
                DohodDividendsParser::from_config(&self.config.dividends).parse_table(&doc)
            }
            Err(e) => {
                error!("dividends page fetch failed: {e:#}");
                ScrapeOutcome::failed(format!("page fetch failed: {e}"))
            }
        };

        let persisted = if outcome.is_empty() {
            warn!("dividends scrape produced no records");
            0
        } else {
            let source_id = self.sources.ensure(SourceKind::Dohod).await?;
            self.dividends.save(source_id, &outcome.records).await?
        };
        self.finish(SourceKind::Dohod, &outcome, persisted, started)
            .await
    }

    /// Summarize the run, log it and write the audit row.
    async fn finish<T>(
        &self,
        kind: SourceKind,
        outcome: &ScrapeOutcome<T>,
        persisted: u64,
        started_at: DateTime<Utc>,
    ) -> Result<ScrapeSummary> {
        let status = if !outcome.records.is_empty() {
            ScrapeStatus::Success
        } else if outcome.diagnostics.is_empty() {
            ScrapeStatus::Empty
        } else {
            ScrapeStatus::Failed
        };

        let summary = ScrapeSummary {
            run_id: Uuid::new_v4(),
            source: kind,
            status,
            parsed: outcome.records.len(),
            persisted,
            skipped: outcome.skipped.len(),
        };

        let source_id = self.sources.ensure(kind).await?;
        self.logs
            .record(&ScrapeLogEntry {
                run_id: summary.run_id,
                source_id,
                status: status_label(status).to_string(),
                items_parsed: summary.parsed as i64,
                rows_skipped: summary.skipped as i64,
                error_message: outcome.diagnostics.first().cloned(),
                started_at,
                finished_at: Utc::now(),
            })
            .await?;

        info!(
            source = %kind,
            parsed = summary.parsed,
            persisted = summary.persisted,
            skipped = summary.skipped,
            status = status_label(status),
            "scrape finished"
        );
        Ok(summary)
    }
}

fn status_label(status: ScrapeStatus) -> &'static str {
    match status {
        ScrapeStatus::Success => "success",
        ScrapeStatus::Empty => "empty",
        ScrapeStatus::Failed => "failed",
    }
}
