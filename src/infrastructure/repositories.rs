//! Repositories for the scraped record sets.
//!
//! One repository per source table plus the `sources` lookup and the
//! `scrape_logs` run audit. News is the only set with a natural key the
//! store enforces (URL); quotes and dividends are append-only snapshots.
//! The quote repository owns the string-to-number cleanup: the parser's
//! contract is sentinel-filled strings, the table stores numbers.

use std::sync::Arc;

use anyhow::Result;
use chrono::{DateTime, Utc};
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use crate::domain::records::{DividendRow, NewsItem, QuoteRow};
use crate::domain::source::SourceKind;
use crate::parsing::normalize::clean_quote_number;

/// Lookup/registration of scrape sources by name.
#[derive(Clone)]
pub struct SourceRepository {
    pool: Arc<SqlitePool>,
}

impl SourceRepository {
    pub fn new(pool: Arc<SqlitePool>) -> Self {
        Self { pool }
    }

    /// Id of the source row, creating it on first use.
    pub async fn ensure(&self, kind: SourceKind) -> Result<i64> {
        sqlx::query("INSERT OR IGNORE INTO sources (name) VALUES (?)")
            .bind(kind.name())
            .execute(&*self.pool)
            .await?;
        let row = sqlx::query("SELECT id FROM sources WHERE name = ?")
            .bind(kind.name())
            .fetch_one(&*self.pool)
            .await?;
        Ok(row.get("id"))
    }
}

/// News persistence, keyed by article URL.
#[derive(Clone)]
pub struct NewsRepository {
    pool: Arc<SqlitePool>,
}

impl NewsRepository {
    pub fn new(pool: Arc<SqlitePool>) -> Self {
        Self { pool }
    }

    /// Insert items that are not stored yet; already-known URLs are left
    /// untouched. Returns the number of rows actually inserted.
    pub async fn save(&self, source_id: i64, items: &[NewsItem]) -> Result<u64> {
        let mut inserted = 0;
        for item in items {
            let result = sqlx::query(
                r#"
                INSERT OR IGNORE INTO news_items (source_id, title, url, body, parsed_at)
                VALUES (?, ?, ?, ?, ?)
                "#,
            )
            .bind(source_id)
            .bind(&item.title)
            .bind(&item.url)
            .bind(&item.body)
            .bind(Utc::now())
            .execute(&*self.pool)
            .await?;
            inserted += result.rows_affected();
        }
        Ok(inserted)
    }

    pub async fn count(&self) -> Result<i64> {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM news_items")
            .fetch_one(&*self.pool)
            .await?;
        Ok(row.get("n"))
    }
}

/// Quote persistence; raw cell strings are cleaned to numbers here.
#[derive(Clone)]
pub struct QuoteRepository {
    pool: Arc<SqlitePool>,
}

impl QuoteRepository {
    pub fn new(pool: Arc<SqlitePool>) -> Self {
        Self { pool }
    }

    pub async fn save(&self, source_id: i64, rows: &[QuoteRow]) -> Result<u64> {
        let mut inserted = 0;
        for row in rows {
            let result = sqlx::query(
                r#"
                INSERT INTO quote_rows
                (source_id, name, ticker, last_price_rub, price_change_pct, volume_mln_rub,
                 change_week_pct, change_month_pct, change_ytd_pct, change_year_pct,
                 cap_bln_rub, cap_bln_usd, parsed_at)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(source_id)
            .bind(&row.name)
            .bind(&row.ticker)
            .bind(clean_quote_number(&row.last_price))
            .bind(clean_quote_number(&row.price_change_pct))
            .bind(clean_quote_number(&row.volume))
            .bind(clean_quote_number(&row.change_1w))
            .bind(clean_quote_number(&row.change_1m))
            .bind(clean_quote_number(&row.change_ytd))
            .bind(clean_quote_number(&row.change_1y))
            .bind(clean_quote_number(&row.cap_rub))
            .bind(clean_quote_number(&row.cap_usd))
            .bind(Utc::now())
            .execute(&*self.pool)
            .await?;
            inserted += result.rows_affected();
        }
        Ok(inserted)
    }

    pub async fn count(&self) -> Result<i64> {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM quote_rows")
            .fetch_one(&*self.pool)
            .await?;
        Ok(row.get("n"))
    }
}

/// Dividend persistence; nullable numerics are stored as-is.
#[derive(Clone)]
pub struct DividendRepository {
    pool: Arc<SqlitePool>,
}

impl DividendRepository {
    pub fn new(pool: Arc<SqlitePool>) -> Self {
        Self { pool }
    }

    pub async fn save(&self, source_id: i64, rows: &[DividendRow]) -> Result<u64> {
        let mut inserted = 0;
        for row in rows {
            let result = sqlx::query(
                r#"
                INSERT INTO dividend_rows
                (source_id, ticker, company_name, sector, period, payment_per_share,
                 currency, yield_percent, record_date_estimate, capitalization, dsi, parsed_at)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(source_id)
            .bind(&row.ticker)
            .bind(&row.company_name)
            .bind(&row.sector)
            .bind(&row.period)
            .bind(row.payment_per_share)
            .bind(&row.currency)
            .bind(row.yield_percent)
            .bind(row.record_date_estimate)
            .bind(row.capitalization)
            .bind(row.dsi)
            .bind(Utc::now())
            .execute(&*self.pool)
            .await?;
            inserted += result.rows_affected();
        }
        Ok(inserted)
    }

    pub async fn count(&self) -> Result<i64> {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM dividend_rows")
            .fetch_one(&*self.pool)
            .await?;
        Ok(row.get("n"))
    }
}

/// One completed scrape run, for the audit table.
#[derive(Debug, Clone)]
pub struct ScrapeLogEntry {
    pub run_id: Uuid,
    pub source_id: i64,
    pub status: String,
    pub items_parsed: i64,
    pub rows_skipped: i64,
    pub error_message: Option<String>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

#[derive(Clone)]
pub struct ScrapeLogRepository {
    pool: Arc<SqlitePool>,
}

impl ScrapeLogRepository {
    pub fn new(pool: Arc<SqlitePool>) -> Self {
        Self { pool }
    }

    pub async fn record(&self, entry: &ScrapeLogEntry) -> Result<()> {
        let duration_ms = (entry.finished_at - entry.started_at).num_milliseconds();
        sqlx::query(
            r#"
            INSERT INTO scrape_logs
            (run_id, source_id, status, items_parsed, rows_skipped, error_message,
             started_at, finished_at, duration_ms)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(entry.run_id.to_string())
        .bind(entry.source_id)
        .bind(&entry.status)
        .bind(entry.items_parsed)
        .bind(entry.rows_skipped)
        .bind(&entry.error_message)
        .bind(entry.started_at)
        .bind(entry.finished_at)
        .bind(duration_ms)
        .execute(&*self.pool)
        .await?;
        Ok(())
    }
}
