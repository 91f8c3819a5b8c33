// Database connection and pool management.
// SQLite through sqlx; tables are created in-place on startup.

use anyhow::Result;
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};
use std::path::Path;

pub struct DatabaseConnection {
    pool: SqlitePool,
}

impl DatabaseConnection {
    pub async fn new(database_url: &str) -> Result<Self> {
        let db_path = if database_url.starts_with("sqlite://") {
            database_url.trim_start_matches("sqlite://")
        } else if database_url.starts_with("sqlite:") {
            database_url.trim_start_matches("sqlite:")
        } else {
            database_url
        };

        // The database file (and its directory) must exist before the pool
        // connects.
        if !Path::new(db_path).exists() {
            if let Some(parent) = Path::new(db_path).parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::File::create(db_path)?;
        }

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await?;

        Ok(Self { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn migrate(&self) -> Result<()> {
        let create_sources_sql = r#"
            CREATE TABLE IF NOT EXISTS sources (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL UNIQUE
            )
        "#;

        let create_news_sql = r#"
            CREATE TABLE IF NOT EXISTS news_items (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                source_id INTEGER NOT NULL,
                title TEXT NOT NULL,
                url TEXT NOT NULL UNIQUE,
                body TEXT NOT NULL DEFAULT '',
                parsed_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP,
                FOREIGN KEY (source_id) REFERENCES sources (id)
            )
        "#;

        let create_quotes_sql = r#"
            CREATE TABLE IF NOT EXISTS quote_rows (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                source_id INTEGER NOT NULL,
                name TEXT,
                ticker TEXT,
                last_price_rub REAL NOT NULL DEFAULT 0,
                price_change_pct REAL NOT NULL DEFAULT 0,
                volume_mln_rub REAL NOT NULL DEFAULT 0,
                change_week_pct REAL NOT NULL DEFAULT 0,
                change_month_pct REAL NOT NULL DEFAULT 0,
                change_ytd_pct REAL NOT NULL DEFAULT 0,
                change_year_pct REAL NOT NULL DEFAULT 0,
                cap_bln_rub REAL NOT NULL DEFAULT 0,
                cap_bln_usd REAL NOT NULL DEFAULT 0,
                parsed_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP,
                FOREIGN KEY (source_id) REFERENCES sources (id)
            )
        "#;

        let create_dividends_sql = r#"
            CREATE TABLE IF NOT EXISTS dividend_rows (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                source_id INTEGER NOT NULL,
                ticker TEXT,
                company_name TEXT,
                sector TEXT,
                period TEXT,
                payment_per_share REAL,
                currency TEXT,
                yield_percent REAL,
                record_date_estimate DATE,
                capitalization REAL,
                dsi REAL,
                parsed_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP,
                FOREIGN KEY (source_id) REFERENCES sources (id)
            )
        "#;

        let create_logs_sql = r#"
            CREATE TABLE IF NOT EXISTS scrape_logs (
                run_id TEXT PRIMARY KEY,
                source_id INTEGER NOT NULL,
                status TEXT NOT NULL,
                items_parsed INTEGER NOT NULL DEFAULT 0,
                rows_skipped INTEGER NOT NULL DEFAULT 0,
                error_message TEXT,
                started_at DATETIME NOT NULL,
                finished_at DATETIME NOT NULL,
                duration_ms INTEGER NOT NULL DEFAULT 0,
                FOREIGN KEY (source_id) REFERENCES sources (id)
            )
        "#;

        let create_indexes_sql = [
            "CREATE INDEX IF NOT EXISTS idx_quote_rows_ticker ON quote_rows (ticker)",
            "CREATE INDEX IF NOT EXISTS idx_dividend_rows_ticker ON dividend_rows (ticker)",
            "CREATE INDEX IF NOT EXISTS idx_scrape_logs_source ON scrape_logs (source_id)",
        ];

        sqlx::query(create_sources_sql).execute(&self.pool).await?;
        sqlx::query(create_news_sql).execute(&self.pool).await?;
        sqlx::query(create_quotes_sql).execute(&self.pool).await?;
        sqlx::query(create_dividends_sql).execute(&self.pool).await?;
        sqlx::query(create_logs_sql).execute(&self.pool).await?;
        for statement in create_indexes_sql {
            sqlx::query(statement).execute(&self.pool).await?;
        }

        Ok(())
    }
}
