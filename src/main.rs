//! Finmonitor CLI entry point.
//!
//! `finmonitor [all|news|quotes|dividends]` runs one scrape-and-persist
//! cycle for the chosen source(s). Scheduling is external: a cron job or
//! task queue invokes this binary.

use std::sync::Arc;

use anyhow::Result;
use tracing::info;

use finmonitor_lib::application::ScraperService;
use finmonitor_lib::infrastructure::config::AppConfig;
use finmonitor_lib::infrastructure::database_connection::DatabaseConnection;
use finmonitor_lib::infrastructure::http_client::HttpClient;
use finmonitor_lib::infrastructure::logging::init_logging_with_config;

#[tokio::main]
async fn main() -> Result<()> {
    let config = AppConfig::load()?;
    init_logging_with_config(&config.logging)?;

    let db = DatabaseConnection::new(&config.database_url).await?;
    db.migrate().await?;

    let fetcher = Arc::new(HttpClient::from_fetch_config(&config.fetch)?);
    let service = ScraperService::new(db.pool().clone(), fetcher, config);

    let target = std::env::args().nth(1).unwrap_or_else(|| "all".to_string());
    match target.as_str() {
        "all" => {
            let summaries = service.run_all().await;
            for summary in &summaries {
                info!(
                    source = %summary.source,
                    parsed = summary.parsed,
                    persisted = summary.persisted,
                    "run complete"
                );
            }
        }
        "news" => {
            service.run_news().await?;
        }
        "quotes" => {
            service.run_quotes().await?;
        }
        "dividends" => {
            service.run_dividends().await?;
        }
        other => {
            eprintln!("unknown source '{other}' (expected: all, news, quotes, dividends)");
            std::process::exit(2);
        }
    }
    Ok(())
}
