//! End-to-end pipeline tests: stub fetcher -> parser -> repository.

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use sqlx::Row;
use tempfile::TempDir;

use finmonitor_lib::application::{ScrapeStatus, ScraperService};
use finmonitor_lib::infrastructure::config::{sources, AppConfig};
use finmonitor_lib::infrastructure::database_connection::DatabaseConnection;
use finmonitor_lib::infrastructure::repositories::{
    DividendRepository, NewsRepository, QuoteRepository,
};
use finmonitor_lib::infrastructure::PageFetcher;

struct StubFetcher {
    pages: HashMap<String, String>,
}

#[async_trait]
impl PageFetcher for StubFetcher {
    async fn fetch_text(&self, url: &str) -> Result<String> {
        self.pages
            .get(url)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("no page for {url}"))
    }
}

const ARTICLE_URL: &str = "https://www.rbc.ru/news/aabbccddeeff001122334455";

fn front_page() -> String {
    "<html><body>\
     <a href=\"/news/aabbccddeeff001122334455\">длинный заголовок новости на главной</a>\
     <a href=\"/politics/?utm_source=x\">Политика</a>\
     </body></html>"
        .to_string()
}

fn article_page() -> String {
    "<html><head><title>Новость :: РБК</title></head><body>\
     <h1>Рынок акций вырос по итогам торгов</h1>\
     <article><p>Российский рынок акций завершил торговую сессию уверенным ростом \
     на фоне повышения мировых цен на нефть и укрепления курса национальной валюты.</p></article>\
     </body></html>"
        .to_string()
}

fn quotes_page() -> String {
    "<html><body><div class=\"main__table\"><table>\
     <tr><th>Название</th></tr>\
     <tr>\
       <td class=\"trades-table__name\"><a href=\"/q/SBER/\">Сбербанк</a></td>\
       <td class=\"trades-table__ticker\">SBER</td>\
       <td class=\"trades-table__price\">305,2</td>\
       <td class=\"trades-table__change-per\">+1,2%</td>\
       <td class=\"trades-table__volume\">12 340,5</td>\
       <td class=\"trades-table__week\">0,5%</td>\
       <td class=\"trades-table__month\">2,1%</td>\
       <td class=\"trades-table__first\">10,0%</td>\
       <td class=\"trades-table__year\">15,3%</td>\
       <td class=\"trades-table__rub\">6 800</td>\
       <td class=\"trades-table__usd\">75,2</td>\
     </tr>\
     <tr>\
       <td class=\"trades-table__name\"><a href=\"/q/GAZP/\">Газпром</a></td>\
       <td class=\"trades-table__ticker\">GAZP</td>\
     </tr>\
     </table></div></body></html>"
        .to_string()
}

fn dividends_page() -> String {
    "<html><body><table id=\"table-dividend\"><tbody>\
     <tr class=\"filter-row\"><td><input></td></tr>\
     <tr>\
       <td><a href=\"/dividend/LKOH\">ЛУКОЙЛ</a></td>\
       <td><a href=\"/dividend/LKOH\">ЛУКОЙЛ</a></td>\
       <td>Нефтегаз</td><td>2023 год</td><td>500,50</td><td>RUB</td>\
       <td>10,5%</td><td>ignore</td><td>20.12.2025</td><td>1 000 000</td><td>0,85</td>\
     </tr>\
     <tr><td>spacer</td></tr>\
     </tbody></table></body></html>"
        .to_string()
}

fn stub_fetcher() -> Arc<StubFetcher> {
    let mut pages = HashMap::new();
    pages.insert(sources::RBC_BASE_URL.to_string(), front_page());
    pages.insert(ARTICLE_URL.to_string(), article_page());
    pages.insert(sources::SMARTLAB_SHARES_URL.to_string(), quotes_page());
    pages.insert(sources::DOHOD_DIVIDEND_URL.to_string(), dividends_page());
    Arc::new(StubFetcher { pages })
}

async fn service_with_db(fetcher: Arc<StubFetcher>) -> (TempDir, ScraperService, Arc<sqlx::SqlitePool>) {
    let dir = tempfile::tempdir().unwrap();
    let database_url = format!("sqlite:{}", dir.path().join("pipeline.db").display());
    let db = DatabaseConnection::new(&database_url).await.unwrap();
    db.migrate().await.unwrap();
    let pool = Arc::new(db.pool().clone());

    let mut config = AppConfig::default();
    config.database_url = database_url;
    config.news.article_delay_ms = 0;

    let service = ScraperService::new(db.pool().clone(), fetcher, config);
    (dir, service, pool)
}

#[tokio::test]
async fn full_cycle_persists_all_three_sources() {
    let (_dir, service, pool) = service_with_db(stub_fetcher()).await;

    let summaries = service.run_all().await;
    assert_eq!(summaries.len(), 3);
    assert!(summaries.iter().all(|s| s.status == ScrapeStatus::Success));

    assert_eq!(NewsRepository::new(pool.clone()).count().await.unwrap(), 1);
    // Full row plus the sparse sentinel-filled row both persist.
    assert_eq!(QuoteRepository::new(pool.clone()).count().await.unwrap(), 2);
    assert_eq!(DividendRepository::new(pool).count().await.unwrap(), 1);
}

#[tokio::test]
async fn news_rerun_does_not_duplicate_articles() {
    let (_dir, service, pool) = service_with_db(stub_fetcher()).await;

    let first = service.run_news().await.unwrap();
    let second = service.run_news().await.unwrap();

    assert_eq!(first.persisted, 1);
    assert_eq!(second.parsed, 1);
    assert_eq!(second.persisted, 0);
    assert_eq!(NewsRepository::new(pool).count().await.unwrap(), 1);
}

#[tokio::test]
async fn unreachable_sources_fail_without_stopping_the_cycle() {
    let empty = Arc::new(StubFetcher {
        pages: HashMap::new(),
    });
    let (_dir, service, pool) = service_with_db(empty).await;

    let summaries = service.run_all().await;
    assert_eq!(summaries.len(), 3);
    assert!(summaries.iter().all(|s| s.status == ScrapeStatus::Failed));
    assert_eq!(NewsRepository::new(pool.clone()).count().await.unwrap(), 0);

    // Every failed run still leaves an audit row.
    let row = sqlx::query("SELECT COUNT(*) AS n FROM scrape_logs")
        .fetch_one(&*pool)
        .await
        .unwrap();
    assert_eq!(row.get::<i64, _>("n"), 3);
}

#[tokio::test]
async fn dividend_spacer_rows_are_counted_as_skipped() {
    let (_dir, service, _pool) = service_with_db(stub_fetcher()).await;
    let summary = service.run_dividends().await.unwrap();
    assert_eq!(summary.parsed, 1);
    assert_eq!(summary.skipped, 1);
}
