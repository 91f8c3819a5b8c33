//! Infrastructure layer: HTTP fetching, persistence, configuration
//! and logging.

pub mod config;
pub mod logging;
pub mod http_client;
pub mod database_connection;
pub mod repositories;

// Re-export commonly used items
pub use config::AppConfig;
pub use database_connection::DatabaseConnection;
pub use http_client::{HttpClient, HttpClientConfig, PageFetcher};
pub use logging::init_logging;
pub use repositories::{
    DividendRepository, NewsRepository, QuoteRepository, ScrapeLogRepository, SourceRepository,
};
