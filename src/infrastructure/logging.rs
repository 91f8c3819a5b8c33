//! Logging system configuration and initialization.
//!
//! Console logging through `tracing-subscriber` with an `EnvFilter`
//! (`RUST_LOG` wins over the configured default level), plus an optional
//! daily-rotated file writer when a log directory is configured.

use anyhow::Result;
use once_cell::sync::OnceCell;
use tracing_appender::{non_blocking, non_blocking::WorkerGuard, rolling};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::infrastructure::config::LoggingConfig;

// Keeps the non-blocking file writer alive for the process lifetime.
static LOG_GUARD: OnceCell<WorkerGuard> = OnceCell::new();

/// Initialize logging with the default configuration.
pub fn init_logging() -> Result<()> {
    init_logging_with_config(&LoggingConfig::default())
}

pub fn init_logging_with_config(config: &LoggingConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.level.clone()));

    let registry = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false));

    match &config.log_dir {
        Some(dir) => {
            let appender = rolling::daily(dir, "finmonitor.log");
            let (writer, guard) = non_blocking(appender);
            let _ = LOG_GUARD.set(guard);
            registry
                .with(fmt::layer().with_writer(writer).with_ansi(false))
                .try_init()?;
        }
        None => registry.try_init()?,
    }
    Ok(())
}
