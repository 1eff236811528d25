//! Console and rolling file log setup

use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::filter::EnvFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{Layer, Registry};

use crate::common::errors::{Result, TraderError};
use crate::config::AppSettings;

/// File name prefix for the daily log, e.g. `kraken_trader.log.2026-10-17`
pub const LOG_FILE_PREFIX: &str = "kraken_trader.log";

/// Daily rolling appender under `dir`, creating the directory if needed
pub fn file_appender(dir: &Path) -> Result<RollingFileAppender> {
    std::fs::create_dir_all(dir).map_err(|e| {
        TraderError::Configuration(format!(
            "cannot create log directory {}: {}",
            dir.display(),
            e
        ))
    })?;
    Ok(RollingFileAppender::new(Rotation::DAILY, dir, LOG_FILE_PREFIX))
}

/// Install the global subscriber
///
/// `RUST_LOG`, when set, wins over `level`. When `settings.log_dir` is set
/// every event is also written to a daily file; the returned guard must be
/// held until exit so buffered lines are flushed.
pub fn init_logging(level: &str, json: bool, settings: &AppSettings) -> Result<Option<WorkerGuard>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let console: Box<dyn Layer<Registry> + Send + Sync> = if json {
        fmt::layer()
            .json()
            .with_target(true)
            .with_thread_ids(true)
            .with_file(true)
            .with_line_number(true)
            .boxed()
    } else {
        fmt::layer()
            .with_target(true)
            .with_thread_ids(true)
            .with_file(true)
            .with_line_number(true)
            .boxed()
    };

    let (file, guard) = match &settings.log_dir {
        Some(dir) => {
            let (writer, guard) = tracing_appender::non_blocking(file_appender(dir)?);
            let layer = fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_target(true)
                .with_thread_ids(true);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(console)
        .with(file)
        .with(filter)
        .try_init()
        .map_err(|e| TraderError::Configuration(format!("cannot install logger: {}", e)))?;

    Ok(guard)
}
