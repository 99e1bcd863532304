//! Logging initialization.
//!
//! Logs go to one file per run under the configured directory so that
//! stdout stays reserved for payload output.
//!
//! The level is controlled by `RUST_LOG`; when unset, the configured filter
//! applies (default `info`):
//! - `RUST_LOG=debug` - include capability check stages
//! - `RUST_LOG=warn` - capability gaps and failures only

use std::fs;

use chrono::Local;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::LogConfig;

/// Initialize the logging system.
///
/// Each run creates a new file, e.g. `rusty-payload.2026-10-18-14-30-25.log`.
/// The returned guard flushes the writer when dropped and must be kept
/// alive for the program's lifetime. Returns `None` when the log file could
/// not be created; the program keeps running without logs.
pub fn init_logging(config: &LogConfig) -> Option<WorkerGuard> {
    if let Err(e) = fs::create_dir_all(&config.dir) {
        eprintln!("Warning: Failed to create logs directory {}: {}", config.dir.display(), e);
        return None;
    }

    let timestamp = Local::now().format("%Y-%m-%d-%H-%M-%S");
    let log_path = config.dir.join(format!("rusty-payload.{}.log", timestamp));

    let log_file = match fs::File::create(&log_path) {
        Ok(file) => file,
        Err(e) => {
            eprintln!("Warning: Failed to create log file {}: {}", log_path.display(), e);
            return None;
        }
    };

    let (non_blocking, guard) = tracing_appender::non_blocking(log_file);

    let file_layer = fmt::layer()
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(true)
        .with_line_number(true);

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.filter));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .init();

    tracing::info!("Logging initialized - writing to {}", log_path.display());
    Some(guard)
}
