//! Tracing setup for hosts embedding the engine.
//!
//! The filter comes from [`EngineConfig::log_level`]. Stdout logging is
//! always on; a daily-rolling file layer is added when `ENABLE_FILE_LOGS`
//! is set, writing `engine.log.*` under `LOG_DIR`.
//!
//! [`EngineConfig::log_level`]: crate::config::EngineConfig

use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::EngineConfig;

/// Keeps the non-blocking file writer flushing. Hold it for the process
/// lifetime when file logging is on.
pub struct LogGuard {
    file: Option<WorkerGuard>,
}

impl LogGuard {
    pub fn file_layer_active(&self) -> bool {
        self.file.is_some()
    }
}

/// Install the global subscriber. Call once from the host at startup;
/// later calls are no-ops so embedded test harnesses stay safe.
pub fn init_tracing(config: &EngineConfig) -> LogGuard {
    let filter =
        EnvFilter::try_new(&config.log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    let stdout_layer = fmt::layer().with_target(true);
    let registry = tracing_subscriber::registry().with(filter).with(stdout_layer);

    match file_writer() {
        Some((writer, guard)) => {
            let file_layer = fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_target(true);
            let _ = registry.with(file_layer).try_init();
            LogGuard { file: Some(guard) }
        }
        None => {
            let _ = registry.try_init();
            LogGuard { file: None }
        }
    }
}

fn file_writer() -> Option<(NonBlocking, WorkerGuard)> {
    let enabled = std::env::var("ENABLE_FILE_LOGS")
        .map(|v| v == "true" || v == "1")
        .unwrap_or(false);
    if !enabled {
        return None;
    }
    let log_dir = std::env::var("LOG_DIR").unwrap_or_else(|_| "./logs".to_string());
    if let Err(err) = std::fs::create_dir_all(&log_dir) {
        eprintln!("failed to create log directory {log_dir}: {err}");
        return None;
    }
    let appender = RollingFileAppender::new(Rotation::DAILY, &log_dir, "engine.log");
    Some(tracing_appender::non_blocking(appender))
}
