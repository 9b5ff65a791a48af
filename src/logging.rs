use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;

const LOG_FILE_PREFIX: &str = "learnpath.log";

/// Keeps the non-blocking file writer flushing; hold it until shutdown.
pub struct LogGuard {
    _file_writer: Option<WorkerGuard>,
}

/// Installs the global subscriber: stdout always, plus a daily-rolling file
/// when the config names a log directory. A directory that cannot be
/// created downgrades to stdout-only rather than failing startup.
pub fn init_tracing(config: &Config) -> LogGuard {
    let filter =
        EnvFilter::try_new(&config.log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    let stdout = fmt::layer().with_target(true);
    let registry = tracing_subscriber::registry().with(filter).with(stdout);

    let Some(log_dir) = config.log_dir.as_deref().filter(|dir| ensure_dir(dir)) else {
        registry.init();
        return LogGuard { _file_writer: None };
    };

    let appender = RollingFileAppender::new(Rotation::DAILY, log_dir, LOG_FILE_PREFIX);
    let (writer, guard) = tracing_appender::non_blocking(appender);
    registry
        .with(fmt::layer().with_writer(writer).with_ansi(false).with_target(true))
        .init();

    LogGuard {
        _file_writer: Some(guard),
    }
}

fn ensure_dir(dir: &Path) -> bool {
    match std::fs::create_dir_all(dir) {
        Ok(()) => true,
        Err(err) => {
            eprintln!("failed to create log directory {}: {err}", dir.display());
            false
        }
    }
}
