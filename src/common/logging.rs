use anyhow::{Context, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use super::config::LoggingConfig;

/// File name prefix for the daily-rolling log
pub const LOG_FILE_PREFIX: &str = "housekeeper.log";

/// Install the global tracing subscriber.
///
/// Console logs go to stderr so they never mix with plan output on stdout.
/// The returned guard flushes the file writer on drop and must be held by `main`.
pub fn init(config: &LoggingConfig, verbose: bool) -> Result<Option<WorkerGuard>> {
    let debug = verbose || config.debug;
    let default_directive = if debug {
        "housekeeper=debug"
    } else {
        "housekeeper=info"
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive));

    let console_enabled = debug || (config.log_to_file && config.also_print_to_console);
    let console_layer = console_enabled.then(|| {
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false)
    });

    let (file_layer, guard) = if config.log_to_file {
        std::fs::create_dir_all(&config.log_dir).with_context(|| {
            format!("Failed to create log directory: {}", config.log_dir.display())
        })?;
        let appender = tracing_appender::rolling::daily(&config.log_dir, LOG_FILE_PREFIX);
        let (writer, guard) = tracing_appender::non_blocking(appender);
        let layer = fmt::layer().with_writer(writer).with_ansi(false);
        (Some(layer), Some(guard))
    } else {
        (None, None)
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .context("Failed to install log subscriber")?;

    Ok(guard)
}
