//! File-based logging for playsync
//!
//! Logs go to a daily rotating file so stdout stays free for the demo's
//! status lines.

use std::path::Path;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

const LOG_FILE_PREFIX: &str = "playsync";
const DEFAULT_FILTER: &str = "playsync=debug,warn";

/// Initialize the logging system.
///
/// Logs are written to `<log_dir>/playsync.YYYY-MM-DD.log`. `RUST_LOG`
/// overrides the default filter (`playsync` at DEBUG, everything else WARN).
pub fn init_logging(log_dir: &Path) -> anyhow::Result<()> {
    if !log_dir.exists() {
        std::fs::create_dir_all(log_dir)?;
    }

    let file_appender = RollingFileAppender::new(Rotation::DAILY, log_dir, LOG_FILE_PREFIX);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    // Flushes on drop; must live as long as the process
    Box::leak(Box::new(guard));

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let fmt_layer = fmt::layer()
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_span_events(FmtSpan::CLOSE);

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init()?;

    tracing::info!("Logging initialized - logs written to {}/", log_dir.display());

    Ok(())
}

/// Log the outcome of an engine command
#[macro_export]
macro_rules! log_engine_result {
    ($command:expr, $result:expr) => {
        match &$result {
            Ok(_) => tracing::trace!(command = $command, "Engine command succeeded"),
            Err(e) => tracing::warn!(command = $command, error = %e, "Engine command failed"),
        }
    };
}
