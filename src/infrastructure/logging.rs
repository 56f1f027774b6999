use super::config::Config;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Installs the global subscriber, writing to the configured log file.
///
/// The terminal belongs to the UI, so nothing is written to stdout/stderr.
/// The returned guard must stay alive for buffered lines to be flushed.
pub fn init_logging(cfg: &Config) -> anyhow::Result<WorkerGuard> {
    let log_path = cfg.log_path();
    let dir = log_path
        .parent()
        .map(|p| p.to_path_buf())
        .unwrap_or_else(|| cfg.data_dir.clone());
    std::fs::create_dir_all(&dir)?;

    let file_name = log_path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| "fitlog.log".into());
    let appender = tracing_appender::rolling::never(dir, file_name);
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let filter = EnvFilter::try_new(&cfg.logging.level).unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .with_ansi(false),
        )
        .try_init()
        .map_err(|e| anyhow::anyhow!("logging init failed: {e}"))?;

    Ok(guard)
}
