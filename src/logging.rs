//! Tracing subscriber setup for the command-line wrapper.

use color_eyre::{eyre::eyre, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use crate::config::LoggingConfig;

/// Install the global subscriber. Keep the returned guard alive until exit so
/// buffered lines are flushed.
///
/// RUST_LOG takes precedence over the configured filter; without either, `info`.
pub fn init(config: &LoggingConfig) -> Result<WorkerGuard> {
  let filter = EnvFilter::try_from_default_env()
    .or_else(|_| EnvFilter::try_new(config.filter.as_deref().unwrap_or("info")))
    .map_err(|e| eyre!("Invalid log filter: {}", e))?;

  let (writer, guard) = match &config.file {
    Some(path) => {
      let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| std::path::Path::new("."));
      let prefix = path
        .file_name()
        .ok_or_else(|| eyre!("Log file path has no file name: {}", path.display()))?;
      std::fs::create_dir_all(dir)
        .map_err(|e| eyre!("Failed to create log directory {}: {}", dir.display(), e))?;
      tracing_appender::non_blocking(tracing_appender::rolling::daily(dir, prefix))
    }
    None => tracing_appender::non_blocking(std::io::stderr()),
  };

  let ansi = config.file.is_none();
  tracing_subscriber::registry()
    .with(filter)
    .with(
      tracing_subscriber::fmt::layer()
        .with_writer(writer)
        .with_ansi(ansi)
        .with_target(true),
    )
    .try_init()
    .map_err(|e| eyre!("tracing already initialized: {}", e))?;

  Ok(guard)
}
