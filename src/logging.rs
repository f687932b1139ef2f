use color_eyre::{eyre::eyre, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

use crate::config::LogConfig;

/// Set up the global subscriber.
///
/// Filter precedence: `RUST_LOG`, then `-v` flags, then the configured level.
/// Logs go to stderr unless a log directory is configured, in which case
/// they go to a daily rolling file. Keep the returned guard alive until exit
/// so buffered file output is flushed.
pub fn init(config: &LogConfig, verbose: u8) -> Result<Option<WorkerGuard>> {
  let level = match verbose {
    0 => config.level.as_str(),
    1 => "debug",
    _ => "trace",
  };
  let filter = EnvFilter::try_from_default_env()
    .or_else(|_| EnvFilter::try_new(format!("vouchers={}", level)))
    .map_err(|e| eyre!("Invalid log level '{}': {}", level, e))?;

  let builder = tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_target(false);

  match &config.directory {
    Some(dir) => {
      std::fs::create_dir_all(dir)
        .map_err(|e| eyre!("Failed to create log directory {}: {}", dir.display(), e))?;
      let appender = tracing_appender::rolling::daily(dir, "vouchers.log");
      let (writer, guard) = tracing_appender::non_blocking(appender);
      builder.with_writer(writer).with_ansi(false).init();
      Ok(Some(guard))
    }
    None => {
      builder.with_writer(std::io::stderr).init();
      Ok(None)
    }
  }
}
