mod app;
mod cache;
mod commands;
mod config;
mod export;
mod filter;
mod logging;
mod model;
mod printout;
mod remote;
mod sync;
mod views;

use clap::Parser;
use color_eyre::Result;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::warn;

use crate::cache::SqliteCache;
use crate::config::Config;
use crate::remote::{RemoteStore, SupabaseClient};
use crate::sync::Synchronizer;

#[derive(Parser, Debug)]
#[command(name = "vouchers")]
#[command(about = "Work orders for guide services, offline first")]
#[command(version)]
struct Args {
  /// Path to config file (default: $XDG_CONFIG_HOME/vouchers/config.yaml)
  #[arg(short, long, global = true)]
  config: Option<PathBuf>,

  /// Work from the local cache only
  #[arg(long, global = true)]
  offline: bool,

  /// Increase log output (-v debug, -vv trace)
  #[arg(short, long, action = clap::ArgAction::Count, global = true)]
  verbose: u8,

  #[command(subcommand)]
  command: Option<commands::Command>,
}

#[tokio::main]
async fn main() -> Result<()> {
  color_eyre::install()?;

  let args = Args::parse();

  // Load configuration
  let config = Config::load(args.config.as_deref())?;
  let _log_guard = logging::init(&config.log, args.verbose)?;

  let remote = if args.offline {
    None
  } else {
    connect_remote(&config)
  };

  let cache = match &config.cache.path {
    Some(path) => SqliteCache::open_at(path)?,
    None => SqliteCache::open()?,
  };

  let sync = Synchronizer::new(remote, Arc::new(cache));
  let mut app = app::App::start(sync).await;

  commands::run(&mut app, args.command.unwrap_or(commands::Command::Resume)).await
}

/// Remote store from config and environment, if both are present
fn connect_remote(config: &Config) -> Option<Arc<dyn RemoteStore>> {
  let (remote, key) = config.remote_credentials(Config::get_remote_key())?;
  match SupabaseClient::new(&remote, key) {
    Ok(client) => Some(Arc::new(client)),
    Err(e) => {
      warn!("Remote store disabled: {}", e);
      None
    }
  }
}
