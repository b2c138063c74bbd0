mod app;
mod cache;
mod commands;
mod config;
mod content;
mod event;
mod net;
mod query;
mod ui;

use crate::cache::{CacheStore, EntryManager, Fetcher, NoopStore, SqliteStore};
use crate::content::{ContentService, ContentSlots};
use crate::net::{spawn_prober, ConnectivityOracle, HttpSource, ProbeConfig};
use clap::Parser;
use color_eyre::Result;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::warn;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "liseuse")]
#[command(about = "An offline-first terminal reader for the ElectroInfo content platform")]
#[command(version)]
struct Args {
  /// Path to config file (default: $XDG_CONFIG_HOME/liseuse/config.yaml)
  #[arg(short, long)]
  config: Option<PathBuf>,

  /// Start offline; serve cached content only
  #[arg(long)]
  offline: bool,

  /// Directory for the local cache (default: platform data dir)
  #[arg(long)]
  cache_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
  color_eyre::install()?;

  let args = Args::parse();

  // Logs go to a file; stderr belongs to the alternate screen
  let _guard = init_tracing()?;

  // Load configuration
  let config = config::Config::load(args.config.as_deref())?;

  let store = open_store(args.cache_dir.as_deref());
  let entries = EntryManager::new(store, config.cache.namespace.clone());

  let oracle = Arc::new(ConnectivityOracle::new(!args.offline));
  let source = HttpSource::new(
    &config.backend.url,
    config::Config::api_token(),
    config.network.remote_timeout(),
  )?;

  if !args.offline {
    spawn_prober(
      oracle.clone(),
      source.clone(),
      ProbeConfig {
        interval: config.network.probe_interval(),
        timeout: config.network.probe_timeout(),
      },
    );
  }

  let fetcher =
    Fetcher::new(entries, oracle.handle()).with_remote_timeout(config.network.remote_timeout());
  let service = ContentService::new(Arc::new(source), fetcher, ContentSlots::from(&config.cache));

  // Initialize and run the app
  let mut app = app::App::new(service, oracle);
  app.run().await?;

  Ok(())
}

/// Open the persistent cache, falling back to a no-op store so the
/// reader still runs when the disk is unavailable.
fn open_store(dir: Option<&Path>) -> Arc<dyn CacheStore> {
  let opened = match dir {
    Some(dir) => SqliteStore::open_at(&dir.join("cache.db")),
    None => SqliteStore::open(),
  };

  match opened {
    Ok(store) => Arc::new(store),
    Err(e) => {
      warn!(error = %e, "cache store unavailable, running without persistence");
      Arc::new(NoopStore)
    }
  }
}

fn init_tracing() -> Result<WorkerGuard> {
  let dir = dirs::data_dir()
    .unwrap_or_else(|| PathBuf::from("."))
    .join("liseuse");
  std::fs::create_dir_all(&dir)?;

  let appender = tracing_appender::rolling::daily(dir, "liseuse.log");
  let (writer, guard) = tracing_appender::non_blocking(appender);

  let filter =
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("liseuse=info"));

  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(writer)
    .with_ansi(false)
    .init();

  Ok(guard)
}
