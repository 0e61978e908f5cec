mod commands;

use clap::Parser;
use color_eyre::Result;
use oh::{cache, config};
use std::path::PathBuf;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "oh")]
#[command(about = "Manage your virtual servers from the command line")]
#[command(version)]
struct Args {
  /// Path to config file (default: $XDG_CONFIG_HOME/oh/config.yaml)
  #[arg(short, long, global = true)]
  config: Option<PathBuf>,

  /// Always fetch fresh data instead of using the cache
  #[arg(long, global = true)]
  no_cache: bool,

  #[command(subcommand)]
  command: commands::Command,
}

#[tokio::main]
async fn main() -> Result<()> {
  color_eyre::install()?;

  let args = Args::parse();
  let _guard = init_logging();

  // Load configuration
  let mut config = config::Config::load(args.config.as_deref())?;

  // Override cache switch if specified on command line
  if args.no_cache {
    config.no_cache = true;
  }

  commands::run(args.command, config).await
}

/// Log to `<cache dir>/oh/oh.log` so stdout stays clean for JSON output.
///
/// Filter with `OH_LOG` (e.g. `OH_LOG=debug`). Logging is skipped when the
/// cache directory is unavailable.
fn init_logging() -> Option<WorkerGuard> {
  let dir = cache::FileStorage::default_dir().ok()?;
  std::fs::create_dir_all(&dir).ok()?;

  let appender = tracing_appender::rolling::never(&dir, "oh.log");
  let (writer, guard) = tracing_appender::non_blocking(appender);
  let filter = EnvFilter::try_from_env("OH_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));

  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(writer)
    .with_ansi(false)
    .init();

  Some(guard)
}
