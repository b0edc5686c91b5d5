//! hip-server binary.
//!
//! Reads `config.toml` (or the path specified with `--config`) layered with
//! `HIP_*` environment variables, opens the SQLite store, starts the
//! background worker, and serves the gateway-facing API over HTTP.
//!
//! Nested keys use a double underscore, e.g. `HIP_OPENMRS__URL`.

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use anyhow::Context as _;
use clap::Parser;
use hip_api::JobQueue;
use hip_openmrs::OpenMrsClient;
use hip_server::{ServerConfig, build_worker, gateway::HttpGateway};
use hip_store_sqlite::SqliteStore;
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Health information provider bridge for OpenMRS")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  // Initialise tracing.
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  // Load configuration.
  let settings = config::Config::builder()
    .add_source(config::File::from(cli.config).required(false))
    .add_source(
      config::Environment::with_prefix("HIP")
        .prefix_separator("_")
        .separator("__"),
    )
    .build()
    .context("failed to read config file")?;

  let server_cfg: ServerConfig = settings
    .try_deserialize()
    .context("failed to deserialise ServerConfig")?;

  // Expand `~` in store path.
  let store_path = expand_tilde(&server_cfg.store_path);

  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;
  let openmrs = OpenMrsClient::new(server_cfg.openmrs.clone())
    .context("failed to build OpenMRS client")?;
  let gateway = HttpGateway::new(&server_cfg.gateway)
    .context("failed to build gateway client")?;

  let worker = Arc::new(build_worker(&server_cfg, store, openmrs, gateway));
  let (queue, jobs) = JobQueue::bounded(server_cfg.queue_capacity);
  tokio::spawn(worker.run(jobs));

  let app = hip_server::router(queue);
  let address = format!("{}:{}", server_cfg.host, server_cfg.port);

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
