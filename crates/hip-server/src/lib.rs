//! HIP bridge server: wires the OpenMRS adapters, the SQLite store, and the
//! gateway client into the engines, and serves the gateway-facing API.

pub mod error;
pub mod gateway;
pub mod worker;

pub use error::{Error, Result};

use std::path::PathBuf;

use axum::Router;
use hip_api::JobQueue;
use hip_core::{discovery::PatientDiscovery, gateway::Gateway, linking::LinkPatient};
use hip_openmrs::{
  OpenMrsCareContexts, OpenMrsClient, OpenMrsConfig, OpenMrsDirectory, OpenMrsPatientMatching,
};
use hip_store_sqlite::SqliteStore;
use serde::Deserialize;
use tower_http::trace::TraceLayer;

use gateway::GatewayConfig;
use worker::Worker;

// ─── Configuration ───────────────────────────────────────────────────────────

fn default_queue_capacity() -> usize { 64 }

fn default_link_expiry_minutes() -> i64 { 15 }

/// Runtime server configuration, deserialised from `config.toml` and `HIP_*`
/// environment variables.
#[derive(Deserialize, Clone)]
pub struct ServerConfig {
  pub host:                String,
  pub port:                u16,
  pub store_path:          PathBuf,
  /// Accepted requests that may wait for the worker before new ones get 503.
  #[serde(default = "default_queue_capacity")]
  pub queue_capacity:      usize,
  #[serde(default = "default_link_expiry_minutes")]
  pub link_expiry_minutes: i64,
  pub openmrs:             OpenMrsConfig,
  pub gateway:             GatewayConfig,
}

// ─── Wiring ──────────────────────────────────────────────────────────────────

/// Build the worker over `store`, the registry behind `openmrs`, and `gateway`.
pub fn build_worker<G: Gateway + 'static>(
  config: &ServerConfig,
  store: SqliteStore,
  openmrs: OpenMrsClient,
  gateway: G,
) -> Worker<G> {
  let directory = OpenMrsDirectory::new(openmrs.clone());
  let discovery = PatientDiscovery::new(
    OpenMrsPatientMatching::new(openmrs.clone()),
    OpenMrsCareContexts::new(openmrs),
    store.clone(),
    store.clone(),
    directory.clone(),
  );
  let linking = LinkPatient::new(store.clone(), store, directory)
    .with_expiry(chrono::Duration::minutes(config.link_expiry_minutes));

  Worker::new(discovery, linking, gateway, config.gateway.cm_id.clone())
}

/// The gateway-facing router with request tracing.
pub fn router(queue: JobQueue) -> Router {
  hip_api::api_router(queue).layer(TraceLayer::new_for_http())
}

// ─── Integration tests ───────────────────────────────────────────────────────
