//! The background worker: runs queued jobs through the engines and posts
//! each result to the gateway's callback path.

use std::sync::Arc;

use hip_api::Job;
use hip_core::{
  Outcome,
  discovery::PatientDiscovery,
  gateway::{self, Gateway, paths},
  link::{LinkConfirmation, LinkEnquiry},
  linking::LinkPatient,
  outcome::ResponseStatus,
  patient::{DiscoveryRequest, consumer_suffix},
};
use hip_openmrs::{OpenMrsCareContexts, OpenMrsDirectory, OpenMrsPatientMatching};
use hip_store_sqlite::SqliteStore;
use serde::Serialize;
use tokio::sync::mpsc::Receiver;
use tracing::{error, info, warn};

pub type Discovery = PatientDiscovery<
  OpenMrsPatientMatching,
  OpenMrsCareContexts,
  SqliteStore,
  SqliteStore,
  OpenMrsDirectory,
>;

pub type Linking = LinkPatient<SqliteStore, SqliteStore, OpenMrsDirectory>;

pub struct Worker<G> {
  discovery:     Discovery,
  linking:       Linking,
  gateway:       G,
  /// Consumer manager answered when a failed confirmation names no patient.
  default_cm_id: String,
}

impl<G> Worker<G>
where
  G: Gateway + 'static,
{
  pub fn new(discovery: Discovery, linking: Linking, gateway: G, default_cm_id: String) -> Self {
    Self { discovery, linking, gateway, default_cm_id }
  }

  /// Drain `jobs` until every sender is dropped. Jobs run concurrently.
  pub async fn run(self: Arc<Self>, mut jobs: Receiver<Job>) {
    while let Some(job) = jobs.recv().await {
      let worker = Arc::clone(&self);
      tokio::spawn(async move { worker.handle(job).await });
    }
    info!("job queue closed; worker stopping");
  }

  pub async fn handle(&self, job: Job) {
    match job {
      Job::Discover(request) => self.discover(&request).await,
      Job::LinkInit(enquiry) => self.link_init(&enquiry).await,
      Job::LinkConfirm(confirmation) => self.link_confirm(&confirmation).await,
    }
  }

  async fn discover(&self, request: &DiscoveryRequest) {
    let result = self.discovery.patient_for(request).await;
    let assembled = gateway::discovery_response(request, result);
    log_status(&request.transaction_id, "discovery", assembled.status);
    self
      .deliver(paths::ON_DISCOVER, &assembled.envelope, request.patient.consumer_suffix())
      .await;
  }

  async fn link_init(&self, enquiry: &LinkEnquiry) {
    let result = self.linking.link_init(enquiry).await;
    let assembled =
      gateway::link_init_response(&enquiry.transaction_id, &enquiry.request_id, result);
    log_status(&enquiry.transaction_id, "link init", assembled.status);
    self
      .deliver(paths::ON_LINK_INIT, &assembled.envelope, consumer_suffix(&enquiry.patient_id))
      .await;
  }

  async fn link_confirm(&self, confirmation: &LinkConfirmation) {
    let result = self.linking.link_confirm(confirmation).await;
    let suffix = match &result {
      Ok(Outcome::Found(linked)) => consumer_suffix(&linked.patient_id).to_owned(),
      _ => self.default_cm_id.clone(),
    };
    let assembled = gateway::link_confirm_response(&confirmation.request_id, result);
    log_status(&confirmation.link_reference_number, "link confirm", assembled.status);
    self.deliver(paths::ON_LINK_CONFIRM, &assembled.envelope, &suffix).await;
  }

  async fn deliver<T: Serialize + Sync>(&self, path: &str, envelope: &T, consumer_suffix: &str) {
    if let Err(e) = self.gateway.send(path, envelope, consumer_suffix).await {
      error!(error = %e, path, "failed to deliver callback");
    }
  }
}

fn log_status(id: &str, flow: &str, status: ResponseStatus) {
  match status {
    ResponseStatus::Ok => info!(id, flow, "completed"),
    ResponseStatus::InternalServerError => error!(id, flow, ?status, "failed"),
    _ => warn!(id, flow, ?status, "rejected"),
  }
}
