//! The link engine: turns a discovered patient into a confirmed consent link.
//!
//! Initialisation checks that the transaction really discovered this patient
//! and that every requested care context belongs to them, then parks a
//! pending [`LinkRequest`]. Confirmation promotes the pending request to a
//! [`LinkedAccount`].

use chrono::{Duration, Utc};
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
  Error, ErrorCode, Outcome, Result,
  link::{LinkConfirmation, LinkEnquiry, LinkReference, LinkRequest, LinkedAccount, LinkedPatient},
  source::PatientDirectory,
  store::{DiscoveryRequestStore, LinkStore},
};

/// How long a link request waits for confirmation unless configured.
pub const DEFAULT_LINK_EXPIRY_MINUTES: i64 = 15;

pub struct LinkPatient<D, L, P> {
  requests: D,
  links:    L,
  patients: P,
  expiry:   Duration,
}

impl<D, L, P> LinkPatient<D, L, P>
where
  D: DiscoveryRequestStore,
  L: LinkStore,
  P: PatientDirectory,
{
  pub fn new(requests: D, links: L, patients: P) -> Self {
    Self { requests, links, patients, expiry: Duration::minutes(DEFAULT_LINK_EXPIRY_MINUTES) }
  }

  pub fn with_expiry(mut self, expiry: Duration) -> Self {
    self.expiry = expiry;
    self
  }

  pub async fn link_init(&self, enquiry: &LinkEnquiry) -> Result<Outcome<LinkReference>> {
    let discovered = self
      .requests
      .exists_for(
        &enquiry.transaction_id,
        &enquiry.patient_id,
        &enquiry.patient_reference_number,
      )
      .await
      .map_err(Error::store)?;
    if !discovered {
      warn!(transaction_id = %enquiry.transaction_id, "no discovery request for link");
      return Ok(Outcome::Failed(ErrorCode::DiscoveryRequestNotFound));
    }

    let patient = match self.patients.patient_with(&enquiry.patient_reference_number).await {
      Ok(Some(patient)) => patient,
      Ok(None) => return Ok(Outcome::Failed(ErrorCode::NoPatientFound)),
      Err(e) => return Ok(Outcome::Failed(e.error_code())),
    };

    let unknown = enquiry.care_contexts.iter().find(|requested| {
      !patient
        .care_contexts
        .iter()
        .any(|cc| cc.reference_number.as_deref() == Some(requested.as_str()))
    });
    if let Some(unknown) = unknown {
      warn!(transaction_id = %enquiry.transaction_id, care_context = %unknown, "care context not found");
      return Ok(Outcome::Failed(ErrorCode::CareContextNotFound));
    }

    let now = Utc::now();
    let request = LinkRequest {
      link_reference_number:    Uuid::new_v4().to_string(),
      transaction_id:           enquiry.transaction_id.clone(),
      patient_id:               enquiry.patient_id.clone(),
      patient_reference_number: enquiry.patient_reference_number.clone(),
      care_contexts:            enquiry.care_contexts.clone(),
      expires_at:               now + self.expiry,
      created_at:               now,
    };
    let reference = LinkReference {
      reference_number: request.link_reference_number.clone(),
      expires_at:       request.expires_at,
    };
    self.links.save_link_request(request).await.map_err(Error::store)?;

    info!(
      transaction_id = %enquiry.transaction_id,
      link_reference = %reference.reference_number,
      "link request initialised",
    );
    Ok(Outcome::Found(reference))
  }

  pub async fn link_confirm(
    &self,
    confirmation: &LinkConfirmation,
  ) -> Result<Outcome<LinkedPatient>> {
    let reference = confirmation.link_reference_number.as_str();
    let Some(request) = self.links.link_request(reference).await.map_err(Error::store)? else {
      return Ok(Outcome::Failed(ErrorCode::LinkRequestNotFound));
    };
    if request.is_expired(Utc::now()) {
      warn!(link_reference = %reference, "link request expired");
      return Ok(Outcome::Failed(ErrorCode::LinkRequestExpired));
    }

    let patient = match self.patients.patient_with(&request.patient_reference_number).await {
      Ok(Some(patient)) => patient,
      Ok(None) => return Ok(Outcome::Failed(ErrorCode::NoPatientFound)),
      Err(e) => return Ok(Outcome::Failed(e.error_code())),
    };

    self
      .links
      .save_linked_account(LinkedAccount {
        patient_id:               request.patient_id.clone(),
        patient_reference_number: request.patient_reference_number.clone(),
        care_contexts:            request.care_contexts.iter().cloned().collect(),
      })
      .await
      .map_err(Error::store)?;

    info!(link_reference = %reference, patient = %patient.reference_number, "link confirmed");
    let care_contexts = patient
      .care_contexts
      .into_iter()
      .filter(|cc| {
        cc.reference_number
          .as_ref()
          .is_some_and(|r| request.care_contexts.contains(r))
      })
      .collect();
    Ok(Outcome::Found(LinkedPatient {
      patient_id: request.patient_id,
      reference_number: patient.reference_number,
      display: patient.name,
      care_contexts,
    }))
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{
    fakes::{FakeDirectory, FakeLinks, FakeRequests},
    patient::{CareContext, Patient},
    store::DiscoveryRecord,
  };

  fn engine() -> LinkPatient<FakeRequests, FakeLinks, FakeDirectory> {
    let mut directory = FakeDirectory::default();
    directory.patients.insert(
      "RVH1111".into(),
      Patient::new("RVH1111", "Krunal Patel").with_care_contexts(vec![
        CareContext::new("NCP1111", "National Cancer program"),
        CareContext::new("NCP2222", "National Cancer program - Episode 2"),
      ]),
    );
    let requests = FakeRequests::default();
    requests.record(DiscoveryRecord {
      transaction_id:           "t1".into(),
      patient_id:               "krunal@ncg".into(),
      patient_reference_number: Some("RVH1111".into()),
    });
    LinkPatient::new(requests, FakeLinks::default(), directory)
  }

  fn enquiry(care_contexts: &[&str]) -> LinkEnquiry {
    LinkEnquiry {
      transaction_id:           "t1".into(),
      request_id:               "r1".into(),
      patient_id:               "krunal@ncg".into(),
      patient_reference_number: "RVH1111".into(),
      care_contexts:            care_contexts.iter().map(|s| s.to_string()).collect(),
    }
  }

  fn confirmation(reference: &str) -> LinkConfirmation {
    LinkConfirmation {
      request_id:            "r2".into(),
      link_reference_number: reference.into(),
      token:                 "123456".into(),
    }
  }

  #[tokio::test]
  async fn init_without_discovery_is_discovery_request_not_found() {
    let engine = engine();
    let mut enquiry = enquiry(&["NCP1111"]);
    enquiry.patient_reference_number = "5678".into();

    let outcome = engine.link_init(&enquiry).await.unwrap();
    assert_eq!(outcome, Outcome::Failed(ErrorCode::DiscoveryRequestNotFound));
  }

  #[tokio::test]
  async fn init_after_failed_discovery_is_discovery_request_not_found() {
    let engine = engine();
    engine.requests.record(DiscoveryRecord {
      transaction_id:           "t2".into(),
      patient_id:               "krunal@ncg".into(),
      patient_reference_number: None,
    });
    let mut enquiry = enquiry(&["NCP1111"]);
    enquiry.transaction_id = "t2".into();

    let outcome = engine.link_init(&enquiry).await.unwrap();
    assert_eq!(outcome, Outcome::Failed(ErrorCode::DiscoveryRequestNotFound));
  }

  #[tokio::test]
  async fn init_with_foreign_care_context_is_care_context_not_found() {
    let engine = engine();
    let outcome = engine.link_init(&enquiry(&["NCP1111", "NCP9999"])).await.unwrap();
    assert_eq!(outcome, Outcome::Failed(ErrorCode::CareContextNotFound));
    assert!(engine.links.requests.lock().unwrap().is_empty());
  }

  #[tokio::test]
  async fn init_then_confirm_links_requested_contexts() {
    let engine = engine();
    let Outcome::Found(reference) = engine.link_init(&enquiry(&["NCP2222"])).await.unwrap() else {
      panic!("link init failed");
    };

    let outcome = engine.link_confirm(&confirmation(&reference.reference_number)).await.unwrap();
    let Outcome::Found(linked) = outcome else { panic!("expected Found, got {outcome:?}") };
    assert_eq!(linked.patient_id, "krunal@ncg");
    assert_eq!(
      linked.care_contexts,
      vec![CareContext::new("NCP2222", "National Cancer program - Episode 2")]
    );

    let saved = engine.links.saved.lock().unwrap();
    assert_eq!(saved.len(), 1);
    assert_eq!(saved[0].care_contexts, ["NCP2222".to_owned()].into());
  }

  #[tokio::test]
  async fn confirm_unknown_reference_is_link_request_not_found() {
    let engine = engine();
    let outcome = engine.link_confirm(&confirmation("nope")).await.unwrap();
    assert_eq!(outcome, Outcome::Failed(ErrorCode::LinkRequestNotFound));
  }

  #[tokio::test]
  async fn confirm_after_expiry_is_rejected() {
    let engine = engine().with_expiry(Duration::seconds(-1));
    let Outcome::Found(reference) = engine.link_init(&enquiry(&["NCP1111"])).await.unwrap() else {
      panic!("link init failed");
    };

    let outcome = engine.link_confirm(&confirmation(&reference.reference_number)).await.unwrap();
    assert_eq!(outcome, Outcome::Failed(ErrorCode::LinkRequestExpired));
    assert!(engine.links.saved.lock().unwrap().is_empty());
  }
}
