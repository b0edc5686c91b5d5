//! Gateway envelopes, the response assembler, and the outbound gateway trait.
//!
//! The gateway answers asynchronously: each inbound request is acknowledged
//! immediately and its result is later POSTed to a fixed callback path as
//! one of the envelopes below.

use std::future::Future;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  ErrorCode, Outcome, Result,
  discovery::DiscoveryOutcome,
  link::{LinkReference, LinkedPatient},
  outcome::ResponseStatus,
  patient::{CareContext, DiscoveryRequest, MatchField},
};

// ─── Callback paths ──────────────────────────────────────────────────────────

pub mod paths {
  pub const ON_DISCOVER: &str = "/v0.5/care-contexts/on-discover";
  pub const ON_LINK_INIT: &str = "/v0.5/links/link/on-init";
  pub const ON_LINK_CONFIRM: &str = "/v0.5/links/link/on-confirm";
}

// ─── Outbound trait ──────────────────────────────────────────────────────────

/// Delivers envelopes to the gateway.
pub trait Gateway: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// POST `envelope` to `path`, routed to the consumer manager identified by
  /// `consumer_suffix`.
  fn send<'a, T>(
    &'a self,
    path: &'a str,
    envelope: &'a T,
    consumer_suffix: &'a str,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a
  where
    T: Serialize + Sync;
}

// ─── Envelope parts ──────────────────────────────────────────────────────────

/// Echo of the inbound request id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Resp {
  pub request_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorRepresentation {
  pub code:    u16,
  pub message: String,
}

impl From<ErrorCode> for ErrorRepresentation {
  fn from(code: ErrorCode) -> Self {
    Self { code: code.code(), message: code.message().to_owned() }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatientEnquiryRepresentation {
  pub reference_number: String,
  pub display:          String,
  pub care_contexts:    Vec<CareContext>,
  pub matched_by:       Vec<MatchField>,
}

/// Body of the `on-discover` callback.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GatewayDiscoveryResponse {
  pub request_id:     Uuid,
  pub timestamp:      DateTime<Utc>,
  pub transaction_id: String,
  pub patient:        Option<PatientEnquiryRepresentation>,
  pub error:          Option<ErrorRepresentation>,
  pub resp:           Resp,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkMeta {
  pub communication_medium: String,
  pub communication_hint:   String,
  pub communication_expiry: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkReferenceRepresentation {
  pub reference_number:    String,
  pub authentication_type: String,
  pub meta:                LinkMeta,
}

/// Body of the `on-init` callback.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GatewayLinkResponse {
  pub request_id:     Uuid,
  pub timestamp:      DateTime<Utc>,
  pub transaction_id: String,
  pub link:           Option<LinkReferenceRepresentation>,
  pub error:          Option<ErrorRepresentation>,
  pub resp:           Resp,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkConfirmationRepresentation {
  pub reference_number: String,
  pub display:          String,
  pub care_contexts:    Vec<CareContext>,
}

/// Body of the `on-confirm` callback.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GatewayLinkConfirmResponse {
  pub request_id: Uuid,
  pub timestamp:  DateTime<Utc>,
  pub patient:    Option<LinkConfirmationRepresentation>,
  pub error:      Option<ErrorRepresentation>,
  pub resp:       Resp,
}

// ─── Assembler ───────────────────────────────────────────────────────────────

/// An envelope together with the status class it represents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assembled<T> {
  pub status:   ResponseStatus,
  pub envelope: T,
}

/// Split an engine result into the found value, or the status and error to
/// report. Infrastructure errors collapse into [`ErrorCode::ServerInternalError`].
fn classify<T>(result: Result<Outcome<T>>) -> (ResponseStatus, Option<T>, Option<ErrorRepresentation>) {
  let code = match result {
    Ok(Outcome::Found(value)) => return (ResponseStatus::Ok, Some(value), None),
    Ok(Outcome::Failed(code)) => code,
    Err(e) => {
      tracing::error!(error = %e, "engine failed");
      ErrorCode::ServerInternalError
    }
  };
  (code.status(), None, Some(code.into()))
}

/// Build the `on-discover` envelope for a discovery result.
pub fn discovery_response(
  request: &DiscoveryRequest,
  result: Result<DiscoveryOutcome>,
) -> Assembled<GatewayDiscoveryResponse> {
  let (status, patient, error) = classify(result);
  let patient = patient.map(|p| PatientEnquiryRepresentation {
    reference_number: p.reference_number,
    display:          p.name,
    care_contexts:    p.care_contexts,
    matched_by:       p.matched_fields.into_iter().collect(),
  });

  Assembled {
    status,
    envelope: GatewayDiscoveryResponse {
      request_id: Uuid::new_v4(),
      timestamp: Utc::now(),
      transaction_id: request.transaction_id.clone(),
      patient,
      error,
      resp: Resp { request_id: request.request_id.clone() },
    },
  }
}

/// Build the `on-init` envelope for a link initialisation result.
pub fn link_init_response(
  transaction_id: &str,
  request_id: &str,
  result: Result<Outcome<LinkReference>>,
) -> Assembled<GatewayLinkResponse> {
  let (status, link, error) = classify(result);
  let link = link.map(|reference| LinkReferenceRepresentation {
    reference_number:    reference.reference_number,
    authentication_type: "MEDIATE".to_owned(),
    meta:                LinkMeta {
      communication_medium: "MOBILE".to_owned(),
      communication_hint:   "OTP".to_owned(),
      communication_expiry: reference.expires_at,
    },
  });

  Assembled {
    status,
    envelope: GatewayLinkResponse {
      request_id: Uuid::new_v4(),
      timestamp: Utc::now(),
      transaction_id: transaction_id.to_owned(),
      link,
      error,
      resp: Resp { request_id: request_id.to_owned() },
    },
  }
}

/// Build the `on-confirm` envelope for a link confirmation result.
pub fn link_confirm_response(
  request_id: &str,
  result: Result<Outcome<LinkedPatient>>,
) -> Assembled<GatewayLinkConfirmResponse> {
  let (status, patient, error) = classify(result);
  let patient = patient.map(|p| LinkConfirmationRepresentation {
    reference_number: p.reference_number,
    display:          p.display,
    care_contexts:    p.care_contexts,
  });

  Assembled {
    status,
    envelope: GatewayLinkConfirmResponse {
      request_id: Uuid::new_v4(),
      timestamp: Utc::now(),
      patient,
      error,
      resp: Resp { request_id: request_id.to_owned() },
    },
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{
    Error,
    patient::{Gender, Patient, PatientQuery},
  };

  fn request() -> DiscoveryRequest {
    DiscoveryRequest {
      transaction_id: "3fa85f64-5717-4562-b3fc-2c963f66afa6".into(),
      request_id:     "5f7a535d-a3fd-416b-b069-c97d021fbacd".into(),
      patient:        PatientQuery {
        id:            "krunal@ncg".into(),
        name:          Some("Krunal Patel".into()),
        gender:        Some(Gender::M),
        year_of_birth: None,
      },
      requested_at:   Utc::now(),
    }
  }

  #[test]
  fn found_is_ok_with_patient_and_echoes() {
    let patient = Patient::new("RVH1111", "Krunal Patel")
      .with_care_contexts(vec![
        CareContext::new("NCP1111", "National Cancer program"),
        CareContext::unreferenced("OPD"),
      ])
      .with_matched_fields([MatchField::Gender, MatchField::Name].into());

    let assembled = discovery_response(&request(), Ok(Outcome::Found(patient)));

    assert_eq!(assembled.status, ResponseStatus::Ok);
    let envelope = assembled.envelope;
    assert_eq!(envelope.transaction_id, "3fa85f64-5717-4562-b3fc-2c963f66afa6");
    assert_eq!(envelope.resp.request_id, "5f7a535d-a3fd-416b-b069-c97d021fbacd");
    assert!(envelope.error.is_none());
    let patient = envelope.patient.unwrap();
    assert_eq!(patient.display, "Krunal Patel");
    assert_eq!(patient.care_contexts.len(), 2);
    assert_eq!(patient.matched_by, vec![MatchField::Name, MatchField::Gender]);
  }

  #[test]
  fn envelope_serialises_camel_case_with_explicit_nulls() {
    let assembled = discovery_response(
      &request(),
      Ok(Outcome::Failed(ErrorCode::NoPatientFound)),
    );
    let json = serde_json::to_value(&assembled.envelope).unwrap();

    assert_eq!(json["patient"], serde_json::Value::Null);
    assert_eq!(json["error"]["code"], 1000);
    assert_eq!(json["resp"]["requestId"], "5f7a535d-a3fd-416b-b069-c97d021fbacd");
    assert_eq!(json["transactionId"], "3fa85f64-5717-4562-b3fc-2c963f66afa6");
  }

  #[test]
  fn ambiguous_match_is_not_found() {
    let assembled = discovery_response(
      &request(),
      Ok(Outcome::Failed(ErrorCode::MultiplePatientsFound)),
    );
    assert_eq!(assembled.status, ResponseStatus::NotFound);
    assert!(assembled.envelope.patient.is_none());
    assert_eq!(assembled.envelope.error.unwrap().code, 1001);
  }

  #[test]
  fn infrastructure_failure_is_generic_internal_error() {
    let failure = Error::Store(Box::new(std::io::Error::other("disk on fire")));
    let assembled = discovery_response(&request(), Err(failure));

    assert_eq!(assembled.status, ResponseStatus::InternalServerError);
    let error = assembled.envelope.error.unwrap();
    assert_eq!(error.message, "Unreachable external service");
    assert!(!error.message.contains("disk"));
  }

  #[test]
  fn openmrs_connection_is_generic_internal_error() {
    let assembled = discovery_response(
      &request(),
      Ok(Outcome::Failed(ErrorCode::OpenMrsConnection)),
    );
    assert_eq!(assembled.status, ResponseStatus::InternalServerError);
    assert_eq!(
      assembled.envelope.error.unwrap().message,
      "Unreachable external service"
    );
  }

  #[test]
  fn link_init_found_carries_reference_and_expiry() {
    let expires_at = Utc::now();
    let assembled = link_init_response(
      "t1",
      "r1",
      Ok(Outcome::Found(LinkReference { reference_number: "link-1".into(), expires_at })),
    );
    assert_eq!(assembled.status, ResponseStatus::Ok);
    let link = assembled.envelope.link.unwrap();
    assert_eq!(link.reference_number, "link-1");
    assert_eq!(link.meta.communication_expiry, expires_at);
    assert_eq!(assembled.envelope.resp.request_id, "r1");
  }
}
