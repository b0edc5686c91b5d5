//! `POST /v1/links/link/init` and `POST /v1/links/link/confirm`

use axum::{Json, extract::State, extract::rejection::JsonRejection, http::StatusCode};
use hip_core::link::{LinkConfirmation, LinkEnquiry};
use serde::Deserialize;

use crate::{
  error::ApiError,
  jobs::{Job, JobQueue},
};

fn required(value: String, field: &str) -> Result<String, ApiError> {
  if value.trim().is_empty() {
    return Err(ApiError::BadRequest(format!("{field} is required")));
  }
  Ok(value)
}

// ─── Init ────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkInitBody {
  #[serde(default)]
  pub request_id:     String,
  #[serde(default)]
  pub transaction_id: String,
  pub patient:        LinkPatientBody,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkPatientBody {
  #[serde(default)]
  pub id:               String,
  #[serde(default)]
  pub reference_number: String,
  #[serde(default)]
  pub care_contexts:    Vec<CareContextBody>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CareContextBody {
  pub reference_number: String,
}

impl TryFrom<LinkInitBody> for LinkEnquiry {
  type Error = ApiError;

  fn try_from(body: LinkInitBody) -> Result<Self, ApiError> {
    Ok(LinkEnquiry {
      transaction_id:           required(body.transaction_id, "transactionId")?,
      request_id:               body.request_id,
      patient_id:               required(body.patient.id, "patient.id")?,
      patient_reference_number: required(body.patient.reference_number, "patient.referenceNumber")?,
      care_contexts:            body
        .patient
        .care_contexts
        .into_iter()
        .map(|cc| cc.reference_number)
        .collect(),
    })
  }
}

pub async fn init(
  State(queue): State<JobQueue>,
  body: Result<Json<LinkInitBody>, JsonRejection>,
) -> Result<StatusCode, ApiError> {
  let Json(body) = body?;
  let enquiry = LinkEnquiry::try_from(body)?;

  let transaction_id = enquiry.transaction_id.clone();
  queue.submit(Job::LinkInit(enquiry))?;
  tracing::info!(%transaction_id, "link init accepted");
  Ok(StatusCode::ACCEPTED)
}

// ─── Confirm ─────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkConfirmBody {
  #[serde(default)]
  pub request_id:   String,
  pub confirmation: ConfirmationBody,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmationBody {
  #[serde(default)]
  pub link_ref_number: String,
  #[serde(default)]
  pub token:           String,
}

impl TryFrom<LinkConfirmBody> for LinkConfirmation {
  type Error = ApiError;

  fn try_from(body: LinkConfirmBody) -> Result<Self, ApiError> {
    Ok(LinkConfirmation {
      request_id:            body.request_id,
      link_reference_number: required(body.confirmation.link_ref_number, "confirmation.linkRefNumber")?,
      token:                 required(body.confirmation.token, "confirmation.token")?,
    })
  }
}

pub async fn confirm(
  State(queue): State<JobQueue>,
  body: Result<Json<LinkConfirmBody>, JsonRejection>,
) -> Result<StatusCode, ApiError> {
  let Json(body) = body?;
  let confirmation = LinkConfirmation::try_from(body)?;

  let link_reference = confirmation.link_reference_number.clone();
  queue.submit(Job::LinkConfirm(confirmation))?;
  tracing::info!(%link_reference, "link confirm accepted");
  Ok(StatusCode::ACCEPTED)
}
