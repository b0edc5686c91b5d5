//! `POST /v1/care-contexts/discover`
//!
//! Validates the gateway's discovery request, queues it, and answers `202`.
//! The result arrives later on the gateway's `on-discover` callback.

use axum::{Json, extract::State, extract::rejection::JsonRejection, http::StatusCode};
use chrono::Utc;
use hip_core::patient::{DiscoveryRequest, Gender, PatientQuery};
use serde::Deserialize;

use crate::{
  error::ApiError,
  jobs::{Job, JobQueue},
};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscoveryBody {
  pub request_id:     Option<String>,
  pub transaction_id: Option<String>,
  pub patient:        Option<PatientBody>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatientBody {
  pub id:            Option<String>,
  pub name:          Option<String>,
  pub gender:        Option<Gender>,
  pub year_of_birth: Option<u16>,
}

fn non_empty(value: Option<String>, field: &str) -> Result<String, ApiError> {
  value
    .filter(|v| !v.trim().is_empty())
    .ok_or_else(|| ApiError::BadRequest(format!("{field} is required")))
}

impl TryFrom<DiscoveryBody> for DiscoveryRequest {
  type Error = ApiError;

  fn try_from(body: DiscoveryBody) -> Result<Self, ApiError> {
    let transaction_id = non_empty(body.transaction_id, "transactionId")?;
    let patient = body
      .patient
      .ok_or_else(|| ApiError::BadRequest("patient is required".into()))?;
    let id = non_empty(patient.id, "patient.id")?;
    let name = patient.name.filter(|n| !n.trim().is_empty());
    if name.is_none() && patient.gender.is_none() {
      return Err(ApiError::BadRequest(
        "patient.name or patient.gender is required".into(),
      ));
    }

    Ok(DiscoveryRequest {
      transaction_id,
      request_id: body.request_id.unwrap_or_default(),
      patient: PatientQuery {
        id,
        name,
        gender: patient.gender,
        year_of_birth: patient.year_of_birth,
      },
      requested_at: Utc::now(),
    })
  }
}

pub async fn handler(
  State(queue): State<JobQueue>,
  body: Result<Json<DiscoveryBody>, JsonRejection>,
) -> Result<StatusCode, ApiError> {
  let Json(body) = body?;
  let request = DiscoveryRequest::try_from(body)?;

  let transaction_id = request.transaction_id.clone();
  queue.submit(Job::Discover(request))?;
  tracing::info!(%transaction_id, "discovery request accepted");
  Ok(StatusCode::ACCEPTED)
}
