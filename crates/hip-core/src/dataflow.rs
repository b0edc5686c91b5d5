//! Clinical records read from the registry for health-information transfer.

use std::future::Future;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::SourceError;

/// The display text that marks an observation as a visit diagnosis.
pub const VISIT_DIAGNOSES: &str = "Visit Diagnoses";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Observation {
  pub reference_number: String,
  pub display:          String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Diagnosis {
  pub reference_number: String,
  pub display:          String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Medication {
  pub reference_number: String,
  pub display:          String,
  /// Order type, e.g. `drugorder`.
  pub kind:             String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Concept {
  pub reference_number: String,
  pub name:             String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
  pub reference_number:    String,
  pub concept:             Concept,
  pub condition_non_coded: Option<String>,
  pub status:              String,
  pub on_set_date:         DateTime<Utc>,
}

/// Reads a patient's clinical records, scoped to visits of one type.
pub trait DataFlowSource: Send + Sync {
  fn observations<'a>(
    &'a self,
    patient_reference: &'a str,
    visit_type: &'a str,
  ) -> impl Future<Output = Result<Vec<Observation>, SourceError>> + Send + 'a;

  /// Observations whose display marks them as visit diagnoses.
  fn diagnoses<'a>(
    &'a self,
    patient_reference: &'a str,
    visit_type: &'a str,
  ) -> impl Future<Output = Result<Vec<Diagnosis>, SourceError>> + Send + 'a;

  fn medications<'a>(
    &'a self,
    patient_reference: &'a str,
    visit_type: &'a str,
  ) -> impl Future<Output = Result<Vec<Medication>, SourceError>> + Send + 'a;

  /// Condition history, not scoped to a visit.
  fn conditions<'a>(
    &'a self,
    patient_reference: &'a str,
  ) -> impl Future<Output = Result<Vec<Condition>, SourceError>> + Send + 'a;
}

/// Whether an observation display marks a visit diagnosis.
pub fn is_diagnosis(display: &str) -> bool { display.contains(VISIT_DIAGNOSES) }

// ─── Collection ──────────────────────────────────────────────────────────────

/// A care context whose records were requested for transfer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GrantedContext {
  pub patient_reference:      String,
  /// Names the visit type the records are scoped to.
  pub care_context_reference: String,
}

/// Everything read for one granted care context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CareBundle {
  pub care_context_reference: String,
  pub observations:           Vec<Observation>,
  pub diagnoses:              Vec<Diagnosis>,
  pub medications:            Vec<Medication>,
  pub conditions:             Vec<Condition>,
}

/// Read one bundle per granted care context, in request order. The first
/// source failure aborts the collection.
pub async fn collect<S: DataFlowSource>(
  source: &S,
  granted: &[GrantedContext],
) -> Result<Vec<CareBundle>, SourceError> {
  let mut bundles = Vec::with_capacity(granted.len());
  for context in granted {
    let patient = context.patient_reference.as_str();
    let visit_type = context.care_context_reference.as_str();

    let bundle = CareBundle {
      care_context_reference: context.care_context_reference.clone(),
      observations:           source.observations(patient, visit_type).await?,
      diagnoses:              source.diagnoses(patient, visit_type).await?,
      medications:            source.medications(patient, visit_type).await?,
      conditions:             source.conditions(patient).await?,
    };
    tracing::debug!(
      patient,
      care_context = visit_type,
      medications = bundle.medications.len(),
      "collected care bundle",
    );
    bundles.push(bundle);
  }
  Ok(bundles)
}
