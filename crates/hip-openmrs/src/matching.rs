//! Demographic patient search against the registry's FHIR endpoint.

use std::collections::BTreeSet;

use hip_core::{
  SourceError,
  patient::{MatchField, Patient, PatientQuery},
  source::MatchingSource,
};

use crate::{
  OpenMrsClient, Result,
  fhir::{Bundle, gender_code},
  paths,
};

#[derive(Clone)]
pub struct OpenMrsPatientMatching {
  client: OpenMrsClient,
}

impl OpenMrsPatientMatching {
  pub fn new(client: OpenMrsClient) -> Self { Self { client } }

  /// Search by whichever of name, gender, and birth year the query carries.
  /// Each candidate is annotated with the demographic fields searched on;
  /// birth year only narrows the search.
  pub async fn search(&self, query: &PatientQuery) -> Result<Vec<Patient>> {
    let year = query.year_of_birth.map(|y| y.to_string());
    let mut params: Vec<(&str, &str)> = Vec::new();
    let mut searched = BTreeSet::new();
    if let Some(name) = query.name.as_deref() {
      params.push(("name", name));
      searched.insert(MatchField::Name);
    }
    if let Some(gender) = query.gender {
      params.push(("gender", gender_code(gender)));
      searched.insert(MatchField::Gender);
    }
    if let Some(year) = year.as_deref() {
      params.push(("birthdate", year));
    }

    let bundle: Bundle = self.client.get(paths::PATIENT, &params).await?;
    bundle
      .entry
      .into_iter()
      .map(|entry| Ok(Patient::try_from(entry.resource)?.with_matched_fields(searched.clone())))
      .collect()
  }
}

impl MatchingSource for OpenMrsPatientMatching {
  async fn matching(&self, query: &PatientQuery) -> Result<Vec<Patient>, SourceError> {
    let candidates = self.search(query).await?;
    tracing::debug!(count = candidates.len(), "registry candidates");
    Ok(candidates)
  }
}

#[cfg(test)]
mod tests {
  use hip_core::patient::Gender;
  use serde_json::json;

  use super::*;
  use crate::testing::{Route, serve_recording};

  fn query() -> PatientQuery {
    PatientQuery {
      id:            "krunal@ncg".into(),
      name:          Some("Krunal".into()),
      gender:        Some(Gender::M),
      year_of_birth: Some(1976),
    }
  }

  #[tokio::test]
  async fn searches_fhir_with_supplied_fields() {
    let (client, registry) = serve_recording(vec![Route::json(
      "/ws/fhir2/Patient",
      json!({
        "resourceType": "Bundle",
        "entry": [
          { "resource": { "id": "RVH1111", "name": [{ "text": "Krunal Patel" }], "gender": "male" } },
          { "resource": { "id": "1234", "name": [{ "text": "John Doe" }], "gender": "male" } }
        ]
      }),
    )])
    .await;

    let candidates = OpenMrsPatientMatching::new(client).matching(&query()).await.unwrap();
    assert_eq!(candidates.len(), 2);
    assert_eq!(candidates[0].matched_fields, [MatchField::Name, MatchField::Gender].into());
    assert!(
      registry.requests()[0].ends_with("Patient?name=Krunal&gender=male&birthdate=1976")
    );
  }

  #[tokio::test]
  async fn no_entries_is_no_candidates() {
    let (client, _) = serve_recording(vec![Route::json(
      "/ws/fhir2/Patient",
      json!({ "resourceType": "Bundle", "total": 0 }),
    )])
    .await;
    let candidates = OpenMrsPatientMatching::new(client).matching(&query()).await.unwrap();
    assert!(candidates.is_empty());
  }
}
