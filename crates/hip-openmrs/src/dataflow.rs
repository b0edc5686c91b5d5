//! Clinical records for health-information transfer.

use chrono::{DateTime, Utc};
use hip_core::{
  SourceError,
  dataflow::{Concept, Condition, DataFlowSource, Diagnosis, Medication, Observation, is_diagnosis},
};

use crate::{
  Error, OpenMrsClient, Result, paths,
  rest::{ConditionHistory, Encounter, Results, Visit},
};

#[derive(Clone)]
pub struct OpenMrsDataFlow {
  client: OpenMrsClient,
}

fn require_reference(patient: &str) -> Result<()> {
  if patient.is_empty() {
    return Err(Error::Format("empty patient reference".into()));
  }
  Ok(())
}

impl OpenMrsDataFlow {
  pub fn new(client: OpenMrsClient) -> Self { Self { client } }

  /// Encounters of every visit whose type display equals `visit_type`.
  async fn encounters(&self, patient: &str, visit_type: &str) -> Result<Vec<Encounter>> {
    require_reference(patient)?;
    let visits: Results<Visit> = self
      .client
      .get(paths::VISIT, &[("patient", patient), ("v", "full")])
      .await?;

    Ok(
      visits
        .results
        .into_iter()
        .filter(|v| v.type_display() == Some(visit_type))
        .flat_map(|v| v.encounters)
        .collect(),
    )
  }

  pub async fn load_observations(&self, patient: &str, visit_type: &str) -> Result<Vec<Observation>> {
    let encounters = self.encounters(patient, visit_type).await?;
    Ok(
      encounters
        .into_iter()
        .flat_map(|e| e.obs)
        .map(|o| Observation { reference_number: o.uuid, display: o.display })
        .collect(),
    )
  }

  pub async fn load_diagnoses(&self, patient: &str, visit_type: &str) -> Result<Vec<Diagnosis>> {
    let encounters = self.encounters(patient, visit_type).await?;
    Ok(
      encounters
        .into_iter()
        .flat_map(|e| e.obs)
        .filter(|o| is_diagnosis(&o.display))
        .map(|o| Diagnosis { reference_number: o.uuid, display: o.display })
        .collect(),
    )
  }

  pub async fn load_medications(&self, patient: &str, visit_type: &str) -> Result<Vec<Medication>> {
    let encounters = self.encounters(patient, visit_type).await?;
    Ok(
      encounters
        .into_iter()
        .flat_map(|e| e.orders)
        .map(|o| Medication { reference_number: o.uuid, display: o.display, kind: o.kind })
        .collect(),
    )
  }

  pub async fn load_conditions(&self, patient: &str) -> Result<Vec<Condition>> {
    require_reference(patient)?;
    let history: Vec<ConditionHistory> = self
      .client
      .get(paths::CONDITION_HISTORY, &[("patientUuid", patient)])
      .await?;

    history
      .into_iter()
      .flat_map(|h| h.conditions)
      .map(|c| {
        let on_set_date = DateTime::<Utc>::from_timestamp_millis(c.on_set_date)
          .ok_or_else(|| Error::Format(format!("onSetDate out of range: {}", c.on_set_date)))?;
        Ok(Condition {
          reference_number: c.uuid,
          concept: Concept { reference_number: c.concept.uuid, name: c.concept.name },
          condition_non_coded: c.condition_non_coded,
          status: c.status,
          on_set_date,
        })
      })
      .collect()
  }
}

impl DataFlowSource for OpenMrsDataFlow {
  async fn observations(&self, patient_reference: &str, visit_type: &str) -> Result<Vec<Observation>, SourceError> {
    Ok(self.load_observations(patient_reference, visit_type).await?)
  }

  async fn diagnoses(&self, patient_reference: &str, visit_type: &str) -> Result<Vec<Diagnosis>, SourceError> {
    Ok(self.load_diagnoses(patient_reference, visit_type).await?)
  }

  async fn medications(&self, patient_reference: &str, visit_type: &str) -> Result<Vec<Medication>, SourceError> {
    Ok(self.load_medications(patient_reference, visit_type).await?)
  }

  async fn conditions(&self, patient_reference: &str) -> Result<Vec<Condition>, SourceError> {
    Ok(self.load_conditions(patient_reference).await?)
  }
}
