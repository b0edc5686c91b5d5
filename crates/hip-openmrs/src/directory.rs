//! Single-patient lookup by reference number, with care contexts attached.

use hip_core::{SourceError, patient::Patient, source::PatientDirectory};

use crate::{OpenMrsCareContexts, OpenMrsClient, Result, fhir::FhirPatient, paths};

#[derive(Clone)]
pub struct OpenMrsDirectory {
  client:        OpenMrsClient,
  care_contexts: OpenMrsCareContexts,
}

impl OpenMrsDirectory {
  pub fn new(client: OpenMrsClient) -> Self {
    let care_contexts = OpenMrsCareContexts::new(client.clone());
    Self { client, care_contexts }
  }

  pub async fn lookup(&self, reference_number: &str) -> Result<Option<Patient>> {
    let path = format!("{}/{reference_number}", paths::PATIENT);
    let Some(resource) = self.client.get_optional::<FhirPatient>(&path, &[]).await? else {
      return Ok(None);
    };

    let patient = Patient::try_from(resource)?;
    let care_contexts = self.care_contexts.load(reference_number).await?;
    Ok(Some(patient.with_care_contexts(care_contexts)))
  }
}

impl PatientDirectory for OpenMrsDirectory {
  async fn patient_with(&self, reference_number: &str) -> Result<Option<Patient>, SourceError> {
    Ok(self.lookup(reference_number).await?)
  }
}
