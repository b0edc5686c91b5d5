//! Care contexts from Bahmni program enrollments and OpenMRS visits.

use hip_core::{SourceError, patient::CareContext, source::CareContextSource};

use crate::{
  Error, OpenMrsClient, Result, paths,
  rest::{ProgramEnrollment, Results, Visit},
};

#[derive(Clone)]
pub struct OpenMrsCareContexts {
  client: OpenMrsClient,
}

impl OpenMrsCareContexts {
  pub fn new(client: OpenMrsClient) -> Self { Self { client } }

  /// Program enrollments first, then distinct visit types.
  pub async fn load(&self, patient: &str) -> Result<Vec<CareContext>> {
    let mut contexts = self.program_enrollments(patient).await?;
    contexts.extend(self.visit_types(patient).await?);
    Ok(contexts)
  }

  /// One referenced care context per program enrollment.
  pub async fn program_enrollments(&self, patient: &str) -> Result<Vec<CareContext>> {
    let enrollments: Results<ProgramEnrollment> = self
      .client
      .get(paths::PROGRAM_ENROLLMENT, &[("patient", patient)])
      .await?;

    Ok(
      enrollments
        .results
        .into_iter()
        .map(|e| CareContext::new(e.uuid, e.display))
        .collect(),
    )
  }

  /// One unreferenced care context per distinct visit type, in order of
  /// first appearance.
  pub async fn visit_types(&self, patient: &str) -> Result<Vec<CareContext>> {
    let visits: Results<Visit> = self
      .client
      .get(paths::VISIT, &[("patient", patient), ("v", "full")])
      .await?;

    let mut contexts: Vec<CareContext> = Vec::new();
    for visit in &visits.results {
      let display = visit
        .type_display()
        .ok_or_else(|| Error::Format("visit without visit type display".into()))?;
      if !contexts.iter().any(|c| c.display == display) {
        contexts.push(CareContext::unreferenced(display));
      }
    }
    Ok(contexts)
  }
}

impl CareContextSource for OpenMrsCareContexts {
  async fn care_contexts(&self, patient_reference_number: &str) -> Result<Vec<CareContext>, SourceError> {
    Ok(self.load(patient_reference_number).await?)
  }
}
