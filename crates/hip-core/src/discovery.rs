//! The discovery engine: resolves a demographic query to exactly one patient.
//!
//! Steps run strictly in order:
//!
//! 1. reject a transaction id that was already processed;
//! 2. short-circuit through an existing consent link, offering only the care
//!    contexts not linked yet;
//! 3. query the registry;
//! 4. attach care contexts to every candidate;
//! 5. keep the candidates matching on name or gender and require exactly one.
//!
//! Every attempt that gets past step 1 is recorded, whatever its outcome, so
//! a transaction id is processed at most once. Both the linked path and the
//! matching path converge on that single record in
//! [`PatientDiscovery::patient_for`].

use std::collections::BTreeSet;

use tracing::{error, info, warn};

use crate::{
  Error, ErrorCode, Outcome, Result, filter,
  link::LinkedAccount,
  patient::{CareContext, DiscoveryRequest, Patient},
  source::{CareContextSource, MatchingSource, PatientDirectory},
  store::{DiscoveryRecord, DiscoveryRequestStore, LinkStore},
};

/// On `Found`, the patient carries the care contexts to offer and the fields
/// it matched on.
pub type DiscoveryOutcome = Outcome<Patient>;

/// Orchestrates one discovery attempt over its collaborators.
pub struct PatientDiscovery<M, C, D, L, P> {
  matching:      M,
  care_contexts: C,
  requests:      D,
  links:         L,
  patients:      P,
}

impl<M, C, D, L, P> PatientDiscovery<M, C, D, L, P>
where
  M: MatchingSource,
  C: CareContextSource,
  D: DiscoveryRequestStore,
  L: LinkStore,
  P: PatientDirectory,
{
  pub fn new(matching: M, care_contexts: C, requests: D, links: L, patients: P) -> Self {
    Self { matching, care_contexts, requests, links, patients }
  }

  /// Run one discovery attempt.
  ///
  /// `Err` is reserved for store failures; every collaborator failure is
  /// reported as a [`Outcome::Failed`] code.
  pub async fn patient_for(&self, request: &DiscoveryRequest) -> Result<DiscoveryOutcome> {
    let transaction_id = request.transaction_id.as_str();

    if self.requests.exists(transaction_id).await.map_err(Error::store)? {
      info!(%transaction_id, "discovery request already exists");
      return Ok(Outcome::Failed(ErrorCode::DuplicateDiscoveryRequest));
    }

    let outcome = self.attempt(request).await;

    let record = DiscoveryRecord {
      transaction_id:           request.transaction_id.clone(),
      patient_id:               request.patient.id.clone(),
      patient_reference_number: match &outcome {
        Outcome::Found(patient) => Some(patient.reference_number.clone()),
        Outcome::Failed(_) => None,
      },
    };

    // A concurrent duplicate may have recorded the transaction after our
    // check; the insert-if-absent decides.
    if !self.requests.add(record).await.map_err(Error::store)? {
      warn!(%transaction_id, "discovery request recorded concurrently");
      return Ok(Outcome::Failed(ErrorCode::DuplicateDiscoveryRequest));
    }

    match &outcome {
      Outcome::Found(patient) => info!(
        %transaction_id,
        patient = %patient.reference_number,
        care_contexts = patient.care_contexts.len(),
        "patient discovered",
      ),
      Outcome::Failed(code) => info!(%transaction_id, ?code, "discovery failed"),
    }
    Ok(outcome)
  }

  /// Steps 2 to 5: the existing-link short-circuit, then registry matching.
  async fn attempt(&self, request: &DiscoveryRequest) -> DiscoveryOutcome {
    let transaction_id = request.transaction_id.as_str();

    let linked = match self.links.linked_care_contexts(&request.patient.id).await {
      Ok(accounts) => accounts,
      Err(e) => {
        error!(%transaction_id, error = %e, "failed to get linked care contexts");
        return Outcome::Failed(ErrorCode::FailedToGetLinkedCareContexts);
      }
    };

    if let Some(first) = linked.first() {
      info!(%transaction_id, "found already linked care contexts");
      let mut patient = match self.patients.patient_with(&first.patient_reference_number).await {
        Ok(Some(patient)) => patient,
        Ok(None) => return Outcome::Failed(ErrorCode::NoPatientFound),
        Err(e) => {
          error!(%transaction_id, error = %e, "failed to load linked patient");
          return Outcome::Failed(e.error_code());
        }
      };
      patient.care_contexts =
        unlinked_care_contexts(&linked, std::mem::take(&mut patient.care_contexts));
      patient.matched_fields.clear();
      return Outcome::Found(patient);
    }

    let mut candidates = match self.matching.matching(&request.patient).await {
      Ok(candidates) => candidates,
      Err(e) => {
        error!(%transaction_id, error = %e, "patient registry query failed");
        return Outcome::Failed(e.error_code());
      }
    };

    for candidate in &mut candidates {
      match self.care_contexts.care_contexts(&candidate.reference_number).await {
        Ok(care_contexts) => candidate.care_contexts = care_contexts,
        Err(e) => {
          error!(
            %transaction_id,
            patient = %candidate.reference_number,
            error = %e,
            "could not get care contexts",
          );
          return Outcome::Failed(e.error_code());
        }
      }
    }

    let mut matches = filter::select(candidates, &request.patient);
    if matches.len() > 1 {
      warn!(%transaction_id, count = matches.len(), "multiple patients matched");
      return Outcome::Failed(ErrorCode::MultiplePatientsFound);
    }
    match matches.pop() {
      Some(patient) => Outcome::Found(patient),
      None => Outcome::Failed(ErrorCode::NoPatientFound),
    }
  }
}

/// Care contexts of the patient that no linked account already covers.
fn unlinked_care_contexts(
  linked: &[LinkedAccount],
  care_contexts: Vec<CareContext>,
) -> Vec<CareContext> {
  let already: BTreeSet<&str> = linked
    .iter()
    .flat_map(|account| account.care_contexts.iter().map(String::as_str))
    .collect();

  care_contexts
    .into_iter()
    .filter(|cc| {
      cc.reference_number
        .as_deref()
        .is_none_or(|reference| !already.contains(reference))
    })
    .collect()
}
