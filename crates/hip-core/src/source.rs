//! Hospital-side collaborators: the patient registry and its clinical data.
//!
//! Failures come back as [`SourceError`] values, never panics, so the engines
//! can map each one to exactly one [`crate::ErrorCode`].

use std::future::Future;

use crate::{
  SourceError,
  patient::{CareContext, Patient, PatientQuery},
};

/// Searches the registry for patients resembling a demographic query.
pub trait MatchingSource: Send + Sync {
  /// Candidates annotated with the fields the registry matched them on.
  /// Care contexts are left empty.
  fn matching<'a>(
    &'a self,
    query: &'a PatientQuery,
  ) -> impl Future<Output = Result<Vec<Patient>, SourceError>> + Send + 'a;
}

/// Lists the care episodes available for a registry patient.
pub trait CareContextSource: Send + Sync {
  /// Program enrollments first, then visit types de-duplicated by display.
  fn care_contexts<'a>(
    &'a self,
    patient_reference_number: &'a str,
  ) -> impl Future<Output = Result<Vec<CareContext>, SourceError>> + Send + 'a;
}

/// Looks up a single patient, with care contexts, by reference number.
pub trait PatientDirectory: Send + Sync {
  fn patient_with<'a>(
    &'a self,
    reference_number: &'a str,
  ) -> impl Future<Output = Result<Option<Patient>, SourceError>> + Send + 'a;
}
