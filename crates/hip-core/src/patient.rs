//! Patients, care contexts, and the discovery request that searches for them.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ─── Demographics ────────────────────────────────────────────────────────────

/// Administrative gender as exchanged with the gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Gender {
  M,
  F,
  O,
  U,
}

/// A demographic field that contributed to a match.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "camelCase")]
pub enum MatchField {
  Name,
  Gender,
}

// ─── Care contexts ───────────────────────────────────────────────────────────

/// One clinical episode a patient can link for data sharing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CareContext {
  /// Absent for visit-type contexts, which are identified by display only.
  pub reference_number: Option<String>,
  pub display:          String,
}

impl CareContext {
  pub fn new(reference_number: impl Into<String>, display: impl Into<String>) -> Self {
    Self { reference_number: Some(reference_number.into()), display: display.into() }
  }

  pub fn unreferenced(display: impl Into<String>) -> Self {
    Self { reference_number: None, display: display.into() }
  }
}

// ─── Patient ─────────────────────────────────────────────────────────────────

/// A patient known to the hospital registry.
///
/// Built per discovery attempt from registry data; only the reference number
/// is ever persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Patient {
  pub reference_number: String,
  pub name:             String,
  pub gender:           Option<Gender>,
  pub year_of_birth:    Option<u16>,
  pub care_contexts:    Vec<CareContext>,
  /// Query fields this patient matched on. Empty when the patient was reached
  /// through an existing link rather than demographic matching.
  pub matched_fields:   BTreeSet<MatchField>,
}

impl Patient {
  pub fn new(reference_number: impl Into<String>, name: impl Into<String>) -> Self {
    Self {
      reference_number: reference_number.into(),
      name:             name.into(),
      gender:           None,
      year_of_birth:    None,
      care_contexts:    Vec::new(),
      matched_fields:   BTreeSet::new(),
    }
  }

  pub fn with_gender(mut self, gender: Gender) -> Self {
    self.gender = Some(gender);
    self
  }

  pub fn with_year_of_birth(mut self, year: u16) -> Self {
    self.year_of_birth = Some(year);
    self
  }

  pub fn with_care_contexts(mut self, care_contexts: Vec<CareContext>) -> Self {
    self.care_contexts = care_contexts;
    self
  }

  pub fn with_matched_fields(mut self, fields: BTreeSet<MatchField>) -> Self {
    self.matched_fields = fields;
    self
  }
}

// ─── Discovery request ───────────────────────────────────────────────────────

/// The demographic query submitted by a consumer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatientQuery {
  /// Consumer-side identity, `<local-id>@<consumer-suffix>`.
  pub id:            String,
  pub name:          Option<String>,
  pub gender:        Option<Gender>,
  pub year_of_birth: Option<u16>,
}

impl PatientQuery {
  /// The consumer-manager suffix the gateway routes callbacks by.
  pub fn consumer_suffix(&self) -> &str { consumer_suffix(&self.id) }
}

/// Text after the last `@` of a consumer-side patient id, or the whole id
/// when it has none.
pub fn consumer_suffix(patient_id: &str) -> &str {
  patient_id
    .rsplit_once('@')
    .map_or(patient_id, |(_, suffix)| suffix)
}

/// One discovery attempt. Immutable once accepted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscoveryRequest {
  /// Unique per discovery attempt; the idempotency key.
  pub transaction_id: String,
  pub request_id:     String,
  pub patient:        PatientQuery,
  pub requested_at:   DateTime<Utc>,
}
