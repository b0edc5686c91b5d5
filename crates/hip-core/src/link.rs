//! Consent-link records: completed links and pending link requests.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::patient::CareContext;

/// A completed consent-link between a consumer identity and some of a
/// patient's care contexts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkedAccount {
  /// Consumer-side identity (`<local-id>@<consumer-suffix>`).
  pub patient_id:               String,
  pub patient_reference_number: String,
  /// Reference numbers of the linked care contexts.
  pub care_contexts:            BTreeSet<String>,
}

/// Input to [`crate::linking::LinkPatient::link_init`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkEnquiry {
  pub transaction_id:           String,
  pub request_id:               String,
  pub patient_id:               String,
  pub patient_reference_number: String,
  /// Reference numbers of the care contexts the consumer wants linked.
  pub care_contexts:            Vec<String>,
}

/// A link initialised but not yet confirmed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkRequest {
  pub link_reference_number:    String,
  pub transaction_id:           String,
  pub patient_id:               String,
  pub patient_reference_number: String,
  pub care_contexts:            Vec<String>,
  pub expires_at:               DateTime<Utc>,
  pub created_at:               DateTime<Utc>,
}

impl LinkRequest {
  pub fn is_expired(&self, now: DateTime<Utc>) -> bool { now > self.expires_at }
}

/// Returned by a successful link initialisation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkReference {
  pub reference_number: String,
  pub expires_at:       DateTime<Utc>,
}

/// Input to [`crate::linking::LinkPatient::link_confirm`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkConfirmation {
  pub request_id:            String,
  pub link_reference_number: String,
  /// One-time token issued to the consumer. Verified by the OTP service,
  /// not by this crate.
  pub token:                 String,
}

/// The patient view returned once a link is confirmed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkedPatient {
  pub patient_id:       String,
  pub reference_number: String,
  pub display:          String,
  pub care_contexts:    Vec<CareContext>,
}
