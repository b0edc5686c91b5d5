//! Encoding and decoding helpers between domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as RFC 3339 strings. Care-context lists on pending
//! link requests are stored as compact JSON.

use chrono::{DateTime, Utc};
use hip_core::link::LinkRequest;

use crate::{Error, Result};

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Care contexts ───────────────────────────────────────────────────────────

pub fn encode_care_contexts(references: &[String]) -> Result<String> {
  Ok(serde_json::to_string(references)?)
}

pub fn decode_care_contexts(s: &str) -> Result<Vec<String>> {
  Ok(serde_json::from_str(s)?)
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw strings read directly from a `link_requests` row.
pub struct RawLinkRequest {
  pub link_reference_number:    String,
  pub transaction_id:           String,
  pub patient_id:               String,
  pub patient_reference_number: String,
  pub care_contexts:            String,
  pub expires_at:               String,
  pub created_at:               String,
}

impl RawLinkRequest {
  pub fn into_link_request(self) -> Result<LinkRequest> {
    Ok(LinkRequest {
      link_reference_number:    self.link_reference_number,
      transaction_id:           self.transaction_id,
      patient_id:               self.patient_id,
      patient_reference_number: self.patient_reference_number,
      care_contexts:            decode_care_contexts(&self.care_contexts)?,
      expires_at:               decode_dt(&self.expires_at)?,
      created_at:               decode_dt(&self.created_at)?,
    })
  }
}

/// One `linked_accounts` row.
pub struct RawLinkedContext {
  pub patient_id:               String,
  pub patient_reference_number: String,
  pub care_context:             String,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn timestamps_survive_encoding() {
    let now = Utc::now();
    assert_eq!(decode_dt(&encode_dt(now)).unwrap(), now);
  }

  #[test]
  fn garbage_timestamp_is_an_error() {
    assert!(matches!(decode_dt("yesterday"), Err(Error::DateParse(_))));
  }
}
