//! In-memory collaborators for engine tests.

use std::{
  collections::{HashMap, HashSet},
  sync::{
    Mutex,
    atomic::{AtomicUsize, Ordering},
  },
};

use thiserror::Error;

use crate::{
  SourceError,
  dataflow::{Condition, DataFlowSource, Diagnosis, Medication, Observation},
  link::{LinkRequest, LinkedAccount},
  patient::{CareContext, MatchField, Patient, PatientQuery},
  source::{CareContextSource, MatchingSource, PatientDirectory},
  store::{DiscoveryRecord, DiscoveryRequestStore, LinkStore},
};

#[derive(Debug, Error)]
#[error("fake failure")]
pub struct FakeError;

// ─── Sources ─────────────────────────────────────────────────────────────────

#[derive(Default)]
pub struct FakeMatching {
  pub candidates:           Vec<Patient>,
  pub fail_with_connection: bool,
  pub calls:                AtomicUsize,
}

impl MatchingSource for FakeMatching {
  async fn matching(&self, query: &PatientQuery) -> Result<Vec<Patient>, SourceError> {
    self.calls.fetch_add(1, Ordering::SeqCst);
    if self.fail_with_connection {
      return Err(SourceError::Connection(Box::new(FakeError)));
    }
    // The registry annotates by what it was asked, not by what it returned.
    let mut asked = std::collections::BTreeSet::new();
    if query.name.is_some() {
      asked.insert(MatchField::Name);
    }
    if query.gender.is_some() {
      asked.insert(MatchField::Gender);
    }
    Ok(
      self
        .candidates
        .iter()
        .cloned()
        .map(|p| p.with_matched_fields(asked.clone()))
        .collect(),
    )
  }
}

#[derive(Default)]
pub struct FakeCareContexts {
  pub by_patient: HashMap<String, Vec<CareContext>>,
  pub malformed:  HashSet<String>,
}

impl CareContextSource for FakeCareContexts {
  async fn care_contexts(&self, reference: &str) -> Result<Vec<CareContext>, SourceError> {
    if self.malformed.contains(reference) {
      return Err(SourceError::Format("results missing".into()));
    }
    Ok(self.by_patient.get(reference).cloned().unwrap_or_default())
  }
}

#[derive(Default)]
pub struct FakeDirectory {
  pub patients: HashMap<String, Patient>,
}

impl PatientDirectory for FakeDirectory {
  async fn patient_with(&self, reference: &str) -> Result<Option<Patient>, SourceError> {
    Ok(self.patients.get(reference).cloned())
  }
}

/// Records keyed by (patient reference, visit type).
#[derive(Default)]
pub struct FakeDataFlow {
  pub observations: HashMap<(String, String), Vec<Observation>>,
  pub diagnoses:    HashMap<(String, String), Vec<Diagnosis>>,
  pub medications:  HashMap<(String, String), Vec<Medication>>,
  pub conditions:   HashMap<String, Vec<Condition>>,
  pub fail:         bool,
}

impl FakeDataFlow {
  fn scoped<T: Clone>(
    &self,
    records: &HashMap<(String, String), Vec<T>>,
    patient: &str,
    visit_type: &str,
  ) -> Result<Vec<T>, SourceError> {
    if self.fail {
      return Err(SourceError::Connection(Box::new(FakeError)));
    }
    Ok(
      records
        .get(&(patient.to_owned(), visit_type.to_owned()))
        .cloned()
        .unwrap_or_default(),
    )
  }
}

impl DataFlowSource for FakeDataFlow {
  async fn observations(&self, patient: &str, visit_type: &str) -> Result<Vec<Observation>, SourceError> {
    self.scoped(&self.observations, patient, visit_type)
  }

  async fn diagnoses(&self, patient: &str, visit_type: &str) -> Result<Vec<Diagnosis>, SourceError> {
    self.scoped(&self.diagnoses, patient, visit_type)
  }

  async fn medications(&self, patient: &str, visit_type: &str) -> Result<Vec<Medication>, SourceError> {
    self.scoped(&self.medications, patient, visit_type)
  }

  async fn conditions(&self, patient: &str) -> Result<Vec<Condition>, SourceError> {
    if self.fail {
      return Err(SourceError::Connection(Box::new(FakeError)));
    }
    Ok(self.conditions.get(patient).cloned().unwrap_or_default())
  }
}

// ─── Stores ──────────────────────────────────────────────────────────────────

#[derive(Default)]
pub struct FakeRequests {
  records:              Mutex<Vec<DiscoveryRecord>>,
  /// Makes `exists` answer `false` regardless, to simulate a concurrent
  /// writer landing between the check and the insert.
  pub hide_from_exists: bool,
}

impl FakeRequests {
  pub fn recorded(&self) -> Vec<DiscoveryRecord> { self.records.lock().unwrap().clone() }

  pub fn preload(&self, transaction_id: &str) {
    self.records.lock().unwrap().push(DiscoveryRecord {
      transaction_id:           transaction_id.into(),
      patient_id:               "someone@ncg".into(),
      patient_reference_number: None,
    });
  }

  pub fn record(&self, record: DiscoveryRecord) { self.records.lock().unwrap().push(record); }
}

impl DiscoveryRequestStore for FakeRequests {
  type Error = FakeError;

  async fn exists(&self, transaction_id: &str) -> Result<bool, FakeError> {
    if self.hide_from_exists {
      return Ok(false);
    }
    Ok(self.records.lock().unwrap().iter().any(|r| r.transaction_id == transaction_id))
  }

  async fn exists_for(
    &self,
    transaction_id: &str,
    patient_id: &str,
    patient_reference_number: &str,
  ) -> Result<bool, FakeError> {
    Ok(self.records.lock().unwrap().iter().any(|r| {
      r.transaction_id == transaction_id
        && r.patient_id == patient_id
        && r.patient_reference_number.as_deref() == Some(patient_reference_number)
    }))
  }

  async fn add(&self, record: DiscoveryRecord) -> Result<bool, FakeError> {
    let mut records = self.records.lock().unwrap();
    if records.iter().any(|r| r.transaction_id == record.transaction_id) {
      return Ok(false);
    }
    records.push(record);
    Ok(true)
  }
}

#[derive(Default)]
pub struct FakeLinks {
  pub accounts: Vec<LinkedAccount>,
  pub fail:     bool,
  pub saved:    Mutex<Vec<LinkedAccount>>,
  pub requests: Mutex<HashMap<String, LinkRequest>>,
}

impl LinkStore for FakeLinks {
  type Error = FakeError;

  async fn linked_care_contexts(&self, patient_id: &str) -> Result<Vec<LinkedAccount>, FakeError> {
    if self.fail {
      return Err(FakeError);
    }
    Ok(
      self
        .accounts
        .iter()
        .filter(|a| a.patient_id == patient_id)
        .cloned()
        .collect(),
    )
  }

  async fn save_linked_account(&self, account: LinkedAccount) -> Result<(), FakeError> {
    self.saved.lock().unwrap().push(account);
    Ok(())
  }

  async fn save_link_request(&self, request: LinkRequest) -> Result<(), FakeError> {
    self
      .requests
      .lock()
      .unwrap()
      .insert(request.link_reference_number.clone(), request);
    Ok(())
  }

  async fn link_request(&self, reference: &str) -> Result<Option<LinkRequest>, FakeError> {
    Ok(self.requests.lock().unwrap().get(reference).cloned())
  }
}
