//! Persistence traits for discovery requests and consent links.
//!
//! Implemented by storage backends (e.g. `hip-store-sqlite`). The engines in
//! this crate depend on these abstractions, not on any concrete backend.

use std::future::Future;

use crate::link::{LinkRequest, LinkedAccount};

// ─── Records ─────────────────────────────────────────────────────────────────

/// Input to [`DiscoveryRequestStore::add`]. The store assigns the timestamp.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveryRecord {
  pub transaction_id:           String,
  pub patient_id:               String,
  /// Reference number of the patient chosen for this transaction; `None`
  /// when the attempt failed.
  pub patient_reference_number: Option<String>,
}

// ─── Traits ──────────────────────────────────────────────────────────────────

/// Records processed discovery transactions.
///
/// All methods return `Send` futures so implementations can be shared across
/// tokio worker tasks.
pub trait DiscoveryRequestStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Whether `transaction_id` has already been recorded.
  fn exists<'a>(
    &'a self,
    transaction_id: &'a str,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + 'a;

  /// Whether `transaction_id` was recorded for exactly this patient id and
  /// chosen reference number. Failed attempts never match. Used by the link
  /// flow.
  fn exists_for<'a>(
    &'a self,
    transaction_id: &'a str,
    patient_id: &'a str,
    patient_reference_number: &'a str,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + 'a;

  /// Record a processed transaction, successful or not.
  ///
  /// Insert-if-absent: returns `false` without writing when the transaction
  /// id is already present.
  fn add(
    &self,
    record: DiscoveryRecord,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;
}

/// Completed consent links and pending link requests.
pub trait LinkStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// All linked accounts for a consumer-side patient id, oldest first.
  fn linked_care_contexts<'a>(
    &'a self,
    patient_id: &'a str,
  ) -> impl Future<Output = Result<Vec<LinkedAccount>, Self::Error>> + Send + 'a;

  /// Persist the care contexts of a confirmed link. Contexts already linked
  /// for the same patient and reference are left as they are.
  fn save_linked_account(
    &self,
    account: LinkedAccount,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  fn save_link_request(
    &self,
    request: LinkRequest,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Retrieve a pending link request. Returns `None` if not found.
  fn link_request<'a>(
    &'a self,
    link_reference_number: &'a str,
  ) -> impl Future<Output = Result<Option<LinkRequest>, Self::Error>> + Send + 'a;
}
