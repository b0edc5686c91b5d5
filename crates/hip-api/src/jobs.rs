//! Accepted requests waiting for the background worker.

use hip_core::{
  link::{LinkConfirmation, LinkEnquiry},
  patient::DiscoveryRequest,
};
use tokio::sync::mpsc::{self, error::TrySendError};

use crate::error::ApiError;

/// One unit of work; its result goes back to the gateway as a callback.
#[derive(Debug, Clone, PartialEq)]
pub enum Job {
  Discover(DiscoveryRequest),
  LinkInit(LinkEnquiry),
  LinkConfirm(LinkConfirmation),
}

/// Bounded hand-off from the HTTP handlers to the worker.
#[derive(Clone)]
pub struct JobQueue {
  tx: mpsc::Sender<Job>,
}

impl JobQueue {
  /// A queue holding at most `capacity` pending jobs, and its receiving end.
  /// A capacity of zero is raised to one.
  pub fn bounded(capacity: usize) -> (Self, mpsc::Receiver<Job>) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    (Self { tx }, rx)
  }

  /// Enqueue without waiting. A full queue is reported rather than awaited
  /// so the gateway gets an answer promptly.
  pub fn submit(&self, job: Job) -> Result<(), ApiError> {
    self.tx.try_send(job).map_err(|e| match e {
      TrySendError::Full(_) => ApiError::Unavailable("job queue is full".into()),
      TrySendError::Closed(_) => ApiError::Unavailable("worker is not running".into()),
    })
  }
}
