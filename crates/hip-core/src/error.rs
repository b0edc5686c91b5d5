//! Error types for `hip-core`.

use thiserror::Error;

use crate::outcome::ErrorCode;

/// Infrastructure failure while running an engine. These never map to a
/// specific [`ErrorCode`]; the response assembler reports them as an internal
/// error without leaking the detail.
#[derive(Debug, Error)]
pub enum Error {
  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
  pub(crate) fn store<E>(e: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::Store(Box::new(e))
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Failure signalled by a hospital-side collaborator.
#[derive(Debug, Error)]
pub enum SourceError {
  /// The registry could not be reached or answered with a failure status.
  #[error("registry unreachable: {0}")]
  Connection(#[source] Box<dyn std::error::Error + Send + Sync>),

  /// The registry answered, but not in the shape we extract from.
  #[error("unexpected registry response: {0}")]
  Format(String),
}

impl SourceError {
  /// The outcome code a discovery or link attempt fails with when a
  /// collaborator reports this error.
  pub fn error_code(&self) -> ErrorCode {
    match self {
      Self::Connection(_) => ErrorCode::OpenMrsConnection,
      Self::Format(_) => ErrorCode::CareContextConfiguration,
    }
  }
}
