//! Error type for `hip-openmrs`.

use hip_core::SourceError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("http transport error: {0}")]
  Transport(#[from] reqwest::Error),

  #[error("openmrs answered {status}: {body}")]
  UnexpectedStatus { status: u16, body: String },

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("malformed registry data: {0}")]
  Format(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

impl From<Error> for SourceError {
  fn from(e: Error) -> Self {
    match e {
      Error::Transport(_) | Error::UnexpectedStatus { .. } => {
        SourceError::Connection(Box::new(e))
      }
      Error::Json(e) => SourceError::Format(e.to_string()),
      Error::Format(message) => SourceError::Format(message),
    }
  }
}
