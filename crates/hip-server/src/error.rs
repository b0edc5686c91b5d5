//! Error type for gateway delivery.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("gateway transport error: {0}")]
  Transport(#[from] reqwest::Error),

  #[error("gateway answered {status}: {body}")]
  GatewayStatus { status: u16, body: String },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
