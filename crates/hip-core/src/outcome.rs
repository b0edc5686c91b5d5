//! Engine outcomes and the closed error-code taxonomy reported to the gateway.

use serde::{Deserialize, Serialize};

/// Every way a discovery or link attempt can fail. The numeric value is the
/// `code` sent in the gateway envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorCode {
  NoPatientFound,
  MultiplePatientsFound,
  CareContextNotFound,
  LinkRequestNotFound,
  DiscoveryRequestNotFound,
  LinkRequestExpired,
  DuplicateDiscoveryRequest,
  FailedToGetLinkedCareContexts,
  OpenMrsConnection,
  CareContextConfiguration,
  ServerInternalError,
}

/// Status class of an assembled response. Kept free of any HTTP crate; the
/// API layer translates it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseStatus {
  Ok,
  BadRequest,
  NotFound,
  Conflict,
  InternalServerError,
}

impl ErrorCode {
  pub fn code(self) -> u16 {
    match self {
      Self::NoPatientFound => 1000,
      Self::MultiplePatientsFound => 1001,
      Self::CareContextNotFound => 1002,
      Self::LinkRequestNotFound => 1006,
      Self::DiscoveryRequestNotFound => 1007,
      Self::LinkRequestExpired => 1008,
      Self::DuplicateDiscoveryRequest => 1009,
      Self::FailedToGetLinkedCareContexts => 1010,
      Self::OpenMrsConnection => 1011,
      Self::CareContextConfiguration => 1012,
      Self::ServerInternalError => 1013,
    }
  }

  /// Message sent to the gateway. Connection and internal failures share a
  /// generic text so no upstream detail leaks out.
  pub fn message(self) -> &'static str {
    match self {
      Self::NoPatientFound => "No patient found",
      Self::MultiplePatientsFound => "Multiple patients found",
      Self::CareContextNotFound => "Care context not found",
      Self::LinkRequestNotFound => "No link request found",
      Self::DiscoveryRequestNotFound => "Discovery request not found",
      Self::LinkRequestExpired => "Link request expired",
      Self::DuplicateDiscoveryRequest => "Discovery request already exists",
      Self::FailedToGetLinkedCareContexts => {
        "Failed to get linked care contexts"
      }
      Self::CareContextConfiguration => {
        "HIP configuration error. If you encounter this issue repeatedly, \
         please report it."
      }
      Self::OpenMrsConnection | Self::ServerInternalError => {
        "Unreachable external service"
      }
    }
  }

  pub fn status(self) -> ResponseStatus {
    match self {
      Self::NoPatientFound
      | Self::MultiplePatientsFound
      | Self::CareContextNotFound
      | Self::LinkRequestNotFound
      | Self::DiscoveryRequestNotFound => ResponseStatus::NotFound,
      Self::DuplicateDiscoveryRequest => ResponseStatus::Conflict,
      Self::LinkRequestExpired => ResponseStatus::BadRequest,
      Self::FailedToGetLinkedCareContexts
      | Self::CareContextConfiguration
      | Self::OpenMrsConnection
      | Self::ServerInternalError => ResponseStatus::InternalServerError,
    }
  }
}

/// Result of one engine run: either the resolved value or exactly one
/// [`ErrorCode`].
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome<T> {
  Found(T),
  Failed(ErrorCode),
}

impl<T> Outcome<T> {
  pub fn is_found(&self) -> bool { matches!(self, Self::Found(_)) }

  pub fn error_code(&self) -> Option<ErrorCode> {
    match self {
      Self::Found(_) => None,
      Self::Failed(code) => Some(*code),
    }
  }
}
