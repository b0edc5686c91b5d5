//! OpenMRS/Bahmni adapters for the HIP bridge.
//!
//! [`OpenMrsClient`] talks to the registry over HTTP; the adapters on top of
//! it implement the collaborator traits from `hip-core`.

mod care_context;
mod client;
mod dataflow;
mod directory;
mod fhir;
mod matching;
mod paths;
mod rest;

pub mod error;

pub use care_context::OpenMrsCareContexts;
pub use client::{OpenMrsClient, OpenMrsConfig};
pub use dataflow::OpenMrsDataFlow;
pub use directory::OpenMrsDirectory;
pub use error::{Error, Result};
pub use matching::OpenMrsPatientMatching;

#[cfg(test)]
mod testing;
