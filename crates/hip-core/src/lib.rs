//! Core types, collaborator traits, and engines for the HIP bridge.
//!
//! No HTTP or database code lives here. The OpenMRS adapters, the SQLite
//! store, and the gateway-facing API all depend on this crate.

pub mod dataflow;
pub mod discovery;
pub mod error;
pub mod filter;
pub mod gateway;
pub mod link;
pub mod linking;
pub mod outcome;
pub mod patient;
pub mod source;
pub mod store;

pub use error::{Error, Result, SourceError};
pub use outcome::{ErrorCode, Outcome};

#[cfg(test)]
mod fakes;
