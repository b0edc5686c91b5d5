//! Shapes of the OpenMRS REST (`ws/rest`) responses we read.
//!
//! Only the fields the adapters use are modelled; a response missing one of
//! them fails to decode and surfaces as a format error.

use serde::Deserialize;

/// The `{ "results": [...] }` wrapper around REST listings.
#[derive(Debug, Deserialize)]
pub struct Results<T> {
  pub results: Vec<T>,
}

#[derive(Debug, Deserialize)]
pub struct ProgramEnrollment {
  pub uuid:    String,
  pub display: String,
}

#[derive(Debug, Deserialize)]
pub struct Display {
  pub display: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Visit {
  pub visit_type: Display,
  #[serde(default)]
  pub encounters: Vec<Encounter>,
}

impl Visit {
  pub fn type_display(&self) -> Option<&str> { self.visit_type.display.as_deref() }
}

#[derive(Debug, Deserialize)]
pub struct Encounter {
  #[serde(default)]
  pub obs:    Vec<Obs>,
  #[serde(default)]
  pub orders: Vec<Order>,
}

#[derive(Debug, Deserialize)]
pub struct Obs {
  pub uuid:    String,
  pub display: String,
}

#[derive(Debug, Deserialize)]
pub struct Order {
  pub uuid:    String,
  pub display: String,
  #[serde(rename = "type")]
  pub kind:    String,
}

/// One entry of the `conditionhistory` array.
#[derive(Debug, Deserialize)]
pub struct ConditionHistory {
  pub conditions: Vec<RawCondition>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawCondition {
  pub uuid:                String,
  pub concept:             RawConcept,
  pub condition_non_coded: Option<String>,
  pub status:              String,
  /// Milliseconds since the Unix epoch.
  pub on_set_date:         i64,
}

#[derive(Debug, Deserialize)]
pub struct RawConcept {
  pub uuid: String,
  pub name: String,
}
