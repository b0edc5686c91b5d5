//! FHIR `Patient` resources as served by the OpenMRS fhir2 module, and their
//! mapping onto [`hip_core::patient::Patient`].

use hip_core::patient::{Gender, Patient};
use serde::Deserialize;

use crate::{Error, Result};

#[derive(Debug, Deserialize)]
pub struct Bundle {
  #[serde(default)]
  pub entry: Vec<BundleEntry>,
}

#[derive(Debug, Deserialize)]
pub struct BundleEntry {
  pub resource: FhirPatient,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FhirPatient {
  pub id:         Option<String>,
  #[serde(default)]
  pub name:       Vec<HumanName>,
  pub gender:     Option<String>,
  pub birth_date: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct HumanName {
  pub text:   Option<String>,
  #[serde(default)]
  pub given:  Vec<String>,
  pub family: Option<String>,
}

impl HumanName {
  fn display(&self) -> Option<String> {
    if let Some(text) = self.text.as_deref().filter(|t| !t.trim().is_empty()) {
      return Some(text.to_owned());
    }
    let parts: Vec<&str> = self
      .given
      .iter()
      .map(String::as_str)
      .chain(self.family.as_deref())
      .filter(|p| !p.trim().is_empty())
      .collect();
    (!parts.is_empty()).then(|| parts.join(" "))
  }
}

/// The FHIR code for a gender, as used in search parameters.
pub fn gender_code(gender: Gender) -> &'static str {
  match gender {
    Gender::M => "male",
    Gender::F => "female",
    Gender::O => "other",
    Gender::U => "unknown",
  }
}

fn parse_gender(code: &str) -> Option<Gender> {
  match code {
    "male" => Some(Gender::M),
    "female" => Some(Gender::F),
    "other" => Some(Gender::O),
    "unknown" => Some(Gender::U),
    _ => None,
  }
}

/// `YYYY`, `YYYY-MM`, and `YYYY-MM-DD` all start with the year.
fn birth_year(date: &str) -> Option<u16> { date.get(..4)?.parse().ok() }

impl TryFrom<FhirPatient> for Patient {
  type Error = Error;

  fn try_from(resource: FhirPatient) -> Result<Self> {
    let reference = resource
      .id
      .filter(|id| !id.is_empty())
      .ok_or_else(|| Error::Format("patient resource without id".into()))?;
    let name = resource.name.iter().find_map(HumanName::display).unwrap_or_default();

    let mut patient = Patient::new(reference, name);
    patient.gender = resource.gender.as_deref().and_then(parse_gender);
    patient.year_of_birth = resource.birth_date.as_deref().and_then(birth_year);
    Ok(patient)
  }
}
