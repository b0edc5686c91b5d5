//! The demographic match rule applied to registry candidates.
//!
//! A candidate matches when its name equals the queried name **or** its
//! gender equals the queried gender. Year of birth only narrows the registry
//! search and is not re-checked here.

use std::collections::BTreeSet;

use crate::patient::{MatchField, Patient, PatientQuery};

/// Fields of `query` that `candidate` matches.
pub fn matched_fields(candidate: &Patient, query: &PatientQuery) -> BTreeSet<MatchField> {
  let mut fields = BTreeSet::new();

  if let Some(name) = query.name.as_deref().filter(|n| !n.trim().is_empty())
    && names_equal(name, &candidate.name)
  {
    fields.insert(MatchField::Name);
  }

  if let Some(gender) = query.gender
    && candidate.gender == Some(gender)
  {
    fields.insert(MatchField::Gender);
  }

  fields
}

/// Keep only candidates that match, with `matched_fields` recomputed.
pub fn select(candidates: Vec<Patient>, query: &PatientQuery) -> Vec<Patient> {
  candidates
    .into_iter()
    .filter_map(|candidate| {
      let fields = matched_fields(&candidate, query);
      (!fields.is_empty()).then(|| candidate.with_matched_fields(fields))
    })
    .collect()
}

fn names_equal(a: &str, b: &str) -> bool {
  a.trim().to_lowercase() == b.trim().to_lowercase()
}
