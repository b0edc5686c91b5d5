//! Registry endpoints, relative to the configured OpenMRS base URL.

pub const PATIENT: &str = "ws/fhir2/Patient";
pub const PROGRAM_ENROLLMENT: &str = "ws/rest/v1/bahmniprogramenrollment";
pub const VISIT: &str = "ws/rest/v1/visit";
pub const CONDITION_HISTORY: &str = "ws/rest/emrapi/conditionhistory";
