//! Constants used throughout the clinical records core.

/// Days from the last menstrual period to the estimated due date (Naegele's rule).
pub const PREGNANCY_DURATION_DAYS: u64 = 280;

/// Days per gestational week.
pub const DAYS_PER_WEEK: i64 = 7;

/// Default zero-padding applied to sequence numbers (`AMB-000042`).
pub const DEFAULT_SEQUENCE_PADDING: usize = 6;

/// Upper bound on configured sequence padding.
pub const MAX_SEQUENCE_PADDING: usize = 12;

/// Upper bound on configured sequence prefix length.
pub const MAX_SEQUENCE_PREFIX_LEN: usize = 16;

/// Default prefix for ambulatory care session identifiers.
pub const DEFAULT_AMBULATORY_CARE_PREFIX: &str = "AMB-";

/// Default prefix for imaging request numbers.
pub const DEFAULT_IMAGING_REQUEST_PREFIX: &str = "IMGREQ-";

/// Default prefix for lab request numbers.
pub const DEFAULT_LAB_REQUEST_PREFIX: &str = "LABREQ-";

/// Default prefix for lab test identifiers.
pub const DEFAULT_LAB_TEST_PREFIX: &str = "LAB-";

/// Default prefix for surgery codes.
pub const DEFAULT_SURGERY_PREFIX: &str = "SUR-";

/// Marker reported as the age at surgery when the patient has no date of birth.
pub const NO_DOB_MARKER: &str = "No DoB !";

/// Marker reported as the age at surgery when the surgery has no date.
pub const NO_SURGERY_DATE_MARKER: &str = "No Surgery Date !";
