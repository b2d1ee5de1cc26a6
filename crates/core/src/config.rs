//! Core runtime configuration.
//!
//! This module defines configuration that should be resolved once at process startup and then
//! passed into core services. The intent is to avoid reading process-wide environment variables
//! during request handling, which can lead to inconsistent behaviour in multi-threaded runtimes
//! and test harnesses. Binaries read the environment and hand the raw values to the
//! `*_from_env_value` helpers below.

use crate::constants::{
    DEFAULT_AMBULATORY_CARE_PREFIX, DEFAULT_IMAGING_REQUEST_PREFIX, DEFAULT_LAB_REQUEST_PREFIX,
    DEFAULT_LAB_TEST_PREFIX, DEFAULT_SEQUENCE_PADDING, DEFAULT_SURGERY_PREFIX,
};
use crate::validation::{validate_sequence_padding, validate_sequence_prefix};
use crate::{ClinicalError, ClinicalResult};

/// The named sequences used for human-readable record numbering.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SequenceKind {
    AmbulatoryCare,
    ImagingRequest,
    LabRequest,
    LabTest,
    Surgery,
}

impl SequenceKind {
    pub const ALL: [SequenceKind; 5] = [
        SequenceKind::AmbulatoryCare,
        SequenceKind::ImagingRequest,
        SequenceKind::LabRequest,
        SequenceKind::LabTest,
        SequenceKind::Surgery,
    ];

    /// Name under which the sequence generator tracks this sequence.
    pub fn name(&self) -> &'static str {
        match self {
            SequenceKind::AmbulatoryCare => "ambulatory_care",
            SequenceKind::ImagingRequest => "imaging_request",
            SequenceKind::LabRequest => "lab_request",
            SequenceKind::LabTest => "lab_test",
            SequenceKind::Surgery => "surgery",
        }
    }

    /// Environment variable holding the prefix override, e.g. `CLINREC_LAB_TEST_PREFIX`.
    pub fn prefix_env_var(&self) -> String {
        format!("CLINREC_{}_PREFIX", self.name().to_ascii_uppercase())
    }

    fn default_prefix(&self) -> &'static str {
        match self {
            SequenceKind::AmbulatoryCare => DEFAULT_AMBULATORY_CARE_PREFIX,
            SequenceKind::ImagingRequest => DEFAULT_IMAGING_REQUEST_PREFIX,
            SequenceKind::LabRequest => DEFAULT_LAB_REQUEST_PREFIX,
            SequenceKind::LabTest => DEFAULT_LAB_TEST_PREFIX,
            SequenceKind::Surgery => DEFAULT_SURGERY_PREFIX,
        }
    }
}

/// How values from one sequence are rendered into identifiers.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SequencePolicy {
    prefix: String,
    padding: usize,
}

impl SequencePolicy {
    /// Create a validated policy.
    ///
    /// # Errors
    ///
    /// Returns `ClinicalError::InvalidInput` if the prefix contains unsafe characters or the
    /// padding is out of range.
    pub fn new(prefix: impl Into<String>, padding: usize) -> ClinicalResult<Self> {
        let prefix = prefix.into();
        validate_sequence_prefix(&prefix)?;
        validate_sequence_padding(padding)?;
        Ok(Self { prefix, padding })
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn padding(&self) -> usize {
        self.padding
    }

    /// Render a raw sequence value, e.g. `42` -> `LAB-000042`.
    pub fn format(&self, value: u64) -> String {
        format!("{}{:0width$}", self.prefix, value, width = self.padding)
    }
}

/// Core configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct CoreConfig {
    ambulatory_care: SequencePolicy,
    imaging_request: SequencePolicy,
    lab_request: SequencePolicy,
    lab_test: SequencePolicy,
    surgery: SequencePolicy,
}

impl Default for CoreConfig {
    fn default() -> Self {
        let policy = |kind: SequenceKind| SequencePolicy {
            prefix: kind.default_prefix().to_string(),
            padding: DEFAULT_SEQUENCE_PADDING,
        };
        Self {
            ambulatory_care: policy(SequenceKind::AmbulatoryCare),
            imaging_request: policy(SequenceKind::ImagingRequest),
            lab_request: policy(SequenceKind::LabRequest),
            lab_test: policy(SequenceKind::LabTest),
            surgery: policy(SequenceKind::Surgery),
        }
    }
}

impl CoreConfig {
    /// Create a `CoreConfig` from a lookup of raw (environment) values.
    ///
    /// `lookup` receives variable names such as `CLINREC_SEQUENCE_PADDING` and
    /// `CLINREC_LAB_TEST_PREFIX`; missing values fall back to defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> ClinicalResult<Self> {
        let padding = sequence_padding_from_env_value(lookup("CLINREC_SEQUENCE_PADDING"))?;
        let mut cfg = Self::default();
        for kind in SequenceKind::ALL {
            let prefix = sequence_prefix_from_env_value(kind, lookup(&kind.prefix_env_var()));
            cfg = cfg.with_policy(kind, SequencePolicy::new(prefix, padding)?);
        }
        Ok(cfg)
    }

    /// Replace the policy for one sequence.
    pub fn with_policy(mut self, kind: SequenceKind, policy: SequencePolicy) -> Self {
        match kind {
            SequenceKind::AmbulatoryCare => self.ambulatory_care = policy,
            SequenceKind::ImagingRequest => self.imaging_request = policy,
            SequenceKind::LabRequest => self.lab_request = policy,
            SequenceKind::LabTest => self.lab_test = policy,
            SequenceKind::Surgery => self.surgery = policy,
        }
        self
    }

    pub fn sequence_policy(&self, kind: SequenceKind) -> &SequencePolicy {
        match kind {
            SequenceKind::AmbulatoryCare => &self.ambulatory_care,
            SequenceKind::ImagingRequest => &self.imaging_request,
            SequenceKind::LabRequest => &self.lab_request,
            SequenceKind::LabTest => &self.lab_test,
            SequenceKind::Surgery => &self.surgery,
        }
    }
}

/// Parse the sequence padding from an optional string value.
///
/// If `value` is `None` or empty/whitespace, returns the default padding.
pub fn sequence_padding_from_env_value(value: Option<String>) -> ClinicalResult<usize> {
    let value = value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty());
    let parsed = value
        .map(|v| {
            v.parse::<usize>().map_err(|_| {
                ClinicalError::InvalidInput(format!("sequence padding is not a number: '{v}'"))
            })
        })
        .transpose()?;

    Ok(parsed.unwrap_or(DEFAULT_SEQUENCE_PADDING))
}

/// Resolve the prefix for `kind` from an optional string value.
///
/// `None` means "use the default"; an explicitly empty value yields no prefix at all.
pub fn sequence_prefix_from_env_value(kind: SequenceKind, value: Option<String>) -> String {
    match value {
        Some(v) => v.trim().to_string(),
        None => kind.default_prefix().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_policies() {
        let cfg = CoreConfig::default();
        assert_eq!(
            cfg.sequence_policy(SequenceKind::AmbulatoryCare).format(42),
            "AMB-000042"
        );
        assert_eq!(
            cfg.sequence_policy(SequenceKind::LabTest).format(1),
            "LAB-000001"
        );
    }

    #[test]
    fn test_format_does_not_truncate_wide_values() {
        let policy = SequencePolicy::new("S", 2).unwrap();
        assert_eq!(policy.format(12345), "S12345");
    }

    #[test]
    fn test_from_lookup_applies_overrides() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("CLINREC_SEQUENCE_PADDING", "4"),
            ("CLINREC_IMAGING_REQUEST_PREFIX", "IMG/"),
            ("CLINREC_SURGERY_PREFIX", ""),
        ]);
        let cfg = CoreConfig::from_lookup(|k| env.get(k).map(|v| v.to_string())).unwrap();

        assert_eq!(
            cfg.sequence_policy(SequenceKind::ImagingRequest).format(7),
            "IMG/0007"
        );
        assert_eq!(cfg.sequence_policy(SequenceKind::Surgery).format(7), "0007");
        assert_eq!(
            cfg.sequence_policy(SequenceKind::LabRequest).format(7),
            "LABREQ-0007"
        );
    }

    #[test]
    fn test_from_lookup_rejects_bad_values() {
        let bad_padding = CoreConfig::from_lookup(|k| {
            (k == "CLINREC_SEQUENCE_PADDING").then(|| "six".to_string())
        });
        assert!(matches!(bad_padding, Err(ClinicalError::InvalidInput(_))));

        let bad_prefix = CoreConfig::from_lookup(|k| {
            (k == "CLINREC_LAB_TEST_PREFIX").then(|| "LAB TEST".to_string())
        });
        assert!(matches!(bad_prefix, Err(ClinicalError::InvalidInput(_))));
    }

    #[test]
    fn test_sequence_padding_from_env_value_defaults() {
        assert_eq!(
            sequence_padding_from_env_value(None).unwrap(),
            DEFAULT_SEQUENCE_PADDING
        );
        assert_eq!(
            sequence_padding_from_env_value(Some("  ".into())).unwrap(),
            DEFAULT_SEQUENCE_PADDING
        );
        assert_eq!(sequence_padding_from_env_value(Some(" 3 ".into())).unwrap(), 3);
    }

    #[test]
    fn test_prefix_env_var_names() {
        assert_eq!(
            SequenceKind::AmbulatoryCare.prefix_env_var(),
            "CLINREC_AMBULATORY_CARE_PREFIX"
        );
    }
}
