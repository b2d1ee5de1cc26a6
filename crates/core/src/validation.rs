//! Input validation utilities.
//!
//! Field-level checks on configuration values, plus the cross-record reference checks used by
//! every module that links a record to another record owned by a patient.

use crate::constants::{MAX_SEQUENCE_PADDING, MAX_SEQUENCE_PREFIX_LEN};
use crate::error::{ClinicalError, ClinicalResult, ConstraintViolation};
use clinrec_uuid::RecordId;

/// Validates that a sequence prefix is safe to embed in human-readable identifiers.
///
/// - Bounds the length to avoid pathological inputs
/// - Restricts characters to ASCII alphanumerics, `-`, `_`, `/` and `.`
///
/// An empty prefix is allowed and yields bare numbers.
///
/// # Errors
///
/// Returns a `ClinicalError::InvalidInput` if the prefix is invalid.
pub fn validate_sequence_prefix(prefix: &str) -> ClinicalResult<()> {
    if prefix.len() > MAX_SEQUENCE_PREFIX_LEN {
        return Err(ClinicalError::InvalidInput(format!(
            "sequence prefix exceeds maximum length of {} characters",
            MAX_SEQUENCE_PREFIX_LEN
        )));
    }

    let ok = prefix.bytes().all(|b| {
        matches!(b, b'0'..=b'9' | b'a'..=b'z' | b'A'..=b'Z' | b'-' | b'_' | b'/' | b'.')
    });

    if !ok {
        return Err(ClinicalError::InvalidInput(
            "sequence prefix contains invalid characters (only alphanumeric, '-', '_', '/', '.' allowed)"
                .into(),
        ));
    }

    Ok(())
}

/// Validates a sequence zero-padding width.
pub fn validate_sequence_padding(padding: usize) -> ClinicalResult<()> {
    if padding > MAX_SEQUENCE_PADDING {
        return Err(ClinicalError::InvalidInput(format!(
            "sequence padding exceeds maximum of {}",
            MAX_SEQUENCE_PADDING
        )));
    }
    Ok(())
}

/// Checks that a record linked from `patient`'s record is owned by that same patient.
///
/// `model` and `id` name the linked record, `owner` is the patient it actually belongs to.
///
/// # Errors
///
/// Returns `ConstraintViolation::ForeignPatientReference` on mismatch.
pub fn ensure_same_patient(
    model: &'static str,
    id: &RecordId,
    owner: &RecordId,
    patient: &RecordId,
) -> ClinicalResult<()> {
    if owner != patient {
        return Err(ConstraintViolation::ForeignPatientReference {
            model,
            id: id.clone(),
            owner: owner.clone(),
            patient: patient.clone(),
        }
        .into());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sequence_prefix_accepts_common_forms() {
        for prefix in ["", "AMB-", "lab_", "IMG/2024/", "SUR.1"] {
            assert!(validate_sequence_prefix(prefix).is_ok(), "{prefix}");
        }
    }

    #[test]
    fn test_sequence_prefix_rejects_unsafe_characters() {
        for prefix in ["AMB ", "AMB\n", "AMB{}", "ÁMB"] {
            assert!(
                matches!(
                    validate_sequence_prefix(prefix),
                    Err(ClinicalError::InvalidInput(_))
                ),
                "{prefix:?}"
            );
        }
    }

    #[test]
    fn test_sequence_prefix_rejects_overlong() {
        let prefix = "A".repeat(MAX_SEQUENCE_PREFIX_LEN + 1);
        assert!(validate_sequence_prefix(&prefix).is_err());
    }

    #[test]
    fn test_sequence_padding_bounds() {
        assert!(validate_sequence_padding(0).is_ok());
        assert!(validate_sequence_padding(MAX_SEQUENCE_PADDING).is_ok());
        assert!(validate_sequence_padding(MAX_SEQUENCE_PADDING + 1).is_err());
    }

    #[test]
    fn test_ensure_same_patient() {
        let evaluation = RecordId::new();
        let patient = RecordId::new();
        let other = RecordId::new();

        assert!(ensure_same_patient("evaluation", &evaluation, &patient, &patient).is_ok());

        let err = ensure_same_patient("evaluation", &evaluation, &other, &patient).unwrap_err();
        assert_eq!(
            err.constraint(),
            Some(&ConstraintViolation::ForeignPatientReference {
                model: "evaluation",
                id: evaluation,
                owner: other,
                patient,
            })
        );
    }
}
