use crate::orders::OrderState;
use clinrec_uuid::RecordId;

/// Record-level validation failures.
///
/// Every variant is raised before the offending write reaches the store (or by the store
/// itself for unique keys), so a rejected write never leaves partial state behind.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConstraintViolation {
    #[error("our records indicate that patient {patient} is already pregnant")]
    PatientAlreadyPregnant { patient: RecordId },

    #[error("{model}: unique key '{key}' is already taken")]
    DuplicateKey { model: &'static str, key: String },

    #[error("{model}.{field} is required")]
    MissingField {
        model: &'static str,
        field: &'static str,
    },

    #[error("referenced {model} record {id} does not exist")]
    MissingReference { model: &'static str, id: RecordId },

    #[error("{model} {id} belongs to patient {owner}, not patient {patient}")]
    ForeignPatientReference {
        model: &'static str,
        id: RecordId,
        owner: RecordId,
        patient: RecordId,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum ClinicalError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("constraint violation: {0}")]
    Constraint(#[from] ConstraintViolation),

    #[error("{model} {id} cannot move from '{from}' to '{to}'")]
    IllegalStateTransition {
        model: &'static str,
        id: RecordId,
        from: OrderState,
        to: OrderState,
    },

    #[error("{model} record not found: {id}")]
    RecordNotFound { model: &'static str, id: RecordId },

    #[error("no health professional is associated with the acting user")]
    NoHealthProfessional,

    #[error("failed to serialize record: {0}")]
    Serialization(serde_json::Error),
    #[error("failed to deserialize record: {0}")]
    Deserialization(serde_json::Error),

    #[error("record store error: {0}")]
    Storage(String),
    #[error("sequence error: {0}")]
    Sequence(String),

    #[error("catalogue error: {0}")]
    Catalogue(String),
    #[error("failed to read file: {0}")]
    FileRead(std::io::Error),

    #[error("text error: {0}")]
    Text(#[from] clinrec_types::TextError),
    #[error("record id error: {0}")]
    Uuid(#[from] clinrec_uuid::UuidError),
}

impl ClinicalError {
    /// Returns the constraint violation carried by this error, if any.
    pub fn constraint(&self) -> Option<&ConstraintViolation> {
        match self {
            ClinicalError::Constraint(violation) => Some(violation),
            _ => None,
        }
    }
}

pub type ClinicalResult<T> = std::result::Result<T, ClinicalError>;
