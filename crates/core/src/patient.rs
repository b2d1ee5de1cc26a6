//! Patients and generic patient evaluations.
//!
//! Every other module hangs its records off a [`Patient`]; history records and prenatal
//! evaluations may additionally link a [`PatientEvaluation`] of that same patient.

use crate::context::CoreContext;
use crate::error::ClinicalResult;
use crate::store::{Model, Stored};
use crate::NonEmptyText;
use chrono::{NaiveDate, NaiveDateTime};
use clinrec_uuid::RecordId;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Patient {
    pub name: NonEmptyText,
    #[serde(default)]
    pub date_of_birth: Option<NaiveDate>,
}

impl Model for Patient {
    const MODEL: &'static str = "patient";
}

/// A generic encounter evaluation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PatientEvaluation {
    pub patient: RecordId,
    pub evaluation_start: NaiveDateTime,
    #[serde(default)]
    pub health_professional: Option<RecordId>,
}

impl Model for PatientEvaluation {
    const MODEL: &'static str = "patient.evaluation";
}

/// Pure patient data operations - no API concerns
#[derive(Clone)]
pub struct PatientService {
    ctx: CoreContext,
}

impl PatientService {
    pub fn new(ctx: CoreContext) -> Self {
        Self { ctx }
    }

    pub fn register(
        &self,
        name: NonEmptyText,
        date_of_birth: Option<NaiveDate>,
    ) -> ClinicalResult<Stored<Patient>> {
        let stored = self.ctx.records().create(&Patient {
            name,
            date_of_birth,
        })?;
        tracing::info!("registered patient {}", stored.id);
        Ok(stored)
    }

    pub fn get(&self, id: &RecordId) -> ClinicalResult<Patient> {
        self.ctx.records().get(id)
    }

    /// Open an evaluation for `patient`.
    ///
    /// `start` defaults to now and the health professional to the acting professional.
    ///
    /// # Errors
    ///
    /// Returns `ConstraintViolation::MissingReference` if the patient does not exist.
    pub fn record_evaluation(
        &self,
        patient: &RecordId,
        start: Option<NaiveDateTime>,
    ) -> ClinicalResult<Stored<PatientEvaluation>> {
        let records = self.ctx.records();
        records.reference::<Patient>(patient)?;

        let stored = records.create(&PatientEvaluation {
            patient: patient.clone(),
            evaluation_start: start.unwrap_or_else(|| self.ctx.now()),
            health_professional: self.ctx.acting_professional().cloned(),
        })?;
        tracing::info!("opened evaluation {} for patient {}", stored.id, patient);
        Ok(stored)
    }

    pub fn evaluation(&self, id: &RecordId) -> ClinicalResult<PatientEvaluation> {
        self.ctx.records().get(id)
    }
}
