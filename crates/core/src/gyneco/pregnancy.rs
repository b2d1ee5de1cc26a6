//! Pregnancy records and the single-current-pregnancy rule.

use crate::context::CoreContext;
use crate::error::{ClinicalResult, ConstraintViolation};
use crate::gestation::{due_date, end_of_pregnancy_weeks};
use crate::patient::Patient;
use crate::store::{Model, Stored};
use chrono::{NaiveDate, NaiveDateTime};
use clinrec_uuid::RecordId;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PregnancyEndResult {
    LiveBirth,
    Abortion,
    Stillbirth,
    StatusUnknown,
}

/// Intrauterine growth restriction pattern.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Iugr {
    Symmetric,
    Asymmetric,
}

fn default_true() -> bool {
    true
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Pregnancy {
    pub patient: RecordId,
    /// Pregnancy number; unique per patient.
    pub gravida: u32,
    /// Last menstrual period.
    pub lmp: NaiveDate,
    #[serde(default)]
    pub warning: bool,
    #[serde(default = "default_true")]
    pub current_pregnancy: bool,
    #[serde(default)]
    pub fetuses: Option<u32>,
    #[serde(default)]
    pub monozygotic: bool,
    #[serde(default)]
    pub iugr: Option<Iugr>,
    #[serde(default)]
    pub pregnancy_end_result: Option<PregnancyEndResult>,
    #[serde(default)]
    pub pregnancy_end_date: Option<NaiveDateTime>,
}

impl Model for Pregnancy {
    const MODEL: &'static str = "patient.pregnancy";

    fn unique_key(&self) -> Option<String> {
        Some(format!("{}:{}", self.patient, self.gravida))
    }
}

impl Pregnancy {
    /// A current pregnancy starting at `lmp`.
    pub fn new(patient: RecordId, gravida: u32, lmp: NaiveDate) -> Self {
        Self {
            patient,
            gravida,
            lmp,
            warning: false,
            current_pregnancy: true,
            fetuses: None,
            monozygotic: false,
            iugr: None,
            pregnancy_end_result: None,
            pregnancy_end_date: None,
        }
    }

    /// Probable date of delivery.
    pub fn pdd(&self) -> Option<NaiveDate> {
        due_date(self.lmp)
    }

    /// Weeks of gestation at the end of the pregnancy, 0 while it has not ended.
    pub fn end_age_weeks(&self) -> i64 {
        end_of_pregnancy_weeks(self.lmp, self.pregnancy_end_date)
    }

    /// Field-level checks that do not depend on other records.
    pub fn validate(&self) -> ClinicalResult<()> {
        if !self.current_pregnancy {
            if self.pregnancy_end_result.is_none() {
                return Err(ConstraintViolation::MissingField {
                    model: Self::MODEL,
                    field: "pregnancy_end_result",
                }
                .into());
            }
            if self.pregnancy_end_date.is_none() {
                return Err(ConstraintViolation::MissingField {
                    model: Self::MODEL,
                    field: "pregnancy_end_date",
                }
                .into());
            }
        }
        Ok(())
    }
}

/// Checks that writing `proposed` leaves its patient with at most one current pregnancy.
///
/// `id` identifies the record being replaced on update (`None` on create); that record's
/// stored version is ignored among `existing` since `proposed` supersedes it.
///
/// # Errors
///
/// Returns `ConstraintViolation::PatientAlreadyPregnant` if the write would leave more than
/// one current pregnancy.
pub fn check_single_current_pregnancy(
    proposed: &Pregnancy,
    id: Option<&RecordId>,
    existing: &[Stored<Pregnancy>],
) -> ClinicalResult<()> {
    if !proposed.current_pregnancy {
        return Ok(());
    }

    let current_after_write = 1 + existing
        .iter()
        .filter(|s| Some(&s.id) != id)
        .filter(|s| s.record.patient == proposed.patient && s.record.current_pregnancy)
        .count();

    if current_after_write > 1 {
        return Err(ConstraintViolation::PatientAlreadyPregnant {
            patient: proposed.patient.clone(),
        }
        .into());
    }
    Ok(())
}

#[derive(Clone)]
pub struct PregnancyService {
    ctx: CoreContext,
}

impl PregnancyService {
    pub fn new(ctx: CoreContext) -> Self {
        Self { ctx }
    }

    /// Create a pregnancy record.
    ///
    /// # Errors
    ///
    /// Returns a `ConstraintViolation` if the patient does not exist, the gravida number is
    /// already used for that patient, the patient already has a current pregnancy, or the
    /// end fields of an ended pregnancy are missing.
    pub fn create(&self, pregnancy: Pregnancy) -> ClinicalResult<Stored<Pregnancy>> {
        let _guard = self.ctx.write_guard()?;
        let records = self.ctx.records();
        records.reference::<Patient>(&pregnancy.patient)?;
        pregnancy.validate()?;

        let siblings = self.list_for_patient(&pregnancy.patient)?;
        if let Err(err) = check_single_current_pregnancy(&pregnancy, None, &siblings) {
            tracing::warn!("rejected pregnancy for patient {}: {}", pregnancy.patient, err);
            return Err(err);
        }

        let stored = records.create(&pregnancy)?;
        tracing::info!(
            "created pregnancy {} (gravida {}) for patient {}",
            stored.id,
            stored.record.gravida,
            stored.record.patient
        );
        Ok(stored)
    }

    /// Replace a pregnancy record, re-checking every constraint against the new values.
    pub fn update(&self, id: &RecordId, pregnancy: Pregnancy) -> ClinicalResult<Stored<Pregnancy>> {
        let _guard = self.ctx.write_guard()?;
        let records = self.ctx.records();
        records.get::<Pregnancy>(id)?;
        records.reference::<Patient>(&pregnancy.patient)?;
        pregnancy.validate()?;

        let siblings = self.list_for_patient(&pregnancy.patient)?;
        if let Err(err) = check_single_current_pregnancy(&pregnancy, Some(id), &siblings) {
            tracing::warn!("rejected update of pregnancy {}: {}", id, err);
            return Err(err);
        }

        records.write(id, &pregnancy)?;
        tracing::info!("updated pregnancy {}", id);
        Ok(Stored {
            id: id.clone(),
            record: pregnancy,
        })
    }

    pub fn get(&self, id: &RecordId) -> ClinicalResult<Pregnancy> {
        self.ctx.records().get(id)
    }

    pub fn list_for_patient(&self, patient: &RecordId) -> ClinicalResult<Vec<Stored<Pregnancy>>> {
        self.ctx
            .records()
            .search::<Pregnancy>(|p| &p.patient == patient)
    }

    /// Whether any of the patient's pregnancies is marked current.
    pub fn currently_pregnant(&self, patient: &RecordId) -> ClinicalResult<bool> {
        Ok(self
            .list_for_patient(patient)?
            .iter()
            .any(|p| p.record.current_pregnancy))
    }
}
