//! Surgeries, their pre-operative checklist and cardiac risk assessments.

pub mod rcri;

pub use rcri::{CardiacRiskFactors, Rcri, RcriClass};

use crate::config::SequenceKind;
use crate::constants::{NO_DOB_MARKER, NO_SURGERY_DATE_MARKER};
use crate::context::CoreContext;
use crate::error::ClinicalResult;
use crate::patient::Patient;
use crate::store::{Model, Stored};
use crate::validation::ensure_same_patient;
use crate::NonEmptyText;
use chrono::{Datelike, Months, NaiveDate, NaiveDateTime};
use clinrec_uuid::RecordId;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SurgeryClassification {
    Optional,
    Required,
    Urgent,
    Emergency,
}

/// Airway visibility class.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Mallampati {
    #[serde(rename = "Class 1")]
    Class1,
    #[serde(rename = "Class 2")]
    Class2,
    #[serde(rename = "Class 3")]
    Class3,
    #[serde(rename = "Class 4")]
    Class4,
}

/// ASA physical status.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AsaStatus {
    Ps1,
    Ps2,
    Ps3,
    Ps4,
    Ps5,
    Ps6,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreopChecklist {
    pub preop_mallampati: Option<Mallampati>,
    /// Risk of losing more than 500 ml (adults) or 7 ml/kg (infants).
    pub preop_bleeding_risk: bool,
    pub preop_oximeter: bool,
    pub preop_site_marking: bool,
    /// Prophylaxis within the last 60 minutes.
    pub preop_antibiotics: bool,
    pub preop_sterility: bool,
    pub preop_asa: Option<AsaStatus>,
    pub preop_rcri: Option<RecordId>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SurgicalProcedure {
    pub procedure: NonEmptyText,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Surgery {
    pub patient: RecordId,
    #[serde(default)]
    pub admission: Option<RecordId>,
    #[serde(default)]
    pub operating_room: Option<RecordId>,
    /// Base condition.
    #[serde(default)]
    pub pathology: Option<RecordId>,
    /// Health-center unique code. Issued from the `surgery` sequence when left unset.
    #[serde(default)]
    pub code: Option<String>,
    pub description: NonEmptyText,
    #[serde(default)]
    pub classification: Option<SurgeryClassification>,
    #[serde(default)]
    pub surgeon: Option<RecordId>,
    #[serde(default)]
    pub anesthetist: Option<RecordId>,
    #[serde(default)]
    pub surgery_date: Option<NaiveDateTime>,
    /// Free-text estimate kept for historical records without a surgery date.
    #[serde(default)]
    pub age: Option<String>,
    #[serde(flatten)]
    pub preop: PreopChecklist,
    #[serde(default)]
    pub extra_info: Option<String>,
    #[serde(default)]
    pub procedures: Vec<SurgicalProcedure>,
}

impl Model for Surgery {
    const MODEL: &'static str = "surgery";

    fn unique_key(&self) -> Option<String> {
        self.code.clone()
    }
}

impl Surgery {
    pub fn new(patient: RecordId, description: NonEmptyText) -> Self {
        Self {
            patient,
            admission: None,
            operating_room: None,
            pathology: None,
            code: None,
            description,
            classification: None,
            surgeon: None,
            anesthetist: None,
            surgery_date: None,
            age: None,
            preop: PreopChecklist::default(),
            extra_info: None,
            procedures: Vec::new(),
        }
    }
}

/// Calendar difference between two dates in years, months and days.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct CalendarAge {
    pub years: i32,
    pub months: i32,
    pub days: i32,
}

impl CalendarAge {
    /// Whole months are counted first (clamping to month ends), then the remaining days.
    ///
    /// A `to` earlier than `from` yields all-negative components.
    pub fn between(from: NaiveDate, to: NaiveDate) -> Self {
        if to < from {
            let age = Self::between(to, from);
            return Self {
                years: -age.years,
                months: -age.months,
                days: -age.days,
            };
        }

        let mut months = (to.year() - from.year()) * 12 + to.month() as i32 - from.month() as i32;
        let shifted = |months: i32| from.checked_add_months(Months::new(months.max(0) as u32));
        while months > 0 && shifted(months).is_none_or(|d| d > to) {
            months -= 1;
        }
        let anchor = shifted(months).unwrap_or(from);

        Self {
            years: months / 12,
            months: months % 12,
            days: (to - anchor).num_days() as i32,
        }
    }
}

impl fmt::Display for CalendarAge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}y {}m {}d", self.years, self.months, self.days)
    }
}

/// Patient age at the moment of surgery.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AgeAtSurgery {
    Age(CalendarAge),
    NoDateOfBirth,
    NoSurgeryDate,
}

impl AgeAtSurgery {
    pub fn compute(date_of_birth: Option<NaiveDate>, surgery_date: Option<NaiveDateTime>) -> Self {
        match (date_of_birth, surgery_date) {
            (None, _) => AgeAtSurgery::NoDateOfBirth,
            (Some(_), None) => AgeAtSurgery::NoSurgeryDate,
            (Some(dob), Some(at)) => AgeAtSurgery::Age(CalendarAge::between(dob, at.date())),
        }
    }
}

impl fmt::Display for AgeAtSurgery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AgeAtSurgery::Age(age) => age.fmt(f),
            AgeAtSurgery::NoDateOfBirth => f.write_str(NO_DOB_MARKER),
            AgeAtSurgery::NoSurgeryDate => f.write_str(NO_SURGERY_DATE_MARKER),
        }
    }
}

#[derive(Clone)]
pub struct SurgeryService {
    ctx: CoreContext,
}

impl SurgeryService {
    pub fn new(ctx: CoreContext) -> Self {
        Self { ctx }
    }

    /// Record an RCRI assessment.
    ///
    /// `rcri_date` defaults to now and the health professional to the acting professional.
    pub fn assess_cardiac_risk(
        &self,
        patient: &RecordId,
        rcri_date: Option<NaiveDateTime>,
        factors: CardiacRiskFactors,
    ) -> ClinicalResult<Stored<Rcri>> {
        let records = self.ctx.records();
        records.reference::<Patient>(patient)?;

        let stored = records.create(&Rcri {
            patient: patient.clone(),
            rcri_date: rcri_date.unwrap_or_else(|| self.ctx.now()),
            health_professional: self.ctx.acting_professional().cloned(),
            factors,
        })?;
        tracing::info!(
            "recorded RCRI {} for patient {}: total {}, class {}",
            stored.id,
            patient,
            factors.total(),
            factors.class()
        );
        Ok(stored)
    }

    pub fn rcri(&self, id: &RecordId) -> ClinicalResult<Rcri> {
        self.ctx.records().get(id)
    }

    /// Register a surgery, issuing its code from the `surgery` sequence when none is given.
    ///
    /// # Errors
    ///
    /// Returns a `ConstraintViolation` if the patient or the pre-operative RCRI does not
    /// exist, the RCRI belongs to another patient, or the code is already used.
    pub fn register_surgery(&self, mut surgery: Surgery) -> ClinicalResult<Stored<Surgery>> {
        let records = self.ctx.records();
        records.reference::<Patient>(&surgery.patient)?;
        if let Some(rcri) = &surgery.preop.preop_rcri {
            let owner = records.reference::<Rcri>(rcri)?.patient;
            ensure_same_patient(Rcri::MODEL, rcri, &owner, &surgery.patient)?;
        }

        surgery.code = Some(match NonEmptyText::optional(surgery.code.take()) {
            Some(code) => code.into_inner(),
            None => self.ctx.next_identifier(SequenceKind::Surgery)?,
        });

        let stored = records.create(&surgery)?;
        tracing::info!(
            "registered surgery {} ({}) for patient {}",
            stored.record.code.as_deref().unwrap_or_default(),
            stored.id,
            stored.record.patient
        );
        Ok(stored)
    }

    pub fn surgery(&self, id: &RecordId) -> ClinicalResult<Surgery> {
        self.ctx.records().get(id)
    }

    pub fn age_at_surgery(&self, id: &RecordId) -> ClinicalResult<AgeAtSurgery> {
        let records = self.ctx.records();
        let surgery = records.get::<Surgery>(id)?;
        let patient = records.reference::<Patient>(&surgery.patient)?;
        Ok(AgeAtSurgery::compute(
            patient.date_of_birth,
            surgery.surgery_date,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ClinicalError, ConstraintViolation};
    use crate::test_support::{at, date, test_ctx, test_patient};

    fn appendectomy(patient: &RecordId) -> Surgery {
        Surgery::new(patient.clone(), NonEmptyText::new("Appendectomy").unwrap())
    }

    #[test]
    fn test_calendar_age() {
        assert_eq!(
            CalendarAge::between(date(1990, 6, 15), date(2024, 3, 1)).to_string(),
            "33y 8m 15d"
        );
        assert_eq!(
            CalendarAge::between(date(2000, 1, 31), date(2000, 2, 29)).to_string(),
            "0y 1m 0d"
        );
        assert_eq!(
            CalendarAge::between(date(2000, 1, 31), date(2000, 3, 1)).to_string(),
            "0y 1m 1d"
        );
        assert_eq!(
            CalendarAge::between(date(2020, 5, 10), date(2020, 5, 10)).to_string(),
            "0y 0m 0d"
        );
    }

    #[test]
    fn test_age_markers() {
        assert_eq!(AgeAtSurgery::compute(None, None).to_string(), "No DoB !");
        assert_eq!(
            AgeAtSurgery::compute(Some(date(1990, 1, 1)), None).to_string(),
            "No Surgery Date !"
        );
    }

    #[test]
    fn test_register_issues_code_and_reports_age() {
        let ctx = test_ctx();
        let patient = test_patient(&ctx, "Jorge");
        let service = SurgeryService::new(ctx);

        let mut surgery = appendectomy(&patient.id);
        surgery.surgery_date = Some(at(2024, 5, 25));
        let first = service.register_surgery(surgery).unwrap();
        let second = service.register_surgery(appendectomy(&patient.id)).unwrap();

        assert_eq!(first.record.code.as_deref(), Some("SUR-000001"));
        assert_eq!(second.record.code.as_deref(), Some("SUR-000002"));
        assert_eq!(
            service.age_at_surgery(&first.id).unwrap().to_string(),
            "32y 1m 5d"
        );
        assert_eq!(
            service.age_at_surgery(&second.id).unwrap(),
            AgeAtSurgery::NoSurgeryDate
        );
    }

    #[test]
    fn test_supplied_code_is_kept_and_unique() {
        let ctx = test_ctx();
        let patient = test_patient(&ctx, "Jorge");
        let service = SurgeryService::new(ctx);

        let mut surgery = appendectomy(&patient.id);
        surgery.code = Some("OR-7".into());
        let stored = service.register_surgery(surgery.clone()).unwrap();
        assert_eq!(stored.record.code.as_deref(), Some("OR-7"));

        let err = service.register_surgery(surgery).unwrap_err();
        assert!(matches!(
            err.constraint(),
            Some(ConstraintViolation::DuplicateKey { model: "surgery", .. })
        ));
    }

    #[test]
    fn test_blank_code_gets_sequence_code() {
        let ctx = test_ctx();
        let patient = test_patient(&ctx, "Jorge");
        let service = SurgeryService::new(ctx);

        let mut blank = appendectomy(&patient.id);
        blank.code = Some("   ".into());
        let mut padded = appendectomy(&patient.id);
        padded.code = Some(" OR-9 ".into());

        let blank = service.register_surgery(blank).unwrap();
        let padded = service.register_surgery(padded).unwrap();
        assert_eq!(blank.record.code.as_deref(), Some("SUR-000001"));
        assert_eq!(padded.record.code.as_deref(), Some("OR-9"));
    }

    #[test]
    fn test_preop_rcri_must_belong_to_patient() {
        let ctx = test_ctx();
        let patient = test_patient(&ctx, "Jorge");
        let other = test_patient(&ctx, "Pablo");
        let service = SurgeryService::new(ctx.acting_as(Some(RecordId::new())));

        let rcri = service
            .assess_cardiac_risk(&other.id, None, CardiacRiskFactors::default())
            .unwrap();
        assert_eq!(rcri.record.rcri_date, at(2024, 6, 1));
        assert!(rcri.record.health_professional.is_some());

        let mut surgery = appendectomy(&patient.id);
        surgery.preop.preop_rcri = Some(rcri.id);
        let err = service.register_surgery(surgery).unwrap_err();
        assert!(matches!(
            err,
            ClinicalError::Constraint(ConstraintViolation::ForeignPatientReference { .. })
        ));
    }
}
