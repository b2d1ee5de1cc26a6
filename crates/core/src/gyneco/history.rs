//! Gynecological profile and dated screening histories.

use super::pregnancy::PregnancyService;
use crate::context::CoreContext;
use crate::error::ClinicalResult;
use crate::patient::{Patient, PatientEvaluation};
use crate::store::{Model, Stored};
use crate::validation::ensure_same_patient;
use chrono::NaiveDate;
use clinrec_uuid::RecordId;
use serde::{Deserialize, Serialize};

/// Per-patient gynecological and obstetric summary. One per patient.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GynecoProfile {
    pub patient: RecordId,
    #[serde(default)]
    pub fertile: bool,
    /// Age at menarche, in years.
    #[serde(default)]
    pub menarche: Option<u32>,
    #[serde(default)]
    pub menopausal: bool,
    /// Age at menopause, in years.
    #[serde(default)]
    pub menopause: Option<u32>,
    #[serde(default)]
    pub mammography: bool,
    #[serde(default)]
    pub mammography_last: Option<NaiveDate>,
    #[serde(default)]
    pub breast_self_examination: bool,
    #[serde(default)]
    pub pap_test: bool,
    #[serde(default)]
    pub pap_test_last: Option<NaiveDate>,
    #[serde(default)]
    pub colposcopy: bool,
    #[serde(default)]
    pub colposcopy_last: Option<NaiveDate>,
    #[serde(default)]
    pub gravida: Option<u32>,
    #[serde(default)]
    pub premature: Option<u32>,
    #[serde(default)]
    pub abortions: Option<u32>,
    #[serde(default)]
    pub stillbirths: Option<u32>,
    #[serde(default)]
    pub full_term: Option<u32>,
}

impl Model for GynecoProfile {
    const MODEL: &'static str = "patient.gyneco";

    fn unique_key(&self) -> Option<String> {
        Some(self.patient.to_string())
    }
}

/// Profile as read back, with the derived pregnancy flag.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct GynecoSummary {
    #[serde(flatten)]
    pub profile: GynecoProfile,
    pub currently_pregnant: bool,
}

/// A dated observation about one patient, optionally tied to one of that patient's evaluations.
pub trait HistoryRecord: Model {
    fn patient(&self) -> &RecordId;

    fn evaluation(&self) -> Option<&RecordId>;

    /// Fill unset dates and selections.
    fn apply_defaults(&mut self, today: NaiveDate);
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MenstrualFrequency {
    Amenorrhea,
    Oligomenorrhea,
    #[default]
    Eumenorrhea,
    Polymenorrhea,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MenstrualVolume {
    Hypomenorrhea,
    #[default]
    Normal,
    Menorrhagia,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MenstrualHistory {
    pub patient: RecordId,
    #[serde(default)]
    pub evaluation: Option<RecordId>,
    #[serde(default)]
    pub evaluation_date: Option<NaiveDate>,
    pub lmp: NaiveDate,
    /// Length of the last period, in days.
    pub lmp_length: u32,
    #[serde(default)]
    pub is_regular: bool,
    #[serde(default)]
    pub dysmenorrhea: bool,
    #[serde(default)]
    pub frequency: MenstrualFrequency,
    #[serde(default)]
    pub volume: MenstrualVolume,
}

impl Model for MenstrualHistory {
    const MODEL: &'static str = "patient.menstrual_history";
}

impl HistoryRecord for MenstrualHistory {
    fn patient(&self) -> &RecordId {
        &self.patient
    }

    fn evaluation(&self) -> Option<&RecordId> {
        self.evaluation.as_ref()
    }

    fn apply_defaults(&mut self, today: NaiveDate) {
        self.evaluation_date.get_or_insert(today);
    }
}

/// Outcome of a mammography or colposcopy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScreeningResult {
    Normal,
    Abnormal,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MammographyHistory {
    pub patient: RecordId,
    #[serde(default)]
    pub evaluation: Option<RecordId>,
    #[serde(default)]
    pub evaluation_date: Option<NaiveDate>,
    #[serde(default)]
    pub last_mammography: Option<NaiveDate>,
    #[serde(default)]
    pub result: Option<ScreeningResult>,
    #[serde(default)]
    pub comments: Option<String>,
}

impl Model for MammographyHistory {
    const MODEL: &'static str = "patient.mammography_history";
}

impl HistoryRecord for MammographyHistory {
    fn patient(&self) -> &RecordId {
        &self.patient
    }

    fn evaluation(&self) -> Option<&RecordId> {
        self.evaluation.as_ref()
    }

    fn apply_defaults(&mut self, today: NaiveDate) {
        self.evaluation_date.get_or_insert(today);
        self.last_mammography.get_or_insert(today);
    }
}

/// Cytology class of a PAP smear.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PapResult {
    #[serde(rename = "negative")]
    Negative,
    #[serde(rename = "c1")]
    AscUs,
    #[serde(rename = "c2")]
    AscH,
    #[serde(rename = "g1")]
    Asg,
    #[serde(rename = "c3")]
    Lsil,
    #[serde(rename = "c4")]
    Hsil,
    #[serde(rename = "g4")]
    Ais,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PapHistory {
    pub patient: RecordId,
    #[serde(default)]
    pub evaluation: Option<RecordId>,
    #[serde(default)]
    pub evaluation_date: Option<NaiveDate>,
    #[serde(default)]
    pub last_pap: Option<NaiveDate>,
    #[serde(default)]
    pub result: Option<PapResult>,
    #[serde(default)]
    pub comments: Option<String>,
}

impl Model for PapHistory {
    const MODEL: &'static str = "patient.pap_history";
}

impl HistoryRecord for PapHistory {
    fn patient(&self) -> &RecordId {
        &self.patient
    }

    fn evaluation(&self) -> Option<&RecordId> {
        self.evaluation.as_ref()
    }

    fn apply_defaults(&mut self, today: NaiveDate) {
        self.evaluation_date.get_or_insert(today);
        self.last_pap.get_or_insert(today);
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ColposcopyHistory {
    pub patient: RecordId,
    #[serde(default)]
    pub evaluation: Option<RecordId>,
    #[serde(default)]
    pub evaluation_date: Option<NaiveDate>,
    #[serde(default)]
    pub last_colposcopy: Option<NaiveDate>,
    #[serde(default)]
    pub result: Option<ScreeningResult>,
    #[serde(default)]
    pub comments: Option<String>,
}

impl Model for ColposcopyHistory {
    const MODEL: &'static str = "patient.colposcopy_history";
}

impl HistoryRecord for ColposcopyHistory {
    fn patient(&self) -> &RecordId {
        &self.patient
    }

    fn evaluation(&self) -> Option<&RecordId> {
        self.evaluation.as_ref()
    }

    fn apply_defaults(&mut self, today: NaiveDate) {
        self.evaluation_date.get_or_insert(today);
        self.last_colposcopy.get_or_insert(today);
    }
}

#[derive(Clone)]
pub struct GynecoService {
    ctx: CoreContext,
}

impl GynecoService {
    pub fn new(ctx: CoreContext) -> Self {
        Self { ctx }
    }

    /// Create or replace the patient's profile.
    pub fn save_profile(&self, profile: GynecoProfile) -> ClinicalResult<Stored<GynecoProfile>> {
        let _guard = self.ctx.write_guard()?;
        let records = self.ctx.records();
        records.reference::<Patient>(&profile.patient)?;

        let existing = records.search::<GynecoProfile>(|p| p.patient == profile.patient)?;
        match existing.into_iter().next() {
            Some(current) => {
                records.write(&current.id, &profile)?;
                tracing::info!("updated gyneco profile {}", current.id);
                Ok(Stored {
                    id: current.id,
                    record: profile,
                })
            }
            None => {
                let stored = records.create(&profile)?;
                tracing::info!("created gyneco profile {}", stored.id);
                Ok(stored)
            }
        }
    }

    pub fn summary(&self, patient: &RecordId) -> ClinicalResult<Option<GynecoSummary>> {
        let profile = self
            .ctx
            .records()
            .search::<GynecoProfile>(|p| &p.patient == patient)?
            .into_iter()
            .next();
        let Some(profile) = profile else {
            return Ok(None);
        };

        let currently_pregnant = PregnancyService::new(self.ctx.clone()).currently_pregnant(patient)?;
        Ok(Some(GynecoSummary {
            profile: profile.record,
            currently_pregnant,
        }))
    }

    /// Record a history entry, applying date defaults.
    ///
    /// # Errors
    ///
    /// Returns a `ConstraintViolation` if the patient does not exist, or if the linked
    /// evaluation does not exist or belongs to another patient.
    pub fn record_history<H: HistoryRecord>(&self, mut record: H) -> ClinicalResult<Stored<H>> {
        let records = self.ctx.records();
        records.reference::<Patient>(record.patient())?;

        if let Some(evaluation) = record.evaluation() {
            let owner = records.reference::<PatientEvaluation>(evaluation)?.patient;
            if let Err(err) =
                ensure_same_patient(PatientEvaluation::MODEL, evaluation, &owner, record.patient())
            {
                tracing::warn!("rejected {}: {}", H::MODEL, err);
                return Err(err);
            }
        }

        record.apply_defaults(self.ctx.today());
        let stored = records.create(&record)?;
        tracing::info!("recorded {} {}", H::MODEL, stored.id);
        Ok(stored)
    }

    pub fn histories<H: HistoryRecord>(&self, patient: &RecordId) -> ClinicalResult<Vec<Stored<H>>> {
        self.ctx.records().search::<H>(|h| h.patient() == patient)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ClinicalError, ConstraintViolation};
    use crate::gyneco::pregnancy::Pregnancy;
    use crate::patient::PatientService;
    use crate::test_support::{date, test_ctx, test_patient};

    fn menstrual(patient: &RecordId, evaluation: Option<RecordId>) -> MenstrualHistory {
        MenstrualHistory {
            patient: patient.clone(),
            evaluation,
            evaluation_date: None,
            lmp: date(2024, 5, 20),
            lmp_length: 5,
            is_regular: true,
            dysmenorrhea: false,
            frequency: MenstrualFrequency::default(),
            volume: MenstrualVolume::default(),
        }
    }

    fn mammography(patient: &RecordId, evaluation: Option<RecordId>) -> MammographyHistory {
        MammographyHistory {
            patient: patient.clone(),
            evaluation,
            evaluation_date: None,
            last_mammography: None,
            result: Some(ScreeningResult::Normal),
            comments: None,
        }
    }

    #[test]
    fn test_histories_reject_evaluation_of_another_patient() {
        let ctx = test_ctx();
        let patient = test_patient(&ctx, "Rosa");
        let other = test_patient(&ctx, "Clara");
        let foreign = PatientService::new(ctx.clone())
            .record_evaluation(&other.id, None)
            .unwrap();
        let service = GynecoService::new(ctx);

        let err = service
            .record_history(menstrual(&patient.id, Some(foreign.id.clone())))
            .unwrap_err();
        assert!(matches!(
            err,
            ClinicalError::Constraint(ConstraintViolation::ForeignPatientReference { .. })
        ));

        let err = service
            .record_history(mammography(&patient.id, Some(foreign.id)))
            .unwrap_err();
        assert!(matches!(
            err.constraint(),
            Some(ConstraintViolation::ForeignPatientReference { .. })
        ));

        assert!(service.histories::<MenstrualHistory>(&patient.id).unwrap().is_empty());
        assert!(service.histories::<MammographyHistory>(&patient.id).unwrap().is_empty());
    }

    #[test]
    fn test_history_defaults() {
        let ctx = test_ctx();
        let patient = test_patient(&ctx, "Rosa");
        let own = PatientService::new(ctx.clone())
            .record_evaluation(&patient.id, None)
            .unwrap();
        let service = GynecoService::new(ctx.clone());

        let stored = service
            .record_history(mammography(&patient.id, Some(own.id)))
            .expect("own evaluation is accepted");
        assert_eq!(stored.record.evaluation_date, Some(ctx.today()));
        assert_eq!(stored.record.last_mammography, Some(ctx.today()));

        let stored = service
            .record_history(menstrual(&patient.id, None))
            .unwrap();
        assert_eq!(stored.record.frequency, MenstrualFrequency::Eumenorrhea);
        assert_eq!(stored.record.volume, MenstrualVolume::Normal);
        assert_eq!(stored.record.evaluation_date, Some(ctx.today()));
    }

    #[test]
    fn test_pap_result_codes() {
        let pap: PapHistory = serde_json::from_value(serde_json::json!({
            "patient": RecordId::new().to_string(),
            "result": "c3",
        }))
        .unwrap();
        assert_eq!(pap.result, Some(PapResult::Lsil));
    }

    #[test]
    fn test_profile_is_one_per_patient_and_reports_pregnancy() {
        let ctx = test_ctx();
        let patient = test_patient(&ctx, "Rosa");
        let service = GynecoService::new(ctx.clone());

        let first = service
            .save_profile(GynecoProfile {
                patient: patient.id.clone(),
                fertile: true,
                menarche: Some(12),
                ..GynecoProfile::default()
            })
            .unwrap();
        let second = service
            .save_profile(GynecoProfile {
                patient: patient.id.clone(),
                fertile: true,
                gravida: Some(1),
                ..GynecoProfile::default()
            })
            .unwrap();
        assert_eq!(first.id, second.id);

        let summary = service.summary(&patient.id).unwrap().unwrap();
        assert_eq!(summary.profile.gravida, Some(1));
        assert!(!summary.currently_pregnant);

        PregnancyService::new(ctx)
            .create(Pregnancy::new(patient.id.clone(), 1, date(2024, 3, 1)))
            .unwrap();
        assert!(service.summary(&patient.id).unwrap().unwrap().currently_pregnant);
    }
}
