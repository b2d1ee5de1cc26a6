//! Inpatient rounds and ambulatory care sessions.
//!
//! Both record types are signed by the acting health professional; a context without one
//! cannot create them.

use crate::config::SequenceKind;
use crate::context::CoreContext;
use crate::error::{ClinicalError, ClinicalResult};
use crate::patient::{Patient, PatientEvaluation};
use crate::store::{Model, Stored};
use crate::validation::ensure_same_patient;
use crate::NonEmptyText;
use chrono::NaiveDateTime;
use clinrec_uuid::RecordId;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VitalSigns {
    pub systolic: Option<u32>,
    pub diastolic: Option<u32>,
    /// Heart rate, beats per minute.
    pub bpm: Option<u32>,
    /// Breaths per minute.
    pub respiratory_rate: Option<u32>,
    /// Oxygen saturation, percent.
    pub osat: Option<u32>,
    /// Celsius.
    pub temperature: Option<f64>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProcedureNote {
    pub procedure: NonEmptyText,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Evolution {
    StatusQuo,
    Improving,
    Worsening,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionEvolution {
    Initial,
    StatusQuo,
    Improving,
    Worsening,
}

/// The "six P's" checked on every round.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoundingChecks {
    pub pain: bool,
    /// 0 to 10.
    pub pain_level: Option<u8>,
    pub potty: bool,
    pub position: bool,
    pub proximity: bool,
    pub pump: bool,
    pub personal_needs: bool,
}

/// Input for [`NursingService::record_rounding`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RoundingDraft {
    /// Inpatient registration.
    pub registration: RecordId,
    #[serde(default)]
    pub evaluation_start: Option<NaiveDateTime>,
    pub evaluation_end: NaiveDateTime,
    #[serde(default)]
    pub environmental_assessment: Option<String>,
    #[serde(flatten)]
    pub checks: RoundingChecks,
    #[serde(flatten)]
    pub vitals: VitalSigns,
    #[serde(default)]
    pub glycemia: Option<u32>,
    #[serde(default)]
    pub depression: bool,
    #[serde(default)]
    pub evolution: Option<Evolution>,
    #[serde(default)]
    pub round_summary: Option<String>,
    #[serde(default)]
    pub warning: bool,
    #[serde(default)]
    pub procedures: Vec<ProcedureNote>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PatientRounding {
    pub registration: RecordId,
    pub health_professional: RecordId,
    pub evaluation_start: NaiveDateTime,
    pub evaluation_end: NaiveDateTime,
    #[serde(default)]
    pub environmental_assessment: Option<String>,
    #[serde(flatten)]
    pub checks: RoundingChecks,
    #[serde(flatten)]
    pub vitals: VitalSigns,
    #[serde(default)]
    pub glycemia: Option<u32>,
    #[serde(default)]
    pub depression: bool,
    #[serde(default)]
    pub evolution: Option<Evolution>,
    #[serde(default)]
    pub round_summary: Option<String>,
    #[serde(default)]
    pub warning: bool,
    #[serde(default)]
    pub procedures: Vec<ProcedureNote>,
}

impl Model for PatientRounding {
    const MODEL: &'static str = "patient.rounding";
}

/// Input for [`NursingService::start_ambulatory_session`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AmbulatorySessionDraft {
    /// Session identifier; issued from the `ambulatory_care` sequence when unset.
    #[serde(default)]
    pub name: Option<String>,
    pub patient: RecordId,
    #[serde(default)]
    pub base_condition: Option<RecordId>,
    #[serde(default)]
    pub evaluation: Option<RecordId>,
    #[serde(default)]
    pub ordering_professional: Option<RecordId>,
    pub session_number: u32,
    #[serde(default)]
    pub session_start: Option<NaiveDateTime>,
    pub session_end: NaiveDateTime,
    #[serde(flatten)]
    pub vitals: VitalSigns,
    #[serde(default)]
    pub glycemia: Option<u32>,
    #[serde(default)]
    pub warning: bool,
    #[serde(default)]
    pub evolution: Option<SessionEvolution>,
    #[serde(default)]
    pub next_session: Option<NaiveDateTime>,
    pub session_notes: NonEmptyText,
    #[serde(default)]
    pub procedures: Vec<ProcedureNote>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AmbulatoryCare {
    pub name: String,
    pub patient: RecordId,
    #[serde(default)]
    pub base_condition: Option<RecordId>,
    #[serde(default)]
    pub evaluation: Option<RecordId>,
    #[serde(default)]
    pub ordering_professional: Option<RecordId>,
    pub health_professional: RecordId,
    pub session_number: u32,
    pub session_start: NaiveDateTime,
    pub session_end: NaiveDateTime,
    #[serde(flatten)]
    pub vitals: VitalSigns,
    #[serde(default)]
    pub glycemia: Option<u32>,
    #[serde(default)]
    pub warning: bool,
    #[serde(default)]
    pub evolution: Option<SessionEvolution>,
    #[serde(default)]
    pub next_session: Option<NaiveDateTime>,
    pub session_notes: NonEmptyText,
    #[serde(default)]
    pub procedures: Vec<ProcedureNote>,
}

impl Model for AmbulatoryCare {
    const MODEL: &'static str = "patient.ambulatory_care";

    fn unique_key(&self) -> Option<String> {
        Some(self.name.clone())
    }
}

#[derive(Clone)]
pub struct NursingService {
    ctx: CoreContext,
}

impl NursingService {
    pub fn new(ctx: CoreContext) -> Self {
        Self { ctx }
    }

    /// Record an inpatient round signed by the acting professional.
    ///
    /// # Errors
    ///
    /// Returns `ClinicalError::NoHealthProfessional` if no professional is acting and
    /// `ClinicalError::InvalidInput` for a pain level above 10.
    pub fn record_rounding(&self, draft: RoundingDraft) -> ClinicalResult<Stored<PatientRounding>> {
        let health_professional = self.ctx.require_professional()?;
        if draft.checks.pain_level.is_some_and(|level| level > 10) {
            return Err(ClinicalError::InvalidInput(
                "pain level must be between 0 and 10".into(),
            ));
        }

        let rounding = PatientRounding {
            registration: draft.registration,
            health_professional,
            evaluation_start: draft.evaluation_start.unwrap_or_else(|| self.ctx.now()),
            evaluation_end: draft.evaluation_end,
            environmental_assessment: draft.environmental_assessment,
            checks: draft.checks,
            vitals: draft.vitals,
            glycemia: draft.glycemia,
            depression: draft.depression,
            evolution: draft.evolution,
            round_summary: draft.round_summary,
            warning: draft.warning,
            procedures: draft.procedures,
        };

        let stored = self.ctx.records().create(&rounding)?;
        tracing::info!(
            "recorded rounding {} for registration {}",
            stored.id,
            stored.record.registration
        );
        Ok(stored)
    }

    /// Open an ambulatory care session.
    ///
    /// # Errors
    ///
    /// Returns `ClinicalError::NoHealthProfessional` if no professional is acting, or a
    /// `ConstraintViolation` if the patient is unknown, the linked evaluation is unknown or
    /// belongs to another patient, or the session identifier is already used.
    pub fn start_ambulatory_session(
        &self,
        draft: AmbulatorySessionDraft,
    ) -> ClinicalResult<Stored<AmbulatoryCare>> {
        let health_professional = self.ctx.require_professional()?;
        let records = self.ctx.records();
        records.reference::<Patient>(&draft.patient)?;
        if let Some(evaluation) = &draft.evaluation {
            let owner = records.reference::<PatientEvaluation>(evaluation)?.patient;
            ensure_same_patient(PatientEvaluation::MODEL, evaluation, &owner, &draft.patient)?;
        }

        let name = match NonEmptyText::optional(draft.name) {
            Some(name) => name.into_inner(),
            None => self.ctx.next_identifier(SequenceKind::AmbulatoryCare)?,
        };

        let session = AmbulatoryCare {
            name,
            patient: draft.patient,
            base_condition: draft.base_condition,
            evaluation: draft.evaluation,
            ordering_professional: draft.ordering_professional,
            health_professional,
            session_number: draft.session_number,
            session_start: draft.session_start.unwrap_or_else(|| self.ctx.now()),
            session_end: draft.session_end,
            vitals: draft.vitals,
            glycemia: draft.glycemia,
            warning: draft.warning,
            evolution: draft.evolution,
            next_session: draft.next_session,
            session_notes: draft.session_notes,
            procedures: draft.procedures,
        };

        let stored = records.create(&session)?;
        tracing::info!(
            "started ambulatory care session {} ({}) for patient {}",
            stored.record.name,
            stored.id,
            stored.record.patient
        );
        Ok(stored)
    }

    pub fn ambulatory_session(&self, id: &RecordId) -> ClinicalResult<AmbulatoryCare> {
        self.ctx.records().get(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ConstraintViolation;
    use crate::patient::PatientService;
    use crate::test_support::{at, test_ctx, test_patient};

    fn session(patient: &RecordId) -> AmbulatorySessionDraft {
        AmbulatorySessionDraft {
            name: None,
            patient: patient.clone(),
            base_condition: None,
            evaluation: None,
            ordering_professional: None,
            session_number: 1,
            session_start: None,
            session_end: at(2024, 6, 1),
            vitals: VitalSigns::default(),
            glycemia: Some(95),
            warning: false,
            evolution: Some(SessionEvolution::Initial),
            next_session: None,
            session_notes: NonEmptyText::new("Wound dressing changed").unwrap(),
            procedures: Vec::new(),
        }
    }

    fn rounding() -> RoundingDraft {
        RoundingDraft {
            registration: RecordId::new(),
            evaluation_start: None,
            evaluation_end: at(2024, 6, 1),
            environmental_assessment: None,
            checks: RoundingChecks {
                pain: true,
                pain_level: Some(4),
                ..RoundingChecks::default()
            },
            vitals: VitalSigns::default(),
            glycemia: None,
            depression: false,
            evolution: Some(Evolution::Improving),
            round_summary: None,
            warning: false,
            procedures: Vec::new(),
        }
    }

    #[test]
    fn test_ambulatory_session_requires_professional() {
        let ctx = test_ctx();
        let patient = test_patient(&ctx, "Ines");
        let err = NursingService::new(ctx)
            .start_ambulatory_session(session(&patient.id))
            .unwrap_err();
        assert!(matches!(err, ClinicalError::NoHealthProfessional));
    }

    #[test]
    fn test_ambulatory_session_gets_sequence_name() {
        let ctx = test_ctx();
        let nurse = RecordId::new();
        let patient = test_patient(&ctx, "Ines");
        let service = NursingService::new(ctx.acting_as(Some(nurse.clone())));

        let first = service.start_ambulatory_session(session(&patient.id)).unwrap();
        let second = service.start_ambulatory_session(session(&patient.id)).unwrap();
        assert_eq!(first.record.name, "AMB-000001");
        assert_eq!(second.record.name, "AMB-000002");
        assert_eq!(first.record.health_professional, nurse);
        assert_eq!(first.record.session_start, ctx.now());
    }

    #[test]
    fn test_blank_ambulatory_name_gets_sequence_name() {
        let ctx = test_ctx();
        let patient = test_patient(&ctx, "Ines");
        let service = NursingService::new(ctx.acting_as(Some(RecordId::new())));

        let mut blank = session(&patient.id);
        blank.name = Some(" ".into());
        let mut named = session(&patient.id);
        named.name = Some(" Wound care ".into());

        assert_eq!(
            service.start_ambulatory_session(blank).unwrap().record.name,
            "AMB-000001"
        );
        assert_eq!(
            service.start_ambulatory_session(named).unwrap().record.name,
            "Wound care"
        );
    }

    #[test]
    fn test_ambulatory_session_rejects_foreign_evaluation() {
        let ctx = test_ctx();
        let patient = test_patient(&ctx, "Ines");
        let other = test_patient(&ctx, "Marta");
        let foreign = PatientService::new(ctx.clone())
            .record_evaluation(&other.id, None)
            .unwrap();

        let mut draft = session(&patient.id);
        draft.evaluation = Some(foreign.id);
        let err = NursingService::new(ctx.acting_as(Some(RecordId::new())))
            .start_ambulatory_session(draft)
            .unwrap_err();
        assert!(matches!(
            err.constraint(),
            Some(ConstraintViolation::ForeignPatientReference { .. })
        ));
    }

    #[test]
    fn test_rounding_signed_by_acting_professional() {
        let ctx = test_ctx();
        assert!(matches!(
            NursingService::new(ctx.clone()).record_rounding(rounding()),
            Err(ClinicalError::NoHealthProfessional)
        ));

        let nurse = RecordId::new();
        let stored = NursingService::new(ctx.acting_as(Some(nurse.clone())))
            .record_rounding(rounding())
            .unwrap();
        assert_eq!(stored.record.health_professional, nurse);
        assert_eq!(stored.record.evaluation_start, ctx.now());
    }

    #[test]
    fn test_rounding_rejects_out_of_scale_pain() {
        let ctx = test_ctx().acting_as(Some(RecordId::new()));
        let mut draft = rounding();
        draft.checks.pain_level = Some(11);
        assert!(matches!(
            NursingService::new(ctx).record_rounding(draft),
            Err(ClinicalError::InvalidInput(_))
        ));
    }
}
