//! Prenatal, perinatal and puerperium monitoring records.

use super::pregnancy::{Iugr, Pregnancy};
use crate::context::CoreContext;
use crate::error::ClinicalResult;
use crate::gestation::GestationalAge;
use crate::patient::PatientEvaluation;
use crate::store::{Model, Stored};
use crate::validation::ensure_same_patient;
use chrono::NaiveDateTime;
use clinrec_uuid::RecordId;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Placentation {
    Normal,
    Accreta,
    Increta,
    Percreta,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PrenatalFindings {
    pub hypertension: bool,
    pub preeclampsia: bool,
    pub overweight: bool,
    pub diabetes: bool,
    pub placentation: Option<Placentation>,
    pub placenta_previa: bool,
    pub vasa_previa: bool,
    /// Symphysis pubis to uterine fundus, in cm.
    pub fundal_height: Option<u32>,
    pub fetus_heart_rate: Option<u32>,
    /// Estimated fetal weight, in grams.
    pub efw: Option<u32>,
    /// Fetal biometry, in mm.
    pub bpd: Option<u32>,
    pub ac: Option<u32>,
    pub hc: Option<u32>,
    pub fl: Option<u32>,
    pub oligohydramnios: bool,
    pub polihydramnios: bool,
    pub iugr: Option<Iugr>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PrenatalEvaluation {
    pub pregnancy: RecordId,
    #[serde(default)]
    pub evaluation: Option<RecordId>,
    pub evaluation_date: NaiveDateTime,
    #[serde(flatten)]
    pub findings: PrenatalFindings,
}

impl Model for PrenatalEvaluation {
    const MODEL: &'static str = "patient.prenatal.evaluation";
}

impl PrenatalEvaluation {
    pub fn gestational_age(&self, pregnancy: &Pregnancy) -> GestationalAge {
        GestationalAge::at(pregnancy.lmp, self.evaluation_date)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LochiaAmount {
    Normal,
    Abundant,
    Hemorrhage,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LochiaColor {
    Rubra,
    Serosa,
    Alba,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LochiaOdor {
    Normal,
    Offensive,
}

/// Maternal vitals shared by the puerperium and perinatal monitors.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MaternalVitals {
    pub systolic: Option<u32>,
    pub diastolic: Option<u32>,
    /// Heart rate.
    pub frequency: Option<u32>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PuerperiumMonitor {
    pub pregnancy: RecordId,
    pub date: NaiveDateTime,
    #[serde(flatten)]
    pub vitals: MaternalVitals,
    #[serde(default)]
    pub temperature: Option<f64>,
    #[serde(default)]
    pub lochia_amount: Option<LochiaAmount>,
    #[serde(default)]
    pub lochia_color: Option<LochiaColor>,
    #[serde(default)]
    pub lochia_odor: Option<LochiaOdor>,
    /// Fundal height during involution, in cm.
    #[serde(default)]
    pub uterus_involution: Option<u32>,
}

impl Model for PuerperiumMonitor {
    const MODEL: &'static str = "patient.puerperium.monitor";
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryMode {
    VaginalSpontaneous,
    VaginalVacuumExtraction,
    VaginalForcepsExtraction,
    CSection,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FetusPresentation {
    Cephalic,
    Breech,
    Shoulder,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Laceration {
    Perineal,
    Vaginal,
    Cervical,
    BroadLigament,
    Vulvar,
    Rectal,
    Bladder,
    Urethral,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Hematoma {
    Vaginal,
    Vulvar,
    Retroperitoneal,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaceOfDeath {
    Hospital,
    DeliveryRoom,
    InTransitToHospital,
    TransferToOtherHospital,
}

/// Delivery admission.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Perinatal {
    pub pregnancy: RecordId,
    #[serde(default)]
    pub admission_code: Option<String>,
    pub admission_date: NaiveDateTime,
    #[serde(default)]
    pub start_labor_mode: Option<DeliveryMode>,
    #[serde(default)]
    pub gestational_days: Option<u32>,
    #[serde(default)]
    pub fetus_presentation: Option<FetusPresentation>,
    #[serde(default)]
    pub dystocia: bool,
    #[serde(default)]
    pub placenta_incomplete: bool,
    #[serde(default)]
    pub placenta_retained: bool,
    #[serde(default)]
    pub abruptio_placentae: bool,
    #[serde(default)]
    pub episiotomy: bool,
    #[serde(default)]
    pub laceration: Option<Laceration>,
    #[serde(default)]
    pub hematoma: Option<Hematoma>,
    /// Discharge timestamp.
    #[serde(default)]
    pub dismissed: Option<NaiveDateTime>,
    #[serde(default)]
    pub mother_deceased: bool,
    #[serde(default)]
    pub place_of_death: Option<PlaceOfDeath>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl Model for Perinatal {
    const MODEL: &'static str = "patient.perinatal";
}

impl Perinatal {
    /// A bare admission for `pregnancy` at `admission_date`.
    pub fn admission(pregnancy: RecordId, admission_date: NaiveDateTime) -> Self {
        Self {
            pregnancy,
            admission_code: None,
            admission_date,
            start_labor_mode: None,
            gestational_days: None,
            fetus_presentation: None,
            dystocia: false,
            placenta_incomplete: false,
            placenta_retained: false,
            abruptio_placentae: false,
            episiotomy: false,
            laceration: None,
            hematoma: None,
            dismissed: None,
            mother_deceased: false,
            place_of_death: None,
            notes: None,
        }
    }

    /// Whole weeks of gestation at admission.
    pub fn gestational_weeks(&self, pregnancy: &Pregnancy) -> i64 {
        GestationalAge::at(pregnancy.lmp, self.admission_date).weeks()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FetusPosition {
    OcciputCephalicPosterior,
    FrankBreech,
    CompleteBreech,
    TransverseLie,
    FootlingBreech,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PerinatalMonitor {
    pub perinatal: RecordId,
    #[serde(default)]
    pub date: Option<NaiveDateTime>,
    #[serde(flatten)]
    pub vitals: MaternalVitals,
    #[serde(default)]
    pub contractions: Option<u32>,
    /// Cervix dilation, in cm.
    #[serde(default)]
    pub dilation: Option<u32>,
    /// Fetal heart rate.
    #[serde(default)]
    pub f_frequency: Option<u32>,
    #[serde(default)]
    pub meconium: bool,
    #[serde(default)]
    pub bleeding: bool,
    #[serde(default)]
    pub fundal_height: Option<u32>,
    #[serde(default)]
    pub fetus_position: Option<FetusPosition>,
}

impl Model for PerinatalMonitor {
    const MODEL: &'static str = "patient.perinatal.monitor";
}

/// Monitoring records attached to a pregnancy.
#[derive(Clone)]
pub struct ObstetricsService {
    ctx: CoreContext,
}

impl ObstetricsService {
    pub fn new(ctx: CoreContext) -> Self {
        Self { ctx }
    }

    /// Record a prenatal evaluation.
    ///
    /// # Errors
    ///
    /// Returns a `ConstraintViolation` if the pregnancy does not exist, or if the linked
    /// patient evaluation is missing or belongs to another patient.
    pub fn record_prenatal(
        &self,
        evaluation: PrenatalEvaluation,
    ) -> ClinicalResult<Stored<PrenatalEvaluation>> {
        let records = self.ctx.records();
        let pregnancy = records.reference::<Pregnancy>(&evaluation.pregnancy)?;
        if let Some(linked) = &evaluation.evaluation {
            let owner = records.reference::<PatientEvaluation>(linked)?.patient;
            ensure_same_patient(PatientEvaluation::MODEL, linked, &owner, &pregnancy.patient)?;
        }

        let stored = records.create(&evaluation)?;
        tracing::info!(
            "recorded prenatal evaluation {} at {} weeks for pregnancy {}",
            stored.id,
            stored.record.gestational_age(&pregnancy).weeks(),
            stored.record.pregnancy
        );
        Ok(stored)
    }

    pub fn prenatal_gestational_age(&self, id: &RecordId) -> ClinicalResult<GestationalAge> {
        let records = self.ctx.records();
        let evaluation = records.get::<PrenatalEvaluation>(id)?;
        let pregnancy = records.reference::<Pregnancy>(&evaluation.pregnancy)?;
        Ok(evaluation.gestational_age(&pregnancy))
    }

    pub fn record_puerperium(
        &self,
        monitor: PuerperiumMonitor,
    ) -> ClinicalResult<Stored<PuerperiumMonitor>> {
        let records = self.ctx.records();
        records.reference::<Pregnancy>(&monitor.pregnancy)?;
        let stored = records.create(&monitor)?;
        tracing::info!(
            "recorded puerperium monitor {} for pregnancy {}",
            stored.id,
            stored.record.pregnancy
        );
        Ok(stored)
    }

    pub fn admit_perinatal(&self, perinatal: Perinatal) -> ClinicalResult<Stored<Perinatal>> {
        let records = self.ctx.records();
        records.reference::<Pregnancy>(&perinatal.pregnancy)?;
        let stored = records.create(&perinatal)?;
        tracing::info!(
            "perinatal admission {} for pregnancy {}",
            stored.id,
            stored.record.pregnancy
        );
        Ok(stored)
    }

    pub fn perinatal_gestational_weeks(&self, id: &RecordId) -> ClinicalResult<i64> {
        let records = self.ctx.records();
        let perinatal = records.get::<Perinatal>(id)?;
        let pregnancy = records.reference::<Pregnancy>(&perinatal.pregnancy)?;
        Ok(perinatal.gestational_weeks(&pregnancy))
    }

    pub fn record_perinatal_monitor(
        &self,
        monitor: PerinatalMonitor,
    ) -> ClinicalResult<Stored<PerinatalMonitor>> {
        let records = self.ctx.records();
        records.reference::<Perinatal>(&monitor.perinatal)?;
        records.create(&monitor)
    }

    pub fn list_prenatal(&self, pregnancy: &RecordId) -> ClinicalResult<Vec<Stored<PrenatalEvaluation>>> {
        self.ctx
            .records()
            .search::<PrenatalEvaluation>(|e| &e.pregnancy == pregnancy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ClinicalError, ConstraintViolation};
    use crate::gyneco::pregnancy::PregnancyService;
    use crate::patient::PatientService;
    use crate::test_support::{at, date, test_ctx, test_patient};

    fn prenatal(pregnancy: &RecordId, evaluation_date: NaiveDateTime) -> PrenatalEvaluation {
        PrenatalEvaluation {
            pregnancy: pregnancy.clone(),
            evaluation: None,
            evaluation_date,
            findings: PrenatalFindings::default(),
        }
    }

    #[test]
    fn test_prenatal_gestational_age() {
        let ctx = test_ctx();
        let patient = test_patient(&ctx, "Lucia");
        let pregnancy = PregnancyService::new(ctx.clone())
            .create(Pregnancy::new(patient.id, 1, date(2024, 1, 1)))
            .unwrap();
        let service = ObstetricsService::new(ctx);

        let evaluation = service
            .record_prenatal(prenatal(&pregnancy.id, at(2024, 3, 15)))
            .expect("prenatal evaluation should succeed");
        let age = service.prenatal_gestational_age(&evaluation.id).unwrap();
        assert_eq!(age.days(), 74);
        assert_eq!(age.weeks(), 10);
    }

    #[test]
    fn test_prenatal_before_lmp_is_negative() {
        let lmp_pregnancy = Pregnancy::new(RecordId::new(), 1, date(2024, 1, 10));
        let evaluation = prenatal(&RecordId::new(), at(2024, 1, 9));
        let age = evaluation.gestational_age(&lmp_pregnancy);
        assert_eq!((age.days(), age.weeks()), (-1, -1));
    }

    #[test]
    fn test_prenatal_rejects_other_patients_evaluation() {
        let ctx = test_ctx();
        let mother = test_patient(&ctx, "Lucia");
        let other = test_patient(&ctx, "Elena");
        let pregnancy = PregnancyService::new(ctx.clone())
            .create(Pregnancy::new(mother.id, 1, date(2024, 1, 1)))
            .unwrap();
        let foreign = PatientService::new(ctx.clone())
            .record_evaluation(&other.id, None)
            .unwrap();

        let mut evaluation = prenatal(&pregnancy.id, at(2024, 3, 15));
        evaluation.evaluation = Some(foreign.id);
        let err = ObstetricsService::new(ctx).record_prenatal(evaluation).unwrap_err();
        assert!(matches!(
            err,
            ClinicalError::Constraint(ConstraintViolation::ForeignPatientReference { .. })
        ));
    }

    #[test]
    fn test_perinatal_weeks_and_monitor() {
        let ctx = test_ctx();
        let patient = test_patient(&ctx, "Lucia");
        let pregnancy = PregnancyService::new(ctx.clone())
            .create(Pregnancy::new(patient.id, 1, date(2024, 1, 1)))
            .unwrap();
        let service = ObstetricsService::new(ctx);

        let admission = service
            .admit_perinatal(Perinatal::admission(pregnancy.id.clone(), at(2024, 9, 30)))
            .unwrap();
        assert_eq!(service.perinatal_gestational_weeks(&admission.id).unwrap(), 39);

        let monitor = PerinatalMonitor {
            perinatal: admission.id.clone(),
            date: Some(at(2024, 9, 30)),
            vitals: MaternalVitals {
                systolic: Some(120),
                diastolic: Some(80),
                frequency: Some(88),
            },
            contractions: Some(4),
            dilation: Some(6),
            f_frequency: Some(140),
            meconium: false,
            bleeding: false,
            fundal_height: Some(34),
            fetus_position: Some(FetusPosition::OcciputCephalicPosterior),
        };
        service.record_perinatal_monitor(monitor).unwrap();

        let orphan = PerinatalMonitor {
            perinatal: RecordId::new(),
            date: None,
            vitals: MaternalVitals::default(),
            contractions: None,
            dilation: None,
            f_frequency: None,
            meconium: false,
            bleeding: false,
            fundal_height: None,
            fetus_position: None,
        };
        assert!(service.record_perinatal_monitor(orphan).is_err());
    }

    #[test]
    fn test_puerperium_monitor_round_trip() {
        let ctx = test_ctx();
        let patient = test_patient(&ctx, "Lucia");
        let pregnancy = PregnancyService::new(ctx.clone())
            .create(Pregnancy::new(patient.id, 1, date(2024, 1, 1)))
            .unwrap();
        let service = ObstetricsService::new(ctx.clone());

        let stored = service
            .record_puerperium(PuerperiumMonitor {
                pregnancy: pregnancy.id,
                date: at(2024, 10, 9),
                vitals: MaternalVitals::default(),
                temperature: Some(36.8),
                lochia_amount: Some(LochiaAmount::Normal),
                lochia_color: Some(LochiaColor::Rubra),
                lochia_odor: Some(LochiaOdor::Normal),
                uterus_involution: Some(12),
            })
            .unwrap();
        let loaded: PuerperiumMonitor = ctx.records().get(&stored.id).unwrap();
        assert_eq!(loaded, stored.record);
    }
}
