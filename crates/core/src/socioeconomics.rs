//! Socioeconomic profile and the family APGAR score.
//!
//! The family APGAR total ranges from 0 to 10. Conventionally 7-10 suggests a functional
//! family, 4-6 moderate dysfunction and 0-3 severe dysfunction; only the number is reported.

use crate::context::CoreContext;
use crate::error::ClinicalResult;
use crate::patient::Patient;
use crate::store::{Model, Stored};
use clinrec_uuid::RecordId;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SesLevel {
    #[serde(rename = "0")]
    Lower,
    #[serde(rename = "1")]
    LowerMiddle,
    #[serde(rename = "2")]
    Middle,
    #[serde(rename = "3")]
    MiddleUpper,
    #[serde(rename = "4")]
    Higher,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EducationLevel {
    #[serde(rename = "0")]
    None,
    #[serde(rename = "1")]
    IncompletePrimary,
    #[serde(rename = "2")]
    Primary,
    #[serde(rename = "3")]
    IncompleteSecondary,
    #[serde(rename = "4")]
    Secondary,
    #[serde(rename = "5")]
    University,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum HousingConditions {
    /// Shanty, deficient sanitary conditions.
    #[serde(rename = "0")]
    Shanty,
    /// Small, crowded but with good sanitary conditions.
    #[serde(rename = "1")]
    Crowded,
    #[serde(rename = "2")]
    Comfortable,
    #[serde(rename = "3")]
    Roomy,
    #[serde(rename = "4")]
    Luxury,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IncomeBand {
    High,
    Medium,
    Low,
}

/// Household services. Everything but internet is assumed present unless stated otherwise.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Infrastructure {
    pub sewers: bool,
    pub water: bool,
    pub trash: bool,
    pub electricity: bool,
    pub gas: bool,
    pub telephone: bool,
    pub television: bool,
    pub internet: bool,
}

impl Default for Infrastructure {
    fn default() -> Self {
        Self {
            sewers: true,
            water: true,
            trash: true,
            electricity: true,
            gas: true,
            telephone: true,
            television: true,
            internet: false,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FamilyRisks {
    pub single_parent: bool,
    pub domestic_violence: bool,
    pub working_children: bool,
    pub teenage_pregnancy: bool,
    pub sexual_abuse: bool,
    pub drug_addiction: bool,
    pub school_withdrawal: bool,
    pub prison_past: bool,
    pub prison_current: bool,
    pub relative_in_prison: bool,
}

/// One family APGAR answer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum ApgarLevel {
    None = 0,
    Moderately = 1,
    VeryMuch = 2,
}

impl ApgarLevel {
    /// Clamp a raw answer into the 0-2 scale.
    pub fn from_value(value: u8) -> Self {
        match value {
            0 => ApgarLevel::None,
            1 => ApgarLevel::Moderately,
            _ => ApgarLevel::VeryMuch,
        }
    }

    pub fn points(self) -> u8 {
        self as u8
    }
}

/// Raw family APGAR answers as captured; unset answers score 0.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FamilyApgar {
    /// Satisfied with the help received from the family.
    pub fam_apgar_help: Option<u8>,
    /// Satisfied with how problems are discussed and shared.
    pub fam_apgar_discussion: Option<u8>,
    /// Satisfied with how the family accepts new activities and decisions.
    pub fam_apgar_decisions: Option<u8>,
    /// Satisfied with the time spent together.
    pub fam_apgar_timesharing: Option<u8>,
    /// Feels loved by the family.
    pub fam_apgar_affection: Option<u8>,
}

impl FamilyApgar {
    pub fn answers(&self) -> [Option<ApgarLevel>; 5] {
        [
            self.fam_apgar_help,
            self.fam_apgar_discussion,
            self.fam_apgar_decisions,
            self.fam_apgar_timesharing,
            self.fam_apgar_affection,
        ]
        .map(|answer| answer.map(ApgarLevel::from_value))
    }

    /// Total score, 0 to 10.
    pub fn score(&self) -> u8 {
        self.answers()
            .into_iter()
            .flatten()
            .map(ApgarLevel::points)
            .sum()
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SocioeconomicProfile {
    pub patient: RecordId,
    #[serde(default)]
    pub ses: Option<SesLevel>,
    #[serde(default)]
    pub education: Option<EducationLevel>,
    #[serde(default)]
    pub housing: Option<HousingConditions>,
    #[serde(default)]
    pub hostile_area: bool,
    #[serde(flatten)]
    pub infrastructure: Infrastructure,
    #[serde(flatten)]
    pub risks: FamilyRisks,
    #[serde(default)]
    pub ses_notes: Option<String>,
    #[serde(flatten)]
    pub family_apgar: FamilyApgar,
    #[serde(default)]
    pub income: Option<IncomeBand>,
    #[serde(default)]
    pub occupation: Option<RecordId>,
    #[serde(default)]
    pub works_at_home: bool,
    #[serde(default)]
    pub hours_outside: Option<u32>,
}

impl Model for SocioeconomicProfile {
    const MODEL: &'static str = "patient.socioeconomics";

    fn unique_key(&self) -> Option<String> {
        Some(self.patient.to_string())
    }
}

impl SocioeconomicProfile {
    pub fn new(patient: RecordId) -> Self {
        Self {
            patient,
            ses: None,
            education: None,
            housing: None,
            hostile_area: false,
            infrastructure: Infrastructure::default(),
            risks: FamilyRisks::default(),
            ses_notes: None,
            family_apgar: FamilyApgar::default(),
            income: None,
            occupation: None,
            works_at_home: false,
            hours_outside: None,
        }
    }
}

#[derive(Clone)]
pub struct SocioeconomicService {
    ctx: CoreContext,
}

impl SocioeconomicService {
    pub fn new(ctx: CoreContext) -> Self {
        Self { ctx }
    }

    /// Create or replace the patient's profile.
    pub fn save_profile(
        &self,
        profile: SocioeconomicProfile,
    ) -> ClinicalResult<Stored<SocioeconomicProfile>> {
        let _guard = self.ctx.write_guard()?;
        let records = self.ctx.records();
        records.reference::<Patient>(&profile.patient)?;

        let stored = match self.profile(&profile.patient)? {
            Some(existing) => {
                records.write(&existing.id, &profile)?;
                Stored {
                    id: existing.id,
                    record: profile,
                }
            }
            None => records.create(&profile)?,
        };
        tracing::info!(
            "saved socioeconomic profile {} (family APGAR {})",
            stored.id,
            stored.record.family_apgar.score()
        );
        Ok(stored)
    }

    pub fn profile(&self, patient: &RecordId) -> ClinicalResult<Option<Stored<SocioeconomicProfile>>> {
        Ok(self
            .ctx
            .records()
            .search::<SocioeconomicProfile>(|p| &p.patient == patient)?
            .into_iter()
            .next())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{test_ctx, test_patient};

    #[test]
    fn test_family_apgar_example() {
        let apgar = FamilyApgar {
            fam_apgar_help: Some(2),
            fam_apgar_discussion: Some(1),
            fam_apgar_decisions: Some(2),
            fam_apgar_timesharing: Some(0),
            fam_apgar_affection: Some(2),
        };
        assert_eq!(apgar.score(), 7);
    }

    #[test]
    fn test_unset_answers_score_zero_and_values_clamp() {
        assert_eq!(FamilyApgar::default().score(), 0);

        let apgar = FamilyApgar {
            fam_apgar_help: Some(9),
            fam_apgar_affection: Some(1),
            ..FamilyApgar::default()
        };
        assert_eq!(apgar.score(), 3);

        let all_high = FamilyApgar {
            fam_apgar_help: Some(u8::MAX),
            fam_apgar_discussion: Some(u8::MAX),
            fam_apgar_decisions: Some(u8::MAX),
            fam_apgar_timesharing: Some(u8::MAX),
            fam_apgar_affection: Some(u8::MAX),
        };
        assert_eq!(all_high.score(), 10);
    }

    #[test]
    fn test_infrastructure_defaults_when_absent() {
        let profile: SocioeconomicProfile = serde_json::from_value(serde_json::json!({
            "patient": RecordId::new().to_string(),
            "ses": "2",
            "internet": true,
            "fam_apgar_help": 1,
        }))
        .unwrap();
        assert_eq!(profile.ses, Some(SesLevel::Middle));
        assert!(profile.infrastructure.sewers && profile.infrastructure.television);
        assert!(profile.infrastructure.internet);
        assert_eq!(profile.family_apgar.score(), 1);
    }

    #[test]
    fn test_profile_is_one_per_patient() {
        let ctx = test_ctx();
        let patient = test_patient(&ctx, "Tomas");
        let service = SocioeconomicService::new(ctx);

        let first = service
            .save_profile(SocioeconomicProfile::new(patient.id.clone()))
            .unwrap();
        let mut changed = SocioeconomicProfile::new(patient.id.clone());
        changed.income = Some(IncomeBand::Low);
        let second = service.save_profile(changed).unwrap();

        assert_eq!(first.id, second.id);
        let stored = service.profile(&patient.id).unwrap().unwrap();
        assert_eq!(stored.record.income, Some(IncomeBand::Low));
    }
}
