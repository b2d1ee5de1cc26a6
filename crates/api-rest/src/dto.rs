//! Request and response bodies with OpenAPI schemas.
//!
//! Record bodies that map one-to-one onto a core model (pregnancies, surgeries, lab orders, ...)
//! are deserialised straight into the core type; the types here cover the rest.

use chrono::{NaiveDate, NaiveDateTime};
use clinrec_core::store::Stored;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthRes {
    pub ok: bool,
    pub message: String,
}

/// A stored record: its identity plus the record body as JSON.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RecordRes {
    pub id: String,
    #[schema(value_type = Object)]
    pub record: serde_json::Value,
}

impl RecordRes {
    pub fn from_stored<M: Serialize>(stored: &Stored<M>) -> Result<Self, serde_json::Error> {
        Ok(Self {
            id: stored.id.to_string(),
            record: serde_json::to_value(&stored.record)?,
        })
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RecordListRes {
    pub records: Vec<RecordRes>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreatePatientReq {
    pub name: String,
    #[serde(default)]
    pub date_of_birth: Option<NaiveDate>,
}

#[derive(Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct OpenEvaluationReq {
    /// Defaults to now.
    #[serde(default)]
    pub evaluation_start: Option<NaiveDateTime>,
}

/// A pregnancy with its derived dates.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PregnancyRes {
    pub id: String,
    #[schema(value_type = Object)]
    pub record: serde_json::Value,
    /// Presumed delivery date.
    pub pdd: Option<NaiveDate>,
    /// Weeks at the end of the pregnancy, 0 while none is recorded.
    pub end_age_weeks: i64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct GestationalAgeRes {
    pub days: Option<i64>,
    pub weeks: i64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DueDateReq {
    pub lmp: NaiveDate,
    /// When given, the gestational age on this date is also returned.
    #[serde(default)]
    pub on: Option<NaiveDate>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DueDateRes {
    pub pdd: NaiveDate,
    pub gestational_age: Option<GestationalAgeRes>,
}

#[derive(Debug, Default, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct RcriReq {
    /// Defaults to now.
    pub rcri_date: Option<NaiveDateTime>,
    pub rcri_high_risk_surgery: bool,
    pub rcri_ischemic_history: bool,
    pub rcri_congestive_history: bool,
    pub rcri_diabetes_history: bool,
    pub rcri_cerebrovascular_history: bool,
    pub rcri_kidney_history: bool,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RcriRes {
    /// Absent when the score was only computed, not recorded.
    pub id: Option<String>,
    pub total: u32,
    pub class: String,
}

#[derive(Debug, Default, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct FamilyApgarReq {
    pub fam_apgar_help: Option<u8>,
    pub fam_apgar_discussion: Option<u8>,
    pub fam_apgar_decisions: Option<u8>,
    pub fam_apgar_timesharing: Option<u8>,
    pub fam_apgar_affection: Option<u8>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct FamilyApgarRes {
    pub id: Option<String>,
    pub score: u8,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AgeAtSurgeryRes {
    /// `"Xy Ym Zd"`, or a marker when the birth or surgery date is missing.
    pub age: String,
}

/// Request ids handed to a batch action (lab orders, imaging results).
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RequestIdsReq {
    pub requests: Vec<String>,
}
