//! # Clinrec Core
//!
//! Core business logic for the clinical records system.
//!
//! This crate contains the record models and the rules that govern them:
//! - obstetric dates and the one-current-pregnancy rule,
//! - gynecological histories and obstetric monitoring,
//! - pre-operative cardiac risk (RCRI) and surgery registration,
//! - socioeconomic profiles with the family APGAR score,
//! - lab and imaging order flows with their request state machine,
//! - nursing rounds and ambulatory sessions.
//!
//! **No API concerns**: HTTP servers and command-line handling belong in `api-rest` and
//! `clinrec-cli`. Persistence goes through the [`store::RecordStore`] trait.

pub mod catalogue;
pub mod config;
pub mod constants;
pub mod context;
pub mod error;
pub mod gestation;
pub mod gyneco;
pub mod imaging;
pub mod lab;
pub mod nursing;
pub mod orders;
pub mod patient;
pub mod sequence;
pub mod socioeconomics;
pub mod store;
pub mod surgery;
pub mod validation;

#[cfg(test)]
mod test_support;

pub use clinrec_types::{NonEmptyText, TextError};
pub use clinrec_uuid::RecordId;

pub use catalogue::{Catalogue, ImportSummary};
pub use config::{CoreConfig, SequenceKind, SequencePolicy};
pub use context::{Clock, CoreContext, FixedClock, SystemClock};
pub use error::{ClinicalError, ClinicalResult, ConstraintViolation};
pub use gestation::{due_date, end_of_pregnancy_weeks, GestationalAge};
pub use gyneco::{GynecoService, ObstetricsService, Pregnancy, PregnancyService};
pub use imaging::ImagingService;
pub use lab::LabService;
pub use nursing::NursingService;
pub use orders::OrderState;
pub use patient::{Patient, PatientEvaluation, PatientService};
pub use sequence::{MemorySequences, SequenceGenerator};
pub use socioeconomics::{FamilyApgar, SocioeconomicService};
pub use store::{MemoryStore, Model, RecordStore, Records, Stored};
pub use surgery::{CardiacRiskFactors, RcriClass, SurgeryService};
