//! Obstetrics and gynecology.

pub mod history;
pub mod monitoring;
pub mod pregnancy;

pub use history::{
    ColposcopyHistory, GynecoProfile, GynecoService, GynecoSummary, HistoryRecord,
    MammographyHistory, MenstrualHistory, PapHistory,
};
pub use monitoring::{
    ObstetricsService, Perinatal, PerinatalMonitor, PrenatalEvaluation, PrenatalFindings,
    PuerperiumMonitor,
};
pub use pregnancy::{check_single_current_pregnancy, Pregnancy, PregnancyEndResult, PregnancyService};
