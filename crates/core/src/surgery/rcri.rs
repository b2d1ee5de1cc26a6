//! Revised Cardiac Risk Index.

use crate::store::Model;
use chrono::NaiveDateTime;
use clinrec_uuid::RecordId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// RCRI risk class.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RcriClass {
    I,
    II,
    III,
    IV,
}

impl RcriClass {
    /// Class for a factor count: 0 -> I, 1 -> II, 2 -> III, anything higher -> IV.
    pub fn from_total(total: u32) -> Self {
        match total {
            0 => RcriClass::I,
            1 => RcriClass::II,
            2 => RcriClass::III,
            _ => RcriClass::IV,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RcriClass::I => "I",
            RcriClass::II => "II",
            RcriClass::III => "III",
            RcriClass::IV => "IV",
        }
    }
}

impl fmt::Display for RcriClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The six RCRI predictors.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CardiacRiskFactors {
    /// Suprainguinal vascular, intraperitoneal or intrathoracic surgery.
    pub rcri_high_risk_surgery: bool,
    pub rcri_ischemic_history: bool,
    pub rcri_congestive_history: bool,
    /// Preoperative diabetes on insulin.
    pub rcri_diabetes_history: bool,
    pub rcri_cerebrovascular_history: bool,
    /// Preoperative creatinine above 2 mg/dL.
    pub rcri_kidney_history: bool,
}

impl CardiacRiskFactors {
    /// Number of predictors present, 0 to 6.
    pub fn total(&self) -> u32 {
        [
            self.rcri_high_risk_surgery,
            self.rcri_ischemic_history,
            self.rcri_congestive_history,
            self.rcri_diabetes_history,
            self.rcri_cerebrovascular_history,
            self.rcri_kidney_history,
        ]
        .into_iter()
        .filter(|present| *present)
        .count() as u32
    }

    pub fn class(&self) -> RcriClass {
        RcriClass::from_total(self.total())
    }
}

/// A dated RCRI assessment. Total and class are derived on read.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Rcri {
    pub patient: RecordId,
    pub rcri_date: NaiveDateTime,
    #[serde(default)]
    pub health_professional: Option<RecordId>,
    #[serde(flatten)]
    pub factors: CardiacRiskFactors,
}

impl Model for Rcri {
    const MODEL: &'static str = "patient.rcri";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ischemic_and_kidney_is_class_three() {
        let factors = CardiacRiskFactors {
            rcri_ischemic_history: true,
            rcri_kidney_history: true,
            ..CardiacRiskFactors::default()
        };
        assert_eq!(factors.total(), 2);
        assert_eq!(factors.class(), RcriClass::III);
    }

    #[test]
    fn test_class_boundaries() {
        assert_eq!(RcriClass::from_total(0), RcriClass::I);
        assert_eq!(RcriClass::from_total(1), RcriClass::II);
        assert_eq!(RcriClass::from_total(2), RcriClass::III);
        for total in 3..=10 {
            assert_eq!(RcriClass::from_total(total), RcriClass::IV);
        }
    }

    #[test]
    fn test_total_counts_every_combination() {
        for mask in 0u32..64 {
            let bit = |n: u32| mask & (1 << n) != 0;
            let factors = CardiacRiskFactors {
                rcri_high_risk_surgery: bit(0),
                rcri_ischemic_history: bit(1),
                rcri_congestive_history: bit(2),
                rcri_diabetes_history: bit(3),
                rcri_cerebrovascular_history: bit(4),
                rcri_kidney_history: bit(5),
            };
            assert_eq!(factors.total(), mask.count_ones());
            assert_eq!(factors.class(), RcriClass::from_total(mask.count_ones()));
        }
    }

    #[test]
    fn test_no_factors_defaults_to_class_one() {
        let factors = CardiacRiskFactors::default();
        assert_eq!((factors.total(), factors.class()), (0, RcriClass::I));
        assert_eq!(RcriClass::I.to_string(), "I");
    }
}
