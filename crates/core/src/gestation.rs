//! Gestational date arithmetic.
//!
//! All calculations work on naive calendar dates. Timestamps are truncated to their date
//! before the difference is taken.

use crate::constants::{DAYS_PER_WEEK, PREGNANCY_DURATION_DAYS};
use chrono::{Days, NaiveDate, NaiveDateTime};
use serde::Serialize;

/// Estimated due date (Naegele's rule): LMP + 280 days.
///
/// Returns `None` only when the result would fall outside chrono's calendar range.
pub fn due_date(lmp: NaiveDate) -> Option<NaiveDate> {
    lmp.checked_add_days(Days::new(PREGNANCY_DURATION_DAYS))
}

/// Elapsed gestation from the LMP to an observation.
///
/// Negative values are kept as-is: an observation dated before the LMP yields a negative day
/// count, and weeks are floored (`-1` day is week `-1`).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct GestationalAge {
    days: i64,
}

impl GestationalAge {
    pub fn between(lmp: NaiveDate, observed: NaiveDate) -> Self {
        Self {
            days: (observed - lmp).num_days(),
        }
    }

    pub fn at(lmp: NaiveDate, observed: NaiveDateTime) -> Self {
        Self::between(lmp, observed.date())
    }

    pub fn days(&self) -> i64 {
        self.days
    }

    pub fn weeks(&self) -> i64 {
        self.days.div_euclid(DAYS_PER_WEEK)
    }
}

/// Length of a pregnancy in whole weeks at its end, or 0 while no end is recorded.
pub fn end_of_pregnancy_weeks(lmp: NaiveDate, end: Option<NaiveDateTime>) -> i64 {
    end.map(|end| GestationalAge::at(lmp, end).weeks())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_due_date_known_value() {
        assert_eq!(due_date(date(2024, 1, 1)), Some(date(2024, 10, 7)));
    }

    #[test]
    fn test_due_date_is_exactly_280_days_across_years() {
        for lmp in [date(2023, 3, 1), date(2023, 12, 31), date(2024, 2, 29)] {
            let pdd = due_date(lmp).unwrap();
            assert_eq!((pdd - lmp).num_days(), 280);
        }
    }

    #[test]
    fn test_weeks_floor() {
        let lmp = date(2024, 1, 1);
        assert_eq!(GestationalAge::between(lmp, date(2024, 1, 7)).weeks(), 0);
        assert_eq!(GestationalAge::between(lmp, date(2024, 1, 8)).weeks(), 1);
        assert_eq!(GestationalAge::between(lmp, date(2024, 3, 4)).weeks(), 9);
    }

    #[test]
    fn test_negative_gestation_is_permitted() {
        let lmp = date(2024, 1, 10);
        let age = GestationalAge::between(lmp, date(2024, 1, 9));
        assert_eq!(age.days(), -1);
        assert_eq!(age.weeks(), -1);

        let age = GestationalAge::between(lmp, date(2024, 1, 3));
        assert_eq!(age.days(), -7);
        assert_eq!(age.weeks(), -1);
    }

    #[test]
    fn test_end_of_pregnancy_weeks() {
        let lmp = date(2024, 1, 1);
        assert_eq!(end_of_pregnancy_weeks(lmp, None), 0);

        let end = date(2024, 9, 30).and_hms_opt(23, 59, 0).unwrap();
        assert_eq!(end_of_pregnancy_weeks(lmp, Some(end)), 39);
    }
}
