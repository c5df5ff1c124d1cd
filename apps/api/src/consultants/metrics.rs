//! Derived consultant figures: CJM, experience, availability, mission margins.

use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

use crate::models::consultant::ConsultantRow;

/// Employer cost multiplier applied to the gross annual salary.
pub const LOADED_COST_FACTOR: f64 = 1.8;
/// Billable days in a year used to spread the loaded cost.
pub const BILLABLE_DAYS_PER_YEAR: f64 = 216.0;

const DAYS_PER_YEAR: f64 = 365.25;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DerivedFields {
    pub cjm: Option<f64>,
    pub experience_years: Option<f64>,
    pub is_available_now: bool,
}

impl DerivedFields {
    pub fn for_consultant(row: &ConsultantRow, today: NaiveDate) -> Self {
        Self {
            cjm: compute_cjm(row.salary),
            experience_years: experience_years(row.first_mission_date, row.hire_date, today),
            is_available_now: is_available_on(row.available, row.availability_date, today),
        }
    }
}

/// CJM (average daily cost) = salary × 1.8 / 216, two decimals.
/// Missing or non-positive salaries have no CJM.
pub fn compute_cjm(salary: Option<f64>) -> Option<f64> {
    salary
        .filter(|s| *s > 0.0)
        .map(|s| round2(s * LOADED_COST_FACTOR / BILLABLE_DAYS_PER_YEAR))
}

/// Years since the first mission, falling back to the hire date. One decimal, never negative.
pub fn experience_years(
    first_mission_date: Option<NaiveDate>,
    hire_date: Option<NaiveDate>,
    today: NaiveDate,
) -> Option<f64> {
    let start = first_mission_date.or(hire_date)?;
    let days = (today - start).num_days().max(0) as f64;
    Some(round1(days / DAYS_PER_YEAR))
}

/// Flagged available, or the announced availability date has been reached.
pub fn is_available_on(
    available: bool,
    availability_date: Option<NaiveDate>,
    today: NaiveDate,
) -> bool {
    available || availability_date.is_some_and(|d| d <= today)
}

/// Monday–Friday days in `[start, end]`. Zero when `end < start`.
pub fn working_days_between(start: NaiveDate, end: NaiveDate) -> i64 {
    if end < start {
        return 0;
    }
    let total = (end - start).num_days() + 1;
    let full_weeks = total / 7;
    let mut days = full_weeks * 5;
    let mut cursor = start + chrono::Duration::days(full_weeks * 7);
    while cursor <= end {
        if !matches!(cursor.weekday(), Weekday::Sat | Weekday::Sun) {
            days += 1;
        }
        cursor += chrono::Duration::days(1);
    }
    days
}

/// (TJM − CJM) / TJM, as a ratio. Needs a positive TJM and a known CJM.
pub fn margin_rate(daily_rate: Option<f64>, cjm: Option<f64>) -> Option<f64> {
    match (daily_rate, cjm) {
        (Some(tjm), Some(cjm)) if tjm > 0.0 => Some(round2((tjm - cjm) / tjm)),
        _ => None,
    }
}

pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_cjm_from_salary() {
        // 48_000 * 1.8 / 216 = 400
        assert_eq!(compute_cjm(Some(48_000.0)), Some(400.0));
        // 45_000 * 1.8 / 216 = 375
        assert_eq!(compute_cjm(Some(45_000.0)), Some(375.0));
    }

    #[test]
    fn test_cjm_rounds_to_cents() {
        // 50_000 * 1.8 / 216 = 416.666...
        assert_eq!(compute_cjm(Some(50_000.0)), Some(416.67));
    }

    #[test]
    fn test_cjm_missing_or_zero_salary() {
        assert_eq!(compute_cjm(None), None);
        assert_eq!(compute_cjm(Some(0.0)), None);
        assert_eq!(compute_cjm(Some(-10.0)), None);
    }

    #[test]
    fn test_experience_prefers_first_mission() {
        let today = date(2024, 1, 1);
        let years = experience_years(Some(date(2019, 1, 1)), Some(date(2015, 1, 1)), today);
        assert_eq!(years, Some(5.0));
    }

    #[test]
    fn test_experience_falls_back_to_hire_date() {
        let today = date(2024, 7, 1);
        let years = experience_years(None, Some(date(2022, 1, 1)), today);
        assert_eq!(years, Some(2.5));
    }

    #[test]
    fn test_experience_future_start_is_zero() {
        let today = date(2024, 1, 1);
        assert_eq!(experience_years(Some(date(2025, 1, 1)), None, today), Some(0.0));
        assert_eq!(experience_years(None, None, today), None);
    }

    #[test]
    fn test_availability_rules() {
        let today = date(2024, 3, 15);
        assert!(is_available_on(true, None, today));
        assert!(is_available_on(false, Some(date(2024, 3, 15)), today));
        assert!(!is_available_on(false, Some(date(2024, 4, 1)), today));
        assert!(!is_available_on(false, None, today));
    }

    #[test]
    fn test_working_days_single_week() {
        // Monday 2024-03-04 .. Sunday 2024-03-10
        assert_eq!(working_days_between(date(2024, 3, 4), date(2024, 3, 10)), 5);
        // Saturday alone
        assert_eq!(working_days_between(date(2024, 3, 9), date(2024, 3, 9)), 0);
    }

    #[test]
    fn test_working_days_multi_week_and_reversed() {
        // Wednesday 2024-01-03 .. Tuesday 2024-01-16: 2 weeks → 10 days
        assert_eq!(working_days_between(date(2024, 1, 3), date(2024, 1, 16)), 10);
        assert_eq!(working_days_between(date(2024, 1, 16), date(2024, 1, 3)), 0);
    }

    #[test]
    fn test_margin_rate() {
        assert_eq!(margin_rate(Some(600.0), Some(400.0)), Some(0.33));
        assert_eq!(margin_rate(Some(0.0), Some(400.0)), None);
        assert_eq!(margin_rate(None, Some(400.0)), None);
    }
}
