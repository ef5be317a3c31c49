use crate::error::ApiError;
use chrono::{Days, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};
use utoipa::ToSchema;

#[derive(
    Debug,
    Copy,
    Clone,
    Eq,
    PartialEq,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
    sqlx::Type,
    ToSchema,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum LeaveStatus {
    Pending,
    Approved,
    Rejected,
}

/// Leave request row. Status moves one way from `pending`; `processed_by`
/// and `processed_at` are set by the approving or rejecting admin.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct LeaveRequest {
    #[schema(example = 1)]
    pub id: u64,
    #[schema(example = 42)]
    pub user_id: u64,
    #[schema(example = "EMP001", nullable = true)]
    pub employee_code: Option<String>,
    #[schema(example = "John Doe")]
    pub employee_name: String,
    #[schema(example = "Engineering", nullable = true)]
    pub department: Option<String>,
    #[schema(value_type = String, format = "date", example = "2026-02-01")]
    pub start_date: NaiveDate,
    #[schema(value_type = String, format = "date", example = "2026-02-03")]
    pub end_date: NaiveDate,
    #[schema(example = "sick")]
    pub leave_type: String,
    #[schema(example = "Flu")]
    pub reason: String,
    pub status: LeaveStatus,
    #[schema(value_type = String, format = "date-time")]
    pub applied_at: NaiveDateTime,
    #[schema(example = 1, nullable = true)]
    pub processed_by: Option<u64>,
    #[schema(value_type = Option<String>, format = "date-time")]
    pub processed_at: Option<NaiveDateTime>,
}

/// Inclusive date-range intersection: ranges that only share a boundary
/// date still overlap.
pub fn ranges_overlap(
    a_start: NaiveDate,
    a_end: NaiveDate,
    b_start: NaiveDate,
    b_end: NaiveDate,
) -> bool {
    a_start <= b_end && a_end >= b_start
}

/// Shared validation for leave submission: start must not follow end, and
/// must not lie strictly before `today`.
pub fn validate_range(start: NaiveDate, end: NaiveDate, today: NaiveDate) -> Result<(), ApiError> {
    if start > end {
        return Err(ApiError::InvalidDateRange);
    }
    if start < today {
        return Err(ApiError::PastDateLeave);
    }
    Ok(())
}

/// Every calendar date in [start, end] inclusive. Approval materializes one
/// attendance row per returned date (where none exists yet).
pub fn dates_between(start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
    let mut dates = Vec::new();
    let mut day = start;
    while day <= end {
        dates.push(day);
        match day.checked_add_days(Days::new(1)) {
            Some(next) => day = next,
            None => break,
        }
    }
    dates
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    #[test]
    fn shared_boundary_date_overlaps() {
        assert!(ranges_overlap(
            d("2024-01-10"),
            d("2024-01-12"),
            d("2024-01-12"),
            d("2024-01-14"),
        ));
    }

    #[test]
    fn containment_and_disjoint_ranges() {
        assert!(ranges_overlap(d("2024-01-01"), d("2024-01-31"), d("2024-01-10"), d("2024-01-12")));
        assert!(!ranges_overlap(d("2024-01-10"), d("2024-01-12"), d("2024-01-13"), d("2024-01-14")));
    }

    #[test]
    fn inverted_range_is_rejected() {
        let err = validate_range(d("2024-05-10"), d("2024-05-09"), d("2024-01-01")).unwrap_err();
        assert!(matches!(err, ApiError::InvalidDateRange));
    }

    #[test]
    fn past_start_is_rejected() {
        let err = validate_range(d("2024-05-01"), d("2024-05-03"), d("2024-05-02")).unwrap_err();
        assert!(matches!(err, ApiError::PastDateLeave));
    }

    #[test]
    fn today_is_a_valid_start() {
        assert!(validate_range(d("2024-05-02"), d("2024-05-02"), d("2024-05-02")).is_ok());
    }

    #[test]
    fn dates_between_is_inclusive() {
        let days = dates_between(d("2024-02-01"), d("2024-02-03"));
        assert_eq!(days, vec![d("2024-02-01"), d("2024-02-02"), d("2024-02-03")]);

        let single = dates_between(d("2024-02-01"), d("2024-02-01"));
        assert_eq!(single.len(), 1);
    }

    #[test]
    fn dates_between_spans_month_boundary() {
        let days = dates_between(d("2024-01-30"), d("2024-02-02"));
        assert_eq!(days.len(), 4);
        assert_eq!(*days.last().unwrap(), d("2024-02-02"));
    }

    #[test]
    fn status_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&LeaveStatus::Pending).unwrap(), "\"pending\"");
        assert_eq!(LeaveStatus::Approved.as_ref(), "approved");
    }
}
