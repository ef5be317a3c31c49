use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use strum_macros::{AsRefStr, Display, EnumString};
use utoipa::ToSchema;

/// Hours below this threshold turn a completed day into `half_day`.
pub const HALF_DAY_THRESHOLD_HOURS: f64 = 4.0;

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
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum AttendanceStatus {
    Present,
    Absent,
    HalfDay,
    OnLeave,
}

/// One attendance row per (user, calendar date). `id` is `None` only for
/// rows synthesized in the read path; those are never persisted.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct AttendanceRecord {
    #[schema(example = 1, nullable = true)]
    pub id: Option<u64>,
    #[schema(example = 42)]
    pub user_id: u64,
    #[schema(example = "EMP001", nullable = true)]
    pub employee_code: Option<String>,
    #[schema(example = "John Doe")]
    pub employee_name: String,
    #[schema(example = "Engineering", nullable = true)]
    pub department: Option<String>,
    #[schema(value_type = String, format = "date", example = "2026-01-05")]
    pub date: NaiveDate,
    #[schema(value_type = Option<String>, format = "date-time")]
    pub clock_in: Option<NaiveDateTime>,
    #[schema(value_type = Option<String>, format = "date-time")]
    pub clock_out: Option<NaiveDateTime>,
    #[schema(example = 7.5)]
    pub total_hours: f64,
    pub status: AttendanceStatus,
    #[schema(example = "sick", nullable = true)]
    pub leave_type: Option<String>,
}

/// Active employee as seen by the admin attendance view, before the merge
/// with persisted rows.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct RosterEmployee {
    pub id: u64,
    pub name: String,
    pub department: Option<String>,
    pub employee_code: Option<String>,
}

/// Fractional hours between clock-in and clock-out. A negative delta (clock
/// skew, tampered rows) clamps to zero rather than rejecting the clock-out,
/// so the employee can still close the day.
pub fn worked_hours(clock_in: NaiveDateTime, clock_out: NaiveDateTime) -> f64 {
    let secs = (clock_out - clock_in).num_seconds();
    if secs < 0 {
        tracing::warn!(%clock_in, %clock_out, "clock-out precedes clock-in, clamping to 0h");
        return 0.0;
    }
    secs as f64 / 3600.0
}

pub fn status_for_hours(hours: f64) -> AttendanceStatus {
    if hours < HALF_DAY_THRESHOLD_HOURS {
        AttendanceStatus::HalfDay
    } else {
        AttendanceStatus::Present
    }
}

/// Two-decimal rounding for response payloads and CSV cells only; the stored
/// value keeps full precision.
pub fn round_hours(hours: f64) -> f64 {
    (hours * 100.0).round() / 100.0
}

/// Read-time default for an employee with no persisted row on `date`.
pub fn absent_row(employee: &RosterEmployee, date: NaiveDate) -> AttendanceRecord {
    AttendanceRecord {
        id: None,
        user_id: employee.id,
        employee_code: employee.employee_code.clone(),
        employee_name: employee.name.clone(),
        department: employee.department.clone(),
        date,
        clock_in: None,
        clock_out: None,
        total_hours: 0.0,
        status: AttendanceStatus::Absent,
        leave_type: None,
    }
}

/// Left-join the active-employee roster with the persisted rows for `date`:
/// one row per employee, a persisted row always wins, everyone else gets a
/// synthesized absent row. Pure; the caller decides what (if anything) to
/// write, which is nothing.
pub fn merge_with_roster(
    roster: &[RosterEmployee],
    records: Vec<AttendanceRecord>,
    date: NaiveDate,
) -> Vec<AttendanceRecord> {
    let mut by_user: HashMap<u64, AttendanceRecord> =
        records.into_iter().map(|r| (r.user_id, r)).collect();

    roster
        .iter()
        .map(|employee| {
            by_user
                .remove(&employee.id)
                .unwrap_or_else(|| absent_row(employee, date))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn dt(date: &str, time: &str) -> NaiveDateTime {
        format!("{date}T{time}").parse().unwrap()
    }

    fn emp(id: u64, name: &str, dept: &str) -> RosterEmployee {
        RosterEmployee {
            id,
            name: name.into(),
            department: Some(dept.into()),
            employee_code: Some(format!("EMP{id:03}")),
        }
    }

    #[test]
    fn full_day_is_present() {
        let hours = worked_hours(dt("2024-03-01", "09:00:00"), dt("2024-03-01", "17:30:00"));
        assert!((hours - 8.5).abs() < 1e-9);
        assert_eq!(status_for_hours(hours), AttendanceStatus::Present);
    }

    #[test]
    fn short_day_is_half_day() {
        let hours = worked_hours(dt("2024-03-01", "09:00:00"), dt("2024-03-01", "12:59:00"));
        assert!(hours < HALF_DAY_THRESHOLD_HOURS);
        assert_eq!(status_for_hours(hours), AttendanceStatus::HalfDay);
    }

    #[test]
    fn exactly_four_hours_is_present() {
        let hours = worked_hours(dt("2024-03-01", "08:00:00"), dt("2024-03-01", "12:00:00"));
        assert_eq!(status_for_hours(hours), AttendanceStatus::Present);
    }

    #[test]
    fn negative_delta_clamps_to_zero() {
        let hours = worked_hours(dt("2024-03-01", "17:00:00"), dt("2024-03-01", "09:00:00"));
        assert_eq!(hours, 0.0);
    }

    #[test]
    fn rounding_is_two_decimals() {
        assert_eq!(round_hours(7.456789), 7.46);
        assert_eq!(round_hours(0.0), 0.0);
    }

    #[test]
    fn merge_returns_one_row_per_employee() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let roster = vec![emp(1, "Alice", "Eng"), emp(2, "Bob", "Eng"), emp(3, "Cara", "Ops")];
        let mut persisted = absent_row(&roster[0], date);
        persisted.id = Some(99);
        persisted.status = AttendanceStatus::Present;
        persisted.clock_in = Some(dt("2024-03-01", "09:00:00"));
        persisted.total_hours = 8.0;

        let merged = merge_with_roster(&roster, vec![persisted], date);
        assert_eq!(merged.len(), 3);

        // persisted row wins for Alice
        assert_eq!(merged[0].id, Some(99));
        assert_eq!(merged[0].status, AttendanceStatus::Present);

        // everyone else is synthesized absent, zero hours, null clock times
        for row in &merged[1..] {
            assert_eq!(row.id, None);
            assert_eq!(row.status, AttendanceStatus::Absent);
            assert_eq!(row.total_hours, 0.0);
            assert!(row.clock_in.is_none() && row.clock_out.is_none());
            assert_eq!(row.date, date);
        }
    }

    #[test]
    fn status_serializes_snake_case() {
        let json = serde_json::to_string(&AttendanceStatus::HalfDay).unwrap();
        assert_eq!(json, "\"half_day\"");
        assert_eq!(AttendanceStatus::OnLeave.as_ref(), "on_leave");
    }
}
