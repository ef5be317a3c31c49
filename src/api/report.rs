use crate::api::attendance::{AdminAttendanceQuery, fetch_attendance_for};
use crate::auth::auth::AuthUser;
use crate::error::ApiError;
use crate::model::attendance::{AttendanceRecord, AttendanceStatus, round_hours};
use actix_web::{HttpResponse, web};
use chrono::Utc;
use serde::Serialize;
use serde_json::json;
use sqlx::MySqlPool;
use std::collections::BTreeMap;
use utoipa::ToSchema;

#[derive(Debug, Serialize, ToSchema, Default)]
pub struct DepartmentStats {
    pub present: i64,
    pub on_leave: i64,
    pub half_day: i64,
    pub avg_hours: f64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AttendanceStats {
    pub total_employees: i64,
    pub present_today: i64,
    pub absent_today: i64,
    pub on_leave_today: i64,
    pub half_day_today: i64,
    pub avg_working_hours: f64,
    pub department_stats: BTreeMap<String, DepartmentStats>,
}

/// Today's headline numbers for the admin dashboard.
#[utoipa::path(
    get,
    path = "/api/attendance/stats",
    responses(
        (status = 200, description = "Attendance stats for today", body = AttendanceStats),
        (status = 401, description = "Unauthenticated"),
        (status = 403, description = "Admin access required")
    ),
    security(("bearer_auth" = [])),
    tag = "Reports"
)]
pub async fn attendance_stats(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
) -> Result<HttpResponse, ApiError> {
    auth.require_admin()?;

    let today = Utc::now().date_naive();

    let total_employees = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM users WHERE role = 'employee' AND is_active = TRUE",
    )
    .fetch_one(pool.get_ref())
    .await?;

    let rows = fetch_attendance_for(pool.get_ref(), today, None).await?;
    let stats = compute_stats(total_employees, &rows);

    Ok(HttpResponse::Ok().json(json!({ "stats": stats })))
}

/// Pure aggregation over one day's persisted rows. Employees with no row at
/// all count as absent, on top of any persisted absent rows.
pub fn compute_stats(total_employees: i64, rows: &[AttendanceRecord]) -> AttendanceStats {
    let mut present = 0i64;
    let mut on_leave = 0i64;
    let mut half_day = 0i64;

    for row in rows {
        match row.status {
            AttendanceStatus::Present => present += 1,
            AttendanceStatus::OnLeave => on_leave += 1,
            AttendanceStatus::HalfDay => half_day += 1,
            AttendanceStatus::Absent => {}
        }
    }

    let working: Vec<f64> = rows
        .iter()
        .filter(|r| r.total_hours > 0.0)
        .map(|r| r.total_hours)
        .collect();
    let avg_working_hours = if working.is_empty() {
        0.0
    } else {
        working.iter().sum::<f64>() / working.len() as f64
    };

    let mut department_stats: BTreeMap<String, DepartmentStats> = BTreeMap::new();
    let mut dept_hours: BTreeMap<String, (f64, i64)> = BTreeMap::new();
    for row in rows {
        let dept = row.department.clone().unwrap_or_else(|| "unassigned".into());
        let entry = department_stats.entry(dept.clone()).or_default();
        match row.status {
            AttendanceStatus::Present => entry.present += 1,
            AttendanceStatus::OnLeave => entry.on_leave += 1,
            AttendanceStatus::HalfDay => entry.half_day += 1,
            AttendanceStatus::Absent => {}
        }
        let (sum, n) = dept_hours.entry(dept).or_insert((0.0, 0));
        if row.total_hours > 0.0 {
            *sum += row.total_hours;
            *n += 1;
        }
    }
    for (dept, (sum, n)) in dept_hours {
        if let Some(entry) = department_stats.get_mut(&dept) {
            entry.avg_hours = if n > 0 { round_hours(sum / n as f64) } else { 0.0 };
        }
    }

    AttendanceStats {
        total_employees,
        present_today: present,
        absent_today: (total_employees - rows.len() as i64).max(0),
        on_leave_today: on_leave,
        half_day_today: half_day,
        avg_working_hours: round_hours(avg_working_hours),
        department_stats,
    }
}

/// CSV export of one day's persisted attendance.
#[utoipa::path(
    get,
    path = "/api/attendance/export",
    params(AdminAttendanceQuery),
    responses(
        (status = 200, description = "CSV attachment", content_type = "text/csv"),
        (status = 401, description = "Unauthenticated"),
        (status = 403, description = "Admin access required")
    ),
    security(("bearer_auth" = [])),
    tag = "Reports"
)]
pub async fn export_attendance(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<AdminAttendanceQuery>,
) -> Result<HttpResponse, ApiError> {
    auth.require_admin()?;

    let date = query.date.unwrap_or_else(|| Utc::now().date_naive());
    let rows = fetch_attendance_for(pool.get_ref(), date, query.department.as_deref()).await?;

    let csv = to_csv(&rows);

    Ok(HttpResponse::Ok()
        .content_type("text/csv")
        .insert_header((
            "Content-Disposition",
            format!("attachment; filename=\"attendance-report-{date}.csv\""),
        ))
        .body(csv))
}

const CSV_HEADERS: [&str; 8] = [
    "Employee ID",
    "Employee Name",
    "Department",
    "Date",
    "Clock In",
    "Clock Out",
    "Total Hours",
    "Status",
];

/// Every field is quoted; embedded quotes double per RFC 4180.
pub fn to_csv(rows: &[AttendanceRecord]) -> String {
    let mut out = CSV_HEADERS.join(",");
    out.push('\n');

    for row in rows {
        let fields = [
            row.employee_code.clone().unwrap_or_default(),
            row.employee_name.clone(),
            row.department.clone().unwrap_or_default(),
            row.date.to_string(),
            row.clock_in.map(|t| t.format("%H:%M:%S").to_string()).unwrap_or_default(),
            row.clock_out.map(|t| t.format("%H:%M:%S").to_string()).unwrap_or_default(),
            format!("{:.2}", round_hours(row.total_hours)),
            row.status.as_ref().to_string(),
        ];
        let line = fields
            .iter()
            .map(|f| format!("\"{}\"", f.replace('"', "\"\"")))
            .collect::<Vec<_>>()
            .join(",");
        out.push_str(&line);
        out.push('\n');
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn row(
        name: &str,
        dept: &str,
        status: AttendanceStatus,
        hours: f64,
    ) -> AttendanceRecord {
        AttendanceRecord {
            id: Some(1),
            user_id: 1,
            employee_code: Some("EMP001".into()),
            employee_name: name.into(),
            department: Some(dept.into()),
            date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            clock_in: None,
            clock_out: None,
            total_hours: hours,
            status,
            leave_type: None,
        }
    }

    #[test]
    fn stats_count_by_status_and_derive_absent() {
        let rows = vec![
            row("A", "Eng", AttendanceStatus::Present, 8.0),
            row("B", "Eng", AttendanceStatus::HalfDay, 3.0),
            row("C", "Ops", AttendanceStatus::OnLeave, 0.0),
        ];
        let stats = compute_stats(5, &rows);

        assert_eq!(stats.present_today, 1);
        assert_eq!(stats.half_day_today, 1);
        assert_eq!(stats.on_leave_today, 1);
        // 5 employees, 3 rows => 2 never showed up at all
        assert_eq!(stats.absent_today, 2);
        assert_eq!(stats.avg_working_hours, 5.5);

        let eng = &stats.department_stats["Eng"];
        assert_eq!(eng.present, 1);
        assert_eq!(eng.half_day, 1);
        assert_eq!(eng.avg_hours, 5.5);
        assert_eq!(stats.department_stats["Ops"].on_leave, 1);
    }

    #[test]
    fn stats_on_empty_day() {
        let stats = compute_stats(3, &[]);
        assert_eq!(stats.absent_today, 3);
        assert_eq!(stats.avg_working_hours, 0.0);
        assert!(stats.department_stats.is_empty());
    }

    #[test]
    fn csv_has_header_and_quoted_fields() {
        let mut r = row("Doe, John", "Eng", AttendanceStatus::Present, 7.456);
        r.clock_in = Some("2024-03-01T09:00:00".parse().unwrap());

        let csv = to_csv(&[r]);
        let mut lines = csv.lines();

        assert_eq!(lines.next().unwrap(), CSV_HEADERS.join(","));
        let data = lines.next().unwrap();
        assert!(data.contains("\"Doe, John\""));
        assert!(data.contains("\"09:00:00\""));
        assert!(data.contains("\"7.46\""));
        assert!(data.contains("\"present\""));
        assert!(lines.next().is_none());
    }

    #[test]
    fn csv_escapes_embedded_quotes() {
        let r = row("Jo \"JJ\" Smith", "Eng", AttendanceStatus::Present, 8.0);
        let csv = to_csv(&[r]);
        assert!(csv.contains("\"Jo \"\"JJ\"\" Smith\""));
    }
}
