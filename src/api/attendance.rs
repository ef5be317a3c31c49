use crate::auth::auth::AuthUser;
use crate::error::{ApiError, is_duplicate_key};
use crate::model::attendance::{
    AttendanceRecord, AttendanceStatus, RosterEmployee, merge_with_roster, round_hours,
    status_for_hours, worked_hours,
};
use actix_web::{HttpResponse, web};
use chrono::{Days, NaiveDate, NaiveDateTime, Utc};
use serde::Deserialize;
use serde_json::json;
use sqlx::MySqlPool;
use tracing::info;
use utoipa::IntoParams;

pub const ATTENDANCE_COLUMNS: &str = "id, user_id, employee_code, employee_name, department, \
     date, clock_in, clock_out, total_hours, status, leave_type";

#[derive(Deserialize, IntoParams)]
pub struct AdminAttendanceQuery {
    /// Defaults to today.
    pub date: Option<NaiveDate>,
    /// Omit for all departments.
    pub department: Option<String>,
}

/// Clock-in endpoint. Ensures exactly one attendance row for (user, today).
#[utoipa::path(
    post,
    path = "/api/attendance/clock-in",
    responses(
        (status = 200, description = "Clocked in successfully"),
        (status = 400, description = "Already clocked in today"),
        (status = 401, description = "Unauthenticated"),
        (status = 403, description = "Employee access required"),
        (status = 409, description = "Concurrent clock-in detected")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn clock_in(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
) -> Result<HttpResponse, ApiError> {
    auth.require_employee()?;

    let now = Utc::now().naive_utc();
    let today = now.date();

    let existing = sqlx::query_as::<_, (u64, Option<NaiveDateTime>)>(
        "SELECT id, clock_in FROM attendance WHERE user_id = ? AND date = ?",
    )
    .bind(auth.user_id)
    .bind(today)
    .fetch_optional(pool.get_ref())
    .await?;

    match existing {
        Some((_, Some(_))) => Err(ApiError::AlreadyClockedIn),

        // Row pre-created by leave approval or reconciliation: claim it.
        Some((id, None)) => {
            sqlx::query("UPDATE attendance SET clock_in = ?, status = ? WHERE id = ?")
                .bind(now)
                .bind(AttendanceStatus::Present)
                .bind(id)
                .execute(pool.get_ref())
                .await?;

            Ok(clocked_in_response(now))
        }

        None => {
            let user = sqlx::query_as::<_, (String, Option<String>, Option<String>)>(
                "SELECT name, department, employee_code FROM users WHERE id = ?",
            )
            .bind(auth.user_id)
            .fetch_optional(pool.get_ref())
            .await?
            .ok_or(ApiError::Unauthenticated("User not found"))?;

            let (name, department, employee_code) = user;

            let result = sqlx::query(
                r#"
                INSERT INTO attendance
                    (user_id, employee_code, employee_name, department, date,
                     clock_in, clock_out, total_hours, status)
                VALUES (?, ?, ?, ?, ?, ?, NULL, 0, ?)
                "#,
            )
            .bind(auth.user_id)
            .bind(&employee_code)
            .bind(&name)
            .bind(&department)
            .bind(today)
            .bind(now)
            .bind(AttendanceStatus::Present)
            .execute(pool.get_ref())
            .await;

            match result {
                Ok(_) => Ok(clocked_in_response(now)),
                // A racing clock-in inserted first; the unique key on
                // (user_id, date) turns that into a retriable conflict.
                Err(e) if is_duplicate_key(&e) => {
                    info!(user_id = auth.user_id, "concurrent clock-in detected");
                    Err(ApiError::ConcurrentClockInConflict)
                }
                Err(e) => Err(e.into()),
            }
        }
    }
}

fn clocked_in_response(now: NaiveDateTime) -> HttpResponse {
    HttpResponse::Ok().json(json!({
        "message": "Clocked in successfully",
        "clock_in_time": now,
    }))
}

/// Clock-out endpoint. Computes total hours and derives the day's status.
#[utoipa::path(
    post,
    path = "/api/attendance/clock-out",
    responses(
        (status = 200, description = "Clocked out successfully, returns total hours"),
        (status = 400, description = "No clock in record found / already clocked out"),
        (status = 401, description = "Unauthenticated"),
        (status = 403, description = "Employee access required")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn clock_out(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
) -> Result<HttpResponse, ApiError> {
    auth.require_employee()?;

    let now = Utc::now().naive_utc();
    let today = now.date();

    let row = sqlx::query_as::<_, (u64, Option<NaiveDateTime>, Option<NaiveDateTime>)>(
        "SELECT id, clock_in, clock_out FROM attendance WHERE user_id = ? AND date = ?",
    )
    .bind(auth.user_id)
    .bind(today)
    .fetch_optional(pool.get_ref())
    .await?;

    let (id, clock_in) = match row {
        None | Some((_, None, _)) => return Err(ApiError::NoClockInFound),
        Some((_, Some(_), Some(_))) => return Err(ApiError::AlreadyClockedOut),
        Some((id, Some(clock_in), None)) => (id, clock_in),
    };

    let total_hours = worked_hours(clock_in, now);
    let status = status_for_hours(total_hours);

    sqlx::query("UPDATE attendance SET clock_out = ?, total_hours = ?, status = ? WHERE id = ?")
        .bind(now)
        .bind(total_hours)
        .bind(status)
        .bind(id)
        .execute(pool.get_ref())
        .await?;

    Ok(HttpResponse::Ok().json(json!({
        "message": "Clocked out successfully",
        "clock_out_time": now,
        "total_hours": round_hours(total_hours),
    })))
}

/// The caller's own attendance: today plus the trailing week.
#[utoipa::path(
    get,
    path = "/api/attendance/me",
    responses(
        (status = 200, description = "Today's record (may be null) and the last 7 days"),
        (status = 401, description = "Unauthenticated"),
        (status = 403, description = "Employee access required")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn my_attendance(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
) -> Result<HttpResponse, ApiError> {
    auth.require_employee()?;

    let today = Utc::now().date_naive();
    let week_ago = today
        .checked_sub_days(Days::new(7))
        .unwrap_or(NaiveDate::MIN);

    let today_attendance = sqlx::query_as::<_, AttendanceRecord>(&format!(
        "SELECT {ATTENDANCE_COLUMNS} FROM attendance WHERE user_id = ? AND date = ?"
    ))
    .bind(auth.user_id)
    .bind(today)
    .fetch_optional(pool.get_ref())
    .await?;

    let recent_attendance = sqlx::query_as::<_, AttendanceRecord>(&format!(
        "SELECT {ATTENDANCE_COLUMNS} FROM attendance \
         WHERE user_id = ? AND date >= ? ORDER BY date DESC"
    ))
    .bind(auth.user_id)
    .bind(week_ago)
    .fetch_all(pool.get_ref())
    .await?;

    Ok(HttpResponse::Ok().json(json!({
        "today_attendance": today_attendance,
        "recent_attendance": recent_attendance,
    })))
}

/// Admin attendance view: one row per active employee in scope. Employees
/// without a persisted row for the date get a synthesized absent row; the
/// merge never writes anything back.
#[utoipa::path(
    get,
    path = "/api/attendance/admin",
    params(AdminAttendanceQuery),
    responses(
        (status = 200, description = "Complete attendance rows for the date", body = [AttendanceRecord]),
        (status = 401, description = "Unauthenticated"),
        (status = 403, description = "Admin access required")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn admin_attendance(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<AdminAttendanceQuery>,
) -> Result<HttpResponse, ApiError> {
    auth.require_admin()?;

    let date = query.date.unwrap_or_else(|| Utc::now().date_naive());

    let records = fetch_attendance_for(pool.get_ref(), date, query.department.as_deref()).await?;

    let mut roster_sql = String::from(
        "SELECT id, name, department, employee_code FROM users \
         WHERE role = 'employee' AND is_active = TRUE",
    );
    if query.department.is_some() {
        roster_sql.push_str(" AND department = ?");
    }
    roster_sql.push_str(" ORDER BY name");

    let mut roster_query = sqlx::query_as::<_, RosterEmployee>(&roster_sql);
    if let Some(dept) = query.department.as_deref() {
        roster_query = roster_query.bind(dept);
    }
    let roster = roster_query.fetch_all(pool.get_ref()).await?;

    let complete = merge_with_roster(&roster, records, date);

    Ok(HttpResponse::Ok().json(json!({ "attendance_records": complete })))
}

/// Persisted attendance rows for a date, optionally filtered by department.
/// Shared by the admin view, stats and CSV export.
pub async fn fetch_attendance_for(
    pool: &MySqlPool,
    date: NaiveDate,
    department: Option<&str>,
) -> Result<Vec<AttendanceRecord>, ApiError> {
    let mut sql = format!("SELECT {ATTENDANCE_COLUMNS} FROM attendance WHERE date = ?");
    if department.is_some() {
        sql.push_str(" AND department = ?");
    }
    sql.push_str(" ORDER BY employee_name");

    let mut query = sqlx::query_as::<_, AttendanceRecord>(&sql).bind(date);
    if let Some(dept) = department {
        query = query.bind(dept);
    }

    Ok(query.fetch_all(pool).await?)
}
