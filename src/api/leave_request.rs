use crate::auth::auth::AuthUser;
use crate::error::ApiError;
use crate::model::attendance::AttendanceStatus;
use crate::model::leave_request::{LeaveRequest, LeaveStatus, dates_between, validate_range};
use actix_web::{HttpResponse, web};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::MySqlPool;
use tracing::info;
use utoipa::{IntoParams, ToSchema};

pub const LEAVE_COLUMNS: &str = "id, user_id, employee_code, employee_name, department, \
     start_date, end_date, leave_type, reason, status, applied_at, processed_by, processed_at";

#[derive(Deserialize, ToSchema)]
pub struct CreateLeave {
    #[schema(example = "2026-02-01", format = "date", value_type = String)]
    pub start_date: chrono::NaiveDate,
    #[schema(example = "2026-02-03", format = "date", value_type = String)]
    pub end_date: chrono::NaiveDate,
    #[schema(example = "sick")]
    pub leave_type: String,
    #[schema(example = "Flu, doctor's note attached")]
    pub reason: String,
}

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct LeaveFilter {
    /// Filter by the requesting user's id
    pub user_id: Option<u64>,
    /// Filter by leave status
    #[param(example = "pending")]
    pub status: Option<String>,
    /// Pagination page number (1-based)
    pub page: Option<u64>,
    /// Items per page
    pub per_page: Option<u64>,
}

// Helper enum for typed SQLx binding
enum FilterValue<'a> {
    U64(u64),
    Str(&'a str),
}

#[derive(Serialize, ToSchema)]
pub struct LeaveListResponse {
    pub data: Vec<LeaveRequest>,
    #[schema(example = 1)]
    pub page: u32,
    #[schema(example = 10)]
    pub per_page: u32,
    #[schema(example = 1)]
    pub total: i64,
}

/* =========================
Submit leave request
========================= */
#[utoipa::path(
    post,
    path = "/api/leave",
    request_body = CreateLeave,
    responses(
        (status = 201, description = "Leave request submitted, status pending"),
        (status = 400, description = "Invalid range, past start date, or overlapping request"),
        (status = 401, description = "Unauthenticated"),
        (status = 403, description = "Employee access required")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn create_leave(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<CreateLeave>,
) -> Result<HttpResponse, ApiError> {
    auth.require_employee()?;

    let leave_type = payload.leave_type.trim();
    let reason = payload.reason.trim();
    if leave_type.is_empty() || reason.is_empty() {
        return Err(ApiError::validation("All fields are required"));
    }

    let now = Utc::now().naive_utc();
    validate_range(payload.start_date, payload.end_date, now.date())?;

    // Inclusive intersection against every live (pending or approved)
    // request of this user.
    let overlapping = sqlx::query_scalar::<_, bool>(
        r#"
        SELECT EXISTS(
            SELECT 1 FROM leave_requests
            WHERE user_id = ?
              AND status IN ('pending', 'approved')
              AND start_date <= ?
              AND end_date >= ?
            LIMIT 1
        )
        "#,
    )
    .bind(auth.user_id)
    .bind(payload.end_date)
    .bind(payload.start_date)
    .fetch_one(pool.get_ref())
    .await?;

    if overlapping {
        return Err(ApiError::OverlappingLeaveRequest);
    }

    let user = sqlx::query_as::<_, (String, Option<String>, Option<String>)>(
        "SELECT name, department, employee_code FROM users WHERE id = ?",
    )
    .bind(auth.user_id)
    .fetch_optional(pool.get_ref())
    .await?
    .ok_or(ApiError::Unauthenticated("User not found"))?;

    let (name, department, employee_code) = user;

    sqlx::query(
        r#"
        INSERT INTO leave_requests
            (user_id, employee_code, employee_name, department,
             start_date, end_date, leave_type, reason, status, applied_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(auth.user_id)
    .bind(&employee_code)
    .bind(&name)
    .bind(&department)
    .bind(payload.start_date)
    .bind(payload.end_date)
    .bind(leave_type)
    .bind(reason)
    .bind(LeaveStatus::Pending)
    .bind(now)
    .execute(pool.get_ref())
    .await?;

    Ok(HttpResponse::Created().json(json!({
        "message": "Leave request submitted successfully"
    })))
}

/* =========================
Approve leave (Admin)
========================= */
/// Flips the request to approved, then materializes `on_leave` attendance
/// rows for every date in range that has none. The second phase is
/// `INSERT IGNORE` over the (user_id, date) unique key, so a retry after a
/// crash between the two phases is safe and days the employee already
/// clocked in on are left untouched.
#[utoipa::path(
    put,
    path = "/api/leave/{leave_id}/approve",
    params(("leave_id" = u64, Path, description = "Leave request to approve")),
    responses(
        (status = 200, description = "Leave approved, attendance rows created"),
        (status = 400, description = "Leave request already processed"),
        (status = 401, description = "Unauthenticated"),
        (status = 403, description = "Admin access required"),
        (status = 404, description = "Leave request not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn approve_leave(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> Result<HttpResponse, ApiError> {
    auth.require_admin()?;

    let leave_id = path.into_inner();
    let request = fetch_pending(pool.get_ref(), leave_id).await?;
    let now = Utc::now().naive_utc();

    let result = sqlx::query(
        r#"
        UPDATE leave_requests
        SET status = 'approved', processed_by = ?, processed_at = ?
        WHERE id = ? AND status = 'pending'
        "#,
    )
    .bind(auth.user_id)
    .bind(now)
    .bind(leave_id)
    .execute(pool.get_ref())
    .await?;

    // A concurrent approve/reject won the conditional update.
    if result.rows_affected() == 0 {
        return Err(ApiError::RequestAlreadyProcessed);
    }

    let dates = dates_between(request.start_date, request.end_date);

    let mut sql = String::from(
        "INSERT IGNORE INTO attendance \
         (user_id, employee_code, employee_name, department, date, \
          clock_in, clock_out, total_hours, status, leave_type) VALUES ",
    );
    sql.push_str(&vec!["(?, ?, ?, ?, ?, NULL, NULL, 0, ?, ?)"; dates.len()].join(", "));

    let mut query = sqlx::query(&sql);
    for day in &dates {
        query = query
            .bind(request.user_id)
            .bind(&request.employee_code)
            .bind(&request.employee_name)
            .bind(&request.department)
            .bind(day)
            .bind(AttendanceStatus::OnLeave)
            .bind(&request.leave_type);
    }
    let inserted = query.execute(pool.get_ref()).await?.rows_affected();

    info!(
        leave_id,
        user_id = request.user_id,
        days = dates.len(),
        inserted,
        "leave approved"
    );

    Ok(HttpResponse::Ok().json(json!({
        "message": "Leave request approved successfully"
    })))
}

/* =========================
Reject leave (Admin)
========================= */
#[utoipa::path(
    put,
    path = "/api/leave/{leave_id}/reject",
    params(("leave_id" = u64, Path, description = "Leave request to reject")),
    responses(
        (status = 200, description = "Leave rejected"),
        (status = 400, description = "Leave request already processed"),
        (status = 401, description = "Unauthenticated"),
        (status = 403, description = "Admin access required"),
        (status = 404, description = "Leave request not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn reject_leave(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> Result<HttpResponse, ApiError> {
    auth.require_admin()?;

    let leave_id = path.into_inner();
    fetch_pending(pool.get_ref(), leave_id).await?;

    let result = sqlx::query(
        r#"
        UPDATE leave_requests
        SET status = 'rejected', processed_by = ?, processed_at = ?
        WHERE id = ? AND status = 'pending'
        "#,
    )
    .bind(auth.user_id)
    .bind(Utc::now().naive_utc())
    .bind(leave_id)
    .execute(pool.get_ref())
    .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::RequestAlreadyProcessed);
    }

    info!(leave_id, "leave rejected");

    Ok(HttpResponse::Ok().json(json!({
        "message": "Leave request rejected successfully"
    })))
}

/// Loads the request and screens the terminal states, so callers report
/// `RequestNotFound` vs `RequestAlreadyProcessed` distinctly.
async fn fetch_pending(pool: &MySqlPool, leave_id: u64) -> Result<LeaveRequest, ApiError> {
    let request = sqlx::query_as::<_, LeaveRequest>(&format!(
        "SELECT {LEAVE_COLUMNS} FROM leave_requests WHERE id = ?"
    ))
    .bind(leave_id)
    .fetch_optional(pool)
    .await?
    .ok_or(ApiError::RequestNotFound)?;

    if request.status != LeaveStatus::Pending {
        return Err(ApiError::RequestAlreadyProcessed);
    }
    Ok(request)
}

/* =========================
Own leave requests
========================= */
#[utoipa::path(
    get,
    path = "/api/leave/me",
    responses(
        (status = 200, description = "Caller's leave requests, newest applied first", body = [LeaveRequest]),
        (status = 401, description = "Unauthenticated"),
        (status = 403, description = "Employee access required")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn my_leaves(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
) -> Result<HttpResponse, ApiError> {
    auth.require_employee()?;

    let requests = sqlx::query_as::<_, LeaveRequest>(&format!(
        "SELECT {LEAVE_COLUMNS} FROM leave_requests WHERE user_id = ? ORDER BY applied_at DESC"
    ))
    .bind(auth.user_id)
    .fetch_all(pool.get_ref())
    .await?;

    Ok(HttpResponse::Ok().json(json!({ "leave_requests": requests })))
}

/* =========================
Admin leave list
========================= */
#[utoipa::path(
    get,
    path = "/api/leave",
    params(LeaveFilter),
    responses(
        (status = 200, description = "Paginated leave list", body = LeaveListResponse),
        (status = 401, description = "Unauthenticated"),
        (status = 403, description = "Admin access required")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn leave_list(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<LeaveFilter>,
) -> Result<HttpResponse, ApiError> {
    auth.require_admin()?;

    let per_page = query.per_page.unwrap_or(10).min(100);
    let page = query.page.unwrap_or(1).max(1);
    let offset = (page - 1) * per_page;

    let mut where_sql = String::from(" WHERE 1=1");
    let mut args: Vec<FilterValue> = Vec::new();

    if let Some(user_id) = query.user_id {
        where_sql.push_str(" AND user_id = ?");
        args.push(FilterValue::U64(user_id));
    }

    if let Some(status) = query.status.as_deref() {
        where_sql.push_str(" AND status = ?");
        args.push(FilterValue::Str(status));
    }

    let count_sql = format!("SELECT COUNT(*) FROM leave_requests{}", where_sql);

    let mut count_q = sqlx::query_scalar::<_, i64>(&count_sql);
    for arg in &args {
        count_q = match arg {
            FilterValue::U64(v) => count_q.bind(*v),
            FilterValue::Str(s) => count_q.bind(*s),
        };
    }
    let total = count_q.fetch_one(pool.get_ref()).await?;

    let data_sql = format!(
        "SELECT {LEAVE_COLUMNS} FROM leave_requests{} ORDER BY applied_at DESC LIMIT ? OFFSET ?",
        where_sql
    );

    let mut data_q = sqlx::query_as::<_, LeaveRequest>(&data_sql);
    for arg in args {
        data_q = match arg {
            FilterValue::U64(v) => data_q.bind(v),
            FilterValue::Str(s) => data_q.bind(s),
        };
    }
    let requests = data_q
        .bind(per_page)
        .bind(offset)
        .fetch_all(pool.get_ref())
        .await?;

    Ok(HttpResponse::Ok().json(LeaveListResponse {
        data: requests,
        page: page as u32,
        per_page: per_page as u32,
        total,
    }))
}
