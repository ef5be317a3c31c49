use crate::auth::auth::AuthUser;
use crate::error::{ApiError, is_duplicate_key};
use crate::model::user::PublicUser;
use crate::utils::db_utils::{build_update_sql, execute_update};
use actix_web::{HttpResponse, web};
use serde::Serialize;
use serde_json::{Map, Value, json};
use sqlx::MySqlPool;
use std::collections::BTreeMap;
use tracing::error;
use utoipa::ToSchema;

const PUBLIC_USER_COLUMNS: &str =
    "id, name, email, role, department, employee_code, is_active, last_login_at";

/// Columns the admin update endpoint may touch. Role and password changes go
/// through dedicated flows (or nowhere: role is immutable by design).
const UPDATABLE_COLUMNS: [&str; 5] = ["name", "department", "phone", "employee_code", "is_active"];

#[derive(Serialize, ToSchema)]
pub struct UserStats {
    pub total_users: i64,
    pub active_users: i64,
    pub admin_users: i64,
    pub employee_users: i64,
    pub department_breakdown: BTreeMap<String, i64>,
}

#[utoipa::path(
    get,
    path = "/api/admin/users",
    responses(
        (status = 200, description = "All accounts plus aggregate stats"),
        (status = 401, description = "Unauthenticated"),
        (status = 403, description = "Admin access required")
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn list_users(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
) -> Result<HttpResponse, ApiError> {
    auth.require_admin()?;

    let users = sqlx::query_as::<_, PublicUser>(&format!(
        "SELECT {PUBLIC_USER_COLUMNS} FROM users ORDER BY id DESC"
    ))
    .fetch_all(pool.get_ref())
    .await?;

    let stats = user_stats(&users);

    Ok(HttpResponse::Ok().json(json!({ "users": users, "stats": stats })))
}

pub fn user_stats(users: &[PublicUser]) -> UserStats {
    let mut department_breakdown: BTreeMap<String, i64> = BTreeMap::new();
    for user in users {
        let dept = user.department.clone().unwrap_or_else(|| "unassigned".into());
        *department_breakdown.entry(dept).or_insert(0) += 1;
    }

    UserStats {
        total_users: users.len() as i64,
        active_users: users.iter().filter(|u| u.is_active).count() as i64,
        admin_users: users.iter().filter(|u| u.role == "admin").count() as i64,
        employee_users: users.iter().filter(|u| u.role == "employee").count() as i64,
        department_breakdown,
    }
}

/// Partial update of an account (activate/deactivate, department moves).
#[utoipa::path(
    put,
    path = "/api/admin/users/{user_id}",
    params(("user_id" = u64, Path, description = "Account to update")),
    responses(
        (status = 200, description = "User updated"),
        (status = 400, description = "Empty payload or non-updatable field"),
        (status = 401, description = "Unauthenticated"),
        (status = 403, description = "Admin access required"),
        (status = 404, description = "User not found"),
        (status = 409, description = "Employee ID already exists")
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn update_user(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<i64>,
    body: web::Json<Value>,
) -> Result<HttpResponse, ApiError> {
    auth.require_admin()?;

    let user_id = path.into_inner();
    let filtered = filter_updatable(&body)?;

    let update = build_update_sql("users", &filtered, "id", user_id)
        .map_err(|_| ApiError::validation("No fields provided for update"))?;

    let affected = match execute_update(pool.get_ref(), update).await {
        Ok(n) => n,
        Err(e) if is_duplicate_key(&e) => {
            return Err(ApiError::Conflict("Employee ID already exists"));
        }
        Err(e) => {
            error!(error = %e, user_id, "user update failed");
            return Err(e.into());
        }
    };

    if affected == 0 {
        return Ok(HttpResponse::NotFound().json(json!({ "message": "User not found" })));
    }

    Ok(HttpResponse::Ok().json(json!({ "message": "User updated successfully" })))
}

/// Rejects any key outside the updatable allow-list instead of silently
/// dropping it.
fn filter_updatable(payload: &Value) -> Result<Value, ApiError> {
    let obj = payload
        .as_object()
        .ok_or_else(|| ApiError::validation("Payload must be a JSON object"))?;

    let mut filtered = Map::new();
    for (key, value) in obj {
        if !UPDATABLE_COLUMNS.contains(&key.as_str()) {
            return Err(ApiError::Validation(format!("Field '{key}' cannot be updated")));
        }
        filtered.insert(key.clone(), value.clone());
    }

    if filtered.is_empty() {
        return Err(ApiError::validation("No fields provided for update"));
    }

    Ok(Value::Object(filtered))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn user(role: &str, dept: Option<&str>, active: bool) -> PublicUser {
        PublicUser {
            id: 1,
            name: "X".into(),
            email: "x@y.co".into(),
            role: role.into(),
            department: dept.map(Into::into),
            employee_code: None,
            is_active: active,
            last_login_at: None,
        }
    }

    #[test]
    fn stats_break_down_by_role_and_department() {
        let users = vec![
            user("admin", Some("Ops"), true),
            user("employee", Some("Eng"), true),
            user("employee", Some("Eng"), false),
            user("employee", None, true),
        ];
        let stats = user_stats(&users);

        assert_eq!(stats.total_users, 4);
        assert_eq!(stats.active_users, 3);
        assert_eq!(stats.admin_users, 1);
        assert_eq!(stats.employee_users, 3);
        assert_eq!(stats.department_breakdown["Eng"], 2);
        assert_eq!(stats.department_breakdown["unassigned"], 1);
    }

    #[test]
    fn update_filter_rejects_protected_fields() {
        assert!(filter_updatable(&json!({ "department": "Sales" })).is_ok());
        assert!(filter_updatable(&json!({ "password": "x" })).is_err());
        assert!(filter_updatable(&json!({ "role": "admin" })).is_err());
        assert!(filter_updatable(&json!({})).is_err());
    }
}
