use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Full user row, including the password hash. Never serialized to clients.
#[derive(Debug, sqlx::FromRow)]
pub struct User {
    pub id: u64,
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: String,
    pub department: Option<String>,
    pub employee_code: Option<String>,
    pub is_active: bool,
    pub last_login_at: Option<NaiveDateTime>,
}

/// Client-facing projection of a user (no password hash).
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct PublicUser {
    #[schema(example = 1)]
    pub id: u64,
    #[schema(example = "John Doe")]
    pub name: String,
    #[schema(example = "john.doe@company.com")]
    pub email: String,
    #[schema(example = "employee")]
    pub role: String,
    #[schema(example = "Engineering", nullable = true)]
    pub department: Option<String>,
    #[schema(example = "EMP001", nullable = true)]
    pub employee_code: Option<String>,
    pub is_active: bool,
    #[schema(value_type = Option<String>, format = "date-time")]
    pub last_login_at: Option<NaiveDateTime>,
}

impl From<User> for PublicUser {
    fn from(u: User) -> Self {
        PublicUser {
            id: u.id,
            name: u.name,
            email: u.email,
            role: u.role,
            department: u.department,
            employee_code: u.employee_code,
            is_active: u.is_active,
            last_login_at: u.last_login_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn public_projection_drops_password() {
        let user = User {
            id: 7,
            name: "Jane".into(),
            email: "jane@company.com".into(),
            password: "$argon2id$...".into(),
            role: "employee".into(),
            department: Some("Sales".into()),
            employee_code: Some("EMP007".into()),
            is_active: true,
            last_login_at: None,
        };

        let public = PublicUser::from(user);
        let json = serde_json::to_value(&public).unwrap();
        assert!(json.get("password").is_none());
        assert_eq!(json["email"], "jane@company.com");
    }
}
