use crate::config::Config;
use crate::error::ApiError;
use crate::models::{Claims, TokenType};
use crate::model::role::Role;
use actix_web::{FromRequest, HttpRequest, dev::Payload, web::Data};
use futures::future::{Ready, ready};
use jsonwebtoken::{DecodingKey, Validation, decode};

/// Authenticated caller, extracted from the bearer token on every protected
/// handler.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: u64,
    pub email: String,
    pub role: Role,
    pub department: Option<String>,
    pub employee_code: Option<String>,
}

impl FromRequest for AuthUser {
    type Error = ApiError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let token = match req
            .headers()
            .get("Authorization")
            .and_then(|h| h.to_str().ok())
            .and_then(|h| h.strip_prefix("Bearer "))
        {
            Some(t) => t,
            None => return ready(Err(ApiError::Unauthenticated("Authorization token required"))),
        };

        let config = match req.app_data::<Data<Config>>() {
            Some(c) => c,
            None => return ready(Err(ApiError::Internal)),
        };

        let data = match decode::<Claims>(
            token,
            &DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            &Validation::default(),
        ) {
            Ok(d) => d,
            Err(_) => return ready(Err(ApiError::Unauthenticated("Invalid or expired token"))),
        };

        // Refresh tokens only work against /auth/refresh and /auth/logout.
        if data.claims.token_type != TokenType::Access {
            return ready(Err(ApiError::Unauthenticated("Invalid or expired token")));
        }

        let role = match Role::from_str_opt(&data.claims.role) {
            Some(r) => r,
            None => return ready(Err(ApiError::Unauthenticated("Invalid role"))),
        };

        ready(Ok(AuthUser {
            user_id: data.claims.user_id,
            email: data.claims.sub,
            role,
            department: data.claims.department,
            employee_code: data.claims.employee_code,
        }))
    }
}

impl AuthUser {
    pub fn require_admin(&self) -> Result<(), ApiError> {
        if self.role == Role::Admin {
            Ok(())
        } else {
            Err(ApiError::Unauthorized("Admin access required"))
        }
    }

    pub fn require_employee(&self) -> Result<(), ApiError> {
        if self.role == Role::Employee {
            Ok(())
        } else {
            Err(ApiError::Unauthorized("Employee access required"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(role: Role) -> AuthUser {
        AuthUser {
            user_id: 1,
            email: "a@b.com".into(),
            role,
            department: None,
            employee_code: None,
        }
    }

    #[test]
    fn role_gates() {
        assert!(user(Role::Admin).require_admin().is_ok());
        assert!(user(Role::Employee).require_admin().is_err());
        assert!(user(Role::Employee).require_employee().is_ok());
        assert!(user(Role::Admin).require_employee().is_err());
    }
}
