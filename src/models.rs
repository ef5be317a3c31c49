use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Deserialize, ToSchema)]
pub struct LoginReq {
    #[schema(example = "john.doe@company.com")]
    pub email: String,
    pub password: String,
}

#[derive(Deserialize, ToSchema)]
pub struct RegisterReq {
    #[schema(example = "John Doe")]
    pub name: String,
    #[schema(example = "john.doe@company.com", format = "email")]
    pub email: String,
    pub password: String,
    #[schema(example = "Engineering")]
    pub department: Option<String>,
    #[schema(example = "EMP001")]
    pub employee_code: Option<String>,
}

#[derive(Deserialize, ToSchema)]
pub struct RegisterAdminReq {
    #[schema(example = "Jane Admin")]
    pub name: String,
    #[schema(example = "jane@company.com", format = "email")]
    pub email: String,
    pub password: String,
    /// One of the configured admin signup codes.
    pub admin_code: String,
    #[schema(example = "Operations")]
    pub department: String,
    pub phone: Option<String>,
}

#[derive(Serialize, Deserialize, ToSchema)]
pub struct TokenPairResponse {
    pub access_token: String,
    pub refresh_token: String,
}

/// JWT claims. `sub` is the account email; role/department/employee_code are
/// denormalized so the protected scope can authorize without a user lookup.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub user_id: u64,
    pub sub: String,
    pub role: String,
    pub department: Option<String>,
    pub employee_code: Option<String>,
    pub exp: usize,
    pub jti: String,
    pub token_type: TokenType,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Copy, Clone)]
pub enum TokenType {
    Access,
    Refresh,
}
