use crate::{
    auth::{
        jwt::{TokenSubject, generate_access_token, generate_refresh_token, verify_token},
        password::{hash_password, verify_password},
    },
    config::Config,
    error::{ApiError, is_duplicate_key},
    model::{role::Role, user::{PublicUser, User}},
    models::{LoginReq, RegisterAdminReq, RegisterReq, TokenPairResponse, TokenType},
    utils::{email_cache, email_filter, validation},
};
use actix_web::{HttpRequest, HttpResponse, web};
use serde_json::json;
use sqlx::MySqlPool;
use tracing::{debug, error, info, instrument, warn};

const USER_COLUMNS: &str =
    "id, name, email, password, role, department, employee_code, is_active, last_login_at";

/// true  => email AVAILABLE
/// false => email TAKEN
///
/// Cuckoo filter fast-negative, moka cache fast-positive, DB fallback.
pub async fn is_email_available(email: &str, pool: &MySqlPool) -> bool {
    let email = email.trim().to_lowercase();

    if !email_filter::might_exist(&email) {
        return true;
    }

    if email_cache::is_taken(&email).await {
        return false;
    }

    let exists =
        sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM users WHERE email = ? LIMIT 1)")
            .bind(&email)
            .fetch_one(pool)
            .await
            .unwrap_or(true); // fail-safe

    !exists
}

fn subject_of(user: &User) -> TokenSubject {
    TokenSubject {
        user_id: user.id,
        email: user.email.clone(),
        role: user.role.clone(),
        department: user.department.clone(),
        employee_code: user.employee_code.clone(),
    }
}

/// Employee signup. Department and employee code are mandatory for the
/// employee role; both email and employee code are globally unique.
#[utoipa::path(
    post,
    path = "/auth/register",
    request_body = RegisterReq,
    responses(
        (status = 201, description = "User created"),
        (status = 400, description = "Validation failure"),
        (status = 409, description = "Email or employee ID already registered")
    ),
    tag = "Auth"
)]
pub async fn register(
    payload: web::Json<RegisterReq>,
    pool: web::Data<MySqlPool>,
) -> Result<HttpResponse, ApiError> {
    let name = payload.name.trim();
    let email = payload.email.trim().to_lowercase();

    if name.is_empty() || email.is_empty() || payload.password.is_empty() {
        return Err(ApiError::validation("Name, email and password are required"));
    }
    if !validation::validate_email(&email) {
        return Err(ApiError::validation("Invalid email format"));
    }
    validation::validate_password(&payload.password).map_err(ApiError::validation)?;

    let department = payload
        .department
        .as_deref()
        .map(str::trim)
        .filter(|d| !d.is_empty());
    let employee_code = payload
        .employee_code
        .as_deref()
        .map(|c| c.trim().to_uppercase())
        .filter(|c| !c.is_empty());

    let (Some(department), Some(employee_code)) = (department, employee_code) else {
        return Err(ApiError::validation(
            "Department and Employee ID are required for employees",
        ));
    };
    if !validation::validate_employee_code(&employee_code) {
        return Err(ApiError::validation("Invalid employee ID format"));
    }

    if !is_email_available(&email, pool.get_ref()).await {
        return Err(ApiError::Conflict("User with this email already exists"));
    }

    let code_taken = sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS(SELECT 1 FROM users WHERE employee_code = ? LIMIT 1)",
    )
    .bind(&employee_code)
    .fetch_one(pool.get_ref())
    .await?;
    if code_taken {
        return Err(ApiError::Conflict("Employee ID already exists"));
    }

    let hashed = hash_password(&payload.password).map_err(|e| {
        error!(error = %e, "password hashing failed");
        ApiError::Internal
    })?;

    let result = sqlx::query(
        r#"
        INSERT INTO users (name, email, password, role, department, employee_code)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(name)
    .bind(&email)
    .bind(&hashed)
    .bind(Role::Employee.as_ref())
    .bind(department)
    .bind(&employee_code)
    .execute(pool.get_ref())
    .await;

    match result {
        Ok(res) => {
            email_filter::insert(&email);
            email_cache::mark_taken(&email).await;

            Ok(HttpResponse::Created().json(json!({
                "message": "User created successfully",
                "user_id": res.last_insert_id()
            })))
        }
        // Lost the race against a concurrent signup on one of the unique keys.
        Err(e) if is_duplicate_key(&e) => {
            Err(ApiError::Conflict("User with this email already exists"))
        }
        Err(e) => Err(e.into()),
    }
}

/// Admin signup, gated by a configured admin code.
#[utoipa::path(
    post,
    path = "/auth/register-admin",
    request_body = RegisterAdminReq,
    responses(
        (status = 201, description = "Admin account created"),
        (status = 400, description = "Validation failure"),
        (status = 401, description = "Invalid admin verification code"),
        (status = 409, description = "Email already registered")
    ),
    tag = "Auth"
)]
pub async fn register_admin(
    payload: web::Json<RegisterAdminReq>,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
) -> Result<HttpResponse, ApiError> {
    let name = payload.name.trim();
    let email = payload.email.trim().to_lowercase();
    let department = payload.department.trim();

    if name.is_empty() || email.is_empty() || payload.password.is_empty() || department.is_empty() {
        return Err(ApiError::validation("All fields are required"));
    }
    if !config.is_admin_code(&payload.admin_code) {
        return Err(ApiError::Unauthenticated("Invalid admin verification code"));
    }
    if !validation::validate_email(&email) {
        return Err(ApiError::validation("Invalid email format"));
    }
    if payload.password.len() < 8 {
        return Err(ApiError::validation(
            "Password must be at least 8 characters long",
        ));
    }
    validation::validate_password(&payload.password).map_err(ApiError::validation)?;

    if !is_email_available(&email, pool.get_ref()).await {
        return Err(ApiError::Conflict("User with this email already exists"));
    }

    let hashed = hash_password(&payload.password).map_err(|e| {
        error!(error = %e, "password hashing failed");
        ApiError::Internal
    })?;

    let result = sqlx::query(
        r#"
        INSERT INTO users (name, email, password, role, department, phone)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(name)
    .bind(&email)
    .bind(&hashed)
    .bind(Role::Admin.as_ref())
    .bind(department)
    .bind(payload.phone.as_deref())
    .execute(pool.get_ref())
    .await;

    match result {
        Ok(res) => {
            email_filter::insert(&email);
            email_cache::mark_taken(&email).await;

            info!(admin_id = res.last_insert_id(), %email, department, "admin account created");

            Ok(HttpResponse::Created().json(json!({
                "message": "Admin account created successfully",
                "user_id": res.last_insert_id()
            })))
        }
        Err(e) if is_duplicate_key(&e) => {
            Err(ApiError::Conflict("User with this email already exists"))
        }
        Err(e) => Err(e.into()),
    }
}

#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginReq,
    responses(
        (status = 200, description = "Login successful, returns token pair and user"),
        (status = 401, description = "Invalid credentials or deactivated account")
    ),
    tag = "Auth"
)]
#[instrument(name = "auth_login", skip(pool, config, payload), fields(email = %payload.email))]
pub async fn login(
    payload: web::Json<LoginReq>,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
) -> Result<HttpResponse, ApiError> {
    info!("Login request received");

    let email = payload.email.trim().to_lowercase();
    if email.is_empty() || payload.password.is_empty() {
        return Err(ApiError::validation("Email and password are required"));
    }

    debug!("Fetching user from database");

    let user = sqlx::query_as::<_, User>(&format!(
        "SELECT {USER_COLUMNS} FROM users WHERE email = ?"
    ))
    .bind(&email)
    .fetch_optional(pool.get_ref())
    .await?;

    let Some(user) = user else {
        info!("Invalid credentials: user not found");
        return Err(ApiError::Unauthenticated("Invalid email or password"));
    };

    if !user.is_active {
        info!(user_id = user.id, "login rejected: account deactivated");
        return Err(ApiError::Unauthenticated(
            "Account is deactivated. Contact administrator.",
        ));
    }

    if verify_password(&payload.password, &user.password).is_err() {
        info!("Invalid credentials: password mismatch");
        return Err(ApiError::Unauthenticated("Invalid email or password"));
    }

    debug!("Password verified, issuing tokens");

    let subject = subject_of(&user);
    let access_token = generate_access_token(&subject, &config.jwt_secret, config.access_token_ttl)?;
    let (refresh_token, refresh_claims) =
        generate_refresh_token(&subject, &config.jwt_secret, config.refresh_token_ttl)?;

    sqlx::query(
        r#"
        INSERT INTO refresh_tokens (user_id, jti, expires_at)
        VALUES (?, ?, FROM_UNIXTIME(?))
        "#,
    )
    .bind(user.id)
    .bind(&refresh_claims.jti)
    .bind(refresh_claims.exp as i64)
    .execute(pool.get_ref())
    .await?;

    // Non-fatal bookkeeping.
    if let Err(e) = sqlx::query("UPDATE users SET last_login_at = NOW() WHERE id = ?")
        .bind(user.id)
        .execute(pool.get_ref())
        .await
    {
        warn!(error = %e, "Failed to update last_login_at");
    }

    info!("Login successful");

    Ok(HttpResponse::Ok().json(json!({
        "message": "Login successful",
        "access_token": access_token,
        "refresh_token": refresh_token,
        "user": PublicUser::from(user),
    })))
}

#[utoipa::path(
    post,
    path = "/auth/refresh",
    responses(
        (status = 200, description = "Rotated token pair", body = TokenPairResponse),
        (status = 401, description = "Missing, expired or revoked refresh token")
    ),
    security(("bearer_auth" = [])),
    tag = "Auth"
)]
pub async fn refresh_token(
    req: HttpRequest,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
) -> Result<HttpResponse, ApiError> {
    let token = bearer_token(&req)?;

    let claims = verify_token(token, &config.jwt_secret)
        .map_err(|_| ApiError::Unauthenticated("Invalid or expired token"))?;

    if claims.token_type != TokenType::Refresh {
        return Err(ApiError::Unauthenticated("Refresh token required"));
    }

    let record = sqlx::query_as::<_, (u64, u64, bool)>(
        "SELECT id, user_id, revoked FROM refresh_tokens WHERE jti = ?",
    )
    .bind(&claims.jti)
    .fetch_optional(pool.get_ref())
    .await?;

    let (record_id, user_id) = match record {
        Some((id, user_id, false)) => (id, user_id),
        _ => return Err(ApiError::Unauthenticated("Invalid or expired token")),
    };

    // Rotate: the presented token is single-use.
    sqlx::query("UPDATE refresh_tokens SET revoked = TRUE WHERE id = ?")
        .bind(record_id)
        .execute(pool.get_ref())
        .await?;

    let subject = TokenSubject {
        user_id,
        email: claims.sub.clone(),
        role: claims.role.clone(),
        department: claims.department.clone(),
        employee_code: claims.employee_code.clone(),
    };

    let (new_refresh_token, new_claims) =
        generate_refresh_token(&subject, &config.jwt_secret, config.refresh_token_ttl)?;

    sqlx::query(
        r#"
        INSERT INTO refresh_tokens (user_id, jti, expires_at)
        VALUES (?, ?, FROM_UNIXTIME(?))
        "#,
    )
    .bind(user_id)
    .bind(&new_claims.jti)
    .bind(new_claims.exp as i64)
    .execute(pool.get_ref())
    .await?;

    let access_token = generate_access_token(&subject, &config.jwt_secret, config.access_token_ttl)?;

    Ok(HttpResponse::Ok().json(TokenPairResponse {
        access_token,
        refresh_token: new_refresh_token,
    }))
}

/// Revokes the presented refresh token. Always succeeds from the client's
/// point of view, even if the token was unknown.
#[utoipa::path(
    post,
    path = "/auth/logout",
    responses((status = 204, description = "Logged out")),
    security(("bearer_auth" = [])),
    tag = "Auth"
)]
pub async fn logout(
    req: HttpRequest,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
) -> HttpResponse {
    let Ok(token) = bearer_token(&req) else {
        return HttpResponse::NoContent().finish();
    };

    let Ok(claims) = verify_token(token, &config.jwt_secret) else {
        return HttpResponse::NoContent().finish();
    };

    if claims.token_type != TokenType::Refresh {
        return HttpResponse::NoContent().finish();
    }

    let _ = sqlx::query("UPDATE refresh_tokens SET revoked = TRUE WHERE jti = ?")
        .bind(&claims.jti)
        .execute(pool.get_ref())
        .await;

    HttpResponse::NoContent().finish()
}

fn bearer_token(req: &HttpRequest) -> Result<&str, ApiError> {
    req.headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .ok_or(ApiError::Unauthenticated("Authorization token required"))
}
