use std::time::{SystemTime, UNIX_EPOCH};

use crate::models::{Claims, TokenType};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::Error};
use uuid::Uuid;

/// Identity baked into both token kinds.
#[derive(Debug, Clone)]
pub struct TokenSubject {
    pub user_id: u64,
    pub email: String,
    pub role: String,
    pub department: Option<String>,
    pub employee_code: Option<String>,
}

fn now() -> usize {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs() as usize
}

fn claims_for(subject: &TokenSubject, ttl: usize, token_type: TokenType) -> Claims {
    Claims {
        user_id: subject.user_id,
        sub: subject.email.clone(),
        role: subject.role.clone(),
        department: subject.department.clone(),
        employee_code: subject.employee_code.clone(),
        exp: now() + ttl,
        jti: Uuid::new_v4().to_string(),
        token_type,
    }
}

pub fn generate_access_token(
    subject: &TokenSubject,
    secret: &str,
    ttl: usize,
) -> Result<String, Error> {
    let claims = claims_for(subject, ttl, TokenType::Access);
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
}

/// Returns the claims too; the caller persists the jti for revocation.
pub fn generate_refresh_token(
    subject: &TokenSubject,
    secret: &str,
    ttl: usize,
) -> Result<(String, Claims), Error> {
    let claims = claims_for(subject, ttl, TokenType::Refresh);
    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;
    Ok((token, claims))
}

pub fn verify_token(token: &str, secret: &str) -> Result<Claims, String> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn subject() -> TokenSubject {
        TokenSubject {
            user_id: 42,
            email: "worker@company.com".into(),
            role: "employee".into(),
            department: Some("Engineering".into()),
            employee_code: Some("EMP042".into()),
        }
    }

    #[test]
    fn access_token_roundtrip() {
        let token = generate_access_token(&subject(), "test-secret", 600).unwrap();
        let claims = verify_token(&token, "test-secret").unwrap();

        assert_eq!(claims.user_id, 42);
        assert_eq!(claims.sub, "worker@company.com");
        assert_eq!(claims.role, "employee");
        assert_eq!(claims.employee_code.as_deref(), Some("EMP042"));
        assert_eq!(claims.token_type, TokenType::Access);
    }

    #[test]
    fn refresh_token_carries_jti() {
        let (token, issued) = generate_refresh_token(&subject(), "test-secret", 600).unwrap();
        let claims = verify_token(&token, "test-secret").unwrap();

        assert_eq!(claims.token_type, TokenType::Refresh);
        assert_eq!(claims.jti, issued.jti);
        assert!(!claims.jti.is_empty());
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let token = generate_access_token(&subject(), "test-secret", 600).unwrap();
        assert!(verify_token(&token, "other-secret").is_err());
    }
}
