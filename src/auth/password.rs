use argon2::{
    Argon2,
    password_hash::{self, PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};

pub fn hash_password(password: &str) -> Result<String, password_hash::Error> {
    let argon2 = Argon2::default();
    let salt = SaltString::generate(&mut OsRng);

    Ok(argon2.hash_password(password.as_bytes(), &salt)?.to_string())
}

/// A malformed stored hash verifies the same as a wrong password.
pub fn verify_password(password: &str, hashed: &str) -> Result<(), password_hash::Error> {
    let argon2 = Argon2::default();
    let parsed = PasswordHash::new(hashed)?;

    argon2.verify_password(password.as_bytes(), &parsed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_then_verify() {
        let hashed = hash_password("hunter2hunter2").unwrap();
        assert!(verify_password("hunter2hunter2", &hashed).is_ok());
        assert!(verify_password("hunter3hunter3", &hashed).is_err());
    }

    #[test]
    fn garbage_stored_hash_fails_closed() {
        assert!(verify_password("anything", "not-a-phc-string").is_err());
    }
}
