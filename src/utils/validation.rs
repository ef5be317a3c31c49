/// Structural email check: one `@`, non-empty local part, domain with a dot
/// and no whitespace. Deliverability is not our problem.
pub fn validate_email(email: &str) -> bool {
    if email.contains(char::is_whitespace) {
        return false;
    }
    let mut parts = email.splitn(2, '@');
    let (Some(local), Some(domain)) = (parts.next(), parts.next()) else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    match domain.rsplit_once('.') {
        Some((host, tld)) => !host.is_empty() && !tld.is_empty(),
        None => false,
    }
}

/// Minimum bar: 6+ chars with lower, upper and digit.
pub fn validate_password(password: &str) -> Result<(), &'static str> {
    if password.len() < 6 {
        return Err("Password must be at least 6 characters long");
    }
    if !password.chars().any(|c| c.is_ascii_lowercase()) {
        return Err("Password must contain at least one lowercase letter");
    }
    if !password.chars().any(|c| c.is_ascii_uppercase()) {
        return Err("Password must contain at least one uppercase letter");
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        return Err("Password must contain at least one number");
    }
    Ok(())
}

/// Employee codes are uppercase alphanumerics, 3 to 10 chars.
pub fn validate_employee_code(code: &str) -> bool {
    (3..=10).contains(&code.len())
        && code
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_structure() {
        assert!(validate_email("john.doe@company.com"));
        assert!(validate_email("a@b.co"));
        assert!(!validate_email("no-at-sign"));
        assert!(!validate_email("@company.com"));
        assert!(!validate_email("john@company"));
        assert!(!validate_email("jo hn@company.com"));
        assert!(!validate_email("john@@company.com"));
    }

    #[test]
    fn password_rules() {
        assert!(validate_password("Abc123").is_ok());
        assert!(validate_password("abc12").is_err()); // too short
        assert!(validate_password("abcdef1").is_err()); // no uppercase
        assert!(validate_password("ABCDEF1").is_err()); // no lowercase
        assert!(validate_password("Abcdefg").is_err()); // no digit
    }

    #[test]
    fn employee_code_shape() {
        assert!(validate_employee_code("EMP001"));
        assert!(validate_employee_code("A1B"));
        assert!(!validate_employee_code("ab1")); // lowercase
        assert!(!validate_employee_code("AB")); // too short
        assert!(!validate_employee_code("ABCDEFGHIJK")); // too long
        assert!(!validate_employee_code("EMP-01")); // punctuation
    }
}
