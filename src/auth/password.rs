use bcrypt::{DEFAULT_COST, hash, verify};

pub fn hash_password(password: &str) -> Result<String, String> {
    hash(password, DEFAULT_COST).map_err(|e| format!("Failed to hash password: {e}"))
}

/// A malformed stored hash counts as a mismatch.
pub fn verify_password(password: &str, hashed: &str) -> bool {
    verify(password, hashed).unwrap_or(false)
}

/// Signup password rules. Returns the first rule the password breaks.
pub fn validate_password_strength(
    password: &str,
    first_name: &str,
    last_name: &str,
    email: &str,
) -> Result<(), String> {
    if password.chars().count() < 8 {
        return Err("Password must be at least 8 characters long".to_string());
    }
    if password.chars().any(char::is_whitespace) {
        return Err("Password must not contain spaces".to_string());
    }
    if !password.chars().any(|c| c.is_uppercase()) {
        return Err("Password must contain at least one uppercase letter".to_string());
    }
    if !password.chars().any(|c| c.is_lowercase()) {
        return Err("Password must contain at least one lowercase letter".to_string());
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        return Err("Password must contain at least one number".to_string());
    }
    if !password.chars().any(|c| !c.is_alphanumeric()) {
        return Err("Password must contain at least one special character".to_string());
    }

    let lowered = password.to_lowercase();
    let local_part = email.split('@').next().unwrap_or_default();
    for part in [first_name, last_name, local_part] {
        let part = part.trim().to_lowercase();
        if part.chars().count() >= 3 && lowered.contains(&part) {
            return Err("Password must not contain your name or email".to_string());
        }
    }

    Ok(())
}

/// Light syntax check: one `@`, non-empty local part, dotted domain.
pub fn validate_email(email: &str) -> Result<(), String> {
    let email = email.trim();
    let invalid = || Err("Enter a valid email address.".to_string());

    if email.chars().any(char::is_whitespace) {
        return invalid();
    }
    let Some((local, domain)) = email.split_once('@') else {
        return invalid();
    };
    if local.is_empty() || domain.contains('@') {
        return invalid();
    }
    let labels: Vec<&str> = domain.split('.').collect();
    if labels.len() < 2 || labels.iter().any(|l| l.is_empty()) {
        return invalid();
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_strong_password() {
        assert!(validate_password_strength("Str0ng!Pass", "John", "Doe", "jd@example.com").is_ok());
    }

    #[test]
    fn rejects_weak_passwords() {
        let check = |p: &str| validate_password_strength(p, "", "", "x@example.com");
        assert!(check("Sh0rt!").is_err());
        assert!(check("alllower1!").is_err());
        assert!(check("ALLUPPER1!").is_err());
        assert!(check("NoDigits!!").is_err());
        assert!(check("NoSpecial11").is_err());
        assert!(check("Has Space1!").is_err());
    }

    #[test]
    fn rejects_password_containing_personal_info() {
        assert!(validate_password_strength("Johnny#2024", "John", "Doe", "x@example.com").is_err());
        assert!(validate_password_strength("Xx#1smithy", "", "Smith", "x@example.com").is_err());
        assert!(validate_password_strength("Mary#2024x", "", "", "mary@example.com").is_err());
        // Short name parts are ignored.
        assert!(validate_password_strength("Al#2024xyz", "Al", "", "x@example.com").is_ok());
    }

    #[test]
    fn hashes_and_verifies() {
        let hashed = hash_password("Str0ng!Pass").unwrap();
        assert!(verify_password("Str0ng!Pass", &hashed));
        assert!(!verify_password("wrong", &hashed));
        assert!(!verify_password("Str0ng!Pass", "not-a-hash"));
    }

    #[test]
    fn email_syntax() {
        assert!(validate_email("a@b.co").is_ok());
        assert!(validate_email("a@b").is_err());
        assert!(validate_email("@b.co").is_err());
        assert!(validate_email("a b@c.co").is_err());
        assert!(validate_email("a@b..co").is_err());
    }
}
