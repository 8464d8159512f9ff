use std::sync::LazyLock;

use regex::Regex;

use crate::utils::error::CustomError;

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern is valid")
});

pub fn validate_password(password: &str) -> Result<(), CustomError> {
    // Check password length
    if password.len() < 8 || password.len() > 20 {
        return Err(CustomError::ValidationError(
            "Password must be between 8 and 20 characters long.".into(),
        ));
    }

    let has_lowercase = password.chars().any(|c| c.is_lowercase());
    let has_uppercase = password.chars().any(|c| c.is_uppercase());
    let has_digit = password.chars().any(|c| c.is_ascii_digit());

    if !has_lowercase || !has_uppercase || !has_digit {
        return Err(CustomError::ValidationError(
            "Password must include at least one uppercase letter, one lowercase letter, and one number.".into(),
        ));
    }

    Ok(())
}

pub fn validate_email(email: &str) -> Result<(), CustomError> {
    if !EMAIL_RE.is_match(email) {
        return Err(CustomError::ValidationError(
            "Please provide a valid email".into(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_policy() {
        assert!(validate_password("Passw0rd").is_ok());
        assert!(validate_password("short1A").is_err());
        assert!(validate_password("alllowercase1").is_err());
        assert!(validate_password("NoDigitsHere").is_err());
        assert!(validate_password("ThisPasswordIsWayTooLong123").is_err());
    }

    #[test]
    fn email_shape() {
        assert!(validate_email("ada@example.com").is_ok());
        assert!(validate_email("ada@example").is_err());
        assert!(validate_email("ada example.com").is_err());
    }
}
