//! Client-local form checks. Anything that fails here never reaches the
//! network.

use thiserror::Error;

/// Minimum password strength score accepted at registration.
pub const MIN_PASSWORD_SCORE: u8 = 3;

/// Length that earns the length point of the strength score.
const STRONG_PASSWORD_LENGTH: usize = 8;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{0} is required")]
    MissingField(&'static str),

    #[error("Please enter a valid email address")]
    InvalidEmail,

    #[error("Passwords do not match")]
    PasswordMismatch,

    #[error("Password is too weak")]
    WeakPassword,
}

/// Score 0-5: one point each for length, lowercase, uppercase, digit and
/// symbol.
pub fn password_strength(password: &str) -> u8 {
    let checks = [
        password.chars().count() >= STRONG_PASSWORD_LENGTH,
        password.chars().any(|c| c.is_lowercase()),
        password.chars().any(|c| c.is_uppercase()),
        password.chars().any(|c| c.is_ascii_digit()),
        password.chars().any(|c| !c.is_alphanumeric() && !c.is_whitespace()),
    ];
    checks.iter().filter(|ok| **ok).count() as u8
}

pub fn strength_label(score: u8) -> &'static str {
    match score {
        0..=1 => "Very weak",
        2 => "Weak",
        3 => "Fair",
        4 => "Good",
        _ => "Strong",
    }
}

pub fn is_valid_email(email: &str) -> bool {
    let mut parts = email.split('@');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(local), Some(domain), None) => {
            !local.is_empty()
                && !email.chars().any(char::is_whitespace)
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
        }
        _ => false,
    }
}

pub fn validate_login(email: &str, password: &str) -> Result<(), ValidationError> {
    if email.trim().is_empty() {
        return Err(ValidationError::MissingField("Email"));
    }
    if password.is_empty() {
        return Err(ValidationError::MissingField("Password"));
    }
    Ok(())
}

/// Mismatch is reported before strength so the user fixes the typo first.
pub fn validate_registration(
    name: &str,
    email: &str,
    password: &str,
    confirm_password: &str,
) -> Result<(), ValidationError> {
    if name.trim().is_empty() {
        return Err(ValidationError::MissingField("Name"));
    }
    if email.trim().is_empty() {
        return Err(ValidationError::MissingField("Email"));
    }
    if !is_valid_email(email.trim()) {
        return Err(ValidationError::InvalidEmail);
    }
    if password.is_empty() {
        return Err(ValidationError::MissingField("Password"));
    }
    if password != confirm_password {
        return Err(ValidationError::PasswordMismatch);
    }
    if password_strength(password) < MIN_PASSWORD_SCORE {
        return Err(ValidationError::WeakPassword);
    }
    Ok(())
}
