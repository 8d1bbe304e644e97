//! Input validation for account signup.

use thiserror::Error;

use super::password::{validate_password, PasswordError};

/// Minimum username length.
pub const MIN_USERNAME_LENGTH: usize = 3;

/// Maximum username length.
pub const MAX_USERNAME_LENGTH: usize = 50;

/// Maximum length of first and last names.
pub const MAX_NAME_LENGTH: usize = 100;

/// Maximum email length.
pub const MAX_EMAIL_LENGTH: usize = 254;

/// Validation errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Username is too short.
    #[error("username must be at least {MIN_USERNAME_LENGTH} characters")]
    UsernameTooShort,

    /// Username is too long.
    #[error("username must be at most {MAX_USERNAME_LENGTH} characters")]
    UsernameTooLong,

    /// Username contains invalid characters.
    #[error("username can only contain letters, digits, '_', '.' and '-'")]
    UsernameInvalidChars,

    /// Password does not meet the policy.
    #[error("{0}")]
    Password(String),

    /// A name field is empty.
    #[error("{0} cannot be empty")]
    NameEmpty(&'static str),

    /// A name field is too long.
    #[error("{0} must be at most {MAX_NAME_LENGTH} characters")]
    NameTooLong(&'static str),

    /// Email is too long.
    #[error("email must be at most {MAX_EMAIL_LENGTH} characters")]
    EmailTooLong,

    /// Email format is invalid.
    #[error("invalid email format")]
    EmailInvalidFormat,
}

impl From<PasswordError> for ValidationError {
    fn from(e: PasswordError) -> Self {
        ValidationError::Password(e.to_string())
    }
}

/// Validate a username.
///
/// Requirements:
/// - Length: 3-50 characters
/// - Characters: ASCII letters, digits, `_`, `.` and `-` (never `@`, so a
///   login identifier containing `@` can only be an email)
///
/// # Examples
///
/// ```
/// use tollgate::auth::validation::validate_username;
///
/// assert!(validate_username("finance_user").is_ok());
/// assert!(validate_username("ab").is_err());
/// assert!(validate_username("me@example.com").is_err());
/// ```
pub fn validate_username(username: &str) -> Result<(), ValidationError> {
    if username.len() < MIN_USERNAME_LENGTH {
        return Err(ValidationError::UsernameTooShort);
    }
    if username.len() > MAX_USERNAME_LENGTH {
        return Err(ValidationError::UsernameTooLong);
    }
    if !username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
    {
        return Err(ValidationError::UsernameInvalidChars);
    }
    Ok(())
}

/// Validate a first or last name.
pub fn validate_name(field: &'static str, name: &str) -> Result<(), ValidationError> {
    if name.trim().is_empty() {
        return Err(ValidationError::NameEmpty(field));
    }
    if name.chars().count() > MAX_NAME_LENGTH {
        return Err(ValidationError::NameTooLong(field));
    }
    Ok(())
}

/// Validate an email address.
///
/// This is a basic format check, not full address validation.
///
/// # Examples
///
/// ```
/// use tollgate::auth::validation::validate_email;
///
/// assert!(validate_email("user@example.com").is_ok());
/// assert!(validate_email("invalid").is_err());
/// ```
pub fn validate_email(email: &str) -> Result<(), ValidationError> {
    if email.len() > MAX_EMAIL_LENGTH {
        return Err(ValidationError::EmailTooLong);
    }
    if email.chars().any(|c| c.is_whitespace()) {
        return Err(ValidationError::EmailInvalidFormat);
    }

    let Some((local, domain)) = email.split_once('@') else {
        return Err(ValidationError::EmailInvalidFormat);
    };
    if local.is_empty() || domain.contains('@') || !domain.contains('.') {
        return Err(ValidationError::EmailInvalidFormat);
    }
    if domain.split('.').any(|part| part.is_empty()) {
        return Err(ValidationError::EmailInvalidFormat);
    }
    Ok(())
}

/// Validate all signup fields at once.
///
/// Returns the first validation error encountered.
pub fn validate_signup(
    username: &str,
    email: &str,
    password: &str,
    first_name: &str,
    last_name: &str,
) -> Result<(), ValidationError> {
    validate_username(username)?;
    validate_email(email)?;
    validate_password(password)?;
    validate_name("first_name", first_name)?;
    validate_name("last_name", last_name)?;
    Ok(())
}
